use crate::dnd::DragObject;
use crate::model::{ContainerId, FlagOp, FolderId, FolderInfo, ItemId, ItemInfo};
use serde::{Deserialize, Serialize};

/// Messages a folder's alarms carry. Fired on the loop thread by the workspace.
#[derive(Debug, Clone, PartialEq)]
pub enum FolderAlarm {
    /// Reorder debounce settled: move the empty cell to the target rank.
    Reorder,
    /// The drag left the folder long enough ago to close it.
    ExitClose,
    /// Scroll hint shown long enough: flip the page.
    ScrollHint(DragObject),
    /// Page flip settled: resume drag-over handling for the captured drag.
    ScrollFinished(DragObject),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Open,
    Close,
    /// The folder icon collapsing into its final item.
    Destroy,
}

/// Accessibility side channel. Has no effect on placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Announcement {
    /// One-based candidate position while dragging.
    MoveToPosition(usize),
    ItemMoved,
    FolderOpened,
    FolderClosed,
}

/// Side effects a folder asks the host to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum FolderEffect {
    MoveItems {
        items: Vec<ItemInfo>,
        container: ContainerId,
        screen_id: i64,
    },
    AddOrMoveItem {
        item: ItemInfo,
        container: ContainerId,
        screen_id: i64,
        cell_x: i32,
        cell_y: i32,
    },
    DeleteItem(ItemInfo),
    UpdateFolder(FolderInfo),
    DeleteFolder(FolderInfo),
    PlayTransition {
        folder: FolderId,
        transition: Transition,
    },
    /// The last item replaces the dissolved folder in its container.
    PromoteItem {
        item: ItemInfo,
        folder: FolderInfo,
    },
    RemoveFolderIcon(FolderId),
    ExitSpringLoaded {
        successful_drop: bool,
    },
    Announce(Announcement),
    /// Handled by the workspace: the folder is gone for good.
    FolderDissolved(FolderId),
    /// Handled by the workspace: the folder finished closing.
    FolderClosed(FolderId),
}

/// Install-state change for an item, computed off the loop thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    pub id: ItemId,
    pub install_progress: i32,
    pub status: FlagOp,
}

/// Events worker threads marshal onto the loop thread.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The uninstall flow finished for the item dragged out of `folder`.
    DragObjectRemoved { folder: FolderId, success: bool },
    RestoreItemsChanged(Vec<ItemUpdate>),
}
