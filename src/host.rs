//! Collaborators outside the engine and the dispatch of folder effects to them.

use crate::events::{Announcement, FolderEffect, ItemUpdate, Transition};
use crate::model::{ContainerId, FolderId, FolderInfo, ItemId, ItemInfo};
use log::{debug, info};
use serde::Serialize;

/// Durable item storage. Calls are fire-and-forget.
pub trait ModelWriter {
    fn move_items_in_database(&mut self, items: &[ItemInfo], container: ContainerId, screen_id: i64);
    fn add_or_move_item_in_database(
        &mut self,
        item: &ItemInfo,
        container: ContainerId,
        screen_id: i64,
        cell_x: i32,
        cell_y: i32,
    );
    fn delete_item_from_database(&mut self, item: &ItemInfo);
    fn delete_folder_from_database(&mut self, folder: &FolderInfo);
    fn update_folder_in_database(&mut self, folder: &FolderInfo);
}

/// Plays a transition and later reports it through `Folder::on_animation_complete`, exactly once.
pub trait AnimationDriver {
    fn play_transition(&mut self, folder: FolderId, transition: Transition);
}

pub trait LauncherCallbacks {
    /// Puts the last item of a dissolved folder where the folder icon was.
    fn promote_item(&mut self, item: &ItemInfo, folder: &FolderInfo);
    fn remove_folder_icon(&mut self, folder: FolderId);
    fn exit_spring_loaded_mode(&mut self, successful_drop: bool);
    fn announce(&mut self, announcement: &Announcement);
    fn bind_restore_items_change(&mut self, updates: &[ItemUpdate]);
}

pub trait FolderHost: ModelWriter + AnimationDriver + LauncherCallbacks {}

impl<T: ModelWriter + AnimationDriver + LauncherCallbacks> FolderHost for T {}

pub fn apply_effect(host: &mut dyn FolderHost, effect: FolderEffect) {
    match effect {
        FolderEffect::MoveItems {
            items,
            container,
            screen_id,
        } => host.move_items_in_database(&items, container, screen_id),
        FolderEffect::AddOrMoveItem {
            item,
            container,
            screen_id,
            cell_x,
            cell_y,
        } => host.add_or_move_item_in_database(&item, container, screen_id, cell_x, cell_y),
        FolderEffect::DeleteItem(item) => host.delete_item_from_database(&item),
        FolderEffect::UpdateFolder(folder) => host.update_folder_in_database(&folder),
        FolderEffect::DeleteFolder(folder) => host.delete_folder_from_database(&folder),
        FolderEffect::PlayTransition { folder, transition } => {
            host.play_transition(folder, transition)
        }
        FolderEffect::PromoteItem { item, folder } => host.promote_item(&item, &folder),
        FolderEffect::RemoveFolderIcon(folder) => host.remove_folder_icon(folder),
        FolderEffect::ExitSpringLoaded { successful_drop } => {
            host.exit_spring_loaded_mode(successful_drop)
        }
        FolderEffect::Announce(announcement) => host.announce(&announcement),
        FolderEffect::FolderDissolved(_) | FolderEffect::FolderClosed(_) => {
            debug!("workspace-level effect reached the host: {effect:?}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HostCall {
    MoveItems {
        container: ContainerId,
        /// `(item, rank)` in write order.
        items: Vec<(ItemId, usize)>,
    },
    AddOrMoveItem {
        item: ItemId,
        container: ContainerId,
        cell_x: i32,
        cell_y: i32,
    },
    DeleteItem(ItemId),
    DeleteFolder(FolderId),
    UpdateFolder {
        folder: FolderId,
        title: String,
        options: u32,
    },
    PlayTransition {
        folder: FolderId,
        transition: Transition,
    },
    PromoteItem {
        item: ItemId,
        container: ContainerId,
        cell_x: i32,
        cell_y: i32,
    },
    RemoveFolderIcon(FolderId),
    ExitSpringLoaded {
        successful_drop: bool,
    },
    Announce(Announcement),
    RestoreItemsChanged(Vec<ItemId>),
}

/// In-memory host that logs and records every call.
#[derive(Debug, Default)]
pub struct RecordingHost {
    calls: Vec<HostCall>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn move_item_writes(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, HostCall::MoveItems { .. }))
            .count()
    }

    /// Transitions played so far, oldest first.
    pub fn transitions(&self) -> Vec<(FolderId, Transition)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::PlayTransition { folder, transition } => Some((*folder, *transition)),
                _ => None,
            })
            .collect()
    }
}

impl ModelWriter for RecordingHost {
    fn move_items_in_database(&mut self, items: &[ItemInfo], container: ContainerId, screen_id: i64) {
        info!(
            "move {} items into {:?} on screen {}",
            items.len(),
            container,
            screen_id
        );
        self.calls.push(HostCall::MoveItems {
            container,
            items: items.iter().map(|item| (item.id, item.rank)).collect(),
        });
    }

    fn add_or_move_item_in_database(
        &mut self,
        item: &ItemInfo,
        container: ContainerId,
        _screen_id: i64,
        cell_x: i32,
        cell_y: i32,
    ) {
        info!("add or move {:?} into {:?} at ({cell_x}, {cell_y})", item.id, container);
        self.calls.push(HostCall::AddOrMoveItem {
            item: item.id,
            container,
            cell_x,
            cell_y,
        });
    }

    fn delete_item_from_database(&mut self, item: &ItemInfo) {
        info!("delete item {:?}", item.id);
        self.calls.push(HostCall::DeleteItem(item.id));
    }

    fn delete_folder_from_database(&mut self, folder: &FolderInfo) {
        info!("delete folder {:?}", folder.id);
        self.calls.push(HostCall::DeleteFolder(folder.id));
    }

    fn update_folder_in_database(&mut self, folder: &FolderInfo) {
        debug!("update folder {:?} options={}", folder.id, folder.options);
        self.calls.push(HostCall::UpdateFolder {
            folder: folder.id,
            title: folder.title.clone(),
            options: folder.options,
        });
    }
}

impl AnimationDriver for RecordingHost {
    fn play_transition(&mut self, folder: FolderId, transition: Transition) {
        debug!("play {:?} for {:?}", transition, folder);
        self.calls.push(HostCall::PlayTransition { folder, transition });
    }
}

impl LauncherCallbacks for RecordingHost {
    fn promote_item(&mut self, item: &ItemInfo, folder: &FolderInfo) {
        info!("promote {:?} out of dissolved folder {:?}", item.id, folder.id);
        self.calls.push(HostCall::PromoteItem {
            item: item.id,
            container: folder.container,
            cell_x: folder.cell_x,
            cell_y: folder.cell_y,
        });
    }

    fn remove_folder_icon(&mut self, folder: FolderId) {
        self.calls.push(HostCall::RemoveFolderIcon(folder));
    }

    fn exit_spring_loaded_mode(&mut self, successful_drop: bool) {
        self.calls.push(HostCall::ExitSpringLoaded { successful_drop });
    }

    fn announce(&mut self, announcement: &Announcement) {
        debug!("announce {announcement:?}");
        self.calls.push(HostCall::Announce(announcement.clone()));
    }

    fn bind_restore_items_change(&mut self, updates: &[ItemUpdate]) {
        self.calls.push(HostCall::RestoreItemsChanged(
            updates.iter().map(|update| update.id).collect(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_reach_the_matching_collaborator() {
        let mut host = RecordingHost::new();
        let folder = FolderInfo::new(3, "Tools");
        let item = ItemInfo::shortcut(8, "Clock").with_rank(2);

        apply_effect(
            &mut host,
            FolderEffect::MoveItems {
                items: vec![item.clone()],
                container: ContainerId::Folder(folder.id),
                screen_id: 0,
            },
        );
        apply_effect(
            &mut host,
            FolderEffect::PromoteItem {
                item,
                folder: folder.clone(),
            },
        );
        apply_effect(&mut host, FolderEffect::FolderDissolved(folder.id));

        assert_eq!(host.move_item_writes(), 1);
        assert_eq!(
            host.calls(),
            &[
                HostCall::MoveItems {
                    container: ContainerId::Folder(FolderId(3)),
                    items: vec![(ItemId(8), 2)],
                },
                HostCall::PromoteItem {
                    item: ItemId(8),
                    container: ContainerId::Desktop,
                    cell_x: 0,
                    cell_y: 0,
                },
            ]
        );
    }
}
