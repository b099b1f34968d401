use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Set while a package installer session for the item's app is running.
pub const FLAG_INSTALL_SESSION_ACTIVE: u32 = 1 << 0;
/// The item is a placeholder for an app that is not installed yet.
pub const FLAG_PROMISE: u32 = 1 << 1;

/// Folder option persisted once the folder has shown its multi-page entry animation.
pub const FLAG_MULTI_PAGE_ANIMATION: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FolderId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerId {
    Desktop,
    Hotseat,
    Folder(FolderId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Application,
    Shortcut,
    DeepShortcut,
    Widget,
    Folder,
}

impl ItemKind {
    /// Kinds a folder is willing to hold.
    pub fn fits_in_folder(self) -> bool {
        matches!(
            self,
            ItemKind::Application | ItemKind::Shortcut | ItemKind::DeepShortcut
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: ItemId,
    pub kind: ItemKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub rank: usize,
    #[serde(default)]
    pub cell_x: i32,
    #[serde(default)]
    pub cell_y: i32,
    #[serde(default = "default_container")]
    pub container: ContainerId,
    #[serde(default)]
    pub status: u32,
    #[serde(default)]
    pub install_progress: i32,
    #[serde(default)]
    pub package: Option<String>,
}

fn default_container() -> ContainerId {
    ContainerId::Desktop
}

impl ItemInfo {
    pub fn shortcut(id: u64, title: &str) -> Self {
        Self {
            id: ItemId(id),
            kind: ItemKind::Shortcut,
            title: title.to_string(),
            rank: 0,
            cell_x: 0,
            cell_y: 0,
            container: ContainerId::Desktop,
            status: 0,
            install_progress: 0,
            package: None,
        }
    }

    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_package(mut self, package: &str) -> Self {
        self.package = Some(package.to_string());
        self
    }

    /// Items dragged in from the all-apps list become folder shortcuts.
    pub fn make_shortcut(&self) -> Self {
        let mut item = self.clone();
        if item.kind == ItemKind::Application {
            item.kind = ItemKind::Shortcut;
        }
        item
    }

    pub fn is_promise(&self) -> bool {
        self.status & FLAG_PROMISE != 0
    }

    pub fn apply_status(&mut self, op: FlagOp) {
        self.status = op.apply(self.status);
    }
}

/// Canonical reading order: rank, then row, then column.
pub fn item_pos_ordering(lhs: &ItemInfo, rhs: &ItemInfo) -> Ordering {
    lhs.rank
        .cmp(&rhs.rank)
        .then(lhs.cell_y.cmp(&rhs.cell_y))
        .then(lhs.cell_x.cmp(&rhs.cell_x))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    pub id: FolderId,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_container")]
    pub container: ContainerId,
    #[serde(default)]
    pub screen_id: i64,
    #[serde(default)]
    pub cell_x: i32,
    #[serde(default)]
    pub cell_y: i32,
    #[serde(default)]
    pub options: u32,
    /// Model-side membership. Item data lives in the folder's grid.
    #[serde(default)]
    pub contents: Vec<ItemId>,
}

impl FolderInfo {
    pub fn new(id: u64, title: &str) -> Self {
        Self {
            id: FolderId(id),
            title: title.to_string(),
            container: ContainerId::Desktop,
            screen_id: 0,
            cell_x: 0,
            cell_y: 0,
            options: 0,
            contents: Vec::new(),
        }
    }

    pub fn has_option(&self, flag: u32) -> bool {
        self.options & flag != 0
    }

    /// Returns true when the stored value changed and needs persisting.
    pub fn set_option(&mut self, flag: u32, enabled: bool) -> bool {
        let before = self.options;
        self.options = if enabled {
            FlagOp::Add(flag).apply(self.options)
        } else {
            FlagOp::Remove(flag).apply(self.options)
        };
        before != self.options
    }

    pub(crate) fn add(&mut self, id: ItemId) {
        if !self.contents.contains(&id) {
            self.contents.push(id);
        }
    }

    pub(crate) fn remove(&mut self, id: ItemId) -> bool {
        let before = self.contents.len();
        self.contents.retain(|existing| *existing != id);
        before != self.contents.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagOp {
    #[default]
    NoOp,
    Add(u32),
    Remove(u32),
}

impl FlagOp {
    pub fn apply(self, flags: u32) -> u32 {
        match self {
            FlagOp::NoOp => flags,
            FlagOp::Add(flag) => flags | flag,
            FlagOp::Remove(flag) => flags & !flag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FolderState {
    /// Not bound yet.
    #[default]
    None,
    /// Closed, showing as an icon.
    Small,
    Animating,
    Open,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(id: u64, rank: usize, x: i32, y: i32) -> ItemInfo {
        let mut item = ItemInfo::shortcut(id, "x").with_rank(rank);
        item.cell_x = x;
        item.cell_y = y;
        item
    }

    #[test]
    fn reading_order_sorts_by_rank_then_row_then_column() {
        let mut items = vec![at(1, 2, 0, 0), at(2, 0, 1, 1), at(3, 0, 0, 1), at(4, 0, 2, 0)];
        items.sort_by(item_pos_ordering);
        let ids: Vec<u64> = items.iter().map(|item| item.id.0).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn set_option_reports_changes_only() {
        let mut info = FolderInfo::new(1, "Games");
        assert!(info.set_option(FLAG_MULTI_PAGE_ANIMATION, true));
        assert!(!info.set_option(FLAG_MULTI_PAGE_ANIMATION, true));
        assert!(info.has_option(FLAG_MULTI_PAGE_ANIMATION));
        assert!(info.set_option(FLAG_MULTI_PAGE_ANIMATION, false));
        assert_eq!(info.options, 0);
    }

    #[test]
    fn make_shortcut_only_converts_applications() {
        let mut app = ItemInfo::shortcut(9, "Maps");
        app.kind = ItemKind::Application;
        assert_eq!(app.make_shortcut().kind, ItemKind::Shortcut);

        let mut deep = ItemInfo::shortcut(10, "Compose");
        deep.kind = ItemKind::DeepShortcut;
        assert_eq!(deep.make_shortcut().kind, ItemKind::DeepShortcut);
    }

    #[test]
    fn flag_ops_edit_status() {
        let mut item = ItemInfo::shortcut(1, "a");
        item.apply_status(FlagOp::Add(FLAG_PROMISE | FLAG_INSTALL_SESSION_ACTIVE));
        assert!(item.is_promise());
        item.apply_status(FlagOp::Remove(FLAG_INSTALL_SESSION_ACTIVE));
        assert_eq!(item.status, FLAG_PROMISE);
        item.apply_status(FlagOp::NoOp);
        assert_eq!(item.status, FLAG_PROMISE);
    }
}
