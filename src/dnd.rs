//! Drag-and-drop capabilities. A folder is a drop target, a drag source, a drag listener and a
//! listener for its own model changes; callers hold it through whichever of these they need.

use crate::model::{FolderId, ItemId, ItemInfo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragSourceKind {
    Folder(FolderId),
    Workspace,
    /// The all-apps list.
    AllApps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropTargetId {
    Folder(FolderId),
    Workspace,
    Delete,
    Uninstall,
    AppInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragObject {
    pub item: ItemInfo,
    pub source: DragSourceKind,
    /// Visual centre of the dragged view in the target folder's content coordinates.
    pub x: f32,
    pub y: f32,
    pub drag_region_width: f32,
    /// Pointer offset from the dragged view's left edge.
    pub x_offset: f32,
    /// Set on the exit that precedes a drop onto the same target.
    pub drag_complete: bool,
    /// Whether position announcements should be made for this drag.
    pub announce: bool,
}

impl DragObject {
    pub fn new(item: ItemInfo, source: DragSourceKind) -> Self {
        Self {
            item,
            source,
            x: 0.0,
            y: 0.0,
            drag_region_width: 0.0,
            x_offset: 0.0,
            drag_complete: false,
            announce: true,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_region(mut self, width: f32, x_offset: f32) -> Self {
        self.drag_region_width = width;
        self.x_offset = x_offset;
        self
    }

    pub fn completed(mut self) -> Self {
        self.drag_complete = true;
        self
    }
}

pub trait DropTarget {
    fn accept_drop(&self, d: &DragObject) -> bool;
    fn on_drag_enter(&mut self, d: &DragObject);
    fn on_drag_over(&mut self, d: &DragObject);
    fn on_drag_exit(&mut self, d: &DragObject);
    fn on_drop(&mut self, d: &DragObject);
    /// Accessible drops arrive right after enter, so pending timers are settled first.
    fn prepare_accessibility_drop(&mut self);
}

pub trait DragSource {
    fn on_drop_completed(
        &mut self,
        target: DropTargetId,
        d: &DragObject,
        is_fling_to_delete: bool,
        success: bool,
    );
    /// The drop landed on an uninstall target that still has to confirm.
    fn defer_complete_drop_after_uninstall(&mut self);
    fn on_drag_object_removed(&mut self, success: bool);
}

pub trait DragListener {
    fn on_drag_start(&mut self, d: &DragObject);
    fn on_drag_end(&mut self);
}

pub trait ItemsChangedListener {
    fn on_add(&mut self, item: ItemInfo);
    fn on_remove(&mut self, id: ItemId);
    fn on_items_changed(&mut self);
}
