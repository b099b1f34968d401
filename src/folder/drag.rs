use super::{
    DeferredDropCompletion, DragPhase, Folder, ICON_OVERSCROLL_WIDTH_FACTOR,
    ON_EXIT_CLOSE_DELAY_MS, REORDER_DELAY_MS, RESCROLL_DELAY_MS, SCROLL_HINT_DURATION_MS,
};
use crate::dnd::{DragListener, DragObject, DragSource, DragSourceKind, DropTarget, DropTargetId};
use crate::events::{Announcement, FolderAlarm, FolderEffect};
use crate::grid::{Rect, ScrollDirection};
use crate::model::{ContainerId, FolderState, ItemId, FLAG_MULTI_PAGE_ANIMATION};
use log::{debug, warn};

impl Folder {
    /// Picks up an item for dragging and remembers the cell it leaves behind.
    pub fn start_drag(&mut self, id: ItemId) -> Option<DragObject> {
        self.ensure_alive();
        let item = self.grid.item(id)?.clone();
        self.session.empty_cell_rank = item.rank;
        self.session.current_drag_view = Some(id);
        Some(DragObject::new(item, DragSourceKind::Folder(self.id)))
    }

    /// Prepares for an item coming from outside by opening a cell at the end.
    pub fn begin_external_drag(&mut self) {
        self.ensure_alive();
        self.session.empty_cell_rank = self.grid.allocate_rank_for_new_item();
        self.session.is_external_drag = true;
        self.session.drag_in_progress = true;
    }

    /// The item was dropped back onto this folder's icon.
    pub fn notify_drop(&mut self) {
        if self.session.drag_in_progress {
            self.session.item_added_back_to_self_via_icon = true;
        }
    }

    /// Area that keeps receiving drag events, widened by the scroll zones on both sides.
    pub fn hit_rect(&self) -> Rect {
        let offset = self.session.scroll_area_offset;
        Rect {
            left: -offset,
            top: 0.0,
            right: self.grid.desired_width() + offset,
            bottom: self.grid.desired_height(),
        }
    }

    pub(super) fn on_alarm(&mut self, message: FolderAlarm) {
        match message {
            FolderAlarm::Reorder => self.on_reorder_alarm(),
            FolderAlarm::ExitClose => self.complete_drag_exit(),
            FolderAlarm::ScrollHint(d) => self.on_scroll_hint_alarm(d),
            FolderAlarm::ScrollFinished(d) => {
                self.grid.complete_pending_page_changes();
                self.drag_over(&d);
            }
        }
    }

    fn on_reorder_alarm(&mut self) {
        self.grid
            .real_time_reorder(self.session.empty_cell_rank, self.session.target_rank);
        self.session.empty_cell_rank = self.session.target_rank;
    }

    fn target_rank_for(&self, d: &DragObject) -> usize {
        self.grid.find_nearest_area(d.x, d.y)
    }

    fn drag_over(&mut self, d: &DragObject) {
        if self.scroll_pause_alarm.alarm_pending() {
            return;
        }
        self.session.phase = DragPhase::Over;

        let target = self.target_rank_for(d);
        self.session.target_rank = target;
        if self.session.prev_target_rank != Some(target) {
            self.reorder_alarm.cancel_alarm();
            self.reorder_alarm
                .set_alarm(REORDER_DELAY_MS, FolderAlarm::Reorder);
            self.session.prev_target_rank = Some(target);
            if d.announce {
                self.push_effect(FolderEffect::Announce(Announcement::MoveToPosition(
                    target + 1,
                )));
            }
        }

        let cell_overlap = self.grid.geometry().cell_width() * ICON_OVERSCROLL_WIDTH_FACTOR;
        let outside_left = d.x < cell_overlap;
        let outside_right = d.x > self.grid.desired_width() - cell_overlap;
        let (towards_start, towards_end) = if self.grid.geometry().is_rtl() {
            (outside_right, outside_left)
        } else {
            (outside_left, outside_right)
        };

        let page = self.grid.next_page();
        if page > 0 && towards_start {
            self.show_scroll_hint(ScrollDirection::Left, d);
        } else if page + 1 < self.grid.page_count() && towards_end {
            self.show_scroll_hint(ScrollDirection::Right, d);
        } else {
            self.on_scroll_hint_alarm.cancel_alarm();
            if self.session.scroll_hint_dir.take().is_some() {
                self.grid.clear_scroll_hint();
            }
        }
    }

    fn show_scroll_hint(&mut self, direction: ScrollDirection, d: &DragObject) {
        if self.session.scroll_hint_dir != Some(direction) {
            self.grid.show_scroll_hint(direction);
            self.session.scroll_hint_dir = Some(direction);
        }

        if !self.on_scroll_hint_alarm.alarm_pending()
            || self.session.current_scroll_dir != Some(direction)
        {
            self.session.current_scroll_dir = Some(direction);
            self.on_scroll_hint_alarm.cancel_alarm();
            self.on_scroll_hint_alarm
                .set_alarm(SCROLL_HINT_DURATION_MS, FolderAlarm::ScrollHint(d.clone()));

            // Hold the gap in place while the page is about to change.
            self.reorder_alarm.cancel_alarm();
            self.session.target_rank = self.session.empty_cell_rank;
        }
    }

    fn on_scroll_hint_alarm(&mut self, d: DragObject) {
        match self.session.current_scroll_dir.take() {
            Some(ScrollDirection::Left) => self.grid.scroll_left(),
            Some(ScrollDirection::Right) => self.grid.scroll_right(),
            None => return,
        }
        debug!(
            "folder {:?} scrolling to page {}",
            self.id,
            self.grid.next_page()
        );
        self.grid.clear_scroll_hint();
        self.session.scroll_hint_dir = None;
        self.scroll_pause_alarm
            .set_alarm(RESCROLL_DELAY_MS, FolderAlarm::ScrollFinished(d));
    }

    fn clear_drag_hint(&mut self) {
        self.on_scroll_hint_alarm.cancel_alarm();
        self.scroll_pause_alarm.cancel_alarm();
        if self.session.scroll_hint_dir.take().is_some() {
            self.grid.clear_scroll_hint();
        }
    }

    /// Settles a drag that left the folder: closes it if open, otherwise compacts the grid.
    pub(super) fn complete_drag_exit(&mut self) {
        if self.is_open {
            self.close(true);
            self.rearrange_on_close = true;
        } else if self.state == FolderState::Animating {
            self.rearrange_on_close = true;
        } else {
            self.rearrange_children();
            self.clear_drag_info();
        }
    }

    pub(super) fn clear_drag_info(&mut self) {
        self.session.current_drag_view = None;
        self.session.is_external_drag = false;
        self.session.phase = DragPhase::Idle;
    }

    fn complete_drop(
        &mut self,
        target: DropTargetId,
        d: &DragObject,
        is_fling_to_delete: bool,
        success: bool,
        after_uninstall: bool,
    ) {
        let successful_drop = success && (!after_uninstall || self.uninstall_successful);
        let dropped_on_self = target == DropTargetId::Folder(self.id);

        if successful_drop {
            if self.delete_folder_on_drop_completed
                && !self.session.item_added_back_to_self_via_icon
                && !dropped_on_self
            {
                self.replace_folder_with_final_item();
            }
        } else {
            self.restore_dragged_item(d);
        }

        if !dropped_on_self && self.on_exit_alarm.alarm_pending() {
            self.on_exit_alarm.cancel_alarm();
            if !successful_drop {
                self.suppress_folder_deletion = true;
            }
            self.scroll_pause_alarm.cancel_alarm();
            self.complete_drag_exit();
        }

        self.delete_folder_on_drop_completed = false;
        self.session.drag_in_progress = false;
        self.session.item_added_back_to_self_via_icon = false;
        self.session.current_drag_view = None;
        self.session.phase = DragPhase::Idle;

        self.update_item_locations_in_database_batch();
        if self.grid.item_count() <= self.grid.items_per_page() {
            self.set_folder_option(FLAG_MULTI_PAGE_ANIMATION, false);
        }

        if !is_fling_to_delete {
            self.push_effect(FolderEffect::ExitSpringLoaded { successful_drop });
        }
    }

    /// Puts a dragged item back at its original rank after a failed drop.
    fn restore_dragged_item(&mut self, d: &DragObject) {
        let item = d.item.clone();
        if self.grid.item(item.id).is_some() {
            warn!(
                "failed drop of {:?} but it is still in folder {:?}",
                item.id, self.id
            );
            self.rearrange_children();
            return;
        }
        let mut views = self.grid.take_items_in_reading_order();
        let at = item.rank.min(views.len());
        views.insert(at, Some(item.clone()));
        let count = views.len();
        self.grid.arrange_children(views, count);

        self.notify_drop();
        let mut folder = self.suppress_info_changes();
        folder.info.add(item.id);
    }
}

impl DropTarget for Folder {
    fn accept_drop(&self, d: &DragObject) -> bool {
        d.item.kind.fits_in_folder() && !self.is_full()
    }

    fn on_drag_enter(&mut self, d: &DragObject) {
        self.ensure_alive();
        self.session.prev_target_rank = None;
        self.on_exit_alarm.cancel_alarm();
        self.session.scroll_area_offset = d.drag_region_width / 2.0 - d.x_offset;
        self.session.phase = DragPhase::Entered;
    }

    fn on_drag_over(&mut self, d: &DragObject) {
        self.ensure_alive();
        self.drag_over(d);
    }

    fn on_drag_exit(&mut self, d: &DragObject) {
        self.ensure_alive();
        // A completed drag exits right before its drop, so the folder stays open.
        if !d.drag_complete {
            self.on_exit_alarm
                .set_alarm(ON_EXIT_CLOSE_DELAY_MS, FolderAlarm::ExitClose);
        }
        self.reorder_alarm.cancel_alarm();
        self.clear_drag_hint();
        self.session.phase = DragPhase::Exiting;
    }

    fn on_drop(&mut self, d: &DragObject) {
        self.ensure_alive();
        self.session.phase = DragPhase::Dropping;

        // The gap is off the page being scrolled to: pull it to where the item was released.
        if !self.grid.rank_on_next_page(self.session.empty_cell_rank) {
            self.session.target_rank = self.target_rank_for(d);
            self.on_reorder_alarm();
            self.clear_drag_hint();
        }
        self.reorder_alarm.cancel_alarm();
        self.grid.complete_pending_page_changes();

        let item = d.item.make_shortcut();
        let rank = self.session.empty_cell_rank;
        if self.session.is_external_drag {
            self.grid.add_view_for_rank(item.clone(), rank);
            if let Some(placed) = self.grid.item(item.id).cloned() {
                self.push_effect(FolderEffect::AddOrMoveItem {
                    container: ContainerId::Folder(self.id),
                    screen_id: 0,
                    cell_x: placed.cell_x,
                    cell_y: placed.cell_y,
                    item: placed,
                });
            }
            if d.source != DragSourceKind::Folder(self.id) {
                self.update_item_locations_in_database_batch();
            }
            self.session.is_external_drag = false;
        } else {
            if self.session.current_drag_view.take() != Some(item.id) {
                warn!(
                    "drag view for {:?} is gone, recreating it in folder {:?}",
                    item.id, self.id
                );
            }
            self.grid.add_view_for_rank(item.clone(), rank);
        }

        self.rearrange_children();
        {
            let mut folder = self.suppress_info_changes();
            folder.info.add(item.id);
        }
        self.session.drag_in_progress = false;

        if self.grid.page_count() > 1 {
            self.set_folder_option(FLAG_MULTI_PAGE_ANIMATION, true);
        }
        if d.announce {
            self.push_effect(FolderEffect::Announce(Announcement::ItemMoved));
        }
    }

    fn prepare_accessibility_drop(&mut self) {
        if self.reorder_alarm.alarm_pending() {
            self.reorder_alarm.cancel_alarm();
            self.on_reorder_alarm();
        }
    }
}

impl DragSource for Folder {
    fn on_drop_completed(
        &mut self,
        target: DropTargetId,
        d: &DragObject,
        is_fling_to_delete: bool,
        success: bool,
    ) {
        if self.defer_drop_after_uninstall {
            debug!(
                "folder {:?} deferring drop completion until uninstall finishes",
                self.id
            );
            self.deferred_action = Some(DeferredDropCompletion {
                target,
                drag: d.clone(),
                is_fling_to_delete,
                success,
            });
            return;
        }
        self.complete_drop(target, d, is_fling_to_delete, success, false);
    }

    fn defer_complete_drop_after_uninstall(&mut self) {
        self.defer_drop_after_uninstall = true;
    }

    fn on_drag_object_removed(&mut self, success: bool) {
        self.defer_drop_after_uninstall = false;
        self.uninstall_successful = success;
        if let Some(deferred) = self.deferred_action.take() {
            self.complete_drop(
                deferred.target,
                &deferred.drag,
                deferred.is_fling_to_delete,
                deferred.success,
                true,
            );
        }
    }
}

impl DragListener for Folder {
    fn on_drag_start(&mut self, d: &DragObject) {
        if d.source != DragSourceKind::Folder(self.id) {
            return;
        }
        self.ensure_alive();
        if let Some(view) = self.session.current_drag_view {
            self.grid.remove_item(view);
        }
        {
            let mut folder = self.suppress_info_changes();
            folder.info.remove(d.item.id);
        }
        self.session.drag_in_progress = true;
        self.session.item_added_back_to_self_via_icon = false;
    }

    fn on_drag_end(&mut self) {
        if self.session.is_external_drag && self.session.drag_in_progress {
            self.complete_drag_exit();
        }
    }
}
