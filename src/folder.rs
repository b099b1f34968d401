//! A launcher folder: its grid, its drag session and its open/close lifecycle.
//!
//! The folder never touches storage or rendering itself. Every side effect is queued as a
//! [`FolderEffect`] and drained by the owner after each call.

mod drag;
mod lifecycle;
mod persist;
mod suppress;

use crate::alarm::{Alarm, Deadline, Timeline};
use crate::dnd::{DragObject, DropTargetId};
use crate::events::{FolderAlarm, FolderEffect, ItemUpdate, Transition};
use crate::grid::{FolderGrid, GridGeometry, ScrollDirection};
use crate::model::{FolderId, FolderInfo, FolderState, ItemId};
use crate::registry::OpenFolderRegistry;

pub use suppress::SuppressInfoChanges;

/// Debounce between the pointer settling on a cell and the grid shuffling to it.
pub const REORDER_DELAY_MS: u64 = 250;
/// How long the pointer must dwell at a page edge before the page flips.
pub const SCROLL_HINT_DURATION_MS: u64 = 500;
pub const PAGE_SNAP_ANIMATION_DURATION_MS: u64 = 500;
/// Drag-over is ignored for this long after a page flip.
pub const RESCROLL_DELAY_MS: u64 = PAGE_SNAP_ANIMATION_DURATION_MS + 150;
pub const ON_EXIT_CLOSE_DELAY_MS: u64 = 400;
/// Fraction of a cell's width at each side of the folder that acts as a scroll zone.
pub const ICON_OVERSCROLL_WIDTH_FACTOR: f32 = 0.45;

/// Shared loop-thread handles every folder is built with.
#[derive(Debug, Clone, Default)]
pub struct FolderContext {
    pub timeline: Timeline,
    pub open_folder: OpenFolderRegistry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Entered,
    Over,
    Exiting,
    Dropping,
}

#[derive(Debug, Default)]
struct DragSession {
    phase: DragPhase,
    target_rank: usize,
    prev_target_rank: Option<usize>,
    empty_cell_rank: usize,
    current_drag_view: Option<ItemId>,
    is_external_drag: bool,
    drag_in_progress: bool,
    item_added_back_to_self_via_icon: bool,
    scroll_area_offset: f32,
    scroll_hint_dir: Option<ScrollDirection>,
    current_scroll_dir: Option<ScrollDirection>,
}

/// A drop completion parked until the uninstall flow reports back.
#[derive(Debug, Clone)]
struct DeferredDropCompletion {
    target: DropTargetId,
    drag: DragObject,
    is_fling_to_delete: bool,
    success: bool,
}

#[derive(Debug)]
pub struct Folder {
    id: FolderId,
    info: FolderInfo,
    grid: FolderGrid,
    open_folder: OpenFolderRegistry,

    reorder_alarm: Alarm<FolderAlarm>,
    on_exit_alarm: Alarm<FolderAlarm>,
    on_scroll_hint_alarm: Alarm<FolderAlarm>,
    scroll_pause_alarm: Alarm<FolderAlarm>,

    session: DragSession,
    state: FolderState,
    is_open: bool,
    /// Between `animate_open` and the end of closing.
    attached: bool,
    pending_transition: Option<Transition>,
    open_sets_multi_page: bool,
    rearrange_on_close: bool,
    delete_folder_on_drop_completed: bool,
    suppress_folder_deletion: bool,
    destroyed: bool,

    deferred_action: Option<DeferredDropCompletion>,
    defer_drop_after_uninstall: bool,
    uninstall_successful: bool,

    listener_attached: bool,
    focus_bounds: Option<(ItemId, ItemId)>,
    effects: Vec<FolderEffect>,
}

#[derive(Debug, Clone, Copy)]
enum AlarmSlot {
    Reorder,
    OnExit,
    ScrollHint,
    ScrollPause,
}

impl Folder {
    pub fn new(info: FolderInfo, geometry: Box<dyn GridGeometry>, context: &FolderContext) -> Self {
        let timeline = &context.timeline;
        Self {
            id: info.id,
            info,
            grid: FolderGrid::new(geometry),
            open_folder: context.open_folder.clone(),
            reorder_alarm: Alarm::new(timeline.clone()),
            on_exit_alarm: Alarm::new(timeline.clone()),
            on_scroll_hint_alarm: Alarm::new(timeline.clone()),
            scroll_pause_alarm: Alarm::new(timeline.clone()),
            session: DragSession::default(),
            state: FolderState::None,
            is_open: false,
            attached: false,
            pending_transition: None,
            open_sets_multi_page: false,
            rearrange_on_close: false,
            delete_folder_on_drop_completed: false,
            suppress_folder_deletion: false,
            destroyed: false,
            deferred_action: None,
            defer_drop_after_uninstall: false,
            uninstall_successful: false,
            listener_attached: false,
            focus_bounds: None,
            effects: Vec::new(),
        }
    }

    pub fn id(&self) -> FolderId {
        self.id
    }

    pub fn info(&self) -> &FolderInfo {
        &self.info
    }

    pub fn grid(&self) -> &FolderGrid {
        &self.grid
    }

    pub fn state(&self) -> FolderState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn item_count(&self) -> usize {
        self.grid.item_count()
    }

    pub fn is_full(&self) -> bool {
        self.grid.is_full()
    }

    /// Item ids ordered by rank.
    pub fn items_in_reading_order(&self) -> Vec<ItemId> {
        self.grid.reading_order_ids()
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.session.phase
    }

    pub fn drag_in_progress(&self) -> bool {
        self.session.drag_in_progress
    }

    pub fn target_rank(&self) -> usize {
        self.session.target_rank
    }

    pub fn empty_cell_rank(&self) -> usize {
        self.session.empty_cell_rank
    }

    pub fn is_external_drag(&self) -> bool {
        self.session.is_external_drag
    }

    pub fn has_deferred_drop(&self) -> bool {
        self.deferred_action.is_some()
    }

    pub fn listener_attached(&self) -> bool {
        self.listener_attached
    }

    /// First and last item in reading order, used for keyboard focus wrapping.
    pub fn focus_bounds(&self) -> Option<(ItemId, ItemId)> {
        self.focus_bounds
    }

    pub fn reorder_pending(&self) -> bool {
        self.reorder_alarm.alarm_pending()
    }

    pub fn exit_close_pending(&self) -> bool {
        self.on_exit_alarm.alarm_pending()
    }

    pub fn scroll_hint_pending(&self) -> bool {
        self.on_scroll_hint_alarm.alarm_pending()
    }

    pub fn scroll_pause_pending(&self) -> bool {
        self.scroll_pause_alarm.alarm_pending()
    }

    pub fn take_effects(&mut self) -> Vec<FolderEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Earliest armed alarm of this folder.
    pub fn next_alarm(&self) -> Option<Deadline> {
        self.armed_alarms().map(|(_, deadline)| deadline).min()
    }

    /// Fires the earliest alarm if it is due. Returns whether anything fired.
    pub fn fire_next_alarm(&mut self) -> bool {
        let Some((slot, _)) = self.armed_alarms().min_by_key(|(_, deadline)| *deadline) else {
            return false;
        };
        let message = match slot {
            AlarmSlot::Reorder => self.reorder_alarm.take_due(),
            AlarmSlot::OnExit => self.on_exit_alarm.take_due(),
            AlarmSlot::ScrollHint => self.on_scroll_hint_alarm.take_due(),
            AlarmSlot::ScrollPause => self.scroll_pause_alarm.take_due(),
        };
        match message {
            Some(message) => {
                self.on_alarm(message);
                true
            }
            None => false,
        }
    }

    /// Fires every alarm that is due at the timeline's current time.
    pub fn fire_due_alarms(&mut self) -> usize {
        let mut fired = 0;
        while self.fire_next_alarm() {
            fired += 1;
        }
        fired
    }

    /// Applies install progress pushed from the background model.
    pub fn apply_item_updates(&mut self, updates: &[ItemUpdate]) -> usize {
        let mut applied = 0;
        for update in updates {
            if let Some(item) = self.grid.item_mut(update.id) {
                item.install_progress = update.install_progress;
                item.apply_status(update.status);
                applied += 1;
            }
        }
        applied
    }

    fn armed_alarms(&self) -> impl Iterator<Item = (AlarmSlot, Deadline)> {
        [
            (AlarmSlot::Reorder, self.reorder_alarm.deadline()),
            (AlarmSlot::OnExit, self.on_exit_alarm.deadline()),
            (AlarmSlot::ScrollHint, self.on_scroll_hint_alarm.deadline()),
            (AlarmSlot::ScrollPause, self.scroll_pause_alarm.deadline()),
        ]
        .into_iter()
        .filter_map(|(slot, deadline)| deadline.map(|deadline| (slot, deadline)))
    }

    fn cancel_all_alarms(&mut self) {
        self.reorder_alarm.cancel_alarm();
        self.on_exit_alarm.cancel_alarm();
        self.on_scroll_hint_alarm.cancel_alarm();
        self.scroll_pause_alarm.cancel_alarm();
    }

    /// Dissolved folders must never be driven again.
    fn ensure_alive(&self) {
        assert!(
            !self.destroyed,
            "folder {:?} used after it was dissolved",
            self.id
        );
    }

    fn push_effect(&mut self, effect: FolderEffect) {
        self.effects.push(effect);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::DeviceProfile;
    use crate::model::ItemInfo;

    pub fn unbound_folder(columns: usize, rows: usize) -> (Folder, FolderContext) {
        let context = FolderContext::default();
        let mut profile = DeviceProfile::new(columns, rows);
        profile.cell_width = 100.0;
        profile.cell_height = 100.0;
        let folder = Folder::new(FolderInfo::new(1, "Folder"), Box::new(profile), &context);
        (folder, context)
    }

    pub fn folder_with(columns: usize, rows: usize, count: u64) -> (Folder, FolderContext) {
        let (mut folder, context) = unbound_folder(columns, rows);
        let items = (0..count)
            .map(|id| ItemInfo::shortcut(id, &format!("app{id}")).with_rank(id as usize))
            .collect();
        folder.bind(items);
        folder.take_effects();
        (folder, context)
    }

    pub fn ids(folder: &Folder) -> Vec<u64> {
        folder
            .items_in_reading_order()
            .into_iter()
            .map(|id| id.0)
            .collect()
    }

    pub fn advance(folder: &mut Folder, context: &FolderContext, ms: u64) {
        let target = context.timeline.now_ms() + ms;
        while let Some(deadline) = folder.next_alarm() {
            if deadline.at_ms > target {
                break;
            }
            context.timeline.advance_to(deadline.at_ms);
            folder.fire_next_alarm();
        }
        context.timeline.advance_to(target);
    }
}
