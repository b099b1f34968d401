//! Paged grid of folder cells and the rank bookkeeping behind it.

use crate::model::{ItemId, ItemInfo};
use log::{debug, warn};
use std::fmt;

/// Device-profile answers the grid needs. Cell coordinates are in folder content space.
pub trait GridGeometry: fmt::Debug {
    fn columns(&self) -> usize;
    fn rows(&self) -> usize;
    fn cell_width(&self) -> f32;
    fn cell_height(&self) -> f32;
    fn max_pages(&self) -> usize;

    fn is_rtl(&self) -> bool {
        false
    }

    fn items_per_page(&self) -> usize {
        (self.columns() * self.rows()).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// Slots hold the item views in rank order. A `None` slot is an empty cell a drag has opened.
#[derive(Debug)]
pub struct FolderGrid {
    geometry: Box<dyn GridGeometry>,
    slots: Vec<Option<ItemInfo>>,
    current_page: usize,
    pending_page: Option<usize>,
    scroll_hint: Option<ScrollDirection>,
}

impl FolderGrid {
    pub fn new(geometry: Box<dyn GridGeometry>) -> Self {
        Self {
            geometry,
            slots: Vec::new(),
            current_page: 0,
            pending_page: None,
            scroll_hint: None,
        }
    }

    pub fn geometry(&self) -> &dyn GridGeometry {
        self.geometry.as_ref()
    }

    pub fn items_per_page(&self) -> usize {
        self.geometry.items_per_page()
    }

    pub fn max_item_count(&self) -> usize {
        self.items_per_page() * self.geometry.max_pages().max(1)
    }

    pub fn item_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Cells currently laid out, including empty ones.
    pub fn allocated_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn page_count(&self) -> usize {
        self.slots.len().div_ceil(self.items_per_page()).max(1)
    }

    pub fn is_full(&self) -> bool {
        self.item_count() >= self.max_item_count()
    }

    pub fn desired_width(&self) -> f32 {
        self.geometry.columns() as f32 * self.geometry.cell_width()
    }

    pub fn desired_height(&self) -> f32 {
        self.geometry.rows() as f32 * self.geometry.cell_height()
    }

    /// Lays out freshly bound items and returns whatever does not fit.
    pub fn bind_items(&mut self, mut items: Vec<ItemInfo>) -> Vec<ItemInfo> {
        let max = self.max_item_count();
        let overflow = if items.len() > max {
            items.split_off(max)
        } else {
            Vec::new()
        };
        let count = items.len();
        self.arrange_children(items.into_iter().map(Some).collect(), count);
        self.current_page = 0;
        self.pending_page = None;
        overflow
    }

    pub fn items_in_reading_order(&self) -> impl Iterator<Item = &ItemInfo> {
        self.slots.iter().flatten()
    }

    pub fn reading_order_ids(&self) -> Vec<ItemId> {
        self.items_in_reading_order().map(|item| item.id).collect()
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemInfo> {
        self.items_in_reading_order().find(|item| item.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut ItemInfo> {
        self.slots.iter_mut().flatten().find(|item| item.id == id)
    }

    pub fn first_item(&self) -> Option<&ItemInfo> {
        self.items_in_reading_order().next()
    }

    pub fn last_item(&self) -> Option<&ItemInfo> {
        self.items_in_reading_order().last()
    }

    /// Removes the item's view, leaving its cell empty until the next arrange.
    pub fn remove_item(&mut self, id: ItemId) -> Option<ItemInfo> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|item| item.id == id))?;
        slot.take()
    }

    /// Empties the grid, yielding the items in reading order.
    pub fn take_items_in_reading_order(&mut self) -> Vec<Option<ItemInfo>> {
        self.slots.drain(..).filter(Option::is_some).collect()
    }

    /// Assigns dense ranks in the given order. When `minimum_slots` exceeds the list, the
    /// remaining cells stay empty at the end.
    pub fn arrange_children(&mut self, mut ordered: Vec<Option<ItemInfo>>, minimum_slots: usize) {
        if ordered.len() < minimum_slots {
            ordered.resize(minimum_slots, None);
        }
        self.slots = ordered;
        self.assign_positions();
    }

    /// Compacts to the current reading order, keeping at least `minimum_slots` cells.
    pub fn rearrange(&mut self, minimum_slots: usize) {
        let items = self.take_items_in_reading_order();
        let slots = minimum_slots.max(items.len());
        self.arrange_children(items, slots);
    }

    /// Opens an empty cell at the end for an incoming item and pages to it.
    pub fn allocate_rank_for_new_item(&mut self) -> usize {
        let rank = self.item_count();
        let mut items = self.take_items_in_reading_order();
        items.insert(rank.min(items.len()), None);
        let count = items.len();
        self.arrange_children(items, count);
        self.current_page = rank / self.items_per_page();
        self.pending_page = None;
        rank
    }

    /// Places an item view in the cell for `rank`, which should be empty.
    pub fn add_view_for_rank(&mut self, item: ItemInfo, rank: usize) {
        match self.slots.get_mut(rank) {
            Some(slot @ None) => *slot = Some(item),
            _ => {
                warn!(
                    "cell {} is not an open slot ({} allocated), inserting item {:?}",
                    rank,
                    self.slots.len(),
                    item.id
                );
                let at = rank.min(self.slots.len());
                self.slots.insert(at, Some(item));
            }
        }
        self.assign_positions();
    }

    /// Moves the empty cell from `empty` to `target`, shifting the items in between one cell
    /// toward the old gap.
    pub fn real_time_reorder(&mut self, empty: usize, target: usize) {
        if empty == target {
            return;
        }
        let len = self.slots.len();
        if empty >= len || target >= len || self.slots[empty].is_some() {
            warn!(
                "inconsistent reorder from {} to {} over {} cells, compacting",
                empty, target, len
            );
            let slots = len.max(self.item_count());
            self.rearrange(slots);
            return;
        }
        debug!("reorder empty cell {} -> {}", empty, target);
        let gap = self.slots.remove(empty);
        self.slots.insert(target, gap);
        self.assign_positions();
    }

    /// Rank of the cell nearest to a point on the page being shown, ties going to the lower
    /// rank.
    pub fn find_nearest_area(&self, x: f32, y: f32) -> usize {
        let columns = self.geometry.columns().max(1);
        let rows = self.geometry.rows().max(1);
        let cell_w = self.geometry.cell_width();
        let cell_h = self.geometry.cell_height();

        let mut best = 0usize;
        let mut best_distance = f32::INFINITY;
        for row in 0..rows {
            for reading_col in 0..columns {
                let col = if self.geometry.is_rtl() {
                    columns - 1 - reading_col
                } else {
                    reading_col
                };
                let cx = (col as f32 + 0.5) * cell_w;
                let cy = (row as f32 + 0.5) * cell_h;
                let distance = (x - cx).powi(2) + (y - cy).powi(2);
                if distance < best_distance {
                    best_distance = distance;
                    best = row * columns + reading_col;
                }
            }
        }

        let rank = self.next_page() * self.items_per_page() + best;
        rank.min(self.slots.len().saturating_sub(1))
    }

    /// Whether `rank` sits on the page being shown once any pending scroll settles.
    pub fn rank_on_next_page(&self, rank: usize) -> bool {
        rank / self.items_per_page() == self.next_page()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// The page being scrolled to, or the current one when no snap is pending.
    pub fn next_page(&self) -> usize {
        self.pending_page.unwrap_or(self.current_page)
    }

    pub fn scroll_left(&mut self) {
        let next = self.next_page();
        if next > 0 {
            self.pending_page = Some(next - 1);
        }
    }

    pub fn scroll_right(&mut self) {
        let next = self.next_page();
        if next + 1 < self.page_count() {
            self.pending_page = Some(next + 1);
        }
    }

    pub fn complete_pending_page_changes(&mut self) {
        if let Some(page) = self.pending_page.take() {
            self.current_page = page;
        }
    }

    pub fn snap_to_page_immediately(&mut self, page: usize) {
        self.pending_page = None;
        self.current_page = page.min(self.page_count() - 1);
    }

    pub fn show_scroll_hint(&mut self, direction: ScrollDirection) {
        self.scroll_hint = Some(direction);
    }

    pub fn clear_scroll_hint(&mut self) {
        self.scroll_hint = None;
    }

    pub fn scroll_hint(&self) -> Option<ScrollDirection> {
        self.scroll_hint
    }

    fn assign_positions(&mut self) {
        let per_page = self.items_per_page();
        let columns = self.geometry.columns().max(1);
        for (rank, slot) in self.slots.iter_mut().enumerate() {
            if let Some(item) = slot {
                let pos = rank % per_page;
                item.rank = rank;
                item.cell_x = (pos % columns) as i32;
                item.cell_y = (pos / columns) as i32;
            }
        }
        let last_page = self.page_count() - 1;
        self.current_page = self.current_page.min(last_page);
        if let Some(page) = self.pending_page {
            self.pending_page = Some(page.min(last_page));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct TestGeometry {
        columns: usize,
        rows: usize,
        rtl: bool,
    }

    impl GridGeometry for TestGeometry {
        fn columns(&self) -> usize {
            self.columns
        }
        fn rows(&self) -> usize {
            self.rows
        }
        fn cell_width(&self) -> f32 {
            100.0
        }
        fn cell_height(&self) -> f32 {
            120.0
        }
        fn max_pages(&self) -> usize {
            3
        }
        fn is_rtl(&self) -> bool {
            self.rtl
        }
    }

    fn grid_2x2(count: u64) -> FolderGrid {
        let mut grid = FolderGrid::new(Box::new(TestGeometry {
            columns: 2,
            rows: 2,
            rtl: false,
        }));
        let items = (0..count)
            .map(|id| ItemInfo::shortcut(id, &format!("item{id}")))
            .collect();
        grid.bind_items(items);
        grid
    }

    fn ids(grid: &FolderGrid) -> Vec<Option<u64>> {
        grid.slots
            .iter()
            .map(|slot| slot.as_ref().map(|item| item.id.0))
            .collect()
    }

    #[test]
    fn bind_assigns_dense_ranks_and_cells() {
        let grid = grid_2x2(5);
        assert_eq!(grid.page_count(), 2);
        let placed: Vec<(usize, i32, i32)> = grid
            .items_in_reading_order()
            .map(|item| (item.rank, item.cell_x, item.cell_y))
            .collect();
        assert_eq!(
            placed,
            vec![(0, 0, 0), (1, 1, 0), (2, 0, 1), (3, 1, 1), (4, 0, 0)]
        );
    }

    #[test]
    fn bind_returns_overflow_beyond_capacity() {
        let mut grid = grid_2x2(0);
        let items = (0..14).map(|id| ItemInfo::shortcut(id, "x")).collect();
        let overflow = grid.bind_items(items);
        assert_eq!(grid.item_count(), 12);
        assert!(grid.is_full());
        assert_eq!(overflow.iter().map(|item| item.id.0).collect::<Vec<_>>(), vec![12, 13]);
    }

    #[test]
    fn nearest_area_prefers_lower_rank_on_ties() {
        let grid = grid_2x2(4);
        assert_eq!(grid.find_nearest_area(10.0, 10.0), 0);
        assert_eq!(grid.find_nearest_area(190.0, 20.0), 1);
        assert_eq!(grid.find_nearest_area(20.0, 230.0), 2);
        // Exactly between the two top cells.
        assert_eq!(grid.find_nearest_area(100.0, 60.0), 0);
    }

    #[test]
    fn nearest_area_is_clamped_to_allocated_cells() {
        let mut grid = grid_2x2(5);
        grid.snap_to_page_immediately(1);
        assert_eq!(grid.find_nearest_area(190.0, 230.0), 4);
    }

    #[test]
    fn nearest_area_mirrors_columns_for_rtl() {
        let mut grid = FolderGrid::new(Box::new(TestGeometry {
            columns: 2,
            rows: 2,
            rtl: true,
        }));
        grid.bind_items((0..4).map(|id| ItemInfo::shortcut(id, "x")).collect());
        assert_eq!(grid.find_nearest_area(190.0, 20.0), 0);
        assert_eq!(grid.find_nearest_area(10.0, 20.0), 1);
    }

    #[test]
    fn real_time_reorder_moves_the_gap() {
        let mut grid = grid_2x2(5);
        grid.remove_item(ItemId(4));
        assert_eq!(ids(&grid), vec![Some(0), Some(1), Some(2), Some(3), None]);

        grid.real_time_reorder(4, 0);
        assert_eq!(ids(&grid), vec![None, Some(0), Some(1), Some(2), Some(3)]);
        assert_eq!(grid.item(ItemId(3)).map(|item| item.rank), Some(4));

        grid.real_time_reorder(0, 2);
        assert_eq!(ids(&grid), vec![Some(0), Some(1), None, Some(2), Some(3)]);
    }

    #[test]
    fn inconsistent_reorder_compacts_instead() {
        let mut grid = grid_2x2(3);
        grid.real_time_reorder(1, 2);
        assert_eq!(ids(&grid), vec![Some(0), Some(1), Some(2)]);
        let ranks: Vec<usize> = grid.items_in_reading_order().map(|item| item.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn arrange_keeps_trailing_empty_slots() {
        let mut grid = grid_2x2(3);
        grid.rearrange(5);
        assert_eq!(grid.allocated_slots(), 5);
        assert_eq!(grid.page_count(), 2);
        assert_eq!(ids(&grid), vec![Some(0), Some(1), Some(2), None, None]);
    }

    #[test]
    fn rearrange_is_idempotent() {
        let mut grid = grid_2x2(5);
        grid.remove_item(ItemId(1));
        grid.rearrange(0);
        let first: Vec<ItemInfo> = grid.items_in_reading_order().cloned().collect();
        grid.rearrange(0);
        let second: Vec<ItemInfo> = grid.items_in_reading_order().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(first.iter().map(|item| item.rank).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn allocate_rank_opens_a_cell_at_the_end() {
        let mut grid = grid_2x2(4);
        let rank = grid.allocate_rank_for_new_item();
        assert_eq!(rank, 4);
        assert_eq!(grid.allocated_slots(), 5);
        assert_eq!(grid.current_page(), 1);

        grid.add_view_for_rank(ItemInfo::shortcut(40, "new"), rank);
        assert_eq!(grid.item(ItemId(40)).map(|item| item.rank), Some(4));
        assert_eq!(grid.item_count(), 5);
    }

    #[test]
    fn occupied_target_cell_is_inserted_not_overwritten() {
        let mut grid = grid_2x2(2);
        grid.add_view_for_rank(ItemInfo::shortcut(7, "x"), 0);
        assert_eq!(ids(&grid), vec![Some(7), Some(0), Some(1)]);
    }

    #[test]
    fn page_scrolling_is_bounded() {
        let mut grid = grid_2x2(5);
        grid.scroll_left();
        assert_eq!(grid.next_page(), 0);
        grid.scroll_right();
        assert_eq!(grid.next_page(), 1);
        assert_eq!(grid.current_page(), 0);
        assert!(grid.rank_on_next_page(4));
        assert!(!grid.rank_on_next_page(0));
        grid.scroll_right();
        assert_eq!(grid.next_page(), 1);
        grid.complete_pending_page_changes();
        assert_eq!(grid.current_page(), 1);
        assert!(grid.rank_on_next_page(4));
        assert!(!grid.rank_on_next_page(0));
    }
}
