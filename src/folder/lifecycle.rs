use super::Folder;
use crate::dnd::ItemsChangedListener;
use crate::events::{Announcement, FolderEffect, Transition};
use crate::model::{
    item_pos_ordering, ContainerId, FolderState, ItemId, ItemInfo, FLAG_MULTI_PAGE_ANIMATION,
};
use log::{debug, info, warn};

impl Folder {
    /// Binds the folder to its stored items and starts listening for model changes.
    pub fn bind(&mut self, mut items: Vec<ItemInfo>) {
        self.ensure_alive();
        items.sort_by(item_pos_ordering);
        self.info.contents = items.iter().map(|item| item.id).collect();

        let overflow = self.grid.bind_items(items);
        for item in overflow {
            warn!(
                "folder {:?} is full, deleting overflow item {:?}",
                self.id, item.id
            );
            self.info.remove(item.id);
            self.push_effect(FolderEffect::DeleteItem(item));
        }

        self.listener_attached = true;
        self.state = FolderState::Small;
        self.update_text_view_focus();

        if self.grid.item_count() <= 1 {
            debug!(
                "folder {:?} bound with {} items, dissolving",
                self.id,
                self.grid.item_count()
            );
            self.replace_folder_with_final_item();
        }
    }

    /// Claims the open slot. The caller closes whichever folder held it first, which is why
    /// opening goes through [`crate::Workspace::open_folder`].
    pub(crate) fn animate_open(&mut self) {
        self.ensure_alive();
        if self.attached {
            debug!("folder {:?} is already attached", self.id);
        }
        self.attached = true;
        self.is_open = true;
        self.open_folder.claim(self.id);

        self.grid.complete_pending_page_changes();
        if !self.session.drag_in_progress {
            self.grid.snap_to_page_immediately(0);
        }
        self.delete_folder_on_drop_completed = false;

        self.open_sets_multi_page = !self.session.drag_in_progress
            && self.grid.page_count() > 1
            && !self.info.has_option(FLAG_MULTI_PAGE_ANIMATION);
        self.state = FolderState::Animating;
        self.pending_transition = Some(Transition::Open);
        self.push_effect(FolderEffect::PlayTransition {
            folder: self.id,
            transition: Transition::Open,
        });
        self.push_effect(FolderEffect::Announce(Announcement::FolderOpened));
    }

    pub fn close(&mut self, animate: bool) {
        self.ensure_alive();
        self.is_open = false;
        if !self.attached {
            return;
        }
        if self.pending_transition == Some(Transition::Close) {
            return;
        }
        if animate {
            self.state = FolderState::Animating;
            self.pending_transition = Some(Transition::Close);
            self.push_effect(FolderEffect::PlayTransition {
                folder: self.id,
                transition: Transition::Close,
            });
            self.push_effect(FolderEffect::Announce(Announcement::FolderClosed));
        } else {
            self.close_complete();
        }
    }

    /// Reports that a transition started by this folder finished playing.
    pub fn on_animation_complete(&mut self, transition: Transition) {
        if self.pending_transition != Some(transition) {
            debug!(
                "folder {:?} ignoring stale {:?} completion",
                self.id, transition
            );
            return;
        }
        self.pending_transition = None;
        match transition {
            Transition::Open => {
                self.state = FolderState::Open;
                if self.open_sets_multi_page && self.grid.page_count() > 1 {
                    self.set_folder_option(FLAG_MULTI_PAGE_ANIMATION, true);
                }
                self.open_sets_multi_page = false;
            }
            Transition::Close => self.close_complete(),
            Transition::Destroy => self.finish_dissolve(),
        }
    }

    fn close_complete(&mut self) {
        self.attached = false;
        self.pending_transition = None;
        self.is_open = false;
        self.open_folder.release(self.id);

        if self.rearrange_on_close {
            self.rearrange_children();
            self.rearrange_on_close = false;
        }
        if self.grid.item_count() <= 1 {
            if !self.session.drag_in_progress && !self.suppress_folder_deletion {
                self.replace_folder_with_final_item();
            } else if self.session.drag_in_progress {
                self.delete_folder_on_drop_completed = true;
            }
        }
        self.suppress_folder_deletion = false;
        self.clear_drag_info();
        self.state = FolderState::Small;
        self.push_effect(FolderEffect::FolderClosed(self.id));
    }

    /// Dissolves the folder, promoting its last item (if any) into the folder's place.
    pub fn replace_folder_with_final_item(&mut self) {
        self.destroyed = true;
        self.cancel_all_alarms();
        if self.grid.last_item().is_some() {
            self.pending_transition = Some(Transition::Destroy);
            self.push_effect(FolderEffect::PlayTransition {
                folder: self.id,
                transition: Transition::Destroy,
            });
        } else {
            self.finish_dissolve();
        }
    }

    fn finish_dissolve(&mut self) {
        if self.info.contents.len() > 1 {
            warn!(
                "folder {:?} regained {} items before dissolving, keeping it",
                self.id,
                self.info.contents.len()
            );
            return;
        }

        let final_item = self
            .info
            .contents
            .first()
            .copied()
            .and_then(|id| self.grid.remove_item(id));
        if let Some(mut item) = final_item {
            self.info.remove(item.id);
            item.container = self.info.container;
            item.rank = 0;
            item.cell_x = self.info.cell_x;
            item.cell_y = self.info.cell_y;
            self.push_effect(FolderEffect::AddOrMoveItem {
                item: item.clone(),
                container: self.info.container,
                screen_id: self.info.screen_id,
                cell_x: self.info.cell_x,
                cell_y: self.info.cell_y,
            });
            self.push_effect(FolderEffect::DeleteFolder(self.info.clone()));
            self.push_effect(FolderEffect::RemoveFolderIcon(self.id));
            self.push_effect(FolderEffect::PromoteItem {
                item,
                folder: self.info.clone(),
            });
        } else {
            self.push_effect(FolderEffect::DeleteFolder(self.info.clone()));
            self.push_effect(FolderEffect::RemoveFolderIcon(self.id));
        }
        info!("folder {:?} dissolved", self.id);
        self.push_effect(FolderEffect::FolderDissolved(self.id));
    }

    /// Compacts the grid to dense ranks in reading order.
    pub fn rearrange_children(&mut self) {
        let count = self.grid.item_count();
        self.grid.rearrange(count);
        self.update_text_view_focus();
    }

    pub fn rename(&mut self, title: &str) {
        self.ensure_alive();
        self.info.title = title.to_string();
        self.push_effect(FolderEffect::UpdateFolder(self.info.clone()));
    }

    /// Adds an item to the folder's model. The view follows through the change listener.
    pub fn add_item(&mut self, item: ItemInfo) {
        self.ensure_alive();
        self.info.add(item.id);
        if self.listener_attached {
            self.on_add(item);
        }
    }

    pub fn remove_item(&mut self, id: ItemId) {
        self.ensure_alive();
        if self.info.remove(id) && self.listener_attached {
            self.on_remove(id);
        }
    }

    pub(super) fn update_text_view_focus(&mut self) {
        self.focus_bounds = match (self.grid.first_item(), self.grid.last_item()) {
            (Some(first), Some(last)) => Some((first.id, last.id)),
            _ => None,
        };
    }
}

impl ItemsChangedListener for Folder {
    fn on_add(&mut self, item: ItemInfo) {
        self.ensure_alive();
        let rank = self.grid.allocate_rank_for_new_item();
        let id = item.id;
        self.grid.add_view_for_rank(item, rank);
        if let Some(placed) = self.grid.item(id).cloned() {
            self.push_effect(FolderEffect::AddOrMoveItem {
                container: ContainerId::Folder(self.id),
                screen_id: 0,
                cell_x: placed.cell_x,
                cell_y: placed.cell_y,
                item: placed,
            });
        }
        self.on_items_changed();
    }

    fn on_remove(&mut self, id: ItemId) {
        self.ensure_alive();
        self.grid.remove_item(id);
        if self.state == FolderState::Animating {
            self.rearrange_on_close = true;
        } else {
            self.rearrange_children();
        }
        if self.grid.item_count() <= 1 {
            if self.is_open {
                self.close(true);
            } else if self.session.drag_in_progress {
                // The dragged item may still come back if the drop fails.
                self.delete_folder_on_drop_completed = true;
            } else {
                self.replace_folder_with_final_item();
            }
        }
        self.on_items_changed();
    }

    fn on_items_changed(&mut self) {
        self.update_text_view_focus();
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{folder_with, ids, unbound_folder};
    use crate::events::{FolderEffect, Transition};
    use crate::model::{FolderState, ItemId, ItemInfo, FLAG_MULTI_PAGE_ANIMATION};
    use pretty_assertions::assert_eq;

    #[test]
    fn bind_sorts_and_prunes_overflow() {
        // One cell per page, three pages.
        let (mut folder, _context) = unbound_folder(1, 1);
        let items = vec![
            ItemInfo::shortcut(7, "c").with_rank(2),
            ItemInfo::shortcut(5, "a").with_rank(0),
            ItemInfo::shortcut(6, "b").with_rank(1),
            ItemInfo::shortcut(8, "d").with_rank(3),
        ];
        folder.bind(items);

        assert_eq!(ids(&folder), vec![5, 6, 7]);
        assert_eq!(folder.info().contents, vec![ItemId(5), ItemId(6), ItemId(7)]);
        let effects = folder.take_effects();
        assert!(effects.iter().any(
            |effect| matches!(effect, FolderEffect::DeleteItem(item) if item.id == ItemId(8))
        ));
        assert_eq!(folder.state(), FolderState::Small);
    }

    #[test]
    fn rename_writes_the_folder_record() {
        let (mut folder, _context) = folder_with(2, 2, 3);
        folder.rename("Games");
        assert_eq!(folder.info().title, "Games");
        assert!(matches!(
            folder.take_effects().as_slice(),
            [FolderEffect::UpdateFolder(info)] if info.title == "Games"
        ));
    }

    #[test]
    fn open_and_close_follow_the_transitions() {
        let (mut folder, context) = folder_with(2, 2, 6);
        folder.animate_open();
        assert_eq!(folder.state(), FolderState::Animating);
        assert_eq!(context.open_folder.current(), Some(folder.id()));

        folder.on_animation_complete(Transition::Close);
        assert_eq!(folder.state(), FolderState::Animating);

        folder.on_animation_complete(Transition::Open);
        assert_eq!(folder.state(), FolderState::Open);
        assert!(folder.info().has_option(FLAG_MULTI_PAGE_ANIMATION));

        folder.close(true);
        assert!(!folder.is_open());
        folder.on_animation_complete(Transition::Close);
        assert_eq!(folder.state(), FolderState::Small);
        assert_eq!(context.open_folder.current(), None);
    }

    #[test]
    fn removing_down_to_one_item_dissolves_a_closed_folder() {
        let (mut folder, _context) = folder_with(3, 3, 2);
        folder.remove_item(ItemId(0));
        assert!(folder.is_destroyed());
        let effects = folder.take_effects();
        assert!(effects.contains(&FolderEffect::PlayTransition {
            folder: folder.id(),
            transition: Transition::Destroy,
        }));

        folder.on_animation_complete(Transition::Destroy);
        let effects = folder.take_effects();
        assert!(effects.iter().any(
            |effect| matches!(effect, FolderEffect::PromoteItem { item, .. } if item.id == ItemId(1))
        ));
        assert_eq!(
            effects.last(),
            Some(&FolderEffect::FolderDissolved(folder.id()))
        );
    }

    #[test]
    fn add_item_places_the_view_at_the_end() {
        let (mut folder, _context) = folder_with(3, 3, 3);
        folder.add_item(ItemInfo::shortcut(9, "New"));
        assert_eq!(ids(&folder), vec![0, 1, 2, 9]);
        assert_eq!(folder.focus_bounds(), Some((ItemId(0), ItemId(9))));
    }

    #[test]
    fn rearrange_is_idempotent() {
        let (mut folder, _context) = folder_with(3, 3, 5);
        folder.rearrange_children();
        let once: Vec<_> = folder.grid().items_in_reading_order().cloned().collect();
        folder.rearrange_children();
        let twice: Vec<_> = folder.grid().items_in_reading_order().cloned().collect();
        assert_eq!(once, twice);
    }
}
