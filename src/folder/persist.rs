use super::Folder;
use crate::events::FolderEffect;
use crate::model::ContainerId;
use log::debug;

impl Folder {
    /// Writes every item's reading-order rank in one batch.
    pub(super) fn update_item_locations_in_database_batch(&mut self) {
        let ids = self.grid.reading_order_ids();
        let mut items = Vec::with_capacity(ids.len());
        for (rank, id) in ids.into_iter().enumerate() {
            if let Some(item) = self.grid.item_mut(id) {
                item.rank = rank;
                items.push(item.clone());
            }
        }
        debug!("folder {:?} persisting {} ranks", self.id, items.len());
        self.push_effect(FolderEffect::MoveItems {
            items,
            container: ContainerId::Folder(self.id),
            screen_id: 0,
        });
    }

    /// Persists a folder option if it actually changed. Dissolved folders have no record left.
    pub(super) fn set_folder_option(&mut self, flag: u32, enabled: bool) {
        if self.destroyed {
            return;
        }
        if self.info.set_option(flag, enabled) {
            self.push_effect(FolderEffect::UpdateFolder(self.info.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::folder_with;
    use crate::events::FolderEffect;
    use crate::model::{ContainerId, ItemId, FLAG_MULTI_PAGE_ANIMATION};

    #[test]
    fn batch_write_uses_reading_order_ranks() {
        let (mut folder, _context) = folder_with(3, 3, 3);
        folder.grid.remove_item(ItemId(1));
        folder.update_item_locations_in_database_batch();

        let effects = folder.take_effects();
        let [FolderEffect::MoveItems {
            items, container, ..
        }] = effects.as_slice()
        else {
            panic!("expected one batch write, got {effects:?}");
        };
        assert_eq!(*container, ContainerId::Folder(folder.id()));
        let ranks: Vec<_> = items.iter().map(|item| (item.id, item.rank)).collect();
        assert_eq!(ranks, vec![(ItemId(0), 0), (ItemId(2), 1)]);
    }

    #[test]
    fn unchanged_option_is_not_written() {
        let (mut folder, _context) = folder_with(3, 3, 3);
        folder.set_folder_option(FLAG_MULTI_PAGE_ANIMATION, false);
        assert!(folder.take_effects().is_empty());
        folder.set_folder_option(FLAG_MULTI_PAGE_ANIMATION, true);
        assert_eq!(folder.take_effects().len(), 1);
    }
}
