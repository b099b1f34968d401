use super::Folder;
use std::ops::{Deref, DerefMut};

/// Detaches the folder from its own model-change notifications for as long as the guard lives.
///
/// Used when the folder edits its model directly and has already updated the grid itself.
/// Dropping the guard reattaches the listener, including when unwinding.
pub struct SuppressInfoChanges<'a> {
    folder: &'a mut Folder,
}

impl<'a> SuppressInfoChanges<'a> {
    fn new(folder: &'a mut Folder) -> Self {
        folder.listener_attached = false;
        Self { folder }
    }
}

impl Deref for SuppressInfoChanges<'_> {
    type Target = Folder;

    fn deref(&self) -> &Folder {
        self.folder
    }
}

impl DerefMut for SuppressInfoChanges<'_> {
    fn deref_mut(&mut self) -> &mut Folder {
        self.folder
    }
}

impl Drop for SuppressInfoChanges<'_> {
    fn drop(&mut self) {
        self.folder.listener_attached = true;
        self.folder.update_text_view_focus();
    }
}

impl Folder {
    pub fn suppress_info_changes(&mut self) -> SuppressInfoChanges<'_> {
        SuppressInfoChanges::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{folder_with, ids};
    use crate::model::{ItemId, ItemInfo};
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn model_edits_under_the_guard_skip_the_grid() {
        let (mut folder, _context) = folder_with(3, 3, 3);
        {
            let mut guarded = folder.suppress_info_changes();
            assert!(!guarded.listener_attached());
            guarded.add_item(ItemInfo::shortcut(12, "Notes"));
        }
        assert!(folder.listener_attached());
        assert!(folder.info().contents.contains(&ItemId(12)));
        assert_eq!(ids(&folder), vec![0, 1, 2]);
    }

    #[test]
    fn listener_comes_back_after_a_panic() {
        let (mut folder, _context) = folder_with(3, 3, 3);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guarded = folder.suppress_info_changes();
            panic!("model edit failed");
        }));
        assert!(result.is_err());
        assert!(folder.listener_attached());
    }
}
