use crate::model::FolderId;
use std::cell::Cell;
use std::rc::Rc;

/// The one folder allowed to be open. Shared by every folder on the loop thread.
#[derive(Debug, Clone, Default)]
pub struct OpenFolderRegistry {
    open: Rc<Cell<Option<FolderId>>>,
}

impl OpenFolderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<FolderId> {
        self.open.get()
    }

    pub fn claim(&self, id: FolderId) {
        self.open.set(Some(id));
    }

    /// Clears the registry only if `id` still holds it.
    pub fn release(&self, id: FolderId) {
        if self.open.get() == Some(id) {
            self.open.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_by_a_stale_holder_is_ignored() {
        let registry = OpenFolderRegistry::new();
        let shared = registry.clone();
        registry.claim(FolderId(1));
        shared.claim(FolderId(2));
        registry.release(FolderId(1));
        assert_eq!(registry.current(), Some(FolderId(2)));
        shared.release(FolderId(2));
        assert_eq!(registry.current(), None);
    }
}
