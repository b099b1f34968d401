//! Loop-thread owner of all folders: routes calls, fires alarms and drains effects.

use crate::alarm::{Deadline, Timeline};
use crate::config::DeviceProfile;
use crate::dnd::DragSource;
use crate::events::{FolderEffect, UiEvent};
use crate::folder::{Folder, FolderContext};
use crate::host::{apply_effect, FolderHost};
use crate::install::{spawn_install_worker, PackageInstallInfo, SharedDataModel};
use crate::model::{FolderId, FolderInfo, ItemInfo};
use crate::registry::OpenFolderRegistry;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("folder {0:?} does not exist or was dissolved")]
    FolderNotFound(FolderId),
    #[error("folder {0:?} is already bound")]
    DuplicateFolder(FolderId),
}

pub struct Workspace<H: FolderHost> {
    context: FolderContext,
    profile: DeviceProfile,
    folders: BTreeMap<FolderId, Folder>,
    host: H,
    ui_tx: Sender<UiEvent>,
    ui_rx: Receiver<UiEvent>,
}

impl<H: FolderHost> Workspace<H> {
    pub fn new(profile: DeviceProfile, host: H) -> Self {
        let (ui_tx, ui_rx) = unbounded();
        Self {
            context: FolderContext::default(),
            profile: profile.sanitized(),
            folders: BTreeMap::new(),
            host,
            ui_tx,
            ui_rx,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.context.timeline
    }

    pub fn open_folder_registry(&self) -> &OpenFolderRegistry {
        &self.context.open_folder
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Handle for worker threads to post events back to the loop.
    pub fn sender(&self) -> Sender<UiEvent> {
        self.ui_tx.clone()
    }

    pub fn folder_ids(&self) -> Vec<FolderId> {
        self.folders.keys().copied().collect()
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(&id)
    }

    /// Creates and binds a folder. A folder bound with one item or fewer dissolves right away.
    pub fn add_folder(
        &mut self,
        info: FolderInfo,
        items: Vec<ItemInfo>,
    ) -> Result<FolderId, WorkspaceError> {
        let id = info.id;
        if self.folders.contains_key(&id) {
            return Err(WorkspaceError::DuplicateFolder(id));
        }
        let mut folder = Folder::new(info, Box::new(self.profile.clone()), &self.context);
        folder.bind(items);
        info!("bound folder {:?} with {} items", id, folder.item_count());
        self.folders.insert(id, folder);
        self.drain_effects(id);
        Ok(id)
    }

    /// Runs `f` against a folder and hands the effects it queued to the host.
    pub fn with_folder<R>(
        &mut self,
        id: FolderId,
        f: impl FnOnce(&mut Folder) -> R,
    ) -> Result<R, WorkspaceError> {
        let folder = self
            .folders
            .get_mut(&id)
            .ok_or(WorkspaceError::FolderNotFound(id))?;
        let result = f(folder);
        self.drain_effects(id);
        Ok(result)
    }

    /// Opens a folder, closing whichever folder currently holds the open slot.
    pub fn open_folder(&mut self, id: FolderId) -> Result<(), WorkspaceError> {
        if !self.folders.contains_key(&id) {
            return Err(WorkspaceError::FolderNotFound(id));
        }
        if let Some(open) = self.context.open_folder.current().filter(|open| *open != id) {
            debug!("closing folder {:?} before opening {:?}", open, id);
            self.with_folder(open, |folder| folder.close(true))?;
        }
        self.with_folder(id, Folder::animate_open)
    }

    pub fn close_folder(&mut self, id: FolderId, animate: bool) -> Result<(), WorkspaceError> {
        self.with_folder(id, |folder| folder.close(animate))
    }

    pub fn next_alarm(&self) -> Option<Deadline> {
        self.folders
            .values()
            .filter_map(Folder::next_alarm)
            .min()
    }

    /// Moves the clock to `now_ms`, firing every alarm due on the way in deadline order.
    pub fn advance_to(&mut self, now_ms: u64) -> usize {
        let mut fired = 0;
        loop {
            let next = self
                .folders
                .iter()
                .filter_map(|(id, folder)| folder.next_alarm().map(|deadline| (deadline, *id)))
                .filter(|(deadline, _)| deadline.at_ms <= now_ms)
                .min();
            let Some((deadline, id)) = next else {
                break;
            };
            self.context.timeline.advance_to(deadline.at_ms);
            if let Some(folder) = self.folders.get_mut(&id) {
                if folder.fire_next_alarm() {
                    fired += 1;
                }
            }
            self.drain_effects(id);
        }
        self.context.timeline.advance_to(now_ms);
        fired
    }

    pub fn advance_by(&mut self, delta_ms: u64) -> usize {
        let target = self.context.timeline.now_ms().saturating_add(delta_ms);
        self.advance_to(target)
    }

    /// Hands an install-state change to a background worker. The result comes back through
    /// [`Workspace::pump_events`].
    pub fn post_install_state(&self, model: SharedDataModel, info: PackageInstallInfo) {
        let (task_tx, task_rx) = unbounded();
        spawn_install_worker(model, task_rx, self.ui_tx.clone());
        if task_tx.send(info).is_err() {
            error!("install worker exited before receiving its task");
        }
    }

    /// Handles every event posted by workers so far. Returns how many were handled.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.ui_rx.try_recv() {
                Ok(event) => {
                    self.handle_ui_event(event);
                    handled += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(err) => {
                    error!("ui event receiver error: {}", err);
                    break;
                }
            }
        }
        handled
    }

    /// Blocks until one worker event arrives and handles it.
    pub fn wait_for_event(&mut self) -> bool {
        match self.ui_rx.recv() {
            Ok(event) => {
                self.handle_ui_event(event);
                true
            }
            Err(err) => {
                error!("ui event receiver error: {}", err);
                false
            }
        }
    }

    fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::DragObjectRemoved { folder, success } => {
                if let Err(err) =
                    self.with_folder(folder, |folder| folder.on_drag_object_removed(success))
                {
                    warn!("uninstall result dropped: {}", err);
                }
            }
            UiEvent::RestoreItemsChanged(updates) => {
                for folder in self.folders.values_mut() {
                    folder.apply_item_updates(&updates);
                }
                self.host.bind_restore_items_change(&updates);
            }
        }
    }

    fn drain_effects(&mut self, id: FolderId) {
        let Some(folder) = self.folders.get_mut(&id) else {
            return;
        };
        for effect in folder.take_effects() {
            match effect {
                FolderEffect::FolderDissolved(dissolved) => {
                    self.folders.remove(&dissolved);
                    self.context.open_folder.release(dissolved);
                    info!("folder {:?} removed from workspace", dissolved);
                }
                FolderEffect::FolderClosed(closed) => {
                    debug!("folder {:?} closed", closed);
                }
                other => apply_effect(&mut self.host, other),
            }
        }
    }
}
