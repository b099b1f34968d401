//! Install-session progress for promise icons, computed off the loop thread.

use crate::events::{ItemUpdate, UiEvent};
use crate::model::{FlagOp, ItemId, ItemInfo, ItemKind, FLAG_INSTALL_SESSION_ACTIVE};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    Installing,
    Installed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageInstallInfo {
    pub package: String,
    pub state: InstallState,
    #[serde(default)]
    pub progress: i32,
}

impl PackageInstallInfo {
    pub fn installing(package: &str, progress: i32) -> Self {
        Self {
            package: package.to_string(),
            state: InstallState::Installing,
            progress,
        }
    }
}

/// Background copy of every workspace item, keyed by id.
#[derive(Debug, Default)]
pub struct BgDataModel {
    pub items: BTreeMap<ItemId, ItemInfo>,
}

impl BgDataModel {
    pub fn insert(&mut self, item: ItemInfo) {
        self.items.insert(item.id, item);
    }
}

pub type SharedDataModel = Arc<Mutex<BgDataModel>>;

pub struct PackageInstallStateChangedTask {
    install_info: PackageInstallInfo,
}

impl PackageInstallStateChangedTask {
    pub fn new(install_info: PackageInstallInfo) -> Self {
        Self { install_info }
    }

    /// Applies the progress to matching promise shortcuts and widgets. Returns the event to post
    /// to the loop thread, or `None` when nothing changed.
    pub fn execute(&self, model: &Mutex<BgDataModel>) -> Option<UiEvent> {
        let install = &self.install_info;
        // Installed packages are handled by the package-added flow.
        if install.state == InstallState::Installed {
            return None;
        }

        let mut model = model.lock();
        let mut updates = Vec::new();
        for item in model.items.values_mut() {
            if item.package.as_deref() != Some(install.package.as_str()) {
                continue;
            }
            let status = match item.kind {
                ItemKind::Widget => FlagOp::NoOp,
                _ if item.is_promise() => {
                    if install.state == InstallState::Failed {
                        FlagOp::Remove(FLAG_INSTALL_SESSION_ACTIVE)
                    } else {
                        FlagOp::NoOp
                    }
                }
                _ => continue,
            };
            item.install_progress = install.progress;
            item.apply_status(status);
            updates.push(ItemUpdate {
                id: item.id,
                install_progress: install.progress,
                status,
            });
        }

        debug!(
            "install state {:?} for {} touched {} items",
            install.state,
            install.package,
            updates.len()
        );
        (!updates.is_empty()).then_some(UiEvent::RestoreItemsChanged(updates))
    }
}

/// Runs install tasks as they arrive and posts their results to the loop thread.
pub fn spawn_install_worker(
    model: SharedDataModel,
    task_rx: Receiver<PackageInstallInfo>,
    ui_tx: Sender<UiEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(install_info) = task_rx.recv() {
            let package = install_info.package.clone();
            if let Some(event) = PackageInstallStateChangedTask::new(install_info).execute(&model) {
                if ui_tx.send(event).is_err() {
                    info!("loop thread gone, dropping install update for {}", package);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FLAG_PROMISE;
    use pretty_assertions::assert_eq;

    fn promise(id: u64, package: &str) -> ItemInfo {
        let mut item = ItemInfo::shortcut(id, package).with_package(package);
        item.status = FLAG_PROMISE | FLAG_INSTALL_SESSION_ACTIVE;
        item
    }

    fn widget(id: u64, package: &str) -> ItemInfo {
        let mut item = ItemInfo::shortcut(id, package).with_package(package);
        item.kind = ItemKind::Widget;
        item.install_progress = -1;
        item
    }

    fn data_model() -> Mutex<BgDataModel> {
        let mut model = BgDataModel::default();
        // app1 is installed: its shortcuts are not promises.
        for id in 1..=4 {
            model.insert(ItemInfo::shortcut(id, "app1").with_package("app1"));
        }
        for id in 5..=7 {
            model.insert(promise(id, "app3"));
        }
        for id in 8..=9 {
            model.insert(widget(id, "app4"));
        }
        Mutex::new(model)
    }

    fn progress_by_id(model: &Mutex<BgDataModel>) -> Vec<(u64, i32)> {
        model
            .lock()
            .items
            .values()
            .map(|item| (item.id.0, item.install_progress))
            .collect()
    }

    fn updated_ids(event: Option<UiEvent>) -> Vec<u64> {
        match event {
            Some(UiEvent::RestoreItemsChanged(updates)) => {
                updates.iter().map(|update| update.id.0).collect()
            }
            _ => Vec::new(),
        }
    }

    #[test]
    fn non_promise_shortcuts_are_left_alone() {
        let model = data_model();
        let event =
            PackageInstallStateChangedTask::new(PackageInstallInfo::installing("app1", 30))
                .execute(&model);
        assert_eq!(event, None);
        assert!(progress_by_id(&model)
            .iter()
            .all(|(id, progress)| *progress == if *id >= 8 { -1 } else { 0 }));
    }

    #[test]
    fn promise_shortcuts_get_progress() {
        let model = data_model();
        let event =
            PackageInstallStateChangedTask::new(PackageInstallInfo::installing("app3", 30))
                .execute(&model);
        assert_eq!(updated_ids(event), vec![5, 6, 7]);
        let progress = progress_by_id(&model);
        assert_eq!(&progress[4..7], &[(5, 30), (6, 30), (7, 30)]);
    }

    #[test]
    fn widgets_get_progress() {
        let model = data_model();
        let event =
            PackageInstallStateChangedTask::new(PackageInstallInfo::installing("app4", 30))
                .execute(&model);
        assert_eq!(updated_ids(event), vec![8, 9]);
    }

    #[test]
    fn installed_events_are_ignored() {
        let model = data_model();
        let mut install = PackageInstallInfo::installing("app3", 100);
        install.state = InstallState::Installed;
        assert_eq!(PackageInstallStateChangedTask::new(install).execute(&model), None);
        assert!(progress_by_id(&model).iter().all(|(_, progress)| *progress != 100));
    }

    #[test]
    fn failed_install_clears_the_session_flag() {
        let model = data_model();
        let mut install = PackageInstallInfo::installing("app3", 12);
        install.state = InstallState::Failed;
        PackageInstallStateChangedTask::new(install).execute(&model);
        let model = model.lock();
        let item = &model.items[&ItemId(5)];
        assert_eq!(item.status & FLAG_INSTALL_SESSION_ACTIVE, 0);
        assert!(item.is_promise());
    }

    #[test]
    fn worker_posts_results_to_the_loop() {
        let model: SharedDataModel = Arc::new(data_model());
        let (task_tx, task_rx) = crossbeam_channel::unbounded();
        let (ui_tx, ui_rx) = crossbeam_channel::unbounded();
        let worker = spawn_install_worker(model, task_rx, ui_tx);

        task_tx.send(PackageInstallInfo::installing("app4", 55)).unwrap();
        drop(task_tx);
        worker.join().unwrap();

        assert_eq!(updated_ids(ui_rx.try_recv().ok()), vec![8, 9]);
    }
}
