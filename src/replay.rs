//! Scripted driver for the folder engine. Feeds a JSON list of steps through a
//! [`Workspace`] backed by a [`RecordingHost`] and reports what the host saw.

use crate::config::DeviceProfile;
use crate::dnd::{DragListener, DragObject, DragSource, DragSourceKind, DropTarget, DropTargetId};
use crate::events::{Transition, UiEvent};
use crate::host::{HostCall, RecordingHost};
use crate::model::{FolderId, FolderInfo, FolderState, ItemId, ItemInfo};
use crate::workspace::{Workspace, WorkspaceError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on chained transitions settled by one `finish_animations` step.
const MAX_ANIMATION_ROUNDS: usize = 16;

const DEMO_SCRIPT: &str = r#"{
  "profile": { "columns": 2, "rows": 2, "cell_width": 100, "cell_height": 100, "max_pages": 3 },
  "steps": [
    { "op": "bind",
      "folder": { "id": 1, "title": "Games" },
      "items": [
        { "id": 100, "kind": "Shortcut", "title": "Chess", "rank": 0 },
        { "id": 101, "kind": "Shortcut", "title": "Go", "rank": 1 },
        { "id": 102, "kind": "Shortcut", "title": "Sudoku", "rank": 2 },
        { "id": 103, "kind": "Shortcut", "title": "Tetris", "rank": 3 },
        { "id": 104, "kind": "Shortcut", "title": "Solitaire", "rank": 4 }
      ] },
    { "op": "open", "folder": 1 },
    { "op": "finish_animations" },
    { "op": "start_drag", "folder": 1, "item": 104 },
    { "op": "enter", "folder": 1, "x": 50, "y": 50 },
    { "op": "over", "folder": 1, "x": 50, "y": 50 },
    { "op": "advance", "ms": 300 },
    { "op": "drop", "folder": 1, "x": 50, "y": 50 },
    { "op": "drop_completed", "target": { "Folder": 1 } },
    { "op": "close", "folder": 1 },
    { "op": "finish_animations" }
  ]
}"#;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read script {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid replay script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("step {step}: {source}")]
    Workspace {
        step: usize,
        #[source]
        source: WorkspaceError,
    },
    #[error("step {step}: no drag in progress")]
    NoActiveDrag { step: usize },
    #[error("step {step}: folder {folder:?} has no item {item:?}")]
    UnknownItem {
        step: usize,
        folder: FolderId,
        item: ItemId,
    },
    #[error("step {step}: the drag did not start in a folder")]
    NotAFolderDrag { step: usize },
}

fn default_true() -> bool {
    true
}

fn default_source() -> DragSourceKind {
    DragSourceKind::AllApps
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayStep {
    Bind {
        folder: FolderInfo,
        items: Vec<ItemInfo>,
    },
    Open {
        folder: FolderId,
    },
    Close {
        folder: FolderId,
        #[serde(default = "default_true")]
        animate: bool,
    },
    AnimationComplete {
        folder: FolderId,
        transition: Transition,
    },
    /// Completes every transition the host was asked to play, in order.
    FinishAnimations,
    StartDrag {
        folder: FolderId,
        item: ItemId,
    },
    BeginExternalDrag {
        folder: FolderId,
        item: ItemInfo,
        #[serde(default = "default_source")]
        source: DragSourceKind,
    },
    Enter {
        folder: FolderId,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
    },
    Over {
        folder: FolderId,
        x: f32,
        y: f32,
    },
    Exit {
        folder: FolderId,
        #[serde(default)]
        drag_complete: bool,
    },
    Drop {
        folder: FolderId,
        x: f32,
        y: f32,
    },
    DropCompleted {
        target: DropTargetId,
        #[serde(default = "default_true")]
        success: bool,
        #[serde(default)]
        fling: bool,
    },
    DeferUninstall,
    UninstallResult {
        success: bool,
    },
    AddItem {
        folder: FolderId,
        item: ItemInfo,
    },
    RemoveItem {
        folder: FolderId,
        item: ItemId,
    },
    Advance {
        ms: u64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub profile: Option<DeviceProfile>,
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn from_json(text: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Two-page folder, last item dragged to the front.
    pub fn demo() -> Result<Self, ReplayError> {
        Self::from_json(DEMO_SCRIPT)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderReport {
    pub id: FolderId,
    pub title: String,
    pub state: FolderState,
    pub is_open: bool,
    pub current_page: usize,
    pub page_count: usize,
    pub options: u32,
    /// Item ids in reading order.
    pub items: Vec<ItemId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub now_ms: u64,
    pub open_folder: Option<FolderId>,
    pub folders: Vec<FolderReport>,
    pub move_item_writes: usize,
    pub calls: Vec<HostCall>,
}

pub struct ReplayRunner {
    workspace: Workspace<RecordingHost>,
    drag: Option<DragObject>,
    /// Source folder of the last completed drop, for the uninstall result.
    last_drop_source: Option<FolderId>,
    finished_transitions: usize,
}

impl ReplayRunner {
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            workspace: Workspace::new(profile, RecordingHost::new()),
            drag: None,
            last_drop_source: None,
            finished_transitions: 0,
        }
    }

    pub fn workspace(&self) -> &Workspace<RecordingHost> {
        &self.workspace
    }

    pub fn run(&mut self, steps: &[ReplayStep]) -> Result<ReplayReport, ReplayError> {
        for (index, step) in steps.iter().enumerate() {
            debug!("replay step {}: {:?}", index, step);
            self.step(index, step)?;
        }
        info!("replayed {} steps", steps.len());
        Ok(self.report())
    }

    pub fn step(&mut self, index: usize, step: &ReplayStep) -> Result<(), ReplayError> {
        let in_step = |source| ReplayError::Workspace {
            step: index,
            source,
        };
        match step {
            ReplayStep::Bind { folder, items } => {
                self.workspace
                    .add_folder(folder.clone(), items.clone())
                    .map_err(in_step)?;
            }
            ReplayStep::Open { folder } => self.workspace.open_folder(*folder).map_err(in_step)?,
            ReplayStep::Close { folder, animate } => self
                .workspace
                .close_folder(*folder, *animate)
                .map_err(in_step)?,
            ReplayStep::AnimationComplete { folder, transition } => self
                .workspace
                .with_folder(*folder, |f| f.on_animation_complete(*transition))
                .map_err(in_step)?,
            ReplayStep::FinishAnimations => self.finish_animations(),
            ReplayStep::StartDrag { folder, item } => {
                let drag = self
                    .workspace
                    .with_folder(*folder, |f| {
                        let drag = f.start_drag(*item)?;
                        f.on_drag_start(&drag);
                        Some(drag)
                    })
                    .map_err(in_step)?
                    .ok_or(ReplayError::UnknownItem {
                        step: index,
                        folder: *folder,
                        item: *item,
                    })?;
                self.drag = Some(drag);
            }
            ReplayStep::BeginExternalDrag {
                folder,
                item,
                source,
            } => {
                self.workspace
                    .with_folder(*folder, |f| f.begin_external_drag())
                    .map_err(in_step)?;
                self.drag = Some(DragObject::new(item.clone(), *source));
            }
            ReplayStep::Enter { folder, x, y } => {
                let d = self.drag_at(index, *x, *y)?;
                self.workspace
                    .with_folder(*folder, |f| f.on_drag_enter(&d))
                    .map_err(in_step)?;
            }
            ReplayStep::Over { folder, x, y } => {
                let d = self.drag_at(index, *x, *y)?;
                self.workspace
                    .with_folder(*folder, |f| f.on_drag_over(&d))
                    .map_err(in_step)?;
            }
            ReplayStep::Exit {
                folder,
                drag_complete,
            } => {
                let mut d = self.current_drag(index)?.clone();
                d.drag_complete = *drag_complete;
                self.workspace
                    .with_folder(*folder, |f| f.on_drag_exit(&d))
                    .map_err(in_step)?;
            }
            ReplayStep::Drop { folder, x, y } => {
                let d = self.drag_at(index, *x, *y)?;
                let accepted = self
                    .workspace
                    .with_folder(*folder, |f| {
                        let accepted = f.accept_drop(&d);
                        if accepted {
                            f.on_drop(&d);
                        }
                        accepted
                    })
                    .map_err(in_step)?;
                if !accepted {
                    warn!("folder {:?} rejected the drop of {:?}", folder, d.item.id);
                }
            }
            ReplayStep::DropCompleted {
                target,
                success,
                fling,
            } => {
                let d = self.drag.take().ok_or(ReplayError::NoActiveDrag { step: index })?;
                if let DragSourceKind::Folder(source) = d.source {
                    self.workspace
                        .with_folder(source, |f| {
                            f.on_drop_completed(*target, &d, *fling, *success)
                        })
                        .map_err(in_step)?;
                    self.last_drop_source = Some(source);
                }
                self.end_drag();
            }
            ReplayStep::DeferUninstall => {
                let source = self.drag_source_folder(index)?;
                self.workspace
                    .with_folder(source, |f| f.defer_complete_drop_after_uninstall())
                    .map_err(in_step)?;
            }
            ReplayStep::UninstallResult { success } => {
                let folder = self
                    .last_drop_source
                    .ok_or(ReplayError::NotAFolderDrag { step: index })?;
                // Confirmations arrive from a worker through the loop's channel.
                if self
                    .workspace
                    .sender()
                    .send(UiEvent::DragObjectRemoved {
                        folder,
                        success: *success,
                    })
                    .is_ok()
                {
                    self.workspace.pump_events();
                }
            }
            ReplayStep::AddItem { folder, item } => self
                .workspace
                .with_folder(*folder, |f| f.add_item(item.clone()))
                .map_err(in_step)?,
            ReplayStep::RemoveItem { folder, item } => self
                .workspace
                .with_folder(*folder, |f| f.remove_item(*item))
                .map_err(in_step)?,
            ReplayStep::Advance { ms } => {
                self.workspace.advance_by(*ms);
            }
        }
        Ok(())
    }

    pub fn report(&self) -> ReplayReport {
        let folders = self
            .workspace
            .folder_ids()
            .into_iter()
            .filter_map(|id| self.workspace.folder(id))
            .map(|folder| FolderReport {
                id: folder.id(),
                title: folder.info().title.clone(),
                state: folder.state(),
                is_open: folder.is_open(),
                current_page: folder.grid().current_page(),
                page_count: folder.grid().page_count(),
                options: folder.info().options,
                items: folder.items_in_reading_order(),
            })
            .collect();
        ReplayReport {
            now_ms: self.workspace.timeline().now_ms(),
            open_folder: self.workspace.open_folder_registry().current(),
            folders,
            move_item_writes: self.workspace.host().move_item_writes(),
            calls: self.workspace.host().calls().to_vec(),
        }
    }

    fn current_drag(&self, step: usize) -> Result<&DragObject, ReplayError> {
        self.drag.as_ref().ok_or(ReplayError::NoActiveDrag { step })
    }

    fn drag_at(&self, step: usize, x: f32, y: f32) -> Result<DragObject, ReplayError> {
        Ok(self.current_drag(step)?.clone().at(x, y))
    }

    fn drag_source_folder(&self, step: usize) -> Result<FolderId, ReplayError> {
        match self.current_drag(step)?.source {
            DragSourceKind::Folder(id) => Ok(id),
            _ => Err(ReplayError::NotAFolderDrag { step }),
        }
    }

    /// Every folder listens for the end of a drag.
    fn end_drag(&mut self) {
        for id in self.workspace.folder_ids() {
            if let Err(err) = self.workspace.with_folder(id, |f| f.on_drag_end()) {
                debug!("drag end skipped: {}", err);
            }
        }
    }

    fn finish_animations(&mut self) {
        for _ in 0..MAX_ANIMATION_ROUNDS {
            let transitions = self.workspace.host().transitions();
            if transitions.len() <= self.finished_transitions {
                return;
            }
            let pending = transitions[self.finished_transitions..].to_vec();
            self.finished_transitions = transitions.len();
            for (folder, transition) in pending {
                // A dissolved folder has nothing left to finish.
                if self
                    .workspace
                    .with_folder(folder, |f| f.on_animation_complete(transition))
                    .is_err()
                {
                    debug!("transition {:?} for gone folder {:?}", transition, folder);
                }
            }
        }
        warn!("transitions kept chaining after {} rounds", MAX_ANIMATION_ROUNDS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn demo_moves_the_last_item_to_the_front() {
        let script = ReplayScript::demo().unwrap();
        let profile = script.profile.clone().unwrap_or_default();
        let report = ReplayRunner::new(profile).run(&script.steps).unwrap();

        let folder = &report.folders[0];
        assert_eq!(
            folder.items,
            vec![ItemId(104), ItemId(100), ItemId(101), ItemId(102), ItemId(103)]
        );
        assert_eq!(folder.state, FolderState::Small);
        assert_eq!(report.move_item_writes, 1);
        assert_eq!(report.open_folder, None);
    }

    #[test]
    fn drop_without_a_drag_is_an_error() {
        let script = ReplayScript::from_json(
            r#"{ "steps": [
                { "op": "bind", "folder": { "id": 1 }, "items": [
                    { "id": 1, "kind": "Shortcut" }, { "id": 2, "kind": "Shortcut" } ] },
                { "op": "drop", "folder": 1, "x": 0, "y": 0 }
            ] }"#,
        )
        .unwrap();
        let err = ReplayRunner::new(DeviceProfile::default())
            .run(&script.steps)
            .unwrap_err();
        assert!(matches!(err, ReplayError::NoActiveDrag { step: 1 }));
    }

    #[test]
    fn unknown_folder_is_reported_with_its_step() {
        let script =
            ReplayScript::from_json(r#"{ "steps": [ { "op": "open", "folder": 9 } ] }"#).unwrap();
        let err = ReplayRunner::new(DeviceProfile::default())
            .run(&script.steps)
            .unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Workspace {
                step: 0,
                source: WorkspaceError::FolderNotFound(FolderId(9))
            }
        ));
    }

    #[test]
    fn malformed_script_is_a_parse_error() {
        assert!(matches!(
            ReplayScript::from_json(r#"{ "steps": [ { "op": "teleport" } ] }"#),
            Err(ReplayError::Parse(_))
        ));
    }
}
