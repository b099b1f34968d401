//! Drag-and-drop reorder and lifecycle engine for launcher folders.
//!
//! The engine is headless. Hosts feed it drag events and animation completions through a
//! [`Workspace`], advance its logical clock, and receive storage writes, transitions and
//! launcher callbacks through the [`host`] traits.

pub mod alarm;
pub mod config;
pub mod dnd;
pub mod events;
pub mod folder;
pub mod grid;
pub mod host;
pub mod install;
pub mod model;
pub mod registry;
pub mod replay;
pub mod workspace;

pub use config::{DeviceProfile, FolderConfig};
pub use folder::{Folder, FolderContext};
pub use host::{FolderHost, RecordingHost};
pub use workspace::{Workspace, WorkspaceError};
