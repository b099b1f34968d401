use crate::grid::GridGeometry;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_CELL_DIMENSION: f32 = 1024.0;
const MIN_CELL_DIMENSION: f32 = 8.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no config directory available on this platform")]
    NoConfigDir,
}

/// Folder grid geometry for the current device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceProfile {
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_cell_width")]
    pub cell_width: f32,
    #[serde(default = "default_cell_height")]
    pub cell_height: f32,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default)]
    pub rtl: bool,
}

fn default_columns() -> usize {
    4
}

fn default_rows() -> usize {
    4
}

fn default_cell_width() -> f32 {
    96.0
}

fn default_cell_height() -> f32 {
    112.0
}

fn default_max_pages() -> usize {
    3
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            rows: default_rows(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
            max_pages: default_max_pages(),
            rtl: false,
        }
    }
}

impl DeviceProfile {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    /// Replaces unusable values with defaults so a hand-edited file can't break the grid.
    pub fn sanitized(mut self) -> Self {
        self.columns = self.columns.clamp(1, 12);
        self.rows = self.rows.clamp(1, 12);
        self.max_pages = self.max_pages.max(1);
        self.cell_width = sanitize_dimension(self.cell_width, default_cell_width());
        self.cell_height = sanitize_dimension(self.cell_height, default_cell_height());
        self
    }
}

fn sanitize_dimension(value: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(MIN_CELL_DIMENSION, MAX_CELL_DIMENSION)
}

impl GridGeometry for DeviceProfile {
    fn columns(&self) -> usize {
        self.columns
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn cell_width(&self) -> f32 {
        self.cell_width
    }

    fn cell_height(&self) -> f32 {
        self.cell_height
    }

    fn max_pages(&self) -> usize {
        self.max_pages
    }

    fn is_rtl(&self) -> bool {
        self.rtl
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FolderConfig {
    #[serde(default)]
    pub profile: DeviceProfile,
    /// Replay script run when the binary gets no argument.
    #[serde(default)]
    pub last_script: Option<PathBuf>,
}

impl FolderConfig {
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "float_folder", "float_folder")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    pub fn load() -> Self {
        match Self::config_path() {
            Some(config_path) => Self::load_or_default(&config_path),
            None => Self::default(),
        }
    }

    /// Like [`FolderConfig::load_from`], but a missing or unreadable file yields the defaults.
    pub fn load_or_default(config_path: &Path) -> Self {
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from(config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to parse config, using default: {err}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let mut config: Self = serde_json::from_reader(file)?;
        config.profile = config.profile.sanitized();
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.json");
        let config = FolderConfig {
            profile: DeviceProfile::new(3, 2),
            last_script: Some(PathBuf::from("drag.json")),
        };
        config.save_to(&path).expect("save");
        let loaded = FolderConfig::load_from(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: FolderConfig =
            serde_json::from_str(r#"{ "profile": { "columns": 3 } }"#).expect("parse");
        assert_eq!(config.profile.columns, 3);
        assert_eq!(config.profile.rows, default_rows());
        assert_eq!(config.profile.max_pages, default_max_pages());
        assert!(config.last_script.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, b"{ not json").expect("write");
        assert!(matches!(
            FolderConfig::load_from(&path),
            Err(ConfigError::Json(_))
        ));
        assert_eq!(FolderConfig::load_or_default(&path), FolderConfig::default());
    }

    #[test]
    fn sanitize_clamps_unusable_geometry() {
        let profile = DeviceProfile {
            columns: 0,
            rows: 40,
            cell_width: f32::NAN,
            cell_height: 1.0,
            max_pages: 0,
            rtl: false,
        }
        .sanitized();
        assert_eq!(profile.columns, 1);
        assert_eq!(profile.rows, 12);
        assert_eq!(profile.max_pages, 1);
        assert_eq!(profile.cell_width, default_cell_width());
        assert_eq!(profile.cell_height, MIN_CELL_DIMENSION);
    }
}
