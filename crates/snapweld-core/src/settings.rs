//! Tunable distances and defaults for the snap tool.

use crate::error::SettingsError;
use crate::mode::ViewMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Squared-distance budget for drag candidates.
pub const SNAP_DISTANCE_SQ: f64 = 0.1;
/// Squared-distance budget for re-attaching a freshly placed segment.
pub const COINCIDENT_DISTANCE_SQ: f64 = 0.01;
/// Distance under which two segment pivots count as the same location.
pub const COINCIDENT_SEGMENT_DISTANCE: f64 = 0.01;
/// Drag length that must be exceeded before a release commits.
pub const MIN_MOVE_DISTANCE: f64 = 0.35;
/// Default rotation step in degrees.
pub const DEFAULT_ROTATION_INCREMENT: u16 = 45;

/// Snap tool configuration.
///
/// Search budgets are compared against squared distances: a candidate is
/// accepted when its squared distance is strictly below the budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    /// Budget used while dragging.
    pub snap_distance_sq: f64,
    /// Budget used when reconciling a new or duplicated segment.
    pub coincident_distance_sq: f64,
    /// Linear pivot distance treated as "same location".
    pub coincident_segment_distance: f64,
    /// Minimum drag length for a release to commit.
    pub min_move_distance: f64,
    /// Rotation step in degrees.
    pub rotation_increment: u16,
    /// Mode the tool starts in.
    pub initial_mode: ViewMode,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            snap_distance_sq: SNAP_DISTANCE_SQ,
            coincident_distance_sq: COINCIDENT_DISTANCE_SQ,
            coincident_segment_distance: COINCIDENT_SEGMENT_DISTANCE,
            min_move_distance: MIN_MOVE_DISTANCE,
            rotation_increment: DEFAULT_ROTATION_INCREMENT,
            initial_mode: ViewMode::default(),
        }
    }
}

impl SnapSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize settings to pretty JSON.
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from a file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Read settings from a file, or use defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write settings to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Default settings file location.
    ///
    /// On Unix: `~/.config/snapweld/settings.json`
    /// On Windows: `%APPDATA%\snapweld\settings.json`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .map(|base| base.join("snapweld").join("settings.json"))
    }

    #[cfg(target_arch = "wasm32")]
    pub fn default_location() -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SnapSettings::default();
        assert_eq!(settings.snap_distance_sq, 0.1);
        assert_eq!(settings.coincident_distance_sq, 0.01);
        assert_eq!(settings.min_move_distance, 0.35);
        assert_eq!(settings.rotation_increment, 45);
        assert_eq!(settings.initial_mode, ViewMode::Selected);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = SnapSettings::from_json(r#"{ "min_move_distance": 1.0, "initial_mode": "all" }"#).unwrap();
        assert_eq!(settings.min_move_distance, 1.0);
        assert_eq!(settings.initial_mode, ViewMode::All);
        assert_eq!(settings.snap_distance_sq, SNAP_DISTANCE_SQ);
    }

    #[test]
    fn test_invalid_json() {
        let result = SnapSettings::from_json("{ not json");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = SnapSettings {
            snap_distance_sq: 0.25,
            ..SnapSettings::default()
        };

        settings.save(&path).unwrap();
        let loaded = SnapSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = SnapSettings::load_or_default(&dir.path().join("missing.json")).unwrap();
        assert_eq!(loaded, SnapSettings::default());
    }
}
