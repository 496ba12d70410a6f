//! JSON layout and interaction script.
//!
//! A layout names every segment, lists its snap point offsets and carries a
//! script of host events to replay:
//!
//! ```json
//! {
//!   "segments": [
//!     { "name": "wall", "position": [0, 0, 0], "points": [[1, 0, 0]] },
//!     { "name": "door", "position": [3, 0, 0], "points": [[-1, 0, 0]] }
//!   ],
//!   "selection": ["door"],
//!   "events": [
//!     { "type": "pointer_down", "position": [3, 0, 0] },
//!     { "type": "pointer_move", "position": [2.05, 0, 0] },
//!     { "type": "pointer_up" }
//!   ]
//! }
//! ```

use crate::error::HostResult;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use snapweld_core::ViewMode;
use std::fs;
use std::path::Path;

fn default_true() -> bool {
    true
}

/// A segment to spawn before the script runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    /// Unique name used by script events.
    pub name: String,
    #[serde(default)]
    pub position: DVec3,
    /// Heading about world up.
    #[serde(default)]
    pub rotation_y_degrees: f64,
    /// Snap point offsets in the segment's local frame.
    #[serde(default)]
    pub points: Vec<DVec3>,
    #[serde(default = "default_true")]
    pub editable: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A snap point addressed by segment name and index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRef {
    pub segment: String,
    pub index: usize,
}

/// One scripted host event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    PointerDown {
        position: DVec3,
        #[serde(default)]
        target: Option<PointRef>,
    },
    PointerMove {
        position: DVec3,
    },
    PointerUp {
        #[serde(default)]
        target: Option<PointRef>,
    },
    /// Replace the selection.
    Select {
        segments: Vec<String>,
    },
    Refresh,
    CycleMode,
    SetMode {
        mode: ViewMode,
    },
    /// Clone a segment; the copy is registered under `name`.
    Duplicate {
        segment: String,
        name: String,
    },
    Detach {
        point: PointRef,
    },
    SnapTo {
        point: PointRef,
    },
    RotateLeft,
    RotateRight,
    IncrementUp,
    IncrementDown,
    /// Host-driven move of a segment pivot.
    Move {
        segment: String,
        position: DVec3,
    },
    Enable {
        segment: String,
    },
    Disable {
        segment: String,
    },
    Remove {
        segment: String,
    },
    Undo,
    Redo,
}

/// Initial scene plus the event script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub segments: Vec<SegmentSpec>,
    /// Names of the initially selected segments.
    #[serde(default)]
    pub selection: Vec<String>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl Layout {
    pub fn from_json(json: &str) -> HostResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> HostResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a layout file.
    pub fn load(path: &Path) -> HostResult<Self> {
        let json = fs::read_to_string(path)?;
        let layout = Self::from_json(&json)?;
        log::debug!(
            "Loaded {} segments and {} events from {}",
            layout.segments.len(),
            layout.events.len(),
            path.display()
        );
        Ok(layout)
    }
}
