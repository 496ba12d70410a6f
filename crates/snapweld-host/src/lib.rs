//! Snapweld Host
//!
//! Headless host for the snap tool: loads a layout, replays a scripted
//! interaction and reports the resulting attachment graph.

mod error;
mod layout;
mod replay;

pub use error::{HostError, HostResult};
pub use layout::{Layout, PointRef, ScriptEvent, SegmentSpec};
pub use replay::{OutcomeReport, PointReport, Replay, Report, SegmentReport};

use snapweld_core::SnapSettings;
use std::path::Path;

/// Load settings from `settings_path` (defaults when absent) and replay a layout file.
pub fn replay_file(layout_path: &Path, settings_path: Option<&Path>) -> HostResult<Report> {
    let settings = match settings_path {
        Some(path) => SnapSettings::load_or_default(path)?,
        None => SnapSettings::default(),
    };
    let layout = Layout::load(layout_path)?;
    let mut replay = Replay::from_layout(&layout, settings)?;
    replay.run(&layout.events)?;
    log::info!("Replayed {} events", layout.events.len());
    Ok(replay.report())
}
