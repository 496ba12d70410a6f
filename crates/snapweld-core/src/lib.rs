//! Snapweld Core Library
//!
//! Snap-point attachment graph for assembling modular 3D segments: proximity
//! search, symmetric attach/detach, translational reconciliation and the
//! interactive drag tool driving them.

pub mod drag;
pub mod error;
pub mod graph;
pub mod history;
pub mod ids;
pub mod mode;
pub mod proximity;
pub mod reconcile;
pub mod registry;
pub mod scene;
pub mod selection;
pub mod settings;
pub mod tool;
pub mod transform;

pub use drag::{DragOrigin, DragOutcome, DragSession};
pub use error::{GraphError, SettingsError};
pub use history::{MAX_UNDO_HISTORY, NoopRecorder, SnapshotHistory, UndoRecorder};
pub use ids::{SegmentId, SnapPointId};
pub use mode::{ViewMode, visible_links, visible_points};
pub use proximity::{SnapCandidate, closest_in_range, closest_matching};
pub use reconcile::{auto_reconcile, multi_snap_position, reconcile_pending, snap_delta, snap_position};
pub use registry::Registry;
pub use scene::{Scene, Segment, SnapPoint};
pub use selection::Selection;
pub use settings::SnapSettings;
pub use tool::{DragState, RotateDirection, RotationIncrement, SnapTool, ToolEvent, ToolStatus};
pub use transform::Transform;
