//! Stable handles for scene entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a segment in a [`Scene`](crate::Scene).
///
/// Handles are allocated in increasing order and never reused within a scene,
/// so ordering by handle is ordering by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

/// Handle of a snap point in a [`Scene`](crate::Scene).
///
/// Proximity ties are broken by the lowest handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapPointId(pub u32);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment#{}", self.0)
    }
}

impl fmt::Display for SnapPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "point#{}", self.0)
    }
}
