//! Host selection set.

use crate::ids::{SegmentId, SnapPointId};
use crate::scene::Scene;
use std::collections::BTreeSet;

/// Segments currently selected in the host.
///
/// The core only reads the selection; the host replaces it on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    segments: BTreeSet<SegmentId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a single segment (clears other selections).
    pub fn select(&mut self, id: SegmentId) {
        self.segments.clear();
        self.segments.insert(id);
    }

    pub fn add(&mut self, id: SegmentId) {
        self.segments.insert(id);
    }

    pub fn deselect(&mut self, id: SegmentId) {
        self.segments.remove(&id);
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.segments.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.segments.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Selected segments that still exist and are active.
    pub fn active_segments(&self, scene: &Scene) -> Vec<SegmentId> {
        self.iter()
            .filter(|&id| scene.segment(id).is_some_and(|s| s.is_active()))
            .collect()
    }

    /// Every snap point carried along when the selection moves.
    pub fn moving_points(&self, scene: &Scene) -> Vec<SnapPointId> {
        self.active_segments(scene)
            .into_iter()
            .filter_map(|id| scene.segment(id))
            .flat_map(|s| s.points().iter().copied())
            .collect()
    }
}

impl FromIterator<SegmentId> for Selection {
    fn from_iter<I: IntoIterator<Item = SegmentId>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}
