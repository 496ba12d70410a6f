//! Index of the segments and snap points available for interaction.

use crate::ids::{SegmentId, SnapPointId};
use crate::scene::{Scene, Segment};

/// Active, editable segments and the flattened list of their points.
///
/// Owned by the tool for the duration of an activation. It is rebuilt on
/// [`refresh`](Self::refresh) and may go stale between refreshes when the host
/// removes or disables segments; readers filter stale handles on use.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    segments: Vec<SegmentId>,
    points: Vec<SnapPointId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry for the current scene.
    pub fn from_scene(scene: &Scene) -> Self {
        let mut registry = Self::new();
        registry.refresh(scene);
        registry
    }

    /// Clear and re-index every active, editable segment.
    pub fn refresh(&mut self, scene: &Scene) {
        log::debug!("Refreshing segments");
        self.segments.clear();
        self.points.clear();
        for segment in scene.segments() {
            if !is_indexable(segment) {
                continue;
            }
            self.segments.push(segment.id());
            self.points.extend_from_slice(segment.points());
        }
    }

    /// Drop entries whose segment or point was removed, disabled or locked
    /// since the last refresh. Returns the number of entries dropped.
    pub fn purge_stale(&mut self, scene: &Scene) -> usize {
        let before = self.segments.len() + self.points.len();
        self.segments
            .retain(|&id| scene.segment(id).is_some_and(is_indexable));
        self.points.retain(|&id| is_live_point(scene, id));
        before - (self.segments.len() + self.points.len())
    }

    /// Indexed segments in handle order.
    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }

    /// Indexed snap points, grouped by segment.
    pub fn points(&self) -> &[SnapPointId] {
        &self.points
    }

    /// Indexed points that still exist and whose owner is active and editable.
    pub fn live_points<'a>(&'a self, scene: &'a Scene) -> impl Iterator<Item = SnapPointId> + 'a {
        self.points
            .iter()
            .copied()
            .filter(move |&id| is_live_point(scene, id))
    }

    pub fn contains_segment(&self, id: SegmentId) -> bool {
        self.segments.contains(&id)
    }

    pub fn contains_point(&self, id: SnapPointId) -> bool {
        self.points.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn is_indexable(segment: &Segment) -> bool {
    segment.is_active() && segment.is_editable()
}

fn is_live_point(scene: &Scene, id: SnapPointId) -> bool {
    scene
        .owner(id)
        .and_then(|owner| scene.segment(owner))
        .is_some_and(is_indexable)
}
