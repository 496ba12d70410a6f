//! Scene arena holding segments, their snap points and the links between them.
//!
//! Segments and snap points refer to each other through stable handles
//! ([`SegmentId`], [`SnapPointId`]) rather than references, so links can be
//! checked and repaired centrally and removing a segment can never leave a
//! dangling partner behind.

use crate::error::GraphError;
use crate::ids::{SegmentId, SnapPointId};
use crate::transform::Transform;
use glam::DVec3;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A connection site owned by exactly one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapPoint {
    id: SnapPointId,
    owner: SegmentId,
    /// Offset from the owner's pivot, in the owner's local frame.
    pub local_offset: DVec3,
    connection: Option<SnapPointId>,
}

impl SnapPoint {
    pub fn id(&self) -> SnapPointId {
        self.id
    }

    /// The segment this point belongs to.
    pub fn owner(&self) -> SegmentId {
        self.owner
    }

    /// The point this one is linked to, if any.
    pub fn connection(&self) -> Option<SnapPointId> {
        self.connection
    }

    /// Derived from [`connection`](Self::connection); there is no separate flag.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// A movable piece owning an ordered list of snap points.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    id: SegmentId,
    /// Display name supplied by the host.
    pub name: String,
    transform: Transform,
    points: Vec<SnapPointId>,
    active: bool,
    editable: bool,
    pending_reconciliation: bool,
}

impl Segment {
    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> DVec3 {
        self.transform.position
    }

    /// Owned snap points in declaration order.
    pub fn points(&self) -> &[SnapPointId] {
        &self.points
    }

    /// Whether the segment is currently enabled in the scene.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Locked segments stay in the scene but are never indexed for interaction.
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Set on activation; cleared once coincident neighbours have been re-attached.
    pub fn is_pending_reconciliation(&self) -> bool {
        self.pending_reconciliation
    }
}

/// Arena of all segments and snap points known to the host.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Unique scene identifier.
    pub id: String,
    segments: BTreeMap<SegmentId, Segment>,
    points: BTreeMap<SnapPointId, SnapPoint>,
    next_segment: u32,
    next_point: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            segments: BTreeMap::new(),
            points: BTreeMap::new(),
            next_segment: 0,
            next_point: 0,
        }
    }

    /// Add a segment with snap points at the given local offsets and activate it.
    ///
    /// The new segment starts detached and pending reconciliation, like any
    /// object entering the scene.
    pub fn spawn_segment(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        offsets: impl IntoIterator<Item = DVec3>,
    ) -> SegmentId {
        let id = SegmentId(self.next_segment);
        self.next_segment += 1;

        let mut points = Vec::new();
        for local_offset in offsets {
            let point_id = SnapPointId(self.next_point);
            self.next_point += 1;
            self.points.insert(
                point_id,
                SnapPoint {
                    id: point_id,
                    owner: id,
                    local_offset,
                    connection: None,
                },
            );
            points.push(point_id);
        }

        self.segments.insert(
            id,
            Segment {
                id,
                name: name.into(),
                transform,
                points,
                active: false,
                editable: true,
                pending_reconciliation: false,
            },
        );
        self.activate(id);
        id
    }

    /// Enable a segment: claim its points and clear any inherited links.
    ///
    /// Both sides of every inherited link are cleared, so a re-enabled or
    /// duplicated segment never starts attached. Returns false if the segment
    /// does not exist.
    pub fn activate(&mut self, id: SegmentId) -> bool {
        let Some(segment) = self.segments.get(&id) else {
            return false;
        };
        let claimed: Vec<SnapPointId> = segment
            .points
            .iter()
            .copied()
            .filter(|pid| self.points.contains_key(pid))
            .collect();

        for &pid in &claimed {
            if let Some(point) = self.points.get_mut(&pid) {
                point.owner = id;
            }
            self.unlink(pid);
        }

        if let Some(segment) = self.segments.get_mut(&id) {
            segment.points = claimed;
            segment.active = true;
            segment.pending_reconciliation = true;
        }
        log::debug!("Activated {}", id);
        true
    }

    /// Disable a segment, detaching both sides of all its links.
    pub fn deactivate(&mut self, id: SegmentId) -> bool {
        let Some(segment) = self.segments.get(&id) else {
            return false;
        };
        let points = segment.points.clone();
        for pid in points {
            self.unlink(pid);
        }
        if let Some(segment) = self.segments.get_mut(&id) {
            segment.active = false;
        }
        log::debug!("Deactivated {}", id);
        true
    }

    /// Remove a segment and its points from the scene.
    pub fn remove_segment(&mut self, id: SegmentId) -> Option<Segment> {
        self.deactivate(id);
        let segment = self.segments.remove(&id)?;
        for pid in &segment.points {
            self.points.remove(pid);
        }
        Some(segment)
    }

    /// Clone a segment with fresh handles.
    ///
    /// The copy shares the source's transform and offsets, starts detached and
    /// is pending reconciliation.
    pub fn duplicate_segment(&mut self, id: SegmentId) -> Option<SegmentId> {
        let source = self.segments.get(&id)?;
        let name = format!("{} copy", source.name);
        let transform = source.transform;
        let editable = source.editable;
        let offsets: Vec<DVec3> = source
            .points
            .iter()
            .filter_map(|pid| self.points.get(pid))
            .map(|p| p.local_offset)
            .collect();

        let copy = self.spawn_segment(name, transform, offsets);
        if let Some(segment) = self.segments.get_mut(&copy) {
            segment.editable = editable;
        }
        log::debug!("Duplicated {} as {}", id, copy);
        Some(copy)
    }

    /// Replace a segment's transform (host-driven move, not recorded).
    pub fn set_transform(&mut self, id: SegmentId, transform: Transform) -> bool {
        match self.segments.get_mut(&id) {
            Some(segment) => {
                segment.transform = transform;
                true
            }
            None => false,
        }
    }

    /// Move a segment's pivot to a world position (host-driven move, not recorded).
    pub fn set_position(&mut self, id: SegmentId, position: DVec3) -> bool {
        match self.segments.get_mut(&id) {
            Some(segment) => {
                segment.transform.position = position;
                true
            }
            None => false,
        }
    }

    /// Lock or unlock a segment for interaction.
    pub fn set_editable(&mut self, id: SegmentId, editable: bool) -> bool {
        match self.segments.get_mut(&id) {
            Some(segment) => {
                segment.editable = editable;
                true
            }
            None => false,
        }
    }

    pub(crate) fn translate_segment(&mut self, id: SegmentId, delta: DVec3) -> bool {
        match self.segments.get_mut(&id) {
            Some(segment) => {
                segment.transform.translate(delta);
                true
            }
            None => false,
        }
    }

    pub(crate) fn rotate_segment(&mut self, id: SegmentId, axis: DVec3, angle_radians: f64) -> bool {
        match self.segments.get_mut(&id) {
            Some(segment) => {
                segment.transform.rotate_local(axis, angle_radians);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_pending(&mut self, id: SegmentId, pending: bool) {
        if let Some(segment) = self.segments.get_mut(&id) {
            segment.pending_reconciliation = pending;
        }
    }

    /// Get a segment by handle.
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    /// All segments in handle order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Get a snap point by handle.
    pub fn point(&self, id: SnapPointId) -> Option<&SnapPoint> {
        self.points.get(&id)
    }

    /// All snap points in handle order.
    pub fn points(&self) -> impl Iterator<Item = &SnapPoint> {
        self.points.values()
    }

    /// The segment owning a point.
    pub fn owner(&self, id: SnapPointId) -> Option<SegmentId> {
        self.points.get(&id).map(|p| p.owner)
    }

    /// The partner of a point, if linked.
    pub fn connection(&self, id: SnapPointId) -> Option<SnapPointId> {
        self.points.get(&id).and_then(|p| p.connection)
    }

    pub fn is_connected(&self, id: SnapPointId) -> bool {
        self.connection(id).is_some()
    }

    /// World position of a point: the owner's transform applied to its offset.
    pub fn world_position(&self, id: SnapPointId) -> Option<DVec3> {
        let point = self.points.get(&id)?;
        let owner = self.segments.get(&point.owner)?;
        Some(owner.transform.transform_point(point.local_offset))
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of points that currently have a partner.
    pub fn connected_count(&self) -> usize {
        self.points.values().filter(|p| p.is_connected()).count()
    }

    /// Set both sides of a link. Callers must have cleared prior partners.
    pub(crate) fn link(&mut self, a: SnapPointId, b: SnapPointId) {
        if let Some(point) = self.points.get_mut(&a) {
            point.connection = Some(b);
        }
        if let Some(point) = self.points.get_mut(&b) {
            point.connection = Some(a);
        }
    }

    /// Clear a point's link and the partner's back link. Returns the old partner.
    ///
    /// The partner is only cleared if it still points back, so a partner that
    /// has moved on to another point keeps its own link.
    pub(crate) fn unlink(&mut self, id: SnapPointId) -> Option<SnapPointId> {
        let partner = self.points.get_mut(&id)?.connection.take()?;
        if let Some(other) = self.points.get_mut(&partner) {
            if other.connection == Some(id) {
                other.connection = None;
            }
        }
        Some(partner)
    }

    /// Check every structural invariant of the graph.
    pub fn validate(&self) -> Result<(), GraphError> {
        for point in self.points.values() {
            let claimed = self
                .segments
                .get(&point.owner)
                .is_some_and(|s| s.points.contains(&point.id));
            if !claimed {
                return Err(GraphError::UnownedPoint {
                    point: point.id,
                    owner: point.owner,
                });
            }

            let Some(partner_id) = point.connection else {
                continue;
            };
            let Some(partner) = self.points.get(&partner_id) else {
                return Err(GraphError::DanglingLink {
                    point: point.id,
                    partner: partner_id,
                });
            };
            if partner.connection != Some(point.id) {
                return Err(GraphError::AsymmetricLink {
                    point: point.id,
                    partner: partner_id,
                    partner_link: partner.connection,
                });
            }
            if partner.owner == point.owner {
                return Err(GraphError::SelfSegmentLink {
                    point: point.id,
                    partner: partner_id,
                    segment: point.owner,
                });
            }
        }
        Ok(())
    }

    /// Clear every one-sided, dangling or same-segment link.
    ///
    /// Returns the number of points whose link was cleared.
    pub fn repair_links(&mut self) -> usize {
        let broken: Vec<SnapPointId> = self
            .points
            .values()
            .filter(|point| match point.connection {
                None => false,
                Some(partner_id) => match self.points.get(&partner_id) {
                    None => true,
                    Some(partner) => {
                        partner.connection != Some(point.id) || partner.owner == point.owner
                    }
                },
            })
            .map(|p| p.id)
            .collect();

        for &id in &broken {
            if let Some(point) = self.points.get_mut(&id) {
                point.connection = None;
            }
            log::warn!("Cleared invalid link on {}", id);
        }
        broken.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_segments(scene: &mut Scene) -> (SegmentId, SegmentId) {
        let a = scene.spawn_segment("a", Transform::IDENTITY, [DVec3::X]);
        let b = scene.spawn_segment(
            "b",
            Transform::from_position(DVec3::new(2.0, 0.0, 0.0)),
            [DVec3::NEG_X],
        );
        (a, b)
    }

    #[test]
    fn test_spawn_claims_points() {
        let mut scene = Scene::new();
        let id = scene.spawn_segment("a", Transform::IDENTITY, [DVec3::X, DVec3::Y]);
        let segment = scene.segment(id).unwrap();

        assert_eq!(segment.points().len(), 2);
        assert!(segment.is_active());
        assert!(segment.is_pending_reconciliation());
        for &pid in segment.points() {
            assert_eq!(scene.owner(pid), Some(id));
            assert!(!scene.is_connected(pid));
        }
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_world_position_uses_owner_transform() {
        let mut scene = Scene::new();
        let (_, b) = two_segments(&mut scene);
        let pid = scene.segment(b).unwrap().points()[0];
        assert_eq!(scene.world_position(pid), Some(DVec3::new(1.0, 0.0, 0.0)));

        scene.set_position(b, DVec3::new(5.0, 1.0, 0.0));
        assert_eq!(scene.world_position(pid), Some(DVec3::new(4.0, 1.0, 0.0)));
    }

    #[test]
    fn test_deactivate_clears_both_sides() {
        let mut scene = Scene::new();
        let (a, b) = two_segments(&mut scene);
        let pa = scene.segment(a).unwrap().points()[0];
        let pb = scene.segment(b).unwrap().points()[0];
        scene.link(pa, pb);

        assert!(scene.deactivate(a));
        assert!(!scene.is_connected(pa));
        assert!(!scene.is_connected(pb));
        assert!(!scene.segment(a).unwrap().is_active());
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_activate_clears_inherited_links() {
        let mut scene = Scene::new();
        let (a, b) = two_segments(&mut scene);
        let pa = scene.segment(a).unwrap().points()[0];
        let pb = scene.segment(b).unwrap().points()[0];
        scene.link(pa, pb);

        assert!(scene.activate(a));
        assert!(!scene.is_connected(pa));
        assert!(!scene.is_connected(pb));
    }

    #[test]
    fn test_remove_segment_leaves_no_dangling_partner() {
        let mut scene = Scene::new();
        let (a, b) = two_segments(&mut scene);
        let pa = scene.segment(a).unwrap().points()[0];
        let pb = scene.segment(b).unwrap().points()[0];
        scene.link(pa, pb);

        let removed = scene.remove_segment(a);
        assert!(removed.is_some());
        assert!(scene.point(pa).is_none());
        assert!(!scene.is_connected(pb));
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_duplicate_gets_fresh_handles() {
        let mut scene = Scene::new();
        let (a, b) = two_segments(&mut scene);
        let pa = scene.segment(a).unwrap().points()[0];
        let pb = scene.segment(b).unwrap().points()[0];
        scene.link(pa, pb);

        let copy = scene.duplicate_segment(a).unwrap();
        let copy_seg = scene.segment(copy).unwrap();
        assert_ne!(copy, a);
        assert_eq!(copy_seg.position(), scene.segment(a).unwrap().position());
        assert!(copy_seg.is_pending_reconciliation());

        let pc = copy_seg.points()[0];
        assert_ne!(pc, pa);
        assert!(!scene.is_connected(pc));
        // Source link untouched
        assert_eq!(scene.connection(pa), Some(pb));
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_asymmetry() {
        let mut scene = Scene::new();
        let (a, b) = two_segments(&mut scene);
        let pa = scene.segment(a).unwrap().points()[0];
        let pb = scene.segment(b).unwrap().points()[0];
        scene.points.get_mut(&pa).unwrap().connection = Some(pb);

        assert!(matches!(
            scene.validate(),
            Err(GraphError::AsymmetricLink { point, .. }) if point == pa
        ));
    }

    #[test]
    fn test_repair_links() {
        let mut scene = Scene::new();
        let (a, b) = two_segments(&mut scene);
        let pa = scene.segment(a).unwrap().points()[0];
        let pb = scene.segment(b).unwrap().points()[0];
        scene.points.get_mut(&pa).unwrap().connection = Some(pb);
        scene.points.get_mut(&pb).unwrap().connection = Some(SnapPointId(99));

        assert_eq!(scene.repair_links(), 2);
        assert!(scene.validate().is_ok());
        assert_eq!(scene.connected_count(), 0);
    }

    #[test]
    fn test_missing_segment_is_noop() {
        let mut scene = Scene::new();
        assert!(!scene.activate(SegmentId(4)));
        assert!(!scene.deactivate(SegmentId(4)));
        assert!(scene.duplicate_segment(SegmentId(4)).is_none());
        assert!(scene.world_position(SnapPointId(0)).is_none());
    }
}
