//! One interactive move, from pointer-down to release.

use crate::history::UndoRecorder;
use crate::ids::{SegmentId, SnapPointId};
use crate::proximity::closest_matching;
use crate::reconcile::multi_snap_position;
use crate::registry::Registry;
use crate::scene::Scene;
use crate::selection::Selection;
use crate::settings::SnapSettings;
use glam::DVec3;
use std::collections::BTreeMap;

/// What started the drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOrigin {
    /// An unconnected snap point handle. Its owner moves with the drag.
    Point(SnapPointId),
    /// The move gizmo of the current selection.
    Selection,
}

/// Result of releasing a drag.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// A point drag was dropped on another point; the two were linked in place.
    Linked { from: SnapPointId, to: SnapPointId },
    /// The moving segments were translated and the listed pairs attached.
    Committed {
        delta: DVec3,
        attached: Vec<(SnapPointId, SnapPointId)>,
    },
    /// Movement stayed under the threshold; nothing changed.
    Discarded,
}

/// Transient drag state.
///
/// Nothing is moved while dragging: candidates are found by probing each
/// moving point at its current position plus the live delta. The scene is
/// only touched on [`release`](Self::release).
#[derive(Debug, Clone)]
pub struct DragSession {
    origin: DragOrigin,
    start_position: DVec3,
    current_position: DVec3,
    moving_segments: Vec<SegmentId>,
    moving_points: Vec<SnapPointId>,
    candidates: BTreeMap<SnapPointId, SnapPointId>,
}

impl DragSession {
    /// Start dragging from a snap point handle.
    ///
    /// Returns `None` unless the point exists, is unconnected and its owner is active.
    pub fn from_point(scene: &Scene, point: SnapPointId) -> Option<Self> {
        if scene.is_connected(point) {
            return None;
        }
        let owner = scene.segment(scene.owner(point)?)?;
        if !owner.is_active() {
            return None;
        }
        let start = scene.world_position(point)?;
        Some(Self {
            origin: DragOrigin::Point(point),
            start_position: start,
            current_position: start,
            moving_segments: vec![owner.id()],
            moving_points: owner.points().to_vec(),
            candidates: BTreeMap::new(),
        })
    }

    /// Start moving the selection from the gizmo at `anchor`.
    ///
    /// Returns `None` if no selected segment is active.
    pub fn from_selection(scene: &Scene, selection: &Selection, anchor: DVec3) -> Option<Self> {
        let moving_segments = selection.active_segments(scene);
        if moving_segments.is_empty() {
            return None;
        }
        Some(Self {
            origin: DragOrigin::Selection,
            start_position: anchor,
            current_position: anchor,
            moving_points: selection.moving_points(scene),
            moving_segments,
            candidates: BTreeMap::new(),
        })
    }

    pub fn origin(&self) -> DragOrigin {
        self.origin
    }

    pub fn start_position(&self) -> DVec3 {
        self.start_position
    }

    pub fn current_position(&self) -> DVec3 {
        self.current_position
    }

    /// `current_position - start_position`.
    pub fn delta(&self) -> DVec3 {
        self.current_position - self.start_position
    }

    pub fn magnitude(&self) -> f64 {
        self.delta().length()
    }

    pub fn moving_segments(&self) -> &[SegmentId] {
        &self.moving_segments
    }

    /// Moving point to the partner it would attach to if released now.
    pub fn candidates(&self) -> &BTreeMap<SnapPointId, SnapPointId> {
        &self.candidates
    }

    /// Move the drag handle and rebuild the candidate map.
    pub fn update(&mut self, scene: &Scene, registry: &Registry, position: DVec3, settings: &SnapSettings) {
        self.current_position = position;
        self.candidates.clear();

        let delta = self.delta();
        // Partner -> (distance, moving point) of its closest claimant.
        let mut claims: BTreeMap<SnapPointId, (f64, SnapPointId)> = BTreeMap::new();
        for &point in &self.moving_points {
            if !scene.point(point).is_some_and(|p| !p.is_connected()) {
                continue;
            }
            let hit = closest_matching(scene, registry, point, settings.snap_distance_sq, delta, |other| {
                !self.moving_segments.contains(&other.owner())
            });
            let Some(hit) = hit else {
                continue;
            };
            let closer = claims
                .get(&hit.point)
                .is_none_or(|&(best, owner)| hit.distance_sq < best || (hit.distance_sq == best && point < owner));
            if closer {
                claims.insert(hit.point, (hit.distance_sq, point));
            }
        }
        self.candidates = claims.into_iter().map(|(partner, (_, point))| (point, partner)).collect();
        log::debug!("Drag delta {:?}: {} candidates", delta, self.candidates.len());
    }

    /// End the drag.
    ///
    /// A point drag released on an eligible `target` links the two points
    /// without moving anything. Otherwise, if the drag exceeded
    /// `min_move_distance`, the moving segments are translated by the delta,
    /// every candidate pair is attached and the new links are reconciled, all
    /// as a single undo step. Shorter drags are discarded.
    pub fn release(
        self,
        scene: &mut Scene,
        registry: &Registry,
        recorder: &mut dyn UndoRecorder,
        target: Option<SnapPointId>,
        settings: &SnapSettings,
    ) -> DragOutcome {
        if let (DragOrigin::Point(from), Some(to)) = (self.origin, target) {
            if is_link_target(scene, registry, from, to) && scene.attach(from, to, recorder) {
                log::info!("Attached points by drag - {} - {}", from, to);
                return DragOutcome::Linked { from, to };
            }
        }

        let delta = self.delta();
        if delta == DVec3::ZERO || self.magnitude() <= settings.min_move_distance {
            log::debug!("Drag of {:.3} discarded", self.magnitude());
            return DragOutcome::Discarded;
        }

        recorder.begin_group("Move Segments");
        recorder.record(scene, "Move");
        for &id in &self.moving_segments {
            scene.translate_segment(id, delta);
        }

        for (&from, &to) in &self.candidates {
            scene.attach(from, to, recorder);
        }
        let attached: Vec<(SnapPointId, SnapPointId)> = self
            .candidates
            .iter()
            .filter(|&(&from, &to)| scene.connection(from) == Some(to))
            .map(|(&from, &to)| (from, to))
            .collect();
        let from_points: Vec<SnapPointId> = attached.iter().map(|&(from, _)| from).collect();
        multi_snap_position(scene, recorder, &from_points);
        recorder.end_group();

        log::info!(
            "Moved {} segments by {:?}, {} attached",
            self.moving_segments.len(),
            delta,
            attached.len()
        );
        DragOutcome::Committed { delta, attached }
    }
}

/// Whether a point drag from `from` may be dropped onto `to`.
fn is_link_target(scene: &Scene, registry: &Registry, from: SnapPointId, to: SnapPointId) -> bool {
    if from == to || scene.is_connected(from) || scene.is_connected(to) {
        return false;
    }
    if !registry.live_points(scene).any(|p| p == to) {
        return false;
    }
    match (scene.owner(from), scene.owner(to)) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{NoopRecorder, SnapshotHistory};
    use crate::transform::Transform;

    fn point(scene: &Scene, id: SegmentId) -> SnapPointId {
        scene.segment(id).unwrap().points()[0]
    }

    /// Two single-point segments `gap` apart on X.
    fn pair(gap: f64) -> (Scene, SegmentId, SegmentId) {
        let mut scene = Scene::new();
        let s1 = scene.spawn_segment("s1", Transform::IDENTITY, [DVec3::ZERO]);
        let s2 = scene.spawn_segment("s2", Transform::from_position(DVec3::new(gap, 0.0, 0.0)), [DVec3::ZERO]);
        (scene, s1, s2)
    }

    #[test]
    fn test_drag_release_attaches_and_reconciles() {
        let (mut scene, s1, s2) = pair(1.0);
        let registry = Registry::from_scene(&scene);
        let settings = SnapSettings::default();
        let (p1, p2) = (point(&scene, s1), point(&scene, s2));

        let mut session = DragSession::from_selection(&scene, &Selection::from_iter([s1]), DVec3::ZERO).unwrap();
        session.update(&scene, &registry, DVec3::new(0.95, 0.02, 0.0), &settings);
        assert_eq!(session.candidates().get(&p1), Some(&p2));

        let outcome = session.release(&mut scene, &registry, &mut NoopRecorder, None, &settings);
        assert!(matches!(outcome, DragOutcome::Committed { ref attached, .. } if attached == &vec![(p1, p2)]));

        assert_eq!(scene.connection(p1), Some(p2));
        assert_eq!(scene.connection(p2), Some(p1));
        let gap = scene.world_position(p1).unwrap() - scene.world_position(p2).unwrap();
        assert!(gap.length() < 1e-9);
        assert_eq!(scene.segment(s2).unwrap().position(), DVec3::new(1.0, 0.0, 0.0));
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_short_drag_is_discarded() {
        let (mut scene, s1, s2) = pair(0.3);
        let registry = Registry::from_scene(&scene);
        let settings = SnapSettings::default();

        let mut session = DragSession::from_selection(&scene, &Selection::from_iter([s1]), DVec3::ZERO).unwrap();
        session.update(&scene, &registry, DVec3::new(0.25, 0.0, 0.0), &settings);
        assert_eq!(session.candidates().len(), 1);

        let mut history = SnapshotHistory::new();
        let outcome = session.release(&mut scene, &registry, &mut history, None, &settings);
        assert_eq!(outcome, DragOutcome::Discarded);
        assert!(!scene.is_connected(point(&scene, s1)));
        assert!(!scene.is_connected(point(&scene, s2)));
        assert_eq!(scene.segment(s1).unwrap().position(), DVec3::ZERO);
        assert!(history.is_empty());
    }

    #[test]
    fn test_long_drag_without_candidates_moves_only() {
        let (mut scene, s1, _) = pair(5.0);
        let registry = Registry::from_scene(&scene);
        let settings = SnapSettings::default();

        let mut session = DragSession::from_selection(&scene, &Selection::from_iter([s1]), DVec3::ZERO).unwrap();
        session.update(&scene, &registry, DVec3::new(0.0, 0.0, 2.0), &settings);
        let outcome = session.release(&mut scene, &registry, &mut NoopRecorder, None, &settings);

        assert!(matches!(outcome, DragOutcome::Committed { ref attached, .. } if attached.is_empty()));
        assert_eq!(scene.segment(s1).unwrap().position(), DVec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_commit_is_one_undo_step() {
        let (mut scene, s1, s2) = pair(1.0);
        let registry = Registry::from_scene(&scene);
        let settings = SnapSettings::default();
        let mut history = SnapshotHistory::new();

        let mut session = DragSession::from_selection(&scene, &Selection::from_iter([s1]), DVec3::ZERO).unwrap();
        session.update(&scene, &registry, DVec3::new(0.97, 0.0, 0.0), &settings);
        session.release(&mut scene, &registry, &mut history, None, &settings);

        assert_eq!(history.len(), 1);
        assert_eq!(history.undo_label(), Some("Move Segments"));
        assert!(history.undo(&mut scene));
        assert_eq!(scene.segment(s1).unwrap().position(), DVec3::ZERO);
        assert!(!scene.is_connected(point(&scene, s2)));
    }

    #[test]
    fn test_moving_segments_are_not_candidates() {
        let (scene, s1, s3) = pair(0.9);
        let registry = Registry::from_scene(&scene);
        let settings = SnapSettings::default();

        let selection = Selection::from_iter([s1, s3]);
        let mut session = DragSession::from_selection(&scene, &selection, DVec3::ZERO).unwrap();
        session.update(&scene, &registry, DVec3::new(0.9, 0.0, 0.0), &settings);
        assert!(session.candidates().is_empty());
        assert_eq!(session.moving_segments(), &[s1, s3]);
    }

    #[test]
    fn test_connected_points_do_not_search() {
        let (mut scene, s1, s2) = pair(1.0);
        let s3 = scene.spawn_segment("s3", Transform::from_position(DVec3::new(-3.0, 0.0, 0.0)), [DVec3::ZERO]);
        scene.attach(point(&scene, s1), point(&scene, s3), &mut NoopRecorder);
        let registry = Registry::from_scene(&scene);
        let settings = SnapSettings::default();

        let mut session = DragSession::from_selection(&scene, &Selection::from_iter([s1]), DVec3::ZERO).unwrap();
        session.update(&scene, &registry, DVec3::new(1.0, 0.0, 0.0), &settings);
        assert!(session.candidates().is_empty());
        assert!(!scene.is_connected(point(&scene, s2)));
    }

    #[test]
    fn test_point_drag_links_in_place() {
        let (mut scene, s1, s2) = pair(4.0);
        let registry = Registry::from_scene(&scene);
        let settings = SnapSettings::default();
        let (p1, p2) = (point(&scene, s1), point(&scene, s2));

        let session = DragSession::from_point(&scene, p1).unwrap();
        assert_eq!(session.origin(), DragOrigin::Point(p1));
        let outcome = session.release(&mut scene, &registry, &mut NoopRecorder, Some(p2), &settings);

        assert_eq!(outcome, DragOutcome::Linked { from: p1, to: p2 });
        assert_eq!(scene.connection(p2), Some(p1));
        assert_eq!(scene.segment(s1).unwrap().position(), DVec3::ZERO);
    }

    #[test]
    fn test_point_drag_rejects_same_segment_target() {
        let mut scene = Scene::new();
        let s1 = scene.spawn_segment("s1", Transform::IDENTITY, [DVec3::X, DVec3::NEG_X]);
        let registry = Registry::from_scene(&scene);
        let points = scene.segment(s1).unwrap().points().to_vec();

        let session = DragSession::from_point(&scene, points[0]).unwrap();
        let outcome = session.release(
            &mut scene,
            &registry,
            &mut NoopRecorder,
            Some(points[1]),
            &SnapSettings::default(),
        );
        assert_eq!(outcome, DragOutcome::Discarded);
        assert_eq!(scene.connected_count(), 0);
    }

    #[test]
    fn test_point_drag_requires_unconnected_origin() {
        let (mut scene, s1, s2) = pair(1.0);
        scene.attach(point(&scene, s1), point(&scene, s2), &mut NoopRecorder);
        assert!(DragSession::from_point(&scene, point(&scene, s1)).is_none());
    }

    #[test]
    fn test_shared_partner_goes_to_closest_mover() {
        let mut scene = Scene::new();
        let s1 = scene.spawn_segment("s1", Transform::IDENTITY, [DVec3::ZERO, DVec3::new(0.0, 0.1, 0.0)]);
        let s2 = scene.spawn_segment("s2", Transform::from_position(DVec3::new(1.0, 0.04, 0.0)), [DVec3::ZERO]);
        let registry = Registry::from_scene(&scene);
        let settings = SnapSettings::default();
        let movers = scene.segment(s1).unwrap().points().to_vec();
        let target = point(&scene, s2);

        let mut session = DragSession::from_selection(&scene, &Selection::from_iter([s1]), DVec3::ZERO).unwrap();
        session.update(&scene, &registry, DVec3::new(1.0, 0.0, 0.0), &settings);
        assert_eq!(session.candidates().len(), 1);
        assert_eq!(session.candidates().get(&movers[0]), Some(&target));

        let outcome = session.release(&mut scene, &registry, &mut NoopRecorder, None, &settings);
        let DragOutcome::Committed { attached, .. } = outcome else {
            panic!("expected a committed move, got {outcome:?}");
        };
        assert_eq!(attached, vec![(movers[0], target)]);
        for (from, to) in attached {
            assert_eq!(scene.connection(from), Some(to));
        }
        assert!(!scene.is_connected(movers[1]));
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_equidistant_movers_tie_on_lowest_id() {
        let mut scene = Scene::new();
        let s1 = scene.spawn_segment("s1", Transform::IDENTITY, [DVec3::ZERO, DVec3::new(0.0, 0.1, 0.0)]);
        let s2 = scene.spawn_segment("s2", Transform::from_position(DVec3::new(1.0, 0.05, 0.0)), [DVec3::ZERO]);
        let registry = Registry::from_scene(&scene);
        let movers = scene.segment(s1).unwrap().points().to_vec();

        let mut session = DragSession::from_selection(&scene, &Selection::from_iter([s1]), DVec3::ZERO).unwrap();
        session.update(&scene, &registry, DVec3::new(1.0, 0.0, 0.0), &SnapSettings::default());
        assert_eq!(session.candidates().len(), 1);
        assert_eq!(session.candidates().get(&movers[0]), Some(&point(&scene, s2)));
    }

    #[test]
    fn test_empty_selection_cannot_drag() {
        let (scene, ..) = pair(1.0);
        assert!(DragSession::from_selection(&scene, &Selection::new(), DVec3::ZERO).is_none());
    }
}
