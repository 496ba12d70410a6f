//! Nearest-partner search for snap points.

use crate::ids::SnapPointId;
use crate::registry::Registry;
use crate::scene::{Scene, SnapPoint};
use glam::DVec3;

/// A search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCandidate {
    /// The partner found.
    pub point: SnapPointId,
    /// Squared distance from the probe location.
    pub distance_sq: f64,
}

/// Find the registry point nearest to `point`'s world position plus `offset`.
///
/// Points on `point`'s own segment are never candidates. The nearest point is
/// returned only if its squared distance is strictly below `max_distance_sq`;
/// equal distances resolve to the lowest handle. Connected candidates are not
/// filtered out.
pub fn closest_in_range(
    scene: &Scene,
    registry: &Registry,
    point: SnapPointId,
    max_distance_sq: f64,
    offset: DVec3,
) -> Option<SnapPointId> {
    closest_matching(scene, registry, point, max_distance_sq, offset, |_| true).map(|c| c.point)
}

/// [`closest_in_range`] restricted to candidates accepted by `filter`.
pub fn closest_matching(
    scene: &Scene,
    registry: &Registry,
    point: SnapPointId,
    max_distance_sq: f64,
    offset: DVec3,
    filter: impl Fn(&SnapPoint) -> bool,
) -> Option<SnapCandidate> {
    let owner = scene.owner(point)?;
    let probe = scene.world_position(point)? + offset;

    let mut best: Option<SnapCandidate> = None;
    for other_id in registry.live_points(scene) {
        let Some(other) = scene.point(other_id) else {
            continue;
        };
        if other.owner() == owner || !filter(other) {
            continue;
        }
        let Some(position) = scene.world_position(other_id) else {
            continue;
        };

        let distance_sq = position.distance_squared(probe);
        if distance_sq >= max_distance_sq {
            continue;
        }
        let closer = match best {
            None => true,
            Some(current) => {
                distance_sq < current.distance_sq
                    || (distance_sq == current.distance_sq && other_id < current.point)
            }
        };
        if closer {
            best = Some(SnapCandidate {
                point: other_id,
                distance_sq,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NoopRecorder;
    use crate::transform::Transform;

    fn first_point(scene: &Scene, id: crate::ids::SegmentId) -> SnapPointId {
        scene.segment(id).unwrap().points()[0]
    }

    #[test]
    fn test_finds_nearest_within_budget() {
        let mut scene = Scene::new();
        let a = scene.spawn_segment("a", Transform::IDENTITY, [DVec3::ZERO]);
        let near = scene.spawn_segment("near", Transform::from_position(DVec3::new(0.2, 0.0, 0.0)), [DVec3::ZERO]);
        scene.spawn_segment("far", Transform::from_position(DVec3::new(0.25, 0.0, 0.0)), [DVec3::ZERO]);
        let registry = Registry::from_scene(&scene);

        let found = closest_in_range(&scene, &registry, first_point(&scene, a), 0.1, DVec3::ZERO);
        assert_eq!(found, Some(first_point(&scene, near)));
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut scene = Scene::new();
        let a = scene.spawn_segment("a", Transform::IDENTITY, [DVec3::ZERO]);
        let b = scene.spawn_segment("b", Transform::from_position(DVec3::new(0.5, 0.0, 0.0)), [DVec3::ZERO]);
        let registry = Registry::from_scene(&scene);
        let pa = first_point(&scene, a);

        // d = 0.25
        assert_eq!(closest_in_range(&scene, &registry, pa, 0.25, DVec3::ZERO), None);
        assert_eq!(
            closest_in_range(&scene, &registry, pa, 0.250001, DVec3::ZERO),
            Some(first_point(&scene, b))
        );
    }

    #[test]
    fn test_offset_moves_probe() {
        let mut scene = Scene::new();
        let a = scene.spawn_segment("a", Transform::IDENTITY, [DVec3::ZERO]);
        let b = scene.spawn_segment("b", Transform::from_position(DVec3::new(1.0, 0.0, 0.0)), [DVec3::ZERO]);
        let registry = Registry::from_scene(&scene);
        let pa = first_point(&scene, a);

        assert_eq!(closest_in_range(&scene, &registry, pa, 0.1, DVec3::ZERO), None);
        assert_eq!(
            closest_in_range(&scene, &registry, pa, 0.1, DVec3::new(0.95, 0.0, 0.0)),
            Some(first_point(&scene, b))
        );
    }

    #[test]
    fn test_same_segment_excluded() {
        let mut scene = Scene::new();
        let a = scene.spawn_segment("a", Transform::IDENTITY, [DVec3::ZERO, DVec3::new(0.01, 0.0, 0.0)]);
        let registry = Registry::from_scene(&scene);

        assert_eq!(closest_in_range(&scene, &registry, first_point(&scene, a), 1.0, DVec3::ZERO), None);
    }

    #[test]
    fn test_tie_breaks_on_lowest_handle() {
        let mut scene = Scene::new();
        let a = scene.spawn_segment("a", Transform::IDENTITY, [DVec3::ZERO]);
        let right = scene.spawn_segment("right", Transform::from_position(DVec3::new(0.1, 0.0, 0.0)), [DVec3::ZERO]);
        let left = scene.spawn_segment("left", Transform::from_position(DVec3::new(-0.1, 0.0, 0.0)), [DVec3::ZERO]);
        let pr = first_point(&scene, right);
        let pl = first_point(&scene, left);
        assert!(pr < pl);

        let registry = Registry::from_scene(&scene);
        assert_eq!(closest_in_range(&scene, &registry, first_point(&scene, a), 0.1, DVec3::ZERO), Some(pr));
    }

    #[test]
    fn test_connected_candidates_not_filtered() {
        let mut scene = Scene::new();
        let a = scene.spawn_segment("a", Transform::IDENTITY, [DVec3::ZERO]);
        let b = scene.spawn_segment("b", Transform::from_position(DVec3::new(0.1, 0.0, 0.0)), [DVec3::ZERO]);
        let c = scene.spawn_segment("c", Transform::from_position(DVec3::new(0.1, 0.0, 0.0)), [DVec3::ZERO]);
        let pb = first_point(&scene, b);
        scene.attach(pb, first_point(&scene, c), &mut NoopRecorder);

        let registry = Registry::from_scene(&scene);
        assert_eq!(closest_in_range(&scene, &registry, first_point(&scene, a), 0.1, DVec3::ZERO), Some(pb));
    }

    #[test]
    fn test_filter_skips_rejected() {
        let mut scene = Scene::new();
        let a = scene.spawn_segment("a", Transform::IDENTITY, [DVec3::ZERO]);
        let b = scene.spawn_segment("b", Transform::from_position(DVec3::new(0.1, 0.0, 0.0)), [DVec3::ZERO]);
        let c = scene.spawn_segment("c", Transform::from_position(DVec3::new(0.2, 0.0, 0.0)), [DVec3::ZERO]);
        let registry = Registry::from_scene(&scene);
        let pb = first_point(&scene, b);

        let hit = closest_matching(&scene, &registry, first_point(&scene, a), 0.1, DVec3::ZERO, |p| p.id() != pb);
        assert_eq!(hit.map(|c| c.point), Some(first_point(&scene, c)));
    }

    #[test]
    fn test_stale_registry_entries_ignored() {
        let mut scene = Scene::new();
        let a = scene.spawn_segment("a", Transform::IDENTITY, [DVec3::ZERO]);
        let b = scene.spawn_segment("b", Transform::from_position(DVec3::new(0.1, 0.0, 0.0)), [DVec3::ZERO]);
        let registry = Registry::from_scene(&scene);
        scene.remove_segment(b);

        assert_eq!(closest_in_range(&scene, &registry, first_point(&scene, a), 1.0, DVec3::ZERO), None);
    }
}
