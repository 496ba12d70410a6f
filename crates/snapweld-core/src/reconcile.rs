//! Translating segments so that linked points coincide.
//!
//! Reconciliation is translational only. A segment with one link lands its
//! point exactly on the partner; a segment with several links is moved by the
//! mean of their corrections, which satisfies each link only approximately
//! when the corrections disagree.

use crate::history::UndoRecorder;
use crate::ids::{SegmentId, SnapPointId};
use crate::proximity::closest_matching;
use crate::registry::Registry;
use crate::scene::Scene;
use crate::settings::SnapSettings;
use glam::DVec3;
use std::collections::BTreeMap;

/// Vector from a point's world position to its partner's.
///
/// Zero when the point is missing or unlinked.
pub fn snap_delta(scene: &Scene, point: SnapPointId) -> DVec3 {
    let Some(partner) = scene.connection(point) else {
        return DVec3::ZERO;
    };
    match (scene.world_position(point), scene.world_position(partner)) {
        (Some(from), Some(to)) => to - from,
        _ => DVec3::ZERO,
    }
}

/// Make a linked pair coincident by moving one of the two owners.
///
/// With `move_self` the owner of `point` moves onto the partner, otherwise the
/// partner's owner moves onto `point`. Returns true if a segment was moved.
pub fn snap_position(
    scene: &mut Scene,
    recorder: &mut dyn UndoRecorder,
    point: SnapPointId,
    move_self: bool,
) -> bool {
    let Some(partner) = scene.connection(point) else {
        return false;
    };
    let anchor = if move_self { point } else { partner };
    let delta = snap_delta(scene, anchor);
    if delta == DVec3::ZERO {
        return false;
    }
    let Some(owner) = scene.owner(anchor) else {
        return false;
    };

    recorder.record(scene, "Snap To");
    scene.translate_segment(owner, delta);
    log::debug!("Snapped {} by {:?}", owner, delta);
    true
}

/// Reconcile many linked points in one pass.
///
/// Points are grouped by owner and each owner is translated once, by the mean
/// of its points' corrections. Owners are processed in handle order and each
/// mean is taken after the previous owners have moved. Unlinked points are
/// ignored. Returns the number of segments moved.
///
/// The result is exact only for one link per segment. Two links pulling a
/// segment in opposite directions cancel out and leave it where it is.
pub fn multi_snap_position(
    scene: &mut Scene,
    recorder: &mut dyn UndoRecorder,
    points: &[SnapPointId],
) -> usize {
    let mut groups: BTreeMap<SegmentId, Vec<SnapPointId>> = BTreeMap::new();
    for &point in points {
        if !scene.is_connected(point) {
            continue;
        }
        if let Some(owner) = scene.owner(point) {
            let group = groups.entry(owner).or_default();
            if !group.contains(&point) {
                group.push(point);
            }
        }
    }

    let mut moved = 0;
    for (owner, members) in groups {
        let sum: DVec3 = members.iter().map(|&p| snap_delta(scene, p)).sum();
        let mean = sum / members.len() as f64;
        if mean == DVec3::ZERO {
            continue;
        }
        recorder.record(scene, "Snap To");
        scene.translate_segment(owner, mean);
        log::debug!("Snapped {} by {:?} ({} links)", owner, mean, members.len());
        moved += 1;
    }
    moved
}

/// Re-attach a freshly placed segment to coincident neighbours.
///
/// Each unlinked point of `segment` is linked to the nearest unlinked registry
/// point within `coincident_distance_sq`, skipping points whose owner sits at
/// the same pivot as `segment` (a just-duplicated copy and its source). Clears
/// the pending flag. Returns the number of links made.
pub fn auto_reconcile(
    scene: &mut Scene,
    registry: &Registry,
    recorder: &mut dyn UndoRecorder,
    segment: SegmentId,
    settings: &SnapSettings,
) -> usize {
    let Some(seg) = scene.segment(segment) else {
        return 0;
    };
    if !seg.is_active() {
        return 0;
    }
    let pivot = seg.position();
    let points = seg.points().to_vec();
    scene.set_pending(segment, false);

    let mut attached = 0;
    for point in points {
        if scene.is_connected(point) {
            continue;
        }
        let candidate = closest_matching(
            scene,
            registry,
            point,
            settings.coincident_distance_sq,
            DVec3::ZERO,
            |other| {
                !other.is_connected()
                    && scene.segment(other.owner()).is_some_and(|s| {
                        s.position().distance(pivot) >= settings.coincident_segment_distance
                    })
            },
        );
        let Some(candidate) = candidate else {
            continue;
        };
        if scene.attach(point, candidate.point, recorder) {
            log::info!("Attached {} - {} from coincidence check", point, candidate.point);
            attached += 1;
        }
    }
    attached
}

/// Run [`auto_reconcile`] on every indexed segment still pending, in handle order.
pub fn reconcile_pending(
    scene: &mut Scene,
    registry: &Registry,
    recorder: &mut dyn UndoRecorder,
    settings: &SnapSettings,
) -> usize {
    let pending: Vec<SegmentId> = registry
        .segments()
        .iter()
        .copied()
        .filter(|&id| scene.segment(id).is_some_and(|s| s.is_pending_reconciliation()))
        .collect();

    pending
        .into_iter()
        .map(|id| auto_reconcile(scene, registry, recorder, id, settings))
        .sum()
}
