//! Attach and detach operations on the snap point graph.
//!
//! Both sides of a link are always written inside a single call, so callers
//! never observe a point whose partner does not point back.

use crate::history::UndoRecorder;
use crate::ids::{SegmentId, SnapPointId};
use crate::scene::Scene;

impl Scene {
    /// Link `a` and `b`, detaching any previous partner of either first.
    ///
    /// Ignored (returns false) when either point is missing, when `a == b`, or
    /// when both belong to the same segment. Linking an already linked pair is
    /// a no-op that returns true.
    pub fn attach(&mut self, a: SnapPointId, b: SnapPointId, recorder: &mut dyn UndoRecorder) -> bool {
        if a == b {
            return false;
        }
        let (Some(owner_a), Some(owner_b)) = (self.owner(a), self.owner(b)) else {
            return false;
        };
        if owner_a == owner_b {
            log::warn!("Refusing to attach {} and {}: both on {}", a, b, owner_a);
            return false;
        }
        if self.connection(a) == Some(b) && self.connection(b) == Some(a) {
            return true;
        }

        recorder.record(self, "Attach");
        self.unlink(a);
        self.unlink(b);
        self.link(a, b);
        log::info!("Attached {} - {}", a, b);
        true
    }

    /// Clear the link of `a` on both sides.
    ///
    /// Returns false (and records nothing) if `a` has no partner, so repeated
    /// calls are harmless.
    pub fn detach(&mut self, a: SnapPointId, recorder: &mut dyn UndoRecorder) -> bool {
        if !self.is_connected(a) {
            return false;
        }
        recorder.record(self, "Detach");
        if let Some(partner) = self.unlink(a) {
            log::info!("Detached {} - {}", a, partner);
        }
        true
    }

    /// Detach every point of a segment. Returns the number of links removed.
    pub fn detach_segment(&mut self, id: SegmentId, recorder: &mut dyn UndoRecorder) -> usize {
        let points: Vec<SnapPointId> = match self.segment(id) {
            Some(segment) => segment.points().to_vec(),
            None => return 0,
        };
        let mut removed = 0;
        for pid in points {
            if self.detach(pid, recorder) {
                removed += 1;
            }
        }
        removed
    }
}
