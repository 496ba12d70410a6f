//! Undo recording.
//!
//! Every mutation of link state or segment transforms is announced to an
//! [`UndoRecorder`] before it is applied. Hosts with their own undo system
//! implement the trait; [`SnapshotHistory`] is a self-contained fallback.

use crate::scene::Scene;

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Receives the scene state right before it is mutated.
pub trait UndoRecorder {
    /// Called before `scene` is changed. `label` names the operation.
    fn record(&mut self, scene: &Scene, label: &str);

    /// Start a group: records until [`end_group`](Self::end_group) undo as one step.
    fn begin_group(&mut self, _label: &str) {}

    /// Close the current group.
    fn end_group(&mut self) {}
}

/// Recorder that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl UndoRecorder for NoopRecorder {
    fn record(&mut self, _scene: &Scene, _label: &str) {}
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    label: String,
    scene: Scene,
}

/// Bounded undo/redo stacks of whole-scene snapshots.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHistory {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    /// Label of the open group and whether it has taken its snapshot yet.
    group: Option<(String, bool)>,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, scene: &Scene, label: &str) {
        self.undo_stack.push(HistoryEntry {
            label: label.to_string(),
            scene: scene.clone(),
        });

        // Clear redo stack when new changes are made
        self.redo_stack.clear();

        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Restore the state before the last recorded change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(scene, entry.scene);
        self.redo_stack.push(HistoryEntry {
            label: entry.label,
            scene: current,
        });
        true
    }

    /// Re-apply the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(scene, entry.scene);
        self.undo_stack.push(HistoryEntry {
            label: entry.label,
            scene: current,
        });
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the change the next undo would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.label.as_str())
    }

    /// Number of undo steps available.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }
}

impl UndoRecorder for SnapshotHistory {
    fn record(&mut self, scene: &Scene, label: &str) {
        match self.group.take() {
            Some((group_label, false)) => {
                self.push(scene, &group_label);
                self.group = Some((group_label, true));
            }
            Some(open) => self.group = Some(open),
            None => self.push(scene, label),
        }
    }

    fn begin_group(&mut self, label: &str) {
        self.group = Some((label.to_string(), false));
    }

    fn end_group(&mut self) {
        self.group = None;
    }
}
