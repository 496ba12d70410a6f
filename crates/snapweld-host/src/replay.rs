//! Headless host driving a [`SnapTool`] from a layout script.

use crate::error::{HostError, HostResult};
use crate::layout::{Layout, PointRef, ScriptEvent};
use glam::{DQuat, DVec3};
use serde::Serialize;
use snapweld_core::{
    DragOutcome, NoopRecorder, RotateDirection, Scene, SegmentId, Selection, SnapPointId, SnapSettings, SnapTool,
    SnapshotHistory, ToolEvent, ToolStatus, Transform, UndoRecorder,
};
use std::collections::BTreeMap;

/// Drag outcome with points named by segment and index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutcomeReport {
    Linked {
        from: String,
        to: String,
    },
    Committed {
        delta: DVec3,
        attached: Vec<(String, String)>,
    },
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointReport {
    pub index: usize,
    pub world: DVec3,
    pub connected_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentReport {
    pub name: String,
    pub position: DVec3,
    pub yaw_degrees: f64,
    pub active: bool,
    pub points: Vec<PointReport>,
}

/// Final state after a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub status: ToolStatus,
    pub segments: Vec<SegmentReport>,
    pub outcomes: Vec<OutcomeReport>,
    pub undo_depth: usize,
    /// Whether every link is symmetric and crosses segments.
    pub valid: bool,
}

/// Scene, undo history and tool wired together.
pub struct Replay {
    scene: Scene,
    history: SnapshotHistory,
    tool: SnapTool,
    names: BTreeMap<String, SegmentId>,
    outcomes: Vec<OutcomeReport>,
}

impl Replay {
    /// Spawn the layout's segments and activate the tool.
    ///
    /// Reconciliation done while loading is not recorded for undo.
    pub fn from_layout(layout: &Layout, settings: SnapSettings) -> HostResult<Self> {
        let mut scene = Scene::new();
        let mut names = BTreeMap::new();
        for spec in &layout.segments {
            if names.contains_key(&spec.name) {
                return Err(HostError::DuplicateName(spec.name.clone()));
            }
            let transform = Transform::from_position(spec.position)
                .with_rotation(DQuat::from_rotation_y(spec.rotation_y_degrees.to_radians()));
            let id = scene.spawn_segment(spec.name.clone(), transform, spec.points.iter().copied());
            scene.set_editable(id, spec.editable);
            if !spec.active {
                scene.deactivate(id);
            }
            names.insert(spec.name.clone(), id);
        }

        let mut replay = Self {
            tool: SnapTool::activate(&mut scene, &mut NoopRecorder, Selection::new(), settings),
            scene,
            history: SnapshotHistory::new(),
            names,
            outcomes: Vec::new(),
        };
        let selection = replay.selection(&layout.selection)?;
        replay
            .tool
            .handle_event(&mut replay.scene, &mut NoopRecorder, ToolEvent::SelectionChanged(selection));
        Ok(replay)
    }

    /// Apply every event in order, stopping at the first error.
    pub fn run(&mut self, events: &[ScriptEvent]) -> HostResult<()> {
        for event in events {
            self.apply(event)?;
        }
        Ok(())
    }

    /// Apply one scripted event.
    pub fn apply(&mut self, event: &ScriptEvent) -> HostResult<()> {
        let tool_event = match event {
            ScriptEvent::PointerDown { position, target } => ToolEvent::PointerDown {
                position: *position,
                target: self.resolve_optional(target.as_ref())?,
            },
            ScriptEvent::PointerMove { position } => ToolEvent::PointerMove { position: *position },
            ScriptEvent::PointerUp { target } => ToolEvent::PointerUp {
                target: self.resolve_optional(target.as_ref())?,
            },
            ScriptEvent::Select { segments } => ToolEvent::SelectionChanged(self.selection(segments)?),
            ScriptEvent::Refresh => ToolEvent::Refresh,
            ScriptEvent::CycleMode => ToolEvent::CycleMode,
            ScriptEvent::SetMode { mode } => ToolEvent::SetMode(*mode),
            ScriptEvent::Duplicate { segment, name } => {
                return self.duplicate(segment, name);
            }
            ScriptEvent::Detach { point } => ToolEvent::Detach(self.resolve(point)?),
            ScriptEvent::SnapTo { point } => ToolEvent::SnapTo(self.resolve(point)?),
            ScriptEvent::RotateLeft => ToolEvent::Rotate(RotateDirection::Left),
            ScriptEvent::RotateRight => ToolEvent::Rotate(RotateDirection::Right),
            ScriptEvent::IncrementUp => ToolEvent::IncrementUp,
            ScriptEvent::IncrementDown => ToolEvent::IncrementDown,
            ScriptEvent::Move { segment, position } => {
                let id = self.segment(segment)?;
                self.history.record(&self.scene, "Move Object");
                self.scene.set_position(id, *position);
                ToolEvent::Refresh
            }
            ScriptEvent::Enable { segment } => {
                let id = self.segment(segment)?;
                self.history.record(&self.scene, "Enable");
                self.scene.activate(id);
                ToolEvent::Refresh
            }
            ScriptEvent::Disable { segment } => {
                let id = self.segment(segment)?;
                self.history.record(&self.scene, "Disable");
                self.scene.deactivate(id);
                ToolEvent::Refresh
            }
            ScriptEvent::Remove { segment } => {
                let id = self.segment(segment)?;
                self.history.record(&self.scene, "Delete");
                self.scene.remove_segment(id);
                ToolEvent::Refresh
            }
            ScriptEvent::Undo => {
                if self.history.undo(&mut self.scene) {
                    self.after_history_change();
                }
                return Ok(());
            }
            ScriptEvent::Redo => {
                if self.history.redo(&mut self.scene) {
                    self.after_history_change();
                }
                return Ok(());
            }
        };

        if let Some(outcome) = self.tool.handle_event(&mut self.scene, &mut self.history, tool_event) {
            let report = self.outcome_report(&outcome);
            self.outcomes.push(report);
        }
        Ok(())
    }

    fn duplicate(&mut self, source: &str, name: &str) -> HostResult<()> {
        if self.names.contains_key(name) {
            return Err(HostError::DuplicateName(name.to_string()));
        }
        let id = self.segment(source)?;
        if let Some(copy) = self.tool.duplicate(&mut self.scene, &mut self.history, id) {
            self.names.insert(name.to_string(), copy);
        }
        Ok(())
    }

    /// Re-index after the scene was swapped by undo or redo, keeping the redo stack.
    fn after_history_change(&mut self) {
        self.tool.handle_event(&mut self.scene, &mut NoopRecorder, ToolEvent::Refresh);
    }

    fn segment(&self, name: &str) -> HostResult<SegmentId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| HostError::UnknownSegment(name.to_string()))
    }

    fn selection(&self, names: &[String]) -> HostResult<Selection> {
        names.iter().map(|name| self.segment(name)).collect()
    }

    fn resolve(&self, point: &PointRef) -> HostResult<SnapPointId> {
        let id = self.segment(&point.segment)?;
        self.scene
            .segment(id)
            .and_then(|s| s.points().get(point.index).copied())
            .ok_or_else(|| HostError::InvalidPoint {
                segment: point.segment.clone(),
                index: point.index,
            })
    }

    fn resolve_optional(&self, point: Option<&PointRef>) -> HostResult<Option<SnapPointId>> {
        point.map(|p| self.resolve(p)).transpose()
    }

    /// `name[index]` for a point, or its handle if the owner is unnamed.
    fn point_label(&self, point: SnapPointId) -> String {
        let named = self.scene.owner(point).and_then(|owner| {
            let name = self.names.iter().find(|(_, id)| **id == owner)?.0;
            let index = self.scene.segment(owner)?.points().iter().position(|&p| p == point)?;
            Some(format!("{}[{}]", name, index))
        });
        named.unwrap_or_else(|| point.to_string())
    }

    fn outcome_report(&self, outcome: &DragOutcome) -> OutcomeReport {
        match outcome {
            DragOutcome::Linked { from, to } => OutcomeReport::Linked {
                from: self.point_label(*from),
                to: self.point_label(*to),
            },
            DragOutcome::Committed { delta, attached } => OutcomeReport::Committed {
                delta: *delta,
                attached: attached
                    .iter()
                    .map(|&(a, b)| (self.point_label(a), self.point_label(b)))
                    .collect(),
            },
            DragOutcome::Discarded => OutcomeReport::Discarded,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn tool(&self) -> &SnapTool {
        &self.tool
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    /// Look up a named point.
    pub fn point(&self, segment: &str, index: usize) -> HostResult<SnapPointId> {
        self.resolve(&PointRef {
            segment: segment.to_string(),
            index,
        })
    }

    pub fn report(&self) -> Report {
        let segments = self
            .names
            .iter()
            .filter_map(|(name, &id)| {
                let segment = self.scene.segment(id)?;
                let points = segment
                    .points()
                    .iter()
                    .enumerate()
                    .map(|(index, &p)| PointReport {
                        index,
                        world: self.scene.world_position(p).unwrap_or(DVec3::ZERO),
                        connected_to: self.scene.connection(p).map(|c| self.point_label(c)),
                    })
                    .collect();
                Some(SegmentReport {
                    name: name.clone(),
                    position: segment.position(),
                    yaw_degrees: segment.transform().yaw_degrees(),
                    active: segment.is_active(),
                    points,
                })
            })
            .collect();

        Report {
            status: self.tool.status(&self.scene),
            segments,
            outcomes: self.outcomes.clone(),
            undo_depth: self.history.len(),
            valid: self.scene.validate().is_ok(),
        }
    }
}
