//! The snap tool: owns the registry and drives drag sessions from host events.

use crate::drag::{DragOutcome, DragSession};
use crate::history::UndoRecorder;
use crate::ids::{SegmentId, SnapPointId};
use crate::mode::{ViewMode, visible_links, visible_points};
use crate::reconcile::{auto_reconcile, reconcile_pending, snap_position};
use crate::registry::Registry;
use crate::scene::Scene;
use crate::selection::Selection;
use crate::settings::SnapSettings;
use glam::DVec3;
use serde::Serialize;
use std::fmt;

/// Rotation step in degrees, restricted to a fixed ladder when stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RotationIncrement(u16);

impl RotationIncrement {
    /// Values reachable with [`next`](Self::next) and [`prev`](Self::prev).
    pub const STEPS: [u16; 6] = [0, 15, 45, 90, 135, 180];

    pub fn new(degrees: u16) -> Self {
        Self(degrees)
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    pub fn radians(self) -> f64 {
        f64::from(self.0).to_radians()
    }

    /// Next step up. Stays put at the top or on a value off the ladder.
    pub fn next(self) -> Self {
        match Self::STEPS.iter().position(|&s| s == self.0) {
            Some(i) if i + 1 < Self::STEPS.len() => Self(Self::STEPS[i + 1]),
            _ => self,
        }
    }

    /// Next step down. Stays put at zero or on a value off the ladder.
    pub fn prev(self) -> Self {
        match Self::STEPS.iter().position(|&s| s == self.0) {
            Some(i) if i > 0 => Self(Self::STEPS[i - 1]),
            _ => self,
        }
    }
}

impl Default for RotationIncrement {
    fn default() -> Self {
        Self(crate::settings::DEFAULT_ROTATION_INCREMENT)
    }
}

/// Rotation direction about world up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

/// Discrete host input, delivered synchronously in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    /// Pointer pressed at a world position, optionally over a snap point handle.
    PointerDown {
        position: DVec3,
        target: Option<SnapPointId>,
    },
    /// Drag handle moved.
    PointerMove { position: DVec3 },
    /// Pointer released, optionally over a snap point handle.
    PointerUp { target: Option<SnapPointId> },
    /// The host selection changed.
    SelectionChanged(Selection),
    /// Re-index the scene.
    Refresh,
    /// Switch to the next view mode.
    CycleMode,
    SetMode(ViewMode),
    /// The host cloned a segment; the argument is the new copy.
    Duplicated(SegmentId),
    /// Detach button on a link.
    Detach(SnapPointId),
    /// Snap-to button on a link: move the point's owner onto its partner.
    SnapTo(SnapPointId),
    /// Rotate the selection by the current increment.
    Rotate(RotateDirection),
    IncrementUp,
    IncrementDown,
}

/// Current state of the tool.
#[derive(Debug, Clone, Default)]
pub enum DragState {
    /// Waiting for a pointer-down.
    #[default]
    Idle,
    /// A drag is in progress.
    Dragging(DragSession),
}

/// Counters shown in the tool overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolStatus {
    pub mode: ViewMode,
    pub increment: u16,
    pub drag_magnitude: f64,
    pub segments: usize,
    pub points: usize,
    pub connected: usize,
    pub visible: usize,
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Increment: {}", self.increment)?;
        writeln!(f, "Mode: {}", self.mode)?;
        writeln!(f, "Drag Magnitude: {:.3}", self.drag_magnitude)?;
        writeln!(f, "Segments | Snaps: {} | {}", self.segments, self.points)?;
        writeln!(f, "Connected Snaps: {}", self.connected)?;
        write!(f, "Visible Snaps: {}", self.visible)
    }
}

/// Interactive snapping tool.
///
/// Created when the host activates the tool and dropped when it is
/// deactivated; the registry lives exactly as long.
#[derive(Debug, Clone)]
pub struct SnapTool {
    settings: SnapSettings,
    registry: Registry,
    selection: Selection,
    mode: ViewMode,
    increment: RotationIncrement,
    visible: Vec<SnapPointId>,
    state: DragState,
}

impl SnapTool {
    /// Activate the tool: index the scene and reconcile pending segments.
    pub fn activate(
        scene: &mut Scene,
        recorder: &mut dyn UndoRecorder,
        selection: Selection,
        settings: SnapSettings,
    ) -> Self {
        let mut tool = Self {
            mode: settings.initial_mode,
            increment: RotationIncrement::new(settings.rotation_increment),
            settings,
            registry: Registry::new(),
            selection,
            visible: Vec::new(),
            state: DragState::Idle,
        };
        tool.refresh(scene, recorder);
        log::info!(
            "Snap tool active: {} segments, {} points",
            tool.registry.segments().len(),
            tool.registry.points().len()
        );
        tool
    }

    /// Handle one host event.
    ///
    /// Returns the outcome when the event ended a drag.
    pub fn handle_event(
        &mut self,
        scene: &mut Scene,
        recorder: &mut dyn UndoRecorder,
        event: ToolEvent,
    ) -> Option<DragOutcome> {
        let purged = self.registry.purge_stale(scene);
        if purged > 0 {
            log::debug!("Purged {} stale registry entries", purged);
        }

        let mut outcome = None;
        match event {
            ToolEvent::PointerDown { position, target } => self.begin_drag(scene, position, target),
            ToolEvent::PointerMove { position } => {
                if let DragState::Dragging(session) = &mut self.state {
                    session.update(scene, &self.registry, position, &self.settings);
                }
            }
            ToolEvent::PointerUp { target } => {
                if let DragState::Dragging(session) = std::mem::take(&mut self.state) {
                    outcome = Some(session.release(scene, &self.registry, recorder, target, &self.settings));
                }
            }
            ToolEvent::SelectionChanged(selection) => {
                self.selection = selection;
                self.refresh(scene, recorder);
            }
            ToolEvent::Refresh => self.refresh(scene, recorder),
            ToolEvent::CycleMode => {
                self.mode = self.mode.next();
                log::debug!("Mode: {}", self.mode);
            }
            ToolEvent::SetMode(mode) => self.mode = mode,
            ToolEvent::Duplicated(copy) => {
                self.registry.refresh(scene);
                auto_reconcile(scene, &self.registry, recorder, copy, &self.settings);
            }
            ToolEvent::Detach(point) => {
                scene.detach(point, recorder);
            }
            ToolEvent::SnapTo(point) => {
                snap_position(scene, recorder, point, true);
            }
            ToolEvent::Rotate(direction) => self.rotate_selection(scene, recorder, direction),
            ToolEvent::IncrementUp => self.increment = self.increment.next(),
            ToolEvent::IncrementDown => self.increment = self.increment.prev(),
        }

        self.update_visible(scene);
        outcome
    }

    /// Clone `source` through the scene and reconcile the copy, as one undo step.
    pub fn duplicate(
        &mut self,
        scene: &mut Scene,
        recorder: &mut dyn UndoRecorder,
        source: SegmentId,
    ) -> Option<SegmentId> {
        scene.segment(source)?;
        recorder.begin_group("Duplicate");
        recorder.record(scene, "Duplicate");
        let copy = scene.duplicate_segment(source);
        if let Some(copy) = copy {
            self.handle_event(scene, recorder, ToolEvent::Duplicated(copy));
        }
        recorder.end_group();
        copy
    }

    fn begin_drag(&mut self, scene: &Scene, position: DVec3, target: Option<SnapPointId>) {
        let from_point = target
            .filter(|&p| self.registry.contains_point(p))
            .and_then(|p| DragSession::from_point(scene, p));
        let session = from_point.or_else(|| DragSession::from_selection(scene, &self.selection, position));
        self.state = match session {
            Some(session) => DragState::Dragging(session),
            None => DragState::Idle,
        };
    }

    fn refresh(&mut self, scene: &mut Scene, recorder: &mut dyn UndoRecorder) {
        self.registry.refresh(scene);
        let attached = reconcile_pending(scene, &self.registry, recorder, &self.settings);
        if attached > 0 {
            log::info!("Reconciled {} coincident points", attached);
        }
        self.update_visible(scene);
    }

    fn rotate_selection(&mut self, scene: &mut Scene, recorder: &mut dyn UndoRecorder, direction: RotateDirection) {
        let targets = self.selection.active_segments(scene);
        if targets.is_empty() || self.increment.degrees() == 0 {
            return;
        }
        let (label, angle) = match direction {
            RotateDirection::Left => ("Rotate Object Left", -self.increment.radians()),
            RotateDirection::Right => ("Rotate Object Right", self.increment.radians()),
        };
        recorder.record(scene, label);
        for id in targets {
            scene.rotate_segment(id, DVec3::Y, angle);
        }
    }

    fn update_visible(&mut self, scene: &Scene) {
        self.visible = visible_points(scene, &self.registry, &self.selection, self.mode);
    }

    /// Points currently exposed for interaction.
    pub fn visible(&self) -> &[SnapPointId] {
        &self.visible
    }

    /// Links among the visible points, one entry per pair.
    pub fn visible_links(&self, scene: &Scene) -> Vec<(SnapPointId, SnapPointId)> {
        visible_links(scene, &self.visible)
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn increment(&self) -> RotationIncrement {
        self.increment
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &SnapSettings {
        &self.settings
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// The drag in progress, if any.
    pub fn drag(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn status(&self, scene: &Scene) -> ToolStatus {
        let points: Vec<SnapPointId> = self.registry.live_points(scene).collect();
        ToolStatus {
            mode: self.mode,
            increment: self.increment.degrees(),
            drag_magnitude: self.drag().map_or(0.0, DragSession::magnitude),
            segments: self.registry.segments().len(),
            points: points.len(),
            connected: points.iter().filter(|&&p| scene.is_connected(p)).count(),
            visible: self.visible.len(),
        }
    }
}
