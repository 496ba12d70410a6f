//! Rigid transform of a segment.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// World placement of a segment: a translation and a rotation.
///
/// Scale is not modelled; snap point offsets are expressed in the
/// segment's local frame and only rotated and translated into world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position of the segment pivot.
    pub position: DVec3,
    /// World orientation of the segment.
    pub rotation: DQuat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Transform at the origin with no rotation.
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    /// Create a transform at a position with no rotation.
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            rotation: DQuat::IDENTITY,
        }
    }

    /// Builder-style rotation setter.
    pub fn with_rotation(mut self, rotation: DQuat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Map a point from the segment's local frame into world space.
    pub fn transform_point(&self, local: DVec3) -> DVec3 {
        self.position + self.rotation * local
    }

    /// Move the pivot by a world-space offset.
    pub fn translate(&mut self, delta: DVec3) {
        self.position += delta;
    }

    /// Rotate around a local axis through the pivot.
    pub fn rotate_local(&mut self, axis: DVec3, angle_radians: f64) {
        let step = DQuat::from_axis_angle(axis.normalize(), angle_radians);
        self.rotation = (self.rotation * step).normalize();
    }

    /// Heading about world up in degrees: the angle of local +Z in the XZ plane.
    pub fn yaw_degrees(&self) -> f64 {
        let forward = self.rotation * DVec3::Z;
        forward.x.atan2(forward.z).to_degrees()
    }
}
