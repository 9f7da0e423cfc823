//! Areas that override gravity and damping for the bodies they overlap

use crate::id::AreaId;
use crate::override_mode::OverrideMode;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Gravity pulling towards a point instead of along a direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointGravity {
    /// World-space center of attraction
    pub center: Vec3,
    /// Distance at which the strength equals the area's gravity.
    /// Zero means constant strength regardless of distance.
    pub unit_distance: f32,
}

/// Read-only view of an area consumed by bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Identity, used to remove the area from a body again
    pub id: AreaId,
    /// Higher priorities are evaluated first
    pub priority: i32,
    /// How gravity combines with lower priority areas
    pub gravity_mode: OverrideMode,
    /// Gravity strength
    pub gravity: f32,
    /// Gravity direction (ignored for point gravity)
    pub gravity_direction: Vec3,
    /// Point gravity, if enabled
    pub point_gravity: Option<PointGravity>,
    /// How linear damping combines
    pub linear_damp_mode: OverrideMode,
    /// Linear damping value
    pub linear_damp: f32,
    /// How angular damping combines
    pub angular_damp_mode: OverrideMode,
    /// Angular damping value
    pub angular_damp: f32,
}

impl Area {
    /// A disabled area that contributes nothing
    pub fn new(id: AreaId) -> Self {
        Self {
            id,
            priority: 0,
            gravity_mode: OverrideMode::Disabled,
            gravity: 9.81,
            gravity_direction: Vec3::NEG_Y,
            point_gravity: None,
            linear_damp_mode: OverrideMode::Disabled,
            linear_damp: 0.1,
            angular_damp_mode: OverrideMode::Disabled,
            angular_damp: 0.1,
        }
    }

    /// Set priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set directional gravity as a full vector
    pub fn with_gravity(mut self, mode: OverrideMode, gravity: Vec3) -> Self {
        self.gravity_mode = mode;
        self.gravity = gravity.length();
        self.gravity_direction = gravity.normalize_or_zero();
        self.point_gravity = None;
        self
    }

    /// Set point gravity
    pub fn with_point_gravity(mut self, mode: OverrideMode, strength: f32, point: PointGravity) -> Self {
        self.gravity_mode = mode;
        self.gravity = strength;
        self.point_gravity = Some(point);
        self
    }

    /// Set linear damping override
    pub fn with_linear_damp(mut self, mode: OverrideMode, damp: f32) -> Self {
        self.linear_damp_mode = mode;
        self.linear_damp = damp;
        self
    }

    /// Set angular damping override
    pub fn with_angular_damp(mut self, mode: OverrideMode, damp: f32) -> Self {
        self.angular_damp_mode = mode;
        self.angular_damp = damp;
        self
    }

    /// Gravity acting on a body at `position`
    pub fn compute_gravity(&self, position: Vec3) -> Vec3 {
        let Some(point) = self.point_gravity else {
            return self.gravity_direction * self.gravity;
        };

        let to_point = point.center - position;
        let distance_sq = to_point.length_squared();

        if distance_sq <= f32::EPSILON {
            return Vec3::ZERO;
        }

        let direction = to_point / distance_sq.sqrt();

        if point.unit_distance == 0.0 {
            direction * self.gravity
        } else {
            direction * (self.gravity * point.unit_distance * point.unit_distance / distance_sq)
        }
    }
}
