//! Rigid transform (rotation + origin) without scale

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World placement of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Orientation
    pub rotation: Quat,
    /// Position
    pub origin: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No rotation, placed at the origin
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        origin: Vec3::ZERO,
    };

    /// Create from rotation and origin
    pub fn new(rotation: Quat, origin: Vec3) -> Self {
        Self { rotation, origin }
    }

    /// Pure translation
    pub fn from_translation(origin: Vec3) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            origin,
        }
    }

    /// Transform a local point into world space
    pub fn xform(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.origin
    }

    /// Transform a world point into local space
    pub fn xform_inv(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_xform_roundtrip() {
        let transform = Transform::new(Quat::from_rotation_y(FRAC_PI_2), Vec3::new(1.0, 2.0, 3.0));
        let world = transform.xform(Vec3::X);
        assert_relative_eq!(world.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(world.z, 2.0, epsilon = 1e-5);

        let local = transform.xform_inv(world);
        assert_relative_eq!(local.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(local.z, 0.0, epsilon = 1e-5);
    }
}
