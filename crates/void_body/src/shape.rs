//! Shape collaborator consumed by bodies
//!
//! Shape construction and compounding happen elsewhere; a body only needs
//! the intrinsic mass properties and center of mass of whatever it holds.

use crate::mass::MassProperties;
use glam::Vec3;
use std::fmt;

/// A built collision shape
pub trait Shape: Send + Sync + fmt::Debug {
    /// Mass properties of the shape at its own density
    fn mass_properties(&self) -> MassProperties;

    /// Center of mass relative to the body origin
    fn center_of_mass(&self) -> Vec3;
}

/// Shape whose mass properties were computed up front
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecomputedShape {
    /// Intrinsic mass properties
    pub mass_properties: MassProperties,
    /// Center of mass
    pub center_of_mass: Vec3,
}

impl PrecomputedShape {
    /// Create from mass and inertia diagonal, centered at the origin
    pub fn new(mass: f32, inertia: Vec3) -> Self {
        Self {
            mass_properties: MassProperties::from_diagonal(mass, inertia),
            center_of_mass: Vec3::ZERO,
        }
    }

    /// Offset the center of mass
    pub fn with_center_of_mass(mut self, center_of_mass: Vec3) -> Self {
        self.center_of_mass = center_of_mass;
        self
    }
}

impl Shape for PrecomputedShape {
    fn mass_properties(&self) -> MassProperties {
        self.mass_properties
    }

    fn center_of_mass(&self) -> Vec3 {
        self.center_of_mass
    }
}
