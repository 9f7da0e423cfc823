//! Degree-of-freedom locks and the constraint that enforces them

use crate::error::BodyError;
use crate::id::{BodyId, ConstraintId};
use crate::space::Space;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::{Arc, Weak};

/// Set of locked degrees of freedom
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AxisMask(u8);

impl AxisMask {
    /// Nothing locked
    pub const NONE: Self = Self(0);
    /// Translation along X
    pub const LINEAR_X: Self = Self(1 << 0);
    /// Translation along Y
    pub const LINEAR_Y: Self = Self(1 << 1);
    /// Translation along Z
    pub const LINEAR_Z: Self = Self(1 << 2);
    /// Rotation about X
    pub const ANGULAR_X: Self = Self(1 << 3);
    /// Rotation about Y
    pub const ANGULAR_Y: Self = Self(1 << 4);
    /// Rotation about Z
    pub const ANGULAR_Z: Self = Self(1 << 5);
    /// All translations
    pub const LINEAR: Self = Self(0b000_111);
    /// All rotations
    pub const ANGULAR: Self = Self(0b111_000);
    /// Every degree of freedom
    pub const ALL: Self = Self(0b111_111);

    /// Raw bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Create from raw bits, rejecting unknown axes
    pub fn from_bits(bits: u32) -> Result<Self, BodyError> {
        if bits & !(Self::ALL.0 as u32) != 0 {
            return Err(BodyError::UnknownAxis(bits));
        }
        Ok(Self(bits as u8))
    }

    /// Whether every axis of `other` is in this set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no axis is locked
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Add or remove the axes of `other`
    pub fn set(&mut self, other: Self, locked: bool) {
        if locked {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }

    /// Only the translational axes
    pub const fn linear(self) -> Self {
        Self(self.0 & Self::LINEAR.0)
    }

    /// Only the rotational axes
    pub const fn angular(self) -> Self {
        Self(self.0 & Self::ANGULAR.0)
    }

    /// Locked flags per world axis for translation
    pub fn linear_flags(self) -> [bool; 3] {
        [
            self.contains(Self::LINEAR_X),
            self.contains(Self::LINEAR_Y),
            self.contains(Self::LINEAR_Z),
        ]
    }

    /// Locked flags per world axis for rotation
    pub fn angular_flags(self) -> [bool; 3] {
        [
            self.contains(Self::ANGULAR_X),
            self.contains(Self::ANGULAR_Y),
            self.contains(Self::ANGULAR_Z),
        ]
    }
}

impl BitOr for AxisMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AxisMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for AxisMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 6] = ["LINEAR_X", "LINEAR_Y", "LINEAR_Z", "ANGULAR_X", "ANGULAR_Y", "ANGULAR_Z"];
        let names: Vec<&str> = NAMES
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.0 & (1 << bit) != 0)
            .map(|(_, name)| *name)
            .collect();
        write!(f, "AxisMask({})", names.join(" | "))
    }
}

/// Axes the lock constraint should fix, or `None` when nothing is locked.
///
/// Angular locks are dropped for translation-only bodies: their rotation is
/// already frozen through zero inverse inertia and an extra angular
/// constraint on top of that goes numerically unstable.
pub fn constrained_axes(locked: AxisMask, translation_only: bool) -> Option<AxisMask> {
    let axes = if translation_only { locked.linear() } else { locked };

    if axes.is_empty() {
        None
    } else {
        Some(axes)
    }
}

/// Six degree-of-freedom constraint tying a body to the static world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SixDofConstraint {
    /// Constrained body
    pub body: BodyId,
    /// World-space anchor, the body's center of mass when built
    pub anchor: Vec3,
    /// Fixed sub-axes
    pub fixed_axes: AxisMask,
}

/// Exclusive ownership of a constraint registered with a space.
///
/// Dropping it unregisters the constraint.
pub struct OwnedConstraint {
    id: ConstraintId,
    space: Weak<Space>,
}

impl OwnedConstraint {
    /// Register `constraint` with `space`
    pub fn register(space: &Arc<Space>, constraint: SixDofConstraint) -> Self {
        let id = space.add_joint(constraint);
        Self {
            id,
            space: Arc::downgrade(space),
        }
    }

    /// Registry handle
    pub fn id(&self) -> ConstraintId {
        self.id
    }
}

impl fmt::Debug for OwnedConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedConstraint").field("id", &self.id).finish()
    }
}

impl Drop for OwnedConstraint {
    fn drop(&mut self) {
        if let Some(space) = self.space.upgrade() {
            space.remove_joint(self.id);
        }
    }
}
