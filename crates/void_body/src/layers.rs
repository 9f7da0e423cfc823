//! Collision layers, broad-phase classification and exception filters

use crate::id::ObjectId;
use serde::{Deserialize, Serialize};

/// Collision groups for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionGroups {
    /// Which groups this object belongs to (collision layer)
    pub memberships: u32,
    /// Which groups this object can collide with (collision mask)
    pub filter: u32,
}

impl CollisionGroups {
    /// Member of the first layer, colliding with the first layer
    pub const DEFAULT: Self = Self {
        memberships: 1,
        filter: 1,
    };

    /// Create new collision groups
    pub fn new(memberships: u32, filter: u32) -> Self {
        Self { memberships, filter }
    }

    /// Check if two groups can collide
    pub fn can_collide(&self, other: &CollisionGroups) -> bool {
        (self.memberships & other.filter) != 0 || (other.memberships & self.filter) != 0
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Coarse classification used by the broad phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BroadPhaseLayer {
    /// Bodies that never move
    Static,
    /// Kinematic and rigid bodies
    Dynamic,
}

/// Index of a (broad-phase layer, collision groups) pair in a [`LayerMapper`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLayer(pub u16);

/// Lookup table from broad-phase layer and collision groups to object layers.
///
/// Pairs are interned on first use and keep their index afterwards.
#[derive(Debug, Default)]
pub struct LayerMapper {
    entries: Vec<(BroadPhaseLayer, CollisionGroups)>,
}

impl LayerMapper {
    /// Create an empty mapper
    pub fn new() -> Self {
        Self::default()
    }

    /// Object layer for the given pair, allocating one if needed
    pub fn to_object_layer(&mut self, broad_phase: BroadPhaseLayer, groups: CollisionGroups) -> ObjectLayer {
        if let Some(index) = self.entries.iter().position(|e| *e == (broad_phase, groups)) {
            return ObjectLayer(index as u16);
        }

        self.entries.push((broad_phase, groups));
        ObjectLayer((self.entries.len() - 1) as u16)
    }

    /// Broad-phase layer and groups behind an object layer
    pub fn from_object_layer(&self, layer: ObjectLayer) -> Option<(BroadPhaseLayer, CollisionGroups)> {
        self.entries.get(layer.0 as usize).copied()
    }

    /// Whether objects on the two layers may collide
    pub fn can_collide(&self, a: ObjectLayer, b: ObjectLayer) -> bool {
        match (self.from_object_layer(a), self.from_object_layer(b)) {
            (Some((bp_a, groups_a)), Some((bp_b, groups_b))) => {
                let both_static = bp_a == BroadPhaseLayer::Static && bp_b == BroadPhaseLayer::Static;
                !both_static && groups_a.can_collide(&groups_b)
            }
            _ => false,
        }
    }

    /// Number of interned layers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no layer has been interned yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collision exceptions of one body.
///
/// Shared with the engine body through an `Arc`; the owning body edits it
/// copy-on-write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFilter {
    exceptions: Vec<ObjectId>,
}

impl GroupFilter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude collisions with `body`
    pub fn add_exception(&mut self, body: ObjectId) {
        if !self.exceptions.contains(&body) {
            self.exceptions.push(body);
        }
    }

    /// Allow collisions with `body` again
    pub fn remove_exception(&mut self, body: ObjectId) {
        self.exceptions.retain(|e| *e != body);
    }

    /// Whether collisions with `body` are excluded
    pub fn has_exception(&self, body: ObjectId) -> bool {
        self.exceptions.contains(&body)
    }

    /// All excluded bodies
    pub fn exceptions(&self) -> &[ObjectId] {
        &self.exceptions
    }

    /// Number of excluded bodies
    pub fn exception_count(&self) -> usize {
        self.exceptions.len()
    }
}
