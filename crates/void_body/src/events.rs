//! State-sync notifications published after each step

use crate::id::ObjectId;
use crate::transform::Transform;
use glam::Vec3;

/// Observable state of a body after a step.
///
/// Published on the owning space's channel for every body whose state-sync
/// flag was raised during the step.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyStateUpdate {
    /// Body the update belongs to
    pub body: ObjectId,
    /// World transform
    pub transform: Transform,
    /// Linear velocity
    pub linear_velocity: Vec3,
    /// Angular velocity
    pub angular_velocity: Vec3,
    /// Whether the body is asleep
    pub sleeping: bool,
    /// Number of contacts recorded this step
    pub contact_count: usize,
}

impl BodyStateUpdate {
    /// Check if the body moves at all
    pub fn is_moving(&self) -> bool {
        self.linear_velocity != Vec3::ZERO || self.angular_velocity != Vec3::ZERO
    }

    /// Kinetic speed of the body
    pub fn speed(&self) -> f32 {
        self.linear_velocity.length()
    }
}

/// Handler trait for state-sync notifications
pub trait StateSyncHandler {
    /// Called once per published update
    fn on_state_sync(&mut self, update: &BodyStateUpdate);
}

/// Handler that collects updates into a buffer
#[derive(Debug, Default)]
pub struct StateCollector {
    /// Updates received so far
    pub updates: Vec<BodyStateUpdate>,
}

impl StateCollector {
    /// Create a new collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest update of `body`, if any
    pub fn latest(&self, body: ObjectId) -> Option<&BodyStateUpdate> {
        self.updates.iter().rev().find(|update| update.body == body)
    }

    /// Clear all collected updates
    pub fn clear(&mut self) {
        self.updates.clear();
    }
}

impl StateSyncHandler for StateCollector {
    fn on_state_sync(&mut self, update: &BodyStateUpdate) {
        self.updates.push(update.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(body: u64, velocity: Vec3) -> BodyStateUpdate {
        BodyStateUpdate {
            body: ObjectId(body),
            transform: Transform::IDENTITY,
            linear_velocity: velocity,
            angular_velocity: Vec3::ZERO,
            sleeping: false,
            contact_count: 0,
        }
    }

    #[test]
    fn test_is_moving() {
        assert!(!update(1, Vec3::ZERO).is_moving());
        assert!(update(1, Vec3::X).is_moving());
    }

    #[test]
    fn test_collector_latest() {
        let mut collector = StateCollector::new();
        collector.on_state_sync(&update(1, Vec3::X));
        collector.on_state_sync(&update(2, Vec3::Y));
        collector.on_state_sync(&update(1, Vec3::Z));

        assert_eq!(collector.latest(ObjectId(1)).unwrap().linear_velocity, Vec3::Z);
        assert!(collector.latest(ObjectId(3)).is_none());

        collector.clear();
        assert!(collector.updates.is_empty());
    }
}
