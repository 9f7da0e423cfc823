//! Space configuration

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Configuration of a simulation space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceConfig {
    /// Gravity of the default area (default: -9.81 in Y)
    pub gravity: [f32; 3],

    /// Linear damping of the default area
    pub default_linear_damp: f32,

    /// Angular damping of the default area
    pub default_angular_damp: f32,

    /// Fixed timestep for the simulation
    pub timestep: f32,

    /// Ceiling for the magnitude of linear velocity (m/s)
    pub max_linear_velocity: f32,

    /// Ceiling for the magnitude of angular velocity (rad/s)
    pub max_angular_velocity: f32,

    /// Velocity below which a body counts as resting
    pub sleep_velocity_threshold: f32,

    /// Seconds a body must rest before it is put to sleep
    pub time_before_sleep: f32,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            default_linear_damp: 0.1,
            default_angular_damp: 0.1,
            timestep: 1.0 / 60.0,
            max_linear_velocity: 500.0,
            max_angular_velocity: 0.25 * PI * 60.0,
            sleep_velocity_threshold: 0.03,
            time_before_sleep: 0.5,
        }
    }
}

impl SpaceConfig {
    /// A space without gravity or default damping
    pub fn zero_g() -> Self {
        Self {
            gravity: [0.0, 0.0, 0.0],
            default_linear_damp: 0.0,
            default_angular_damp: 0.0,
            ..Default::default()
        }
    }

    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32, z: f32) -> Self {
        self.gravity = [x, y, z];
        self
    }

    /// Set the damping of the default area
    pub fn with_default_damp(mut self, linear: f32, angular: f32) -> Self {
        self.default_linear_damp = linear;
        self.default_angular_damp = angular;
        self
    }

    /// Set timestep
    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    /// Set the velocity ceilings
    pub fn with_max_velocities(mut self, linear: f32, angular: f32) -> Self {
        self.max_linear_velocity = linear;
        self.max_angular_velocity = angular;
        self
    }

    /// Set how long a body must rest before it sleeps
    pub fn with_time_before_sleep(mut self, seconds: f32) -> Self {
        self.time_before_sleep = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_g_keeps_clamps() {
        let config = SpaceConfig::zero_g();
        assert_eq!(config.gravity, [0.0, 0.0, 0.0]);
        assert_eq!(config.default_linear_damp, 0.0);
        assert_eq!(config.max_linear_velocity, 500.0);
    }

    #[test]
    fn test_builders() {
        let config = SpaceConfig::default()
            .with_gravity(0.0, -1.0, 0.0)
            .with_max_velocities(10.0, 2.0);
        assert_eq!(config.gravity[1], -1.0);
        assert_eq!(config.max_angular_velocity, 2.0);
    }
}
