//! Per-step hooks driven by the owning space

use super::{Body, BodyMode};
use crate::area::Area;
use crate::engine::EngineBody;
use crate::events::BodyStateUpdate;
use crate::override_mode::integrate;
use glam::Vec3;
use std::sync::Arc;

/// Gravity acting at `position`.
///
/// Walks `areas` (highest priority first) until an override terminates the
/// walk; the default area contributes only when none did.
pub fn aggregate_gravity(areas: &[Arc<Area>], default_area: &Area, position: Vec3) -> Vec3 {
    let mut gravity = Vec3::ZERO;
    let mut done = false;

    for area in areas {
        done = integrate(&mut gravity, area.gravity_mode, || area.compute_gravity(position));
        if done {
            break;
        }
    }

    if !done {
        gravity += default_area.compute_gravity(position);
    }

    gravity
}

impl Body {
    /// Hook run before the engine solves a step
    pub fn pre_step(&mut self, dt: f32) {
        if let Some((space, id)) = self.attachment() {
            let mut bodies = space.write_bodies();

            match bodies.get_mut(id) {
                Some(engine) => match self.mode {
                    BodyMode::Static => {}
                    BodyMode::Kinematic => {
                        self.move_kinematic(dt, engine);

                        if self.generates_contacts() {
                            self.sync_state = true;
                        }
                    }
                    BodyMode::Rigid | BodyMode::RigidLinear => {
                        self.integrate_forces(dt, engine, space.default_area());
                    }
                },
                None => log::error!("Engine body {:?} of {} is gone", id, self),
            }
        }

        self.contacts.reset();
    }

    /// Hook run after the engine solved a step
    pub fn post_step(&mut self) {
        if !std::mem::take(&mut self.sync_state) {
            return;
        }

        let Some((space, id)) = self.attachment() else {
            return;
        };

        let update = match space.read_body(id) {
            Some(engine) => BodyStateUpdate {
                body: self.rid,
                transform: engine.transform(),
                linear_velocity: engine.linear_velocity(),
                angular_velocity: engine.angular_velocity(),
                sleeping: !engine.is_active(),
                contact_count: self.contacts.len(),
            },
            None => {
                log::error!("Engine body {:?} of {} is gone", id, self);
                return;
            }
        };

        space.publish_state(update);
    }

    fn integrate_forces(&mut self, dt: f32, engine: &mut EngineBody, default_area: &Area) {
        if !engine.is_active() {
            return;
        }

        let gravity = aggregate_gravity(&self.areas, default_area, engine.position());
        self.gravity = gravity * engine.gravity_factor();

        if !self.custom_integrator {
            engine.set_linear_velocity_clamped(engine.linear_velocity() + self.gravity * dt);
            engine.add_force(self.constant_force);
            engine.add_torque(self.constant_torque);
        }

        self.sync_state = true;
    }

    fn move_kinematic(&mut self, dt: f32, engine: &mut EngineBody) {
        engine.set_linear_velocity(Vec3::ZERO);
        engine.set_angular_velocity(Vec3::ZERO);

        let target = self.kinematic_transform;

        if engine.transform() == target {
            return;
        }

        engine.move_kinematic(target.origin, target.rotation, dt);
        self.sync_state = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::AreaId;
    use crate::override_mode::OverrideMode;
    use approx::assert_relative_eq;

    fn default_area() -> Area {
        Area::new(AreaId(0)).with_gravity(OverrideMode::Combine, Vec3::new(0.0, -10.0, 0.0))
    }

    #[test]
    fn test_default_gravity_without_areas() {
        let gravity = aggregate_gravity(&[], &default_area(), Vec3::ZERO);
        assert_eq!(gravity, Vec3::new(0.0, -10.0, 0.0));
    }

    #[test]
    fn test_replace_area_hides_default() {
        let areas = [Arc::new(
            Area::new(AreaId(1)).with_gravity(OverrideMode::Replace, Vec3::new(1.0, 0.0, 0.0)),
        )];
        let gravity = aggregate_gravity(&areas, &default_area(), Vec3::ZERO);
        assert_eq!(gravity, Vec3::X);
    }

    #[test]
    fn test_combine_area_adds_to_default() {
        let areas = [Arc::new(
            Area::new(AreaId(1)).with_gravity(OverrideMode::Combine, Vec3::new(0.0, 4.0, 0.0)),
        )];
        let gravity = aggregate_gravity(&areas, &default_area(), Vec3::ZERO);
        assert_relative_eq!(gravity.y, -6.0);
    }

    #[test]
    fn test_replace_combine_keeps_walking() {
        let areas = [
            Arc::new(
                Area::new(AreaId(1))
                    .with_priority(2)
                    .with_gravity(OverrideMode::ReplaceCombine, Vec3::new(0.0, 0.0, 2.0)),
            ),
            Arc::new(
                Area::new(AreaId(2))
                    .with_priority(1)
                    .with_gravity(OverrideMode::CombineReplace, Vec3::new(0.0, 0.0, 3.0)),
            ),
        ];
        let gravity = aggregate_gravity(&areas, &default_area(), Vec3::ZERO);
        assert_eq!(gravity, Vec3::new(0.0, 0.0, 5.0));
    }
}
