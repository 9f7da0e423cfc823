//! Forces, impulses and standing forces

use super::Body;
use crate::error::Result;
use crate::propagation::ChangeEvent;
use glam::Vec3;

impl Body {
    /// Apply a force at `position`, an offset from the center of mass in
    /// world space. Ignored for non-rigid bodies and under a custom
    /// integrator.
    pub fn apply_force(&mut self, force: Vec3, position: Vec3) -> Result<()> {
        if !self.is_rigid() || self.custom_integrator || force == Vec3::ZERO {
            return Ok(());
        }

        {
            let mut engine = self.write_engine("apply force")?;
            let point = engine.center_of_mass_position() + position;
            engine.add_force_at(force, point);
        }

        self.propagate(ChangeEvent::MotionChanged);
        Ok(())
    }

    /// Apply a force through the center of mass
    pub fn apply_central_force(&mut self, force: Vec3) -> Result<()> {
        if !self.is_rigid() || self.custom_integrator || force == Vec3::ZERO {
            return Ok(());
        }

        self.write_engine("apply central force")?.add_force(force);

        self.propagate(ChangeEvent::MotionChanged);
        Ok(())
    }

    /// Apply an impulse at `position`, an offset from the center of mass
    pub fn apply_impulse(&mut self, impulse: Vec3, position: Vec3) -> Result<()> {
        if !self.is_rigid() || impulse == Vec3::ZERO {
            return Ok(());
        }

        {
            let mut engine = self.write_engine("apply impulse")?;
            let point = engine.center_of_mass_position() + position;
            engine.add_impulse_at(impulse, point);
        }

        self.propagate(ChangeEvent::MotionChanged);
        Ok(())
    }

    /// Apply an impulse through the center of mass
    pub fn apply_central_impulse(&mut self, impulse: Vec3) -> Result<()> {
        if !self.is_rigid() || impulse == Vec3::ZERO {
            return Ok(());
        }

        self.write_engine("apply central impulse")?.add_impulse(impulse);

        self.propagate(ChangeEvent::MotionChanged);
        Ok(())
    }

    /// Apply a torque. Ignored under a custom integrator.
    pub fn apply_torque(&mut self, torque: Vec3) -> Result<()> {
        if !self.is_rigid() || self.custom_integrator || torque == Vec3::ZERO {
            return Ok(());
        }

        self.write_engine("apply torque")?.add_torque(torque);

        self.propagate(ChangeEvent::MotionChanged);
        Ok(())
    }

    /// Apply an angular impulse
    pub fn apply_torque_impulse(&mut self, impulse: Vec3) -> Result<()> {
        if !self.is_rigid() || impulse == Vec3::ZERO {
            return Ok(());
        }

        self.write_engine("apply torque impulse")?.add_angular_impulse(impulse);

        self.propagate(ChangeEvent::MotionChanged);
        Ok(())
    }

    // ==================== Standing Forces ====================

    /// Add a standing force through the center of mass
    pub fn add_constant_central_force(&mut self, force: Vec3) {
        if force == Vec3::ZERO {
            return;
        }

        self.constant_force += force;
        self.propagate(ChangeEvent::MotionChanged);
    }

    /// Add a standing force at `position`, an offset from the body origin.
    ///
    /// The resulting torque is computed once, against the center of mass at
    /// the time of the call.
    pub fn add_constant_force(&mut self, force: Vec3, position: Vec3) -> Result<()> {
        if force == Vec3::ZERO {
            return Ok(());
        }

        let lever = {
            let engine = self.read_engine("add constant force")?;
            position - (engine.center_of_mass_position() - engine.position())
        };

        self.constant_force += force;
        self.constant_torque += lever.cross(force);

        self.propagate(ChangeEvent::MotionChanged);
        Ok(())
    }

    /// Add a standing torque
    pub fn add_constant_torque(&mut self, torque: Vec3) {
        if torque == Vec3::ZERO {
            return;
        }

        self.constant_torque += torque;
        self.propagate(ChangeEvent::MotionChanged);
    }

    /// Standing force applied every step
    pub fn constant_force(&self) -> Vec3 {
        self.constant_force
    }

    /// Replace the standing force
    pub fn set_constant_force(&mut self, force: Vec3) {
        if self.constant_force != force {
            self.constant_force = force;
            self.propagate(ChangeEvent::MotionChanged);
        }
    }

    /// Standing torque applied every step
    pub fn constant_torque(&self) -> Vec3 {
        self.constant_torque
    }

    /// Replace the standing torque
    pub fn set_constant_torque(&mut self, torque: Vec3) {
        if self.constant_torque != torque {
            self.constant_torque = torque;
            self.propagate(ChangeEvent::MotionChanged);
        }
    }
}
