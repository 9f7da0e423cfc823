//! Parameter and state access

use super::{Body, BodyMode, Instance};
use crate::engine::MotionQuality;
use crate::error::{BodyError, Result};
use crate::override_mode::DampMode;
use crate::propagation::{ChangeEvent, Derivation};
use crate::transform::Transform;
use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

/// Engine-mirrored state of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyState {
    /// World transform
    Transform,
    /// Linear velocity
    LinearVelocity,
    /// Angular velocity
    AngularVelocity,
    /// Asleep flag
    Sleeping,
    /// Whether the body may fall asleep
    CanSleep,
}

impl TryFrom<i32> for BodyState {
    type Error = BodyError;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Transform),
            1 => Ok(Self::LinearVelocity),
            2 => Ok(Self::AngularVelocity),
            3 => Ok(Self::Sleeping),
            4 => Ok(Self::CanSleep),
            other => Err(BodyError::UnknownState(other)),
        }
    }
}

/// Tunable parameter of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyParameter {
    /// Restitution
    Bounce,
    /// Friction
    Friction,
    /// Mass override
    Mass,
    /// Inertia override
    Inertia,
    /// Center of mass override
    CenterOfMass,
    /// Gravity multiplier
    GravityScale,
    /// How linear damping combines with areas
    LinearDampMode,
    /// How angular damping combines with areas
    AngularDampMode,
    /// Linear damping
    LinearDamp,
    /// Angular damping
    AngularDamp,
}

impl TryFrom<i32> for BodyParameter {
    type Error = BodyError;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Bounce),
            1 => Ok(Self::Friction),
            2 => Ok(Self::Mass),
            3 => Ok(Self::Inertia),
            4 => Ok(Self::CenterOfMass),
            5 => Ok(Self::GravityScale),
            6 => Ok(Self::LinearDampMode),
            7 => Ok(Self::AngularDampMode),
            8 => Ok(Self::LinearDamp),
            9 => Ok(Self::AngularDamp),
            other => Err(BodyError::UnknownParameter(other)),
        }
    }
}

/// A parameter or state value
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BodyValue {
    /// No value
    #[default]
    Nil,
    /// Boolean
    Bool(bool),
    /// Integer (enumerations)
    Int(i32),
    /// Float
    Float(f32),
    /// Vector
    Vector(Vec3),
    /// Transform
    Transform(Transform),
}

impl BodyValue {
    /// Name of the value kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            BodyValue::Nil => "nil",
            BodyValue::Bool(_) => "bool",
            BodyValue::Int(_) => "int",
            BodyValue::Float(_) => "float",
            BodyValue::Vector(_) => "vector",
            BodyValue::Transform(_) => "transform",
        }
    }

    fn mismatch(&self, expected: &'static str) -> BodyError {
        BodyError::ValueType {
            expected,
            found: self.kind(),
        }
    }

    /// Boolean value
    pub fn as_bool(&self) -> Result<bool> {
        match *self {
            BodyValue::Bool(value) => Ok(value),
            _ => Err(self.mismatch("bool")),
        }
    }

    /// Integer value
    pub fn as_int(&self) -> Result<i32> {
        match *self {
            BodyValue::Int(value) => Ok(value),
            _ => Err(self.mismatch("int")),
        }
    }

    /// Float value; integers are widened
    pub fn as_float(&self) -> Result<f32> {
        match *self {
            BodyValue::Float(value) => Ok(value),
            BodyValue::Int(value) => Ok(value as f32),
            _ => Err(self.mismatch("float")),
        }
    }

    /// Vector value
    pub fn as_vector(&self) -> Result<Vec3> {
        match *self {
            BodyValue::Vector(value) => Ok(value),
            _ => Err(self.mismatch("vector")),
        }
    }

    /// Transform value
    pub fn as_transform(&self) -> Result<Transform> {
        match *self {
            BodyValue::Transform(value) => Ok(value),
            _ => Err(self.mismatch("transform")),
        }
    }
}

impl Body {
    // ==================== Keyed Access ====================

    /// Read a parameter
    pub fn param(&self, param: BodyParameter) -> Result<BodyValue> {
        Ok(match param {
            BodyParameter::Bounce => BodyValue::Float(self.bounce()?),
            BodyParameter::Friction => BodyValue::Float(self.friction()?),
            BodyParameter::Mass => BodyValue::Float(self.mass),
            BodyParameter::Inertia => BodyValue::Vector(self.inertia),
            BodyParameter::CenterOfMass => BodyValue::Vector(self.center_of_mass_custom.unwrap_or(Vec3::ZERO)),
            BodyParameter::GravityScale => BodyValue::Float(self.gravity_scale()?),
            BodyParameter::LinearDampMode => BodyValue::Int(self.linear_damp_mode.into()),
            BodyParameter::AngularDampMode => BodyValue::Int(self.angular_damp_mode.into()),
            BodyParameter::LinearDamp => BodyValue::Float(self.linear_damp),
            BodyParameter::AngularDamp => BodyValue::Float(self.angular_damp),
        })
    }

    /// Write a parameter
    pub fn set_param(&mut self, param: BodyParameter, value: BodyValue) -> Result<()> {
        match param {
            BodyParameter::Bounce => self.set_bounce(value.as_float()?),
            BodyParameter::Friction => self.set_friction(value.as_float()?),
            BodyParameter::Mass => {
                self.set_mass(value.as_float()?);
                Ok(())
            }
            BodyParameter::Inertia => {
                self.set_inertia(value.as_vector()?);
                Ok(())
            }
            BodyParameter::CenterOfMass => {
                self.set_center_of_mass(value.as_vector()?);
                Ok(())
            }
            BodyParameter::GravityScale => self.set_gravity_scale(value.as_float()?),
            BodyParameter::LinearDampMode => {
                self.set_linear_damp_mode(DampMode::try_from(value.as_int()?)?);
                Ok(())
            }
            BodyParameter::AngularDampMode => {
                self.set_angular_damp_mode(DampMode::try_from(value.as_int()?)?);
                Ok(())
            }
            BodyParameter::LinearDamp => {
                self.set_linear_damp(value.as_float()?);
                Ok(())
            }
            BodyParameter::AngularDamp => {
                self.set_angular_damp(value.as_float()?);
                Ok(())
            }
        }
    }

    /// Read a parameter by raw index. Failures are logged and yield `Nil`.
    pub fn param_raw(&self, param: i32) -> BodyValue {
        BodyParameter::try_from(param)
            .and_then(|param| self.param(param))
            .unwrap_or_else(|err| {
                log::error!("Failed to get parameter of {}: {}", self, err);
                BodyValue::Nil
            })
    }

    /// Write a parameter by raw index. Failures are logged.
    pub fn set_param_raw(&mut self, param: i32, value: BodyValue) {
        let result = BodyParameter::try_from(param).and_then(|param| self.set_param(param, value));
        if let Err(err) = result {
            log::error!("Failed to set parameter of {}: {}", self, err);
        }
    }

    /// Read engine-mirrored state
    pub fn state(&self, state: BodyState) -> Result<BodyValue> {
        Ok(match state {
            BodyState::Transform => BodyValue::Transform(self.transform()?),
            BodyState::LinearVelocity => BodyValue::Vector(self.linear_velocity()?),
            BodyState::AngularVelocity => BodyValue::Vector(self.angular_velocity()?),
            BodyState::Sleeping => BodyValue::Bool(self.is_sleeping()?),
            BodyState::CanSleep => BodyValue::Bool(self.can_sleep()?),
        })
    }

    /// Write engine-mirrored state
    pub fn set_state(&mut self, state: BodyState, value: BodyValue) -> Result<()> {
        match state {
            BodyState::Transform => self.set_transform(value.as_transform()?),
            BodyState::LinearVelocity => self.set_linear_velocity(value.as_vector()?),
            BodyState::AngularVelocity => self.set_angular_velocity(value.as_vector()?),
            BodyState::Sleeping => self.set_sleeping(value.as_bool()?),
            BodyState::CanSleep => self.set_can_sleep(value.as_bool()?),
        }
    }

    /// Read state by raw index. Failures are logged and yield `Nil`.
    pub fn state_raw(&self, state: i32) -> BodyValue {
        BodyState::try_from(state)
            .and_then(|state| self.state(state))
            .unwrap_or_else(|err| {
                log::error!("Failed to get state of {}: {}", self, err);
                BodyValue::Nil
            })
    }

    // ==================== Material ====================

    /// Restitution
    pub fn bounce(&self) -> Result<f32> {
        self.read(|s| s.restitution, |b| b.restitution())
    }

    /// Set restitution
    pub fn set_bounce(&mut self, bounce: f32) -> Result<()> {
        self.write(|s| s.restitution = bounce, |b| b.set_restitution(bounce))
    }

    /// Friction
    pub fn friction(&self) -> Result<f32> {
        self.read(|s| s.friction, |b| b.friction())
    }

    /// Set friction
    pub fn set_friction(&mut self, friction: f32) -> Result<()> {
        self.write(|s| s.friction = friction, |b| b.set_friction(friction))
    }

    /// Gravity multiplier
    pub fn gravity_scale(&self) -> Result<f32> {
        self.read(|s| s.gravity_factor, |b| b.gravity_factor())
    }

    /// Set gravity multiplier
    pub fn set_gravity_scale(&mut self, scale: f32) -> Result<()> {
        let attached = self.write(|s| s.gravity_factor = scale, |b| b.set_gravity_factor(scale));
        self.propagate(ChangeEvent::MotionChanged);
        attached
    }

    // ==================== Mass ====================

    /// Mass override
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Set mass override; non-positive derives it from the shape
    pub fn set_mass(&mut self, mass: f32) {
        if mass != self.mass {
            self.mass = mass;
            self.run(&[Derivation::UpdateMassProperties]);
        }
    }

    /// Inertia override
    pub fn inertia(&self) -> Vec3 {
        self.inertia
    }

    /// Set inertia override; any non-positive component derives it from the shape
    pub fn set_inertia(&mut self, inertia: Vec3) {
        if inertia != self.inertia {
            self.inertia = inertia;
            self.run(&[Derivation::UpdateMassProperties]);
        }
    }

    /// Override the center of mass
    pub fn set_center_of_mass(&mut self, center_of_mass: Vec3) {
        if self.center_of_mass_custom != Some(center_of_mass) {
            self.center_of_mass_custom = Some(center_of_mass);
            self.propagate(ChangeEvent::ShapesBuilt);
        }
    }

    /// Whether the center of mass is overridden
    pub fn has_custom_center_of_mass(&self) -> bool {
        self.center_of_mass_custom.is_some()
    }

    /// Drop the inertia and center of mass overrides
    pub fn reset_mass_properties(&mut self) {
        self.inertia = Vec3::ZERO;
        self.center_of_mass_custom = None;
        self.propagate(ChangeEvent::ShapesBuilt);
    }

    /// World position of the center of mass
    pub fn center_of_mass_position(&self) -> Result<Vec3> {
        let center_of_mass = self.center_of_mass_local();
        self.read(
            |s| s.position + s.rotation * center_of_mass,
            |b| b.center_of_mass_position(),
        )
    }

    /// Inverse mass as seen by the engine
    pub fn inverse_mass(&self) -> Result<f32> {
        Ok(self.read_engine("get inverse mass")?.inverse_mass())
    }

    /// Diagonal of the local inverse inertia as seen by the engine
    pub fn inverse_inertia(&self) -> Result<Vec3> {
        Ok(self.read_engine("get inverse inertia")?.inverse_inertia_diagonal())
    }

    /// World-space inverse inertia tensor as seen by the engine
    pub fn inverse_inertia_tensor(&self) -> Result<Mat3> {
        Ok(self.read_engine("get inverse inertia tensor")?.inverse_inertia_world())
    }

    // ==================== Damping ====================

    /// Linear damping of the body itself
    pub fn linear_damp(&self) -> f32 {
        self.linear_damp
    }

    /// Set linear damping; negative values are clamped to zero
    pub fn set_linear_damp(&mut self, damp: f32) {
        let damp = self.validate_damp(damp, "linear");
        if damp != self.linear_damp {
            self.linear_damp = damp;
            self.run(&[Derivation::UpdateDamp, Derivation::WakeUp]);
        }
    }

    /// Angular damping of the body itself
    pub fn angular_damp(&self) -> f32 {
        self.angular_damp
    }

    /// Set angular damping; negative values are clamped to zero
    pub fn set_angular_damp(&mut self, damp: f32) {
        let damp = self.validate_damp(damp, "angular");
        if damp != self.angular_damp {
            self.angular_damp = damp;
            self.run(&[Derivation::UpdateDamp, Derivation::WakeUp]);
        }
    }

    fn validate_damp(&self, damp: f32, channel: &str) -> f32 {
        if damp < 0.0 {
            log::warn!(
                "Invalid {} damp for {}. Values less than 0 are not supported and will be clamped.",
                channel,
                self
            );
            return 0.0;
        }
        damp
    }

    /// How linear damping combines with areas
    pub fn linear_damp_mode(&self) -> DampMode {
        self.linear_damp_mode
    }

    /// Set how linear damping combines with areas
    pub fn set_linear_damp_mode(&mut self, mode: DampMode) {
        if mode != self.linear_damp_mode {
            self.linear_damp_mode = mode;
            self.run(&[Derivation::UpdateDamp, Derivation::WakeUp]);
        }
    }

    /// How angular damping combines with areas
    pub fn angular_damp_mode(&self) -> DampMode {
        self.angular_damp_mode
    }

    /// Set how angular damping combines with areas
    pub fn set_angular_damp_mode(&mut self, mode: DampMode) {
        if mode != self.angular_damp_mode {
            self.angular_damp_mode = mode;
            self.run(&[Derivation::UpdateDamp, Derivation::WakeUp]);
        }
    }

    /// Linear damping after combining with areas
    pub fn total_linear_damp(&self) -> f32 {
        self.total_linear_damp
    }

    /// Angular damping after combining with areas
    pub fn total_angular_damp(&self) -> f32 {
        self.total_angular_damp
    }

    // ==================== Motion Quality ====================

    /// Whether continuous collision detection is on
    pub fn is_ccd_enabled(&self) -> Result<bool> {
        self.read(
            |s| s.motion_quality == MotionQuality::LinearCast,
            |b| b.motion_quality() == MotionQuality::LinearCast,
        )
    }

    /// Turn continuous collision detection on or off
    pub fn set_ccd_enabled(&mut self, enabled: bool) {
        let quality = if enabled {
            MotionQuality::LinearCast
        } else {
            MotionQuality::Discrete
        };

        match &mut self.instance {
            Instance::Pending(settings) => settings.motion_quality = quality,
            Instance::Attached { space, id } => space.write_bodies().set_motion_quality(*id, quality),
        }
    }

    // ==================== Sleep ====================

    /// Whether the body may fall asleep
    pub fn can_sleep(&self) -> Result<bool> {
        self.read(|s| s.allow_sleeping, |b| b.allow_sleeping())
    }

    /// Allow or forbid falling asleep
    pub fn set_can_sleep(&mut self, enabled: bool) -> Result<()> {
        self.write(|s| s.allow_sleeping = enabled, |b| b.set_allow_sleeping(enabled))
    }

    /// Whether the body is asleep; pending bodies never are
    pub fn is_sleeping(&self) -> Result<bool> {
        match &self.instance {
            Instance::Pending(_) => Ok(false),
            Instance::Attached { .. } => Ok(!self.read_engine("get sleep state")?.is_active()),
        }
    }

    /// Put the body to sleep or wake it up; no-op for pending bodies
    pub fn set_sleeping(&mut self, sleeping: bool) -> Result<()> {
        match &self.instance {
            Instance::Pending(_) => Ok(()),
            Instance::Attached { space, id } => {
                let mut bodies = space.write_bodies();
                if sleeping {
                    bodies.deactivate_body(*id);
                } else {
                    bodies.activate_body(*id);
                }
                Ok(())
            }
        }
    }

    // ==================== Transform & Velocity ====================

    /// World transform
    pub fn transform(&self) -> Result<Transform> {
        self.read(|s| Transform::new(s.rotation, s.position), |b| b.transform())
    }

    /// Teleport the body. Kinematic bodies store it as their target and
    /// move there during the next step.
    pub fn set_transform(&mut self, transform: Transform) -> Result<()> {
        if self.mode == BodyMode::Kinematic {
            self.kinematic_transform = transform;

            if let Instance::Pending(settings) = &mut self.instance {
                settings.position = transform.origin;
                settings.rotation = transform.rotation;
            }

            return Ok(());
        }

        self.write(
            |s| {
                s.position = transform.origin;
                s.rotation = transform.rotation;
            },
            |b| b.set_position_and_rotation(transform.origin, transform.rotation),
        )?;

        self.propagate(ChangeEvent::TransformChanged);
        Ok(())
    }

    /// Target transform of a kinematic body
    pub fn kinematic_transform(&self) -> Transform {
        self.kinematic_transform
    }

    /// Linear velocity; surface velocity for static and kinematic bodies
    pub fn linear_velocity(&self) -> Result<Vec3> {
        if !self.is_rigid() {
            return Ok(self.linear_surface_velocity);
        }
        self.read(|s| s.linear_velocity, |b| b.linear_velocity())
    }

    /// Set linear velocity; static and kinematic bodies store it as
    /// surface velocity
    pub fn set_linear_velocity(&mut self, velocity: Vec3) -> Result<()> {
        if !self.is_rigid() {
            self.linear_surface_velocity = velocity;
        } else {
            self.write(|s| s.linear_velocity = velocity, |b| b.set_linear_velocity_clamped(velocity))?;
        }

        self.propagate(ChangeEvent::MotionChanged);
        Ok(())
    }

    /// Angular velocity; surface velocity for static and kinematic bodies
    pub fn angular_velocity(&self) -> Result<Vec3> {
        if !self.is_rigid() {
            return Ok(self.angular_surface_velocity);
        }
        self.read(|s| s.angular_velocity, |b| b.angular_velocity())
    }

    /// Set angular velocity; static and kinematic bodies store it as
    /// surface velocity
    pub fn set_angular_velocity(&mut self, velocity: Vec3) -> Result<()> {
        if !self.is_rigid() {
            self.angular_surface_velocity = velocity;
        } else {
            self.write(|s| s.angular_velocity = velocity, |b| b.set_angular_velocity_clamped(velocity))?;
        }

        self.propagate(ChangeEvent::MotionChanged);
        Ok(())
    }

    /// Replace the linear velocity component along the direction of
    /// `axis_velocity` with `axis_velocity` itself
    pub fn set_axis_velocity(&mut self, axis_velocity: Vec3) -> Result<()> {
        let axis = axis_velocity.normalize_or_zero();
        let mut velocity = self.linear_velocity()?;
        velocity -= axis * axis.dot(velocity);
        velocity += axis_velocity;
        self.set_linear_velocity(velocity)
    }

    /// Surface velocity of a static or kinematic body
    pub fn surface_velocity(&self) -> (Vec3, Vec3) {
        (self.linear_surface_velocity, self.angular_surface_velocity)
    }
}
