//! Engine-side body storage
//!
//! This is the live simulation data a [`Body`](crate::body::Body) is
//! reconciled against. The storage lives behind the owning space's lock;
//! every access from a body goes through a guard handed out by the space.

use crate::constraint::SixDofConstraint;
use crate::id::{BodyId, ObjectId};
use crate::layers::{GroupFilter, ObjectLayer};
use crate::mass::MassProperties;
use crate::transform::Transform;
use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How the engine moves a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionType {
    /// Never moves
    Static,
    /// Moved by placing it, pushes dynamic bodies
    Kinematic,
    /// Fully simulated
    Dynamic,
}

/// Collision detection quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionQuality {
    /// Test at the end of the step only
    #[default]
    Discrete,
    /// Sweep along the motion (continuous collision detection)
    LinearCast,
}

/// Everything needed to create an engine body.
///
/// Doubles as the pending record of a body that is not part of a space,
/// and as the snapshot taken when it leaves one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySettings {
    /// Origin of the body
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
    /// Linear velocity of the center of mass
    pub linear_velocity: Vec3,
    /// Angular velocity
    pub angular_velocity: Vec3,
    /// Motion type
    pub motion_type: MotionType,
    /// Continuous collision detection
    pub motion_quality: MotionQuality,
    /// Whether the body may fall asleep
    pub allow_sleeping: bool,
    /// Friction coefficient
    pub friction: f32,
    /// Restitution (bounciness)
    pub restitution: f32,
    /// Linear damping
    pub linear_damping: f32,
    /// Angular damping
    pub angular_damping: f32,
    /// Multiplier for gravity
    pub gravity_factor: f32,
    /// Linear velocity ceiling
    pub max_linear_velocity: f32,
    /// Angular velocity ceiling
    pub max_angular_velocity: f32,
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            motion_type: MotionType::Dynamic,
            motion_quality: MotionQuality::Discrete,
            allow_sleeping: true,
            friction: 1.0,
            restitution: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_factor: 1.0,
            max_linear_velocity: 500.0,
            max_angular_velocity: 0.25 * std::f32::consts::PI * 60.0,
        }
    }
}

/// A live engine body
#[derive(Debug, Clone)]
pub struct EngineBody {
    owner: ObjectId,
    position: Vec3,
    rotation: Quat,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    motion_type: MotionType,
    motion_quality: MotionQuality,
    active: bool,
    allow_sleeping: bool,
    sleep_timer: f32,
    friction: f32,
    restitution: f32,
    gravity_factor: f32,
    linear_damping: f32,
    angular_damping: f32,
    max_linear_velocity: f32,
    max_angular_velocity: f32,
    mass_properties: MassProperties,
    inverse_mass: f32,
    inverse_inertia: Mat3,
    center_of_mass: Vec3,
    force: Vec3,
    torque: Vec3,
    object_layer: ObjectLayer,
    group_filter: Option<Arc<GroupFilter>>,
}

impl EngineBody {
    /// Create from settings. Mass properties start at unit mass and
    /// identity inertia until the owner provides real ones.
    pub fn new(owner: ObjectId, settings: &BodySettings, object_layer: ObjectLayer) -> Self {
        let mass_properties = MassProperties::default();
        let mut body = Self {
            owner,
            position: settings.position,
            rotation: settings.rotation,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            motion_type: settings.motion_type,
            motion_quality: settings.motion_quality,
            active: false,
            allow_sleeping: settings.allow_sleeping,
            sleep_timer: 0.0,
            friction: settings.friction,
            restitution: settings.restitution,
            gravity_factor: settings.gravity_factor,
            linear_damping: settings.linear_damping,
            angular_damping: settings.angular_damping,
            max_linear_velocity: settings.max_linear_velocity,
            max_angular_velocity: settings.max_angular_velocity,
            mass_properties,
            inverse_mass: mass_properties.inverse_mass(),
            inverse_inertia: mass_properties.inverse_inertia(),
            center_of_mass: Vec3::ZERO,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            object_layer,
            group_filter: None,
        };

        if body.motion_type != MotionType::Static {
            body.linear_velocity = settings.linear_velocity;
            body.angular_velocity = settings.angular_velocity;
        }

        body
    }

    /// Snapshot of the body as creation settings
    pub fn creation_settings(&self) -> BodySettings {
        BodySettings {
            position: self.position,
            rotation: self.rotation,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            motion_type: self.motion_type,
            motion_quality: self.motion_quality,
            allow_sleeping: self.allow_sleeping,
            friction: self.friction,
            restitution: self.restitution,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            gravity_factor: self.gravity_factor,
            max_linear_velocity: self.max_linear_velocity,
            max_angular_velocity: self.max_angular_velocity,
        }
    }

    /// Body object that owns this engine body
    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    // ==================== Pose ====================

    /// Origin of the body
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Orientation
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Origin and orientation
    pub fn transform(&self) -> Transform {
        Transform::new(self.rotation, self.position)
    }

    /// Teleport the body
    pub fn set_position_and_rotation(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation.normalize();
    }

    /// Center of mass relative to the origin, in local space
    pub fn center_of_mass_local(&self) -> Vec3 {
        self.center_of_mass
    }

    /// Move the center of mass, keeping the origin in place
    pub fn set_center_of_mass_local(&mut self, center_of_mass: Vec3) {
        self.center_of_mass = center_of_mass;
    }

    /// World position of the center of mass
    pub fn center_of_mass_position(&self) -> Vec3 {
        self.position + self.rotation * self.center_of_mass
    }

    // ==================== Motion ====================

    /// Motion type
    pub fn motion_type(&self) -> MotionType {
        self.motion_type
    }

    /// Change the motion type; static bodies lose their velocity
    pub fn set_motion_type(&mut self, motion_type: MotionType) {
        self.motion_type = motion_type;

        if motion_type == MotionType::Static {
            self.linear_velocity = Vec3::ZERO;
            self.angular_velocity = Vec3::ZERO;
            self.active = false;
        }
    }

    /// Collision detection quality
    pub fn motion_quality(&self) -> MotionQuality {
        self.motion_quality
    }

    /// Set collision detection quality
    pub fn set_motion_quality(&mut self, quality: MotionQuality) {
        self.motion_quality = quality;
    }

    /// Linear velocity
    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    /// Angular velocity
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Set linear velocity without clamping
    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity;
    }

    /// Set angular velocity without clamping
    pub fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
    }

    /// Set linear velocity, clamped to the configured ceiling
    pub fn set_linear_velocity_clamped(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity.clamp_length_max(self.max_linear_velocity);
    }

    /// Set angular velocity, clamped to the configured ceiling
    pub fn set_angular_velocity_clamped(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity.clamp_length_max(self.max_angular_velocity);
    }

    /// Linear velocity ceiling
    pub fn max_linear_velocity(&self) -> f32 {
        self.max_linear_velocity
    }

    /// Angular velocity ceiling
    pub fn max_angular_velocity(&self) -> f32 {
        self.max_angular_velocity
    }

    /// Multiplier applied to gravity
    pub fn gravity_factor(&self) -> f32 {
        self.gravity_factor
    }

    /// Set the gravity multiplier
    pub fn set_gravity_factor(&mut self, factor: f32) {
        self.gravity_factor = factor;
    }

    /// Linear damping
    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    /// Angular damping
    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    /// Set linear damping
    pub fn set_linear_damping(&mut self, damping: f32) {
        self.linear_damping = damping;
    }

    /// Set angular damping
    pub fn set_angular_damping(&mut self, damping: f32) {
        self.angular_damping = damping;
    }

    /// Move a kinematic body to `position`/`rotation` over `dt` seconds by
    /// giving it the velocity that gets it there in one step.
    pub fn move_kinematic(&mut self, position: Vec3, rotation: Quat, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        let target_com = position + rotation * self.center_of_mass;
        self.linear_velocity = (target_com - self.center_of_mass_position()) / dt;

        let mut delta = rotation * self.rotation.inverse();
        if delta.w < 0.0 {
            delta = -delta;
        }
        let (axis, angle) = delta.to_axis_angle();
        self.angular_velocity = if angle.is_finite() { axis * (angle / dt) } else { Vec3::ZERO };

        self.activate();
    }

    // ==================== Activation ====================

    /// Whether the body is simulated this step
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Wake the body up. Static bodies stay inactive.
    pub fn activate(&mut self) {
        if self.motion_type != MotionType::Static {
            self.active = true;
            self.sleep_timer = 0.0;
        }
    }

    /// Put the body to sleep, dropping its velocity
    pub fn deactivate(&mut self) {
        self.active = false;
        self.sleep_timer = 0.0;
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    /// Whether the body may fall asleep on its own
    pub fn allow_sleeping(&self) -> bool {
        self.allow_sleeping
    }

    /// Allow or forbid falling asleep. Activation is left as it is.
    pub fn set_allow_sleeping(&mut self, allow: bool) {
        self.allow_sleeping = allow;
    }

    // ==================== Material ====================

    /// Friction coefficient
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Set friction coefficient
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = friction;
    }

    /// Restitution
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Set restitution
    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = restitution;
    }

    // ==================== Mass ====================

    /// Mass properties last given to the body
    pub fn mass_properties(&self) -> &MassProperties {
        &self.mass_properties
    }

    /// Replace mass properties, recomputing the inverses
    pub fn set_mass_properties(&mut self, properties: MassProperties) {
        self.mass_properties = properties;
        self.inverse_mass = properties.inverse_mass();
        self.inverse_inertia = properties.inverse_inertia();
    }

    /// Override the local inverse inertia tensor
    pub fn set_inverse_inertia(&mut self, inverse_inertia: Mat3) {
        self.inverse_inertia = inverse_inertia;
    }

    /// Inverse mass
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Inverse inertia in local space
    pub fn inverse_inertia_local(&self) -> Mat3 {
        self.inverse_inertia
    }

    /// Diagonal of the local inverse inertia
    pub fn inverse_inertia_diagonal(&self) -> Vec3 {
        Vec3::new(
            self.inverse_inertia.x_axis.x,
            self.inverse_inertia.y_axis.y,
            self.inverse_inertia.z_axis.z,
        )
    }

    /// Inverse inertia rotated into world space
    pub fn inverse_inertia_world(&self) -> Mat3 {
        let rotation = Mat3::from_quat(self.rotation);
        rotation * self.inverse_inertia * rotation.transpose()
    }

    // ==================== Forces ====================

    /// Accumulated force for this step
    pub fn force(&self) -> Vec3 {
        self.force
    }

    /// Accumulated torque for this step
    pub fn torque(&self) -> Vec3 {
        self.torque
    }

    /// Add a force through the center of mass
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Add a force at a world-space point
    pub fn add_force_at(&mut self, force: Vec3, point: Vec3) {
        self.force += force;
        self.torque += (point - self.center_of_mass_position()).cross(force);
    }

    /// Add a torque
    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    /// Drop the accumulated force
    pub fn reset_force(&mut self) {
        self.force = Vec3::ZERO;
    }

    /// Drop the accumulated torque
    pub fn reset_torque(&mut self) {
        self.torque = Vec3::ZERO;
    }

    /// Apply an impulse through the center of mass
    pub fn add_impulse(&mut self, impulse: Vec3) {
        self.set_linear_velocity_clamped(self.linear_velocity + impulse * self.inverse_mass);
    }

    /// Apply an impulse at a world-space point
    pub fn add_impulse_at(&mut self, impulse: Vec3, point: Vec3) {
        self.add_impulse(impulse);
        self.add_angular_impulse((point - self.center_of_mass_position()).cross(impulse));
    }

    /// Apply an angular impulse
    pub fn add_angular_impulse(&mut self, impulse: Vec3) {
        let delta = self.inverse_inertia_world() * impulse;
        self.set_angular_velocity_clamped(self.angular_velocity + delta);
    }

    // ==================== Filtering ====================

    /// Object layer
    pub fn object_layer(&self) -> ObjectLayer {
        self.object_layer
    }

    /// Set object layer
    pub fn set_object_layer(&mut self, layer: ObjectLayer) {
        self.object_layer = layer;
    }

    /// Collision exceptions shared with the owner
    pub fn group_filter(&self) -> Option<&Arc<GroupFilter>> {
        self.group_filter.as_ref()
    }

    /// Replace the collision exceptions
    pub fn set_group_filter(&mut self, filter: Option<Arc<GroupFilter>>) {
        self.group_filter = filter;
    }

    // ==================== Integration ====================

    fn integrate(&mut self, dt: f32, constraints: &[SixDofConstraint], id: BodyId) {
        if self.motion_type == MotionType::Dynamic {
            let linear = self.linear_velocity + self.force * (self.inverse_mass * dt);
            let angular = self.angular_velocity + self.inverse_inertia_world() * self.torque * dt;

            let linear = linear * (1.0 - self.linear_damping * dt).max(0.0);
            let angular = angular * (1.0 - self.angular_damping * dt).max(0.0);

            self.set_linear_velocity_clamped(linear);
            self.set_angular_velocity_clamped(angular);
        }

        let mut center_of_mass = self.center_of_mass_position();

        for constraint in constraints.iter().filter(|c| c.body == id) {
            let linear = constraint.fixed_axes.linear_flags();
            let angular = constraint.fixed_axes.angular_flags();

            for axis in 0..3 {
                if linear[axis] {
                    self.linear_velocity[axis] = 0.0;
                    center_of_mass[axis] = constraint.anchor[axis];
                }
                if angular[axis] {
                    self.angular_velocity[axis] = 0.0;
                }
            }
        }

        center_of_mass += self.linear_velocity * dt;

        let spin = self.angular_velocity * dt;
        if spin != Vec3::ZERO {
            self.rotation = (Quat::from_scaled_axis(spin) * self.rotation).normalize();
        }

        self.position = center_of_mass - self.rotation * self.center_of_mass;
    }

    fn update_sleep(&mut self, dt: f32, threshold: f32, time_before_sleep: f32) {
        if !self.allow_sleeping || self.motion_type == MotionType::Static {
            self.sleep_timer = 0.0;
            return;
        }

        let resting = self.linear_velocity.length() < threshold && self.angular_velocity.length() < threshold;

        if !resting {
            self.sleep_timer = 0.0;
            return;
        }

        self.sleep_timer += dt;

        if self.sleep_timer >= time_before_sleep {
            self.deactivate();
        }
    }
}

struct Slot {
    generation: u32,
    body: Option<EngineBody>,
}

/// Generational storage of engine bodies.
///
/// The `*_body` methods taking a [`BodyId`] form the engine's body
/// interface: they silently ignore invalid handles.
#[derive(Default)]
pub struct EngineBodies {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EngineBodies {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a body and return its handle
    pub fn insert(&mut self, body: EngineBody) -> BodyId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyId::new(index, slot.generation);
        }

        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyId::new((self.slots.len() - 1) as u32, 0)
    }

    /// Remove a body, invalidating its handle
    pub fn remove(&mut self, id: BodyId) -> Option<EngineBody> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }

        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        Some(body)
    }

    /// Body behind a handle
    pub fn get(&self, id: BodyId) -> Option<&EngineBody> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.body.as_ref())
    }

    /// Mutable body behind a handle
    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut EngineBody> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.body.as_mut())
    }

    /// Whether the handle refers to a live body
    pub fn contains(&self, id: BodyId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live bodies
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.body.is_some()).count()
    }

    /// Whether there is no live body
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of active bodies
    pub fn active_count(&self) -> usize {
        self.iter().filter(|(_, body)| body.is_active()).count()
    }

    /// Live bodies with their handles
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &EngineBody)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.body
                .as_ref()
                .map(|body| (BodyId::new(index as u32, slot.generation), body))
        })
    }

    /// Mutable live bodies with their handles
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyId, &mut EngineBody)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.body
                .as_mut()
                .map(|body| (BodyId::new(index as u32, generation), body))
        })
    }

    /// Wake a body up
    pub fn activate_body(&mut self, id: BodyId) {
        if let Some(body) = self.get_mut(id) {
            body.activate();
        }
    }

    /// Put a body to sleep
    pub fn deactivate_body(&mut self, id: BodyId) {
        if let Some(body) = self.get_mut(id) {
            body.deactivate();
        }
    }

    /// Motion quality of a body, `None` for invalid handles
    pub fn motion_quality(&self, id: BodyId) -> Option<MotionQuality> {
        self.get(id).map(EngineBody::motion_quality)
    }

    /// Set motion quality of a body
    pub fn set_motion_quality(&mut self, id: BodyId, quality: MotionQuality) {
        if let Some(body) = self.get_mut(id) {
            body.set_motion_quality(quality);
        }
    }

    /// Advance every active body by `dt`
    pub(crate) fn integrate(
        &mut self,
        dt: f32,
        constraints: &[SixDofConstraint],
        sleep_threshold: f32,
        time_before_sleep: f32,
    ) {
        for (id, body) in self.iter_mut() {
            if body.is_active() && body.motion_type() != MotionType::Static {
                body.integrate(dt, constraints, id);
                body.update_sleep(dt, sleep_threshold, time_before_sleep);
            }

            body.reset_force();
            body.reset_torque();
        }
    }
}
