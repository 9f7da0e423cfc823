//! Rigid body reconciled against the engine's live body storage
//!
//! A [`Body`] is either pending (all properties buffered in
//! [`BodySettings`]) or attached to a [`Space`], in which case every
//! engine-mirrored property is read and written through the space's
//! guards. Derived state (mass, damping, axis locks, layers) is kept in
//! sync through [`ChangeEvent`]s.

mod derive;
mod forces;
mod params;
mod step;

pub use derive::aggregate_damp;
pub use params::{BodyParameter, BodyState, BodyValue};
pub use step::aggregate_gravity;

use crate::area::Area;
use crate::constraint::{AxisMask, OwnedConstraint};
use crate::contact::{Contact, ContactBuffer};
use crate::engine::{BodySettings, EngineBody, MotionType};
use crate::error::{BodyError, Result};
use crate::id::{AreaId, BodyId, ObjectId};
use crate::joint::Joint;
use crate::layers::{BroadPhaseLayer, CollisionGroups, GroupFilter};
use crate::override_mode::DampMode;
use crate::propagation::{ChangeEvent, Derivation};
use crate::shape::Shape;
use crate::space::Space;
use crate::transform::Transform;
use glam::Vec3;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Simulation mode of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyMode {
    /// Never moves
    Static,
    /// Moved by setting its transform
    Kinematic,
    /// Fully simulated
    #[default]
    Rigid,
    /// Simulated without rotation
    RigidLinear,
}

impl BodyMode {
    /// Engine motion type for this mode
    pub fn motion_type(self) -> MotionType {
        match self {
            BodyMode::Static => MotionType::Static,
            BodyMode::Kinematic => MotionType::Kinematic,
            BodyMode::Rigid | BodyMode::RigidLinear => MotionType::Dynamic,
        }
    }

    /// Broad-phase classification for this mode
    pub fn broad_phase_layer(self) -> BroadPhaseLayer {
        match self {
            BodyMode::Static => BroadPhaseLayer::Static,
            _ => BroadPhaseLayer::Dynamic,
        }
    }

    /// Whether forces and gravity apply
    pub fn is_rigid(self) -> bool {
        matches!(self, BodyMode::Rigid | BodyMode::RigidLinear)
    }
}

impl TryFrom<i32> for BodyMode {
    type Error = BodyError;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Static),
            1 => Ok(Self::Kinematic),
            2 => Ok(Self::Rigid),
            3 => Ok(Self::RigidLinear),
            other => Err(BodyError::UnknownMode(other)),
        }
    }
}

/// Where the body's engine-mirrored state lives
enum Instance {
    /// Not part of a space yet
    Pending(Box<BodySettings>),
    /// Live in a space
    Attached { space: Arc<Space>, id: BodyId },
}

/// A rigid, kinematic or static body
pub struct Body {
    rid: ObjectId,
    instance: Instance,
    shape: Option<Arc<dyn Shape>>,
    collision_groups: CollisionGroups,
    mode: BodyMode,

    mass: f32,
    inertia: Vec3,
    center_of_mass_custom: Option<Vec3>,

    linear_damp: f32,
    angular_damp: f32,
    linear_damp_mode: DampMode,
    angular_damp_mode: DampMode,
    total_linear_damp: f32,
    total_angular_damp: f32,

    gravity: Vec3,
    constant_force: Vec3,
    constant_torque: Vec3,
    linear_surface_velocity: Vec3,
    angular_surface_velocity: Vec3,
    kinematic_transform: Transform,

    locked_axes: AxisMask,
    axes_constraint: Option<OwnedConstraint>,

    contacts: ContactBuffer,
    areas: Vec<Arc<Area>>,
    joints: Vec<Arc<dyn Joint>>,
    group_filter: Option<Arc<GroupFilter>>,

    custom_integrator: bool,
    sync_state: bool,
}

impl Body {
    /// Create a pending rigid body with default settings
    pub fn new() -> Self {
        Self::with_settings(BodySettings::default())
    }

    /// Create a pending body from explicit settings
    pub fn with_settings(settings: BodySettings) -> Self {
        let mode = match settings.motion_type {
            MotionType::Static => BodyMode::Static,
            MotionType::Kinematic => BodyMode::Kinematic,
            MotionType::Dynamic => BodyMode::Rigid,
        };
        let kinematic_transform = Transform::new(settings.rotation, settings.position);

        Self {
            rid: ObjectId::next(),
            instance: Instance::Pending(Box::new(settings)),
            shape: None,
            collision_groups: CollisionGroups::DEFAULT,
            mode,
            mass: 1.0,
            inertia: Vec3::ZERO,
            center_of_mass_custom: None,
            linear_damp: 0.0,
            angular_damp: 0.0,
            linear_damp_mode: DampMode::Combine,
            angular_damp_mode: DampMode::Combine,
            total_linear_damp: 0.0,
            total_angular_damp: 0.0,
            gravity: Vec3::ZERO,
            constant_force: Vec3::ZERO,
            constant_torque: Vec3::ZERO,
            linear_surface_velocity: Vec3::ZERO,
            angular_surface_velocity: Vec3::ZERO,
            kinematic_transform,
            locked_axes: AxisMask::NONE,
            axes_constraint: None,
            contacts: ContactBuffer::new(0),
            areas: Vec::new(),
            joints: Vec::new(),
            group_filter: None,
            custom_integrator: false,
            sync_state: false,
        }
    }

    /// Stable identity of the body
    pub fn rid(&self) -> ObjectId {
        self.rid
    }

    // ==================== Space Membership ====================

    /// Owning space, if attached
    pub fn space(&self) -> Option<&Arc<Space>> {
        match &self.instance {
            Instance::Pending(_) => None,
            Instance::Attached { space, .. } => Some(space),
        }
    }

    /// Handle of the engine body, if attached
    pub fn engine_id(&self) -> Option<BodyId> {
        match &self.instance {
            Instance::Pending(_) => None,
            Instance::Attached { id, .. } => Some(*id),
        }
    }

    /// Whether the body is attached to `space`
    pub fn is_in(&self, space: &Space) -> bool {
        self.space().is_some_and(|own| std::ptr::eq(Arc::as_ptr(own), space))
    }

    /// Move the body into `space`, or out of any space with `None`
    pub fn set_space(&mut self, space: Option<Arc<Space>>) {
        if let (Some(current), Some(new)) = (self.space(), space.as_ref()) {
            if Arc::ptr_eq(current, new) {
                return;
            }
        }

        self.detach();

        if let Some(space) = space {
            self.attach(space);
        }
    }

    fn attach(&mut self, space: Arc<Space>) {
        let Instance::Pending(settings) = &self.instance else {
            return;
        };

        let settings = BodySettings {
            max_linear_velocity: space.config().max_linear_velocity,
            max_angular_velocity: space.config().max_angular_velocity,
            ..(**settings).clone()
        };

        let layer = space.map_to_object_layer(self.mode.broad_phase_layer(), self.collision_groups);
        let id = space.create_body(EngineBody::new(self.rid, &settings, layer));

        log::debug!("Body {} joined space as {:?}", self.rid, id);

        self.instance = Instance::Attached { space, id };
        self.propagate(ChangeEvent::SpaceChanged);
    }

    fn detach(&mut self) {
        let Some((space, id)) = self.attachment() else {
            return;
        };

        self.propagate(ChangeEvent::SpaceChanging);

        let settings = match space.destroy_body(id) {
            Some(engine) => engine.creation_settings(),
            None => {
                log::error!("Engine body {:?} of body {} vanished before detaching", id, self.rid);
                BodySettings {
                    motion_type: self.mode.motion_type(),
                    ..Default::default()
                }
            }
        };

        log::debug!("Body {} left space", self.rid);

        self.instance = Instance::Pending(Box::new(settings));
        self.contacts.reset();
        self.sync_state = false;
    }

    fn attachment(&self) -> Option<(Arc<Space>, BodyId)> {
        match &self.instance {
            Instance::Pending(_) => None,
            Instance::Attached { space, id } => Some((space.clone(), *id)),
        }
    }

    fn not_in_space(&self, operation: &'static str) -> BodyError {
        BodyError::NotInSpace {
            body: self.rid.0,
            operation,
        }
    }

    /// Shared guard to the engine body
    fn read_engine(&self, operation: &'static str) -> Result<MappedRwLockReadGuard<'_, EngineBody>> {
        match &self.instance {
            Instance::Pending(_) => Err(self.not_in_space(operation)),
            Instance::Attached { space, id } => space.read_body(*id).ok_or(BodyError::InvalidHandle(*id)),
        }
    }

    /// Exclusive guard to the engine body
    fn write_engine(&self, operation: &'static str) -> Result<MappedRwLockWriteGuard<'_, EngineBody>> {
        match &self.instance {
            Instance::Pending(_) => Err(self.not_in_space(operation)),
            Instance::Attached { space, id } => space.write_body(*id).ok_or(BodyError::InvalidHandle(*id)),
        }
    }

    /// Read from the pending settings or the live engine body
    fn read<R>(&self, pending: impl FnOnce(&BodySettings) -> R, live: impl FnOnce(&EngineBody) -> R) -> Result<R> {
        match &self.instance {
            Instance::Pending(settings) => Ok(pending(settings)),
            Instance::Attached { space, id } => {
                let body = space.read_body(*id).ok_or(BodyError::InvalidHandle(*id))?;
                Ok(live(&body))
            }
        }
    }

    /// Write to the pending settings or the live engine body
    fn write<R>(
        &mut self,
        pending: impl FnOnce(&mut BodySettings) -> R,
        live: impl FnOnce(&mut EngineBody) -> R,
    ) -> Result<R> {
        match &mut self.instance {
            Instance::Pending(settings) => Ok(pending(settings)),
            Instance::Attached { space, id } => {
                let mut body = space.write_body(*id).ok_or(BodyError::InvalidHandle(*id))?;
                Ok(live(&mut body))
            }
        }
    }

    // ==================== Mode ====================

    /// Simulation mode
    pub fn mode(&self) -> BodyMode {
        self.mode
    }

    /// Whether the body is static
    pub fn is_static(&self) -> bool {
        self.mode == BodyMode::Static
    }

    /// Whether the body is kinematic
    pub fn is_kinematic(&self) -> bool {
        self.mode == BodyMode::Kinematic
    }

    /// Whether the body is rigid (including translation-only)
    pub fn is_rigid(&self) -> bool {
        self.mode.is_rigid()
    }

    /// Whether the body is rigid without rotation
    pub fn is_rigid_linear(&self) -> bool {
        self.mode == BodyMode::RigidLinear
    }

    /// Switch simulation mode
    pub fn set_mode(&mut self, mode: BodyMode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }

        let motion_type = mode.motion_type();

        match self.attachment() {
            None => {
                if let Instance::Pending(settings) = &mut self.instance {
                    settings.motion_type = motion_type;
                }
                self.mode = mode;
                self.clear_surface_velocity();
                self.propagate(ChangeEvent::ModeChanged);
            }
            Some((space, id)) => {
                let mut bodies = space.write_bodies();
                let engine = bodies.get_mut(id).ok_or(BodyError::InvalidHandle(id))?;

                if motion_type == MotionType::Static {
                    engine.deactivate();
                }

                engine.set_motion_type(motion_type);

                if motion_type != MotionType::Static {
                    engine.activate();
                }

                if motion_type == MotionType::Kinematic {
                    engine.set_linear_velocity(Vec3::ZERO);
                    engine.set_angular_velocity(Vec3::ZERO);
                }

                self.mode = mode;
                self.clear_surface_velocity();
                self.propagate_with(ChangeEvent::ModeChanged, &mut bodies);
            }
        }

        Ok(())
    }

    /// Switch simulation mode from a raw value
    pub fn set_mode_raw(&mut self, mode: i32) -> Result<()> {
        let mode = BodyMode::try_from(mode).inspect_err(|err| log::error!("{err}"))?;
        self.set_mode(mode)
    }

    fn clear_surface_velocity(&mut self) {
        self.linear_surface_velocity = Vec3::ZERO;
        self.angular_surface_velocity = Vec3::ZERO;
    }

    // ==================== Shape ====================

    /// Current shape
    pub fn shape(&self) -> Option<&Arc<dyn Shape>> {
        self.shape.as_ref()
    }

    /// Replace the shape
    pub fn set_shape(&mut self, shape: Arc<dyn Shape>) {
        self.shape = Some(shape);
        self.propagate(ChangeEvent::ShapesBuilt);
    }

    /// Remove the shape
    pub fn clear_shape(&mut self) {
        if self.shape.take().is_some() {
            self.propagate(ChangeEvent::ShapesBuilt);
        }
    }

    // ==================== Collision Filtering ====================

    /// Collision layer bits
    pub fn collision_layer(&self) -> u32 {
        self.collision_groups.memberships
    }

    /// Set collision layer bits
    pub fn set_collision_layer(&mut self, layer: u32) {
        if self.collision_groups.memberships != layer {
            self.collision_groups.memberships = layer;
            self.run(&[Derivation::UpdateObjectLayer]);
        }
    }

    /// Collision mask bits
    pub fn collision_mask(&self) -> u32 {
        self.collision_groups.filter
    }

    /// Set collision mask bits
    pub fn set_collision_mask(&mut self, mask: u32) {
        if self.collision_groups.filter != mask {
            self.collision_groups.filter = mask;
            self.run(&[Derivation::UpdateObjectLayer]);
        }
    }

    /// Exclude collisions with another body
    pub fn add_collision_exception(&mut self, body: ObjectId) {
        let filter = self.group_filter.get_or_insert_with(Default::default);
        Arc::make_mut(filter).add_exception(body);
        self.propagate(ChangeEvent::ExceptionsChanged);
    }

    /// Allow collisions with another body again
    pub fn remove_collision_exception(&mut self, body: ObjectId) {
        let Some(filter) = self.group_filter.as_mut() else {
            return;
        };

        Arc::make_mut(filter).remove_exception(body);

        if filter.exception_count() == 0 {
            self.group_filter = None;
        }

        self.propagate(ChangeEvent::ExceptionsChanged);
    }

    /// Whether collisions with another body are excluded
    pub fn has_collision_exception(&self, body: ObjectId) -> bool {
        self.group_filter.as_ref().is_some_and(|filter| filter.has_exception(body))
    }

    /// Every excluded body
    pub fn collision_exceptions(&self) -> &[ObjectId] {
        self.group_filter.as_ref().map_or(&[], |filter| filter.exceptions())
    }

    // ==================== Areas & Joints ====================

    /// An area started overlapping the body
    pub fn add_area(&mut self, area: Arc<Area>) {
        let index = self.areas.partition_point(|existing| existing.priority >= area.priority);
        self.areas.insert(index, area);
        self.propagate(ChangeEvent::AreasChanged);
    }

    /// An area stopped overlapping the body
    pub fn remove_area(&mut self, area: AreaId) {
        self.areas.retain(|existing| existing.id != area);
        self.propagate(ChangeEvent::AreasChanged);
    }

    /// Overlapping areas, highest priority first
    pub fn areas(&self) -> &[Arc<Area>] {
        &self.areas
    }

    /// Attach a joint
    pub fn add_joint(&mut self, joint: Arc<dyn Joint>) {
        self.joints.push(joint);
        self.propagate(ChangeEvent::JointsChanged);
    }

    /// Detach a joint
    pub fn remove_joint(&mut self, joint: &Arc<dyn Joint>) {
        self.joints.retain(|existing| !Arc::ptr_eq(existing, joint));
        self.propagate(ChangeEvent::JointsChanged);
    }

    /// Attached joints
    pub fn joints(&self) -> &[Arc<dyn Joint>] {
        &self.joints
    }

    // ==================== Axis Locks ====================

    /// Lock or unlock degrees of freedom
    pub fn set_axis_lock(&mut self, axes: AxisMask, locked: bool) {
        let previous = self.locked_axes;
        self.locked_axes.set(axes, locked);

        if self.locked_axes != previous {
            self.propagate(ChangeEvent::AxisLockChanged);
        }
    }

    /// Lock or unlock degrees of freedom from raw axis bits
    pub fn set_axis_lock_raw(&mut self, axes: u32, locked: bool) -> Result<()> {
        let axes = AxisMask::from_bits(axes).inspect_err(|err| log::error!("{err}"))?;
        self.set_axis_lock(axes, locked);
        Ok(())
    }

    /// Whether every axis in `axes` is locked
    pub fn is_axis_locked(&self, axes: AxisMask) -> bool {
        self.locked_axes.contains(axes)
    }

    /// Locked degrees of freedom
    pub fn locked_axes(&self) -> AxisMask {
        self.locked_axes
    }

    /// Whether an axis-lock constraint is registered
    pub fn has_axes_constraint(&self) -> bool {
        self.axes_constraint.is_some()
    }

    // ==================== Contacts ====================

    /// Maximum number of contacts recorded per step
    pub fn max_contacts_reported(&self) -> usize {
        self.contacts.max_contacts()
    }

    /// Set the maximum number of contacts recorded per step
    pub fn set_max_contacts_reported(&mut self, max_contacts: usize) {
        self.contacts.set_max_contacts(max_contacts);
    }

    /// Record a contact found during the current step
    pub fn add_contact(&mut self, contact: Contact) -> bool {
        self.contacts.add(contact)
    }

    /// Number of contacts recorded this step
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Contacts recorded this step
    pub fn contacts(&self) -> &[Contact] {
        self.contacts.contacts()
    }

    /// Whether this body reports contacts at all
    pub fn generates_contacts(&self) -> bool {
        self.contacts.max_contacts() > 0
    }

    // ==================== Integration ====================

    /// Whether the owner integrates motion instead of the engine
    pub fn has_custom_integrator(&self) -> bool {
        self.custom_integrator
    }

    /// Take over motion integration from the engine
    pub fn set_custom_integrator(&mut self, enabled: bool) -> Result<()> {
        if self.custom_integrator == enabled {
            return Ok(());
        }

        self.custom_integrator = enabled;

        if let Some((space, id)) = self.attachment() {
            let mut bodies = space.write_bodies();
            let engine = bodies.get_mut(id).ok_or(BodyError::InvalidHandle(id))?;
            engine.reset_force();
            engine.reset_torque();

            self.run_with(&[Derivation::UpdateDamp], &mut bodies);
            self.propagate_with(ChangeEvent::MotionChanged, &mut bodies);
        } else {
            self.propagate(ChangeEvent::MotionChanged);
        }

        Ok(())
    }

    /// Gravity that acted on the body during the last step
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Whether the state-sync flag is raised
    pub fn needs_state_sync(&self) -> bool {
        self.sync_state
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Body {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("rid", &self.rid)
            .field("mode", &self.mode)
            .field("engine_id", &self.engine_id())
            .field("locked_axes", &self.locked_axes)
            .finish()
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body {}", self.rid)
    }
}
