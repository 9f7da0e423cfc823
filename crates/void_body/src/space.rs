//! Simulation space - owner of the engine body storage
//!
//! Bodies reach their live engine object exclusively through the guards
//! handed out here. Lock order is body storage first, constraint registry
//! second.

use crate::area::Area;
use crate::body::Body;
use crate::config::SpaceConfig;
use crate::constraint::SixDofConstraint;
use crate::engine::{EngineBodies, EngineBody};
use crate::events::{BodyStateUpdate, StateSyncHandler};
use crate::id::{AreaId, BodyId, ConstraintId};
use crate::layers::{BroadPhaseLayer, CollisionGroups, LayerMapper, ObjectLayer};
use crate::override_mode::OverrideMode;
use crossbeam_channel::{Receiver, Sender};
use glam::Vec3;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::sync::Arc;

#[derive(Default)]
struct ConstraintRegistry {
    next_id: u32,
    constraints: Vec<(ConstraintId, SixDofConstraint)>,
}

/// A simulation space
pub struct Space {
    /// Configuration
    config: SpaceConfig,

    /// Live engine bodies
    bodies: RwLock<EngineBodies>,

    /// Auxiliary constraints registered by bodies
    constraints: Mutex<ConstraintRegistry>,

    /// Broad-phase layer and collision group lookup
    layers: Mutex<LayerMapper>,

    /// Fallback area for gravity and damping
    default_area: Arc<Area>,

    /// State-sync notifications
    state_tx: Sender<BodyStateUpdate>,
    state_rx: Receiver<BodyStateUpdate>,
}

impl Space {
    /// Create a new space
    pub fn new(config: SpaceConfig) -> Arc<Self> {
        let default_area = Area::new(AreaId(0))
            .with_gravity(OverrideMode::Combine, Vec3::from(config.gravity))
            .with_linear_damp(OverrideMode::Combine, config.default_linear_damp)
            .with_angular_damp(OverrideMode::Combine, config.default_angular_damp);

        let (state_tx, state_rx) = crossbeam_channel::unbounded();

        Arc::new(Self {
            config,
            bodies: RwLock::new(EngineBodies::new()),
            constraints: Mutex::new(ConstraintRegistry::default()),
            layers: Mutex::new(LayerMapper::new()),
            default_area: Arc::new(default_area),
            state_tx,
            state_rx,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// Area whose values apply when no other area terminates the walk
    pub fn default_area(&self) -> &Arc<Area> {
        &self.default_area
    }

    // ==================== Body Storage ====================

    /// Store a new engine body
    pub fn create_body(&self, body: EngineBody) -> BodyId {
        self.bodies.write().insert(body)
    }

    /// Destroy an engine body
    pub fn destroy_body(&self, id: BodyId) -> Option<EngineBody> {
        self.bodies.write().remove(id)
    }

    /// Shared access to one body, `None` when the handle is invalid
    pub fn read_body(&self, id: BodyId) -> Option<MappedRwLockReadGuard<'_, EngineBody>> {
        RwLockReadGuard::try_map(self.bodies.read(), |bodies| bodies.get(id)).ok()
    }

    /// Exclusive access to one body, `None` when the handle is invalid
    pub fn write_body(&self, id: BodyId) -> Option<MappedRwLockWriteGuard<'_, EngineBody>> {
        RwLockWriteGuard::try_map(self.bodies.write(), |bodies| bodies.get_mut(id)).ok()
    }

    /// Shared access to the whole storage, for several reads in a row
    pub fn read_bodies(&self) -> RwLockReadGuard<'_, EngineBodies> {
        self.bodies.read()
    }

    /// Exclusive access to the whole storage.
    ///
    /// This is the body interface: hold it across a chain of engine writes
    /// instead of locking once per write.
    pub fn write_bodies(&self) -> RwLockWriteGuard<'_, EngineBodies> {
        self.bodies.write()
    }

    /// Number of live engine bodies
    pub fn body_count(&self) -> usize {
        self.bodies.read().len()
    }

    /// Object layer for a broad-phase layer and collision groups pair
    pub fn map_to_object_layer(&self, broad_phase: BroadPhaseLayer, groups: CollisionGroups) -> ObjectLayer {
        self.layers.lock().to_object_layer(broad_phase, groups)
    }

    /// Whether objects on the two layers may collide
    pub fn layers_collide(&self, a: ObjectLayer, b: ObjectLayer) -> bool {
        self.layers.lock().can_collide(a, b)
    }

    // ==================== Constraints ====================

    /// Register an auxiliary constraint
    pub fn add_joint(&self, constraint: SixDofConstraint) -> ConstraintId {
        let mut registry = self.constraints.lock();
        let id = ConstraintId(registry.next_id);
        registry.next_id = registry.next_id.wrapping_add(1);
        registry.constraints.push((id, constraint));
        id
    }

    /// Unregister an auxiliary constraint. Returns whether it was registered.
    pub fn remove_joint(&self, id: ConstraintId) -> bool {
        let mut registry = self.constraints.lock();
        let before = registry.constraints.len();
        registry.constraints.retain(|(existing, _)| *existing != id);
        registry.constraints.len() != before
    }

    /// Registered constraint behind a handle
    pub fn joint(&self, id: ConstraintId) -> Option<SixDofConstraint> {
        self.constraints
            .lock()
            .constraints
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, constraint)| *constraint)
    }

    /// Constraints acting on `body`
    pub fn joints_of(&self, body: BodyId) -> Vec<SixDofConstraint> {
        self.constraints
            .lock()
            .constraints
            .iter()
            .filter(|(_, constraint)| constraint.body == body)
            .map(|(_, constraint)| *constraint)
            .collect()
    }

    /// Number of registered constraints
    pub fn joint_count(&self) -> usize {
        self.constraints.lock().constraints.len()
    }

    // ==================== Stepping ====================

    /// Step the simulation by the configured fixed timestep
    pub fn tick<'a>(&self, bodies: impl IntoIterator<Item = &'a mut Body>) {
        self.step(self.config.timestep, bodies);
    }

    /// Step the simulation: pre-step hooks, solve, post-step hooks.
    ///
    /// Contacts are dropped by every pre-step hook; use
    /// [`Space::step_with_contacts`] to record the contacts of this step.
    pub fn step<'a>(&self, dt: f32, bodies: impl IntoIterator<Item = &'a mut Body>) {
        self.step_with_contacts(dt, bodies, |_| {});
    }

    /// Step the simulation, calling `report_contacts` for every body after
    /// the solve and before its post-step hook.
    ///
    /// Contacts added there are part of this step's state update and stay
    /// readable until the next step starts.
    pub fn step_with_contacts<'a>(
        &self,
        dt: f32,
        bodies: impl IntoIterator<Item = &'a mut Body>,
        mut report_contacts: impl FnMut(&mut Body),
    ) {
        let mut bodies: Vec<&mut Body> = bodies.into_iter().filter(|body| body.is_in(self)).collect();

        for body in bodies.iter_mut() {
            body.pre_step(dt);
        }

        self.solve(dt);

        for body in bodies.iter_mut() {
            report_contacts(&mut **body);
            body.post_step();
        }
    }

    /// Integrate every active engine body
    pub fn solve(&self, dt: f32) {
        let mut bodies = self.bodies.write();
        let registry = self.constraints.lock();
        let constraints: Vec<SixDofConstraint> = registry.constraints.iter().map(|(_, c)| *c).collect();

        bodies.integrate(
            dt,
            &constraints,
            self.config.sleep_velocity_threshold,
            self.config.time_before_sleep,
        );
    }

    // ==================== State Sync ====================

    pub(crate) fn publish_state(&self, update: BodyStateUpdate) {
        if let Err(err) = self.state_tx.send(update) {
            log::error!("Failed to publish state of body {}", err.0.body);
        }
    }

    /// Receiver for state-sync notifications
    pub fn state_updates(&self) -> Receiver<BodyStateUpdate> {
        self.state_rx.clone()
    }

    /// Take every pending state-sync notification
    pub fn drain_state_updates(&self) -> Vec<BodyStateUpdate> {
        self.state_rx.try_iter().collect()
    }

    /// Hand every pending state-sync notification to `handler`
    pub fn dispatch_state_updates(&self, handler: &mut dyn StateSyncHandler) -> usize {
        let mut count = 0;
        for update in self.state_rx.try_iter() {
            handler.on_state_sync(&update);
            count += 1;
        }
        count
    }
}

impl std::fmt::Debug for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Space")
            .field("config", &self.config)
            .field("bodies", &self.body_count())
            .field("joints", &self.joint_count())
            .finish()
    }
}
