//! Void Body - Rigid Body State Reconciliation
//!
//! This crate keeps the authoritative state of rigid bodies in sync with the
//! engine's live body storage for the Void Engine.
//!
//! # Features
//!
//! - Static, kinematic, rigid and translation-only rigid bodies
//! - Pending settings before a body joins a space, guarded engine access after
//! - Gravity and damping overrides from prioritized areas
//! - Mass and inertia overrides on top of shape mass properties
//! - Axis locks enforced by a six degree-of-freedom constraint
//! - Bounded per-step contact recording
//! - State-sync notifications and state save/restore
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                     Space                        │
//! │  ┌──────────────┐ ┌────────────┐ ┌────────────┐ │
//! │  │ EngineBodies │ │ Constraints│ │ LayerMapper│ │
//! │  │   (RwLock)   │ │  (Mutex)   │ │  (Mutex)   │ │
//! │  └──────────────┘ └────────────┘ └────────────┘ │
//! │  ┌─────────────────────────────────────────────┐│
//! │  │   step: pre_step → solve → post_step        ││
//! │  └─────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────┘
//!                        ▲
//!          read_body / write_body guards
//!                        │
//! ┌─────────────────────────────────────────────────┐
//! │                      Body                        │
//! │   Pending(BodySettings) | Attached(BodyId)       │
//! │                        │                         │
//! │      ChangeEvent ──► [Derivation, ...]           │
//! └─────────────────────────────────────────────────┘
//!         ▲              ▲              ▲
//!    ┌─────────┐   ┌──────────┐   ┌──────────┐
//!    │  Area   │   │  Shape   │   │  Joint   │
//!    └─────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_body::prelude::*;
//!
//! // Create a space
//! let space = Space::new(SpaceConfig::default());
//!
//! // Add a rigid body
//! let mut body = Body::new();
//! body.set_shape(Arc::new(PrecomputedShape::new(2.0, Vec3::ONE)));
//! body.set_transform(Transform::from_translation(Vec3::new(0.0, 10.0, 0.0)))?;
//! body.set_space(Some(space.clone()));
//!
//! // Step simulation
//! space.step(1.0 / 60.0, [&mut body]);
//!
//! for update in space.drain_state_updates() {
//!     println!("{} is at {:?}", update.body, update.transform.origin);
//! }
//! ```

pub mod area;
pub mod body;
pub mod config;
pub mod constraint;
pub mod contact;
pub mod engine;
pub mod error;
pub mod events;
pub mod id;
pub mod joint;
pub mod layers;
pub mod mass;
pub mod override_mode;
pub mod propagation;
pub mod recorder;
pub mod shape;
pub mod space;
pub mod transform;

pub mod prelude {
    //! Common imports for body functionality
    pub use crate::area::{Area, PointGravity};
    pub use crate::body::{Body, BodyMode, BodyParameter, BodyState, BodyValue};
    pub use crate::config::SpaceConfig;
    pub use crate::constraint::AxisMask;
    pub use crate::contact::Contact;
    pub use crate::engine::{BodySettings, MotionQuality, MotionType};
    pub use crate::error::{BodyError, Result};
    pub use crate::events::{BodyStateUpdate, StateSyncHandler};
    pub use crate::id::{AreaId, BodyId, ObjectId};
    pub use crate::joint::Joint;
    pub use crate::layers::CollisionGroups;
    pub use crate::mass::MassProperties;
    pub use crate::override_mode::{DampMode, OverrideMode};
    pub use crate::propagation::ChangeEvent;
    pub use crate::recorder::StateRecorder;
    pub use crate::shape::{PrecomputedShape, Shape};
    pub use crate::space::Space;
    pub use crate::transform::Transform;
    pub use glam::{Quat, Vec3};
    pub use std::sync::Arc;
}

pub use prelude::*;
