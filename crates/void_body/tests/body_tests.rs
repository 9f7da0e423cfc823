//! Integration tests for void_body
//!
//! Bodies are driven through a real space step loop.

use approx::assert_relative_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use void_body::engine::{EngineBodies, MotionType};
use void_body::prelude::*;

fn zero_damp_space() -> Arc<Space> {
    Space::new(SpaceConfig::default().with_default_damp(0.0, 0.0))
}

fn attached(space: &Arc<Space>) -> Body {
    let mut body = Body::new();
    body.set_space(Some(space.clone()));
    body
}

#[derive(Default)]
struct CountingJoint {
    rebuilds: AtomicUsize,
    destroys: AtomicUsize,
}

impl Joint for CountingJoint {
    fn rebuild(&self, _space: &Arc<Space>, _bodies: &mut EngineBodies) {
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

// ==================== Modes ====================

#[test]
fn test_rigid_to_static_sleeps_immediately() {
    let space = zero_damp_space();
    let mut body = attached(&space);

    body.set_linear_velocity(Vec3::new(3.0, 0.0, 0.0)).unwrap();
    space.step(1.0 / 60.0, [&mut body]);
    assert_eq!(body.is_sleeping(), Ok(false));

    body.set_mode(BodyMode::Static).unwrap();

    assert_eq!(body.is_sleeping(), Ok(true));
    let id = body.engine_id().unwrap();
    let engine = space.read_body(id).unwrap();
    assert_eq!(engine.motion_type(), MotionType::Static);
    assert_eq!(engine.linear_velocity(), Vec3::ZERO);
}

#[test]
fn test_static_to_rigid_wakes() {
    let space = zero_damp_space();
    let mut body = Body::new();
    body.set_mode(BodyMode::Static).unwrap();
    body.set_space(Some(space.clone()));
    assert_eq!(body.is_sleeping(), Ok(true));

    body.set_mode(BodyMode::Rigid).unwrap();
    assert_eq!(body.is_sleeping(), Ok(false));
}

#[test]
fn test_kinematic_mode_zeroes_velocity() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_linear_velocity(Vec3::Y).unwrap();

    body.set_mode(BodyMode::Kinematic).unwrap();

    let engine = space.read_body(body.engine_id().unwrap()).unwrap();
    assert_eq!(engine.linear_velocity(), Vec3::ZERO);
    assert_eq!(engine.motion_type(), MotionType::Kinematic);
}

#[test]
fn test_unknown_raw_mode_keeps_mode() {
    let mut body = Body::new();
    assert_eq!(body.set_mode_raw(11), Err(BodyError::UnknownMode(11)));
    assert_eq!(body.mode(), BodyMode::Rigid);
}

// ==================== Damping ====================

#[test]
fn test_replace_damp_ignores_areas() {
    let space = Space::new(SpaceConfig::default());
    let mut body = attached(&space);
    body.add_area(Arc::new(
        Area::new(AreaId(1)).with_linear_damp(OverrideMode::Replace, 0.3),
    ));

    body.set_linear_damp_mode(DampMode::Replace);
    body.set_linear_damp(0.5);

    assert_relative_eq!(body.total_linear_damp(), 0.5);
    let engine = space.read_body(body.engine_id().unwrap()).unwrap();
    assert_relative_eq!(engine.linear_damping(), 0.5);
}

#[test]
fn test_combine_damp_adds_area_total() {
    let space = Space::new(SpaceConfig::default());
    let mut body = attached(&space);
    body.add_area(Arc::new(
        Area::new(AreaId(1)).with_linear_damp(OverrideMode::Replace, 0.3),
    ));

    body.set_linear_damp(0.5);

    assert_relative_eq!(body.total_linear_damp(), 0.8);
}

#[test]
fn test_default_area_damp_applies() {
    let space = Space::new(SpaceConfig::default().with_default_damp(0.2, 0.4));
    let body = attached(&space);

    assert_relative_eq!(body.total_linear_damp(), 0.2);
    assert_relative_eq!(body.total_angular_damp(), 0.4);
}

#[test]
fn test_removing_area_recomputes_damp() {
    let space = Space::new(SpaceConfig::default());
    let mut body = attached(&space);
    body.add_area(Arc::new(
        Area::new(AreaId(7)).with_linear_damp(OverrideMode::Replace, 3.0),
    ));
    assert_relative_eq!(body.total_linear_damp(), 3.0);

    body.remove_area(AreaId(7));
    assert_relative_eq!(body.total_linear_damp(), 0.1);
}

#[test]
fn test_custom_integrator_zeroes_engine_damping() {
    let space = Space::new(SpaceConfig::default());
    let mut body = attached(&space);
    body.set_linear_damp(1.0);
    body.set_custom_integrator(true).unwrap();

    let id = body.engine_id().unwrap();
    assert_eq!(space.read_body(id).unwrap().linear_damping(), 0.0);
    assert_relative_eq!(body.total_linear_damp(), 1.1);

    body.set_custom_integrator(false).unwrap();
    assert_relative_eq!(space.read_body(id).unwrap().linear_damping(), 1.1);
}

// ==================== Mass ====================

#[test]
fn test_mass_override_scales_shape_inertia() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_shape(Arc::new(PrecomputedShape::new(2.0, Vec3::ONE)));
    body.set_mass(4.0);

    let properties = body.calculate_mass_properties();
    assert_relative_eq!(properties.mass, 4.0);
    assert_eq!(properties.inertia_diagonal(), Vec3::splat(2.0));

    assert_relative_eq!(body.inverse_mass().unwrap(), 0.25);
    assert_eq!(body.inverse_inertia().unwrap(), Vec3::splat(0.5));
}

#[test]
fn test_rigid_linear_has_zero_inverse_inertia() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_shape(Arc::new(PrecomputedShape::new(3.0, Vec3::new(1.0, 2.0, 3.0))));
    body.set_inertia(Vec3::new(5.0, 5.0, 5.0));

    body.set_mode(BodyMode::RigidLinear).unwrap();
    assert_eq!(body.inverse_inertia_tensor().unwrap(), glam::Mat3::ZERO);

    body.set_mass(10.0);
    assert_eq!(body.inverse_inertia().unwrap(), Vec3::ZERO);

    body.apply_torque_impulse(Vec3::Y).unwrap();
    assert_eq!(body.angular_velocity().unwrap(), Vec3::ZERO);

    body.set_mode(BodyMode::Rigid).unwrap();
    assert_relative_eq!(body.inverse_inertia().unwrap().x, 0.2, epsilon = 1e-6);
}

#[test]
fn test_center_of_mass_from_shape() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_shape(Arc::new(
        PrecomputedShape::new(1.0, Vec3::ONE).with_center_of_mass(Vec3::new(0.0, 0.5, 0.0)),
    ));

    assert_eq!(body.center_of_mass_position(), Ok(Vec3::new(0.0, 0.5, 0.0)));

    body.set_center_of_mass(Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(body.center_of_mass_position(), Ok(Vec3::X));

    body.reset_mass_properties();
    assert!(!body.has_custom_center_of_mass());
    assert_eq!(body.center_of_mass_position(), Ok(Vec3::new(0.0, 0.5, 0.0)));
}

// ==================== Axis Locks ====================

#[test]
fn test_axis_lock_on_rigid_fixes_both_axes() {
    let space = zero_damp_space();
    let mut body = attached(&space);

    body.set_axis_lock(AxisMask::LINEAR_X | AxisMask::ANGULAR_Y, true);

    let joints = space.joints_of(body.engine_id().unwrap());
    assert_eq!(joints.len(), 1);
    assert_eq!(joints[0].fixed_axes, AxisMask::LINEAR_X | AxisMask::ANGULAR_Y);
}

#[test]
fn test_axis_lock_on_rigid_linear_ignores_angular() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_mode(BodyMode::RigidLinear).unwrap();

    body.set_axis_lock(AxisMask::LINEAR_X | AxisMask::ANGULAR_Y, true);

    let joints = space.joints_of(body.engine_id().unwrap());
    assert_eq!(joints.len(), 1);
    assert_eq!(joints[0].fixed_axes, AxisMask::LINEAR_X);
}

#[test]
fn test_angular_only_lock_on_rigid_linear_has_no_constraint() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_mode(BodyMode::RigidLinear).unwrap();

    body.set_axis_lock(AxisMask::ANGULAR, true);

    assert!(!body.has_axes_constraint());
    assert_eq!(space.joint_count(), 0);

    body.set_mode(BodyMode::Rigid).unwrap();
    assert!(body.has_axes_constraint());
    assert_eq!(space.joint_count(), 1);
}

#[test]
fn test_locked_axis_does_not_move() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_axis_lock(AxisMask::LINEAR_Y, true);
    body.set_linear_velocity(Vec3::new(1.0, 0.0, 0.0)).unwrap();

    for _ in 0..10 {
        space.step(0.1, [&mut body]);
    }

    let origin = body.transform().unwrap().origin;
    assert_relative_eq!(origin.y, 0.0);
    assert_relative_eq!(origin.x, 1.0, epsilon = 1e-4);
}

#[test]
fn test_pending_axis_lock_builds_on_attach() {
    let space = zero_damp_space();
    let mut body = Body::new();
    body.set_axis_lock(AxisMask::LINEAR_Z, true);
    assert!(!body.has_axes_constraint());

    body.set_space(Some(space.clone()));
    assert!(body.has_axes_constraint());
    assert_eq!(space.joint_count(), 1);
}

// ==================== Space Membership ====================

#[test]
fn test_detach_snapshots_live_state() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_friction(0.25).unwrap();
    body.set_gravity_scale(0.5).unwrap();
    body.set_transform(Transform::from_translation(Vec3::new(4.0, 5.0, 6.0))).unwrap();
    body.set_axis_lock(AxisMask::LINEAR_X, true);

    body.set_space(None);

    assert_eq!(space.body_count(), 0);
    assert_eq!(space.joint_count(), 0);
    assert!(!body.has_axes_constraint());
    assert_eq!(body.friction(), Ok(0.25));
    assert_eq!(body.gravity_scale(), Ok(0.5));
    assert_eq!(body.transform().unwrap().origin, Vec3::new(4.0, 5.0, 6.0));

    body.set_space(Some(space.clone()));
    assert_eq!(body.friction(), Ok(0.25));
    assert_eq!(body.transform().unwrap().origin, Vec3::new(4.0, 5.0, 6.0));
    assert_eq!(space.joint_count(), 1);
}

#[test]
fn test_moving_between_spaces() {
    let first = zero_damp_space();
    let second = zero_damp_space();
    let mut body = attached(&first);
    body.set_axis_lock(AxisMask::LINEAR_Y, true);

    body.set_space(Some(second.clone()));

    assert!(body.is_in(&second));
    assert_eq!(first.body_count(), 0);
    assert_eq!(first.joint_count(), 0);
    assert_eq!(second.body_count(), 1);
    assert_eq!(second.joint_count(), 1);
}

#[test]
fn test_joints_follow_space_membership() {
    let space = zero_damp_space();
    let joint = Arc::new(CountingJoint::default());
    let mut body = Body::new();
    body.add_joint(joint.clone());

    body.set_space(Some(space.clone()));
    assert_eq!(joint.rebuilds.load(Ordering::SeqCst), 1);

    body.set_space(None);
    assert_eq!(joint.destroys.load(Ordering::SeqCst), 1);

    let handle: Arc<dyn Joint> = joint.clone();
    body.remove_joint(&handle);
    assert!(body.joints().is_empty());
}

#[test]
fn test_pending_body_ignores_step() {
    let space = zero_damp_space();
    let mut pending = Body::new();
    let mut live = attached(&space);

    space.step(0.1, [&mut pending, &mut live]);

    assert_eq!(pending.transform().unwrap().origin, Vec3::ZERO);
    assert!(live.transform().unwrap().origin.y < 0.0);
}

// ==================== Gravity & Forces ====================

#[test]
fn test_gravity_integration() {
    let space = zero_damp_space();
    let mut body = attached(&space);

    space.step(0.1, [&mut body]);

    let velocity = body.linear_velocity().unwrap();
    assert_relative_eq!(velocity.y, -0.981, epsilon = 1e-5);
    assert_relative_eq!(body.transform().unwrap().origin.y, -0.0981, epsilon = 1e-5);
    assert_relative_eq!(body.gravity().y, -9.81, epsilon = 1e-5);
}

#[test]
fn test_gravity_scale() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_gravity_scale(2.0).unwrap();

    space.step(0.1, [&mut body]);
    assert_relative_eq!(body.linear_velocity().unwrap().y, -1.962, epsilon = 1e-5);
}

#[test]
fn test_area_gravity_replaces_default() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.add_area(Arc::new(
        Area::new(AreaId(1)).with_gravity(OverrideMode::Replace, Vec3::new(2.0, 0.0, 0.0)),
    ));

    space.step(0.5, [&mut body]);
    assert_eq!(body.linear_velocity().unwrap(), Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn test_custom_integrator_skips_gravity() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_custom_integrator(true).unwrap();
    body.set_constant_force(Vec3::X);

    space.step(0.1, [&mut body]);

    assert_eq!(body.linear_velocity().unwrap(), Vec3::ZERO);
    assert_relative_eq!(body.gravity().y, -9.81, epsilon = 1e-5);
    assert_eq!(space.drain_state_updates().len(), 1);
}

#[test]
fn test_constant_force_persists() {
    let space = Space::new(SpaceConfig::zero_g());
    let mut body = attached(&space);
    body.add_constant_central_force(Vec3::new(1.0, 0.0, 0.0));

    space.step(1.0, [&mut body]);
    space.step(1.0, [&mut body]);

    assert_relative_eq!(body.linear_velocity().unwrap().x, 2.0);
    assert_eq!(body.constant_force(), Vec3::X);
}

#[test]
fn test_sleeping_body_skips_forces() {
    let space = Space::new(SpaceConfig::zero_g());
    let mut body = attached(&space);
    body.set_sleeping(true).unwrap();
    body.add_constant_central_force(Vec3::X);
    // the standing force woke it up
    assert_eq!(body.is_sleeping(), Ok(false));

    body.set_sleeping(true).unwrap();
    space.step(1.0, [&mut body]);
    assert_eq!(body.linear_velocity().unwrap(), Vec3::ZERO);
    assert!(space.drain_state_updates().is_empty());
}

#[test]
fn test_resting_body_falls_asleep() {
    let space = Space::new(SpaceConfig::zero_g().with_time_before_sleep(0.2));
    let mut body = attached(&space);

    for _ in 0..3 {
        space.step(0.1, [&mut body]);
    }

    assert_eq!(body.is_sleeping(), Ok(true));
}

#[test]
fn test_impulse_wakes_and_moves() {
    let space = Space::new(SpaceConfig::zero_g());
    let mut body = attached(&space);
    body.set_sleeping(true).unwrap();

    body.apply_central_impulse(Vec3::new(0.0, 0.0, 2.0)).unwrap();

    assert_eq!(body.is_sleeping(), Ok(false));
    assert_relative_eq!(body.linear_velocity().unwrap().z, 2.0);
}

// ==================== Kinematic ====================

#[test]
fn test_kinematic_moves_to_target() {
    let space = zero_damp_space();
    let mut body = Body::new();
    body.set_mode(BodyMode::Kinematic).unwrap();
    body.set_space(Some(space.clone()));

    body.set_transform(Transform::from_translation(Vec3::new(0.0, 2.0, 0.0))).unwrap();
    assert_eq!(body.transform().unwrap().origin, Vec3::ZERO);

    space.step(0.5, [&mut body]);

    assert_relative_eq!(body.transform().unwrap().origin.y, 2.0);
    let updates = space.drain_state_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].body, body.rid());
}

#[test]
fn test_kinematic_without_motion_syncs_only_when_reporting_contacts() {
    let space = zero_damp_space();
    let mut body = Body::new();
    body.set_mode(BodyMode::Kinematic).unwrap();
    body.set_space(Some(space.clone()));

    space.step(0.1, [&mut body]);
    assert!(space.drain_state_updates().is_empty());

    body.set_max_contacts_reported(4);
    space.step(0.1, [&mut body]);
    assert_eq!(space.drain_state_updates().len(), 1);
}

// ==================== Contacts ====================

#[test]
fn test_zero_max_contacts_discards() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    assert!(!body.add_contact(Contact::new(ObjectId(1), 0.5)));
    assert_eq!(body.contact_count(), 0);
}

#[test]
fn test_contacts_live_for_one_step() {
    let space = zero_damp_space();
    let mut body = attached(&space);
    body.set_max_contacts_reported(2);

    body.pre_step(0.1);
    space.solve(0.1);
    for depth in [0.1, 0.4, 0.2] {
        body.add_contact(Contact::new(ObjectId(9), depth));
    }
    body.post_step();

    assert_eq!(body.contact_count(), 2);
    let mut depths: Vec<f32> = body.contacts().iter().map(|c| c.depth).collect();
    depths.sort_by(f32::total_cmp);
    assert_eq!(depths, vec![0.2, 0.4]);

    let updates = space.drain_state_updates();
    assert_eq!(updates[0].contact_count, 2);

    body.pre_step(0.1);
    assert_eq!(body.contact_count(), 0);
}

// ==================== State ====================

#[test]
fn test_state_updates_for_moving_bodies() {
    let space = zero_damp_space();
    let mut a = attached(&space);
    let mut b = Body::new();
    b.set_mode(BodyMode::Static).unwrap();
    b.set_space(Some(space.clone()));

    space.step(0.1, [&mut a, &mut b]);

    let updates = space.drain_state_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].body, a.rid());
    assert!(updates[0].is_moving());
    assert!(!updates[0].sleeping);
}

#[test]
fn test_recorder_rolls_back_bodies() {
    let space = zero_damp_space();
    let mut body = attached(&space);

    let mut recorder = StateRecorder::new();
    recorder.save_state(&space).unwrap();

    space.step(0.1, [&mut body]);
    assert!(body.transform().unwrap().origin.y < 0.0);

    recorder.set_validating(true);
    assert!(!recorder.restore_state(&space));

    recorder.rewind();
    recorder.set_validating(false);
    assert!(recorder.restore_state(&space));
    assert_eq!(body.transform().unwrap().origin, Vec3::ZERO);
    assert_eq!(body.linear_velocity().unwrap(), Vec3::ZERO);
}

#[test]
fn test_keyed_params() {
    let space = zero_damp_space();
    let mut body = attached(&space);

    body.set_param(BodyParameter::Friction, BodyValue::Float(0.3)).unwrap();
    body.set_param(BodyParameter::LinearDampMode, BodyValue::Int(1)).unwrap();
    body.set_param(BodyParameter::LinearDamp, BodyValue::Float(0.7)).unwrap();

    assert_eq!(body.param(BodyParameter::Friction), Ok(BodyValue::Float(0.3)));
    assert_eq!(body.linear_damp_mode(), DampMode::Replace);
    assert_relative_eq!(body.total_linear_damp(), 0.7);

    assert_eq!(
        body.set_param(BodyParameter::AngularDampMode, BodyValue::Int(5)),
        Err(BodyError::UnknownDampMode(5))
    );
    assert_eq!(body.state_raw(99), BodyValue::Nil);
}
