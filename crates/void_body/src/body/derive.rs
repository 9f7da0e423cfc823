//! Re-derivation of body state after a change

use super::{Body, BodyMode, Instance};
use crate::area::Area;
use crate::constraint::{constrained_axes, OwnedConstraint, SixDofConstraint};
use crate::engine::{EngineBodies, EngineBody};
use crate::error::{BodyError, Result};
use crate::id::BodyId;
use crate::mass::{self, MassProperties};
use crate::override_mode::{integrate, DampMode};
use crate::propagation::{ChangeEvent, Derivation};
use crate::space::Space;
use crate::transform::Transform;
use glam::{Mat3, Vec3};
use std::sync::Arc;

/// Engine access for one derivation chain, with the body storage held
struct Scope<'a> {
    space: &'a Arc<Space>,
    id: BodyId,
    bodies: &'a mut EngineBodies,
}

impl Scope<'_> {
    fn engine(&mut self) -> Result<&mut EngineBody> {
        self.bodies.get_mut(self.id).ok_or(BodyError::InvalidHandle(self.id))
    }
}

/// Total linear and angular damping of a body.
///
/// Each channel walks `areas` (highest priority first) until an override
/// terminates it, falls back to `default_area` when none did, and finally
/// folds in the body's own value according to its mode.
pub fn aggregate_damp(
    areas: &[Arc<Area>],
    default_area: &Area,
    linear: (DampMode, f32),
    angular: (DampMode, f32),
) -> (f32, f32) {
    let (linear_mode, linear_damp) = linear;
    let (angular_mode, angular_damp) = angular;

    let mut total_linear = 0.0;
    let mut total_angular = 0.0;

    let mut linear_done = linear_mode == DampMode::Replace;
    let mut angular_done = angular_mode == DampMode::Replace;

    for area in areas {
        if !linear_done {
            linear_done = integrate(&mut total_linear, area.linear_damp_mode, || area.linear_damp);
        }

        if !angular_done {
            angular_done = integrate(&mut total_angular, area.angular_damp_mode, || area.angular_damp);
        }

        if linear_done && angular_done {
            break;
        }
    }

    if !linear_done {
        total_linear += default_area.linear_damp;
    }

    if !angular_done {
        total_angular += default_area.angular_damp;
    }

    match linear_mode {
        DampMode::Combine => total_linear += linear_damp,
        DampMode::Replace => total_linear = linear_damp,
    }

    match angular_mode {
        DampMode::Combine => total_angular += angular_damp,
        DampMode::Replace => total_angular = angular_damp,
    }

    (total_linear, total_angular)
}

impl Body {
    /// Run the re-derivations of `event`, locking the body storage once
    pub fn propagate(&mut self, event: ChangeEvent) {
        self.run(event.derivations());
    }

    /// Run the re-derivations of `event` with the body storage already held
    pub fn propagate_with(&mut self, event: ChangeEvent, bodies: &mut EngineBodies) {
        self.run_with(event.derivations(), bodies);
    }

    pub(super) fn run(&mut self, derivations: &[Derivation]) {
        match self.attachment() {
            Some((space, id)) => {
                let mut bodies = space.write_bodies();
                let mut scope = Scope {
                    space: &space,
                    id,
                    bodies: &mut bodies,
                };
                self.run_scoped(derivations, Some(&mut scope));
            }
            None => self.run_scoped(derivations, None),
        }
    }

    pub(super) fn run_with(&mut self, derivations: &[Derivation], bodies: &mut EngineBodies) {
        match self.attachment() {
            Some((space, id)) => {
                let mut scope = Scope {
                    space: &space,
                    id,
                    bodies,
                };
                self.run_scoped(derivations, Some(&mut scope));
            }
            None => self.run_scoped(derivations, None),
        }
    }

    fn run_scoped(&mut self, derivations: &[Derivation], mut scope: Option<&mut Scope<'_>>) {
        for &derivation in derivations {
            if let Err(err) = self.derive(derivation, scope.as_deref_mut()) {
                log::error!("Failed to {} of {}: {}", derivation, self, err);
            }
        }
    }

    fn derive(&mut self, derivation: Derivation, scope: Option<&mut Scope<'_>>) -> Result<()> {
        match derivation {
            Derivation::UpdateObjectLayer => self.update_object_layer(scope),
            Derivation::UpdateKinematicTransform => self.update_kinematic_transform(scope),
            Derivation::UpdateMassProperties => self.update_mass_properties(scope),
            Derivation::UpdateGroupFilter => self.update_group_filter(scope),
            Derivation::RebuildJoints => {
                if let Some(scope) = scope {
                    for joint in &self.joints {
                        joint.rebuild(scope.space, scope.bodies);
                    }
                }
                Ok(())
            }
            Derivation::DestroyJoints => {
                for joint in &self.joints {
                    joint.destroy();
                }
                Ok(())
            }
            Derivation::UpdateAxesConstraint => self.update_axes_constraint(scope),
            Derivation::DestroyAxesConstraint => {
                self.axes_constraint = None;
                Ok(())
            }
            Derivation::UpdateDamp => self.update_damp(scope),
            Derivation::WakeUp => {
                if let Some(scope) = scope {
                    scope.engine()?.activate();
                }
                Ok(())
            }
        }
    }

    fn update_object_layer(&mut self, scope: Option<&mut Scope<'_>>) -> Result<()> {
        let Some(scope) = scope else {
            return Ok(());
        };

        let layer = scope
            .space
            .map_to_object_layer(self.mode.broad_phase_layer(), self.collision_groups);
        scope.engine()?.set_object_layer(layer);
        Ok(())
    }

    fn update_kinematic_transform(&mut self, scope: Option<&mut Scope<'_>>) -> Result<()> {
        if self.mode != BodyMode::Kinematic {
            return Ok(());
        }

        self.kinematic_transform = match (scope, &self.instance) {
            (Some(scope), _) => scope.engine()?.transform(),
            (None, Instance::Pending(settings)) => Transform::new(settings.rotation, settings.position),
            (None, Instance::Attached { .. }) => return Ok(()),
        };

        Ok(())
    }

    fn update_mass_properties(&mut self, scope: Option<&mut Scope<'_>>) -> Result<()> {
        let Some(scope) = scope else {
            return Ok(());
        };

        let properties = self.calculate_mass_properties();
        let center_of_mass = self.center_of_mass_local();
        let translation_only = self.mode == BodyMode::RigidLinear;

        let engine = scope.engine()?;
        engine.set_mass_properties(properties);
        engine.set_center_of_mass_local(center_of_mass);

        if translation_only {
            engine.set_inverse_inertia(Mat3::ZERO);
        }

        Ok(())
    }

    fn update_group_filter(&mut self, scope: Option<&mut Scope<'_>>) -> Result<()> {
        if let Some(scope) = scope {
            scope.engine()?.set_group_filter(self.group_filter.clone());
        }
        Ok(())
    }

    fn update_axes_constraint(&mut self, scope: Option<&mut Scope<'_>>) -> Result<()> {
        self.axes_constraint = None;

        let Some(scope) = scope else {
            return Ok(());
        };

        let Some(fixed_axes) = constrained_axes(self.locked_axes, self.mode == BodyMode::RigidLinear) else {
            return Ok(());
        };

        let anchor = scope.engine()?.center_of_mass_position();
        let constraint = SixDofConstraint {
            body: scope.id,
            anchor,
            fixed_axes,
        };

        log::debug!("Locking {:?} of {}", fixed_axes, self);

        self.axes_constraint = Some(OwnedConstraint::register(scope.space, constraint));
        Ok(())
    }

    fn update_damp(&mut self, scope: Option<&mut Scope<'_>>) -> Result<()> {
        let Some(scope) = scope else {
            return Ok(());
        };

        let (linear, angular) = aggregate_damp(
            &self.areas,
            scope.space.default_area(),
            (self.linear_damp_mode, self.linear_damp),
            (self.angular_damp_mode, self.angular_damp),
        );

        self.total_linear_damp = linear;
        self.total_angular_damp = angular;

        let engine = scope.engine()?;

        if self.custom_integrator {
            engine.set_linear_damping(0.0);
            engine.set_angular_damping(0.0);
        } else {
            engine.set_linear_damping(linear);
            engine.set_angular_damping(angular);
        }

        Ok(())
    }

    /// Effective mass properties from the shape and the overrides
    pub fn calculate_mass_properties(&self) -> MassProperties {
        let shape = self
            .shape
            .as_ref()
            .map(|shape| shape.mass_properties())
            .unwrap_or_default();

        mass::calculate(&shape, self.mass, self.inertia)
    }

    /// Center of mass relative to the body origin
    pub fn center_of_mass_local(&self) -> Vec3 {
        self.center_of_mass_custom
            .or_else(|| self.shape.as_ref().map(|shape| shape.center_of_mass()))
            .unwrap_or(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::AreaId;
    use crate::override_mode::OverrideMode;
    use approx::assert_relative_eq;

    fn area(id: u64, priority: i32, mode: OverrideMode, damp: f32) -> Arc<Area> {
        Arc::new(
            Area::new(AreaId(id))
                .with_priority(priority)
                .with_linear_damp(mode, damp)
                .with_angular_damp(mode, damp),
        )
    }

    fn default_area() -> Area {
        Area::new(AreaId(0))
            .with_linear_damp(OverrideMode::Combine, 0.1)
            .with_angular_damp(OverrideMode::Combine, 0.1)
    }

    #[test]
    fn test_replace_ignores_areas() {
        let areas = [area(1, 0, OverrideMode::Replace, 0.3)];
        let (linear, angular) = aggregate_damp(
            &areas,
            &default_area(),
            (DampMode::Replace, 0.5),
            (DampMode::Replace, 0.5),
        );
        assert_relative_eq!(linear, 0.5);
        assert_relative_eq!(angular, 0.5);
    }

    #[test]
    fn test_combine_adds_area_total() {
        let areas = [area(1, 0, OverrideMode::Replace, 0.3)];
        let (linear, _) = aggregate_damp(
            &areas,
            &default_area(),
            (DampMode::Combine, 0.5),
            (DampMode::Combine, 0.0),
        );
        assert_relative_eq!(linear, 0.8);
    }

    #[test]
    fn test_default_area_when_not_terminated() {
        let areas = [area(1, 0, OverrideMode::Combine, 0.3)];
        let (linear, angular) = aggregate_damp(
            &areas,
            &default_area(),
            (DampMode::Combine, 0.0),
            (DampMode::Combine, 0.2),
        );
        assert_relative_eq!(linear, 0.4);
        assert_relative_eq!(angular, 0.6);
    }

    #[test]
    fn test_walk_stops_at_terminal_area() {
        let areas = [
            area(1, 2, OverrideMode::CombineReplace, 0.3),
            area(2, 1, OverrideMode::Combine, 5.0),
        ];
        let (linear, _) = aggregate_damp(
            &areas,
            &default_area(),
            (DampMode::Combine, 0.0),
            (DampMode::Combine, 0.0),
        );
        assert_relative_eq!(linear, 0.3);
    }

    #[test]
    fn test_disabled_areas_are_skipped() {
        let areas = [area(1, 0, OverrideMode::Disabled, 9.0)];
        let (linear, _) = aggregate_damp(
            &areas,
            &default_area(),
            (DampMode::Combine, 0.0),
            (DampMode::Combine, 0.0),
        );
        assert_relative_eq!(linear, 0.1);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let areas = [
            area(1, 3, OverrideMode::ReplaceCombine, 0.25),
            area(2, 1, OverrideMode::Combine, 0.5),
        ];
        let run = || {
            aggregate_damp(
                &areas,
                &default_area(),
                (DampMode::Combine, 0.1),
                (DampMode::Replace, 0.7),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_shapeless_mass_properties() {
        let body = Body::new();
        let properties = body.calculate_mass_properties();
        assert_relative_eq!(properties.mass, 1.0);
        assert_eq!(properties.inertia_diagonal(), Vec3::ONE);
    }
}
