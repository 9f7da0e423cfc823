//! Change events and the re-derivations they fan out to
//!
//! Every mutation of a body that affects derived state raises one
//! [`ChangeEvent`]. The table in [`ChangeEvent::derivations`] is the single
//! place that decides which derived values are recomputed, and in which
//! order.

use std::fmt;

/// Something about a body changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    /// Body mode switched
    ModeChanged,
    /// Shape was replaced or rebuilt
    ShapesBuilt,
    /// Body joined a space
    SpaceChanged,
    /// Body is about to leave its space
    SpaceChanging,
    /// An area started or stopped overlapping the body
    AreasChanged,
    /// A joint was attached or detached
    JointsChanged,
    /// Body was teleported
    TransformChanged,
    /// Force, velocity or impulse was applied
    MotionChanged,
    /// Collision exceptions changed
    ExceptionsChanged,
    /// Axis locks changed
    AxisLockChanged,
}

/// A derived value and how to recompute it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Derivation {
    /// Reassign the object layer from mode and collision groups
    UpdateObjectLayer,
    /// Refresh the kinematic target from the current pose
    UpdateKinematicTransform,
    /// Recompute and push mass properties
    UpdateMassProperties,
    /// Push collision exceptions to the engine body
    UpdateGroupFilter,
    /// Rebuild the constraints of attached joints
    RebuildJoints,
    /// Destroy the constraints of attached joints
    DestroyJoints,
    /// Rebuild the axis-lock constraint
    UpdateAxesConstraint,
    /// Destroy the axis-lock constraint
    DestroyAxesConstraint,
    /// Recompute total damping from areas
    UpdateDamp,
    /// Wake the body up
    WakeUp,
}

use Derivation::*;

impl ChangeEvent {
    /// Every event
    pub const ALL: [ChangeEvent; 10] = [
        ChangeEvent::ModeChanged,
        ChangeEvent::ShapesBuilt,
        ChangeEvent::SpaceChanged,
        ChangeEvent::SpaceChanging,
        ChangeEvent::AreasChanged,
        ChangeEvent::JointsChanged,
        ChangeEvent::TransformChanged,
        ChangeEvent::MotionChanged,
        ChangeEvent::ExceptionsChanged,
        ChangeEvent::AxisLockChanged,
    ];

    /// Re-derivations triggered by the event, in execution order
    pub const fn derivations(self) -> &'static [Derivation] {
        match self {
            ChangeEvent::ModeChanged => &[
                UpdateObjectLayer,
                UpdateKinematicTransform,
                UpdateMassProperties,
                UpdateAxesConstraint,
                WakeUp,
            ],
            ChangeEvent::ShapesBuilt => &[UpdateMassProperties, WakeUp],
            // ends with the area membership chain
            ChangeEvent::SpaceChanged => &[
                UpdateMassProperties,
                UpdateGroupFilter,
                RebuildJoints,
                UpdateAxesConstraint,
                UpdateDamp,
                WakeUp,
            ],
            ChangeEvent::SpaceChanging => &[DestroyJoints, DestroyAxesConstraint],
            ChangeEvent::AreasChanged => &[UpdateDamp, WakeUp],
            ChangeEvent::JointsChanged => &[WakeUp],
            ChangeEvent::TransformChanged => &[WakeUp],
            ChangeEvent::MotionChanged => &[WakeUp],
            ChangeEvent::ExceptionsChanged => &[UpdateGroupFilter],
            ChangeEvent::AxisLockChanged => &[UpdateAxesConstraint, WakeUp],
        }
    }

    /// Whether the event ends up waking the body
    pub fn wakes(self) -> bool {
        self.derivations().contains(&WakeUp)
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateObjectLayer => "update object layer",
            UpdateKinematicTransform => "update kinematic transform",
            UpdateMassProperties => "update mass properties",
            UpdateGroupFilter => "update group filter",
            RebuildJoints => "rebuild joints",
            DestroyJoints => "destroy joints",
            UpdateAxesConstraint => "update axes constraint",
            DestroyAxesConstraint => "destroy axes constraint",
            UpdateDamp => "update damp",
            WakeUp => "wake up",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_changed_order() {
        assert_eq!(
            ChangeEvent::ModeChanged.derivations(),
            &[
                UpdateObjectLayer,
                UpdateKinematicTransform,
                UpdateMassProperties,
                UpdateAxesConstraint,
                WakeUp
            ]
        );
    }

    #[test]
    fn test_space_changing_tears_down_only() {
        let derivations = ChangeEvent::SpaceChanging.derivations();
        assert_eq!(derivations, &[DestroyJoints, DestroyAxesConstraint]);
        assert!(!ChangeEvent::SpaceChanging.wakes());
    }

    #[test]
    fn test_space_changed_ends_with_area_chain() {
        let derivations = ChangeEvent::SpaceChanged.derivations();
        assert!(derivations.ends_with(ChangeEvent::AreasChanged.derivations()));
        assert_eq!(derivations[0], UpdateMassProperties);
    }

    #[test]
    fn test_no_duplicate_derivations() {
        for event in ChangeEvent::ALL {
            let derivations = event.derivations();
            for (i, derivation) in derivations.iter().enumerate() {
                assert!(
                    !derivations[i + 1..].contains(derivation),
                    "{event:?} runs {derivation} twice"
                );
            }
        }
    }

    #[test]
    fn test_wake_is_last_when_present() {
        for event in ChangeEvent::ALL {
            let derivations = event.derivations();
            if event.wakes() {
                assert_eq!(derivations.last(), Some(&WakeUp), "{event:?}");
            }
        }
    }

    #[test]
    fn test_exceptions_do_not_wake() {
        assert!(!ChangeEvent::ExceptionsChanged.wakes());
        assert!(ChangeEvent::MotionChanged.wakes());
    }
}
