//! Override policies for combining area-supplied values
//!
//! Gravity and both damping channels walk a body's areas in priority order
//! and fold each area's value into a running total with [`integrate`]. The
//! returned flag tells the caller to stop walking.

use crate::error::BodyError;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// How an area's value is combined with the running total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum OverrideMode {
    /// Area contributes nothing
    #[default]
    Disabled,
    /// Add to the total and keep going
    Combine,
    /// Add to the total and stop
    CombineReplace,
    /// Overwrite the total and stop
    Replace,
    /// Overwrite the total and keep going
    ReplaceCombine,
}

impl TryFrom<i32> for OverrideMode {
    type Error = BodyError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Combine),
            2 => Ok(Self::CombineReplace),
            3 => Ok(Self::Replace),
            4 => Ok(Self::ReplaceCombine),
            other => Err(BodyError::UnknownOverrideMode(other)),
        }
    }
}

/// How a body's own damping relates to the area total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum DampMode {
    /// Add the body's damping on top of the areas
    #[default]
    Combine,
    /// Ignore the areas and use only the body's damping
    Replace,
}

impl TryFrom<i32> for DampMode {
    type Error = BodyError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Combine),
            1 => Ok(Self::Replace),
            other => Err(BodyError::UnknownDampMode(other)),
        }
    }
}

impl From<DampMode> for i32 {
    fn from(mode: DampMode) -> Self {
        match mode {
            DampMode::Combine => 0,
            DampMode::Replace => 1,
        }
    }
}

/// Fold one area's value into `value` according to `mode`.
///
/// `supply` is only called when the mode uses the value. Returns `true` when
/// the walk over the remaining areas should stop.
pub fn integrate<T, F>(value: &mut T, mode: OverrideMode, supply: F) -> bool
where
    T: AddAssign,
    F: FnOnce() -> T,
{
    match mode {
        OverrideMode::Disabled => false,
        OverrideMode::Combine => {
            *value += supply();
            false
        }
        OverrideMode::CombineReplace => {
            *value += supply();
            true
        }
        OverrideMode::Replace => {
            *value = supply();
            true
        }
        OverrideMode::ReplaceCombine => {
            *value = supply();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const ALL: [OverrideMode; 5] = [
        OverrideMode::Disabled,
        OverrideMode::Combine,
        OverrideMode::CombineReplace,
        OverrideMode::Replace,
        OverrideMode::ReplaceCombine,
    ];

    #[test]
    fn test_disabled_never_touches_value() {
        let mut total = 2.5f32;
        let mut called = false;
        let done = integrate(&mut total, OverrideMode::Disabled, || {
            called = true;
            10.0
        });
        assert!(!done);
        assert!(!called);
        assert_eq!(total, 2.5);
    }

    #[test]
    fn test_terminal_modes() {
        for mode in ALL {
            let mut total = 1.0f32;
            let done = integrate(&mut total, mode, || 3.0);
            let expected_done = matches!(mode, OverrideMode::Replace | OverrideMode::CombineReplace);
            assert_eq!(done, expected_done, "{mode:?}");
        }
    }

    #[test]
    fn test_combine_and_replace_values() {
        let mut total = 1.0f32;
        integrate(&mut total, OverrideMode::Combine, || 3.0);
        assert_eq!(total, 4.0);

        integrate(&mut total, OverrideMode::ReplaceCombine, || 0.5);
        assert_eq!(total, 0.5);

        integrate(&mut total, OverrideMode::CombineReplace, || 0.25);
        assert_eq!(total, 0.75);

        integrate(&mut total, OverrideMode::Replace, || 9.0);
        assert_eq!(total, 9.0);
    }

    #[test]
    fn test_vector_accumulator() {
        let mut gravity = Vec3::ZERO;
        integrate(&mut gravity, OverrideMode::Combine, || Vec3::new(0.0, -1.0, 0.0));
        integrate(&mut gravity, OverrideMode::Combine, || Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(gravity, Vec3::new(1.0, -1.0, 0.0));
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(OverrideMode::try_from(3), Ok(OverrideMode::Replace));
        assert_eq!(OverrideMode::try_from(7), Err(BodyError::UnknownOverrideMode(7)));
        assert_eq!(DampMode::try_from(1), Ok(DampMode::Replace));
        assert_eq!(DampMode::try_from(-1), Err(BodyError::UnknownDampMode(-1)));
    }
}
