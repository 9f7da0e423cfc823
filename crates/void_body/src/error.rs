//! Error types for the body system

use crate::id::BodyId;
use thiserror::Error;

/// Body system errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BodyError {
    /// Body mode outside the closed enumeration
    #[error("Unhandled body mode: '{0}'")]
    UnknownMode(i32),

    /// Body parameter outside the closed enumeration
    #[error("Unhandled body parameter: '{0}'")]
    UnknownParameter(i32),

    /// Body state outside the closed enumeration
    #[error("Unhandled body state: '{0}'")]
    UnknownState(i32),

    /// Area override mode outside the closed enumeration
    #[error("Unhandled override mode: '{0}'")]
    UnknownOverrideMode(i32),

    /// Body damp mode outside the closed enumeration
    #[error("Unhandled damp mode: '{0}'")]
    UnknownDampMode(i32),

    /// Axis bit that is not one of the six degrees of freedom
    #[error("Unhandled body axis: '{0:#x}'")]
    UnknownAxis(u32),

    /// The engine body behind a handle has been destroyed
    #[error("Invalid engine body handle: {0:?}")]
    InvalidHandle(BodyId),

    /// The operation needs the body to be part of a space
    #[error("Failed to {operation} of body {body}: the body is not part of a space")]
    NotInSpace {
        /// Body that was queried
        body: u64,
        /// What was attempted
        operation: &'static str,
    },

    /// A parameter or state value of the wrong kind
    #[error("Expected a {expected} value, found {found}")]
    ValueType {
        /// Kind the parameter accepts
        expected: &'static str,
        /// Kind that was passed
        found: &'static str,
    },

    /// Recorded state could not be encoded
    #[error("State serialization failed: {0}")]
    Serialization(String),
}

/// Result type for body operations
pub type Result<T> = std::result::Result<T, BodyError>;
