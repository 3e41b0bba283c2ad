//! Error types for world configuration.
//!
//! The solver itself never fails; degenerate geometry falls back numerically.
//! Only settings validation and world construction return [`PhysicsError`].

use std::fmt;

/// Errors raised while configuring a physics world.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// A numeric setting is non-finite or outside its allowed range.
    InvalidSetting { name: &'static str, value: f64 },
    /// An iteration count was zero.
    ZeroIterations(&'static str),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidSetting { name, value } => {
                write!(f, "Invalid setting: {name} = {value}")
            }
            Self::ZeroIterations(name) => write!(f, "Iteration count must be positive: {name}"),
        }
    }
}

impl std::error::Error for PhysicsError {}

/// Result alias for fallible configuration calls.
pub type Result<T> = std::result::Result<T, PhysicsError>;
