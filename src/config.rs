//! Global configuration constants and the tunable solver settings.

use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};

/// Default gravity vector applied in the physics world (Y-up).
pub const DEFAULT_GRAVITY: [f64; 2] = [0.0, -9.8];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f64 = 1.0 / 60.0;

/// Velocity solver iterations performed per step.
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 10;

/// Upper bound on position solver iterations per step.
pub const DEFAULT_POSITION_ITERATIONS: u32 = 10;

/// Largest translation the position solver may apply to a contact per iteration.
pub const DEFAULT_MAXIMUM_LINEAR_CORRECTION: f64 = 0.2;

/// Penetration tolerated before position correction engages.
pub const DEFAULT_LINEAR_TOLERANCE: f64 = 0.005;

/// Fraction of the position error corrected per iteration.
pub const DEFAULT_BAUMGARTE: f64 = 0.2;

/// Closing speed below which restitution is ignored.
pub const DEFAULT_RESTITUTION_VELOCITY: f64 = 1.0;

/// Distance within which a new contact inherits a previous contact's impulses.
pub const DEFAULT_WARM_START_DISTANCE: f64 = 1.0e-2;

/// Scale applied to carried-over impulses when warm starting.
pub const WARM_START_RATIO: f64 = 1.0;

/// Condition bound for the two-contact block solver, `K00² < MAX_CONDITION · det(K)`.
pub const MAX_CONDITION: f64 = 1000.0;

/// Default damping applied to linear velocity.
pub const DEFAULT_LINEAR_DAMPING: f64 = 0.0;

/// Default damping applied to angular velocity.
pub const DEFAULT_ANGULAR_DAMPING: f64 = 0.01;

/// Wall-clock budget for a single step before a warning is logged.
pub const DEFAULT_STEP_BUDGET_MS: f64 = 4.0;

/// Tunable numeric configuration consumed by the solver and the world driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub time_step: f64,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub max_linear_correction: f64,
    pub allowed_penetration: f64,
    pub baumgarte: f64,
    pub restitution_velocity: f64,
    pub warm_start_distance: f64,
    pub warm_starting: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            max_linear_correction: DEFAULT_MAXIMUM_LINEAR_CORRECTION,
            allowed_penetration: DEFAULT_LINEAR_TOLERANCE,
            baumgarte: DEFAULT_BAUMGARTE,
            restitution_velocity: DEFAULT_RESTITUTION_VELOCITY,
            warm_start_distance: DEFAULT_WARM_START_DISTANCE,
            warm_starting: true,
        }
    }
}

impl SolverSettings {
    /// Checks every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(PhysicsError::InvalidSetting {
                name: "time_step",
                value: self.time_step,
            });
        }
        if self.velocity_iterations == 0 {
            return Err(PhysicsError::ZeroIterations("velocity_iterations"));
        }
        if self.position_iterations == 0 {
            return Err(PhysicsError::ZeroIterations("position_iterations"));
        }
        let non_negative = [
            ("max_linear_correction", self.max_linear_correction),
            ("allowed_penetration", self.allowed_penetration),
            ("restitution_velocity", self.restitution_velocity),
            ("warm_start_distance", self.warm_start_distance),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PhysicsError::InvalidSetting { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.baumgarte) {
            return Err(PhysicsError::InvalidSetting {
                name: "baumgarte",
                value: self.baumgarte,
            });
        }
        Ok(())
    }
}
