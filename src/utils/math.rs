//! Additional math helpers layered on top of `glam`.

use glam::DVec2;

/// Tolerance for degenerate effective-mass coefficients.
pub const EPSILON: f64 = 1.0e-9;

/// 2D cross product and rotation helpers missing from [`DVec2`].
pub trait Vector2Ext {
    /// Scalar cross product `self × other`.
    fn cross(self, other: DVec2) -> f64;

    /// Rotates the vector by `angle` radians.
    fn rotated(self, angle: f64) -> DVec2;
}

impl Vector2Ext for DVec2 {
    #[inline]
    fn cross(self, other: DVec2) -> f64 {
        self.perp_dot(other)
    }

    #[inline]
    fn rotated(self, angle: f64) -> DVec2 {
        DVec2::from_angle(angle).rotate(self)
    }
}

/// Cross product of a scalar z-axis value with a vector, `z × v`.
///
/// This is the tangential velocity produced by angular velocity `z` at arm `v`.
#[inline]
pub fn scalar_cross(z: f64, v: DVec2) -> DVec2 {
    DVec2::new(-z * v.y, z * v.x)
}

/// Clamps `value` into `[min, max]`, returning `max` when the bounds are inverted.
///
/// Unlike `f64::clamp` this never panics: `SequentialImpulses::new` takes settings
/// without validating them, and user materials may carry negative friction.
#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}
