use glam::DVec2;

use crate::{core::rigidbody::Body, utils::allocator::Arena};

/// Semi-implicit Euler integrator for rigid bodies.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub gravity: DVec2,
}

impl Integrator {
    pub fn new(gravity: DVec2) -> Self {
        Self { gravity }
    }

    /// Applies gravity, accumulated forces, and damping to the velocities.
    pub fn integrate_velocity(&self, body: &mut Body, dt: f64) {
        if body.is_static() {
            return;
        }

        let mass = *body.mass();
        if mass.inverse_mass > 0.0 {
            let acceleration =
                self.gravity * body.gravity_scale + body.accumulated_force() * mass.inverse_mass;
            body.linear_velocity += acceleration * dt;
        }
        body.angular_velocity += body.accumulated_torque() * mass.inverse_inertia * dt;

        body.linear_velocity *= (1.0 - body.linear_damping * dt).max(0.0);
        body.angular_velocity *= (1.0 - body.angular_damping * dt).max(0.0);
    }

    /// Moves the body along its velocities, rotating about its center of mass.
    pub fn integrate_position(&self, body: &mut Body, dt: f64) {
        if body.is_static() {
            return;
        }

        body.transform.translate(body.linear_velocity * dt);
        let angle = body.angular_velocity * dt;
        if angle != 0.0 {
            let center = body.world_center();
            body.transform.rotate_about(angle, center);
        }
    }

    pub fn integrate_velocities(&self, bodies: &mut Arena<Body>, dt: f64) {
        for (_, body) in bodies.iter_mut() {
            body.accumulate_forces();
            self.integrate_velocity(body, dt);
        }
    }

    pub fn integrate_positions(&self, bodies: &mut Arena<Body>, dt: f64) {
        for (_, body) in bodies.iter_mut() {
            self.integrate_position(body, dt);
        }
    }
}
