use glam::DVec2;

use super::{
    shape::{Aabb, Shape},
    types::{Mass, MassType, Material, Transform},
};
use crate::{
    config::{DEFAULT_ANGULAR_DAMPING, DEFAULT_LINEAR_DAMPING},
    dynamics::forces::{self, Force},
    utils::math::scalar_cross,
};

/// A rigid body: one or more convex shapes moving as a unit.
#[derive(Debug, Clone)]
pub struct Body {
    pub transform: Transform,
    pub linear_velocity: DVec2,
    pub angular_velocity: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub gravity_scale: f64,
    pub material: Material,
    shapes: Vec<Shape>,
    mass: Mass,
    mass_type: MassType,
    force: DVec2,
    torque: f64,
    forces: Vec<Force>,
}

impl Body {
    pub fn new(shape: Shape) -> Self {
        Self::compound(vec![shape])
    }

    /// A body built from several primitives sharing one transform.
    pub fn compound(shapes: Vec<Shape>) -> Self {
        let mut body = Self {
            transform: Transform::default(),
            linear_velocity: DVec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: DEFAULT_LINEAR_DAMPING,
            angular_damping: DEFAULT_ANGULAR_DAMPING,
            gravity_scale: 1.0,
            material: Material::default(),
            shapes,
            mass: Mass::default(),
            mass_type: MassType::Normal,
            force: DVec2::ZERO,
            torque: 0.0,
            forces: Vec::new(),
        };
        body.update_mass();
        body
    }

    /// Shorthand for an immovable body such as a wall or bumper.
    pub fn fixed(shape: Shape) -> Self {
        Self::new(shape).with_mass_type(MassType::Infinite)
    }

    pub fn at(mut self, position: DVec2) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, angle: f64) -> Self {
        self.transform.rotation = angle;
        self
    }

    pub fn with_velocity(mut self, linear: DVec2, angular: f64) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self.update_mass();
        self
    }

    pub fn with_mass_type(mut self, mass_type: MassType) -> Self {
        self.mass_type = mass_type;
        self.update_mass();
        self
    }

    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
        self.update_mass();
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn mass(&self) -> &Mass {
        &self.mass
    }

    pub fn mass_type(&self) -> MassType {
        self.mass_type
    }

    pub fn set_mass_type(&mut self, mass_type: MassType) {
        self.mass_type = mass_type;
        self.update_mass();
    }

    /// Recomputes mass properties from the shapes and material density.
    pub fn update_mass(&mut self) {
        let masses: Vec<Mass> = self
            .shapes
            .iter()
            .map(|shape| shape.create_mass(self.material.density))
            .collect();
        self.mass = Mass::combine(&masses).with_type(self.mass_type);
    }

    /// True when no impulse can move the body.
    pub fn is_static(&self) -> bool {
        self.mass.is_infinite()
    }

    /// World-space center of mass.
    pub fn world_center(&self) -> DVec2 {
        self.transform.transform_point(self.mass.center)
    }

    /// Velocity of the body's material at a world point.
    pub fn velocity_at(&self, point: DVec2) -> DVec2 {
        self.linear_velocity + scalar_cross(self.angular_velocity, point - self.world_center())
    }

    pub fn apply_force(&mut self, force: Force) {
        if self.is_static() {
            return;
        }
        self.forces.push(force);
    }

    pub fn clear_forces(&mut self) {
        self.forces.clear();
        self.force = DVec2::ZERO;
        self.torque = 0.0;
    }

    pub fn pending_forces(&self) -> &[Force] {
        &self.forces
    }

    /// Folds the queued forces into the accumulated force and torque.
    pub fn accumulate_forces(&mut self) {
        let center = self.world_center();
        let (force, torque) = forces::accumulate(&mut self.forces, center);
        self.force = force;
        self.torque = torque;
    }

    pub fn accumulated_force(&self) -> DVec2 {
        self.force
    }

    pub fn accumulated_torque(&self) -> f64 {
        self.torque
    }

    /// Applies an instantaneous impulse at a world point.
    pub fn apply_impulse(&mut self, impulse: DVec2, point: DVec2) {
        if self.is_static() {
            return;
        }
        let arm = point - self.world_center();
        self.linear_velocity += impulse * self.mass.inverse_mass;
        self.angular_velocity += self.mass.inverse_inertia * arm.perp_dot(impulse);
    }

    /// World bounding box of all shapes.
    pub fn aabb(&self) -> Option<Aabb> {
        self.shapes
            .iter()
            .map(|shape| shape.aabb(&self.transform))
            .reduce(|a, b| a.union(&b))
    }
}
