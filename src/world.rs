use glam::DVec2;
use log::debug;

use crate::{
    collision::{broadphase::BroadPhase, contact::ContactManifold},
    config::{DEFAULT_GRAVITY, DEFAULT_STEP_BUDGET_MS, SolverSettings},
    core::{constraints::ContactConstraint, rigidbody::Body},
    dynamics::{integrator::Integrator, solver::SequentialImpulses},
    error::Result,
    utils::{
        allocator::{Arena, BodyId},
        logging::{ScopedTimer, warn_if_step_budget_exceeded},
    },
};

/// Central simulation container: owns the bodies and runs fixed steps.
pub struct PhysicsWorld {
    bodies: Arena<Body>,
    pub integrator: Integrator,
    pub solver: SequentialImpulses,
    pub time_accumulated: f64,
    /// Wall-clock budget per step; exceeding it logs a warning.
    pub step_budget_ms: f64,
    broadphase: BroadPhase,
    contacts: Vec<ContactConstraint>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::build(SolverSettings::default())
    }

    /// Creates a world after checking `settings` for unusable values.
    pub fn with_settings(settings: SolverSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::build(settings))
    }

    fn build(settings: SolverSettings) -> Self {
        Self {
            bodies: Arena::new(),
            integrator: Integrator::new(DVec2::from_array(DEFAULT_GRAVITY)),
            solver: SequentialImpulses::new(settings),
            time_accumulated: 0.0,
            step_budget_ms: DEFAULT_STEP_BUDGET_MS,
            broadphase: BroadPhase::default(),
            contacts: Vec::new(),
        }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.solver.settings
    }

    pub fn gravity(&self) -> DVec2 {
        self.integrator.gravity
    }

    pub fn set_gravity(&mut self, gravity: DVec2) {
        self.integrator.gravity = gravity;
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        self.bodies.insert(body)
    }

    /// Removes a body along with any contacts that reference it.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let removed = self.bodies.remove(id)?;
        self.contacts
            .retain(|contact| contact.body1 != id && contact.body2 != id);
        Some(removed)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> &Arena<Body> {
        &self.bodies
    }

    /// Contact constraints solved during the last step.
    pub fn contacts(&self) -> &[ContactConstraint] {
        &self.contacts
    }

    /// Advances the simulation using a fixed timestep accumulator.
    ///
    /// Returns the number of fixed steps taken.
    pub fn step(&mut self, dt: f64) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        self.time_accumulated += dt;

        let time_step = self.solver.settings.time_step;
        let mut steps = 0;
        while self.time_accumulated >= time_step {
            self.time_accumulated -= time_step;
            self.step_once();
            steps += 1;
        }
        steps
    }

    /// Runs exactly one fixed step.
    pub fn step_once(&mut self) {
        let step_timer = ScopedTimer::new("world::step");
        let settings = self.solver.settings;
        let dt = settings.time_step;

        {
            let _timer = ScopedTimer::new("integrator::velocities");
            self.integrator.integrate_velocities(&mut self.bodies, dt);
        }

        let mut constraints = {
            let _timer = ScopedTimer::new("contacts::generate");
            self.generate_constraints()
        };

        {
            let _timer = ScopedTimer::new("solver::velocity");
            self.solver.initialize(&mut self.bodies, &mut constraints);
            for _ in 0..settings.velocity_iterations {
                self.solver
                    .solve_velocity_constraints(&mut self.bodies, &mut constraints);
            }
        }

        {
            let _timer = ScopedTimer::new("integrator::positions");
            self.integrator.integrate_positions(&mut self.bodies, dt);
        }

        {
            let _timer = ScopedTimer::new("solver::position");
            for iteration in 0..settings.position_iterations {
                if self
                    .solver
                    .solve_position_constraints(&mut self.bodies, &mut constraints)
                {
                    debug!("position solve converged after {} iterations", iteration + 1);
                    break;
                }
            }
        }

        self.contacts = constraints;
        warn_if_step_budget_exceeded(step_timer.elapsed(), self.step_budget_ms);
    }

    /// Narrow phase over the broad-phase pairs, seeded from last step's contacts.
    fn generate_constraints(&mut self) -> Vec<ContactConstraint> {
        let previous = std::mem::take(&mut self.contacts);
        let settings = self.solver.settings;
        let mut constraints = Vec::new();

        for (id1, id2) in self.broadphase.potential_pairs(&self.bodies) {
            let (Some(body1), Some(body2)) = (self.bodies.get(id1), self.bodies.get(id2)) else {
                continue;
            };

            for (index1, shape1) in body1.shapes().iter().enumerate() {
                let bounds1 = shape1.aabb(&body1.transform);
                for (index2, shape2) in body2.shapes().iter().enumerate() {
                    if !bounds1.overlaps(&shape2.aabb(&body2.transform)) {
                        continue;
                    }
                    let Some(manifold) = ContactManifold::between(
                        shape1,
                        &body1.transform,
                        shape2,
                        &body2.transform,
                    ) else {
                        continue;
                    };

                    let mut constraint = ContactConstraint::new(
                        (id1, body1, index1),
                        (id2, body2, index2),
                        &manifold,
                        settings.restitution_velocity,
                    );
                    if settings.warm_starting {
                        if let Some(old) = previous.iter().find(|old| old.same_pair(&constraint)) {
                            constraint.warm_start_from(old, settings.warm_start_distance);
                        }
                    }
                    constraints.push(constraint);
                }
            }
        }

        constraints
    }
}
