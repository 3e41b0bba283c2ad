//! Pinball Dynamics – 2D rigid-body collision core for Rust.
//!
//! This crate detects overlaps between convex primitives (circles, rectangles,
//! triangles, quarter circles) with a separating-axis test, turns them into
//! contact constraints, and resolves those with a sequential-impulse solver
//! featuring warm starting, a two-point block solver, and position correction.
//! [`PhysicsWorld`] drives the whole pipeline at a fixed time step.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::{DMat2, DVec2};

pub use collision::{
    broadphase::BroadPhase,
    contact::{ContactManifold, ManifoldPoint},
    narrowphase::{CircleDetector, Penetration, SatDetector},
};
pub use config::SolverSettings;
pub use core::{
    constraints::{ContactConstraint, SolvableContact},
    rigidbody::Body,
    shape::{Aabb, Shape},
    types::{Mass, MassType, Material, MixingMode, Transform},
};
pub use dynamics::{
    forces::{Force, ForceLifetime},
    integrator::Integrator,
    solver::SequentialImpulses,
};
pub use error::{PhysicsError, Result};
pub use utils::allocator::{Arena, BodyId};
pub use world::PhysicsWorld;
