//! Simulation dynamics modules: integration, forces, and the contact solver.

pub mod forces;
pub mod integrator;
pub mod solver;

pub use forces::{Force, ForceLifetime};
pub use integrator::Integrator;
pub use solver::SequentialImpulses;
