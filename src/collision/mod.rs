//! Collision detection modules: broad-phase, separating-axis narrow-phase,
//! feature clipping, and contact manifolds.

pub mod broadphase;
pub mod clipping;
pub mod contact;
pub mod narrowphase;
pub mod shapes;

pub use broadphase::BroadPhase;
pub use contact::{ContactManifold, ManifoldPoint};
pub use narrowphase::{CircleDetector, Penetration, SatDetector};
