//! Core types describing bodies, shapes, materials, and contact constraints.

pub mod constraints;
pub mod rigidbody;
pub mod shape;
pub mod types;

pub use constraints::{BlockMatrix, ContactConstraint, SolvableContact};
pub use rigidbody::Body;
pub use shape::{Aabb, Shape};
pub use types::{Mass, MassType, Material, MaterialMixing, MixingMode, Transform};
