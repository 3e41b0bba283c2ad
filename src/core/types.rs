use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::utils::math::Vector2Ext;

/// Rigid 2D transform: rotation about the origin followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: DVec2,
    /// Rotation angle in radians.
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: DVec2::ZERO,
        rotation: 0.0,
    };

    pub fn new(position: DVec2, rotation: f64) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: DVec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Maps a local point into world space.
    pub fn transform_point(&self, local: DVec2) -> DVec2 {
        local.rotated(self.rotation) + self.position
    }

    /// Rotates a local direction into world space (no translation).
    pub fn transform_vector(&self, local: DVec2) -> DVec2 {
        local.rotated(self.rotation)
    }

    /// Maps a world point into local space.
    pub fn inverse_transform_point(&self, world: DVec2) -> DVec2 {
        (world - self.position).rotated(-self.rotation)
    }

    /// Rotates a world direction into local space.
    pub fn inverse_transform_vector(&self, world: DVec2) -> DVec2 {
        world.rotated(-self.rotation)
    }

    /// Applies `other` first, then `self`.
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.transform_point(other.position),
            rotation: self.rotation + other.rotation,
        }
    }

    /// The transform undoing this one.
    pub fn inverse(&self) -> Transform {
        Transform {
            position: (-self.position).rotated(-self.rotation),
            rotation: -self.rotation,
        }
    }

    pub fn translate(&mut self, delta: DVec2) {
        self.position += delta;
    }

    /// Rotates the whole frame by `angle` about the world point `pivot`.
    pub fn rotate_about(&mut self, angle: f64, pivot: DVec2) {
        self.position = pivot + (self.position - pivot).rotated(angle);
        self.rotation += angle;
    }
}

/// Which degrees of freedom of a body respond to impulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MassType {
    #[default]
    Normal,
    /// Immovable: walls, bumpers.
    Infinite,
    /// Rotates but never translates, e.g. a pinned flipper.
    FixedLinearVelocity,
    /// Translates but never rotates.
    FixedAngularVelocity,
}

/// Center of mass, mass, and rotational inertia of a shape or body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mass {
    /// Center of mass in body-local coordinates.
    pub center: DVec2,
    pub mass: f64,
    /// Rotational inertia about `center`.
    pub inertia: f64,
    pub inverse_mass: f64,
    pub inverse_inertia: f64,
    pub mass_type: MassType,
}

impl Default for Mass {
    fn default() -> Self {
        Self::infinite(DVec2::ZERO)
    }
}

impl Mass {
    pub fn new(center: DVec2, mass: f64, inertia: f64) -> Self {
        let mut result = Self {
            center,
            mass,
            inertia,
            inverse_mass: 0.0,
            inverse_inertia: 0.0,
            mass_type: MassType::Normal,
        };
        result.recompute_inverses();
        result
    }

    /// An immovable mass centered at `center`.
    pub fn infinite(center: DVec2) -> Self {
        Self {
            center,
            mass: 0.0,
            inertia: 0.0,
            inverse_mass: 0.0,
            inverse_inertia: 0.0,
            mass_type: MassType::Infinite,
        }
    }

    /// Combines per-shape masses into one, using the parallel axis theorem.
    pub fn combine(masses: &[Mass]) -> Mass {
        match masses {
            [] => Mass::infinite(DVec2::ZERO),
            [single] => *single,
            _ => {
                let total: f64 = masses.iter().map(|m| m.mass).sum();
                if total <= 0.0 {
                    return Mass::infinite(masses[0].center);
                }
                let center = masses
                    .iter()
                    .fold(DVec2::ZERO, |acc, m| acc + m.center * m.mass)
                    / total;
                let inertia = masses
                    .iter()
                    .map(|m| m.inertia + m.mass * m.center.distance_squared(center))
                    .sum();
                Mass::new(center, total, inertia)
            }
        }
    }

    pub fn with_type(mut self, mass_type: MassType) -> Self {
        self.mass_type = mass_type;
        self.recompute_inverses();
        self
    }

    pub fn is_infinite(&self) -> bool {
        self.inverse_mass == 0.0 && self.inverse_inertia == 0.0
    }

    fn recompute_inverses(&mut self) {
        let inverse = |value: f64| {
            if value.abs() < f64::EPSILON {
                0.0
            } else {
                1.0 / value
            }
        };
        let (inverse_mass, inverse_inertia) = match self.mass_type {
            MassType::Normal => (inverse(self.mass), inverse(self.inertia)),
            MassType::Infinite => (0.0, 0.0),
            MassType::FixedLinearVelocity => (0.0, inverse(self.inertia)),
            MassType::FixedAngularVelocity => (inverse(self.mass), 0.0),
        };
        self.inverse_mass = inverse_mass;
        self.inverse_inertia = inverse_inertia;
    }
}

/// Surface and density coefficients of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub density: f64,
    pub restitution: f64,
    pub friction: f64,
    /// How this material mixes its coefficients with another material.
    pub mixing: MaterialMixing,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            restitution: 0.0,
            friction: 0.2,
            mixing: MaterialMixing::default(),
        }
    }
}

impl Material {
    /// Lively, grippy surface used for bumpers.
    pub fn rubber() -> Self {
        Self {
            density: 1.4,
            restitution: 0.85,
            friction: 0.9,
            mixing: MaterialMixing::default(),
        }
    }

    /// Dense, slick surface used for the ball.
    pub fn steel() -> Self {
        Self {
            density: 7.8,
            restitution: 0.4,
            friction: 0.15,
            mixing: MaterialMixing::default(),
        }
    }

    pub fn wood() -> Self {
        Self {
            density: 0.7,
            restitution: 0.25,
            friction: 0.45,
            mixing: MaterialMixing::default(),
        }
    }

    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    /// Coefficients for a contact between `self` and `other`.
    pub fn combine_with(&self, other: &Self) -> MaterialPairProperties {
        let friction_mode = self.mixing.friction.resolve(other.mixing.friction);
        let restitution_mode = self.mixing.restitution.resolve(other.mixing.restitution);
        MaterialPairProperties {
            friction: friction_mode.combine(self.friction, other.friction),
            restitution: restitution_mode.combine(self.restitution, other.restitution),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialMixing {
    pub friction: MixingMode,
    pub restitution: MixingMode,
}

impl Default for MaterialMixing {
    fn default() -> Self {
        Self {
            friction: MixingMode::GeometricMean,
            restitution: MixingMode::Max,
        }
    }
}

impl MaterialMixing {
    pub fn with_friction(mut self, mode: MixingMode) -> Self {
        self.friction = mode;
        self
    }

    pub fn with_restitution(mut self, mode: MixingMode) -> Self {
        self.restitution = mode;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MixingMode {
    #[default]
    Average,
    Min,
    Max,
    GeometricMean,
}

impl MixingMode {
    fn combine(self, a: f64, b: f64) -> f64 {
        match self {
            MixingMode::Average => 0.5 * (a + b),
            MixingMode::Min => a.min(b),
            MixingMode::Max => a.max(b),
            MixingMode::GeometricMean => (a.abs() * b.abs()).sqrt(),
        }
    }

    /// When the two sides disagree, the first non-average mode wins.
    fn resolve(self, other: MixingMode) -> MixingMode {
        if matches!(self, MixingMode::Average) {
            other
        } else {
            self
        }
    }
}

/// Combined coefficients of a colliding pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialPairProperties {
    pub friction: f64,
    pub restitution: f64,
}

impl Default for MaterialPairProperties {
    fn default() -> Self {
        Material::default().combine_with(&Material::default())
    }
}
