use std::f64::consts::PI;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::types::{Mass, Transform};

/// Closed set of convex primitives a gizmo can be built from.
///
/// Geometry is expressed in body-local coordinates; the owning body's
/// [`Transform`] places it in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle {
        center: DVec2,
        radius: f64,
    },
    Rectangle {
        center: DVec2,
        half_extents: DVec2,
    },
    /// Counter-clockwise vertices.
    Triangle {
        vertices: [DVec2; 3],
    },
    /// Quarter disc whose straight edges run from `corner` along local +X and +Y.
    QuarterCircle {
        corner: DVec2,
        radius: f64,
    },
}

impl Shape {
    pub fn circle(radius: f64) -> Self {
        Self::circle_at(DVec2::ZERO, radius)
    }

    pub fn circle_at(center: DVec2, radius: f64) -> Self {
        Shape::Circle { center, radius }
    }

    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::rectangle_at(DVec2::ZERO, width, height)
    }

    pub fn rectangle_at(center: DVec2, width: f64, height: f64) -> Self {
        Shape::Rectangle {
            center,
            half_extents: DVec2::new(width, height) * 0.5,
        }
    }

    /// Builds a triangle, reordering the vertices counter-clockwise if needed.
    pub fn triangle(a: DVec2, b: DVec2, c: DVec2) -> Self {
        let winding = (b - a).perp_dot(c - a);
        let vertices = if winding < 0.0 { [a, c, b] } else { [a, b, c] };
        Shape::Triangle { vertices }
    }

    pub fn quarter_circle(radius: f64) -> Self {
        Self::quarter_circle_at(DVec2::ZERO, radius)
    }

    pub fn quarter_circle_at(corner: DVec2, radius: f64) -> Self {
        Shape::QuarterCircle { corner, radius }
    }

    /// Local polygon vertices in counter-clockwise order. Empty for circles.
    ///
    /// For a quarter circle these are the corner and the two arc end points.
    pub fn local_vertices(&self) -> Vec<DVec2> {
        match self {
            Shape::Circle { .. } => Vec::new(),
            Shape::Rectangle {
                center,
                half_extents: h,
            } => vec![
                *center + DVec2::new(-h.x, -h.y),
                *center + DVec2::new(h.x, -h.y),
                *center + DVec2::new(h.x, h.y),
                *center + DVec2::new(-h.x, h.y),
            ],
            Shape::Triangle { vertices } => vertices.to_vec(),
            Shape::QuarterCircle { corner, radius } => vec![
                *corner,
                *corner + DVec2::X * *radius,
                *corner + DVec2::Y * *radius,
            ],
        }
    }

    /// World-space vertices under `transform`.
    pub fn world_vertices(&self, transform: &Transform) -> Vec<DVec2> {
        self.local_vertices()
            .into_iter()
            .map(|v| transform.transform_point(v))
            .collect()
    }

    /// Local centroid.
    pub fn local_center(&self) -> DVec2 {
        match self {
            Shape::Circle { center, .. } | Shape::Rectangle { center, .. } => *center,
            Shape::Triangle { vertices } => (vertices[0] + vertices[1] + vertices[2]) / 3.0,
            Shape::QuarterCircle { corner, radius } => {
                *corner + DVec2::ONE * (4.0 * radius / (3.0 * PI))
            }
        }
    }

    /// World-space centroid under `transform`.
    pub fn world_center(&self, transform: &Transform) -> DVec2 {
        transform.transform_point(self.local_center())
    }

    /// Mass properties of the shape filled with material of the given density.
    pub fn create_mass(&self, density: f64) -> Mass {
        match self {
            Shape::Circle { center, radius } => {
                let mass = density * PI * radius * radius;
                Mass::new(*center, mass, 0.5 * mass * radius * radius)
            }
            Shape::Rectangle { .. } | Shape::Triangle { .. } => {
                polygon_mass(&self.local_vertices(), density)
            }
            Shape::QuarterCircle { radius, .. } => {
                let mass = density * 0.25 * PI * radius * radius;
                let offset = 4.0 * radius / (3.0 * PI);
                let inertia_about_corner = 0.5 * mass * radius * radius;
                let inertia = inertia_about_corner - mass * 2.0 * offset * offset;
                Mass::new(self.local_center(), mass, inertia)
            }
        }
    }

    /// World-space bounding box under `transform`.
    pub fn aabb(&self, transform: &Transform) -> Aabb {
        match self {
            Shape::Circle { center, radius } => {
                let c = transform.transform_point(*center);
                Aabb::new(c - DVec2::splat(*radius), c + DVec2::splat(*radius))
            }
            Shape::QuarterCircle { corner, radius } => {
                // The whole disc bounds the quarter under any rotation.
                let c = transform.transform_point(*corner);
                Aabb::new(c - DVec2::splat(*radius), c + DVec2::splat(*radius))
            }
            Shape::Rectangle { .. } | Shape::Triangle { .. } => {
                Aabb::from_points(&self.world_vertices(transform))
            }
        }
    }
}

/// Area-weighted mass of a counter-clockwise polygon.
fn polygon_mass(vertices: &[DVec2], density: f64) -> Mass {
    let count = vertices.len();
    let reference = vertices.iter().copied().sum::<DVec2>() / count as f64;

    let mut area = 0.0;
    let mut centroid = DVec2::ZERO;
    let mut inertia = 0.0;
    for i in 0..count {
        let p1 = vertices[i] - reference;
        let p2 = vertices[(i + 1) % count] - reference;
        let d = p1.perp_dot(p2);
        let triangle_area = 0.5 * d;
        area += triangle_area;
        centroid += (p1 + p2) * (triangle_area / 3.0);
        inertia += d * (p1.dot(p1) + p1.dot(p2) + p2.dot(p2)) / 12.0;
    }

    if area <= f64::EPSILON {
        return Mass::infinite(reference);
    }

    centroid /= area;
    let mass = density * area;
    let inertia = density * inertia - mass * centroid.length_squared();
    Mass::new(centroid + reference, mass, inertia)
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec2,
    pub max: DVec2,
}

impl Aabb {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[DVec2]) -> Self {
        let mut min = DVec2::splat(f64::MAX);
        let mut max = DVec2::splat(f64::MIN);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}
