//! Separating-axis geometry for the convex primitives: candidate axes, foci,
//! and 1-D projections.

use glam::DVec2;

use crate::core::{shape::Shape, types::Transform};

/// Closed interval of a shape projected onto an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        !(self.min > other.max || other.min > self.max)
    }

    /// Length of the shared part; zero when the intervals are disjoint.
    pub fn overlap(&self, other: &Interval) -> f64 {
        if self.overlaps(other) {
            self.max.min(other.max) - self.min.max(other.min)
        } else {
            0.0
        }
    }

    /// True when `other` lies strictly inside `self`.
    pub fn contains_exclusive(&self, other: &Interval) -> bool {
        other.min > self.min && other.max < self.max
    }
}

impl Shape {
    /// Reference points other shapes aim extra axes at, in world space.
    ///
    /// Curved shapes have no finite set of face normals, so the partner shape
    /// tests the direction from its nearest vertex toward these points.
    pub fn foci(&self, transform: &Transform) -> Vec<DVec2> {
        match self {
            Shape::Circle { center, .. } => vec![transform.transform_point(*center)],
            Shape::QuarterCircle { corner, .. } => vec![transform.transform_point(*corner)],
            Shape::Rectangle { .. } | Shape::Triangle { .. } => Vec::new(),
        }
    }

    /// Candidate separating axes (unit or zero length) in world space.
    pub fn axes(&self, foci: &[DVec2], transform: &Transform) -> Vec<DVec2> {
        match self {
            Shape::Circle { center, .. } => {
                let c = transform.transform_point(*center);
                foci.iter()
                    .map(|focus| (*focus - c).normalize_or_zero())
                    .collect()
            }
            Shape::Rectangle { .. } | Shape::Triangle { .. } => {
                let vertices = self.world_vertices(transform);
                let mut axes = edge_normals(&vertices);
                axes.extend(foci.iter().map(|focus| nearest_vertex_axis(&vertices, *focus)));
                axes
            }
            Shape::QuarterCircle { corner, .. } => {
                let c = transform.transform_point(*corner);
                let vertices = self.world_vertices(transform);
                // Only the two straight edges have face normals; the arc is
                // covered by the focus axes.
                let mut axes = vec![
                    transform.transform_vector(-DVec2::Y),
                    transform.transform_vector(-DVec2::X),
                ];
                for focus in foci {
                    axes.push((*focus - c).normalize_or_zero());
                    axes.push(nearest_vertex_axis(&vertices, *focus));
                }
                axes
            }
        }
    }

    /// Projects the shape onto a unit `axis`.
    pub fn project(&self, axis: DVec2, transform: &Transform) -> Interval {
        match self {
            Shape::Circle { center, radius } => {
                let c = transform.transform_point(*center).dot(axis);
                Interval::new(c - radius, c + radius)
            }
            _ => {
                let max = self.support(axis, transform).dot(axis);
                let min = self.support(-axis, transform).dot(axis);
                Interval::new(min, max)
            }
        }
    }

    /// Farthest world point of the shape along `direction`.
    pub fn support(&self, direction: DVec2, transform: &Transform) -> DVec2 {
        match self {
            Shape::Circle { center, radius } => {
                transform.transform_point(*center) + direction.normalize_or_zero() * *radius
            }
            Shape::QuarterCircle { corner, radius } => {
                let local = transform.inverse_transform_vector(direction);
                if arc_faces(local) {
                    transform.transform_point(*corner + local.normalize_or_zero() * *radius)
                } else {
                    farthest(&self.world_vertices(transform), direction)
                }
            }
            Shape::Rectangle { .. } | Shape::Triangle { .. } => {
                farthest(&self.world_vertices(transform), direction)
            }
        }
    }
}

/// True when a local direction points into the quarter circle's arc span.
pub(crate) fn arc_faces(local_direction: DVec2) -> bool {
    local_direction.x > 0.0 && local_direction.y > 0.0
}

/// Outward unit normals of a counter-clockwise polygon's edges.
pub(crate) fn edge_normals(vertices: &[DVec2]) -> Vec<DVec2> {
    let count = vertices.len();
    (0..count)
        .map(|i| {
            let edge = vertices[(i + 1) % count] - vertices[i];
            DVec2::new(edge.y, -edge.x).normalize_or_zero()
        })
        .collect()
}

fn nearest_vertex_axis(vertices: &[DVec2], focus: DVec2) -> DVec2 {
    vertices
        .iter()
        .min_by(|a, b| a.distance_squared(focus).total_cmp(&b.distance_squared(focus)))
        .map(|v| (focus - *v).normalize_or_zero())
        .unwrap_or(DVec2::ZERO)
}

fn farthest(vertices: &[DVec2], direction: DVec2) -> DVec2 {
    vertices
        .iter()
        .copied()
        .max_by(|a, b| a.dot(direction).total_cmp(&b.dot(direction)))
        .unwrap_or(DVec2::ZERO)
}
