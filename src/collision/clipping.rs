//! Contact feature selection and reference/incident edge clipping.

use glam::DVec2;

use super::shapes::{arc_faces, edge_normals};
use crate::{
    core::{shape::Shape, types::Transform},
    utils::math::EPSILON,
};

/// Straight edge of a shape in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: DVec2,
    pub b: DVec2,
    /// Outward unit normal.
    pub normal: DVec2,
    pub index: u32,
}

/// The part of a shape that is farthest along a direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feature {
    Point(DVec2),
    Edge(Edge),
}

impl Shape {
    /// Farthest feature of the shape along `direction`.
    pub fn feature(&self, direction: DVec2, transform: &Transform) -> Feature {
        match self {
            Shape::Circle { .. } => Feature::Point(self.support(direction, transform)),
            Shape::QuarterCircle { .. } => {
                let local = transform.inverse_transform_vector(direction);
                if arc_faces(local) {
                    return Feature::Point(self.support(direction, transform));
                }
                let v = self.world_vertices(transform);
                // Straight edges only; the chord between v[1] and v[2] is the arc.
                let edges = [
                    Edge {
                        a: v[0],
                        b: v[1],
                        normal: transform.transform_vector(-DVec2::Y),
                        index: 0,
                    },
                    Edge {
                        a: v[2],
                        b: v[0],
                        normal: transform.transform_vector(-DVec2::X),
                        index: 2,
                    },
                ];
                let best = if edges[0].normal.dot(direction) >= edges[1].normal.dot(direction) {
                    edges[0]
                } else {
                    edges[1]
                };
                if best.normal.dot(direction) > EPSILON {
                    Feature::Edge(best)
                } else {
                    Feature::Point(self.support(direction, transform))
                }
            }
            Shape::Rectangle { .. } | Shape::Triangle { .. } => {
                let vertices = self.world_vertices(transform);
                polygon_feature(&vertices, direction)
            }
        }
    }
}

fn polygon_feature(vertices: &[DVec2], direction: DVec2) -> Feature {
    let count = vertices.len();
    let normals = edge_normals(vertices);
    let farthest = (0..count)
        .max_by(|&i, &j| vertices[i].dot(direction).total_cmp(&vertices[j].dot(direction)))
        .unwrap_or(0);

    // The two edges meeting at the farthest vertex; keep the one facing `direction`.
    let previous = (farthest + count - 1) % count;
    let index = if normals[previous].dot(direction) > normals[farthest].dot(direction) {
        previous
    } else {
        farthest
    };

    Feature::Edge(Edge {
        a: vertices[index],
        b: vertices[(index + 1) % count],
        normal: normals[index],
        index: index as u32,
    })
}

/// Half-plane `normal · p <= distance`.
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: DVec2,
    distance: f64,
}

impl Plane {
    fn from_point_normal(point: DVec2, normal: DVec2) -> Self {
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    fn signed_distance(&self, point: DVec2) -> f64 {
        self.normal.dot(point) - self.distance
    }
}

/// A clipped point tagged with the incident vertex slot it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPoint {
    pub point: DVec2,
    pub depth: f64,
    pub id: u32,
}

fn clip_segment(points: &[(DVec2, u32)], plane: Plane) -> Vec<(DVec2, u32)> {
    let [(p0, id0), (p1, id1)] = match points {
        [first, second] => [*first, *second],
        _ => return points.to_vec(),
    };

    let d0 = plane.signed_distance(p0);
    let d1 = plane.signed_distance(p1);

    let mut clipped = Vec::with_capacity(2);
    if d0 <= 0.0 {
        clipped.push((p0, id0));
    }
    if d1 <= 0.0 {
        clipped.push((p1, id1));
    }
    if d0 * d1 < 0.0 {
        let t = d0 / (d0 - d1);
        let id = if d0 > 0.0 { id0 } else { id1 };
        clipped.push((p0 + (p1 - p0) * t, id));
    }
    clipped
}

/// Clips the incident edge against the reference edge's side planes and
/// keeps the points lying behind the reference face.
///
/// Returns at most two points with their depth behind the reference face.
pub fn clip_edges(reference: &Edge, incident: &Edge) -> Vec<ClipPoint> {
    let tangent = (reference.b - reference.a).normalize_or_zero();
    if tangent == DVec2::ZERO {
        return Vec::new();
    }

    let base_id = (reference.index << 8) | (incident.index << 2);
    let points = [(incident.a, base_id), (incident.b, base_id | 1)];

    let side_planes = [
        Plane::from_point_normal(reference.a, -tangent),
        Plane::from_point_normal(reference.b, tangent),
    ];

    let mut clipped = points.to_vec();
    for plane in side_planes {
        clipped = clip_segment(&clipped, plane);
        if clipped.len() < 2 {
            return Vec::new();
        }
    }

    let face = Plane::from_point_normal(reference.a, reference.normal);
    clipped
        .into_iter()
        .filter_map(|(point, id)| {
            let depth = -face.signed_distance(point);
            (depth >= 0.0).then_some(ClipPoint { point, depth, id })
        })
        .collect()
}
