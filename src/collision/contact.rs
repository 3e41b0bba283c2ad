use glam::DVec2;

use super::{
    clipping::{clip_edges, Feature},
    narrowphase::{Penetration, SatDetector},
};
use crate::core::{shape::Shape, types::Transform};

/// Identifier shared by point-feature contacts.
const POINT_FEATURE_ID: u32 = u32::MAX;

/// One world-space contact point of a manifold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifoldPoint {
    pub point: DVec2,
    pub depth: f64,
    /// Stable id of the feature pair that produced this point.
    pub id: u32,
}

/// Contact points describing how two shapes touch.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactManifold {
    /// Unit normal from shape1 toward shape2.
    pub normal: DVec2,
    pub points: Vec<ManifoldPoint>,
}

impl ContactManifold {
    /// Runs the narrow phase and builds the manifold for an overlapping pair.
    pub fn between(
        shape1: &Shape,
        transform1: &Transform,
        shape2: &Shape,
        transform2: &Transform,
    ) -> Option<Self> {
        let penetration = SatDetector::detect(shape1, transform1, shape2, transform2)?;
        Self::generate(shape1, transform1, shape2, transform2, &penetration)
    }

    /// Builds one point for curved contacts, or up to two by clipping edges.
    pub fn generate(
        shape1: &Shape,
        transform1: &Transform,
        shape2: &Shape,
        transform2: &Transform,
        penetration: &Penetration,
    ) -> Option<Self> {
        let normal = penetration.normal;
        let feature1 = shape1.feature(normal, transform1);
        let feature2 = shape2.feature(-normal, transform2);

        let single = |point: DVec2| ContactManifold {
            normal,
            points: vec![ManifoldPoint {
                point,
                depth: penetration.depth,
                id: POINT_FEATURE_ID,
            }],
        };

        let (edge1, edge2) = match (feature1, feature2) {
            (Feature::Point(point), _) => return Some(single(point)),
            (_, Feature::Point(point)) => return Some(single(point)),
            (Feature::Edge(edge1), Feature::Edge(edge2)) => (edge1, edge2),
        };

        // The edge whose normal is closer to the penetration normal is the reference.
        let (reference, incident, flipped) = if edge1.normal.dot(normal) >= -edge2.normal.dot(normal)
        {
            (edge1, edge2, false)
        } else {
            (edge2, edge1, true)
        };

        let clipped = clip_edges(&reference, &incident);
        if clipped.is_empty() {
            return Some(single(shape2.support(-normal, transform2)));
        }

        let flip_bit = if flipped { 1 << 31 } else { 0 };
        let points = clipped
            .into_iter()
            .map(|p| ManifoldPoint {
                point: p.point,
                depth: p.depth,
                id: p.id | flip_bit,
            })
            .collect();

        Some(ContactManifold { normal, points })
    }
}
