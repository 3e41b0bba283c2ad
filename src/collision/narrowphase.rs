use glam::DVec2;

use crate::core::{shape::Shape, types::Transform};

/// Overlap of two shapes: unit normal from shape1 toward shape2, and depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    pub normal: DVec2,
    pub depth: f64,
}

/// Closed-form circle-circle test.
pub struct CircleDetector;

impl CircleDetector {
    pub fn detect(
        center1: DVec2,
        radius1: f64,
        center2: DVec2,
        radius2: f64,
    ) -> Option<Penetration> {
        let between = center2 - center1;
        let radii = radius1 + radius2;
        let distance_squared = between.length_squared();
        if distance_squared >= radii * radii {
            return None;
        }

        let distance = distance_squared.sqrt();
        // Concentric circles have no preferred direction.
        let normal = between.try_normalize().unwrap_or(DVec2::X);
        Some(Penetration {
            normal,
            depth: radii - distance,
        })
    }
}

/// Separating axis test for any pair of convex primitives.
pub struct SatDetector;

impl SatDetector {
    pub fn detect(
        shape1: &Shape,
        transform1: &Transform,
        shape2: &Shape,
        transform2: &Transform,
    ) -> Option<Penetration> {
        if let (
            Shape::Circle {
                center: c1,
                radius: r1,
            },
            Shape::Circle {
                center: c2,
                radius: r2,
            },
        ) = (shape1, shape2)
        {
            return CircleDetector::detect(
                transform1.transform_point(*c1),
                *r1,
                transform2.transform_point(*c2),
                *r2,
            );
        }

        let foci1 = shape1.foci(transform1);
        let foci2 = shape2.foci(transform2);
        let axes1 = shape1.axes(&foci2, transform1);
        let axes2 = shape2.axes(&foci1, transform2);

        let mut best: Option<(DVec2, f64)> = None;

        for axis in axes1.into_iter().chain(axes2) {
            if axis == DVec2::ZERO {
                continue;
            }

            let interval1 = shape1.project(axis, transform1);
            let interval2 = shape2.project(axis, transform2);
            if !interval1.overlaps(&interval2) {
                return None;
            }

            let mut axis = axis;
            let mut overlap = interval1.overlap(&interval2);
            if interval1.contains_exclusive(&interval2) || interval2.contains_exclusive(&interval1)
            {
                // The contained shape escapes through whichever end is closer.
                let max_gap = (interval1.max - interval2.max).abs();
                let min_gap = (interval1.min - interval2.min).abs();
                if max_gap > min_gap {
                    axis = -axis;
                    overlap += min_gap;
                } else {
                    overlap += max_gap;
                }
            }

            if best.is_none_or(|(_, min_overlap)| overlap < min_overlap) {
                best = Some((axis, overlap));
            }
        }

        let (mut normal, depth) = best?;
        let between = shape2.world_center(transform2) - shape1.world_center(transform1);
        if between.dot(normal) < 0.0 {
            normal = -normal;
        }

        Some(Penetration { normal, depth })
    }
}
