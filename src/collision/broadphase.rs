use crate::{
    core::{rigidbody::Body, shape::Aabb},
    utils::allocator::{Arena, BodyId},
};

/// Candidate pairing by bounding-box overlap over every pair of bodies.
#[derive(Debug, Default)]
pub struct BroadPhase {
    bounds: Vec<(BodyId, Aabb, bool)>,
}

impl BroadPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate pairs `(a, b)` with `a < b`, skipping pairs of immovable bodies.
    ///
    /// Bodies without shapes never pair. Output is sorted for deterministic
    /// solver order.
    pub fn potential_pairs(&mut self, bodies: &Arena<Body>) -> Vec<(BodyId, BodyId)> {
        self.bounds.clear();
        self.bounds.extend(
            bodies
                .iter()
                .filter_map(|(id, body)| body.aabb().map(|aabb| (id, aabb, body.is_static()))),
        );

        let mut pairs = Vec::new();
        for (i, (id, aabb, fixed)) in self.bounds.iter().enumerate() {
            for (other_id, other_aabb, other_fixed) in &self.bounds[i + 1..] {
                if *fixed && *other_fixed {
                    continue;
                }
                if aabb.overlaps(other_aabb) {
                    pairs.push(if id < other_id {
                        (*id, *other_id)
                    } else {
                        (*other_id, *id)
                    });
                }
            }
        }

        pairs.sort();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shape::Shape;
    use glam::DVec2;

    #[test]
    fn overlapping_bodies_pair_once() {
        let mut bodies = Arena::new();
        let a = bodies.insert(Body::new(Shape::circle(1.0)));
        let b = bodies.insert(Body::new(Shape::circle(1.0)).at(DVec2::new(1.5, 0.0)));
        bodies.insert(Body::new(Shape::circle(1.0)).at(DVec2::new(10.0, 0.0)));

        let pairs = BroadPhase::new().potential_pairs(&bodies);
        assert_eq!(pairs, vec![(a, b)]);
    }

    #[test]
    fn fixed_bodies_never_pair_with_each_other() {
        let mut bodies = Arena::new();
        bodies.insert(Body::fixed(Shape::rectangle(10.0, 1.0)));
        bodies.insert(Body::fixed(Shape::rectangle(1.0, 10.0)));
        assert!(BroadPhase::new().potential_pairs(&bodies).is_empty());
    }

    #[test]
    fn pairs_come_out_sorted_across_calls() {
        let mut bodies = Arena::new();
        let floor = bodies.insert(Body::fixed(Shape::rectangle(40.0, 1.0)));
        let left = bodies.insert(Body::new(Shape::circle(0.5)).at(DVec2::new(-17.0, 0.9)));
        let right = bodies.insert(Body::new(Shape::circle(0.5)).at(DVec2::new(17.0, 0.9)));

        let mut broadphase = BroadPhase::new();
        let expected = vec![(floor, left), (floor, right)];
        assert_eq!(broadphase.potential_pairs(&bodies), expected);
        assert_eq!(broadphase.potential_pairs(&bodies), expected);
    }
}
