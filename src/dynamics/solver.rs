use glam::{DMat2, DVec2};
use log::{debug, trace};

use crate::{
    config::{MAX_CONDITION, SolverSettings, WARM_START_RATIO},
    core::{
        constraints::{BlockMatrix, ContactConstraint},
        rigidbody::Body,
    },
    utils::{
        allocator::Arena,
        math::{EPSILON, Vector2Ext, clamp, scalar_cross},
    },
};

/// Sequential-impulse contact solver with warm starting, a two-point block
/// solver, and split position correction.
#[derive(Debug, Clone, Default)]
pub struct SequentialImpulses {
    pub settings: SolverSettings,
}

impl SequentialImpulses {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Prepares every constraint for this step and applies warm-start impulses.
    pub fn initialize(&self, bodies: &mut Arena<Body>, constraints: &mut [ContactConstraint]) {
        for constraint in constraints.iter_mut() {
            if constraint.contacts.is_empty() {
                continue;
            }
            let Some((body1, body2)) = bodies.get2_mut(constraint.body1, constraint.body2) else {
                continue;
            };
            self.prepare(body1, body2, constraint);
        }
    }

    fn prepare(&self, body1: &mut Body, body2: &mut Body, constraint: &mut ContactConstraint) {
        let m1 = *body1.mass();
        let m2 = *body2.mass();
        let inv_mass_sum = m1.inverse_mass + m2.inverse_mass;
        let c1 = body1.world_center();
        let c2 = body2.world_center();
        let n = constraint.normal;
        let t = constraint.tangent;

        for contact in constraint.contacts.iter_mut() {
            contact.r1 = contact.point - c1;
            contact.r2 = contact.point - c2;
            contact.ignored = false;

            let rn1 = contact.r1.cross(n);
            let rn2 = contact.r2.cross(n);
            let k_normal = inv_mass_sum
                + m1.inverse_inertia * rn1 * rn1
                + m2.inverse_inertia * rn2 * rn2;
            contact.mass_n = inverse_or_zero(k_normal);

            let rt1 = contact.r1.cross(t);
            let rt2 = contact.r2.cross(t);
            let k_tangent = inv_mass_sum
                + m1.inverse_inertia * rt1 * rt1
                + m2.inverse_inertia * rt2 * rt2;
            contact.mass_t = inverse_or_zero(k_tangent);

            let vn = relative_velocity(body1, body2, contact.r1, contact.r2).dot(n);
            contact.vb = if vn < -constraint.restitution_velocity {
                -constraint.restitution * vn
            } else {
                0.0
            };
            contact.jp = 0.0;
        }

        constraint.size = constraint.contacts.len();
        constraint.block = None;
        if constraint.contacts.len() == 2 {
            let (a, b) = (&constraint.contacts[0], &constraint.contacts[1]);
            let rn1a = a.r1.cross(n);
            let rn1b = a.r2.cross(n);
            let rn2a = b.r1.cross(n);
            let rn2b = b.r2.cross(n);

            let k00 = inv_mass_sum
                + m1.inverse_inertia * rn1a * rn1a
                + m2.inverse_inertia * rn1b * rn1b;
            let k11 = inv_mass_sum
                + m1.inverse_inertia * rn2a * rn2a
                + m2.inverse_inertia * rn2b * rn2b;
            let k01 = inv_mass_sum
                + m1.inverse_inertia * rn1a * rn2a
                + m2.inverse_inertia * rn1b * rn2b;

            let k = DMat2::from_cols(DVec2::new(k00, k01), DVec2::new(k01, k11));
            let determinant = k.determinant();
            if k00 * k00 < MAX_CONDITION * determinant {
                constraint.block = Some(BlockMatrix {
                    k,
                    inv_k: k.inverse(),
                });
            } else {
                constraint.degrade_to_single();
                debug!(
                    "contact {:?}-{:?} is ill-conditioned, solving one point",
                    constraint.body1, constraint.body2
                );
            }
        }

        for contact in constraint.contacts[..constraint.size].iter_mut() {
            if self.settings.warm_starting {
                contact.jn *= WARM_START_RATIO;
                contact.jt *= WARM_START_RATIO;
                let impulse = n * contact.jn + t * contact.jt;
                apply_impulse(body1, body2, impulse, contact.r1, contact.r2);
            } else {
                contact.jn = 0.0;
                contact.jt = 0.0;
            }
        }
    }

    /// One velocity iteration over every constraint: friction, then normal impulses.
    pub fn solve_velocity_constraints(
        &self,
        bodies: &mut Arena<Body>,
        constraints: &mut [ContactConstraint],
    ) {
        for constraint in constraints.iter_mut() {
            if constraint.size == 0 {
                continue;
            }
            let Some((body1, body2)) = bodies.get2_mut(constraint.body1, constraint.body2) else {
                continue;
            };
            solve_friction(body1, body2, constraint);
            if constraint.size == 1 {
                solve_single_normal(body1, body2, constraint);
            } else {
                solve_block_normal(body1, body2, constraint);
            }
        }
    }

    /// One position iteration; returns true once every contact is within tolerance.
    pub fn solve_position_constraints(
        &self,
        bodies: &mut Arena<Body>,
        constraints: &mut [ContactConstraint],
    ) -> bool {
        let allowed = self.settings.allowed_penetration;
        let mut min_separation: f64 = 0.0;

        for constraint in constraints.iter_mut() {
            if constraint.size == 0 {
                continue;
            }
            let Some((body1, body2)) = bodies.get2_mut(constraint.body1, constraint.body2) else {
                continue;
            };
            let n = constraint.normal;

            for contact in constraint.contacts[..constraint.size].iter_mut() {
                let m1 = *body1.mass();
                let m2 = *body2.mass();
                let c1 = body1.world_center();
                let c2 = body2.world_center();
                let p1 = body1.transform.transform_point(contact.p1);
                let p2 = body2.transform.transform_point(contact.p2);
                let r1 = p1 - c1;
                let r2 = p2 - c2;

                let separation = (p2 - p1).dot(n) - contact.depth;
                min_separation = min_separation.min(separation);

                let correction = self.settings.baumgarte
                    * clamp(
                        separation + allowed,
                        -self.settings.max_linear_correction,
                        0.0,
                    );

                let rn1 = r1.cross(n);
                let rn2 = r2.cross(n);
                let k = m1.inverse_mass
                    + m2.inverse_mass
                    + m1.inverse_inertia * rn1 * rn1
                    + m2.inverse_inertia * rn2 * rn2;
                let lambda = if k > EPSILON { -correction / k } else { 0.0 };

                let previous = contact.jp;
                contact.jp = (previous + lambda).max(0.0);
                let impulse = n * (contact.jp - previous);

                body1.transform.translate(-impulse * m1.inverse_mass);
                body1
                    .transform
                    .rotate_about(-m1.inverse_inertia * r1.cross(impulse), body1.world_center());
                body2.transform.translate(impulse * m2.inverse_mass);
                body2
                    .transform
                    .rotate_about(m2.inverse_inertia * r2.cross(impulse), body2.world_center());
            }
        }

        trace!("position pass: min separation {min_separation:.5}");
        min_separation >= -3.0 * allowed
    }
}

fn inverse_or_zero(value: f64) -> f64 {
    if value > EPSILON { 1.0 / value } else { 0.0 }
}

/// Velocity of body2's contact point relative to body1's.
fn relative_velocity(body1: &Body, body2: &Body, r1: DVec2, r2: DVec2) -> DVec2 {
    let v1 = body1.linear_velocity + scalar_cross(body1.angular_velocity, r1);
    let v2 = body2.linear_velocity + scalar_cross(body2.angular_velocity, r2);
    v2 - v1
}

/// Applies `impulse` to body2 and its opposite to body1.
fn apply_impulse(body1: &mut Body, body2: &mut Body, impulse: DVec2, r1: DVec2, r2: DVec2) {
    let m1 = *body1.mass();
    let m2 = *body2.mass();
    body1.linear_velocity -= impulse * m1.inverse_mass;
    body1.angular_velocity -= m1.inverse_inertia * r1.cross(impulse);
    body2.linear_velocity += impulse * m2.inverse_mass;
    body2.angular_velocity += m2.inverse_inertia * r2.cross(impulse);
}

fn solve_friction(body1: &mut Body, body2: &mut Body, constraint: &mut ContactConstraint) {
    let t = constraint.tangent;
    for contact in constraint.contacts[..constraint.size].iter_mut() {
        let rv = relative_velocity(body1, body2, contact.r1, contact.r2);
        let vt = rv.dot(t) - constraint.tangent_speed;
        let lambda = -contact.mass_t * vt;

        let max_friction = constraint.friction * contact.jn;
        let previous = contact.jt;
        contact.jt = clamp(previous + lambda, -max_friction, max_friction);
        let impulse = t * (contact.jt - previous);
        apply_impulse(body1, body2, impulse, contact.r1, contact.r2);
    }
}

fn solve_single_normal(body1: &mut Body, body2: &mut Body, constraint: &mut ContactConstraint) {
    let n = constraint.normal;
    let contact = &mut constraint.contacts[0];
    let vn = relative_velocity(body1, body2, contact.r1, contact.r2).dot(n);
    let lambda = -contact.mass_n * (vn - contact.vb);

    let previous = contact.jn;
    contact.jn = (previous + lambda).max(0.0);
    let impulse = n * (contact.jn - previous);
    apply_impulse(body1, body2, impulse, contact.r1, contact.r2);
}

fn solve_block_normal(body1: &mut Body, body2: &mut Body, constraint: &mut ContactConstraint) {
    let Some(block) = constraint.block else {
        return;
    };
    let n = constraint.normal;
    let [c1, c2] = match constraint.contacts.as_mut_slice() {
        [first, second, ..] => [first, second],
        _ => return,
    };

    let a = DVec2::new(c1.jn, c2.jn);
    let vn1 = relative_velocity(body1, body2, c1.r1, c1.r2).dot(n);
    let vn2 = relative_velocity(body1, body2, c2.r1, c2.r2).dot(n);
    let b = DVec2::new(vn1 - c1.vb, vn2 - c2.vb) - block.k * a;

    let Some(x) = block_case(&block, c1.mass_n, c2.mass_n, b) else {
        return;
    };

    let d = x - a;
    apply_impulse(body1, body2, n * d.x, c1.r1, c1.r2);
    apply_impulse(body1, body2, n * d.y, c2.r1, c2.r2);
    c1.jn = x.x;
    c2.jn = x.y;
}

/// Finds the accumulated normal impulses of a two-point contact by trying
/// each active set in turn. `b` is the normal velocity with the current
/// impulses taken out.
fn block_case(block: &BlockMatrix, mass_n1: f64, mass_n2: f64, b: DVec2) -> Option<DVec2> {
    // Both points pushing.
    let x = -(block.inv_k * b);
    if x.x >= 0.0 && x.y >= 0.0 {
        return Some(x);
    }

    // Only the first point pushing; the second must be separating.
    let x1 = -mass_n1 * b.x;
    let vn2 = block.k.x_axis.y * x1 + b.y;
    if x1 >= 0.0 && vn2 >= 0.0 {
        return Some(DVec2::new(x1, 0.0));
    }

    // Only the second point pushing.
    let x2 = -mass_n2 * b.y;
    let vn1 = block.k.y_axis.x * x2 + b.x;
    if x2 >= 0.0 && vn1 >= 0.0 {
        return Some(DVec2::new(0.0, x2));
    }

    // Neither pushing; both must be separating.
    if b.x >= 0.0 && b.y >= 0.0 {
        return Some(DVec2::ZERO);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collision::contact::{ContactManifold, ManifoldPoint},
        core::shape::Shape,
    };
    use approx::assert_relative_eq;

    fn manifold(points: &[(f64, f64, f64)]) -> ContactManifold {
        ContactManifold {
            normal: DVec2::Y,
            points: points
                .iter()
                .enumerate()
                .map(|(i, &(x, y, depth))| ManifoldPoint {
                    point: DVec2::new(x, y),
                    depth,
                    id: i as u32,
                })
                .collect(),
        }
    }

    /// Fixed floor with its top face at y = 0.5, and a dynamic body on top.
    fn scene(body: Body, points: &[(f64, f64, f64)]) -> (Arena<Body>, Vec<ContactConstraint>) {
        let mut bodies = Arena::new();
        let floor = bodies.insert(Body::fixed(Shape::rectangle(10.0, 1.0)));
        let top = bodies.insert(body);
        let constraint = {
            let floor_body = bodies.get(floor).expect("floor");
            let top_body = bodies.get(top).expect("top");
            ContactConstraint::new(
                (floor, floor_body, 0),
                (top, top_body, 0),
                &manifold(points),
                1.0,
            )
        };
        (bodies, vec![constraint])
    }

    fn top_body(bodies: &Arena<Body>) -> &Body {
        bodies.iter().nth(1).map(|(_, b)| b).expect("top body")
    }

    #[test]
    fn single_contact_stops_approach() {
        let ball = Body::new(Shape::circle(0.5))
            .at(DVec2::new(0.0, 0.99))
            .with_velocity(DVec2::new(0.0, -0.5), 0.0);
        let (mut bodies, mut constraints) = scene(ball, &[(0.0, 0.49, 0.01)]);
        let solver = SequentialImpulses::default();

        solver.initialize(&mut bodies, &mut constraints);
        solver.solve_velocity_constraints(&mut bodies, &mut constraints);

        assert_relative_eq!(top_body(&bodies).linear_velocity.y, 0.0, epsilon = 1e-12);
        assert!(constraints[0].contacts()[0].jn > 0.0);
    }

    #[test]
    fn fast_impacts_get_restitution_bias() {
        let ball = Body::new(Shape::circle(0.5))
            .at(DVec2::new(0.0, 0.99))
            .with_velocity(DVec2::new(0.0, -4.0), 0.0);
        let (mut bodies, mut constraints) = scene(ball, &[(0.0, 0.49, 0.01)]);
        constraints[0].restitution = 0.5;
        let solver = SequentialImpulses::default();

        solver.initialize(&mut bodies, &mut constraints);
        assert_relative_eq!(constraints[0].contacts()[0].vb, 2.0, epsilon = 1e-12);
        solver.solve_velocity_constraints(&mut bodies, &mut constraints);
        assert_relative_eq!(top_body(&bodies).linear_velocity.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn friction_is_bounded_by_normal_impulse() {
        let crate_box = Body::new(Shape::rectangle(1.0, 1.0))
            .at(DVec2::new(0.0, 0.99))
            .with_velocity(DVec2::new(5.0, -0.3), 0.0);
        let (mut bodies, mut constraints) =
            scene(crate_box, &[(-0.5, 0.49, 0.01), (0.5, 0.49, 0.01)]);
        let solver = SequentialImpulses::default();

        solver.initialize(&mut bodies, &mut constraints);
        for _ in 0..10 {
            // Friction is clamped against the normal impulse entering the pass.
            let normal_before: Vec<f64> =
                constraints[0].active_contacts().iter().map(|c| c.jn).collect();
            solver.solve_velocity_constraints(&mut bodies, &mut constraints);
            let constraint = &constraints[0];
            for (contact, jn_before) in constraint.active_contacts().iter().zip(normal_before) {
                assert!(contact.jn >= 0.0);
                assert!(contact.jt.abs() <= constraint.friction * jn_before + 1e-12);
            }
        }
        assert!(top_body(&bodies).linear_velocity.x < 5.0);
    }

    #[test]
    fn negative_friction_and_unvalidated_settings_do_not_panic() {
        let crate_box = Body::new(Shape::rectangle(1.0, 1.0))
            .at(DVec2::new(0.0, 0.99))
            .with_velocity(DVec2::new(2.0, -0.5), 0.0);
        let (mut bodies, mut constraints) =
            scene(crate_box, &[(-0.5, 0.49, 0.01), (0.5, 0.49, 0.01)]);
        constraints[0].friction = -0.3;
        let solver = SequentialImpulses::new(SolverSettings {
            max_linear_correction: -0.2,
            ..SolverSettings::default()
        });

        solver.initialize(&mut bodies, &mut constraints);
        solver.solve_velocity_constraints(&mut bodies, &mut constraints);
        solver.solve_position_constraints(&mut bodies, &mut constraints);
        assert!(top_body(&bodies).linear_velocity.is_finite());
    }

    #[test]
    fn conveyor_surface_drags_the_box_along() {
        let crate_box = Body::new(Shape::rectangle(1.0, 1.0))
            .at(DVec2::new(0.0, 0.99))
            .with_velocity(DVec2::new(0.0, -1.0), 0.0);
        let (mut bodies, mut constraints) =
            scene(crate_box, &[(-0.5, 0.49, 0.01), (0.5, 0.49, 0.01)]);
        // The tangent is -x for an upward normal, so positive speed pulls toward -x.
        constraints[0] = constraints[0].clone().with_tangent_speed(2.0);
        let solver = SequentialImpulses::default();

        solver.initialize(&mut bodies, &mut constraints);
        for _ in 0..10 {
            solver.solve_velocity_constraints(&mut bodies, &mut constraints);
        }
        assert!(top_body(&bodies).linear_velocity.x < 0.0);
    }

    #[test]
    fn flat_box_uses_block_solver_and_lands_evenly() {
        let crate_box = Body::new(Shape::rectangle(1.0, 1.0))
            .at(DVec2::new(0.0, 0.99))
            .with_velocity(DVec2::new(0.0, -0.5), 0.0);
        let (mut bodies, mut constraints) =
            scene(crate_box, &[(-0.5, 0.49, 0.01), (0.5, 0.49, 0.01)]);
        let solver = SequentialImpulses::default();

        solver.initialize(&mut bodies, &mut constraints);
        assert!(constraints[0].block().is_some());
        solver.solve_velocity_constraints(&mut bodies, &mut constraints);

        let body = top_body(&bodies);
        assert_relative_eq!(body.linear_velocity.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(body.angular_velocity, 0.0, epsilon = 1e-12);
        let contacts = constraints[0].contacts();
        assert_relative_eq!(contacts[0].jn, contacts[1].jn, epsilon = 1e-12);
    }

    #[test]
    fn nearly_coincident_points_degrade_to_the_deeper_one() {
        let crate_box = Body::new(Shape::rectangle(1.0, 1.0)).at(DVec2::new(0.0, 0.99));
        let (mut bodies, mut constraints) =
            scene(crate_box, &[(0.0, 0.49, 0.01), (1.0e-7, 0.48, 0.02)]);
        let solver = SequentialImpulses::default();

        solver.initialize(&mut bodies, &mut constraints);
        let constraint = &constraints[0];
        assert_eq!(constraint.size(), 1);
        assert!(constraint.block().is_none());
        assert_relative_eq!(constraint.active_contacts()[0].depth, 0.02);
        assert!(constraint.contacts()[1].ignored);
    }

    #[test]
    fn block_cases_pick_the_consistent_active_set() {
        let k = DMat2::from_cols(DVec2::new(2.0, 0.5), DVec2::new(0.5, 2.0));
        let block = BlockMatrix {
            k,
            inv_k: k.inverse(),
        };
        // Both approaching: both push.
        let x = block_case(&block, 0.5, 0.5, DVec2::new(-1.0, -1.0)).expect("solvable");
        assert!(x.x > 0.0 && x.y > 0.0);
        // First approaching, second separating fast: only the first pushes.
        let x = block_case(&block, 0.5, 0.5, DVec2::new(-1.0, 3.0)).expect("solvable");
        assert_relative_eq!(x.x, 0.5);
        assert_eq!(x.y, 0.0);
        // Second approaching, first separating fast: only the second pushes.
        let x = block_case(&block, 0.5, 0.5, DVec2::new(3.0, -1.0)).expect("solvable");
        assert_eq!(x.x, 0.0);
        assert_relative_eq!(x.y, 0.5);
        // Both separating.
        let x = block_case(&block, 0.5, 0.5, DVec2::new(1.0, 1.0)).expect("solvable");
        assert_eq!(x, DVec2::ZERO);
    }

    fn indefinite_block(off_diagonal: f64) -> BlockMatrix {
        let k = DMat2::from_cols(
            DVec2::new(1.0, off_diagonal),
            DVec2::new(off_diagonal, 1.0),
        );
        BlockMatrix {
            k,
            inv_k: k.inverse(),
        }
    }

    #[test]
    fn block_cases_are_tried_in_order() {
        // Both the coupled and the first-only set are consistent here; the coupled one wins.
        let block = indefinite_block(2.0);
        let x = block_case(&block, 1.0, 1.0, DVec2::new(-1.0, -1.0)).expect("solvable");
        assert_relative_eq!(x.x, 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(x.y, 1.0 / 3.0, epsilon = 1e-12);

        let first_only = 1.0;
        let second_velocity = block.k.x_axis.y * first_only - 1.0;
        assert!(second_velocity >= 0.0);
    }

    #[test]
    fn block_without_a_consistent_set_applies_nothing() {
        let block = indefinite_block(-2.0);
        assert!(block_case(&block, 1.0, 1.0, DVec2::new(-1.0, -1.0)).is_none());

        let crate_box = Body::new(Shape::rectangle(1.0, 1.0))
            .at(DVec2::new(0.0, 0.99))
            .with_velocity(DVec2::new(0.0, -1.0), 0.0);
        let (mut bodies, mut constraints) =
            scene(crate_box, &[(-0.5, 0.49, 0.01), (0.5, 0.49, 0.01)]);
        let solver = SequentialImpulses::default();
        solver.initialize(&mut bodies, &mut constraints);
        constraints[0].friction = 0.0;
        constraints[0].block = Some(block);

        solver.solve_velocity_constraints(&mut bodies, &mut constraints);

        let body = top_body(&bodies);
        assert_eq!(body.linear_velocity, DVec2::new(0.0, -1.0));
        assert_eq!(body.angular_velocity, 0.0);
        for contact in constraints[0].contacts() {
            assert_eq!(contact.jn, 0.0);
        }
    }

    #[test]
    fn warm_start_applies_cached_impulses() {
        let ball = Body::new(Shape::circle(0.5)).at(DVec2::new(0.0, 0.99));
        let (mut bodies, mut constraints) = scene(ball, &[(0.0, 0.49, 0.01)]);
        constraints[0].contacts[0].jn = 2.0;
        let mass = top_body(&bodies).mass().mass;
        SequentialImpulses::default().initialize(&mut bodies, &mut constraints);
        assert_relative_eq!(top_body(&bodies).linear_velocity.y, 2.0 / mass, epsilon = 1e-12);

        let ball = Body::new(Shape::circle(0.5)).at(DVec2::new(0.0, 0.99));
        let (mut bodies, mut constraints) = scene(ball, &[(0.0, 0.49, 0.01)]);
        constraints[0].contacts[0].jn = 2.0;
        let solver = SequentialImpulses::new(SolverSettings {
            warm_starting: false,
            ..SolverSettings::default()
        });
        solver.initialize(&mut bodies, &mut constraints);
        assert_eq!(top_body(&bodies).linear_velocity.y, 0.0);
        assert_eq!(constraints[0].contacts()[0].jn, 0.0);
    }

    #[test]
    fn position_solve_pushes_bodies_apart_until_converged() {
        let crate_box = Body::new(Shape::rectangle(1.0, 1.0)).at(DVec2::new(0.0, 0.9));
        let (mut bodies, mut constraints) =
            scene(crate_box, &[(-0.5, 0.4, 0.1), (0.5, 0.4, 0.1)]);
        let solver = SequentialImpulses::default();
        solver.initialize(&mut bodies, &mut constraints);

        let velocity_before = top_body(&bodies).linear_velocity;
        assert!(!solver.solve_position_constraints(&mut bodies, &mut constraints));
        assert!(top_body(&bodies).transform.position.y > 0.9);
        assert_eq!(top_body(&bodies).linear_velocity, velocity_before);

        let converged =
            (0..50).any(|_| solver.solve_position_constraints(&mut bodies, &mut constraints));
        assert!(converged);
        for contact in constraints[0].active_contacts() {
            assert!(contact.jp >= 0.0);
        }
    }

    #[test]
    fn empty_batches_are_no_ops() {
        let mut bodies: Arena<Body> = Arena::new();
        let solver = SequentialImpulses::default();
        solver.initialize(&mut bodies, &mut []);
        solver.solve_velocity_constraints(&mut bodies, &mut []);
        assert!(solver.solve_position_constraints(&mut bodies, &mut []));
    }
}
