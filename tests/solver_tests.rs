use approx::assert_relative_eq;
use pinball_dynamics::*;

/// Builds a constraint for each overlapping pair, in order.
fn constraints_for(bodies: &Arena<Body>, pairs: &[(BodyId, BodyId)]) -> Vec<ContactConstraint> {
    pairs
        .iter()
        .map(|&(id1, id2)| {
            let body1 = bodies.get(id1).expect("body1");
            let body2 = bodies.get(id2).expect("body2");
            let manifold = ContactManifold::between(
                &body1.shapes()[0],
                &body1.transform,
                &body2.shapes()[0],
                &body2.transform,
            )
            .expect("bodies overlap");
            ContactConstraint::new((id1, body1, 0), (id2, body2, 0), &manifold, 1.0)
        })
        .collect()
}

/// Largest approaching normal speed over all active contacts.
fn max_violation(bodies: &Arena<Body>, constraints: &[ContactConstraint]) -> f64 {
    constraints
        .iter()
        .flat_map(|constraint| {
            let body1 = bodies.get(constraint.body1).expect("body1");
            let body2 = bodies.get(constraint.body2).expect("body2");
            constraint.active_contacts().iter().map(move |contact| {
                let relative = body2.velocity_at(contact.point) - body1.velocity_at(contact.point);
                (-relative.dot(constraint.normal)).max(0.0)
            })
        })
        .fold(0.0, f64::max)
}

#[test]
fn warm_starting_shrinks_violation_step_over_step() {
    let mut bodies = Arena::new();
    let floor = bodies.insert(Body::fixed(Shape::rectangle(10.0, 1.0)));
    let lower = bodies.insert(Body::new(Shape::circle(0.5)).at(DVec2::new(0.0, 0.99)));
    let upper = bodies.insert(Body::new(Shape::circle(0.5)).at(DVec2::new(0.0, 1.98)));
    let mut constraints = constraints_for(&bodies, &[(floor, lower), (lower, upper)]);

    let solver = SequentialImpulses::new(SolverSettings {
        velocity_iterations: 1,
        ..SolverSettings::default()
    });

    let mut violations = Vec::new();
    for _ in 0..6 {
        for id in [lower, upper] {
            let body = bodies.get_mut(id).expect("ball");
            body.linear_velocity = DVec2::new(0.0, -0.2);
            body.angular_velocity = 0.0;
        }
        solver.initialize(&mut bodies, &mut constraints);
        solver.solve_velocity_constraints(&mut bodies, &mut constraints);
        violations.push(max_violation(&bodies, &constraints));
    }

    for pair in violations.windows(2) {
        assert!(pair[1] < pair[0], "violations: {violations:?}");
    }
    assert_relative_eq!(violations[0], 0.1, epsilon = 1e-9);
    assert!(violations[5] < 0.01);
}

#[test]
fn impulses_stay_within_their_cones() {
    let mut bodies = Arena::new();
    let grippy = Material::default().with_friction(0.3);
    let floor = bodies.insert(Body::fixed(Shape::rectangle(10.0, 1.0)).with_material(grippy));
    let sliding = bodies.insert(
        Body::new(Shape::rectangle(1.0, 1.0))
            .at(DVec2::new(0.0, 0.98))
            .with_velocity(DVec2::new(3.0, -2.0), 1.5),
    );
    let mut constraints = constraints_for(&bodies, &[(floor, sliding)]);
    let solver = SequentialImpulses::default();

    solver.initialize(&mut bodies, &mut constraints);
    for _ in 0..solver.settings.velocity_iterations {
        // The friction bound uses the normal impulse accumulated before the pass.
        let normal_before: Vec<Vec<f64>> = constraints
            .iter()
            .map(|c| c.active_contacts().iter().map(|p| p.jn).collect())
            .collect();
        solver.solve_velocity_constraints(&mut bodies, &mut constraints);
        for (constraint, jn_before) in constraints.iter().zip(&normal_before) {
            for (contact, jn_before) in constraint.active_contacts().iter().zip(jn_before) {
                assert!(contact.jn >= 0.0);
                assert!(contact.jt.abs() <= constraint.friction * jn_before + 1e-12);
            }
        }
    }
}

#[test]
fn separating_contacts_receive_no_impulse() {
    let mut bodies = Arena::new();
    let floor = bodies.insert(Body::fixed(Shape::rectangle(10.0, 1.0)));
    let rising = bodies.insert(
        Body::new(Shape::rectangle(1.0, 1.0))
            .at(DVec2::new(0.0, 0.98))
            .with_velocity(DVec2::new(0.0, 2.0), 0.0),
    );
    let mut constraints = constraints_for(&bodies, &[(floor, rising)]);
    let solver = SequentialImpulses::default();

    solver.initialize(&mut bodies, &mut constraints);
    solver.solve_velocity_constraints(&mut bodies, &mut constraints);

    for contact in constraints[0].active_contacts() {
        assert_eq!(contact.jn, 0.0);
    }
    let body = bodies.get(rising).expect("box");
    assert_relative_eq!(body.linear_velocity.y, 2.0, epsilon = 1e-12);
}

#[test]
fn position_solve_reports_deep_overlap_then_converges() {
    let mut bodies = Arena::new();
    let floor = bodies.insert(Body::fixed(Shape::rectangle(10.0, 1.0)));
    let ball = bodies.insert(Body::new(Shape::circle(0.5)).at(DVec2::new(0.0, 0.7)));
    let mut constraints = constraints_for(&bodies, &[(floor, ball)]);
    let solver = SequentialImpulses::default();
    solver.initialize(&mut bodies, &mut constraints);

    assert!(!solver.solve_position_constraints(&mut bodies, &mut constraints));

    let mut iterations = 1;
    while !solver.solve_position_constraints(&mut bodies, &mut constraints) {
        iterations += 1;
        assert!(iterations < 100, "position solve did not converge");
    }
    let y = bodies.get(ball).expect("ball").transform.position.y;
    assert!(y >= 1.0 - 3.0 * solver.settings.allowed_penetration - 1e-9);
}

#[test]
fn ill_conditioned_pair_keeps_the_deeper_point() {
    let mut bodies = Arena::new();
    let floor = bodies.insert(Body::fixed(Shape::rectangle(10.0, 1.0)));
    let crate_box =
        bodies.insert(Body::new(Shape::rectangle(1.0, 1.0)).at(DVec2::new(0.0, 0.98)));
    let manifold = ContactManifold {
        normal: DVec2::Y,
        points: vec![
            ManifoldPoint {
                point: DVec2::new(0.0, 0.48),
                depth: 0.02,
                id: 1,
            },
            ManifoldPoint {
                point: DVec2::new(1.0e-8, 0.47),
                depth: 0.03,
                id: 2,
            },
        ],
    };
    let mut constraints = {
        let body1 = bodies.get(floor).expect("floor");
        let body2 = bodies.get(crate_box).expect("box");
        vec![ContactConstraint::new(
            (floor, body1, 0),
            (crate_box, body2, 0),
            &manifold,
            1.0,
        )]
    };

    SequentialImpulses::default().initialize(&mut bodies, &mut constraints);

    let constraint = &constraints[0];
    assert_eq!(constraint.size(), 1);
    assert_eq!(constraint.active_contacts()[0].id, 2);
    assert!(constraint.contacts().iter().any(|c| c.ignored));
}
