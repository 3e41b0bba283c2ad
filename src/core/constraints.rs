use glam::{DMat2, DVec2};

use super::rigidbody::Body;
use crate::{collision::contact::ContactManifold, utils::allocator::BodyId};

/// One contact point of a [`ContactConstraint`] with its solver state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolvableContact {
    /// Feature id used to re-associate contacts across steps.
    pub id: u32,
    /// World contact point at construction time.
    pub point: DVec2,
    /// The contact point in body1's local frame.
    pub p1: DVec2,
    /// The contact point in body2's local frame.
    pub p2: DVec2,
    pub depth: f64,
    /// Arm from body1's center of mass to the contact point.
    pub r1: DVec2,
    /// Arm from body2's center of mass to the contact point.
    pub r2: DVec2,
    /// Accumulated normal impulse.
    pub jn: f64,
    /// Accumulated tangential impulse.
    pub jt: f64,
    /// Accumulated position impulse.
    pub jp: f64,
    pub mass_n: f64,
    pub mass_t: f64,
    /// Velocity bias from restitution.
    pub vb: f64,
    pub ignored: bool,
}

impl SolvableContact {
    pub fn new(id: u32, point: DVec2, depth: f64, body1: &Body, body2: &Body) -> Self {
        Self {
            id,
            point,
            p1: body1.transform.inverse_transform_point(point),
            p2: body2.transform.inverse_transform_point(point),
            depth,
            r1: DVec2::ZERO,
            r2: DVec2::ZERO,
            jn: 0.0,
            jt: 0.0,
            jp: 0.0,
            mass_n: 0.0,
            mass_t: 0.0,
            vb: 0.0,
            ignored: false,
        }
    }
}

/// Coupling matrix of a well-conditioned two-point constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockMatrix {
    pub k: DMat2,
    pub inv_k: DMat2,
}

/// Contact between two bodies with up to two points.
///
/// The normal points from body1 to body2; the tangent is the normal rotated
/// a quarter turn counter-clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactConstraint {
    pub body1: BodyId,
    pub body2: BodyId,
    pub shape1: usize,
    pub shape2: usize,
    pub normal: DVec2,
    pub tangent: DVec2,
    pub friction: f64,
    pub restitution: f64,
    /// Closing speed below which restitution is ignored.
    pub restitution_velocity: f64,
    /// Surface speed along the tangent, e.g. a conveyor.
    pub tangent_speed: f64,
    pub(crate) contacts: Vec<SolvableContact>,
    pub(crate) size: usize,
    pub(crate) block: Option<BlockMatrix>,
}

impl ContactConstraint {
    pub fn new(
        (id1, body1, shape1): (BodyId, &Body, usize),
        (id2, body2, shape2): (BodyId, &Body, usize),
        manifold: &ContactManifold,
        restitution_velocity: f64,
    ) -> Self {
        let material = body1.material.combine_with(&body2.material);
        let contacts: Vec<SolvableContact> = manifold
            .points
            .iter()
            .take(2)
            .map(|p| SolvableContact::new(p.id, p.point, p.depth, body1, body2))
            .collect();

        Self {
            body1: id1,
            body2: id2,
            shape1,
            shape2,
            normal: manifold.normal,
            tangent: manifold.normal.perp(),
            friction: material.friction,
            restitution: material.restitution,
            restitution_velocity,
            tangent_speed: 0.0,
            size: contacts.len(),
            contacts,
            block: None,
        }
    }

    /// Number of contacts taking part in the solve.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Every contact, including ones ignored after degradation.
    pub fn contacts(&self) -> &[SolvableContact] {
        &self.contacts
    }

    pub fn active_contacts(&self) -> &[SolvableContact] {
        &self.contacts[..self.size]
    }

    pub fn block(&self) -> Option<&BlockMatrix> {
        self.block.as_ref()
    }

    pub fn with_tangent_speed(mut self, tangent_speed: f64) -> Self {
        self.tangent_speed = tangent_speed;
        self
    }

    /// True when both constraints join the same pair of shapes.
    pub fn same_pair(&self, other: &ContactConstraint) -> bool {
        self.body1 == other.body1
            && self.body2 == other.body2
            && self.shape1 == other.shape1
            && self.shape2 == other.shape2
    }

    /// Seeds accumulated impulses from the previous step's constraint.
    ///
    /// A contact matches a previous one with the same feature id, or else the
    /// nearest previous point within `max_distance`.
    pub fn warm_start_from(&mut self, previous: &ContactConstraint, max_distance: f64) {
        if !self.same_pair(previous) {
            return;
        }
        let max_distance_squared = max_distance * max_distance;
        for contact in &mut self.contacts {
            let by_id = previous.contacts.iter().find(|old| old.id == contact.id);
            let matched = by_id.or_else(|| {
                previous
                    .contacts
                    .iter()
                    .filter(|old| old.point.distance_squared(contact.point) < max_distance_squared)
                    .min_by(|a, b| {
                        a.point
                            .distance_squared(contact.point)
                            .total_cmp(&b.point.distance_squared(contact.point))
                    })
            });
            if let Some(old) = matched {
                contact.jn = old.jn;
                contact.jt = old.jt;
            }
        }
    }

    /// Drops to a single active contact, keeping the deeper one first.
    pub(crate) fn degrade_to_single(&mut self) {
        if self.contacts.len() < 2 {
            return;
        }
        if self.contacts[0].depth < self.contacts[1].depth {
            self.contacts.swap(0, 1);
        }
        self.contacts[1].ignored = true;
        self.size = 1;
        self.block = None;
    }
}
