use glam::DVec2;

/// How long a queued force keeps acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForceLifetime {
    /// Applied during the next step only.
    #[default]
    Once,
    /// Applied every step until the body's force list is cleared.
    Persistent,
}

/// External force queued on a body, optionally applied off-center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Force {
    pub value: DVec2,
    /// World point of application; `None` acts at the center of mass.
    pub point: Option<DVec2>,
    pub lifetime: ForceLifetime,
}

impl Force {
    pub fn new(value: DVec2) -> Self {
        Self {
            value,
            point: None,
            lifetime: ForceLifetime::Once,
        }
    }

    pub fn at_point(value: DVec2, point: DVec2) -> Self {
        Self {
            value,
            point: Some(point),
            lifetime: ForceLifetime::Once,
        }
    }

    pub fn persistent(mut self) -> Self {
        self.lifetime = ForceLifetime::Persistent;
        self
    }

    /// Torque this force produces about `center`.
    pub fn torque_about(&self, center: DVec2) -> f64 {
        self.point
            .map(|p| (p - center).perp_dot(self.value))
            .unwrap_or(0.0)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.lifetime, ForceLifetime::Once)
    }
}

/// Sums `forces` about `center` and drops the ones that have expired.
pub fn accumulate(forces: &mut Vec<Force>, center: DVec2) -> (DVec2, f64) {
    let mut total = DVec2::ZERO;
    let mut torque = 0.0;
    for force in forces.iter() {
        total += force.value;
        torque += force.torque_about(center);
    }
    forces.retain(|force| !force.is_complete());
    (total, torque)
}
