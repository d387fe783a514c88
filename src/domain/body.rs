// A single point mass and its per-tick rules.

use super::math::{Point, Vector};
use super::tuning::PhysicsTuning;
use std::f64::consts::PI;
use std::fmt;
use std::time::Duration;

/// Identity of a body within one universe. Assigned monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Body {
    pub position: Point,
    pub velocity: Vector,
    /// Immovable; neither exerts nor receives gravity.
    pub is_static: bool,
    pub gravitational_force: Vector,
    /// Caller-supplied force such as player thrust.
    pub additional_force: Vector,
    pub net_force: Vector,
    /// Rank-earned names. Empty until earned, never revoked.
    pub major_name: String,
    pub minor_name: String,

    // Mass is the only independent size variable; radius follows it.
    mass: f64,
    radius: f64,
}

impl Body {
    pub fn new(position: Point, mass: f64) -> Self {
        let mut body = Self {
            position,
            mass: mass.max(0.0),
            ..Self::default()
        };
        body.update_radius();
        body
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn is_depleted(&self) -> bool {
        self.mass <= 0.0
    }

    /// Integrates one tick of motion.
    ///
    /// # Panics
    ///
    /// Panics when called on a non-static body with zero mass; such bodies must be removed
    /// before integration.
    pub fn step(&mut self, dt: Duration) {
        let dt = dt.as_secs_f64();
        self.update_radius();
        self.net_force = self.gravitational_force + self.additional_force;

        if self.is_static {
            return;
        }
        if self.mass == 0.0 {
            panic!("step called on zero-mass body");
        }
        self.velocity = self.velocity + self.net_force.scale(dt / self.mass);
        self.position = self.position.offset(self.velocity, dt);
    }

    /// In-bounds decay: only bodies at or above `min_decay_mass` shrink.
    pub fn decay(&mut self, fraction: f64, tuning: &PhysicsTuning) {
        if self.mass >= tuning.min_decay_mass {
            self.lose_mass(self.mass * fraction);
        }
    }

    /// Out-of-bounds decay: undersized bodies lose a fixed floor amount so they
    /// eventually vanish instead of lingering outside the playfield.
    pub fn force_decay(&mut self, fraction: f64, tuning: &PhysicsTuning) {
        if self.mass >= tuning.min_decay_mass {
            self.lose_mass(self.mass * fraction);
        } else {
            self.lose_mass(tuning.min_decay_mass.max(tuning.min_decay_mass_forced));
        }
    }

    pub fn collides_with(&self, other: &Body) -> bool {
        self.position.distance_to(other.position) < self.radius + other.radius
    }

    /// Absorbs `other` into `self` and zeroes its mass.
    ///
    /// Callers merge the lighter body into the heavier one so the surviving id and its names
    /// stay with the dominant body.
    pub fn merge_with(&mut self, other: &mut Body) {
        let total = self.mass + other.mass;
        if total > 0.0 {
            // Velocity is not averaged against static bodies.
            if !self.is_static && !other.is_static {
                self.velocity = Vector::new(
                    (self.velocity.x * self.mass + other.velocity.x * other.mass) / total,
                    (self.velocity.y * self.mass + other.velocity.y * other.mass) / total,
                );
            }
            self.position = Point::new(
                (self.position.x * self.mass + other.position.x * other.mass) / total,
                (self.position.y * self.mass + other.position.y * other.mass) / total,
            );
        }
        self.mass = total;
        other.mass = 0.0;
        self.update_radius();
        other.update_radius();
    }

    /// Newtonian attraction from `self` toward `other`; zero if either body is static.
    ///
    /// # Panics
    ///
    /// Panics when both centers coincide. Collisions are resolved before forces, so two
    /// massive bodies never share a center at this point.
    pub fn gravitational_force_to(&self, other: &Body, gravitational_constant: f64) -> Vector {
        if self.is_static || other.is_static {
            return Vector::ZERO;
        }
        let magnitude = gravitational_constant * self.mass * other.mass
            / self.position.distance_squared_to(other.position);
        self.position
            .vector_to(other.position)
            .with_magnitude(magnitude)
    }

    /// Zero clears thrust; anything else keeps its heading at the fixed base magnitude.
    pub fn apply_thrust(&mut self, thrust: Vector, base_magnitude: f64) {
        self.additional_force = if thrust.is_zero() {
            Vector::ZERO
        } else {
            thrust.with_magnitude(base_magnitude)
        };
    }

    fn lose_mass(&mut self, qty: f64) {
        self.mass -= qty.min(self.mass);
        self.update_radius();
    }

    fn update_radius(&mut self) {
        self.radius = (self.mass * 3.0 / (4.0 * PI)).cbrt();
    }
}
