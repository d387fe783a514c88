// Randomized body generation for seeding, players and periodic spawns.

use super::body::Body;
use super::math::{Point, Rect, Vector};
use super::tuning::PhysicsTuning;
use rand::Rng;

const SEED_MAX_MASS: f64 = 1_000_000.0;
const SEED_SPEED: f64 = 500.0;
const THREAT_SPEED: i32 = 100;
const FOOD_SPEED: i32 = 500;

pub fn random_point_in_rect<R: Rng>(rng: &mut R, r: Rect) -> Point {
    Point::new(
        rng.random::<f64>() * r.w + r.x,
        rng.random::<f64>() * r.h + r.y,
    )
}

fn random_velocity<R: Rng>(rng: &mut R, spread: i32) -> Vector {
    Vector::new(
        f64::from(rng.random_range(-spread..spread)),
        f64::from(rng.random_range(-spread..spread)),
    )
}

/// Initial population added before the first tick.
pub fn seed_body<R: Rng>(rng: &mut R, bounds: Rect) -> Body {
    let position = random_point_in_rect(rng, bounds);
    let mass = rng.random::<f64>() * SEED_MAX_MASS;
    let velocity = Vector::new(
        rng.random::<f64>() * SEED_SPEED * 2.0 - SEED_SPEED,
        rng.random::<f64>() * SEED_SPEED * 2.0 - SEED_SPEED,
    );
    Body::new(position, mass).with_velocity(velocity)
}

pub fn player_body<R: Rng>(rng: &mut R, bounds: Rect, tuning: &PhysicsTuning) -> Body {
    Body::new(random_point_in_rect(rng, bounds), tuning.player_start_mass)
}

/// A body sized up to twice the current heaviest, capped at ten player masses.
pub fn threat_body<R: Rng>(
    rng: &mut R,
    bounds: Rect,
    tuning: &PhysicsTuning,
    heaviest_mass: f64,
) -> Body {
    let max_mass = (heaviest_mass * 2.0).min(tuning.player_start_mass * 10.0);
    let mass = rng.random::<f64>() * max_mass;
    let position = random_point_in_rect(rng, bounds);
    Body::new(position, mass).with_velocity(random_velocity(rng, THREAT_SPEED))
}

/// A small body; placed in orbit around `anchor` when one is available.
pub fn food_body<R: Rng>(
    rng: &mut R,
    bounds: Rect,
    tuning: &PhysicsTuning,
    anchor: Option<&Body>,
) -> Body {
    let position = random_point_in_rect(rng, bounds);
    let mass =
        rng.random::<f64>() * tuning.player_start_mass * 0.4 + tuning.player_start_mass * 0.1;
    let velocity = anchor
        .and_then(|anchor| orbit_velocity(anchor, position, tuning.gravitational_constant))
        .unwrap_or_else(|| random_velocity(rng, FOOD_SPEED));
    Body::new(position, mass).with_velocity(velocity)
}

/// Velocity for a circular orbit around `anchor` at `position`, moving with the anchor.
///
/// `None` for static anchors or when `position` is the anchor's center.
pub fn orbit_velocity(anchor: &Body, position: Point, gravitational_constant: f64) -> Option<Vector> {
    if anchor.is_static {
        return None;
    }
    let radial = anchor.position.vector_to(position);
    let distance = radial.magnitude();
    if distance == 0.0 || anchor.mass() <= 0.0 {
        return None;
    }
    let speed = (gravitational_constant * anchor.mass() / distance).sqrt();
    Some(radial.perpendicular().with_magnitude(speed) + anchor.velocity)
}
