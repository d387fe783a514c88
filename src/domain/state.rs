// Immutable snapshot types handed from the tick loop to the outside world.

use super::body::{Body, BodyId};
use super::math::{Point, Rect, Vector};
use super::universe::Universe;

#[derive(Debug, Clone, PartialEq)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub major_name: String,
    pub minor_name: String,
    pub position: Point,
    pub mass: f64,
    pub radius: f64,
    pub net_force: Vector,
}

impl From<(BodyId, &Body)> for BodySnapshot {
    fn from((id, b): (BodyId, &Body)) -> Self {
        Self {
            id,
            major_name: b.major_name.clone(),
            minor_name: b.minor_name.clone(),
            position: b.position,
            mass: b.mass(),
            radius: b.radius(),
            net_force: b.net_force,
        }
    }
}

/// Everything observers may see of the universe after a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseSnapshot {
    pub tick: u64,
    pub bounds: Rect,
    pub bodies: Vec<BodySnapshot>,
}

impl UniverseSnapshot {
    pub fn capture(tick: u64, universe: &Universe) -> Self {
        Self {
            tick,
            bounds: universe.bounds(),
            bodies: universe
                .bodies()
                .iter()
                .map(|(&id, body)| BodySnapshot::from((id, body)))
                .collect(),
        }
    }
}
