// The simulation engine: owns every body and runs the per-tick state machine.
//
// Only the tick loop holds a `Universe`; everything else talks to it through `CommandSender`.

use super::body::{Body, BodyId};
use super::commands::{Command, CommandQueue, CommandSender, SpawnKind, SubmitError};
use super::math::{Rect, Vector};
use super::names::NamePool;
use super::spawn;
use super::tuning::PhysicsTuning;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::{debug, trace};

/// Population share (1 in N) eligible for names.
const RANKED_SHARE: usize = 100;
/// Major names require this multiple of the first unranked body's mass.
const MAJOR_MASS_FACTOR: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct UniverseConfig {
    pub bounds: Rect,
    pub tuning: PhysicsTuning,
    pub names: NamePool,
    pub command_capacity: usize,
    /// Fixed seed for reproducible runs; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl UniverseConfig {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            tuning: PhysicsTuning::default(),
            names: NamePool::default(),
            command_capacity: 1000,
            seed: None,
        }
    }
}

/// Counters describing what a single `step` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub commands_applied: usize,
    pub decayed_away: usize,
    pub merges: usize,
    pub force_evaluations: usize,
}

pub struct Universe {
    bounds: Rect,
    bodies: BTreeMap<BodyId, Body>,
    next_id: u64,
    commands: CommandQueue,
    tuning: PhysicsTuning,
    names: NamePool,
    rng: SmallRng,
}

impl Universe {
    pub fn new(config: UniverseConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self {
            bounds: config.bounds,
            bodies: BTreeMap::new(),
            next_id: 0,
            commands: CommandQueue::new(config.command_capacity),
            tuning: config.tuning,
            names: config.names,
            rng,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Read-only view of every body, ordered by id.
    pub fn bodies(&self) -> &BTreeMap<BodyId, Body> {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn tuning(&self) -> &PhysicsTuning {
        &self.tuning
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies.insert(id, body);
        id
    }

    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        self.bodies.remove(&id)
    }

    /// Adds `count` randomly placed bodies directly; for use before the tick loop starts.
    pub fn seed_random_bodies(&mut self, count: usize) {
        for _ in 0..count {
            let body = spawn::seed_body(&mut self.rng, self.bounds);
            self.add_body(body);
        }
    }

    pub fn command_sender(&self) -> CommandSender {
        self.commands.sender()
    }

    /// Enqueues a command for the next command phase.
    pub fn add_event(&self, command: Command) -> Result<(), SubmitError> {
        self.commands.sender().submit(command)
    }

    /// Runs one tick: commands, decay, collisions, forces, integration, naming.
    pub fn step(&mut self, dt: Duration) -> StepStats {
        let mut stats = StepStats {
            commands_applied: self.drain_commands(),
            ..StepStats::default()
        };
        stats.decayed_away = self.decay_bodies();
        stats.merges = self.resolve_collisions();
        stats.force_evaluations = self.apply_forces();
        for body in self.bodies.values_mut() {
            body.step(dt);
        }
        self.assign_names();

        trace!(
            bodies = self.bodies.len(),
            commands = stats.commands_applied,
            decayed = stats.decayed_away,
            merges = stats.merges,
            "universe stepped"
        );
        stats
    }

    fn drain_commands(&mut self) -> usize {
        let batch = self.commands.take_batch();
        let applied = batch.len();
        for command in batch {
            self.apply(command);
        }
        applied
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::AddBody { body, assigned } => {
                let id = self.add_body(body);
                if let Some(assigned) = assigned {
                    let _ = assigned.send(id);
                }
            }
            Command::SpawnPlayer { assigned } => {
                let body = spawn::player_body(&mut self.rng, self.bounds, &self.tuning);
                let id = self.add_body(body);
                if assigned.send(id).is_err() {
                    // Nobody is waiting to control it.
                    debug!(body_id = %id, "player left before spawn; removing body");
                    self.bodies.remove(&id);
                }
            }
            Command::SetThrust { id, thrust } => {
                if !thrust.is_finite() {
                    debug!(body_id = %id, "ignoring non-finite thrust");
                    return;
                }
                match self.bodies.get_mut(&id) {
                    Some(body) => body.apply_thrust(thrust, self.tuning.thrust_base_magnitude),
                    None => debug!(body_id = %id, "thrust for missing body ignored"),
                }
            }
            Command::RemoveBody { id } => {
                if self.bodies.remove(&id).is_none() {
                    debug!(body_id = %id, "remove for missing body ignored");
                }
            }
            Command::Spawn(kind) => self.spawn(kind),
        }
    }

    fn spawn(&mut self, kind: SpawnKind) {
        let body = match kind {
            SpawnKind::Threat => {
                let heaviest = self
                    .bodies
                    .values()
                    .map(Body::mass)
                    .fold(0.0, f64::max);
                spawn::threat_body(&mut self.rng, self.bounds, &self.tuning, heaviest)
            }
            SpawnKind::Food => {
                let anchor = self
                    .bodies
                    .values()
                    .filter(|b| !b.is_static)
                    .max_by(|a, b| a.mass().total_cmp(&b.mass()));
                spawn::food_body(&mut self.rng, self.bounds, &self.tuning, anchor)
            }
        };
        let id = self.add_body(body);
        debug!(body_id = %id, ?kind, "spawned body");
    }

    /// Shrinks every body and drops the ones that reached zero mass.
    fn decay_bodies(&mut self) -> usize {
        let tuning = self.tuning;
        for body in self.bodies.values_mut() {
            if self.bounds.contains(body.position) {
                body.decay(tuning.decay_per_step, &tuning);
            } else {
                body.force_decay(tuning.out_of_bounds_decay_per_step, &tuning);
            }
        }

        let before = self.bodies.len();
        self.bodies.retain(|_, body| !body.is_depleted());
        before - self.bodies.len()
    }

    /// Merges overlapping bodies until none overlap, restarting the scan after each merge.
    fn resolve_collisions(&mut self) -> usize {
        let mut merges = 0;
        while let Some((survivor, absorbed)) = self.find_collision() {
            let Some(mut loser) = self.bodies.remove(&absorbed) else {
                break;
            };
            if let Some(winner) = self.bodies.get_mut(&survivor) {
                winner.merge_with(&mut loser);
            }
            merges += 1;
        }
        merges
    }

    /// First colliding pair as `(survivor, absorbed)`. Each unordered pair is visited once;
    /// on equal mass the older body survives.
    fn find_collision(&self) -> Option<(BodyId, BodyId)> {
        for (&id, body) in &self.bodies {
            for (&other_id, other) in self.bodies.range(..id) {
                if body.collides_with(other) {
                    return Some(if body.mass() > other.mass() {
                        (id, other_id)
                    } else {
                        (other_id, id)
                    });
                }
            }
        }
        None
    }

    fn apply_forces(&mut self) -> usize {
        let g = self.tuning.gravitational_constant;
        let mut evaluations = 0;
        let mut forces = Vec::with_capacity(self.bodies.len());
        for (&id, body) in &self.bodies {
            let mut total = Vector::ZERO;
            for (&other_id, other) in &self.bodies {
                if other_id == id {
                    continue;
                }
                total = total + body.gravitational_force_to(other, g);
                evaluations += 1;
            }
            forces.push((id, total));
        }

        for (id, force) in forces {
            if let Some(body) = self.bodies.get_mut(&id) {
                body.gravitational_force = force;
            }
        }
        evaluations
    }

    /// Hands out sticky names to the heaviest 1% of bodies.
    fn assign_names(&mut self) {
        let mut ranking: Vec<(BodyId, f64)> = self
            .bodies
            .iter()
            .map(|(&id, body)| (id, body.mass()))
            .collect();
        let ranked = ranking.len() / RANKED_SHARE;
        if ranked == 0 {
            return;
        }
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        let major_threshold = ranking[ranked].1 * MAJOR_MASS_FACTOR;

        let mut majors_in_use: HashSet<String> = self
            .bodies
            .values()
            .filter(|b| !b.major_name.is_empty())
            .map(|b| b.major_name.clone())
            .collect();
        let mut minors_in_use: HashSet<String> = self
            .bodies
            .values()
            .filter(|b| !b.minor_name.is_empty())
            .map(|b| b.minor_name.clone())
            .collect();

        for &(id, mass) in &ranking[..ranked] {
            let Some(body) = self.bodies.get_mut(&id) else {
                continue;
            };

            if body.major_name.is_empty() && mass >= major_threshold {
                if let Some(name) = self.names.pick_major(&mut self.rng, &majors_in_use) {
                    debug!(body_id = %id, name = %name, "major name assigned");
                    majors_in_use.insert(name.clone());
                    body.major_name = name;
                }
            }

            if body.minor_name.is_empty() {
                let name = self.names.generate_minor(&mut self.rng, &minors_in_use);
                minors_in_use.insert(name.clone());
                body.minor_name = name;
            }
        }
    }
}
