// Use-case level settings and ports for the world loop.

use crate::domain::UniverseSnapshot;
use std::time::Duration;

/// Timing for the world task.
#[derive(Debug, Clone, Copy)]
pub struct WorldSettings {
    /// Fixed simulation step; also the wall-clock tick period.
    pub tick_interval: Duration,
    pub threat_spawn_interval: Duration,
    pub food_spawn_interval: Duration,
}

/// Receives one snapshot per tick. Implementations must not block the tick loop.
pub trait SnapshotSink: Send + Sync {
    fn publish(&self, snapshot: UniverseSnapshot);
}
