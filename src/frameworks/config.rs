use crate::domain::Rect;
use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants (not physics tuning).

pub fn http_port() -> u16 {
    env::var("GRAV_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080)
}

pub fn bind_addr() -> IpAddr {
    env::var("GRAV_BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

/// Fixed RNG seed for reproducible runs; unset draws from the OS.
pub fn universe_seed() -> Option<u64> {
    env::var("GRAV_SEED").ok().and_then(|v| v.parse().ok())
}

pub fn initial_bodies() -> usize {
    env::var("GRAV_INITIAL_BODIES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10)
}

pub fn shutdown_drain() -> Duration {
    let millis = env::var("GRAV_SHUTDOWN_DRAIN_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(2000);
    Duration::from_millis(millis)
}

pub const COMMAND_QUEUE_CAPACITY: usize = 1000;
pub const SESSION_OUTBOUND_CAPACITY: usize = 4;

pub const TICK_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 30);
pub const THREAT_SPAWN_INTERVAL: Duration = Duration::from_secs(10);
pub const FOOD_SPAWN_INTERVAL: Duration = Duration::from_millis(500);

pub const UNIVERSE_BOUNDS: Rect = Rect::new(-10_000.0, -10_000.0, 20_000.0, 20_000.0);
