// Use cases layer: the tick loop and its ports.

pub mod game;
pub mod types;

pub use game::world_task;
pub use types::{SnapshotSink, WorldSettings};
