// Domain layer: core simulation types and rules.

pub mod body;
pub mod commands;
pub mod math;
pub mod names;
pub mod spawn;
pub mod state;
pub mod tuning;
pub mod universe;

pub use body::{Body, BodyId};
pub use commands::{Command, CommandSender, SpawnKind, SubmitError};
pub use math::{Point, Rect, Vector};
pub use state::{BodySnapshot, UniverseSnapshot};
pub use tuning::PhysicsTuning;
pub use universe::{StepStats, Universe, UniverseConfig};
