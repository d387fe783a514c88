use crate::domain::CommandSender;
use crate::interface_adapters::net::SessionHub;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Commands flowing from sessions into the tick loop.
    pub commands: CommandSender,
    // Live sessions receiving per-tick snapshots.
    pub sessions: Arc<SessionHub>,
    // Frames buffered per session before the fan-out starts dropping.
    pub outbound_capacity: usize,
}
