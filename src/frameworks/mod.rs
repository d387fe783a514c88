// Runtime bootstrap: configuration and server wiring.

pub mod config;
pub mod server;
