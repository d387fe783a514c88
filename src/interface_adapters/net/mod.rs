// Network adapters: websocket sessions and snapshot fan-out.

pub mod client;
pub mod fanout;

pub use client::ws_handler;
pub use fanout::{FanOutReport, OfferOutcome, SessionHandle, SessionHub, SessionLiveness};
