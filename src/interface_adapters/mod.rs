// Interface adapters: wire protocol, network sessions and HTTP routes.

pub mod http;
pub mod net;
pub mod protocol;
pub mod state;
