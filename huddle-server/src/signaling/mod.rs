mod connection_registry;
mod signaling_output;
mod signaling_service;
mod ws_handler;

pub use connection_registry::ConnectionRegistry;
pub use signaling_output::SignalingOutput;
pub use signaling_service::SignalingService;
pub use ws_handler::ws_handler;
