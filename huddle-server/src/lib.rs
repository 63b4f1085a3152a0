pub mod app;
pub mod config;
pub mod relay;
pub mod room;
pub mod signaling;

pub use app::{build_router, serve, start_relay};
pub use config::{ConfigError, ServerConfig, TlsConfig};
pub use relay::{Relay, RelayCommand};
pub use room::RoomDirectory;
pub use signaling::{ConnectionRegistry, SignalingOutput, SignalingService, ws_handler};
