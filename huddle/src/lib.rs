pub use huddle_core::{PeerId, RoomId};

pub mod model {
    pub use huddle_core::model::*;
}

pub mod session {
    pub use huddle_core::session::*;
    pub use huddle_core::traits::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use huddle_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use huddle_wasm::*;
}
