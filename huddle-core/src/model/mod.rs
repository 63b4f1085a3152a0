mod negotiation;
mod peer;
mod room;
mod signaling;

pub use negotiation::{IceCandidate, SdpType, SessionDescription};
pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{ClientSignal, IceServerConfig, ServerSignal};
