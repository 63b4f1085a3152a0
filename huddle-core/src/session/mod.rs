mod call;
mod peer_session;

pub use call::{Call, CallEvent};
pub use peer_session::{NegotiationState, PeerSession, Role, Step};
