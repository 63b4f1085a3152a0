pub mod call_participant;
pub mod mock_signaling;
pub mod signal_helpers;
pub mod webrtc_link;

pub use call_participant::*;
pub use mock_signaling::*;
pub use signal_helpers::*;
pub use webrtc_link::*;
pub use ws_client::*;
