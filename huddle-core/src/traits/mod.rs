mod link;
mod sink;

pub use link::{LinkFactory, PeerLink, VideoSource};
pub use sink::SignalSink;
