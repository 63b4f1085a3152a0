//! Browser client for the huddle relay: camera capture, one
//! `RTCPeerConnection` per participant, and the signaling loop, exposed
//! to JavaScript as `HuddleClient`.

mod client;
mod engine;
mod error;
mod logger;

pub use client::HuddleClient;
pub use engine::{BrowserLink, BrowserLinkFactory, WsSink};
pub use error::ClientError;
