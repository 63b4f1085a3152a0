use crate::error::LinkError;
use crate::model::{IceCandidate, IceServerConfig, PeerId, SessionDescription};
use async_trait::async_trait;

/// Which capture feeds the outgoing video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSource {
    Camera,
    Screen,
}

/// One platform peer connection towards a single remote peer.
///
/// Implementations wrap whatever the host offers (`RTCPeerConnection` in a
/// browser, `webrtc` natively). They own description/candidate handling; the
/// session only decides when each step may run.
#[async_trait(?Send)]
pub trait PeerLink {
    /// Adds the local capture tracks, using `video` for the video track.
    async fn attach_local_tracks(&self, video: VideoSource) -> Result<(), LinkError>;

    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription, LinkError>;

    /// Creates an answer and installs it as the local description.
    async fn create_answer(&self) -> Result<SessionDescription, LinkError>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), LinkError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), LinkError>;

    /// Swaps the track behind the outgoing video sender without renegotiating.
    async fn replace_video_track(&self, source: VideoSource) -> Result<(), LinkError>;

    fn close(&self);
}

/// Creates links and owns the local media they share.
#[async_trait(?Send)]
pub trait LinkFactory {
    type Link: PeerLink;

    /// Opens a connection to `remote`. Locally gathered ICE candidates are
    /// expected to be forwarded as `send-ice` addressed to `remote`.
    fn open(&self, remote: &PeerId) -> Result<Self::Link, LinkError>;

    fn configure_ice(&self, _servers: Vec<IceServerConfig>) {}

    async fn start_screen_capture(&self) -> Result<(), LinkError>;

    fn stop_screen_capture(&self);

    fn set_audio_enabled(&self, enabled: bool);
}
