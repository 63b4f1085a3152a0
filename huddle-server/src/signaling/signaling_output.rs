use async_trait::async_trait;
use huddle_core::{PeerId, ServerSignal};

/// How the relay reaches connected peers.
///
/// Delivery is best effort: a peer that has already gone is logged and
/// skipped, never reported back to the caller.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_to(&self, peer_id: &PeerId, signal: ServerSignal);

    async fn broadcast(&self, recipients: &[PeerId], exclude: &PeerId, signal: ServerSignal) {
        for peer_id in recipients.iter().filter(|p| *p != exclude) {
            self.send_to(peer_id, signal.clone()).await;
        }
    }
}
