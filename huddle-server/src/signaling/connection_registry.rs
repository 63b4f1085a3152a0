use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use huddle_core::{PeerId, ServerSignal};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

/// Live WebSocket channels by peer id.
///
/// Handlers register and unregister their own connection; the relay only
/// looks channels up. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    peers: Arc<DashMap<PeerId, mpsc::UnboundedSender<Message>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.peers.insert(peer_id, tx);
    }

    pub fn unregister(&self, peer_id: &PeerId) {
        self.peers.remove(peer_id);
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.peers.contains_key(peer_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn send_signal(&self, peer_id: &PeerId, signal: &ServerSignal) {
        let Some(peer) = self.peers.get(peer_id) else {
            warn!("Dropping signal for disconnected peer {}", peer_id);
            return;
        };
        match signal.to_json() {
            Ok(json) => {
                if peer.send(Message::Text(json.into())).is_err() {
                    warn!("Peer {} went away before delivery", peer_id);
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}

#[async_trait]
impl SignalingOutput for ConnectionRegistry {
    async fn send_to(&self, peer_id: &PeerId, signal: ServerSignal) {
        self.send_signal(peer_id, &signal);
    }
}
