use async_trait::async_trait;
use huddle_core::{PeerId, ServerSignal};
use huddle_server::SignalingOutput;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// A signal the relay tried to deliver.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMessage {
    pub to: PeerId,
    pub signal: ServerSignal,
}

/// Mock SignalingOutput that captures all outgoing signals.
#[derive(Clone)]
pub struct MockSignalingOutput {
    tx: mpsc::UnboundedSender<SignalMessage>,
    signals: Arc<Mutex<Vec<SignalMessage>>>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
        };
        (signaling, rx)
    }

    /// Everything delivered to `peer_id` so far, in order.
    pub async fn signals_for(&self, peer_id: &PeerId) -> Vec<ServerSignal> {
        self.signals
            .lock()
            .await
            .iter()
            .filter(|m| &m.to == peer_id)
            .map(|m| m.signal.clone())
            .collect()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send_to(&self, peer_id: &PeerId, signal: ServerSignal) {
        tracing::debug!("[MockSignaling] {:?} -> {}", signal, peer_id);

        let msg = SignalMessage {
            to: peer_id.clone(),
            signal,
        };

        self.signals.lock().await.push(msg.clone());
        let _ = self.tx.send(msg);
    }
}
