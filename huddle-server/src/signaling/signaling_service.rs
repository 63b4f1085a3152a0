use crate::relay::RelayCommand;
use crate::signaling::ConnectionRegistry;
use huddle_core::{IceServerConfig, PeerId, ServerSignal};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Shared state handed to every WebSocket handler.
#[derive(Clone)]
pub struct SignalingService {
    registry: ConnectionRegistry,
    ice_servers: Arc<Vec<IceServerConfig>>,
    pub(crate) relay_tx: mpsc::Sender<RelayCommand>,
}

impl SignalingService {
    pub fn new(
        registry: ConnectionRegistry,
        relay_tx: mpsc::Sender<RelayCommand>,
        ice_servers: Vec<IceServerConfig>,
    ) -> Self {
        Self {
            registry,
            ice_servers: Arc::new(ice_servers),
            relay_tx,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.ice_servers.as_ref().clone()
    }

    /// First frames on a fresh connection: its id, then the ICE servers.
    pub(crate) fn greet(&self, peer_id: &PeerId) {
        self.registry.send_signal(
            peer_id,
            &ServerSignal::Welcome {
                peer_id: peer_id.clone(),
            },
        );
        self.registry.send_signal(
            peer_id,
            &ServerSignal::IceConfig {
                ice_servers: self.get_ice_servers(),
            },
        );
    }
}
