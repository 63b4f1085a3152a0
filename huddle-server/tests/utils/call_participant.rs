use anyhow::Result;
use huddle_core::{Call, CallEvent, ClientSignal, PeerId, RoomId, ServerSignal};
use std::net::SocketAddr;
use tokio::sync::mpsc;

use crate::utils::{ChannelSink, WebrtcLinkFactory, WsClient};

const PUMP_WAIT_MS: u64 = 20;

/// A `Call` wired to the relay through a real WebSocket.
pub struct CallParticipant {
    pub call: Call<WebrtcLinkFactory, ChannelSink>,
    pub ws: WsClient,
    outbound: mpsc::UnboundedReceiver<ClientSignal>,
    pub offers_sent: usize,
    pub events: Vec<CallEvent>,
}

impl CallParticipant {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let ws = WsClient::connect(addr).await?;
        let (tx, outbound) = mpsc::unbounded_channel();
        let call = Call::new(WebrtcLinkFactory::new(tx.clone())?, ChannelSink(tx));

        call.handle(ServerSignal::Welcome {
            peer_id: ws.peer_id.clone(),
        })
        .await;
        call.handle(ServerSignal::IceConfig {
            ice_servers: ws.ice_servers.clone(),
        })
        .await;

        Ok(Self {
            call,
            ws,
            outbound,
            offers_sent: 0,
            events: Vec::new(),
        })
    }

    pub fn peer_id(&self) -> PeerId {
        self.ws.peer_id.clone()
    }

    pub fn join(&self, room: &str) -> Result<()> {
        self.call.join(RoomId::from(room))?;
        Ok(())
    }

    /// Flushes queued outbound signals, then feeds at most one inbound
    /// signal to the call.
    pub async fn pump(&mut self) -> Result<()> {
        while let Ok(signal) = self.outbound.try_recv() {
            if matches!(signal, ClientSignal::SendOffer { .. }) {
                self.offers_sent += 1;
            }
            self.ws.send(&signal).await?;
        }

        if let Some(signal) = self.ws.try_recv(PUMP_WAIT_MS).await? {
            if let Some(event) = self.call.handle(signal).await {
                self.events.push(event);
            }
        }
        Ok(())
    }
}
