use crate::relay::RelayCommand;
use crate::room::RoomDirectory;
use crate::signaling::SignalingOutput;
use huddle_core::{ClientSignal, PeerId, RoomId, ServerSignal};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Single owner of room membership.
///
/// Every connection forwards its events here over one channel, so room
/// state is only ever touched by this task and needs no locking.
pub struct Relay {
    rooms: RoomDirectory,
    bindings: HashMap<PeerId, RoomId>,
    output: Arc<dyn SignalingOutput>,
    command_rx: mpsc::Receiver<RelayCommand>,
}

impl Relay {
    pub fn new(command_rx: mpsc::Receiver<RelayCommand>, output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: RoomDirectory::new(),
            bindings: HashMap::new(),
            output,
            command_rx,
        }
    }

    pub async fn run(mut self) {
        info!("Relay event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Relay event loop finished");
    }

    pub fn rooms(&self) -> &RoomDirectory {
        &self.rooms
    }

    pub fn room_of(&self, peer_id: &PeerId) -> Option<&RoomId> {
        self.bindings.get(peer_id)
    }

    pub async fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Signal { peer_id, signal } => self.handle_signal(peer_id, signal).await,
            RelayCommand::Disconnected { peer_id } => {
                info!("Peer {} disconnected", peer_id);
                self.leave_current(&peer_id).await;
            }
        }
    }

    async fn handle_signal(&mut self, peer_id: PeerId, signal: ClientSignal) {
        match signal {
            ClientSignal::JoinRoom(room) => self.join(peer_id, room).await,
            ClientSignal::LeaveRoom => self.leave_current(&peer_id).await,

            ClientSignal::SendOffer { to, offer } => {
                debug!("Relaying offer {} -> {}", peer_id, to);
                let signal = ServerSignal::ReceiveOffer {
                    from: peer_id,
                    offer,
                };
                self.output.send_to(&to, signal).await;
            }
            ClientSignal::SendAnswer { to, answer } => {
                debug!("Relaying answer {} -> {}", peer_id, to);
                let signal = ServerSignal::ReceiveAnswer {
                    from: peer_id,
                    answer,
                };
                self.output.send_to(&to, signal).await;
            }
            ClientSignal::SendIce { to, candidate } => {
                debug!("Relaying ICE candidate {} -> {}", peer_id, to);
                let signal = ServerSignal::ReceiveIce {
                    from: peer_id,
                    candidate,
                };
                self.output.send_to(&to, signal).await;
            }

            ClientSignal::RaiseHand { .. } => {
                let signal = ServerSignal::UserRaisedHand {
                    sender_id: peer_id.clone(),
                };
                self.broadcast_to_room(&peer_id, signal).await;
            }
            ClientSignal::SendChat { message, .. } => {
                let signal = ServerSignal::ReceiveChat {
                    sender_id: peer_id.clone(),
                    message,
                };
                self.broadcast_to_room(&peer_id, signal).await;
            }
        }
    }

    async fn join(&mut self, peer_id: PeerId, room: RoomId) {
        if room.is_empty() {
            warn!("Peer {} asked to join a room with no name", peer_id);
            return;
        }

        if self.bindings.get(&peer_id).is_some_and(|current| *current != room) {
            self.leave_current(&peer_id).await;
        }

        let rejoin = self.rooms.contains(&room, &peer_id);
        let others = self.rooms.join(&room, &peer_id);
        self.bindings.insert(peer_id.clone(), room.clone());
        info!("Peer {} joined room {} ({} already there)", peer_id, room, others.len());

        self.output
            .send_to(&peer_id, ServerSignal::AllUsers(others.clone()))
            .await;

        if !rejoin {
            self.output
                .broadcast(&others, &peer_id, ServerSignal::UserJoined(peer_id.clone()))
                .await;
        }
    }

    async fn leave_current(&mut self, peer_id: &PeerId) {
        let Some(room) = self.bindings.remove(peer_id) else {
            return;
        };
        if !self.rooms.leave(&room, peer_id) {
            return;
        }
        info!("Peer {} left room {}", peer_id, room);

        let remaining = self.rooms.members(&room);
        self.output
            .broadcast(&remaining, peer_id, ServerSignal::UserLeft(peer_id.clone()))
            .await;
    }

    async fn broadcast_to_room(&self, sender: &PeerId, signal: ServerSignal) {
        let Some(room) = self.bindings.get(sender) else {
            warn!("Peer {} is not in a room, dropping {:?}", sender, signal);
            return;
        };
        debug!("Broadcasting to room {} from {}", room, sender);
        let members = self.rooms.members(room);
        self.output.broadcast(&members, sender, signal).await;
    }
}
