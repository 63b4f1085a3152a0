use crate::error::{SessionError, SignalError};
use crate::model::{
    ClientSignal, IceCandidate, IceServerConfig, PeerId, RoomId, ServerSignal, SessionDescription,
};
use crate::session::peer_session::{NegotiationState, PeerSession, Role, Step};
use crate::traits::{LinkFactory, SignalSink, VideoSource};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Something the embedding UI may want to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum CallEvent {
    Connected { peer_id: PeerId },
    RosterChanged { peers: Vec<PeerId> },
    PeerLeft { peer_id: PeerId },
    HandRaised { peer_id: PeerId },
    Chat { peer_id: PeerId, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenShare {
    Off,
    Starting,
    On,
}

/// Client side of one call: the roster plus one `PeerSession` per remote
/// participant, fed by relay events.
pub struct Call<F: LinkFactory, S> {
    factory: F,
    sink: S,
    local_id: RefCell<Option<PeerId>>,
    room: RefCell<Option<RoomId>>,
    roster: RefCell<BTreeSet<PeerId>>,
    sessions: RefCell<HashMap<PeerId, Rc<PeerSession<F::Link>>>>,
    screen: Cell<ScreenShare>,
    audio_enabled: Cell<bool>,
}

impl<F: LinkFactory, S: SignalSink> Call<F, S> {
    pub fn new(factory: F, sink: S) -> Self {
        Self {
            factory,
            sink,
            local_id: RefCell::new(None),
            room: RefCell::new(None),
            roster: RefCell::new(BTreeSet::new()),
            sessions: RefCell::new(HashMap::new()),
            screen: Cell::new(ScreenShare::Off),
            audio_enabled: Cell::new(true),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn local_id(&self) -> Option<PeerId> {
        self.local_id.borrow().clone()
    }

    pub fn room(&self) -> Option<RoomId> {
        self.room.borrow().clone()
    }

    pub fn roster(&self) -> Vec<PeerId> {
        self.roster.borrow().iter().cloned().collect()
    }

    pub fn session_state(&self, peer_id: &PeerId) -> Option<NegotiationState> {
        self.sessions.borrow().get(peer_id).map(|s| s.state())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.borrow().len()
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.screen.get() == ScreenShare::On
    }

    fn video_source(&self) -> VideoSource {
        match self.screen.get() {
            ScreenShare::On => VideoSource::Screen,
            ScreenShare::Off | ScreenShare::Starting => VideoSource::Camera,
        }
    }

    /// Joins `room`. Switching from another room drops everything tied to
    /// it first; the relay moves the connection on its own.
    pub fn join(&self, room: RoomId) -> Result<(), SignalError> {
        let previous = self.room.borrow().clone();
        if let Some(previous) = previous.filter(|r| r != &room) {
            info!("Leaving room '{}' for '{}'", previous, room);
            self.teardown();
        }
        info!("Joining room '{}'", room);
        *self.room.borrow_mut() = Some(room.clone());
        self.sink.send(ClientSignal::JoinRoom(room))
    }

    pub fn leave(&self) -> Result<(), SignalError> {
        self.teardown();
        self.sink.send(ClientSignal::LeaveRoom)
    }

    fn teardown(&self) {
        self.room.borrow_mut().take();
        self.roster.borrow_mut().clear();
        let sessions: Vec<_> = self.sessions.borrow_mut().drain().map(|(_, s)| s).collect();
        for session in sessions {
            session.close();
        }
    }

    pub fn raise_hand(&self) -> Result<(), SignalError> {
        self.sink.send(ClientSignal::RaiseHand { room: self.room() })
    }

    pub fn send_chat(&self, message: impl Into<String>) -> Result<(), SignalError> {
        self.sink.send(ClientSignal::SendChat {
            room: self.room(),
            message: message.into(),
        })
    }

    /// Flips the microphone and returns whether audio is now enabled.
    pub fn toggle_mute(&self) -> bool {
        let enabled = !self.audio_enabled.get();
        self.audio_enabled.set(enabled);
        self.factory.set_audio_enabled(enabled);
        enabled
    }

    /// Applies one relay event. Failures are per peer and only logged; the
    /// rest of the call carries on.
    pub async fn handle(&self, signal: ServerSignal) -> Option<CallEvent> {
        match signal {
            ServerSignal::Welcome { peer_id } => {
                info!("Connected to relay as {}", peer_id);
                *self.local_id.borrow_mut() = Some(peer_id.clone());
                Some(CallEvent::Connected { peer_id })
            }

            ServerSignal::IceConfig { ice_servers } => {
                self.configure_ice(ice_servers);
                None
            }

            ServerSignal::AllUsers(peers) => {
                for peer_id in peers {
                    self.peer_present(peer_id).await;
                }
                Some(self.roster_event())
            }

            ServerSignal::UserJoined(peer_id) => {
                self.peer_present(peer_id).await;
                Some(self.roster_event())
            }

            ServerSignal::UserLeft(peer_id) => {
                self.roster.borrow_mut().remove(&peer_id);
                let session = self.sessions.borrow_mut().remove(&peer_id);
                if let Some(session) = session {
                    session.close();
                }
                Some(CallEvent::PeerLeft { peer_id })
            }

            ServerSignal::ReceiveOffer { from, offer } => {
                let offer = match SessionDescription::from_value(offer) {
                    Ok(offer) => offer,
                    Err(e) => {
                        warn!("Dropping offer from {}: {}", from, e);
                        return None;
                    }
                };
                let session = match self.session_for(&from) {
                    Ok(session) => session,
                    Err(e) => {
                        warn!("Cannot open connection to {}: {}", from, e);
                        return None;
                    }
                };
                let result = session
                    .receive_offer(offer, &self.sink, self.video_source())
                    .await;
                log_failure(&from, "offer", result);
                None
            }

            ServerSignal::ReceiveAnswer { from, answer } => {
                let Some(session) = self.existing_session(&from) else {
                    debug!("Answer from unknown peer {} dropped", from);
                    return None;
                };
                let result = match SessionDescription::from_value(answer) {
                    Ok(answer) => session.receive_answer(answer).await,
                    Err(e) => Err(e.into()),
                };
                log_failure(&from, "answer", result);
                None
            }

            ServerSignal::ReceiveIce { from, candidate } => {
                let Some(session) = self.existing_session(&from) else {
                    debug!("Candidate from unknown peer {} dropped", from);
                    return None;
                };
                let result = match IceCandidate::from_value(candidate) {
                    Ok(candidate) => session.receive_ice_candidate(candidate).await,
                    Err(e) => Err(e.into()),
                };
                log_failure(&from, "ice candidate", result);
                None
            }

            ServerSignal::UserRaisedHand { sender_id } => {
                Some(CallEvent::HandRaised { peer_id: sender_id })
            }

            ServerSignal::ReceiveChat { sender_id, message } => Some(CallEvent::Chat {
                peer_id: sender_id,
                message,
            }),
        }
    }

    /// Starts sending the screen instead of the camera on every connection.
    /// Returns `false` when sharing was already active or capture failed;
    /// a failed capture leaves the call untouched.
    pub async fn start_screen_share(&self) -> bool {
        if self.screen.get() != ScreenShare::Off {
            return false;
        }
        self.screen.set(ScreenShare::Starting);

        if let Err(e) = self.factory.start_screen_capture().await {
            warn!("Screen share failed: {}", e);
            self.screen.set(ScreenShare::Off);
            return false;
        }

        self.screen.set(ScreenShare::On);
        self.swap_video(VideoSource::Screen).await;
        true
    }

    /// Reverts every connection to the camera. Also the path taken when the
    /// capture source ends on its own.
    pub async fn stop_screen_share(&self) {
        if self.screen.get() != ScreenShare::On {
            return;
        }
        self.screen.set(ScreenShare::Off);
        self.factory.stop_screen_capture();
        self.swap_video(VideoSource::Camera).await;
    }

    async fn swap_video(&self, source: VideoSource) {
        let sessions: Vec<_> = self.sessions.borrow().values().cloned().collect();
        for session in sessions {
            if let Err(e) = session.replace_video(source).await {
                warn!("Failed to switch video for {}: {}", session.remote(), e);
            }
        }
    }

    fn configure_ice(&self, servers: Vec<IceServerConfig>) {
        debug!("Received {} ICE servers", servers.len());
        self.factory.configure_ice(servers);
    }

    async fn peer_present(&self, peer_id: PeerId) {
        let Some(local) = self.local_id() else {
            warn!("Peer {} announced before welcome; not negotiating", peer_id);
            return;
        };
        if peer_id == local {
            return;
        }
        self.roster.borrow_mut().insert(peer_id.clone());

        if Role::for_pair(&local, &peer_id) != Role::Offerer {
            debug!("Waiting for {} to offer", peer_id);
            return;
        }

        let session = match self.session_for(&peer_id) {
            Ok(session) => session,
            Err(e) => {
                warn!("Cannot open connection to {}: {}", peer_id, e);
                return;
            }
        };
        let result = session.create_offer(&self.sink, self.video_source()).await;
        log_failure(&peer_id, "offer", result);
    }

    fn existing_session(&self, peer_id: &PeerId) -> Option<Rc<PeerSession<F::Link>>> {
        self.sessions.borrow().get(peer_id).cloned()
    }

    fn session_for(
        &self,
        peer_id: &PeerId,
    ) -> Result<Rc<PeerSession<F::Link>>, crate::error::LinkError> {
        if let Some(session) = self.existing_session(peer_id) {
            return Ok(session);
        }
        let local = self.local_id().unwrap_or_default();
        let link = self.factory.open(peer_id)?;
        let session = Rc::new(PeerSession::new(&local, peer_id.clone(), link));
        self.sessions
            .borrow_mut()
            .insert(peer_id.clone(), session.clone());
        Ok(session)
    }

    fn roster_event(&self) -> CallEvent {
        CallEvent::RosterChanged {
            peers: self.roster(),
        }
    }
}

fn log_failure(peer_id: &PeerId, what: &str, result: Result<Step, SessionError>) {
    match result {
        Ok(Step::Abandoned) => debug!("Negotiation with {} abandoned", peer_id),
        Ok(_) => {}
        Err(e) => warn!("Handling {} from {} failed: {}", what, peer_id, e),
    }
}
