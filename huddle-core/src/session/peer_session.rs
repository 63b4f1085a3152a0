use crate::error::SessionError;
use crate::model::{ClientSignal, IceCandidate, PeerId, SessionDescription};
use crate::traits::{PeerLink, SignalSink, VideoSource};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    HaveLocalOffer,
    HaveRemoteOffer,
    Stable,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

impl Role {
    /// Only the side with the greater id starts a negotiation, so a pair
    /// never produces two initial offers.
    pub fn for_pair(local: &PeerId, remote: &PeerId) -> Self {
        if local > remote {
            Role::Offerer
        } else {
            Role::Answerer
        }
    }
}

/// Result of a session operation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Done,
    /// The candidate arrived before the remote description and was queued.
    Buffered,
    /// Not allowed in the current state; nothing was touched.
    Ignored,
    /// The session was closed while the step was suspended.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteDescription {
    None,
    Applying,
    Applied,
}

/// Negotiation with one remote peer.
///
/// Every operation checks and moves `state` before its first suspension
/// point, and re-checks for `Closed` after each one.
pub struct PeerSession<L> {
    remote: PeerId,
    role: Role,
    link: L,
    state: Cell<NegotiationState>,
    remote_description: Cell<RemoteDescription>,
    tracks_attached: Cell<bool>,
    pending: RefCell<VecDeque<IceCandidate>>,
}

impl<L: PeerLink> PeerSession<L> {
    pub fn new(local: &PeerId, remote: PeerId, link: L) -> Self {
        let role = Role::for_pair(local, &remote);
        Self {
            remote,
            role,
            link,
            state: Cell::new(NegotiationState::Idle),
            remote_description: Cell::new(RemoteDescription::None),
            tracks_attached: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
        }
    }

    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state.get()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn has_remote_description(&self) -> bool {
        self.remote_description.get() == RemoteDescription::Applied
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending.borrow().len()
    }

    fn is_closed(&self) -> bool {
        self.state.get() == NegotiationState::Closed
    }

    pub async fn create_offer(
        &self,
        sink: &dyn SignalSink,
        video: VideoSource,
    ) -> Result<Step, SessionError> {
        if self.state.get() != NegotiationState::Idle {
            debug!(
                "Not offering to {}: session is {:?}",
                self.remote,
                self.state.get()
            );
            return Ok(Step::Ignored);
        }
        self.state.set(NegotiationState::HaveLocalOffer);

        if self.attach_tracks(video).await? == Step::Abandoned {
            return Ok(Step::Abandoned);
        }

        let offer = self.link.create_offer().await?;
        if self.is_closed() {
            return Ok(Step::Abandoned);
        }

        info!("Sending offer to {}", self.remote);
        sink.send(ClientSignal::SendOffer {
            to: self.remote.clone(),
            offer: offer.to_value()?,
        })?;
        Ok(Step::Done)
    }

    pub async fn receive_offer(
        &self,
        offer: SessionDescription,
        sink: &dyn SignalSink,
        video: VideoSource,
    ) -> Result<Step, SessionError> {
        let prev = match self.state.get() {
            state @ (NegotiationState::Idle | NegotiationState::Stable) => state,
            other => {
                warn!("Dropping offer from {}: session is {:?}", self.remote, other);
                return Ok(Step::Ignored);
            }
        };
        self.state.set(NegotiationState::HaveRemoteOffer);

        match self.apply_remote(offer).await {
            Ok(Step::Abandoned) => return Ok(Step::Abandoned),
            Ok(_) => {}
            Err(e) => {
                if !self.is_closed() {
                    self.state.set(prev);
                }
                return Err(e);
            }
        }
        if self.attach_tracks(video).await? == Step::Abandoned {
            return Ok(Step::Abandoned);
        }

        let answer = self.link.create_answer().await?;
        if self.is_closed() {
            return Ok(Step::Abandoned);
        }

        self.state.set(NegotiationState::Stable);
        info!("Sending answer to {}", self.remote);
        sink.send(ClientSignal::SendAnswer {
            to: self.remote.clone(),
            answer: answer.to_value()?,
        })?;
        Ok(Step::Done)
    }

    pub async fn receive_answer(&self, answer: SessionDescription) -> Result<Step, SessionError> {
        if self.state.get() != NegotiationState::HaveLocalOffer
            || self.remote_description.get() != RemoteDescription::None
        {
            debug!(
                "Ignoring answer from {}: session is {:?}",
                self.remote,
                self.state.get()
            );
            return Ok(Step::Ignored);
        }

        if self.apply_remote(answer).await? == Step::Abandoned {
            return Ok(Step::Abandoned);
        }

        self.state.set(NegotiationState::Stable);
        debug!("Negotiation with {} is stable", self.remote);
        Ok(Step::Done)
    }

    pub async fn receive_ice_candidate(
        &self,
        candidate: IceCandidate,
    ) -> Result<Step, SessionError> {
        if self.is_closed() {
            return Ok(Step::Ignored);
        }

        if self.remote_description.get() != RemoteDescription::Applied {
            self.pending.borrow_mut().push_back(candidate);
            return Ok(Step::Buffered);
        }

        self.link.add_ice_candidate(candidate).await?;
        Ok(Step::Done)
    }

    /// Swaps the outgoing video track in place. Sessions that have not
    /// attached their tracks yet pick up the current source when they do.
    pub async fn replace_video(&self, source: VideoSource) -> Result<Step, SessionError> {
        if self.is_closed() || !self.tracks_attached.get() {
            return Ok(Step::Ignored);
        }
        self.link.replace_video_track(source).await?;
        Ok(Step::Done)
    }

    pub fn close(&self) {
        if self.is_closed() {
            return;
        }
        self.state.set(NegotiationState::Closed);
        self.pending.borrow_mut().clear();
        self.link.close();
        info!("Closed session with {}", self.remote);
    }

    async fn attach_tracks(&self, video: VideoSource) -> Result<Step, SessionError> {
        if self.tracks_attached.replace(true) {
            return Ok(Step::Done);
        }
        self.link.attach_local_tracks(video).await?;
        if self.is_closed() {
            return Ok(Step::Abandoned);
        }
        Ok(Step::Done)
    }

    /// Sets the remote description and drains the candidate buffer.
    ///
    /// The buffer is drained one candidate at a time; candidates that arrive
    /// meanwhile are queued behind the rest, and the description only counts
    /// as applied once the queue is empty.
    ///
    /// A rejected first description leaves the session with no remote
    /// description and an empty buffer, so the next offer or answer can retry.
    async fn apply_remote(&self, desc: SessionDescription) -> Result<Step, SessionError> {
        let first = self.remote_description.get() == RemoteDescription::None;
        if first {
            self.remote_description.set(RemoteDescription::Applying);
        }

        if let Err(e) = self.link.set_remote_description(desc).await {
            if first && !self.is_closed() {
                warn!(
                    "Remote description from {} was rejected, dropping {} buffered candidates",
                    self.remote,
                    self.pending.borrow().len()
                );
                self.remote_description.set(RemoteDescription::None);
                self.pending.borrow_mut().clear();
            }
            return Err(e.into());
        }

        if !first {
            return Ok(if self.is_closed() {
                Step::Abandoned
            } else {
                Step::Done
            });
        }

        loop {
            if self.is_closed() {
                return Ok(Step::Abandoned);
            }
            let next = self.pending.borrow_mut().pop_front();
            let Some(candidate) = next else {
                break;
            };
            if let Err(e) = self.link.add_ice_candidate(candidate).await {
                warn!("Failed to apply buffered candidate from {}: {}", self.remote, e);
            }
        }

        self.remote_description.set(RemoteDescription::Applied);
        Ok(Step::Done)
    }
}
