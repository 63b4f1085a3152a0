use async_trait::async_trait;
use huddle_core::{
    ClientSignal, IceCandidate, IceServerConfig, LinkError, LinkFactory, PeerId, PeerLink,
    SdpType, SessionDescription, SignalError, SignalSink, VideoSource,
};
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use tokio::sync::{OnceCell, mpsc};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

fn connection_err(e: impl std::fmt::Display) -> LinkError {
    LinkError::Connection(e.to_string())
}

fn media_err(e: impl std::fmt::Display) -> LinkError {
    LinkError::Media(e.to_string())
}

fn sample_track(mime_type: &str, id: &str) -> Arc<TrackLocalStaticSample> {
    Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: mime_type.to_owned(),
            ..Default::default()
        },
        id.to_owned(),
        "huddle-test".to_owned(),
    ))
}

/// Outbound signals queue up here until the test pumps them to the relay.
pub struct ChannelSink(pub mpsc::UnboundedSender<ClientSignal>);

impl SignalSink for ChannelSink {
    fn send(&self, signal: ClientSignal) -> Result<(), SignalError> {
        self.0.send(signal).map_err(|_| SignalError::TransportClosed)
    }
}

/// Native `LinkFactory` over webrtc-rs, standing in for the browser.
pub struct WebrtcLinkFactory {
    api: Arc<API>,
    ice_servers: RefCell<Vec<RTCIceServer>>,
    outbound: mpsc::UnboundedSender<ClientSignal>,
    screen_active: Cell<bool>,
    audio_enabled: Cell<bool>,
}

impl WebrtcLinkFactory {
    pub fn new(outbound: mpsc::UnboundedSender<ClientSignal>) -> anyhow::Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self {
            api: Arc::new(api),
            ice_servers: RefCell::new(Vec::new()),
            outbound,
            screen_active: Cell::new(false),
            audio_enabled: Cell::new(true),
        })
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled.get()
    }
}

#[async_trait(?Send)]
impl LinkFactory for WebrtcLinkFactory {
    type Link = WebrtcLink;

    fn open(&self, remote: &PeerId) -> Result<WebrtcLink, LinkError> {
        Ok(WebrtcLink {
            api: Arc::clone(&self.api),
            config: RTCConfiguration {
                ice_servers: self.ice_servers.borrow().clone(),
                ..Default::default()
            },
            remote: remote.clone(),
            outbound: self.outbound.clone(),
            pc: OnceCell::new(),
            camera: sample_track(MIME_TYPE_VP8, "camera"),
            screen: sample_track(MIME_TYPE_VP8, "screen"),
            microphone: sample_track(MIME_TYPE_OPUS, "microphone"),
            video_sender: RefCell::new(None),
        })
    }

    fn configure_ice(&self, servers: Vec<IceServerConfig>) {
        *self.ice_servers.borrow_mut() = servers
            .into_iter()
            .map(|s| RTCIceServer {
                urls: s.urls,
                username: s.username.unwrap_or_default(),
                credential: s.credential.unwrap_or_default(),
                ..Default::default()
            })
            .collect();
    }

    async fn start_screen_capture(&self) -> Result<(), LinkError> {
        self.screen_active.set(true);
        Ok(())
    }

    fn stop_screen_capture(&self) {
        self.screen_active.set(false);
    }

    fn set_audio_enabled(&self, enabled: bool) {
        self.audio_enabled.set(enabled);
    }
}

pub struct WebrtcLink {
    api: Arc<API>,
    config: RTCConfiguration,
    remote: PeerId,
    outbound: mpsc::UnboundedSender<ClientSignal>,
    pc: OnceCell<Arc<RTCPeerConnection>>,
    camera: Arc<TrackLocalStaticSample>,
    screen: Arc<TrackLocalStaticSample>,
    microphone: Arc<TrackLocalStaticSample>,
    video_sender: RefCell<Option<Arc<RTCRtpSender>>>,
}

impl WebrtcLink {
    /// The peer connection is created on first use since `open` is sync.
    async fn pc(&self) -> Result<&Arc<RTCPeerConnection>, LinkError> {
        self.pc
            .get_or_try_init(|| async {
                let pc = self
                    .api
                    .new_peer_connection(self.config.clone())
                    .await
                    .map_err(connection_err)?;

                let outbound = self.outbound.clone();
                let remote = self.remote.clone();
                pc.on_ice_candidate(Box::new(move |candidate| {
                    let outbound = outbound.clone();
                    let remote = remote.clone();
                    Box::pin(async move {
                        let Some(candidate) = candidate else {
                            return;
                        };
                        let Ok(init) = candidate.to_json() else {
                            return;
                        };
                        let candidate = IceCandidate {
                            candidate: init.candidate,
                            sdp_mid: init.sdp_mid,
                            sdp_m_line_index: init.sdp_mline_index,
                            username_fragment: init.username_fragment,
                        };
                        if let Ok(candidate) = candidate.to_value() {
                            let _ = outbound.send(ClientSignal::SendIce {
                                to: remote,
                                candidate,
                            });
                        }
                    })
                }));

                Ok(Arc::new(pc))
            })
            .await
    }

    fn track_for(&self, source: VideoSource) -> Arc<dyn TrackLocal + Send + Sync> {
        match source {
            VideoSource::Camera => self.camera.clone(),
            VideoSource::Screen => self.screen.clone(),
        }
    }
}

#[async_trait(?Send)]
impl PeerLink for WebrtcLink {
    async fn attach_local_tracks(&self, video: VideoSource) -> Result<(), LinkError> {
        let pc = self.pc().await?;

        pc.add_track(self.microphone.clone() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(media_err)?;
        let sender = pc
            .add_track(self.track_for(video))
            .await
            .map_err(media_err)?;
        *self.video_sender.borrow_mut() = Some(sender);

        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, LinkError> {
        let pc = self.pc().await?;
        let offer = pc.create_offer(None).await.map_err(connection_err)?;
        pc.set_local_description(offer.clone())
            .await
            .map_err(connection_err)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, LinkError> {
        let pc = self.pc().await?;
        let answer = pc.create_answer(None).await.map_err(connection_err)?;
        pc.set_local_description(answer.clone())
            .await
            .map_err(connection_err)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), LinkError> {
        let pc = self.pc().await?;
        let desc = match desc.kind {
            SdpType::Offer => RTCSessionDescription::offer(desc.sdp),
            SdpType::Answer => RTCSessionDescription::answer(desc.sdp),
            SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp),
            SdpType::Rollback => return Err(connection_err("rollback is not supported")),
        }
        .map_err(connection_err)?;

        pc.set_remote_description(desc)
            .await
            .map_err(connection_err)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), LinkError> {
        let pc = self.pc().await?;
        pc.add_ice_candidate(RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        })
        .await
        .map_err(connection_err)
    }

    async fn replace_video_track(&self, source: VideoSource) -> Result<(), LinkError> {
        let sender = self.video_sender.borrow().clone();
        let Some(sender) = sender else {
            return Ok(());
        };
        sender
            .replace_track(Some(self.track_for(source)))
            .await
            .map_err(media_err)
    }

    fn close(&self) {
        if let Some(pc) = self.pc.get() {
            let pc = Arc::clone(pc);
            tokio::spawn(async move {
                if let Err(e) = pc.close().await {
                    tracing::warn!("[WebrtcLink] close failed: {}", e);
                }
            });
        }
    }
}
