use async_trait::async_trait;
use huddle_core::{
    ClientSignal, IceCandidate, LinkError, PeerId, PeerLink, SdpType, SessionDescription,
    SignalSink, VideoSource,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    RtcIceCandidateInit, RtcPeerConnection, RtcPeerConnectionIceEvent, RtcRtpSender, RtcSdpType,
    RtcSessionDescriptionInit, RtcTrackEvent,
};

use crate::engine::{EngineInner, WsSink, media_impl};
use crate::error::describe;
use crate::logger::Logger;

fn connection_err(e: JsValue) -> LinkError {
    LinkError::Connection(describe(&e))
}

fn sdp_type(kind: SdpType) -> RtcSdpType {
    match kind {
        SdpType::Offer => RtcSdpType::Offer,
        SdpType::Pranswer => RtcSdpType::Pranswer,
        SdpType::Answer => RtcSdpType::Answer,
        SdpType::Rollback => RtcSdpType::Rollback,
    }
}

/// One `RTCPeerConnection` towards a remote participant.
pub struct BrowserLink {
    pc: RtcPeerConnection,
    inner: Rc<EngineInner>,
    video_sender: RefCell<Option<RtcRtpSender>>,
    _onice: Closure<dyn FnMut(RtcPeerConnectionIceEvent)>,
    _ontrack: Closure<dyn FnMut(RtcTrackEvent)>,
}

impl BrowserLink {
    pub(crate) fn new(pc: RtcPeerConnection, remote: PeerId, inner: Rc<EngineInner>) -> Self {
        let onice = {
            let sink = WsSink::new(inner.ws().clone());
            let remote = remote.clone();
            Closure::wrap(Box::new(move |ev: RtcPeerConnectionIceEvent| {
                let Some(c) = ev.candidate() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: c.candidate(),
                    sdp_mid: c.sdp_mid(),
                    sdp_m_line_index: c.sdp_m_line_index(),
                    username_fragment: js_sys::Reflect::get(&c, &"usernameFragment".into())
                        .ok()
                        .and_then(|v| v.as_string()),
                };
                let sent = candidate.to_value().and_then(|candidate| {
                    sink.send(ClientSignal::SendIce {
                        to: remote.clone(),
                        candidate,
                    })
                });
                if let Err(e) = sent {
                    Logger::warn(&format!("Could not send ICE candidate to {}: {}", remote, e));
                }
            }) as Box<dyn FnMut(RtcPeerConnectionIceEvent)>)
        };
        pc.set_onicecandidate(Some(onice.as_ref().unchecked_ref()));

        let ontrack = {
            let inner = Rc::clone(&inner);
            Closure::wrap(Box::new(move |ev: RtcTrackEvent| {
                let Some(stream) = ev.streams().iter().next() else {
                    return;
                };
                let event = js_sys::Object::new();
                let _ = js_sys::Reflect::set(&event, &"kind".into(), &"remote-stream".into());
                let _ = js_sys::Reflect::set(&event, &"peerId".into(), &remote.as_str().into());
                let _ = js_sys::Reflect::set(&event, &"stream".into(), &stream);
                inner.dispatch_event(&event);
            }) as Box<dyn FnMut(RtcTrackEvent)>)
        };
        pc.set_ontrack(Some(ontrack.as_ref().unchecked_ref()));

        Self {
            pc,
            inner,
            video_sender: RefCell::new(None),
            _onice: onice,
            _ontrack: ontrack,
        }
    }

    fn video_track(&self, source: VideoSource) -> Option<web_sys::MediaStreamTrack> {
        let screen = match source {
            VideoSource::Screen => self.inner.screen(),
            VideoSource::Camera => None,
        };
        screen
            .and_then(|stream| media_impl::video_track(&stream))
            .or_else(|| media_impl::video_track(self.inner.camera()))
    }

    async fn set_local(&self, kind: RtcSdpType, value: JsValue) -> Result<String, LinkError> {
        let sdp = js_sys::Reflect::get(&value, &"sdp".into())
            .map_err(connection_err)?
            .as_string()
            .ok_or_else(|| LinkError::Connection("description without sdp".into()))?;

        let desc = RtcSessionDescriptionInit::new(kind);
        desc.set_sdp(&sdp);
        JsFuture::from(self.pc.set_local_description(&desc))
            .await
            .map_err(connection_err)?;
        Ok(sdp)
    }
}

#[async_trait(?Send)]
impl PeerLink for BrowserLink {
    async fn attach_local_tracks(&self, video: VideoSource) -> Result<(), LinkError> {
        let camera = self.inner.camera();
        for track in media_impl::tracks(&camera.get_audio_tracks()) {
            self.pc.add_track_0(&track, camera);
        }
        if let Some(track) = self.video_track(video) {
            let sender = self.pc.add_track_0(&track, camera);
            *self.video_sender.borrow_mut() = Some(sender);
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, LinkError> {
        let offer = JsFuture::from(self.pc.create_offer())
            .await
            .map_err(connection_err)?;
        let sdp = self.set_local(RtcSdpType::Offer, offer).await?;
        Ok(SessionDescription::offer(sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, LinkError> {
        let answer = JsFuture::from(self.pc.create_answer())
            .await
            .map_err(connection_err)?;
        let sdp = self.set_local(RtcSdpType::Answer, answer).await?;
        Ok(SessionDescription::answer(sdp))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), LinkError> {
        let init = RtcSessionDescriptionInit::new(sdp_type(desc.kind));
        init.set_sdp(&desc.sdp);
        JsFuture::from(self.pc.set_remote_description(&init))
            .await
            .map_err(connection_err)?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), LinkError> {
        let init = RtcIceCandidateInit::new(&candidate.candidate);
        init.set_sdp_mid(candidate.sdp_mid.as_deref());
        init.set_sdp_m_line_index(candidate.sdp_m_line_index);
        let _ = js_sys::Reflect::set(
            &init,
            &"usernameFragment".into(),
            &JsValue::from(candidate.username_fragment.as_deref()),
        );

        let promise = self
            .pc
            .add_ice_candidate_with_opt_rtc_ice_candidate_init(Some(&init));
        JsFuture::from(promise).await.map_err(connection_err)?;
        Ok(())
    }

    async fn replace_video_track(&self, source: VideoSource) -> Result<(), LinkError> {
        let sender = self.video_sender.borrow().clone();
        let Some(sender) = sender else {
            return Ok(());
        };
        let track = self.video_track(source);
        JsFuture::from(sender.replace_track(track.as_ref()))
            .await
            .map_err(|e| LinkError::Media(describe(&e)))?;
        Ok(())
    }

    fn close(&self) {
        self.pc.set_onicecandidate(None);
        self.pc.set_ontrack(None);
        self.pc.close();
    }
}
