use async_trait::async_trait;
use huddle_core::{IceServerConfig, LinkError, LinkFactory, PeerId};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use web_sys::{MediaStream, MediaStreamTrack, WebSocket};

use crate::error::describe;
use crate::logger::Logger;

mod browser_link;
mod create_pc_impl;
mod media_impl;
mod ws_setup_impl;

pub use browser_link::BrowserLink;
pub(crate) use media_impl::{capture_camera, stop_tracks};
pub use ws_setup_impl::WsSink;
pub(crate) use ws_setup_impl::ws_setup;

/// Browser-side state shared by the factory, every link and the socket
/// handlers.
pub(crate) struct EngineInner {
    ws: WebSocket,
    ice_servers: RefCell<Vec<IceServerConfig>>,
    camera: MediaStream,
    screen: RefCell<Option<MediaStream>>,
    js_callback: RefCell<Option<js_sys::Function>>,
}

impl EngineInner {
    pub(crate) fn new(ws: WebSocket, camera: MediaStream) -> Self {
        Self {
            ws,
            ice_servers: RefCell::new(Vec::new()),
            camera,
            screen: RefCell::new(None),
            js_callback: RefCell::new(None),
        }
    }

    pub(crate) fn ws(&self) -> &WebSocket {
        &self.ws
    }

    pub(crate) fn camera(&self) -> &MediaStream {
        &self.camera
    }

    pub(crate) fn screen(&self) -> Option<MediaStream> {
        self.screen.borrow().clone()
    }

    pub(crate) fn set_event_handler(&self, callback: js_sys::Function) {
        *self.js_callback.borrow_mut() = Some(callback);
    }

    pub(crate) fn dispatch_event(&self, event: &JsValue) {
        // Cloned out so the handler may call back into the client.
        let callback = self.js_callback.borrow().clone();
        if let Some(cb) = callback {
            if let Err(e) = cb.call1(&JsValue::NULL, event) {
                Logger::error("Event handler threw", &e);
            }
        }
    }

    pub(crate) fn dispatch<T: Serialize>(&self, event: &T) {
        match serde_wasm_bindgen::to_value(event) {
            Ok(js_val) => self.dispatch_event(&js_val),
            Err(e) => Logger::warn(&format!("Cannot convert event: {}", e)),
        }
    }
}

/// Opens `RTCPeerConnection`s and owns the captured media they share.
#[derive(Clone)]
pub struct BrowserLinkFactory {
    inner: Rc<EngineInner>,
}

impl BrowserLinkFactory {
    pub(crate) fn new(inner: Rc<EngineInner>) -> Self {
        Self { inner }
    }

    /// The video track of the active screen capture, if any.
    pub fn screen_track(&self) -> Option<MediaStreamTrack> {
        self.inner
            .screen()
            .and_then(|stream| media_impl::video_track(&stream))
    }
}

#[async_trait(?Send)]
impl LinkFactory for BrowserLinkFactory {
    type Link = BrowserLink;

    fn open(&self, remote: &PeerId) -> Result<BrowserLink, LinkError> {
        let servers = self.inner.ice_servers.borrow().clone();
        let pc = create_pc_impl::create_pc(&servers)
            .map_err(|e| LinkError::Connection(describe(&e)))?;
        Ok(BrowserLink::new(pc, remote.clone(), Rc::clone(&self.inner)))
    }

    fn configure_ice(&self, servers: Vec<IceServerConfig>) {
        Logger::info(&format!("Received ICE config: {} servers", servers.len()));
        *self.inner.ice_servers.borrow_mut() = servers;
    }

    async fn start_screen_capture(&self) -> Result<(), LinkError> {
        let stream = media_impl::capture_screen()
            .await
            .map_err(|e| LinkError::Media(e.to_string()))?;
        *self.inner.screen.borrow_mut() = Some(stream);
        Ok(())
    }

    fn stop_screen_capture(&self) {
        let stream = self.inner.screen.borrow_mut().take();
        if let Some(stream) = stream {
            stop_tracks(&stream);
        }
    }

    fn set_audio_enabled(&self, enabled: bool) {
        for track in media_impl::tracks(&self.inner.camera.get_audio_tracks()) {
            track.set_enabled(enabled);
        }
    }
}
