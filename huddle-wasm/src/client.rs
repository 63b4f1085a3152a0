use huddle_core::{Call, RoomId, ServerSignal};
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use web_sys::{MediaStream, MessageEvent};

use crate::engine::{
    BrowserLinkFactory, EngineInner, WsSink, capture_camera, stop_tracks, ws_setup,
};
use crate::error::ClientError;
use crate::logger::Logger;

type BrowserCall = Call<BrowserLinkFactory, WsSink>;

/// A joined call, driven from JavaScript.
///
/// Events reach the handler set with `setEventHandler` as plain objects
/// tagged by `kind`: `connected`, `roster-changed`, `peer-left`,
/// `hand-raised`, `chat` and `remote-stream`.
#[wasm_bindgen]
pub struct HuddleClient {
    call: Rc<BrowserCall>,
    engine: Rc<EngineInner>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    onended: Option<Closure<dyn FnMut(JsValue)>>,
}

#[wasm_bindgen]
impl HuddleClient {
    /// Captures camera and microphone, opens the signaling socket at `url`
    /// and joins `room` as soon as the relay says hello. Rejects when media
    /// capture is refused.
    pub async fn connect(url: String, room: String) -> Result<HuddleClient, JsValue> {
        Logger::install();
        let camera = capture_camera().await?;
        let ws = ws_setup(&url)?;

        let engine = Rc::new(EngineInner::new(ws.clone(), camera));
        let call = Rc::new(Call::new(
            BrowserLinkFactory::new(Rc::clone(&engine)),
            WsSink::new(ws.clone()),
        ));

        let onmessage = Self::message_handler(&call, &engine, RoomId::from(room));
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        Ok(HuddleClient {
            call,
            engine,
            _onmessage: onmessage,
            onended: None,
        })
    }

    #[wasm_bindgen(js_name = setEventHandler)]
    pub fn set_event_handler(&self, callback: js_sys::Function) {
        self.engine.set_event_handler(callback);
    }

    #[wasm_bindgen(js_name = peerId)]
    pub fn peer_id(&self) -> Option<String> {
        self.call.local_id().map(|id| id.as_str().to_owned())
    }

    #[wasm_bindgen(js_name = localStream)]
    pub fn local_stream(&self) -> MediaStream {
        self.engine.camera().clone()
    }

    /// Returns `true` when the microphone is live after the toggle.
    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) -> bool {
        self.call.toggle_mute()
    }

    /// Resolves to whether sharing started. The browser's own "stop
    /// sharing" control reverts to the camera.
    #[wasm_bindgen(js_name = shareScreen)]
    pub fn share_screen(&mut self) -> js_sys::Promise {
        let call = Rc::clone(&self.call);
        let onended = Self::screen_ended_handler(Rc::downgrade(&self.call));
        let onended_fn = onended.as_ref().unchecked_ref::<js_sys::Function>().clone();
        self.onended = Some(onended);

        wasm_bindgen_futures::future_to_promise(async move {
            let started = call.start_screen_share().await;
            if started {
                if let Some(track) = call.factory().screen_track() {
                    track.set_onended(Some(&onended_fn));
                }
            }
            Ok(JsValue::from_bool(started))
        })
    }

    #[wasm_bindgen(js_name = stopScreenShare)]
    pub fn stop_screen_share(&self) -> js_sys::Promise {
        let call = Rc::clone(&self.call);
        wasm_bindgen_futures::future_to_promise(async move {
            call.stop_screen_share().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = raiseHand)]
    pub fn raise_hand(&self) -> Result<(), JsValue> {
        self.call.raise_hand().map_err(ClientError::from)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = sendChat)]
    pub fn send_chat(&self, message: String) -> Result<(), JsValue> {
        self.call.send_chat(message).map_err(ClientError::from)?;
        Ok(())
    }

    /// Leaves the room and closes every peer connection; the socket stays
    /// open.
    pub fn leave(&self) -> Result<(), JsValue> {
        self.call.leave().map_err(ClientError::from)?;
        Ok(())
    }
}

impl HuddleClient {
    fn message_handler(
        call: &Rc<BrowserCall>,
        engine: &Rc<EngineInner>,
        room: RoomId,
    ) -> Closure<dyn FnMut(MessageEvent)> {
        let call = Rc::downgrade(call);
        let engine = Rc::downgrade(engine);

        Closure::<dyn FnMut(MessageEvent)>::wrap(Box::new(move |e: MessageEvent| {
            let Some(text) = e.data().as_string() else {
                return;
            };
            Logger::debug(&format!("WS IN: {}", text));
            let signal = match ServerSignal::from_json(&text) {
                Ok(signal) => signal,
                Err(err) => {
                    Logger::warn(&format!("Ignoring frame: {}. Text: {}", err, text));
                    return;
                }
            };
            let (Some(call), Some(engine)) = (call.upgrade(), engine.upgrade()) else {
                return;
            };
            let room = room.clone();

            wasm_bindgen_futures::spawn_local(async move {
                let welcomed = matches!(signal, ServerSignal::Welcome { .. });
                if let Some(event) = call.handle(signal).await {
                    engine.dispatch(&event);
                }
                if welcomed {
                    if let Err(err) = call.join(room) {
                        Logger::warn(&format!("Join failed: {}", err));
                    }
                }
            });
        }))
    }

    fn screen_ended_handler(call: Weak<BrowserCall>) -> Closure<dyn FnMut(JsValue)> {
        Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
            let Some(call) = call.upgrade() else {
                return;
            };
            Logger::info("Screen capture ended");
            wasm_bindgen_futures::spawn_local(async move {
                call.stop_screen_share().await;
            });
        }))
    }
}

impl Drop for HuddleClient {
    fn drop(&mut self) {
        let ws = self.engine.ws();
        ws.set_onmessage(None);
        let _ = ws.close();
        if let Some(screen) = self.engine.screen() {
            stop_tracks(&screen);
        }
        stop_tracks(self.engine.camera());
    }
}
