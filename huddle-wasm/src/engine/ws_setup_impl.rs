use huddle_core::{ClientSignal, SignalError, SignalSink};
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use web_sys::WebSocket;

use crate::logger::Logger;

/// Sends client signals as JSON text frames.
#[derive(Clone)]
pub struct WsSink {
    ws: WebSocket,
}

impl WsSink {
    pub fn new(ws: WebSocket) -> Self {
        Self { ws }
    }
}

impl SignalSink for WsSink {
    fn send(&self, signal: ClientSignal) -> Result<(), SignalError> {
        if self.ws.ready_state() != WebSocket::OPEN {
            return Err(SignalError::TransportClosed);
        }
        let json = signal.to_json()?;
        self.ws
            .send_with_str(&json)
            .map_err(|_| SignalError::TransportClosed)
    }
}

/// Opens the signaling socket. Messages are wired up by the client once
/// the call exists.
pub(crate) fn ws_setup(url: &str) -> Result<WebSocket, JsValue> {
    let ws = WebSocket::new(url)?;
    ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

    let onopen_callback = Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
        Logger::info("WS open");
    }));
    ws.set_onopen(Some(onopen_callback.as_ref().unchecked_ref()));
    onopen_callback.forget();

    let onclose_callback =
        Closure::<dyn FnMut(web_sys::CloseEvent)>::wrap(Box::new(move |e: web_sys::CloseEvent| {
            Logger::warn(&format!("WS closed ({}): {}", e.code(), e.reason()));
        }));
    ws.set_onclose(Some(onclose_callback.as_ref().unchecked_ref()));
    onclose_callback.forget();

    let onerror_callback =
        Closure::<dyn FnMut(web_sys::ErrorEvent)>::wrap(Box::new(move |e: web_sys::ErrorEvent| {
            Logger::error("WS error", &e.into());
        }));
    ws.set_onerror(Some(onerror_callback.as_ref().unchecked_ref()));
    onerror_callback.forget();

    Ok(ws)
}
