use huddle_core::IceServerConfig;
use wasm_bindgen::JsValue;

use crate::logger::Logger;

pub(crate) fn create_pc(servers: &[IceServerConfig]) -> Result<web_sys::RtcPeerConnection, JsValue> {
    let rtc_config = web_sys::RtcConfiguration::new();
    let ice_servers_arr = js_sys::Array::new();

    for server_config in servers {
        let rtc_ice_server = web_sys::RtcIceServer::new();

        let urls = js_sys::Array::new();
        for url in &server_config.urls {
            urls.push(&JsValue::from_str(url));
        }
        rtc_ice_server.set_urls(&urls);

        if let Some(username) = &server_config.username {
            rtc_ice_server.set_username(username);
        }

        if let Some(credential) = &server_config.credential {
            rtc_ice_server.set_credential(credential);
        }

        ice_servers_arr.push(&rtc_ice_server);
    }

    if servers.is_empty() {
        Logger::warn("No ICE servers configured, only host candidates will work");
    }
    rtc_config.set_ice_servers(&ice_servers_arr);

    web_sys::RtcPeerConnection::new_with_configuration(&rtc_config)
}
