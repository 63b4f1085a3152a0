use crate::error::ClientError;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{DisplayMediaStreamConstraints, MediaStream, MediaStreamConstraints, MediaStreamTrack};

fn media_devices() -> Result<web_sys::MediaDevices, ClientError> {
    let window = web_sys::window().ok_or(ClientError::NoWindow)?;
    Ok(window.navigator().media_devices()?)
}

/// Camera and microphone, as the call's shared local stream.
pub(crate) async fn capture_camera() -> Result<MediaStream, ClientError> {
    let constraints = MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);
    constraints.set_video(&JsValue::TRUE);

    let promise = media_devices()?.get_user_media_with_constraints(&constraints)?;
    Ok(JsFuture::from(promise).await?.dyn_into::<MediaStream>()?)
}

pub(crate) async fn capture_screen() -> Result<MediaStream, ClientError> {
    let constraints = DisplayMediaStreamConstraints::new();
    constraints.set_video(&JsValue::TRUE);

    let promise = media_devices()?.get_display_media_with_constraints(&constraints)?;
    Ok(JsFuture::from(promise).await?.dyn_into::<MediaStream>()?)
}

pub(crate) fn tracks(array: &js_sys::Array) -> Vec<MediaStreamTrack> {
    array
        .iter()
        .filter_map(|t| t.dyn_into::<MediaStreamTrack>().ok())
        .collect()
}

pub(crate) fn video_track(stream: &MediaStream) -> Option<MediaStreamTrack> {
    tracks(&stream.get_video_tracks()).into_iter().next()
}

pub(crate) fn stop_tracks(stream: &MediaStream) {
    for track in tracks(&stream.get_tracks()) {
        track.stop();
    }
}
