use std::cell::RefCell;
use std::rc::Rc;

use leptos::task::spawn_local;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobEvent, BlobPropertyBag, MediaRecorder, MediaStream, MediaStreamConstraints, MediaStreamTrack};

/// MIME type of recorded voice notes.
pub const RECORDING_MIME: &str = "audio/webm";

pub fn js_error(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// Reads the full contents of a blob (or a picked `File`).
pub async fn read_blob(blob: &Blob) -> Result<Vec<u8>, String> {
    let buffer = JsFuture::from(blob.array_buffer()).await.map_err(js_error)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

pub fn bytes_to_blob(bytes: &[u8], mime: &str) -> Result<Blob, String> {
    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_error)
}

/// A running microphone recording. Stopping it hands the recorded bytes to
/// the callback given to [`start_recording`] and releases the microphone.
pub struct Recording {
    recorder: MediaRecorder,
    _on_data: Closure<dyn FnMut(BlobEvent)>,
    _on_stop: Closure<dyn FnMut()>,
}

impl Recording {
    pub fn stop(&self) {
        if let Err(e) = self.recorder.stop() {
            log::error!("Failed to stop recorder: {}", js_error(e));
        }
    }
}

/// Asks for microphone access and starts recording.
///
/// Fails if the browser has no media devices or the user denies access.
pub async fn start_recording(
    on_done: impl FnOnce(Result<Vec<u8>, String>) + 'static,
) -> Result<Recording, String> {
    let window = web_sys::window().ok_or("No window available")?;
    let devices = window.navigator().media_devices().map_err(js_error)?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);
    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(js_error)?;
    let stream: MediaStream = JsFuture::from(promise)
        .await
        .map_err(js_error)?
        .dyn_into()
        .map_err(js_error)?;

    let recorder = MediaRecorder::new_with_media_stream(&stream).map_err(js_error)?;
    let chunks: Rc<RefCell<Vec<Blob>>> = Rc::new(RefCell::new(Vec::new()));

    // --- ondataavailable: collect non-empty chunks ---
    let chunks_in = chunks.clone();
    let on_data = Closure::<dyn FnMut(BlobEvent)>::new(move |ev: BlobEvent| {
        if let Some(data) = ev.data().filter(|b| b.size() > 0.0) {
            chunks_in.borrow_mut().push(data);
        }
    });
    recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));

    // --- onstop: join chunks, release the microphone, report ---
    let mut on_done = Some(on_done);
    let on_stop = Closure::<dyn FnMut()>::new(move || {
        let parts = js_sys::Array::new();
        for chunk in chunks.borrow_mut().drain(..) {
            parts.push(&chunk);
        }
        for track in stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }

        let Some(on_done) = on_done.take() else {
            return;
        };
        let options = BlobPropertyBag::new();
        options.set_type(RECORDING_MIME);
        match Blob::new_with_blob_sequence_and_options(&parts, &options) {
            Ok(blob) => spawn_local(async move { on_done(read_blob(&blob).await) }),
            Err(e) => on_done(Err(js_error(e))),
        }
    });
    recorder.set_onstop(Some(on_stop.as_ref().unchecked_ref()));

    recorder.start().map_err(js_error)?;

    Ok(Recording {
        recorder,
        _on_data: on_data,
        _on_stop: on_stop,
    })
}
