use leptos::ev;
use leptos::html::Input;
use leptos::prelude::*;
use leptos::task::spawn_local;
use web_sys::HtmlInputElement;

use webhook_chat::models::{Attachment, AttachmentKind};

use crate::media::{RECORDING_MIME, Recording, read_blob, start_recording};
use crate::state::AppState;

/// Button that opens a file picker and attaches the chosen image.
#[component]
pub fn ImageUploader(disabled: Signal<bool>) -> impl IntoView {
    let state = expect_context::<AppState>();
    let file_input = NodeRef::<Input>::new();

    let on_change = move |ev: ev::Event| {
        let input: HtmlInputElement = event_target(&ev);
        let file = input.files().and_then(|files| files.get(0));
        // Reset so the same file can be picked again
        input.set_value("");

        let Some(file) = file else {
            return;
        };
        let mime = file.type_();
        spawn_local(async move {
            match read_blob(&file).await {
                Ok(bytes) => state
                    .set_attachment
                    .set(Some(Attachment::new(AttachmentKind::Image, mime, bytes))),
                Err(e) => log::error!("Failed to read image file: {e}"),
            }
        });
    };

    view! {
        <input
            type="file"
            accept="image/*"
            style="display:none"
            node_ref=file_input
            on:change=on_change
        />
        <button
            class="icon-btn"
            title="Upload Image"
            disabled=move || disabled.get()
            on:click=move |_| {
                if let Some(input) = file_input.get() {
                    input.click();
                }
            }
        >
            "🖼"
        </button>
    }
}

/// Toggle button that records a voice note from the microphone.
#[component]
pub fn AudioRecorder(disabled: Signal<bool>) -> impl IntoView {
    let state = expect_context::<AppState>();
    let (is_recording, set_is_recording) = signal(false);
    // Kept until the next recording so its callbacks outlive `stop()`.
    let recording = StoredValue::new_local(None::<Recording>);

    let start = move || {
        spawn_local(async move {
            let started = start_recording(move |result| match result {
                Ok(bytes) => state.set_attachment.set(Some(Attachment::new(
                    AttachmentKind::Audio,
                    RECORDING_MIME,
                    bytes,
                ))),
                Err(e) => log::error!("Failed to read recording: {e}"),
            })
            .await;

            match started {
                Ok(rec) => {
                    recording.set_value(Some(rec));
                    set_is_recording.set(true);
                }
                Err(e) => {
                    log::error!("Error accessing microphone: {e}");
                    if let Some(window) = web_sys::window() {
                        let _ = window
                            .alert_with_message("Could not access microphone. Please check permissions.");
                    }
                }
            }
        });
    };

    let stop = move || {
        recording.with_value(|rec| {
            if let Some(rec) = rec {
                rec.stop();
            }
        });
        set_is_recording.set(false);
    };

    view! {
        <button
            class="icon-btn"
            class:recording=is_recording
            title=move || if is_recording.get() { "Stop Recording" } else { "Record Audio" }
            disabled=move || disabled.get()
            on:click=move |_| {
                if is_recording.get_untracked() {
                    stop();
                } else {
                    start();
                }
            }
        >
            {move || if is_recording.get() { "■" } else { "🎤" }}
        </button>
    }
}
