use gloo_net::http::Request;
use wasm_bindgen::JsValue;
use web_sys::FormData;

use webhook_chat::envelope::{FormField, OutgoingEnvelope};
use webhook_chat::history::decode_history;
use webhook_chat::models::StoredMessage;

use crate::media::{bytes_to_blob, js_error};

/// Base URL of the chat webhooks, fixed at build time. Empty means same origin.
const API_BASE: &str = match option_env!("CHAT_API_BASE_URL") {
    Some(url) => url,
    None => "",
};

/// Fetches the stored history of a session.
pub async fn fetch_history(session_id: &str) -> Result<Vec<StoredMessage>, String> {
    let cache_buster = js_sys::Date::now() as u64;
    let resp = Request::get(&format!(
        "{API_BASE}/webhook/history?sessionId={session_id}&t={cache_buster}"
    ))
    .send()
    .await
    .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        return Err(format!("Server error: {}", resp.status()));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| format!("Read error: {e}"))?;
    decode_history(&body).map_err(|e| format!("Parse error: {e}"))
}

/// Posts a message to the chat webhook as multipart form data.
/// The response body is not read; a non-2xx status is only logged.
pub async fn send_message(envelope: &OutgoingEnvelope) -> Result<(), String> {
    let form = build_form(envelope)?;

    let resp = Request::post(&format!("{API_BASE}/webhook/chat"))
        .body(form)
        .map_err(|e| format!("Request error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        log::error!("Chat webhook answered with status {}", resp.status());
    }
    Ok(())
}

fn build_form(envelope: &OutgoingEnvelope) -> Result<FormData, String> {
    let form = FormData::new().map_err(js_error)?;
    for field in envelope.fields() {
        let appended: Result<(), JsValue> = match field {
            FormField::Text { name, value } => form.append_with_str(name, &value),
            FormField::File { name, file_name, mime, bytes } => {
                let blob = bytes_to_blob(&bytes, &mime)?;
                form.append_with_blob_and_filename(name, &blob, file_name)
            }
        };
        appended.map_err(js_error)?;
    }
    Ok(form)
}
