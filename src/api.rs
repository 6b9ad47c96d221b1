use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::multipart::{Form, Part};
use tracing::{debug, error, warn};

use crate::config::REQUEST_TIMEOUT;
use crate::envelope::{FormField, OutgoingEnvelope};
use crate::errors::ChatError;
use crate::history::decode_history;
use crate::models::StoredMessage;

/// HTTP client for the two chat webhooks.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
    base_url: String,
}

impl WebhookClient {
    /// Builds a client whose requests give up after [`REQUEST_TIMEOUT`].
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChatError> {
        let base_url = base_url.into();
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChatError::transport(&base_url, e))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn history_url(&self) -> String {
        format!("{}/webhook/history", self.base_url)
    }

    fn chat_url(&self) -> String {
        format!("{}/webhook/chat", self.base_url)
    }

    /// Reads the stored history of `session_id`.
    ///
    /// The empty-result sentinels of the webhook map to an empty list; only
    /// transport, status and non-JSON failures are errors.
    pub async fn try_fetch_history(&self, session_id: &str) -> Result<Vec<StoredMessage>, ChatError> {
        let url = self.history_url();
        let t = cache_buster();
        let resp = self
            .http
            .get(&url)
            .query(&[("sessionId", session_id), ("t", t.as_str())])
            .send()
            .await
            .map_err(|e| ChatError::transport(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ChatError::UnexpectedStatus { url, status: status.as_u16() });
        }

        let body = resp.text().await.map_err(|e| ChatError::transport(&url, e))?;
        let rows = decode_history(&body).map_err(ChatError::MalformedResponse)?;
        debug!("Fetched {} history rows for session {session_id}", rows.len());
        Ok(rows)
    }

    /// Like [`try_fetch_history`](Self::try_fetch_history), but any failure is
    /// logged and reported as an empty history.
    pub async fn fetch_history(&self, session_id: &str) -> Vec<StoredMessage> {
        self.try_fetch_history(session_id).await.unwrap_or_else(|e| {
            warn!("Polling error: {e}");
            Vec::new()
        })
    }

    /// Posts one message to the chat webhook. The response body is ignored.
    ///
    /// Only a request that never completed is an error. A non-2xx answer is
    /// logged and otherwise treated like any other completed post.
    pub async fn submit(&self, envelope: &OutgoingEnvelope) -> Result<(), ChatError> {
        let url = self.chat_url();
        let form = build_form(envelope).map_err(|e| ChatError::transport(&url, e))?;

        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatError::transport(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            error!("Chat webhook {url} answered with status {status}");
        }
        Ok(())
    }
}

fn build_form(envelope: &OutgoingEnvelope) -> Result<Form, reqwest::Error> {
    envelope
        .fields()
        .into_iter()
        .try_fold(Form::new(), |form, field| match field {
            FormField::Text { name, value } => Ok(form.text(name, value)),
            FormField::File { name, file_name, mime, bytes } => {
                let part = Part::bytes(bytes).file_name(file_name).mime_str(&mime)?;
                Ok(form.part(name, part))
            }
        })
}

fn cache_buster() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}
