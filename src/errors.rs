use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors of the native client. None of them is fatal to a running session:
/// callers log them and fall back to a safe default.
#[derive(Debug, Error)]
pub enum ChatError {
    // ── Webhook errors ───────────────────────────────────────────────────────
    #[error("Webhook request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Webhook {url} answered with status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("History response is not JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    // ── Local errors ─────────────────────────────────────────────────────────
    #[error("Session storage at {} is unusable: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read attachment {}: {source}", .path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration for {name}: {message}")]
    InvalidConfig { name: String, message: String },
}

impl ChatError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        ChatError::Transport { url: url.into(), source }
    }

    pub fn storage(path: &Path, source: std::io::Error) -> Self {
        ChatError::Storage { path: path.to_path_buf(), source }
    }

    pub fn attachment(path: &Path, source: std::io::Error) -> Self {
        ChatError::Attachment { path: path.to_path_buf(), source }
    }

    /// The webhook could not be reached or answered with an error.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ChatError::Transport { .. } | ChatError::UnexpectedStatus { .. } | ChatError::MalformedResponse(_)
        )
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ChatError::Storage { .. } | ChatError::Attachment { .. })
    }
}
