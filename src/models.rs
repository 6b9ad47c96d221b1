use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    #[serde(alias = "human")]
    User,
    #[serde(alias = "ai")]
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MessageRole {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "user" | "human" => Ok(MessageRole::User),
            "assistant" | "ai" => Ok(MessageRole::Assistant),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// A history row as returned by the webhook.
///
/// The backing store is not ours, so decoding is forgiving: ids may be
/// numbers, `content` may be null and `created_at` may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub role: MessageRole,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub created_at: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// How a message body should be rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Audio,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Audio => "audio",
        }
    }
}

/// A message ready for display, derived from a [`StoredMessage`] on every poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub kind: MessageKind,
    pub image_data_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The kind tag sent alongside an outgoing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Audio,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Audio => "audio",
        }
    }

    /// Fixed upload filename expected by the webhook.
    pub fn file_name(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image.png",
            AttachmentKind::Audio => "recording.webm",
        }
    }

    pub fn default_mime(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image/png",
            AttachmentKind::Audio => "audio/webm",
        }
    }
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file picked or recorded by the user, held until the next send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(kind: AttachmentKind, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime = mime.into();
        let mime = if mime.is_empty() {
            kind.default_mime().to_string()
        } else {
            mime
        };
        Self { kind, mime, bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_message_accepts_numeric_id_and_null_content() {
        let msg: StoredMessage = serde_json::from_str(
            r#"{"id": 42, "role": "assistant", "content": null, "created_at": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(msg.id.as_deref(), Some("42"));
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.content, "");
    }

    #[test]
    fn stored_message_accepts_role_aliases() {
        let msg: StoredMessage =
            serde_json::from_str(r#"{"role": "human", "content": "hi"}"#).unwrap();
        assert_eq!(msg.role, MessageRole::User);
        assert!(msg.id.is_none());
        assert!(msg.created_at.is_none());
    }

    #[test]
    fn role_try_from_is_case_insensitive() {
        assert_eq!(MessageRole::try_from("ASSISTANT".to_string()), Ok(MessageRole::Assistant));
        assert!(MessageRole::try_from("system".to_string()).is_err());
    }

    #[test]
    fn attachment_falls_back_to_default_mime() {
        let a = Attachment::new(AttachmentKind::Audio, "", vec![1, 2]);
        assert_eq!(a.mime, "audio/webm");
        assert_eq!(AttachmentKind::Audio.file_name(), "recording.webm");
        assert_eq!(AttachmentKind::Image.file_name(), "image.png");
    }
}
