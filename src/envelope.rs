//! Encoding of outgoing messages as multipart form fields.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::models::Attachment;

/// One part of the multipart body posted to the chat webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text {
        name: &'static str,
        value: String,
    },
    File {
        name: &'static str,
        file_name: &'static str,
        mime: String,
        bytes: Vec<u8>,
    },
}

impl FormField {
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }
}

/// Everything a single send posts to the webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEnvelope {
    pub session_id: String,
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl OutgoingEnvelope {
    /// Form fields in the order the webhook reads them.
    ///
    /// Images carry a second, data-URL copy of the same bytes so the workflow
    /// can store the picture alongside the message without re-reading the file.
    pub fn fields(&self) -> Vec<FormField> {
        let mut fields = vec![FormField::Text {
            name: "sessionId",
            value: self.session_id.clone(),
        }];

        if !self.text.is_empty() {
            fields.push(FormField::Text {
                name: "text",
                value: self.text.clone(),
            });
        }

        if let Some(attachment) = &self.attachment {
            fields.push(FormField::File {
                name: "file",
                file_name: attachment.kind.file_name(),
                mime: attachment.mime.clone(),
                bytes: attachment.bytes.clone(),
            });
            fields.push(FormField::Text {
                name: "fileType",
                value: attachment.kind.as_str().to_string(),
            });
            if attachment.kind == crate::models::AttachmentKind::Image {
                fields.push(FormField::Text {
                    name: "imageDataUrl",
                    value: data_url(&attachment.mime, &attachment.bytes),
                });
            }
        }

        fields
    }
}

/// `data:` URL with a base64 payload, as a browser `FileReader` would produce.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    let mime = if mime.is_empty() {
        "application/octet-stream"
    } else {
        mime
    };
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// What the user is composing: the input box plus at most one attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl Draft {
    pub fn is_sendable(&self) -> bool {
        !self.text.trim().is_empty() || self.attachment.is_some()
    }

    /// Empties the draft and returns what should be posted.
    ///
    /// Returns `None` and leaves the draft alone when there is nothing to send.
    pub fn take_envelope(&mut self, session_id: &str) -> Option<OutgoingEnvelope> {
        if !self.is_sendable() {
            return None;
        }
        let draft = std::mem::take(self);
        Some(OutgoingEnvelope {
            session_id: session_id.to_string(),
            text: draft.text,
            attachment: draft.attachment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttachmentKind;

    fn names(fields: &[FormField]) -> Vec<&'static str> {
        fields.iter().map(FormField::name).collect()
    }

    #[test]
    fn text_only_message() {
        let env = OutgoingEnvelope {
            session_id: "single-user".into(),
            text: "hello".into(),
            attachment: None,
        };
        assert_eq!(names(&env.fields()), ["sessionId", "text"]);
    }

    #[test]
    fn empty_text_is_omitted() {
        let env = OutgoingEnvelope {
            session_id: "single-user".into(),
            text: String::new(),
            attachment: Some(Attachment::new(AttachmentKind::Audio, "audio/webm", vec![9])),
        };
        let fields = env.fields();
        assert_eq!(names(&fields), ["sessionId", "file", "fileType"]);
        assert_eq!(
            fields[1],
            FormField::File {
                name: "file",
                file_name: "recording.webm",
                mime: "audio/webm".into(),
                bytes: vec![9],
            }
        );
        assert_eq!(
            fields[2],
            FormField::Text { name: "fileType", value: "audio".into() }
        );
    }

    #[test]
    fn image_carries_data_url_copy() {
        let env = OutgoingEnvelope {
            session_id: "single-user".into(),
            text: "look".into(),
            attachment: Some(Attachment::new(AttachmentKind::Image, "image/jpeg", b"abc".to_vec())),
        };
        let fields = env.fields();
        assert_eq!(names(&fields), ["sessionId", "text", "file", "fileType", "imageDataUrl"]);
        assert_eq!(
            fields[4],
            FormField::Text {
                name: "imageDataUrl",
                value: "data:image/jpeg;base64,YWJj".into(),
            }
        );
        match &fields[2] {
            FormField::File { file_name, .. } => assert_eq!(*file_name, "image.png"),
            other => panic!("unexpected field {other:?}"),
        }
    }

    #[test]
    fn take_envelope_clears_draft() {
        let mut draft = Draft { text: "hi".into(), attachment: None };
        let env = draft.take_envelope("single-user").unwrap();
        assert_eq!(env.text, "hi");
        assert_eq!(draft, Draft::default());
    }

    #[test]
    fn blank_draft_is_not_sent() {
        let mut draft = Draft { text: "   ".into(), attachment: None };
        assert!(draft.take_envelope("single-user").is_none());
        assert_eq!(draft.text, "   ");
    }
}
