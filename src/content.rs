//! Normalization of raw stored message bodies.
//!
//! The webhook stores everything in a single `content` column. Plain chat text
//! is stored as-is; attachments are stored as a small JSON envelope such as
//! `{"type":"image","text":"...","imageDataUrl":"data:..."}`.

use serde_json::Value;

use crate::models::MessageKind;

pub const IMAGE_UNAVAILABLE: &str = "Image unavailable";
pub const AUDIO_PLACEHOLDER: &str = "Audio message";

/// Displayable fields extracted from one raw body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedContent {
    pub content: String,
    pub kind: MessageKind,
    pub image_data_url: Option<String>,
}

impl NormalizedContent {
    fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            kind: MessageKind::Text,
            image_data_url: None,
        }
    }
}

/// Works out the display kind of `raw` and the fields to show.
///
/// Never fails: anything that is not a recognised envelope is shown verbatim.
pub fn normalize(raw: &str) -> NormalizedContent {
    if raw.is_empty() {
        return NormalizedContent::default();
    }

    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return NormalizedContent::text(raw);
    }

    let parsed = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map,
        _ => return NormalizedContent::text(raw),
    };

    let text = parsed.get("text").and_then(Value::as_str);

    match parsed.get("type").and_then(Value::as_str) {
        Some("image") => {
            let image_data_url = parsed
                .get("imageDataUrl")
                .and_then(Value::as_str)
                .map(str::to_string);
            let content = match text {
                Some(t) if !t.is_empty() => t.to_string(),
                _ if image_data_url.is_none() => IMAGE_UNAVAILABLE.to_string(),
                _ => String::new(),
            };
            NormalizedContent {
                content,
                kind: MessageKind::Image,
                image_data_url,
            }
        }
        Some("audio") => NormalizedContent {
            content: text
                .filter(|t| !t.is_empty())
                .unwrap_or(AUDIO_PLACEHOLDER)
                .to_string(),
            kind: MessageKind::Audio,
            image_data_url: None,
        },
        _ => match text {
            Some(t) => NormalizedContent::text(t),
            None => NormalizedContent::text(raw),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_text() {
        assert_eq!(normalize(""), NormalizedContent::default());
        assert_eq!(normalize("").kind, MessageKind::Text);
    }

    #[test]
    fn plain_text_passes_through_verbatim() {
        for s in ["hello", "  padded  ", "[1, 2, 3]", "\"quoted\"", " } {", "multi\nline"] {
            let n = normalize(s);
            assert_eq!(n.content, s);
            assert_eq!(n.kind, MessageKind::Text);
            assert!(n.image_data_url.is_none());
        }
    }

    #[test]
    fn image_with_text_only() {
        let n = normalize(r#"{"type":"image","text":"cat"}"#);
        assert_eq!(n.content, "cat");
        assert_eq!(n.kind, MessageKind::Image);
        assert!(n.image_data_url.is_none());
    }

    #[test]
    fn image_with_url_only_has_empty_content() {
        let n = normalize(r#"{"type":"image","imageDataUrl":"data:image/png;base64,AAAA"}"#);
        assert_eq!(n.content, "");
        assert_eq!(n.kind, MessageKind::Image);
        assert_eq!(n.image_data_url.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn image_without_anything_is_unavailable() {
        let n = normalize(r#"{"type":"image"}"#);
        assert_eq!(n.content, IMAGE_UNAVAILABLE);
        assert_eq!(n.kind, MessageKind::Image);
    }

    #[test]
    fn image_ignores_non_string_fields() {
        let n = normalize(r#"{"type":"image","imageDataUrl":7,"text":false}"#);
        assert_eq!(n.content, IMAGE_UNAVAILABLE);
        assert!(n.image_data_url.is_none());
    }

    #[test]
    fn audio_uses_placeholder_unless_text_present() {
        let n = normalize(r#"{"type":"audio"}"#);
        assert_eq!(n.content, AUDIO_PLACEHOLDER);
        assert_eq!(n.kind, MessageKind::Audio);

        let n = normalize(r#"{"type":"audio","text":""}"#);
        assert_eq!(n.content, AUDIO_PLACEHOLDER);

        let n = normalize(r#"{"type":"audio","text":"what's the weather"}"#);
        assert_eq!(n.content, "what's the weather");
    }

    #[test]
    fn untyped_envelope_with_text() {
        let n = normalize(r#"  {"text":"hi there"}"#);
        assert_eq!(n.content, "hi there");
        assert_eq!(n.kind, MessageKind::Text);
    }

    #[test]
    fn unknown_type_with_text_uses_text() {
        let n = normalize(r#"{"type":"video","text":"clip"}"#);
        assert_eq!(n.content, "clip");
        assert_eq!(n.kind, MessageKind::Text);
    }

    #[test]
    fn other_shapes_fall_back_to_raw() {
        let raw = r#"{"answer":42}"#;
        assert_eq!(normalize(raw), NormalizedContent::text(raw));
    }

    #[test]
    fn invalid_json_falls_back_to_raw() {
        let n = normalize("{not valid json");
        assert_eq!(n.content, "{not valid json");
        assert_eq!(n.kind, MessageKind::Text);
    }
}
