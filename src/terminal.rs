//! Line-oriented front end: input commands and transcript printing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::errors::ChatError;
use crate::models::{Attachment, AttachmentKind, DisplayedMessage, MessageKind, MessageRole};

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Text(String),
    Image { path: PathBuf, caption: String },
    Audio { path: PathBuf },
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Command::Empty;
    }

    let trimmed = line.trim_start();
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };

    match head {
        "/quit" | "/exit" => Command::Quit,
        "/image" if !rest.is_empty() => {
            let (path, caption) = match rest.split_once(char::is_whitespace) {
                Some((path, caption)) => (path, caption.trim()),
                None => (rest, ""),
            };
            Command::Image {
                path: PathBuf::from(path),
                caption: caption.to_string(),
            }
        }
        "/audio" if !rest.is_empty() => Command::Audio { path: PathBuf::from(rest) },
        _ => Command::Text(line.to_string()),
    }
}

/// Loads a file from disk as an attachment of the given kind.
pub async fn read_attachment(kind: AttachmentKind, path: &Path) -> Result<Attachment, ChatError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ChatError::attachment(path, e))?;
    Ok(Attachment::new(kind, guess_mime(kind, path), bytes))
}

fn guess_mime(kind: AttachmentKind, path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match (kind, ext.as_deref()) {
        (AttachmentKind::Image, Some("jpg" | "jpeg")) => "image/jpeg",
        (AttachmentKind::Image, Some("gif")) => "image/gif",
        (AttachmentKind::Image, Some("webp")) => "image/webp",
        (AttachmentKind::Audio, Some("ogg" | "oga")) => "audio/ogg",
        (AttachmentKind::Audio, Some("mp3")) => "audio/mpeg",
        (AttachmentKind::Audio, Some("wav")) => "audio/wav",
        (kind, _) => kind.default_mime(),
    }
}

pub fn render_message(msg: &DisplayedMessage) -> String {
    let time = msg.timestamp.with_timezone(&Local).format("%H:%M:%S");
    let who = match msg.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "assistant",
    };
    let tag = match (msg.kind, &msg.image_data_url) {
        (MessageKind::Audio, _) => " (Audio)",
        (MessageKind::Image, Some(_)) => " [image attached]",
        (MessageKind::Image, None) => " (Image)",
        (MessageKind::Text, _) => "",
    };
    format!("[{time}] {who}: {}{tag}", msg.content)
}

/// Remembers what has already been printed so that each poll only prints
/// messages that are new or whose rendering changed.
#[derive(Debug, Default)]
pub struct Transcript {
    printed: HashMap<String, String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&mut self, messages: &[DisplayedMessage]) -> Vec<String> {
        messages
            .iter()
            .filter_map(|msg| {
                let line = render_message(msg);
                match self.printed.get(&msg.id) {
                    Some(prev) if *prev == line => None,
                    _ => {
                        self.printed.insert(msg.id.clone(), line.clone());
                        Some(line)
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn msg(id: &str, role: MessageRole, content: &str) -> DisplayedMessage {
        DisplayedMessage {
            id: id.to_string(),
            role,
            content: content.to_string(),
            kind: MessageKind::Text,
            image_data_url: None,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn commands_are_parsed() {
        assert_eq!(parse_command("hello there\n"), Command::Text("hello there".into()));
        assert_eq!(parse_command("   "), Command::Empty);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(
            parse_command("/image cat.png what is this?"),
            Command::Image { path: "cat.png".into(), caption: "what is this?".into() }
        );
        assert_eq!(
            parse_command("/audio memo.webm"),
            Command::Audio { path: "memo.webm".into() }
        );
        // a bare command word is just text
        assert_eq!(parse_command("/image"), Command::Text("/image".into()));
    }

    #[test]
    fn mime_is_guessed_from_extension() {
        assert_eq!(guess_mime(AttachmentKind::Image, Path::new("a.JPG")), "image/jpeg");
        assert_eq!(guess_mime(AttachmentKind::Image, Path::new("a")), "image/png");
        assert_eq!(guess_mime(AttachmentKind::Audio, Path::new("a.webm")), "audio/webm");
    }

    #[test]
    fn transcript_prints_only_changes() {
        let mut transcript = Transcript::new();
        let first = vec![msg("1", MessageRole::User, "hi")];
        assert_eq!(transcript.updates(&first).len(), 1);
        assert!(transcript.updates(&first).is_empty());

        let second = vec![
            msg("1", MessageRole::User, "hi"),
            msg("2", MessageRole::Assistant, "hello"),
        ];
        let lines = transcript.updates(&second);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("assistant: hello"));
    }

    #[tokio::test]
    async fn missing_attachment_is_an_error() {
        let err = read_attachment(AttachmentKind::Image, Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(err.is_local());
    }
}
