//! Decoding of the history webhook response.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::content::normalize;
use crate::models::{DisplayedMessage, StoredMessage};

/// Message the workflow engine returns when the history query matched nothing.
pub const NO_ITEM_MESSAGE: &str = "No item to return was found";

/// Decodes a raw response body into stored messages.
///
/// Fails only when `body` is not JSON at all. Every JSON shape is accepted:
/// the empty sentinels and unknown shapes become an empty list.
pub fn decode_history(body: &str) -> Result<Vec<StoredMessage>, serde_json::Error> {
    let value: Value = serde_json::from_str(body)?;
    Ok(history_from_value(value))
}

/// Extracts the message rows from an already-parsed response.
pub fn history_from_value(value: Value) -> Vec<StoredMessage> {
    if is_empty_sentinel(&value) {
        return Vec::new();
    }

    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value::<StoredMessage>(row) {
            Ok(msg) => Some(msg),
            Err(e) => {
                log::warn!("Skipping malformed history row {index}: {e}");
                None
            }
        })
        .collect()
}

fn is_empty_sentinel(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    map.get("message").and_then(Value::as_str) == Some(NO_ITEM_MESSAGE)
        || map.get("code").and_then(Value::as_f64) == Some(0.0)
}

/// Parses a stored `created_at` value.
///
/// Accepts RFC 3339 and the space-separated form databases commonly emit,
/// which is taken to be UTC.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Turns one fetch result into the list to display.
///
/// Rows without an id are keyed by their position; rows without a usable
/// timestamp are stamped with `fetched_at`.
pub fn to_displayed(rows: &[StoredMessage], fetched_at: DateTime<Utc>) -> Vec<DisplayedMessage> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let normalized = normalize(&row.content);
            DisplayedMessage {
                id: row.id.clone().unwrap_or_else(|| index.to_string()),
                role: row.role,
                content: normalized.content,
                kind: normalized.kind,
                image_data_url: normalized.image_data_url,
                timestamp: row
                    .created_at
                    .as_deref()
                    .and_then(parse_created_at)
                    .unwrap_or(fetched_at),
            }
        })
        .collect()
}
