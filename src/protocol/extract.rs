// src/protocol/extract.rs

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::protocol::ActionDescriptor;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no JSON action list found in reply")]
    NotFound,
    #[error("failed to parse action list: {0}")]
    Parse(#[from] serde_json::Error),
}

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-block regex"));

/// Type recorded for list entries that carry no readable `type`.
pub const UNTYPED_ACTION: &str = "<untyped>";

/// Pulls an action list out of a raw assistant reply.
///
/// Accepts a bare JSON array or an object with an `actions` array, optionally
/// surrounded by prose, Markdown fences or `<think>` blocks. Bracketed prose
/// that is not an action list is skipped. Entries that do not decode keep
/// their slot as rejected descriptors so the rest of the batch still runs.
pub fn parse_action_list(raw: &str) -> Result<Vec<ActionDescriptor>, ExtractError> {
    let without_thoughts = THINK_BLOCK.replace_all(raw, "");

    let cleaned = without_thoughts
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            !line.starts_with("```") && !line.starts_with("<think>") && !line.starts_with("</think>")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let items = locate_action_items(&cleaned)?;
    Ok(items.into_iter().map(decode_descriptor).collect())
}

/// Tries each `[` / `{` in turn and keeps the first value shaped like an
/// action list. A parsed value that does not qualify is skipped as a whole.
fn locate_action_items(text: &str) -> Result<Vec<Value>, ExtractError> {
    let mut first_error = None;
    let mut resume_at = 0;

    for (start, ch) in text.char_indices() {
        if start < resume_at || !matches!(ch, '[' | '{') {
            continue;
        }

        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                if let Some(items) = action_items(value) {
                    return Ok(items);
                }
                resume_at = start + stream.byte_offset();
            }
            Some(Err(err)) if first_error.is_none() => first_error = Some(err),
            Some(Err(_)) => {}
            None => {}
        }
    }

    Err(first_error.map_or(ExtractError::NotFound, ExtractError::Parse))
}

fn action_items(value: Value) -> Option<Vec<Value>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("actions") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };

    (items.is_empty() || items.iter().any(Value::is_object)).then_some(items)
}

fn decode_descriptor(item: Value) -> ActionDescriptor {
    let action_type = item
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(UNTYPED_ACTION)
        .to_string();

    serde_json::from_value(item).unwrap_or_else(|err| {
        warn!("⚠️ undecodable {} entry in action list: {}", action_type, err);
        ActionDescriptor::rejected(&action_type, err.to_string())
    })
}
