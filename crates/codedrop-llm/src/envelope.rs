//! Field extraction from backend response envelopes
//!
//! Replies are plain JSON objects, or newline-delimited JSON when the
//! server streams anyway. Lookups are lenient: a missing or malformed
//! field is `None`, never an error.

use serde_json::Value;

/// First string stored under `key`, searching depth-first.
///
/// Returns `None` when `json` does not parse or no string is found.
///
/// ```rust
/// use codedrop_llm::envelope::get_string;
///
/// let body = r#"{"message":{"role":"assistant","content":"FILE: a.txt"}}"#;
/// assert_eq!(get_string(body, "content").as_deref(), Some("FILE: a.txt"));
/// assert_eq!(get_string(body, "missing"), None);
/// ```
#[must_use]
pub fn get_string(json: &str, key: &str) -> Option<String> {
    let value: Value = serde_json::from_str(json).ok()?;
    find_string(&value, key).map(str::to_owned)
}

/// Depth-first search for a string under `key` inside a parsed value.
#[must_use]
pub fn find_string<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get(key) {
                return Some(s);
            }
            map.values().find_map(|v| find_string(v, key))
        }
        Value::Array(items) => items.iter().find_map(|v| find_string(v, key)),
        _ => None,
    }
}

/// First unsigned integer stored under `key` at the top level.
#[must_use]
pub fn get_u64(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}

/// Reply text of a chat envelope.
///
/// Tries `message.content`, then any `content`, then stream chunks.
#[must_use]
pub fn chat_reply(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(content) = value
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
        {
            return content.to_owned();
        }
        if let Some(content) = find_string(&value, "content") {
            return content.to_owned();
        }
    }
    stream_content(body)
}

/// Concatenated `response` and `content` fields of each NDJSON line.
#[must_use]
pub fn stream_content(body: &str) -> String {
    let mut out = String::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Ok(chunk) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if let Some(piece) = find_string(&chunk, "response") {
            out.push_str(piece);
        }
        if let Some(piece) = find_string(&chunk, "content") {
            out.push_str(piece);
        }
    }
    out
}
