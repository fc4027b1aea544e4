use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::config::SERVICE_ERROR_TEXT;

const OUTPUT_MARKER: &str = r#"{"output":"#;

fn sentence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]+").expect("sentence pattern is valid"))
}

/// Turns a successful reply body into the ordered segments to display.
pub fn parse_reply(raw_body: &str) -> Vec<String> {
    let payload = decode_body(raw_body);
    split_sentences(&extract_reply_text(&payload))
}

/// Error text for a non-success response.
pub fn service_error_text(raw_body: &str) -> String {
    match serde_json::from_str::<Value>(raw_body) {
        Ok(payload) => field_text(&payload, "message")
            .or_else(|| field_text(&payload, "error"))
            .unwrap_or_else(|| SERVICE_ERROR_TEXT.to_string()),
        Err(_) if !raw_body.is_empty() => raw_body.to_string(),
        Err(_) => SERVICE_ERROR_TEXT.to_string(),
    }
}

/// Bodies that are not JSON are treated as a bare string payload.
fn decode_body(raw_body: &str) -> Value {
    serde_json::from_str(raw_body).unwrap_or_else(|_| Value::String(raw_body.to_string()))
}

pub fn extract_reply_text(payload: &Value) -> String {
    if let Some(text) = field_text(payload, "output")
        .or_else(|| field_text(payload, "text"))
        .or_else(|| field_text(payload, "message"))
    {
        return text;
    }

    if let Value::String(text) = payload {
        return text.clone();
    }

    // Some webhook flows double-encode the reply; peel the wrapper off by hand.
    let serialized = payload.to_string();
    let stripped = serialized.strip_prefix(OUTPUT_MARKER).unwrap_or(&serialized);
    let stripped = stripped.strip_suffix('}').unwrap_or(stripped);
    stripped.replace("\\n", "\n").trim().to_string()
}

/// Splits on runs ending in `.`, `!` or `?`. Text without any terminal
/// punctuation is one sentence; trailing text after the last terminator is
/// not part of any sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let re = sentence_re();
    let sentences: Vec<&str> = if re.is_match(text) {
        re.find_iter(text).map(|m| m.as_str()).collect()
    } else {
        vec![text]
    };

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A field's value if it is present and truthy. Non-string values are
/// rendered as JSON text.
fn field_text(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
