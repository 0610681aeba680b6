//! Unwrapping of the lesson-plan suggestion envelope.
//!
//! The service returns `{ "suggestion": [ { "suggestions": [ { "content": .. } ] } ] }`
//! where `content` is either the suggestion array itself or a string holding a
//! backslash-escaped, quoted, markdown-fenced serialization of it. All of the
//! string surgery needed for the second form is kept in this module.

use serde_json::{Number, Value};
use tracing::debug;

use crate::{
    domain::{DecodedSuggestions, SlideSuggestionGroup, Suggestion},
    error::DecodeError,
};

const ENVELOPE_KEY: &str = "suggestion";
const OPENING_FENCE: &str = "```json";
const CLOSING_FENCE: &str = "```";

pub fn decode_body(body: &[u8]) -> Result<DecodedSuggestions, DecodeError> {
    let raw: Value = serde_json::from_slice(body).map_err(|err| DecodeError::InvalidJson {
        message: err.to_string(),
    })?;
    decode(&raw)
}

/// Decodes a suggestion envelope into validated per-slide groups.
///
/// An envelope without a `suggestion` key is a valid "nothing to suggest"
/// answer and yields an empty list. Validation is all-or-nothing.
pub fn decode(raw: &Value) -> Result<DecodedSuggestions, DecodeError> {
    let Some(envelope) = raw.get(ENVELOPE_KEY).filter(|value| !value.is_null()) else {
        return Ok(Vec::new());
    };

    let content = envelope
        .get(0)
        .ok_or_else(|| missing("suggestion[0]"))?
        .get("suggestions")
        .ok_or_else(|| missing("suggestion[0].suggestions"))?
        .get(0)
        .ok_or_else(|| missing("suggestion[0].suggestions[0]"))?
        .get("content")
        .ok_or_else(|| missing("suggestion[0].suggestions[0].content"))?;

    let parsed;
    let candidate = match content {
        Value::String(text) => {
            let unwrapped = unwrap_content_text(text);
            debug!(len = unwrapped.len(), "unwrapped textual suggestion content");
            parsed = serde_json::from_str::<Value>(&unwrapped).map_err(|err| {
                DecodeError::InvalidJson {
                    message: err.to_string(),
                }
            })?;
            &parsed
        }
        structured => structured,
    };

    validate(candidate)
}

/// Removes the escaping artifacts the service wraps around textual content.
///
/// Order matters: the fence is only exposed once backslashes and the outer
/// quotes are gone.
pub fn unwrap_content_text(text: &str) -> String {
    let unescaped: String = text.chars().filter(|ch| *ch != '\\').collect();
    let unquoted = unescaped.strip_prefix('"').unwrap_or(&unescaped);
    let unquoted = unquoted.strip_suffix('"').unwrap_or(unquoted);
    strip_fence(unquoted).to_string()
}

fn strip_fence(text: &str) -> &str {
    let text = match text.trim_start().strip_prefix(OPENING_FENCE) {
        Some(rest) => rest.trim_start(),
        None => text,
    };
    match text.trim_end().strip_suffix(CLOSING_FENCE) {
        Some(rest) => rest.trim_end(),
        None => text,
    }
}

pub fn validate(candidate: &Value) -> Result<DecodedSuggestions, DecodeError> {
    let items = candidate.as_array().ok_or(DecodeError::NotAnArray {
        found: kind_of(candidate),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_group(index, item))
        .collect()
}

fn validate_group(index: usize, item: &Value) -> Result<SlideSuggestionGroup, DecodeError> {
    let path = format!("[{index}]");
    let object = item
        .as_object()
        .ok_or_else(|| violation(&path, format!("expected object, got {}", kind_of(item))))?;

    let slide_path = format!("{path}.slide");
    let slide = match object.get("slide") {
        Some(Value::Number(number)) => slide_number(number).ok_or_else(|| {
            violation(
                &slide_path,
                format!("expected a positive integer, got {number}"),
            )
        })?,
        Some(other) => {
            return Err(violation(
                &slide_path,
                format!("expected integer, got {}", kind_of(other)),
            ))
        }
        None => return Err(violation(&slide_path, "missing field".to_string())),
    };

    let suggestions_path = format!("{path}.suggestions");
    let suggestions = match object.get("suggestions") {
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(inner, entry)| validate_suggestion(&format!("{suggestions_path}[{inner}]"), entry))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(violation(
                &suggestions_path,
                format!("expected array, got {}", kind_of(other)),
            ))
        }
        None => return Err(violation(&suggestions_path, "missing field".to_string())),
    };

    Ok(SlideSuggestionGroup { slide, suggestions })
}

fn validate_suggestion(path: &str, entry: &Value) -> Result<Suggestion, DecodeError> {
    let object = entry
        .as_object()
        .ok_or_else(|| violation(path, format!("expected object, got {}", kind_of(entry))))?;
    let content = string_field(path, object.get("content"), "content")?;
    let link = string_field(path, object.get("link"), "link")?;
    Ok(Suggestion { content, link })
}

fn string_field(path: &str, value: Option<&Value>, name: &str) -> Result<String, DecodeError> {
    match value {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(violation(
            &format!("{path}.{name}"),
            format!("expected string, got {}", kind_of(other)),
        )),
        None => Err(violation(&format!("{path}.{name}"), "missing field".to_string())),
    }
}

fn missing(path: &str) -> DecodeError {
    DecodeError::MissingField {
        path: path.to_string(),
    }
}

fn violation(path: &str, reason: String) -> DecodeError {
    DecodeError::SchemaViolation {
        path: path.to_string(),
        reason,
    }
}

/// A 1-based slide number. Integral floats such as `1.0` count, since the
/// service serializes numbers loosely.
pub(crate) fn slide_number(number: &Number) -> Option<u32> {
    if let Some(slide) = number.as_u64() {
        return u32::try_from(slide).ok().filter(|slide| *slide >= 1);
    }
    let slide = number.as_f64()?;
    (slide.fract() == 0.0 && (1.0..=f64::from(u32::MAX)).contains(&slide)).then(|| slide as u32)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "tests/decode_tests.rs"]
mod tests;
