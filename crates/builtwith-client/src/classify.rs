//! Error classification for raw service responses.

use crate::normalize::decode_document;
use builtwith_core::{BuiltWithError, OutputFormat};
use serde_json::Value;

/// Longest slice of a raw body copied into an error message.
const MAX_BODY_EXCERPT: usize = 200;

/// Map a status and body to at most one error.
///
/// | status | outcome |
/// |---|---|
/// | 2xx, clean body | `None` |
/// | 2xx, non-empty `Errors` field | `Request` |
/// | 401, 403 | `Authentication` |
/// | 429 | `RateLimited` |
/// | other 4xx (400, 404, 422, ...) | `Request` |
/// | 5xx | `Service` |
/// | anything else | `Service` (unexpected status) |
#[must_use]
pub fn classify(status: u16, format: OutputFormat, body: &str) -> Option<BuiltWithError> {
    let embedded = embedded_errors(format, body);

    if (200..300).contains(&status) {
        return embedded.map(|message| BuiltWithError::Request { status, message });
    }

    let message = embedded.unwrap_or_else(|| excerpt(status, body));
    let error = match status {
        401 | 403 => BuiltWithError::Authentication { status, message },
        429 => BuiltWithError::RateLimited { message },
        400..=499 => BuiltWithError::Request { status, message },
        500..=599 => BuiltWithError::Service { status, message },
        _ => BuiltWithError::Service {
            status,
            message: format!("unexpected status: {message}"),
        },
    };
    Some(error)
}

/// Messages from a non-empty `Errors` field, joined with `; `.
fn embedded_errors(format: OutputFormat, body: &str) -> Option<String> {
    // Error bodies are often json even when another format was requested.
    let document = match format {
        OutputFormat::Xml => decode_document(OutputFormat::Xml, body)
            .or_else(|_| decode_document(OutputFormat::Json, body)),
        _ => decode_document(OutputFormat::Json, body),
    }
    .ok()?;

    let messages: Vec<String> = match document.get("Errors")? {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.trim().to_string()],
        Value::Array(items) => items.iter().map(error_message).collect(),
        other => vec![error_message(other)],
    };

    let messages: Vec<String> = messages.into_iter().filter(|m| !m.is_empty()).collect();
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

fn error_message(item: &Value) -> String {
    match item {
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) => {
            let message = map
                .get("Message")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|m| !m.is_empty());
            let lookup = map
                .get("Lookup")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|l| !l.is_empty());
            match (lookup, message) {
                (Some(lookup), Some(message)) => format!("{lookup}: {message}"),
                (None, Some(message)) => message.to_string(),
                _ if map.is_empty() => String::new(),
                _ => item.to_string(),
            }
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn excerpt(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    let mut excerpt: String = body.chars().take(MAX_BODY_EXCERPT).collect();
    if body.chars().count() > MAX_BODY_EXCERPT {
        excerpt.push('…');
    }
    excerpt
}
