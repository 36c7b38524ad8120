//! Response normalization.
//!
//! Each format decoder turns a body into a json document with the service's
//! field names (`NextOffset`, `Results`, `Keywords`, ...). The document is then
//! validated once into a [`Page`], so the page shape never depends on the
//! format that was requested.
//!
//! Untyped metadata (`META` and unknown codes) is brought into one canonical
//! form: scalars become strings and null members are dropped. xml cannot
//! tell `5` from `"5"`, so json has to give that distinction up.

mod delimited;
pub(crate) mod xml;

use crate::page::{ContinuationToken, KeywordRecord, Page, ResultRecord};
use crate::query::Endpoint;
use builtwith_core::{BuiltWithError, OutputFormat, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Decode a successful response body into a [`Page`].
///
/// An absent or empty result sequence yields an empty page.
///
/// # Errors
/// Returns a parse error if the body is not valid in the declared format or
/// its records do not have the expected shape.
pub fn normalize(endpoint: Endpoint, format: OutputFormat, body: &str) -> Result<Page> {
    if !endpoint.supports(format) {
        return Err(BuiltWithError::Validation(format!(
            "format '{format}' is not served by the {endpoint:?} endpoint"
        )));
    }

    let document = decode_document(format, body)?;
    match endpoint {
        Endpoint::Lists => lists_page(format, document),
        Endpoint::Keywords => keywords_page(format, document),
    }
}

/// Decode a body into a json document without interpreting it.
pub(crate) fn decode_document(format: OutputFormat, body: &str) -> Result<Map<String, Value>> {
    match format {
        OutputFormat::Json => match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(BuiltWithError::parse(
                format,
                format!("expected a json object, got {}", type_name(&other)),
            )),
            Err(e) => Err(BuiltWithError::parse(format, e.to_string())),
        },
        OutputFormat::Xml => xml::decode(body),
        OutputFormat::Csv => delimited::decode_table(body, b',', true),
        OutputFormat::Tsv => delimited::decode_table(body, b'\t', false),
        OutputFormat::Txt => Ok(delimited::decode_lines(body)),
    }
}

fn lists_page(format: OutputFormat, mut document: Map<String, Value>) -> Result<Page> {
    let next_offset = match document.remove("NextOffset") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => ContinuationToken::from_wire(&s),
        Some(Value::Number(n)) => ContinuationToken::from_wire(&n.to_string()),
        Some(other) => {
            return Err(BuiltWithError::parse(
                format,
                format!("NextOffset must be a string, got {}", type_name(&other)),
            ))
        }
    };

    let mut results = records::<ResultRecord>(format, "Results", document.remove("Results"))?;
    for record in &mut results {
        canonicalize(record);
    }

    Ok(Page {
        next_offset,
        results,
        keywords: Vec::new(),
    })
}

fn canonicalize(record: &mut ResultRecord) {
    record.meta = record.meta.take().and_then(|meta| match meta {
        // Delimited bodies carry nested metadata as a json string.
        Value::String(s) if s.trim_start().starts_with(['{', '[']) => {
            match serde_json::from_str::<Value>(&s) {
                Ok(parsed) => canonical_value(parsed),
                Err(_) => Some(Value::String(s)),
            }
        }
        other => canonical_value(other),
    });

    let extra = std::mem::take(&mut record.extra);
    record.extra = extra
        .into_iter()
        .filter_map(|(code, value)| canonical_value(value).map(|value| (code, value)))
        .collect();
}

/// Canonical form of an untyped value; `None` for null.
fn canonical_value(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(Value::String(b.to_string())),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::String(s) => Some(Value::String(s)),
        Value::Array(items) => Some(Value::Array(
            items
                .into_iter()
                .map(|item| canonical_value(item).unwrap_or_else(|| Value::String(String::new())))
                .collect(),
        )),
        Value::Object(map) => Some(Value::Object(
            map.into_iter()
                .filter_map(|(key, value)| canonical_value(value).map(|value| (key, value)))
                .collect(),
        )),
    }
}

fn keywords_page(format: OutputFormat, mut document: Map<String, Value>) -> Result<Page> {
    // A single lookup may come back as one top-level record.
    let keywords = if document.contains_key("Domain") {
        vec![record::<KeywordRecord>(format, "Keywords", Value::Object(document))?]
    } else {
        records::<KeywordRecord>(format, "Keywords", document.remove("Keywords"))?
    };

    Ok(Page {
        next_offset: None,
        results: Vec::new(),
        keywords,
    })
}

fn records<T: DeserializeOwned>(
    format: OutputFormat,
    field: &str,
    value: Option<Value>,
) -> Result<Vec<T>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| record(format, field, item))
            .collect(),
        // xml collapses a one-element list into the element itself
        Some(item @ Value::Object(_)) => Ok(vec![record(format, field, item)?]),
        Some(other) => Err(BuiltWithError::parse(
            format,
            format!("{field} must be a list, got {}", type_name(&other)),
        )),
    }
}

fn record<T: DeserializeOwned>(format: OutputFormat, field: &str, item: Value) -> Result<T> {
    serde_json::from_value(item)
        .map_err(|e| BuiltWithError::parse(format, format!("malformed entry in {field}: {e}")))
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
