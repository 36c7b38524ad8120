//! Page encoders, one per response format.
//!
//! Encoders write the same shapes the service sends, so [`normalize`]
//! reads their output back into the page that was encoded, as long as that
//! page came out of [`normalize`] itself. xml, csv and tsv carry every scalar
//! as text. xml marks lists other than `LOS` with `type="array"`, so empty and
//! one-element lists survive. The delimited encodings flatten lists into
//! `a;b` cells and nested metadata into a json string. txt keeps only domains.
//! None of csv, tsv or txt carries the continuation token.
//!
//! [`normalize`]: crate::normalize::normalize

use crate::normalize::xml::LIST_ATTRIBUTE;
use crate::page::{KeywordRecord, Page, ResultRecord};
use crate::query::Endpoint;
use builtwith_core::{BuiltWithError, OutputFormat, Result};
use quick_xml::escape::escape;
use serde_json::{Map, Value};
use std::fmt::Write as _;

/// Column order for delimited tables; unknown codes follow in sorted order.
const KNOWN_CODES: &[&str] = &[
    "D", "LOS", "FD", "LD", "S", "SKU", "R", "F", "E", "A", "Q", "M", "U", "META",
];

/// Encode `page` as a response body of `format`.
///
/// # Errors
/// Returns a validation error if `endpoint` does not serve `format`.
pub fn encode(endpoint: Endpoint, format: OutputFormat, page: &Page) -> Result<String> {
    if !endpoint.supports(format) {
        return Err(BuiltWithError::Validation(format!(
            "format '{format}' is not served by the {endpoint:?} endpoint"
        )));
    }

    match (endpoint, format) {
        (_, OutputFormat::Json) => encode_json(endpoint, page),
        (Endpoint::Lists, OutputFormat::Xml) => Ok(lists_xml(page)),
        (Endpoint::Keywords, OutputFormat::Xml) => Ok(keywords_xml(&page.keywords)),
        (_, OutputFormat::Csv) => Ok(delimited(&page.results, ',')),
        (_, OutputFormat::Tsv) => Ok(delimited(&page.results, '\t')),
        (_, OutputFormat::Txt) => Ok(text(&page.results)),
    }
}

fn encode_json(endpoint: Endpoint, page: &Page) -> Result<String> {
    let encoded = match endpoint {
        Endpoint::Lists => serde_json::to_string_pretty(&Page {
            keywords: Vec::new(),
            ..page.clone()
        }),
        Endpoint::Keywords => {
            let mut document = Map::new();
            document.insert(
                "Keywords".to_string(),
                serde_json::to_value(&page.keywords)
                    .map_err(|e| BuiltWithError::parse(OutputFormat::Json, e.to_string()))?,
            );
            serde_json::to_string_pretty(&document)
        }
    };
    encoded.map_err(|e| BuiltWithError::parse(OutputFormat::Json, e.to_string()))
}

fn lists_xml(page: &Page) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Lists>\n");
    if let Some(next) = &page.next_offset {
        let _ = writeln!(out, "  <NextOffset>{}</NextOffset>", escape(next.as_str()));
    }
    out.push_str("  <Results>\n");
    for record in &page.results {
        out.push_str("    <Result>");
        for (code, value) in record_fields(record) {
            write_element(&mut out, &code, &value);
        }
        out.push_str("</Result>\n");
    }
    out.push_str("  </Results>\n</Lists>\n");
    out
}

fn keywords_xml(records: &[KeywordRecord]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<KeywordsResponse>\n");
    out.push_str("  <Keywords>\n");
    for record in records {
        let _ = write!(
            out,
            "    <Entry><Domain>{}</Domain><Keywords>",
            escape(record.domain.as_str())
        );
        for keyword in &record.keywords {
            let _ = write!(out, "<Keyword>{}</Keyword>", escape(keyword.as_str()));
        }
        out.push_str("</Keywords></Entry>\n");
    }
    out.push_str("  </Keywords>\n</KeywordsResponse>\n");
    out
}

fn write_element(out: &mut String, name: &str, value: &Value) {
    match value {
        Value::Null if name == "Item" => out.push_str("<Item/>"),
        Value::Null => {}
        Value::Array(items) if name == "LOS" => {
            out.push_str("<LOS>");
            for item in items {
                write_element(out, "L", item);
            }
            out.push_str("</LOS>");
        }
        Value::Array(items) => {
            let (attribute, marker) = LIST_ATTRIBUTE;
            let _ = write!(out, "<{name} {attribute}=\"{marker}\">");
            for item in items {
                write_element(out, "Item", item);
            }
            let _ = write!(out, "</{name}>");
        }
        Value::Object(map) => {
            let _ = write!(out, "<{name}>");
            for (child, value) in map {
                write_element(out, child, value);
            }
            let _ = write!(out, "</{name}>");
        }
        scalar => {
            let _ = write!(out, "<{name}>{}</{name}>", escape(scalar_text(scalar).as_str()));
        }
    }
}

fn delimited(records: &[ResultRecord], delimiter: char) -> String {
    let rows: Vec<Map<String, Value>> = records
        .iter()
        .map(|record| record_fields(record).into_iter().collect())
        .collect();

    let mut header: Vec<String> = KNOWN_CODES
        .iter()
        .filter(|code| **code == "D" || rows.iter().any(|row| row.contains_key(**code)))
        .map(ToString::to_string)
        .collect();
    let mut unknown: Vec<String> = rows
        .iter()
        .flat_map(|row| row.keys())
        .filter(|code| !KNOWN_CODES.contains(&code.as_str()))
        .cloned()
        .collect();
    unknown.sort();
    unknown.dedup();
    header.extend(unknown);

    let mut out = String::new();
    push_row(&mut out, header.iter().map(String::as_str), delimiter);
    for row in &rows {
        let cells: Vec<String> = header
            .iter()
            .map(|code| row.get(code).map(cell_text).unwrap_or_default())
            .collect();
        push_row(&mut out, cells.iter().map(String::as_str), delimiter);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, delimiter: char) {
    let cells: Vec<String> = cells.map(|cell| quote_cell(cell, delimiter)).collect();
    out.push_str(&cells.join(&delimiter.to_string()));
    out.push('\n');
}

fn quote_cell(cell: &str, delimiter: char) -> String {
    if delimiter == '\t' {
        // tsv has no quoting; tabs and line breaks cannot survive.
        return cell.replace(['\t', '\r', '\n'], " ");
    }
    if cell.contains([delimiter, '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(";"),
        Value::Object(_) => value.to_string(),
        scalar => scalar_text(scalar),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text(records: &[ResultRecord]) -> String {
    records
        .iter()
        .filter_map(|record| record.domain.as_deref())
        .fold(String::new(), |mut out, domain| {
            out.push_str(domain);
            out.push('\n');
            out
        })
}

/// A record's wire fields in serialization order.
fn record_fields(record: &ResultRecord) -> Vec<(String, Value)> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        _ => Vec::new(),
    }
}
