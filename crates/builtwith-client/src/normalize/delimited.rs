//! csv, tsv and txt bodies to json documents.
//!
//! Tables carry a header row of field codes. None of these encodings
//! carries a continuation token.

use builtwith_core::{BuiltWithError, OutputFormat, Result};
use serde_json::{Map, Value};

/// Decode a header + rows table into `{"Results": [...]}`.
///
/// Empty cells are left out of the record. With `quoted`, fields follow csv
/// quoting rules (`"a, b"`, `""` for a literal quote).
pub(super) fn decode_table(body: &str, delimiter: u8, quoted: bool) -> Result<Map<String, Value>> {
    let format = if delimiter == b'\t' {
        OutputFormat::Tsv
    } else {
        OutputFormat::Csv
    };

    let rows: Vec<Vec<String>> = if quoted {
        split_quoted(body, char::from(delimiter), format)?
    } else {
        body.lines()
            .map(|line| {
                line.trim_end_matches('\r')
                    .split(char::from(delimiter))
                    .map(ToString::to_string)
                    .collect()
            })
            .collect()
    };

    let mut rows = rows
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()));

    let mut results = Vec::new();
    if let Some(header) = rows.next() {
        let header: Vec<String> = header.iter().map(|code| code.trim().to_string()).collect();
        for (index, row) in rows.enumerate() {
            if row.len() != header.len() {
                return Err(BuiltWithError::parse(
                    format,
                    format!(
                        "row {} has {} fields, header has {}",
                        index + 1,
                        row.len(),
                        header.len()
                    ),
                ));
            }
            let record: Map<String, Value> = header
                .iter()
                .zip(row)
                .filter(|(_, cell)| !cell.trim().is_empty())
                .map(|(code, cell)| (code.clone(), Value::String(cell.trim().to_string())))
                .collect();
            results.push(Value::Object(record));
        }
    }

    let mut document = Map::new();
    document.insert("Results".to_string(), Value::Array(results));
    Ok(document)
}

/// Decode one domain per line into `{"Results": [{"D": ...}, ...]}`.
pub(super) fn decode_lines(body: &str) -> Map<String, Value> {
    let results = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|domain| {
            let mut record = Map::new();
            record.insert("D".to_string(), Value::String(domain.to_string()));
            Value::Object(record)
        })
        .collect();

    let mut document = Map::new();
    document.insert("Results".to_string(), Value::Array(results));
    document
}

fn split_quoted(body: &str, delimiter: char, format: OutputFormat) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            c if c == delimiter => row.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(BuiltWithError::parse(format, "unterminated quoted field"));
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}
