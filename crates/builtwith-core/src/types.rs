//! Shared types used across the BuiltWith client.
//!
//! This module defines validated newtypes and enums for the values that cross
//! the wire: response formats, country filters, credentials and timestamps.

use crate::error::BuiltWithError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Response encodings offered by the service.
///
/// The format is part of the endpoint path (`api.json`, `api.xml`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON (default)
    #[default]
    Json,
    /// XML
    Xml,
    /// Plain text, one domain per line
    Txt,
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
}

impl OutputFormat {
    /// Every format, in documentation order.
    pub const ALL: [Self; 5] = [Self::Json, Self::Xml, Self::Txt, Self::Csv, Self::Tsv];

    /// Wire name, also used as the endpoint file extension.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
        }
    }

    /// Whether the keywords endpoint serves this format.
    #[must_use]
    pub fn supports_keywords(&self) -> bool {
        matches!(self, Self::Json | Self::Xml)
    }

    /// Whether responses in this format carry a continuation token.
    #[must_use]
    pub fn carries_continuation(&self) -> bool {
        matches!(self, Self::Json | Self::Xml)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = BuiltWithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                BuiltWithError::Validation(format!(
                    "unknown format '{s}': expected one of json, xml, txt, csv, tsv"
                ))
            })
    }
}

/// ISO 3166-1 alpha-2 country code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    /// Create a new `CountryCode`.
    ///
    /// # Errors
    /// Returns error unless the code is exactly two ASCII letters.
    pub fn new(code: impl Into<String>) -> Result<Self, BuiltWithError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> Result<(), BuiltWithError> {
        static COUNTRY_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex =
            COUNTRY_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z]{2}$").expect("valid regex"));

        if regex.is_match(code) {
            Ok(())
        } else {
            Err(BuiltWithError::Validation(format!(
                "invalid country code: must be two letters (ISO 3166-1 alpha-2), got '{code}'"
            )))
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Service API key.
///
/// `Debug` is redacted so keys never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create a new `ApiKey`, rejecting blank values.
    ///
    /// # Errors
    /// Returns error if the key is empty or whitespace.
    pub fn new(key: impl Into<String>) -> Result<Self, BuiltWithError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(BuiltWithError::Config(crate::ConfigError::InvalidValue {
                field: "api_key".to_string(),
                reason: "must not be blank".to_string(),
            }));
        }
        Ok(Self(key.trim().to_string()))
    }

    /// Expose the raw key for the request builder.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Convert seconds since the Unix epoch.
    ///
    /// Returns `None` only when the value is outside chrono's range.
    #[must_use]
    pub fn from_epoch_seconds(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(Self)
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get seconds since Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}
