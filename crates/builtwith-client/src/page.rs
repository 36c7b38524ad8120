//! Canonical, format-independent response types.
//!
//! Every decoder funnels into these shapes, so nothing above the normalizer
//! ever sees json/xml/csv specifics. Field codes are kept exactly as the
//! service sends them (`D`, `FD`, `LD`, ...); the Rust field names only exist
//! for access.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Token value the service uses to say "no further pages".
pub const END_OF_RESULTS: &str = "END";

/// Opaque cursor returned by the lists endpoint.
///
/// Only live tokens can be constructed: empty strings and the `END` sentinel
/// both mean the result set is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// Interpret a raw `NextOffset` value.
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == END_OF_RESULTS {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One site from the lists endpoint.
///
/// Numeric fields are optional: a missing value is unknown, not zero. They
/// accept numbers and numeric strings, since xml and delimited bodies carry
/// everything as text, but only whole values; `250000.7` is a parse error.
/// `D` is kept verbatim and a blank `D` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// `D`: domain
    #[serde(
        rename = "D",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub domain: Option<String>,

    /// `LOS`: locations on site where the technology was seen
    #[serde(
        rename = "LOS",
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "lenient::string_list"
    )]
    pub locations: Vec<String>,

    /// `FD`: first detected, epoch seconds
    #[serde(
        rename = "FD",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub first_detected: Option<i64>,

    /// `LD`: last detected, epoch seconds
    #[serde(
        rename = "LD",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub last_detected: Option<i64>,

    /// `S`: monthly technology spend, USD
    #[serde(
        rename = "S",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub spend: Option<i64>,

    /// `SKU`: unique products
    #[serde(
        rename = "SKU",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub sku: Option<i64>,

    /// `R`: estimated revenue
    #[serde(
        rename = "R",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub revenue: Option<i64>,

    /// `F`: social followers
    #[serde(
        rename = "F",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub followers: Option<i64>,

    /// `E`: employee count
    #[serde(
        rename = "E",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub employees: Option<i64>,

    /// `A`: page rank
    #[serde(
        rename = "A",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub page_rank: Option<i64>,

    /// `Q`: Tranco rank
    #[serde(
        rename = "Q",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub tranco_rank: Option<i64>,

    /// `M`: Majestic rank
    #[serde(
        rename = "M",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub majestic_rank: Option<i64>,

    /// `U`: Umbrella rank
    #[serde(
        rename = "U",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i64"
    )]
    pub umbrella_rank: Option<i64>,

    /// `META`: company metadata, present when requested with `META=yes`
    #[serde(rename = "META", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    /// Codes this client does not know, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Keywords for one domain, in service order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRecord {
    /// Root domain
    #[serde(rename = "Domain")]
    pub domain: String,

    /// Keywords, possibly empty
    #[serde(rename = "Keywords", default, deserialize_with = "lenient::string_list")]
    pub keywords: Vec<String>,
}

/// One physical response in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    /// Cursor for the next page, if the service reported one
    #[serde(rename = "NextOffset", skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<ContinuationToken>,

    /// Sites (lists endpoint)
    #[serde(rename = "Results", skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<ResultRecord>,

    /// Keyword records (keywords endpoint)
    #[serde(rename = "Keywords", skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<KeywordRecord>,
}

impl Page {
    /// Whether the service reported more pages after this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_offset.is_some()
    }

    /// Whether the page holds no records of either kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.keywords.is_empty()
    }
}

/// Deserializers tolerant of the string-typed values produced by xml and
/// delimited bodies.
pub(crate) mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// A number that is a whole value, including `250000.0` and `"250000.0"`.
    ///
    /// Fractional values are rejected rather than rounded.
    pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(whole))
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected a whole number, got {n}"))),
            Some(Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(None);
                }
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole))
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("expected a whole number, got '{s}'")))
            }
            Some(other) => Err(D::Error::custom(format!("expected a number, got {other}"))),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn whole(f: f64) -> Option<i64> {
        let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
        (f.is_finite() && f.fract() == 0.0 && in_range).then(|| f as i64)
    }

    /// Blank values are absent; anything else is kept verbatim.
    pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(D::Error::custom(format!("expected a string, got {other}"))),
        }
    }

    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    Value::Number(n) => Ok(n.to_string()),
                    other => Err(D::Error::custom(format!(
                        "expected a list of strings, found {other}"
                    ))),
                })
                .collect(),
            // Delimited bodies flatten lists into `a;b;c`.
            Some(Value::String(s)) => Ok(s
                .split(';')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(ToString::to_string)
                .collect()),
            Some(other) => Err(D::Error::custom(format!("expected a list, got {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_continuation_token_sentinels() {
        assert!(ContinuationToken::from_wire("").is_none());
        assert!(ContinuationToken::from_wire("  ").is_none());
        assert!(ContinuationToken::from_wire("END").is_none());

        let token = ContinuationToken::from_wire("oQEwMTIz").expect("live token");
        assert_eq!(token.as_str(), "oQEwMTIz");
    }

    #[test]
    fn test_record_from_json_codes() {
        let record: ResultRecord = serde_json::from_value(json!({
            "D": "shop.example",
            "LOS": ["shop.example", "blog.shop.example"],
            "FD": 1_700_000_000,
            "R": 250_000.0,
            "X9": "new code"
        }))
        .expect("decode record");

        assert_eq!(record.domain.as_deref(), Some("shop.example"));
        assert_eq!(record.locations.len(), 2);
        assert_eq!(record.first_detected, Some(1_700_000_000));
        assert_eq!(record.revenue, Some(250_000));
        assert_eq!(record.employees, None);
        assert_eq!(record.extra.get("X9"), Some(&json!("new code")));
    }

    #[test]
    fn test_record_from_string_values() {
        let record: ResultRecord = serde_json::from_value(json!({
            "D": "shop.example",
            "LOS": "a.example;b.example",
            "E": "42",
            "S": ""
        }))
        .expect("decode record");

        assert_eq!(record.employees, Some(42));
        assert_eq!(record.spend, None);
        assert_eq!(record.locations, vec!["a.example", "b.example"]);
    }

    #[test]
    fn test_fractional_numbers_rejected() {
        for value in [json!(250_000.7), json!("250000.7"), json!(1e300)] {
            let result: Result<ResultRecord, _> = serde_json::from_value(json!({ "R": value }));
            assert!(result.is_err(), "{value}");
        }

        let record: ResultRecord =
            serde_json::from_value(json!({ "R": "250000.0" })).expect("decode record");
        assert_eq!(record.revenue, Some(250_000));
    }

    #[test]
    fn test_domain_kept_verbatim() {
        let record: ResultRecord =
            serde_json::from_value(json!({ "D": " shop.example " })).expect("decode record");
        assert_eq!(record.domain.as_deref(), Some(" shop.example "));

        let record: ResultRecord =
            serde_json::from_value(json!({ "D": "   " })).expect("decode record");
        assert_eq!(record.domain, None);
    }

    #[test]
    fn test_record_rejects_garbage_number() {
        let result: Result<ResultRecord, _> = serde_json::from_value(json!({ "FD": "yesterday" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_record_serializes_with_codes() {
        let record = ResultRecord {
            domain: Some("shop.example".to_string()),
            first_detected: Some(1),
            ..ResultRecord::default()
        };
        let value = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(value, json!({ "D": "shop.example", "FD": 1 }));
    }

    #[test]
    fn test_keyword_record_defaults() {
        let record: KeywordRecord =
            serde_json::from_value(json!({ "Domain": "a.example" })).expect("decode record");
        assert!(record.keywords.is_empty());
    }
}
