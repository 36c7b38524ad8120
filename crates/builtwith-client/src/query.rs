//! Typed query parameters and their validation.
//!
//! A [`QueryParameters`] value describes one logical request. Which endpoint it
//! targets follows from its subject: a technology name selects the lists
//! endpoint, a domain list selects the keywords endpoint. Validation happens
//! in [`QueryParameters::plan`], before anything touches the network.

use crate::page::ContinuationToken;
use builtwith_core::{BuiltWithError, CountryCode, OutputFormat, Result, MAX_DOMAINS_PER_REQUEST};

/// Service endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Lists API: sites using a technology
    Lists,
    /// Keywords API: keywords for domains
    Keywords,
}

impl Endpoint {
    /// Path below the base URL, without the format extension.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Lists => "lists12/api",
            Self::Keywords => "kw2/api",
        }
    }

    /// Whether this endpoint serves `format`.
    #[must_use]
    pub fn supports(&self, format: OutputFormat) -> bool {
        match self {
            Self::Lists => true,
            Self::Keywords => format.supports_keywords(),
        }
    }
}

/// Parameters of one logical request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    /// Technology name (lists endpoint subject)
    pub technology: Option<String>,
    /// Domains (keywords endpoint subject)
    pub domains: Option<Vec<String>>,
    /// ISO 3166-1 alpha-2 country filter
    pub countries: Option<Vec<String>>,
    /// Only sites detected since this date or relative phrase ("30 Days Ago")
    pub since: Option<String>,
    /// Ask for company metadata (`META`)
    pub include_meta: bool,
    /// Include sites that stopped using the technology
    pub include_all: bool,
    /// Response encoding
    pub format: OutputFormat,
    /// Cursor to resume from
    pub offset: Option<ContinuationToken>,
}

impl QueryParameters {
    /// Lists query for sites using `technology`.
    #[must_use]
    pub fn technology(technology: impl Into<String>) -> Self {
        Self {
            technology: Some(technology.into()),
            ..Self::default()
        }
    }

    /// Keywords query for `domains`.
    #[must_use]
    pub fn keywords<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: Some(domains.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Add one country to the filter.
    #[must_use]
    pub fn with_country(mut self, code: impl Into<String>) -> Self {
        self.countries.get_or_insert_with(Vec::new).push(code.into());
        self
    }

    /// Replace the country filter.
    #[must_use]
    pub fn with_countries<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict to sites detected since a date or relative phrase.
    #[must_use]
    pub fn with_since(mut self, since: impl Into<String>) -> Self {
        self.since = Some(since.into());
        self
    }

    /// Request company metadata.
    #[must_use]
    pub fn with_meta(mut self) -> Self {
        self.include_meta = true;
        self
    }

    /// Include sites that dropped the technology.
    #[must_use]
    pub fn with_all(mut self) -> Self {
        self.include_all = true;
        self
    }

    /// Set the response format.
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Resume from a continuation token.
    #[must_use]
    pub fn with_offset(mut self, offset: ContinuationToken) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The endpoint this query targets.
    ///
    /// # Errors
    /// Returns a validation error unless exactly one subject is set.
    pub fn endpoint(&self) -> Result<Endpoint> {
        match (&self.technology, &self.domains) {
            (Some(_), None) => Ok(Endpoint::Lists),
            (None, Some(_)) => Ok(Endpoint::Keywords),
            (Some(_), Some(_)) => Err(BuiltWithError::validation(
                "set either a technology or a domain list, not both",
            )),
            (None, None) => Err(BuiltWithError::validation(
                "a technology or a domain list is required",
            )),
        }
    }

    /// Validate and map onto wire parameters (without the API key).
    ///
    /// # Errors
    /// Returns a validation error describing the first violated constraint.
    pub fn plan(&self) -> Result<QueryPlan> {
        let endpoint = self.endpoint()?;
        if !endpoint.supports(self.format) {
            return Err(BuiltWithError::Validation(format!(
                "format '{}' is not available for keyword lookups (use json or xml)",
                self.format
            )));
        }

        let params = match endpoint {
            Endpoint::Lists => self.lists_params()?,
            Endpoint::Keywords => self.keywords_params()?,
        };

        Ok(QueryPlan {
            endpoint,
            format: self.format,
            params,
        })
    }

    fn lists_params(&self) -> Result<Vec<(&'static str, String)>> {
        let technology = self.technology.as_deref().unwrap_or_default().trim();
        if technology.is_empty() {
            return Err(BuiltWithError::validation("technology name must not be blank"));
        }

        let mut params = vec![("TECH", technology.replace(' ', "-"))];

        if self.include_meta {
            params.push(("META", "yes".to_string()));
        }

        if let Some(countries) = &self.countries {
            if countries.is_empty() {
                return Err(BuiltWithError::validation(
                    "country filter must contain at least one code",
                ));
            }
            let codes = countries
                .iter()
                .map(|code| CountryCode::new(code.trim()).map(|c| c.as_str().to_string()))
                .collect::<Result<Vec<_>>>()?;
            params.push(("COUNTRY", codes.join(",")));
        }

        if let Some(offset) = &self.offset {
            params.push(("OFFSET", offset.as_str().to_string()));
        }

        if let Some(since) = &self.since {
            if self.include_all {
                return Err(BuiltWithError::validation(
                    "'since' cannot be combined with include-all",
                ));
            }
            let since = since.trim();
            if since.is_empty() {
                return Err(BuiltWithError::validation("'since' must not be blank"));
            }
            params.push(("SINCE", since.to_string()));
        }

        if self.include_all {
            params.push(("ALL", "yes".to_string()));
        }

        Ok(params)
    }

    fn keywords_params(&self) -> Result<Vec<(&'static str, String)>> {
        let domains = self.domains.as_deref().unwrap_or_default();
        if domains.is_empty() || domains.len() > MAX_DOMAINS_PER_REQUEST {
            return Err(BuiltWithError::Validation(format!(
                "keyword lookups take 1 to {MAX_DOMAINS_PER_REQUEST} domains, got {}",
                domains.len()
            )));
        }
        if domains.iter().any(|domain| domain.trim().is_empty()) {
            return Err(BuiltWithError::validation("domain entries must not be blank"));
        }

        let lists_only = [
            ("country", self.countries.is_some()),
            ("since", self.since.is_some()),
            ("meta", self.include_meta),
            ("include-all", self.include_all),
            ("offset", self.offset.is_some()),
        ];
        if let Some((name, _)) = lists_only.iter().find(|(_, set)| *set) {
            return Err(BuiltWithError::Validation(format!(
                "'{name}' only applies to technology lists, not keyword lookups"
            )));
        }

        let lookup = domains
            .iter()
            .map(|domain| domain.trim())
            .collect::<Vec<_>>()
            .join(",");
        Ok(vec![("LOOKUP", lookup)])
    }
}

/// A validated query, ready for the request builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Target endpoint
    pub endpoint: Endpoint,
    /// Response encoding
    pub format: OutputFormat,
    /// Wire parameters in send order
    pub params: Vec<(&'static str, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use builtwith_core::ErrorKind;

    fn param<'a>(plan: &'a QueryPlan, name: &str) -> Option<&'a str> {
        plan.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn test_subject_selects_endpoint() {
        assert_eq!(
            QueryParameters::technology("Shopify").endpoint().unwrap(),
            Endpoint::Lists
        );
        assert_eq!(
            QueryParameters::keywords(["a.com"]).endpoint().unwrap(),
            Endpoint::Keywords
        );
    }

    #[test]
    fn test_both_or_neither_subject_rejected() {
        let both = QueryParameters {
            technology: Some("Shopify".to_string()),
            domains: Some(vec!["a.com".to_string()]),
            ..QueryParameters::default()
        };
        assert_eq!(both.plan().unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            QueryParameters::default().plan().unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_lists_wire_mapping() {
        let plan = QueryParameters::technology("Google Analytics")
            .with_meta()
            .with_countries(["us", "CA"])
            .with_since("30 Days Ago")
            .plan()
            .expect("valid query");

        assert_eq!(plan.endpoint, Endpoint::Lists);
        assert_eq!(param(&plan, "TECH"), Some("Google-Analytics"));
        assert_eq!(param(&plan, "META"), Some("yes"));
        assert_eq!(param(&plan, "COUNTRY"), Some("US,CA"));
        assert_eq!(param(&plan, "SINCE"), Some("30 Days Ago"));
        assert_eq!(param(&plan, "ALL"), None);
        assert_eq!(param(&plan, "OFFSET"), None);
    }

    #[test]
    fn test_offset_is_sent() {
        let token = ContinuationToken::from_wire("abc").expect("live token");
        let plan = QueryParameters::technology("Shopify")
            .with_offset(token)
            .plan()
            .expect("valid query");
        assert_eq!(param(&plan, "OFFSET"), Some("abc"));
    }

    #[test]
    fn test_lists_validation() {
        let cases = [
            QueryParameters::technology("  "),
            QueryParameters::technology("Shopify").with_country("USA"),
            QueryParameters::technology("Shopify").with_countries(Vec::<String>::new()),
            QueryParameters::technology("Shopify").with_since("2024-01-01").with_all(),
            QueryParameters::technology("Shopify").with_since(" "),
        ];
        for query in cases {
            let err = query.plan().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{query:?}");
        }
    }

    #[test]
    fn test_keywords_domain_bounds() {
        assert!(QueryParameters::keywords(Vec::<String>::new()).plan().is_err());

        let sixteen: Vec<String> = (0..16).map(|i| format!("d{i}.com")).collect();
        let plan = QueryParameters::keywords(sixteen.clone())
            .plan()
            .expect("16 domains allowed");
        assert_eq!(param(&plan, "LOOKUP"), Some(sixteen.join(",").as_str()));

        let seventeen: Vec<String> = (0..17).map(|i| format!("d{i}.com")).collect();
        let err = QueryParameters::keywords(seventeen).plan().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_keywords_reject_lists_filters_and_formats() {
        let with_country = QueryParameters::keywords(["a.com"]).with_country("US");
        assert!(with_country.plan().unwrap_err().to_string().contains("country"));

        let csv = QueryParameters::keywords(["a.com"]).with_format(OutputFormat::Csv);
        assert_eq!(csv.plan().unwrap_err().kind(), ErrorKind::Validation);

        let xml = QueryParameters::keywords(["a.com"]).with_format(OutputFormat::Xml);
        assert!(xml.plan().is_ok());
    }
}
