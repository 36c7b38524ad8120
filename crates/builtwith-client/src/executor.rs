//! Single-query execution.

use crate::classify::classify;
use crate::normalize::normalize;
use crate::page::Page;
use crate::query::{Endpoint, QueryParameters, QueryPlan};
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use builtwith_core::{ApiConfig, ApiKey, AppConfig, BuiltWithError, OutputFormat, Result};
use std::sync::Arc;

/// Client for the BuiltWith Lists and Keywords APIs.
///
/// Cloning is cheap; clones share the transport. The client keeps no state
/// between calls.
#[derive(Clone)]
pub struct BuiltWithClient {
    transport: Arc<dyn Transport>,
    api_key: ApiKey,
    base_url: String,
}

impl BuiltWithClient {
    /// Create a client against the public service endpoint.
    #[must_use]
    pub fn new(api_key: ApiKey, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            api_key,
            base_url: ApiConfig::default().base_url,
        }
    }

    /// Create a client from configuration.
    ///
    /// # Errors
    /// Returns a configuration error if no API key is configured.
    pub fn from_config(config: &AppConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let api_key = config.api_key()?;
        Ok(Self::new(api_key, transport).with_base_url(config.api.base_url.clone()))
    }

    /// Create a client from the config file and environment, using reqwest.
    ///
    /// # Errors
    /// Returns a configuration error if the config is invalid or
    /// `BUILTWITH_API_KEY` is not set.
    pub fn from_env() -> Result<Self> {
        let config = AppConfig::load_with_env()?;
        let transport = ReqwestTransport::from_config(&config.api)?;
        Self::from_config(&config, Arc::new(transport))
    }

    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validate `query`, send it and normalize the response.
    ///
    /// Nothing is sent when validation fails. No retries are attempted.
    ///
    /// # Errors
    /// Returns the validation, transport, classified service or parse error
    /// that ended the exchange.
    pub async fn execute(&self, query: &QueryParameters) -> Result<Page> {
        let plan = query.plan()?;
        let request = self.build_request(&plan);
        tracing::debug!(
            endpoint = ?plan.endpoint,
            format = %plan.format,
            url = %request.url,
            "sending request"
        );

        let response = self.transport.send(request).await?;

        if let Some(error) = classify(response.status, plan.format, &response.body) {
            tracing::debug!(status = response.status, kind = ?error.kind(), "request failed");
            return Err(error);
        }

        let page = normalize(plan.endpoint, plan.format, &response.body)?;
        tracing::debug!(
            status = response.status,
            results = page.results.len(),
            keywords = page.keywords.len(),
            has_more = page.has_more(),
            "page received"
        );
        Ok(page)
    }

    /// Fetch one page of sites using a technology.
    ///
    /// # Errors
    /// Returns a validation error if `query` is not a technology query, or any
    /// error from [`execute`](Self::execute).
    pub async fn tech_list(&self, query: &QueryParameters) -> Result<Page> {
        if query.endpoint()? != Endpoint::Lists {
            return Err(BuiltWithError::validation(
                "tech_list requires a technology query",
            ));
        }
        self.execute(query).await
    }

    /// Fetch keywords for up to 16 domains in one request.
    ///
    /// # Errors
    /// Returns a validation error for 0 or more than 16 domains, or any error
    /// from [`execute`](Self::execute).
    pub async fn keywords<I, S>(&self, domains: I, format: OutputFormat) -> Result<Page>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.execute(&QueryParameters::keywords(domains).with_format(format))
            .await
    }

    /// Map a validated plan onto an HTTP request, key first.
    #[must_use]
    pub fn build_request(&self, plan: &QueryPlan) -> HttpRequest {
        let url = format!(
            "{}/{}.{}",
            self.base_url.trim_end_matches('/'),
            plan.endpoint.path(),
            plan.format.as_str()
        );

        plan.params.iter().fold(
            HttpRequest::get(url).with_query("KEY", self.api_key.expose()),
            |request, (name, value)| request.with_query(*name, value.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use builtwith_core::ErrorKind;

    fn client(transport: &Arc<ScriptedTransport>) -> BuiltWithClient {
        BuiltWithClient::new(
            ApiKey::new("test-key").expect("valid key"),
            transport.clone(),
        )
    }

    #[test]
    fn test_build_request() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client(&transport).with_base_url("http://localhost:9000/");
        let plan = QueryParameters::technology("Shopify")
            .with_format(OutputFormat::Xml)
            .plan()
            .expect("valid query");

        let request = client.build_request(&plan);
        assert_eq!(request.url, "http://localhost:9000/lists12/api.xml");
        assert_eq!(request.query[0], ("KEY".to_string(), "test-key".to_string()));
        assert_eq!(request.query_value("TECH"), Some("Shopify"));
    }

    #[tokio::test]
    async fn test_validation_happens_before_transport() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client(&transport);

        let both = QueryParameters {
            technology: Some("Shopify".to_string()),
            domains: Some(vec!["a.com".to_string()]),
            ..QueryParameters::default()
        };
        let err = client.execute(&both).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = client.execute(&QueryParameters::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_classified_error_skips_normalization() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(429, "not json at all");
        let client = client(&transport);

        let err = client
            .tech_list(&QueryParameters::technology("Shopify"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimit);
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_transport_error("connection refused");
        let client = client(&transport);

        let err = client
            .keywords(["a.com"], OutputFormat::Json)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_tech_list_rejects_keyword_query() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client(&transport);
        let err = client
            .tech_list(&QueryParameters::keywords(["a.com"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_from_config_requires_key() {
        let transport: Arc<dyn Transport> = Arc::new(ScriptedTransport::new());
        let err = BuiltWithClient::from_config(&AppConfig::default(), transport.clone())
            .err()
            .expect("missing key");
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let config = AppConfig {
            api_key: Some("k".to_string()),
            ..AppConfig::default()
        };
        let client = BuiltWithClient::from_config(&config, transport).expect("client");
        assert_eq!(client.base_url(), "https://api.builtwith.com");
    }
}
