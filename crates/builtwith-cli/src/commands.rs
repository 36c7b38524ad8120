//! Command implementations.
//!
//! Each command returns a [`Report`] instead of printing, so the same code
//! path runs under test with a scripted transport.

use crate::{Command, KeywordsArgs, ListsArgs};
use anyhow::Context;
use builtwith_client::{
    encode, parse, BuiltWithClient, BuiltWithError, ContinuationToken, Endpoint, Page, ParsedRecord,
    QueryParameters, ResultRecord,
};
use builtwith_core::AppConfig;

/// Rendered output of one command.
#[derive(Debug, Default)]
pub struct Report {
    /// Text for stdout
    pub body: String,
    /// Keyword chunks that failed
    pub failed_chunks: usize,
    /// Error that cut pagination short; `body` still holds the pages fetched before it
    pub error: Option<BuiltWithError>,
}

/// Run `command` against `client`.
pub async fn run(
    command: &Command,
    client: &BuiltWithClient,
    config: &AppConfig,
) -> anyhow::Result<Report> {
    match command {
        Command::Lists(args) => lists(args, client, config).await,
        Command::Keywords(args) => keywords(args, client, config).await,
    }
}

fn lists_query(args: &ListsArgs) -> anyhow::Result<QueryParameters> {
    let mut query = QueryParameters::technology(args.technology.as_str()).with_format(args.format);
    if !args.countries.is_empty() {
        query = query.with_countries(args.countries.iter().cloned());
    }
    if let Some(since) = &args.since {
        query = query.with_since(since.as_str());
    }
    if args.meta {
        query = query.with_meta();
    }
    if args.include_all {
        query = query.with_all();
    }
    if let Some(offset) = &args.offset {
        let token = ContinuationToken::from_wire(offset)
            .context("--offset must be a live continuation token")?;
        query = query.with_offset(token);
    }
    Ok(query)
}

async fn lists(
    args: &ListsArgs,
    client: &BuiltWithClient,
    config: &AppConfig,
) -> anyhow::Result<Report> {
    let query = lists_query(args)?;

    let max_pages = match (args.pages, args.all_pages) {
        (Some(pages), _) => Some(Some(usize::try_from(pages).unwrap_or(usize::MAX))),
        (None, true) => Some(config.pagination.max_pages),
        (None, false) => None,
    };

    let mut error = None;
    let page = match max_pages {
        None => client.tech_list(&query).await?,
        Some(max_pages) => {
            let mut pages = client.iterate(query, max_pages)?;
            let mut results: Vec<ResultRecord> = Vec::new();
            while let Some(page) = pages.next_page().await {
                match page {
                    Ok(page) => results.extend(page.results),
                    Err(e) => {
                        tracing::error!(
                            pages = pages.pages_fetched(),
                            resume = pages.pending_offset().map(ContinuationToken::as_str),
                            "pagination failed: {e}"
                        );
                        error = Some(e);
                    }
                }
            }
            tracing::info!(
                pages = pages.pages_fetched(),
                results = results.len(),
                stop = ?pages.stop_reason(),
                "pagination finished"
            );
            Page {
                next_offset: pages.pending_offset().cloned(),
                results,
                keywords: Vec::new(),
            }
        }
    };

    if let Some(next) = &page.next_offset {
        tracing::info!("more results available, resume with --offset {next}");
    }

    let body = if args.parsed {
        let parsed: Vec<ParsedRecord> = page.results.iter().map(parse).collect();
        let mut json = serde_json::to_string_pretty(&parsed)?;
        json.push('\n');
        json
    } else {
        encode(Endpoint::Lists, args.format, &page)?
    };

    Ok(Report {
        body,
        failed_chunks: 0,
        error,
    })
}

async fn keywords(
    args: &KeywordsArgs,
    client: &BuiltWithClient,
    config: &AppConfig,
) -> anyhow::Result<Report> {
    let batch_size = args
        .batch_size
        .map_or(config.batch.batch_size, usize::from);

    // One request when everything fits and no batching was asked for.
    if args.batch_size.is_none() && args.domains.len() <= batch_size {
        let page = client.keywords(args.domains.iter().cloned(), args.format).await?;
        return Ok(Report {
            body: encode(Endpoint::Keywords, args.format, &page)?,
            ..Report::default()
        });
    }

    if !Endpoint::Keywords.supports(args.format) {
        anyhow::bail!(
            "format '{}' is not available for keyword lookups (use json or xml)",
            args.format
        );
    }

    let outcomes = client.process_batches(&args.domains, batch_size).await?;
    let mut merged = Page::default();
    let mut failed_chunks = 0;
    for outcome in outcomes {
        match outcome.result {
            Ok(records) => merged.keywords.extend(records),
            Err(e) => {
                failed_chunks += 1;
                tracing::error!(
                    chunk = outcome.index,
                    domains = %outcome.domains.join(","),
                    "chunk failed: {e}"
                );
            }
        }
    }

    Ok(Report {
        body: encode(Endpoint::Keywords, args.format, &merged)?,
        failed_chunks,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use builtwith_client::testing::ScriptedTransport;
    use builtwith_core::{ApiKey, ErrorKind};
    use clap::Parser;
    use std::sync::Arc;

    fn client(transport: &Arc<ScriptedTransport>) -> BuiltWithClient {
        BuiltWithClient::new(ApiKey::new("k").expect("valid key"), transport.clone())
    }

    fn command(args: &[&str]) -> Command {
        let mut argv = vec!["builtwith"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("valid arguments").command
    }

    #[test]
    fn test_lists_query_mapping() {
        let Command::Lists(args) = command(&[
            "lists", "Shopify", "--country", "us,ca", "--meta", "--offset", "abc",
        ]) else {
            panic!("expected lists");
        };
        let query = lists_query(&args).expect("query");
        assert_eq!(query.technology.as_deref(), Some("Shopify"));
        assert_eq!(query.countries, Some(vec!["us".to_string(), "ca".to_string()]));
        assert!(query.include_meta);
        assert_eq!(query.offset.as_ref().map(ContinuationToken::as_str), Some("abc"));
    }

    #[test]
    fn test_end_offset_rejected() {
        let Command::Lists(args) = command(&["lists", "Shopify", "--offset", "END"]) else {
            panic!("expected lists");
        };
        assert!(lists_query(&args).is_err());
    }

    #[tokio::test]
    async fn test_lists_pages_are_merged() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(200, r#"{"NextOffset": "t1", "Results": [{"D": "a.example"}]}"#);
        transport.push_response(200, r#"{"NextOffset": "t2", "Results": [{"D": "b.example"}]}"#);

        let report = run(
            &command(&["lists", "Shopify", "--pages", "2"]),
            &client(&transport),
            &AppConfig::default(),
        )
        .await
        .expect("run");

        let body: serde_json::Value = serde_json::from_str(&report.body).expect("json");
        assert_eq!(body["NextOffset"], "t2");
        assert_eq!(body["Results"][0]["D"], "a.example");
        assert_eq!(body["Results"][1]["D"], "b.example");
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_lists_failure_keeps_fetched_pages() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(200, r#"{"NextOffset": "t1", "Results": [{"D": "a.example"}]}"#);
        transport.push_response(500, "");

        let report = run(
            &command(&["lists", "Shopify", "--all-pages"]),
            &client(&transport),
            &AppConfig::default(),
        )
        .await
        .expect("run");

        let err = report.error.expect("pagination error");
        assert_eq!(err.kind(), ErrorKind::Service);
        let body: serde_json::Value = serde_json::from_str(&report.body).expect("json");
        assert_eq!(body["Results"][0]["D"], "a.example");
        assert_eq!(body["NextOffset"], "t1");
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_lists_parsed_output() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(200, r#"{"Results": [{"D": "a.example", "FD": 1700000000}]}"#);

        let report = run(
            &command(&["lists", "Shopify", "--parsed"]),
            &client(&transport),
            &AppConfig::default(),
        )
        .await
        .expect("run");

        let parsed: serde_json::Value = serde_json::from_str(&report.body).expect("json");
        assert_eq!(parsed[0]["domain"], "a.example");
        assert_eq!(parsed[0]["first_detected"], "2023-11-14T22:13:20Z");
    }

    #[tokio::test]
    async fn test_keywords_batches_report_failures() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(
            200,
            r#"{"Keywords": [{"Domain": "a.example", "Keywords": ["x"]}]}"#,
        );
        transport.push_response(500, "");

        let report = run(
            &command(&["keywords", "a.example", "b.example", "--batch-size", "1"]),
            &client(&transport),
            &AppConfig::default(),
        )
        .await
        .expect("run");

        assert_eq!(report.failed_chunks, 1);
        assert!(report.body.contains("a.example"));
        assert!(!report.body.contains("b.example"));
    }

    #[tokio::test]
    async fn test_keywords_csv_rejected_before_sending() {
        let transport = Arc::new(ScriptedTransport::new());
        let result = run(
            &command(&["keywords", "a.example", "--format", "csv", "--batch-size", "1"]),
            &client(&transport),
            &AppConfig::default(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(transport.call_count(), 0);
    }
}
