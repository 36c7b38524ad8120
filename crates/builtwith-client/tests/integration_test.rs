//! End-to-end behaviour of the client over a scripted transport.
//!
//! The transport records every request, so each test can check both what the
//! client returned and exactly what it sent.

use builtwith_client::testing::ScriptedTransport;
use builtwith_client::{
    parse, BuiltWithClient, ErrorKind, OutputFormat, Page, QueryParameters, StopReason,
};
use builtwith_core::ApiKey;
use futures::StreamExt;
use std::sync::Arc;

fn client(transport: &Arc<ScriptedTransport>) -> BuiltWithClient {
    BuiltWithClient::new(ApiKey::new("test-key").expect("valid key"), transport.clone())
        .with_base_url("https://api.test")
}

fn lists_body(next: &str, domains: &[&str]) -> String {
    let results: Vec<String> = domains
        .iter()
        .map(|d| format!(r#"{{"D": "{d}", "FD": 1700000000}}"#))
        .collect();
    format!(
        r#"{{"NextOffset": "{next}", "Results": [{}]}}"#,
        results.join(", ")
    )
}

fn keywords_body(domains: &[&str]) -> String {
    let entries: Vec<String> = domains
        .iter()
        .map(|d| format!(r#"{{"Domain": "{d}", "Keywords": ["kw-{d}"]}}"#))
        .collect();
    format!(r#"{{"Keywords": [{}]}}"#, entries.join(", "))
}

fn domains_of(page: &Page) -> Vec<String> {
    page.results
        .iter()
        .filter_map(|r| r.domain.clone())
        .collect()
}

fn three_pages(transport: &ScriptedTransport) {
    transport.push_response(200, lists_body("t1", &["p1.example"]));
    transport.push_response(200, lists_body("t2", &["p2.example"]));
    transport.push_response(200, lists_body("END", &["p3.example"]));
}

#[tokio::test]
async fn test_invalid_subjects_make_no_calls() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = client(&transport);

    let both = QueryParameters {
        technology: Some("Shopify".to_string()),
        domains: Some(vec!["a.example".to_string()]),
        ..QueryParameters::default()
    };
    let queries = [
        both,
        QueryParameters::default(),
        QueryParameters::keywords(Vec::<String>::new()),
        QueryParameters::keywords((0..17).map(|i| format!("d{i}.example"))),
    ];

    for query in &queries {
        let err = client.execute(query).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{query:?}");
    }
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_single_query_wire_format() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(200, lists_body("END", &["shop.example"]));
    let client = client(&transport);

    let query = QueryParameters::technology("Google Analytics")
        .with_countries(["us", "gb"])
        .with_meta();
    let page = client.tech_list(&query).await.expect("page");
    assert_eq!(domains_of(&page), vec!["shop.example"]);
    assert!(!page.has_more());

    let request = &transport.requests()[0];
    assert_eq!(request.url, "https://api.test/lists12/api.json");
    assert_eq!(request.query_value("KEY"), Some("test-key"));
    assert_eq!(request.query_value("TECH"), Some("Google-Analytics"));
    assert_eq!(request.query_value("COUNTRY"), Some("US,GB"));
    assert_eq!(request.query_value("META"), Some("yes"));
}

#[tokio::test]
async fn test_pagination_yields_every_page() {
    let transport = Arc::new(ScriptedTransport::new());
    three_pages(&transport);

    let mut pages = client(&transport)
        .iterate(QueryParameters::technology("Shopify"), None)
        .expect("valid query");

    let mut seen = Vec::new();
    while let Some(page) = pages.next_page().await {
        seen.extend(domains_of(&page.expect("page")));
    }

    assert_eq!(seen, vec!["p1.example", "p2.example", "p3.example"]);
    assert_eq!(pages.stop_reason(), Some(StopReason::Exhausted));
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_pagination_respects_page_limit() {
    let transport = Arc::new(ScriptedTransport::new());
    three_pages(&transport);

    let pages: Vec<_> = client(&transport)
        .iterate(QueryParameters::technology("Shopify"), Some(2))
        .expect("valid query")
        .into_stream()
        .collect()
        .await;

    let seen: Vec<String> = pages
        .iter()
        .flat_map(|page| domains_of(page.as_ref().expect("page")))
        .collect();
    assert_eq!(seen, vec!["p1.example", "p2.example"]);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_collect_all_stops_on_error() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(200, lists_body("t1", &["p1.example"]));
    transport.push_response(401, r#"{"Errors": [{"Message": "API key invalid"}]}"#);

    let err = client(&transport)
        .collect_all(&QueryParameters::technology("Shopify"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(err.to_string().contains("API key invalid"));
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_batches_isolate_failures() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(200, keywords_body(&["a", "b"]));
    transport.push_response(500, "internal error");
    transport.push_response(200, keywords_body(&["e"]));

    let domains: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(ToString::to_string).collect();
    let outcomes = client(&transport)
        .process_batches(&domains, 2)
        .await
        .expect("valid batch size");

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].domains, vec!["a", "b"]);
    assert_eq!(outcomes[1].domains, vec!["c", "d"]);
    assert_eq!(outcomes[2].domains, vec!["e"]);

    let first = outcomes[0].result.as_ref().expect("chunk 0");
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].keywords, vec!["kw-a"]);

    let failed = outcomes[1].result.as_ref().unwrap_err();
    assert_eq!(failed.kind(), ErrorKind::Service);

    let last = outcomes[2].result.as_ref().expect("chunk 2");
    assert_eq!(last[0].domain, "e");

    let lookups: Vec<String> = transport
        .requests()
        .iter()
        .filter_map(|r| r.query_value("LOOKUP").map(ToString::to_string))
        .collect();
    assert_eq!(lookups, vec!["a,b", "c,d", "e"]);
}

#[tokio::test]
async fn test_parsed_records_from_xml() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(
        200,
        "<Lists><NextOffset>END</NextOffset><Results><Result><D>shop.example</D>\
         <FD>1700000000</FD><S>120</S></Result></Results></Lists>",
    );

    let page = client(&transport)
        .tech_list(&QueryParameters::technology("Shopify").with_format(OutputFormat::Xml))
        .await
        .expect("page");
    let parsed = parse(&page.results[0]);

    assert_eq!(
        parsed.first_detected.map(|t| t.to_rfc3339()).as_deref(),
        Some("2023-11-14T22:13:20+00:00")
    );
    assert_eq!(parsed.monthly_spend_usd, Some(120));
    assert_eq!(parsed.last_detected, None);
}

#[tokio::test]
async fn test_embedded_errors_in_success_bodies() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(
        200,
        r#"{"Errors": [{"Lookup": "nosuchtech", "Message": "Technology not found"}], "Results": []}"#,
    );

    let err = client(&transport)
        .tech_list(&QueryParameters::technology("nosuchtech"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Request);
    assert_eq!(err.status(), Some(200));
}
