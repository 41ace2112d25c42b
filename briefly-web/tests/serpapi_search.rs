mod common;

use briefly_common::Secret;
use briefly_web::{SearchClient, SearchError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> SearchClient {
    SearchClient::with_endpoint(&server.uri()).expect("client builds")
}

#[tokio::test]
async fn normalizes_organic_results_in_order() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "climate policy 2024"))
        .and(query_param("api_key", "serp-key"))
        .and(query_param("engine", "google"))
        .and(query_param("num", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [
                {"title": "First", "link": "https://a.example/1", "snippet": "one"},
                {"title": "Second", "link": "https://b.example/2"},
                {"link": "https://c.example/3", "snippet": null}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .search("climate policy 2024", &Secret::new("serp-key"))
        .await;

    assert!(outcome.error.is_none());
    let titles: Vec<_> = outcome.results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second", ""]);
    assert_eq!(outcome.results[1].snippet, "");
    assert_eq!(outcome.results[2].link, "https://c.example/3");
}

#[tokio::test]
async fn provider_error_field_yields_empty_results() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Google hasn't returned any results for this query."
        })))
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .search("zzzz", &Secret::new("serp-key"))
        .await;

    assert!(outcome.results.is_empty());
    assert_eq!(
        outcome.error,
        Some(SearchError::Provider(
            "Google hasn't returned any results for this query.".into()
        ))
    );
}

#[tokio::test]
async fn http_failure_is_reported_once_without_retry() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Invalid API key. Your API key should be here: https://serpapi.com/manage-api-key"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .search("anything", &Secret::new("bad"))
        .await;

    assert!(outcome.results.is_empty());
    assert!(matches!(
        outcome.error,
        Some(SearchError::Status { status: 401, .. })
    ));
}

#[tokio::test]
async fn unreachable_provider_is_a_network_error() {
    common::init_test_tracing();
    // Nothing listens on the discard port.
    let client = SearchClient::with_endpoint("http://127.0.0.1:9/").expect("client builds");

    let outcome = client.search("anything", &Secret::new("k")).await;

    assert!(outcome.results.is_empty());
    assert!(matches!(outcome.error, Some(SearchError::Network(_))));
}

#[tokio::test]
async fn endpoint_without_trailing_slash_keeps_its_path() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/serp/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [{"title": "Proxied", "link": "https://a.example/1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = SearchClient::with_endpoint(&format!("{}/serp", server.uri()))
        .expect("client builds")
        .search("carbon", &Secret::new("serp-key"))
        .await;

    assert!(outcome.error.is_none());
    assert_eq!(outcome.results[0].title, "Proxied");
}
