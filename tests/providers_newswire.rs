// tests/providers_newswire.rs
use newswire_sentiment::config::WireConfig;
use newswire_sentiment::error::FetchError;
use newswire_sentiment::ingest::fetch_articles;
use newswire_sentiment::ingest::newswire::NewswireSource;
use newswire_sentiment::ArticleSource;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WIRE_JSON: &str = include_str!("fixtures/wire_feed.json");
const FEED_PATH: &str = "/svc/news/v3/content/all/all.json";

fn config_for(server: &MockServer, limit: u32) -> WireConfig {
    WireConfig {
        base_url: server.uri(),
        limit,
        ..WireConfig::default()
    }
}

#[tokio::test]
async fn fixture_parses_every_item_with_facets() {
    let src = NewswireSource::from_fixture(WIRE_JSON);
    let articles = src.fetch_latest().await.expect("fixture parses");

    assert_eq!(articles.len(), 4);
    let rally = &articles[0];
    assert_eq!(rally.slug, "01markets-rally");
    assert_eq!(rally.org_facet, vec!["Acme Corp"]);
    assert!(rally.per_facet.is_empty(), "empty-string facet means no values");
    assert_eq!(
        rally.analysis_text(),
        "Stocks Rally as Investors Cheer Strong Jobs Report. Wall Street posted strong gains after hiring beat expectations."
    );
    assert!(articles.iter().all(|a| !a.first_published_raw.is_empty()));
}

#[tokio::test]
async fn http_sends_api_key_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("api-key", "secret"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_string(WIRE_JSON))
        .expect(1)
        .mount(&server)
        .await;

    let src = NewswireSource::from_config(&config_for(&server, 25), "secret".into()).expect("client");
    let articles = fetch_articles(&src).await.expect("live fetch");
    assert_eq!(articles.len(), 4);
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let src = NewswireSource::from_config(&config_for(&server, 500), "k".into()).expect("client");
    match fetch_articles(&src).await {
        Err(FetchError::Status { status }) => assert_eq!(status, 500),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_results_is_empty_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"OK","results":[]}"#))
        .mount(&server)
        .await;

    let src = NewswireSource::from_config(&config_for(&server, 500), "k".into()).expect("client");
    let err = fetch_articles(&src).await.expect_err("empty feed");
    assert!(matches!(err, FetchError::EmptyFeed), "got {err:?}");
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let src = NewswireSource::from_fixture("<html>rate limited</html>");
    let err = fetch_articles(&src).await.expect_err("not json");
    assert!(matches!(err, FetchError::Parse(_)), "got {err:?}");
}
