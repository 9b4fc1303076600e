//! Integration tests for `StaticFetcher` against a local `wiremock` server.
//!
//! Covers the happy path through the extractor and the status mapping that
//! the retry layer relies on.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use katalog_scraper::{FieldExtractor, PageSource, ScraperError, StaticFetcher};

fn test_fetcher() -> StaticFetcher {
    StaticFetcher::new(5, "katalog-test/0.1").expect("failed to build test StaticFetcher")
}

fn shop(base_url: &str) -> katalog_core::ShopConfig {
    katalog_core::ShopConfig {
        id: "tehno".to_string(),
        name: "Tehno".to_string(),
        base_url: base_url.to_string(),
        selectors: [("name", "h1"), ("price", ".price"), ("image", "img.main")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        rate_limit_ms: 0,
        retry_limit: 0,
        retry_backoff_ms: 0,
        requires_js: false,
        offer_type: katalog_core::OfferType::Good,
        enabled: true,
        title_suffixes: Vec::new(),
    }
}

const PAGE: &str = r#"<html><body>
  <h1>Samsung Galaxy A55 8/256GB</h1>
  <span class="price">44.999 RSD</span>
  <img class="main" src="/img/a55.jpg">
</body></html>"#;

#[tokio::test]
async fn fetch_page_returns_html_that_extracts_to_a_capture() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/telefoni/galaxy-a55"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;

    let url = format!("{}/telefoni/galaxy-a55", server.uri());
    let page = test_fetcher().fetch_page(&url).await.unwrap();
    assert_eq!(page.url, url);

    let capture = FieldExtractor::default()
        .extract(&page, &shop(&server.uri()))
        .unwrap();
    assert_eq!(capture.external_id, "galaxy-a55");
    assert_eq!(capture.name, "Samsung Galaxy A55 8/256GB");
    assert_eq!(capture.price, rust_decimal::Decimal::from(44_999));
    assert_eq!(capture.image_urls, vec![format!("{}/img/a55.jpg", server.uri())]);
}

#[tokio::test]
async fn fetch_page_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = test_fetcher()
        .fetch_page(&format!("{}/gone", server.uri()))
        .await;
    assert!(
        matches!(result, Err(ScraperError::NotFound { .. })),
        "expected NotFound, got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_page_maps_429_to_rate_limited_with_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .mount(&server)
        .await;

    let result = test_fetcher()
        .fetch_page(&format!("{}/p/1", server.uri()))
        .await;
    assert!(
        matches!(
            result,
            Err(ScraperError::RateLimited {
                retry_after_secs: 17,
                ..
            })
        ),
        "expected RateLimited(17), got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_page_maps_other_statuses_to_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = test_fetcher()
        .fetch_page(&format!("{}/p/1", server.uri()))
        .await;
    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 503, .. })),
        "expected UnexpectedStatus(503), got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_page_rejects_unparseable_url() {
    let result = test_fetcher().fetch_page("not a url").await;
    assert!(matches!(result, Err(ScraperError::InvalidUrl { .. })));
}
