//! Page scraper tests: caching, retries, batch scrapes, extraction and saving

use crate::common::{html_page, test_config};
use gleaner::{FetchError, OutputFormat, ScrapeError, ScrapeOptions, WebScraper};
use std::collections::BTreeMap;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_scrape_page_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/article"))
        .and(header("user-agent", "Mozilla/5.0 (compatible; GleanerBot/1.0)"))
        .respond_with(html_page(
            "T",
            r#"<nav><a href="/menu">Menu</a></nav>
               <p class="ad">x</p>
               <p>keep <a href="/next">more</a> <a href="/next">again</a></p>
               <p><img src="/pic.png"></p>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let url = format!("{}/article", base_url);

    let content = scraper
        .scrape_page(&url, &ScrapeOptions::default())
        .await
        .expect("Scrape failed");

    assert_eq!(content.url, url);
    assert_eq!(content.status, 200);
    assert_eq!(content.title, "T");
    assert!(content.content.contains("keep"));
    assert!(!content.content.contains('x'));
    assert_eq!(content.word_count, content.content.split_whitespace().count());
    assert_eq!(content.links, vec![format!("{}/next", base_url)]);
    // The image sits in a text-less paragraph, which cleaning removes
    assert!(content.images.is_empty());
}

#[tokio::test]
async fn test_cached_page_fetched_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(html_page("Cached", "<p>some cached words</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let url = format!("{}/cached", mock_server.uri());
    let options = ScrapeOptions::default();

    let first = scraper.scrape_page(&url, &options).await.unwrap();
    let second = scraper.scrape_page(&url, &options).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.word_count, 3);
}

#[tokio::test]
async fn test_cache_bypassed_when_disabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fresh"))
        .respond_with(html_page("Fresh", "<p>fresh</p>"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let url = format!("{}/fresh", mock_server.uri());
    let options = ScrapeOptions {
        use_cache: false,
        ..ScrapeOptions::default()
    };

    scraper.scrape_page(&url, &options).await.unwrap();
    scraper.scrape_page(&url, &options).await.unwrap();
}

#[tokio::test]
async fn test_retry_then_success() {
    let mock_server = MockServer::start().await;

    // Mounted first, so it answers the first two requests
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html_page("Recovered", "<p>finally here</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();

    let content = scraper
        .scrape_page(
            &format!("{}/flaky", mock_server.uri()),
            &ScrapeOptions::default(),
        )
        .await
        .expect("Third attempt should succeed");

    assert_eq!(content.title, "Recovered");
}

#[tokio::test]
async fn test_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let scraper = WebScraper::new(&config).unwrap();
    let url = format!("{}/down", mock_server.uri());

    let result = scraper.scrape_page(&url, &ScrapeOptions::default()).await;

    match result {
        Err(ScrapeError::Fetch(e)) => assert_eq!(e.status(), Some(503)),
        other => panic!("Expected a fetch error, got {:?}", other),
    }

    // Failures are not cached
    assert!(std::fs::read_dir(&config.cache.directory)
        .unwrap()
        .next()
        .is_none());
}

#[tokio::test]
async fn test_header_override_from_config() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lang"))
        .and(header("accept-language", "de-DE"))
        .respond_with(html_page("Deutsch", "<p>hallo</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config
        .fetcher
        .headers
        .insert("Accept-Language".to_string(), "de-DE".to_string());
    let scraper = WebScraper::new(&config).unwrap();

    let content = scraper
        .scrape_page(
            &format!("{}/lang", mock_server.uri()),
            &ScrapeOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(content.title, "Deutsch");
}

#[tokio::test]
async fn test_batch_skips_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(html_page("One", "<p>one</p>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(html_page("Two", "<p>two</p>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let base_url = mock_server.uri();
    let urls = vec![
        format!("{}/one", base_url),
        format!("{}/missing", base_url),
        format!("{}/two", base_url),
    ];

    let results = scraper
        .scrape_pages(&urls, &ScrapeOptions::default())
        .await;

    let titles: Vec<&str> = results.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
}

#[tokio::test]
async fn test_extract_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/extract"))
        .respond_with(html_page("Extract", "<p>  Visible   words here </p>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let url = format!("{}/extract", mock_server.uri());

    let mut selectors = BTreeMap::new();
    selectors.insert("all".to_string(), "body".to_string());
    selectors.insert("paragraphs".to_string(), "p".to_string());

    let extracted = scraper.extract_data(&url, &selectors).await.unwrap();

    assert_eq!(extracted["all"], vec!["Visible words here".to_string()]);
    assert!(extracted["paragraphs"].is_empty());
}

#[tokio::test]
async fn test_extract_invalid_selector_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("Unused", "<p>unused</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();

    let mut selectors = BTreeMap::new();
    selectors.insert("bad".to_string(), "div[[".to_string());

    let result = scraper
        .extract_data(&format!("{}/page", mock_server.uri()), &selectors)
        .await;
    assert!(matches!(result, Err(ScrapeError::Parse(_))));
}

#[tokio::test]
async fn test_save_scraped_page_as_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/save"))
        .respond_with(html_page("Saved Page", "<p>three saved words</p>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let url = format!("{}/save", mock_server.uri());

    let content = scraper
        .scrape_page(&url, &ScrapeOptions::default())
        .await
        .unwrap();
    let saved = scraper
        .save_to_file(&content, None, OutputFormat::Txt)
        .unwrap();

    assert!(saved.starts_with(dir.path().join("out")));
    let text = std::fs::read_to_string(&saved).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Title: Saved Page");
    assert_eq!(lines[1], format!("URL: {}", url));
    assert!(lines[2].starts_with("Date: "));
    assert_eq!(lines[3], "Word Count: 3");
}

#[tokio::test]
async fn test_page_decoded_with_declared_charset() {
    let mock_server = MockServer::start().await;

    let body = b"<html><head><title>Caf\xe9</title></head><body><p>na\xefve cr\xe8me</p></body></html>";
    Mock::given(method("GET"))
        .and(path("/latin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.to_vec())
                .insert_header("content-type", "text/html; charset=ISO-8859-1"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();

    let content = scraper
        .scrape_page(
            &format!("{}/latin", mock_server.uri()),
            &ScrapeOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(content.title, "Caf\u{e9}");
    assert_eq!(content.content, "na\u{ef}ve cr\u{e8}me");
    assert_eq!(content.word_count, 2);
}

#[tokio::test]
async fn test_unreachable_host_is_fetch_error() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.fetcher.max_retries = 1;
    let scraper = WebScraper::new(&config).unwrap();

    // Port 9 (discard) is not expected to accept HTTP connections
    let result = scraper
        .scrape_page("http://127.0.0.1:9/", &ScrapeOptions::default())
        .await;

    assert!(matches!(
        result,
        Err(ScrapeError::Fetch(FetchError::Http { .. } | FetchError::Timeout { .. }))
    ));
}
