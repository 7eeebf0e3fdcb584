//! JSON API client tests

use crate::common::test_config;
use gleaner::{ParseError, ScrapeError, WebScraper};
use reqwest::Method;
use serde_json::json;
use std::collections::BTreeMap;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_get_json_with_header_override() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(header("authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [1, 2, 3]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let mut headers = BTreeMap::new();
    headers.insert("Authorization".to_string(), "Bearer token".to_string());

    let value = scraper
        .fetch_json(
            &format!("{}/api/items", mock_server.uri()),
            Method::GET,
            None,
            &headers,
        )
        .await
        .unwrap();

    assert_eq!(value["items"], json!([1, 2, 3]));
}

#[tokio::test]
async fn test_get_json_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();

    let value = scraper
        .fetch_json(
            &format!("{}/api/status", mock_server.uri()),
            Method::GET,
            None,
            &BTreeMap::new(),
        )
        .await
        .unwrap();
    assert_eq!(value["ok"], json!(true));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/items"))
        .and(body_json(json!({"name": "widget"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let body = json!({"name": "widget"});

    let value = scraper
        .fetch_json(
            &format!("{}/api/items", mock_server.uri()),
            Method::POST,
            Some(&body),
            &BTreeMap::new(),
        )
        .await
        .unwrap();
    assert_eq!(value["id"], json!(7));
}

#[tokio::test]
async fn test_post_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();

    let result = scraper
        .fetch_json(
            &format!("{}/api/items", mock_server.uri()),
            Method::POST,
            Some(&json!({})),
            &BTreeMap::new(),
        )
        .await;

    match result {
        Err(ScrapeError::Fetch(e)) => assert_eq!(e.status(), Some(500)),
        other => panic!("Expected a fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();

    let result = scraper
        .fetch_json(
            &format!("{}/api/html", mock_server.uri()),
            Method::GET,
            None,
            &BTreeMap::new(),
        )
        .await;
    assert!(matches!(
        result,
        Err(ScrapeError::Parse(ParseError::Json { .. }))
    ));
}
