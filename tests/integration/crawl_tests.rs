//! Integration tests for the site crawler
//!
//! These tests serve small linked sites from wiremock and check the crawl
//! bound, ordering, domain restriction and failure handling.

use crate::common::{html_page, test_config};
use gleaner::url::netloc_of;
use gleaner::{CrawlOptions, WebScraper};
use std::collections::HashSet;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts `/`, `/p1` .. `/p{count - 1}`; every page links to every page
async fn mount_linked_site(server: &MockServer, count: usize) {
    let paths: Vec<String> = std::iter::once("/".to_string())
        .chain((1..count).map(|i| format!("/p{}", i)))
        .collect();

    let links: String = paths
        .iter()
        .map(|p| format!(r#"<a href="{}">link {}</a> "#, p, p))
        .collect();

    for (i, page_path) in paths.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(page_path.as_str()))
            .respond_with(html_page(
                &format!("Page {}", i),
                &format!("<p>page {} {}</p>", i, links),
            ))
            .mount(server)
            .await;
    }
}

fn crawl_options(max_pages: usize) -> CrawlOptions {
    CrawlOptions {
        max_pages,
        ..CrawlOptions::default()
    }
}

#[tokio::test]
async fn test_crawl_respects_max_pages() {
    let mock_server = MockServer::start().await;
    mount_linked_site(&mock_server, 6).await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let seed = format!("{}/", mock_server.uri());

    let results = scraper.crawl_site(&seed, &crawl_options(3)).await;

    assert_eq!(results.len(), 3);
    let unique: HashSet<&str> = results.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(unique.len(), 3);

    // Breadth-first from the seed, in link order
    assert_eq!(results[0].url, seed);
    assert_eq!(results[1].url, format!("{}/p1", mock_server.uri()));
    assert_eq!(results[2].url, format!("{}/p2", mock_server.uri()));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_crawl_visits_each_page_once() {
    let mock_server = MockServer::start().await;
    mount_linked_site(&mock_server, 4).await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let seed = format!("{}/", mock_server.uri());

    let results = scraper.crawl_site(&seed, &crawl_options(50)).await;

    assert_eq!(results.len(), 4);
    let requests = mock_server.received_requests().await.unwrap();
    let paths: HashSet<String> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(requests.len(), 4);
    assert_eq!(paths.len(), 4);
}

#[tokio::test]
async fn test_crawl_without_following_links() {
    let mock_server = MockServer::start().await;
    mount_linked_site(&mock_server, 4).await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let options = CrawlOptions {
        follow_links: false,
        ..crawl_options(10)
    };

    let results = scraper
        .crawl_site(&format!("{}/", mock_server.uri()), &options)
        .await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].links.is_empty());
}

#[tokio::test]
async fn test_crawl_stays_within_allowed_domains() {
    let home = MockServer::start().await;
    let elsewhere = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            &format!(
                r#"<p>home <a href="/local">local</a> <a href="{}/away">away</a></p>"#,
                elsewhere.uri()
            ),
        ))
        .mount(&home)
        .await;

    Mock::given(method("GET"))
        .and(path("/local"))
        .respond_with(html_page("Local", "<p>local page</p>"))
        .mount(&home)
        .await;

    Mock::given(method("GET"))
        .respond_with(html_page("Away", "<p>away page</p>"))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let seed = format!("{}/", home.uri());

    let results = scraper.crawl_site(&seed, &crawl_options(10)).await;

    let home_netloc = netloc_of(&seed);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|c| netloc_of(&c.url) == home_netloc));
}

#[tokio::test]
async fn test_crawl_follows_explicitly_allowed_domain() {
    let home = MockServer::start().await;
    let partner = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            &format!(
                r#"<p>home <a href="{}/shared">shared</a></p>"#,
                partner.uri()
            ),
        ))
        .mount(&home)
        .await;

    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(html_page("Shared", "<p>shared page</p>"))
        .expect(1)
        .mount(&partner)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let partner_netloc = netloc_of(&partner.uri()).unwrap();
    let options = CrawlOptions {
        allowed_domains: vec![partner_netloc],
        ..crawl_options(10)
    };

    let results = scraper
        .crawl_site(&format!("{}/", home.uri()), &options)
        .await;

    let titles: Vec<&str> = results.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Home", "Shared"]);
}

#[tokio::test]
async fn test_crawl_ignores_links_inside_ads() {
    let home = MockServer::start().await;
    let partner = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            &format!(
                r#"<div class="ad-slot"><a href="{}/promo">promo</a> <a href="/sponsor">sponsor</a></div>
                   <p>home <a href="/local">local</a></p>"#,
                partner.uri()
            ),
        ))
        .mount(&home)
        .await;

    Mock::given(method("GET"))
        .and(path("/local"))
        .respond_with(html_page("Local", "<p>local page</p>"))
        .mount(&home)
        .await;

    Mock::given(method("GET"))
        .and(path("/sponsor"))
        .respond_with(html_page("Sponsor", "<p>sponsored</p>"))
        .expect(0)
        .mount(&home)
        .await;

    Mock::given(method("GET"))
        .respond_with(html_page("Promo", "<p>promotion</p>"))
        .expect(0)
        .mount(&partner)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let options = CrawlOptions {
        allowed_domains: vec![netloc_of(&partner.uri()).unwrap()],
        ..crawl_options(10)
    };

    let results = scraper
        .crawl_site(&format!("{}/", home.uri()), &options)
        .await;

    let titles: Vec<&str> = results.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Home", "Local"]);
    assert_eq!(results[0].links, vec![format!("{}/local", home.uri())]);
}

#[tokio::test]
async fn test_crawl_skips_excluded_and_failed_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<p>home <a href="/broken">broken</a> <a href="/admin/panel">admin</a> <a href="/ok">ok</a></p>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/panel"))
        .respond_with(html_page("Admin", "<p>secret</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html_page("Ok", "<p>fine</p>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();
    let options = CrawlOptions {
        exclude_patterns: vec!["/admin".to_string()],
        ..crawl_options(10)
    };

    let results = scraper
        .crawl_site(&format!("{}/", mock_server.uri()), &options)
        .await;

    let titles: Vec<&str> = results.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Home", "Ok"]);
}

#[tokio::test]
async fn test_crawl_of_unreachable_seed_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = WebScraper::new(&test_config(&dir)).unwrap();

    let results = scraper
        .crawl_site(&format!("{}/", mock_server.uri()), &crawl_options(5))
        .await;
    assert!(results.is_empty());
}
