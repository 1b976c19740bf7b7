//! Integration tests for the site crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! full site crawls end-to-end.

use lead_harvest::config::{CrawlerConfig, UserAgentConfig};
use lead_harvest::crawler::{
    build_http_client, fetch_sitemap, CrawlSettings, CrawlTarget, PageFetcher, SiteCrawler,
};
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client() -> reqwest::Client {
    let user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    build_http_client(&user_agent, &CrawlerConfig::default()).expect("Failed to build client")
}

/// Creates a crawler with a very short politeness delay
fn create_crawler(max_pages: usize, max_page_bytes: usize) -> SiteCrawler {
    create_polite_crawler(max_pages, max_page_bytes, Duration::from_millis(1))
}

fn create_polite_crawler(
    max_pages: usize,
    max_page_bytes: usize,
    politeness_delay: Duration,
) -> SiteCrawler {
    SiteCrawler::new(
        create_client(),
        CrawlSettings {
            max_pages,
            max_page_bytes,
            politeness_delay,
            team_page_count: 5,
        },
    )
}

fn create_fetcher(target: &CrawlTarget, max_bytes: usize) -> PageFetcher {
    PageFetcher::new(
        create_client(),
        target.scope.clone(),
        max_bytes,
        Duration::ZERO,
    )
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_single_page_with_one_email() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "<html><body><p>Reservations: booking@hotel-alpha.example</p></body></html>".to_string(),
    )
    .await;

    let target = CrawlTarget::new(0, &server.uri()).unwrap();
    let result = create_crawler(10, 1024 * 1024).crawl(&target).await;

    assert_eq!(result.pages_visited, 1);
    assert_eq!(
        result.emails.iter().cloned().collect::<Vec<_>>(),
        vec!["booking@hotel-alpha.example".to_string()]
    );
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_priority_pages_fetched_before_earlier_links() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/rooms">Rooms</a>
            <a href="/gallery">Gallery</a>
            <a href="/page-7">Kontakt</a>
            <a href="/unser-team">Our people</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    for route in ["/rooms", "/gallery", "/page-7", "/unser-team"] {
        mount_page(&server, route, "<p>nothing here</p>".to_string()).await;
    }

    let target = CrawlTarget::new(0, &server.uri()).unwrap();
    let result = create_crawler(10, 1024 * 1024).crawl(&target).await;

    assert_eq!(result.pages_visited, 5);
    assert_eq!(
        requested_paths(&server).await,
        vec!["/", "/page-7", "/unser-team", "/rooms", "/gallery"]
    );
}

#[tokio::test]
async fn test_page_budget_is_never_exceeded() {
    let server = MockServer::start().await;
    let links: String = (0..30)
        .map(|i| format!(r#"<a href="/p{}">Page {}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", format!("<html><body>{}</body></html>", links)).await;
    for i in 0..30 {
        mount_page(
            &server,
            &format!("/p{}", i),
            format!(r#"<a href="/p{}/deeper">More</a>"#, i),
        )
        .await;
    }

    for max_pages in 1..=4 {
        let target = CrawlTarget::new(max_pages, &server.uri()).unwrap();
        let result = create_crawler(max_pages, 1024 * 1024).crawl(&target).await;
        assert_eq!(result.pages_visited, max_pages);
    }

    // 1 + 2 + 3 + 4 fetches across the four crawls
    assert_eq!(requested_paths(&server).await.len(), 10);
}

#[tokio::test]
async fn test_other_domains_are_never_fetched() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(
        &server,
        "/",
        format!(
            r#"<a href="{}/contact">Partner contact</a><a href="/about">About</a>"#,
            other.uri()
        ),
    )
    .await;
    mount_page(&server, "/about", "<p>about us</p>".to_string()).await;
    mount_page(&other, "/contact", "partner@other.example".to_string()).await;

    let target = CrawlTarget::new(0, &server.uri()).unwrap();
    let result = create_crawler(10, 1024 * 1024).crawl(&target).await;

    assert_eq!(result.pages_visited, 2);
    assert!(result.emails.is_empty());
    assert!(requested_paths(&other).await.is_empty());
}

#[tokio::test]
async fn test_failed_and_oversized_pages_are_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/huge">Huge</a><a href="/contact">Contact</a>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/huge",
        format!("hidden@hotel.example {}", "x".repeat(64 * 1024)),
    )
    .await;
    mount_page(
        &server,
        "/contact",
        "<p>Schreiben Sie uns: rezeption [at] hotel [dot] example</p>".to_string(),
    )
    .await;

    let target = CrawlTarget::new(0, &server.uri()).unwrap();
    let result = create_crawler(10, 4096).crawl(&target).await;

    assert_eq!(result.pages_visited, 4);
    assert_eq!(result.pages_failed, 2);
    assert!(result.emails.contains("rezeption@hotel.example"));
    assert!(!result.emails.contains("hidden@hotel.example"));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_unreachable_site_produces_degraded_result() {
    let target = CrawlTarget::new(9, "http://127.0.0.1:9/").unwrap();
    let result = create_crawler(10, 1024 * 1024).crawl(&target).await;

    assert_eq!(result.site_id, 9);
    assert_eq!(result.pages_visited, 1);
    assert_eq!(result.pages_failed, 1);
    assert!(result.emails.is_empty());
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_team_page_variant_uses_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>{base}/</loc></url>
              <url><loc>{base}/zimmer</loc></url>
              <url><loc>{base}/das-team</loc></url>
              <url><loc>https://cdn.elsewhere.example/team</loc></url>
            </urlset>"#
        )))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/das-team",
        "<p>Direktion: direktion@hotel.example</p>".to_string(),
    )
    .await;
    mount_page(
        &server,
        "/",
        r#"<p>info@hotel.example</p><a href="/zimmer">Zimmer</a>"#.to_string(),
    )
    .await;
    mount_page(&server, "/zimmer", "<p>rooms</p>".to_string()).await;

    let target = CrawlTarget::new(0, &base).unwrap();
    let result = create_crawler(10, 1024 * 1024).crawl_team_pages(&target).await;

    assert_eq!(result.team_pages, vec![format!("{}/das-team", base)]);
    assert!(result.emails.contains("direktion@hotel.example"));
    assert!(result.emails.contains("info@hotel.example"));
    assert_eq!(
        requested_paths(&server).await,
        vec!["/sitemap.xml", "/das-team", "/", "/zimmer"]
    );
}

#[tokio::test]
async fn test_team_page_variant_falls_back_to_crawling() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/ansprechpartner">Ansprechpartner</a><a href="/anfahrt">Anfahrt</a>"#
            .to_string(),
    )
    .await;
    mount_page(&server, "/ansprechpartner", "<p>chef@hotel.example</p>".to_string()).await;
    mount_page(&server, "/anfahrt", "<p>directions</p>".to_string()).await;

    let target = CrawlTarget::new(0, &server.uri()).unwrap();
    let result = create_crawler(10, 1024 * 1024).crawl_team_pages(&target).await;

    assert_eq!(
        result.team_pages,
        vec![format!("{}/ansprechpartner", server.uri())]
    );
    assert!(result.emails.contains("chef@hotel.example"));
    assert!(result.pages_visited <= 10);
}

#[tokio::test]
async fn test_sitemap_index_is_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>{base}/sitemap-pages.xml</loc></sitemap>
            </sitemapindex>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-pages.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<urlset>
              <url><loc>{base}/team</loc></url>
              <url><loc>{base}/team</loc></url>
              <url><loc>https://other.example/</loc></url>
            </urlset>"#
        )))
        .mount(&server)
        .await;

    let base_url = Url::parse(&base).unwrap();
    let target = CrawlTarget::new(0, &base).unwrap();
    let mut fetcher = create_fetcher(&target, 1024 * 1024);
    let urls = fetch_sitemap(&mut fetcher, &base_url).await;

    assert_eq!(urls.len(), 1);
    assert_eq!(urls[0].path(), "/team");
}

#[tokio::test]
async fn test_missing_or_malformed_sitemap_is_empty() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let target = CrawlTarget::new(0, &server.uri()).unwrap();

    let mut fetcher = create_fetcher(&target, 1024 * 1024);

    // Nothing mounted: 404
    assert!(fetch_sitemap(&mut fetcher, &base_url).await.is_empty());

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    assert!(fetch_sitemap(&mut fetcher, &base_url).await.is_empty());
}

#[tokio::test]
async fn test_oversized_sitemap_is_empty() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{}/team</loc></url><!-- {} --></urlset>",
            base,
            "x".repeat(16 * 1024)
        )))
        .mount(&server)
        .await;

    let base_url = Url::parse(&base).unwrap();
    let target = CrawlTarget::new(0, &base).unwrap();
    let mut fetcher = create_fetcher(&target, 4096);

    assert!(fetch_sitemap(&mut fetcher, &base_url).await.is_empty());
}

#[tokio::test]
async fn test_sitemap_requests_respect_politeness_delay() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<sitemapindex>
              <sitemap><loc>{base}/a.xml</loc></sitemap>
              <sitemap><loc>{base}/b.xml</loc></sitemap>
            </sitemapindex>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{base}/team</loc></url></urlset>"
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{base}/</loc></url></urlset>"
        )))
        .mount(&server)
        .await;
    mount_page(&server, "/team", "<p>team@hotel.example</p>".to_string()).await;
    mount_page(&server, "/", "<p>welcome</p>".to_string()).await;

    let target = CrawlTarget::new(0, &base).unwrap();
    let crawler = create_polite_crawler(10, 1024 * 1024, Duration::from_millis(150));

    let start = Instant::now();
    let result = crawler.crawl_team_pages(&target).await;
    let elapsed = start.elapsed();

    assert_eq!(
        requested_paths(&server).await,
        vec!["/sitemap.xml", "/a.xml", "/b.xml", "/team", "/"]
    );
    // Five requests, four gaps
    assert!(elapsed >= Duration::from_millis(600), "elapsed {:?}", elapsed);
    assert!(result.emails.contains("team@hotel.example"));
}
