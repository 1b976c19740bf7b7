//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with an identifying user agent
//! - Bounded GET requests (timeout and decoded-size cap)
//! - Error classification into [`FetchStatus`]
//! - The per-crawler politeness delay

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::parser::{extract_links, Link};
use crate::state::PolitenessGate;
use crate::url::DomainScope;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for one request
const MAX_REDIRECTS: usize = 10;

/// Outcome class of one page fetch
///
/// None of these are errors for the caller; the crawl moves on to the next
/// frontier entry whatever the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// 2xx response read completely within the size cap
    Ok,

    /// The request or the body read timed out
    Timeout,

    /// Non-2xx HTTP status
    HttpError(u16),

    /// Body exceeded the size cap; text holds what was read before aborting
    TooLarge,

    /// Connection, TLS, redirect or body decoding failure
    NetworkError,
}

impl FetchStatus {
    /// Returns true for a fully read 2xx page
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Timeout => write!(f, "timeout"),
            Self::HttpError(code) => write!(f, "http {}", code),
            Self::TooLarge => write!(f, "too large"),
            Self::NetworkError => write!(f, "network error"),
        }
    }
}

/// Result of one page fetch
///
/// Consumed by the crawl loop and dropped once the page is processed.
#[derive(Debug, Clone)]
pub struct PageFetchResult {
    /// The URL that was requested
    pub url: Url,

    /// URL after redirects, when a response was received
    pub final_url: Option<Url>,

    /// Outcome class
    pub status: FetchStatus,

    /// Decoded body text (possibly partial for `TooLarge`)
    pub raw_text: String,

    /// In-scope outbound links, only populated for `Ok` pages
    pub outbound_links: Vec<Link>,

    /// Human-readable failure description
    pub error: Option<String>,
}

impl PageFetchResult {
    fn failed(url: &Url, status: FetchStatus, error: impl Into<String>) -> Self {
        Self {
            url: url.clone(),
            final_url: None,
            status,
            raw_text: String::new(),
            outbound_links: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client is constructed once at startup and shared by every crawler;
/// `reqwest::Client` is reference-counted internally, so cloning it is cheap.
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Timeouts come from here
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use lead_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use lead_harvest::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "LeadHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/bot".to_string(),
///     contact_email: "bot@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9,de;q=0.8"),
    );

    Client::builder()
        .user_agent(user_agent.header_value())
        .default_headers(headers)
        .timeout(crawler.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs bounded page fetches for one crawl
///
/// Owns the politeness gate of its crawl, so two fetchers never slow each
/// other down.
pub struct PageFetcher {
    client: Client,
    scope: DomainScope,
    max_bytes: usize,
    gate: PolitenessGate,
}

impl PageFetcher {
    /// Creates a fetcher restricted to `scope`
    pub fn new(client: Client, scope: DomainScope, max_bytes: usize, delay: Duration) -> Self {
        Self {
            client,
            scope,
            max_bytes,
            gate: PolitenessGate::new(delay),
        }
    }

    /// Returns the scope outbound links are filtered to
    pub fn scope(&self) -> &DomainScope {
        &self.scope
    }

    /// Fetches a single page
    ///
    /// # Request Flow
    ///
    /// 1. Wait for the politeness delay since the previous fetch
    /// 2. Send the GET request (redirects followed by the client)
    /// 3. Classify the response status
    /// 4. Stream the body up to `max_bytes`
    /// 5. Extract in-scope outbound links from complete pages
    ///
    /// # Status Mapping
    ///
    /// | Condition | Status |
    /// |-----------|--------|
    /// | Request or body read timed out | `Timeout` |
    /// | Connection/TLS/redirect failure | `NetworkError` |
    /// | Non-2xx response | `HttpError(code)` |
    /// | Body larger than `max_bytes` | `TooLarge` |
    /// | Otherwise | `Ok` |
    pub async fn fetch(&mut self, url: &Url) -> PageFetchResult {
        let mut result = self.fetch_document(url).await;

        if result.status.is_ok() {
            let base = result.final_url.as_ref().unwrap_or(url);
            result.outbound_links = extract_links(&result.raw_text, base)
                .into_iter()
                .filter(|link| self.scope.contains(&link.url))
                .collect();
        }

        result
    }

    /// Fetches a document without looking for links
    ///
    /// Same politeness delay, size cap and status mapping as [`fetch`], for
    /// non-HTML resources such as sitemaps.
    ///
    /// [`fetch`]: PageFetcher::fetch
    pub async fn fetch_document(&mut self, url: &Url) -> PageFetchResult {
        self.gate.wait_turn().await;

        tracing::debug!("Fetching {}", url);

        let mut response = match self.client.get(url.as_str()).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return PageFetchResult::failed(url, FetchStatus::Timeout, "Request timeout");
            }
            Err(e) => {
                return PageFetchResult::failed(url, FetchStatus::NetworkError, e.to_string());
            }
        };

        let final_url = response.url().clone();
        let status = response.status();

        if !status.is_success() {
            let mut result = PageFetchResult::failed(
                url,
                FetchStatus::HttpError(status.as_u16()),
                format!("HTTP {}", status),
            );
            result.final_url = Some(final_url);
            return result;
        }

        let mut body: Vec<u8> = Vec::new();
        let mut outcome = FetchStatus::Ok;
        let mut error = None;

        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let remaining = self.max_bytes.saturating_sub(body.len());
                    if chunk.len() > remaining {
                        body.extend_from_slice(&chunk[..remaining]);
                        outcome = FetchStatus::TooLarge;
                        error = Some(format!("Body exceeds {} bytes", self.max_bytes));
                        break;
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    outcome = if e.is_timeout() {
                        FetchStatus::Timeout
                    } else {
                        FetchStatus::NetworkError
                    };
                    error = Some(e.to_string());
                    break;
                }
            }
        }

        PageFetchResult {
            url: url.clone(),
            final_url: Some(final_url),
            status: outcome,
            raw_text: String::from_utf8_lossy(&body).into_owned(),
            outbound_links: Vec::new(),
            error,
        }
    }
}
