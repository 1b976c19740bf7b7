//! Sitemap discovery
//!
//! Fetches `/sitemap.xml` at the root of a site and returns its page URLs.
//! A `<sitemapindex>` is followed one level deep. Every failure (missing file,
//! non-2xx status, oversized body, malformed XML, network error) yields an
//! empty list.
//!
//! Sitemap documents are requested through the crawl's own [`PageFetcher`],
//! so they count against its politeness delay and body size cap like any
//! other page.

use crate::crawler::fetcher::PageFetcher;
use crate::url::origin_url;
use std::collections::HashSet;
use url::Url;

/// Maximum number of child sitemaps fetched from a sitemap index
pub const MAX_CHILD_SITEMAPS: usize = 8;

/// Maximum number of `<loc>` entries read from one sitemap document
const MAX_LOCS_PER_SITEMAP: usize = 5000;

/// Fetches the published URL list of a site
///
/// # Arguments
///
/// * `fetcher` - The fetcher of the crawl; entries outside its scope are dropped
/// * `base` - Any URL on the site; the sitemap is looked up at its origin
///
/// # Returns
///
/// Unique in-scope page URLs in document order; empty on any failure.
pub async fn fetch_sitemap(fetcher: &mut PageFetcher, base: &Url) -> Vec<Url> {
    let sitemap_url = match origin_url(base).join("sitemap.xml") {
        Ok(url) => url,
        Err(_) => return Vec::new(),
    };

    let Some(document) = fetch_document(fetcher, &sitemap_url).await else {
        return Vec::new();
    };

    let locs = match classify_document(&document) {
        SitemapKind::UrlSet => extract_loc_values(&document),
        SitemapKind::Index => {
            let mut pages = Vec::new();
            for child in extract_loc_values(&document)
                .into_iter()
                .take(MAX_CHILD_SITEMAPS)
            {
                let Ok(child_url) = Url::parse(&child) else {
                    continue;
                };
                if !fetcher.scope().contains(&child_url) {
                    continue;
                }
                if let Some(child_doc) = fetch_document(fetcher, &child_url).await {
                    if classify_document(&child_doc) == SitemapKind::UrlSet {
                        pages.extend(extract_loc_values(&child_doc));
                    }
                }
            }
            pages
        }
        SitemapKind::Invalid => {
            tracing::debug!("{} is not a sitemap document", sitemap_url);
            return Vec::new();
        }
    };

    let scope = fetcher.scope();
    let mut seen = HashSet::new();
    let urls: Vec<Url> = locs
        .iter()
        .filter_map(|loc| Url::parse(loc).ok())
        .filter(|url| scope.contains(url))
        .filter(|url| seen.insert(url.to_string()))
        .collect();

    tracing::debug!("Sitemap {} yielded {} URLs", sitemap_url, urls.len());
    urls
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SitemapKind {
    UrlSet,
    Index,
    Invalid,
}

/// Identifies the sitemap root element
fn classify_document(xml: &str) -> SitemapKind {
    if xml.contains("<urlset") && xml.contains("</urlset>") {
        SitemapKind::UrlSet
    } else if xml.contains("<sitemapindex") && xml.contains("</sitemapindex>") {
        SitemapKind::Index
    } else {
        SitemapKind::Invalid
    }
}

async fn fetch_document(fetcher: &mut PageFetcher, url: &Url) -> Option<String> {
    let document = fetcher.fetch_document(url).await;

    if !document.status.is_ok() {
        tracing::debug!(
            "Sitemap {} unavailable ({}): {}",
            url,
            document.status,
            document.error.as_deref().unwrap_or("no details")
        );
        return None;
    }

    Some(document.raw_text)
}

/// Extracts the text of every `<loc>` element
///
/// Handles CDATA sections and the XML entities that appear in URLs.
fn extract_loc_values(xml: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0usize;

    while let Some(open_idx) = xml[start..].find("<loc>") {
        let open = start + open_idx + "<loc>".len();
        let Some(close_rel) = xml[open..].find("</loc>") else {
            break;
        };
        let close = open + close_rel;

        let raw = xml[open..close].trim();
        let raw = raw
            .strip_prefix("<![CDATA[")
            .and_then(|s| s.strip_suffix("]]>"))
            .unwrap_or(raw)
            .trim();

        if !raw.is_empty() {
            out.push(unescape_xml(raw));
        }
        if out.len() >= MAX_LOCS_PER_SITEMAP {
            break;
        }

        start = close + "</loc>".len();
    }

    out
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_loc_values() {
        let xml = r#"<?xml version="1.0"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc> https://example.com/ </loc></url>
              <url><loc><![CDATA[https://example.com/team]]></loc></url>
              <url><loc>https://example.com/list?a=1&amp;b=2</loc></url>
            </urlset>"#;

        assert_eq!(
            extract_loc_values(xml),
            vec![
                "https://example.com/",
                "https://example.com/team",
                "https://example.com/list?a=1&b=2",
            ]
        );
    }

    #[test]
    fn test_unterminated_loc_stops() {
        let xml = "<urlset><url><loc>https://example.com/a</loc><loc>https://exa";
        assert_eq!(extract_loc_values(xml), vec!["https://example.com/a"]);
    }

    #[test]
    fn test_classify_document() {
        assert_eq!(
            classify_document("<urlset><url><loc>x</loc></url></urlset>"),
            SitemapKind::UrlSet
        );
        assert_eq!(
            classify_document("<sitemapindex><sitemap><loc>x</loc></sitemap></sitemapindex>"),
            SitemapKind::Index
        );
        assert_eq!(
            classify_document("<html><body>Not found</body></html>"),
            SitemapKind::Invalid
        );
        assert_eq!(classify_document("<urlset><url>"), SitemapKind::Invalid);
    }
}
