//! HTML parser for extracting outbound links
//!
//! Every `<a href>` on a page becomes a [`Link`] carrying its resolved URL and
//! its anchor text. The anchor text matters because a link labelled
//! "Kontakt" is a contact page even when its href is `/page-17`.

use scraper::{Html, Selector};
use url::Url;

/// An outbound link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Absolute URL after resolution against the page's base URL
    pub url: Url,

    /// The raw href attribute as written in the page
    pub href: String,

    /// Visible anchor text, whitespace-collapsed
    pub text: String,
}

/// Extracts all followable links from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that is not HTTP(S) after resolution
///
/// Relative links are resolved against `<base href>` when the document
/// declares one, otherwise against `page_url`.
///
/// # Example
///
/// ```
/// use lead_harvest::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/team">Unser Team</a></body></html>"#;
/// let page = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &page);
/// assert_eq!(links[0].url.as_str(), "https://example.com/team");
/// assert_eq!(links[0].text, "Unser Team");
/// ```
pub fn extract_links(html: &str, page_url: &Url) -> Vec<Link> {
    let document = Html::parse_document(html);
    let base_url = document_base_url(&document, page_url);

    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_link(href, &base_url) {
                    let text = element
                        .text()
                        .flat_map(str::split_whitespace)
                        .collect::<Vec<_>>()
                        .join(" ");

                    links.push(Link {
                        url,
                        href: href.trim().to_string(),
                        text,
                    });
                }
            }
        }
    }

    links
}

/// Returns the URL relative links should be resolved against
fn document_base_url(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .filter(|base| base.scheme() == "http" || base.scheme() == "https")
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" => {
            Some(absolute_url)
        }
        _ => None,
    }
}
