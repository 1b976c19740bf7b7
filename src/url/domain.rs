use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use lead_harvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the origin of a URL (`scheme://host[:port]/`)
///
/// Used as the base for sitemap discovery and team-page crawling, which always
/// start at the root of a site regardless of which page the input row points to.
pub fn origin_url(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

/// The set of URLs a single crawl is allowed to touch
///
/// Two URLs are in the same scope when their hosts match after lowercasing and
/// removing a leading `www.`, and their explicit ports match. The scheme is
/// ignored so that `http` and `https` pages of one site stay in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    host: String,
    port: Option<u16>,
}

impl DomainScope {
    /// Builds the scope of the given seed URL
    pub fn from_url(seed: &Url) -> UrlResult<Self> {
        let host = extract_domain(seed).ok_or(UrlError::MissingDomain)?;
        Ok(Self {
            host: strip_www(&host).to_string(),
            port: seed.port(),
        })
    }

    /// Returns the scope host (without `www.`)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns true if the URL belongs to this scope
    pub fn contains(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        match extract_domain(url) {
            Some(host) => strip_www(&host) == self.host && url.port() == self.port,
            None => false,
        }
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
