use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Lead-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched per website
    pub max_pages: usize,

    /// Number of websites crawled in parallel
    pub concurrency: usize,

    /// Fixed delay between two fetches of the same crawl (milliseconds)
    pub politeness_delay_ms: u64,

    /// Whole-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Maximum decoded body size read per page (bytes)
    pub max_page_bytes: usize,

    /// Number of team pages kept on the shortlist
    pub team_page_count: usize,
}

impl CrawlerConfig {
    /// Returns the politeness delay as a Duration
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    /// Returns the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            concurrency: 20,
            politeness_delay_ms: 500,
            request_timeout_secs: 30,
            max_page_bytes: 10 * 1024 * 1024,
            team_page_count: 5,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Input row column mapping
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InputConfig {
    /// Column holding the website URL
    pub website_column: String,

    /// Column holding the business name (context for email selection)
    pub name_column: Option<String>,

    /// Column holding the business address (context for email selection)
    pub address_column: Option<String>,

    /// Column whose text may already contain an email (e.g. `adr_address`)
    pub email_hint_column: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            website_column: "website".to_string(),
            name_column: Some("name".to_string()),
            address_column: Some("formatted_address".to_string()),
            email_hint_column: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Column receiving the comma-separated list of discovered emails
    pub emails_column: String,

    /// Column receiving the selected best email
    pub best_email_column: String,

    /// Number of `TeamPage_N` columns written in team-page mode
    pub team_page_columns: usize,

    /// Path to the markdown run summary, if one should be written
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            emails_column: "Emails".to_string(),
            best_email_column: "SelectedEmail".to_string(),
            team_page_columns: 10,
            summary_path: None,
        }
    }
}

/// What a crawl is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlMode {
    /// Harvest emails, prioritizing contact pages
    #[default]
    Emails,

    /// Shortlist team pages first, then harvest emails starting from them
    TeamPages,
}

impl CrawlMode {
    /// Returns the name used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emails => "emails",
            Self::TeamPages => "team-pages",
        }
    }
}

/// Per-row enrichment options
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct EnrichmentConfig {
    /// Crawl mode for every row
    pub mode: CrawlMode,

    /// Whether to pick a single best email per row
    pub select_best_email: bool,

    /// Skip the website crawl when the hint column already yields an email
    pub skip_crawl_when_hint_has_email: bool,
}
