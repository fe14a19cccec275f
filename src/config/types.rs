use serde::Deserialize;

/// Main configuration structure for Sumi-Scribe
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub seeds: SeedConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum time between consecutive fetches (milliseconds)
    #[serde(rename = "min-request-interval", default = "default_min_request_interval")]
    pub min_request_interval: u64,

    /// Per-fetch timeout (seconds)
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    /// Fetch the revision history page to find a provenance timestamp
    #[serde(rename = "follow-revision-history", default = "default_true")]
    pub follow_revision_history: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            min_request_interval: default_min_request_interval(),
            fetch_timeout: default_fetch_timeout(),
            follow_revision_history: true,
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
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Where and how records are persisted
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the record store file
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Backend used for the record store
    #[serde(rename = "store-format", default)]
    pub store_format: StoreFormat,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default = "default_summary_path")]
    pub summary_path: String,
}

/// Record store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// A single pretty-printed JSON array, rewritten atomically
    #[default]
    Json,
    /// A SQLite database with one row per record
    Sqlite,
}

/// Seed locations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedConfig {
    /// File with one seed URL per line
    #[serde(default)]
    pub path: Option<String>,

    /// Seed URLs listed inline
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Link scope policy
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Path prefix of content pages; empty disables the namespace rule
    #[serde(rename = "article-prefix", default = "default_article_prefix")]
    pub article_prefix: String,

    /// Namespaces under the prefix that are never crawled
    #[serde(
        rename = "excluded-namespaces",
        default = "default_excluded_namespaces"
    )]
    pub excluded_namespaces: Vec<String>,

    /// Host patterns (e.g. "en.wikipedia.org" or "*.wikipedia.org")
    #[serde(default)]
    pub domains: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            article_prefix: default_article_prefix(),
            excluded_namespaces: default_excluded_namespaces(),
            domains: Vec::new(),
        }
    }
}

/// CSS selectors used by the HTML extractor
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Title selectors, tried in order
    #[serde(rename = "title-selectors", default = "default_title_selectors")]
    pub title_selectors: Vec<String>,

    /// Body selectors, tried in order
    #[serde(rename = "body-selectors", default = "default_body_selectors")]
    pub body_selectors: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            title_selectors: default_title_selectors(),
            body_selectors: default_body_selectors(),
        }
    }
}

fn default_min_request_interval() -> u64 {
    1000
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_summary_path() -> String {
    "./summary.md".to_string()
}

fn default_article_prefix() -> String {
    "/wiki/".to_string()
}

fn default_excluded_namespaces() -> Vec<String> {
    ["Special", "Help", "Template", "Category", "File", "Portal", "Talk"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_title_selectors() -> Vec<String> {
    vec!["h1#firstHeading".to_string(), "title".to_string()]
}

fn default_body_selectors() -> Vec<String> {
    vec!["div#bodyContent".to_string(), "body".to_string()]
}
