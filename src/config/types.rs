use crate::quota::OwnerType;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the scraper
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the production defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub validation: ValidationConfig,
    pub extraction: ExtractionConfig,
    pub quota: QuotaConfig,
}

/// Feature flag and network bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Master switch; a disabled scraper rejects every request
    pub enabled: bool,

    /// Overall budget for fetching the document (milliseconds)
    pub fetch_timeout_ms: u64,

    /// Budget for fetching robots.txt (milliseconds)
    pub robots_timeout_ms: u64,

    /// Maximum accepted response body size in bytes
    pub max_response_size: u64,

    /// Whether robots.txt rules are enforced
    pub respect_robots_txt: bool,

    /// Maximum number of redirects followed per request
    pub max_redirects: usize,
}

impl ScraperConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn robots_timeout(&self) -> Duration {
        Duration::from_millis(self.robots_timeout_ms)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fetch_timeout_ms: 10_000,
            robots_timeout_ms: 5_000,
            max_response_size: 5 * 1024 * 1024,
            respect_robots_txt: true,
            max_redirects: 5,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the scraper, also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the scraper
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the scraper
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }

    /// The agent token used when selecting a robots.txt rule group
    pub fn robots_token(&self) -> &str {
        &self.crawler_name
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "WebScraperBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/bot".to_string(),
        }
    }
}

/// Input URL restrictions (SSRF defense)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ValidationConfig {
    /// Maximum accepted URL length in characters
    pub max_url_length: usize,

    /// Accepted URL schemes
    pub allowed_schemes: Vec<String>,

    /// Hostname substrings that are never fetched
    pub blocked_domains: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_url_length: 2048,
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            blocked_domains: [
                "localhost",
                "127.0.0.1",
                "0.0.0.0",
                "169.254.169.254",
                "[::1]",
                "metadata.google.internal",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }
}

/// Caps applied to extracted content
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionConfig {
    pub max_title_length: usize,
    pub max_description_length: usize,
    pub max_text_length: usize,
    pub max_links: usize,
    pub max_images: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_title_length: 200,
            max_description_length: 500,
            max_text_length: 50_000,
            max_links: 100,
            max_images: 50,
        }
    }
}

/// Per-owner daily quota configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct QuotaConfig {
    /// Key prefix for quota records in the key-value store
    pub namespace: String,

    /// Scrapes per window for authenticated users
    pub user_daily_limit: u32,

    /// Scrapes per window for guests
    pub guest_daily_limit: u32,

    /// Length of a quota window in hours
    pub window_hours: u32,
}

impl QuotaConfig {
    /// Returns the daily limit for the given owner type
    pub fn limit_for(&self, owner_type: OwnerType) -> u32 {
        match owner_type {
            OwnerType::User => self.user_daily_limit,
            OwnerType::Guest => self.guest_daily_limit,
        }
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.window_hours))
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            namespace: "scrape_quota".to_string(),
            user_daily_limit: 100,
            guest_daily_limit: 5,
            window_hours: 24,
        }
    }
}
