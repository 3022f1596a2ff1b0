//! Webscraper: a polite single-page content extractor
//!
//! This crate fetches one remote HTML document at a time, after checking the
//! URL against an SSRF blocklist and the target site's robots.txt, extracts
//! structured content from it, and tracks a per-owner daily usage quota in a
//! shared key-value store.

pub mod config;
pub mod output;
pub mod quota;
pub mod robots;
pub mod scrape;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Error returned by a scrape, tagged with a stable error code
///
/// Callers map these codes onto their own transport (HTTP status codes,
/// JSON envelopes); nothing here is retried internally.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Web scraping is currently disabled")]
    FeatureDisabled,

    #[error("Invalid URL: {0}")]
    Validation(#[from] UrlError),

    #[error(
        "Daily scrape limit reached ({} of {} used)",
        .usage.used,
        .usage.limit
    )]
    QuotaExceeded { usage: quota::UsageInfo },

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsBlocked { url: String },

    #[error("Failed to fetch page: {0}")]
    Fetch(#[from] scrape::FetchError),

    #[error("Failed to parse page: {0}")]
    Parse(#[from] scrape::ExtractError),
}

impl ScrapeError {
    /// Returns the stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::FeatureDisabled => "feature_disabled",
            Self::Validation(_) => "validation_error",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::RobotsBlocked { .. } => "robots_txt_blocked",
            Self::Fetch(_) => "fetch_error",
            Self::Parse(_) => "parse_error",
        }
    }

    /// Returns the usage snapshot carried by a quota error
    pub fn usage(&self) -> Option<&quota::UsageInfo> {
        match self {
            Self::QuotaExceeded { usage } => Some(usage),
            _ => None,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("URL is required")]
    Empty,

    #[error("URL is too long ({length} characters, max {max})")]
    TooLong { length: usize, max: usize },

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL scheme '{scheme}' is not allowed (allowed schemes: {allowed})")]
    InvalidScheme { scheme: String, allowed: String },

    #[error("Missing host in URL")]
    MissingDomain,

    #[error("Domain '{0}' is not allowed")]
    BlockedDomain(String),
}

/// Result type alias for scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use quota::{Owner, OwnerType, UsageInfo};
pub use scrape::{ScrapeInput, ScrapeOutcome, Scraper, ScrapingResult};
pub use state::ScrapeStage;
pub use url::{check_url, validate_url, UrlValidation};
