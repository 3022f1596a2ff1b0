use crate::config::ValidationConfig;
use crate::url::extract_domain;
use crate::{UrlError, UrlResult};
use url::Url;

/// Outcome of checking a raw URL: a validity flag plus the rejection reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlValidation {
    pub valid: bool,
    pub reason: Option<String>,
}

/// Validates a caller-supplied URL before any network I/O happens
///
/// Checks, in order:
/// 1. non-empty and no longer than `max_url_length`
/// 2. parses as an absolute URL
/// 3. scheme is one of `allowed_schemes`
/// 4. hostname contains none of the `blocked_domains` substrings
///
/// # Examples
///
/// ```
/// use webscraper::config::ValidationConfig;
/// use webscraper::url::validate_url;
///
/// let config = ValidationConfig::default();
/// assert!(validate_url("https://example.com/page", &config).is_ok());
/// assert!(validate_url("ftp://example.com", &config).is_err());
/// assert!(validate_url("http://localhost:8080/", &config).is_err());
/// ```
pub fn validate_url(raw: &str, config: &ValidationConfig) -> UrlResult<Url> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let length = raw.chars().count();
    if length > config.max_url_length {
        return Err(UrlError::TooLong {
            length,
            max: config.max_url_length,
        });
    }

    let url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;

    let scheme = url.scheme();
    if !config
        .allowed_schemes
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(scheme))
    {
        return Err(UrlError::InvalidScheme {
            scheme: scheme.to_string(),
            allowed: config.allowed_schemes.join(", "),
        });
    }

    let host = extract_domain(&url).ok_or(UrlError::MissingDomain)?;
    if let Some(blocked) = config
        .blocked_domains
        .iter()
        .map(|blocked| blocked.trim().to_lowercase())
        .filter(|blocked| !blocked.is_empty())
        .find(|blocked| host.contains(blocked.as_str()))
    {
        tracing::debug!("Host {} matches blocked entry {}", host, blocked);
        return Err(UrlError::BlockedDomain(host));
    }

    Ok(url)
}

/// Flag-and-reason form of [`validate_url`]
pub fn check_url(raw: &str, config: &ValidationConfig) -> UrlValidation {
    match validate_url(raw, config) {
        Ok(_) => UrlValidation {
            valid: true,
            reason: None,
        },
        Err(e) => UrlValidation {
            valid: false,
            reason: Some(e.to_string()),
        },
    }
}
