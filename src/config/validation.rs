use crate::config::types::{
    Config, ExtractionConfig, QuotaConfig, ScraperConfig, UserAgentConfig, ValidationConfig,
};
use crate::ConfigError;
use url::Url;

/// Schemes the fetcher knows how to speak
const FETCHABLE_SCHEMES: &[&str] = &["http", "https"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_validation_config(&config.validation)?;
    validate_extraction_config(&config.extraction)?;
    validate_quota_config(&config.quota)?;
    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.fetch_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "fetch_timeout_ms must be greater than 0".to_string(),
        ));
    }

    if config.robots_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "robots_timeout_ms must be greater than 0".to_string(),
        ));
    }

    if config.max_response_size == 0 {
        return Err(ConfigError::Validation(
            "max_response_size must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // The name doubles as the robots.txt agent token: alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

fn validate_validation_config(config: &ValidationConfig) -> Result<(), ConfigError> {
    if config.max_url_length == 0 {
        return Err(ConfigError::Validation(
            "max_url_length must be greater than 0".to_string(),
        ));
    }

    if config.allowed_schemes.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_schemes cannot be empty".to_string(),
        ));
    }

    for scheme in &config.allowed_schemes {
        if !FETCHABLE_SCHEMES.contains(&scheme.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unsupported scheme '{}' in allowed_schemes (supported: {})",
                scheme,
                FETCHABLE_SCHEMES.join(", ")
            )));
        }
    }

    // An empty entry would match every hostname
    if config.blocked_domains.iter().any(|d| d.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "blocked_domains cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.max_title_length == 0 || config.max_description_length == 0 {
        return Err(ConfigError::Validation(
            "max_title_length and max_description_length must be greater than 0".to_string(),
        ));
    }

    if config.max_text_length == 0 {
        return Err(ConfigError::Validation(
            "max_text_length must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_quota_config(config: &QuotaConfig) -> Result<(), ConfigError> {
    if config.namespace.trim().is_empty() {
        return Err(ConfigError::Validation(
            "quota namespace cannot be empty".to_string(),
        ));
    }

    if config.window_hours == 0 {
        return Err(ConfigError::Validation(
            "window_hours must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
