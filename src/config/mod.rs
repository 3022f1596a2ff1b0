//! Configuration module for the scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every value has a default, so an empty file (or `Config::default()`) is a
//! working configuration.
//!
//! # Example
//!
//! ```no_run
//! use webscraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("webscraper.toml")).unwrap();
//! println!("Fetch timeout: {}ms", config.scraper.fetch_timeout_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ExtractionConfig, QuotaConfig, ScraperConfig, UserAgentConfig, ValidationConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
