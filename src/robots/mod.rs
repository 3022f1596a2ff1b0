//! Robots.txt handling module
//!
//! This module provides the robots.txt interpreter and the resolver that
//! fetches robots.txt for a target URL. Nothing is cached between scrapes;
//! every check re-fetches.

mod parser;
mod resolver;

pub use parser::{RobotsTxt, RobotsTxtRule};
pub use resolver::{RobotsResolver, RobotsVerdict};

/// Checks if a path is allowed by robots.txt content for the given agent token
///
/// # Examples
///
/// ```
/// use webscraper::robots::is_allowed;
///
/// assert!(!is_allowed("User-agent: *\nDisallow: /admin", "/admin/x", "WebScraperBot"));
/// assert!(is_allowed("User-agent: *\nAllow: /", "/admin/x", "WebScraperBot"));
/// ```
pub fn is_allowed(content: &str, path: &str, agent: &str) -> bool {
    RobotsTxt::parse(content).is_allowed(path, agent)
}
