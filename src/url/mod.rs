//! URL handling module
//!
//! This module provides the input URL validator (the primary SSRF defense),
//! domain extraction, and robots.txt location derivation.

mod domain;
mod validate;

pub use domain::{extract_domain, robots_txt_url};
pub use validate::{check_url, validate_url, UrlValidation};
