//! JSON envelope rendering
//!
//! Success: `{"result": ScrapingResult, "usage": UsageInfo}`.
//! Failure: `{"error": {"code", "message", "usage"?}}`, with `usage` present
//! only for `quota_exceeded`.

use crate::output::OutputResult;
use crate::scrape::ScrapeOutcome;
use crate::ScrapeError;
use serde::Serialize;

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<&'a crate::quota::UsageInfo>,
}

/// Renders either side of a scrape result as pretty-printed JSON
pub fn render_json(result: &Result<ScrapeOutcome, ScrapeError>) -> OutputResult<String> {
    match result {
        Ok(outcome) => render_outcome_json(outcome),
        Err(error) => render_error_json(error),
    }
}

pub fn render_outcome_json(outcome: &ScrapeOutcome) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

pub fn render_error_json(error: &ScrapeError) -> OutputResult<String> {
    let envelope = ErrorEnvelope {
        error: ErrorBody {
            code: error.code(),
            message: error.to_string(),
            usage: error.usage(),
        },
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}
