//! Markdown report generation
//!
//! This module renders a scraped page as a human-readable markdown report,
//! including metadata, extracted text, links, and images.

use crate::output::{write_output, OutputResult};
use crate::scrape::ScrapeOutcome;
use std::path::Path;

/// Lists longer than this are cut off with a "... and N more" line
const MAX_LISTED: usize = 20;

/// Writes a markdown report of `outcome` to `output_path`
pub fn write_markdown(outcome: &ScrapeOutcome, output_path: &Path) -> OutputResult<()> {
    write_output(&format_markdown(outcome), output_path)
}

/// Formats a scrape outcome as markdown
///
/// # Arguments
///
/// * `outcome` - The scraped page and usage snapshot
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown(outcome: &ScrapeOutcome) -> String {
    let result = &outcome.result;
    let metadata = &result.metadata;
    let mut md = String::new();

    // Title
    md.push_str(&format!("# {}\n\n", result.title));

    if let Some(description) = &result.description {
        md.push_str(&format!("> {}\n\n", description));
    }

    // Page metadata
    md.push_str("## Page Information\n\n");
    md.push_str(&format!("- **URL**: {}\n", result.url));
    md.push_str(&format!("- **Scraped**: {}\n", result.scraped_at.to_rfc3339()));
    md.push_str(&format!(
        "- **robots.txt allowed**: {}\n",
        result.robots_txt_allowed
    ));
    md.push_str(&format!("- **Charset**: {}\n", metadata.charset));

    let optional = [
        ("Language", &metadata.language),
        ("Author", &metadata.author),
        ("Published", &metadata.publish_date),
        ("Canonical", &metadata.canonical),
        ("Open Graph Title", &metadata.og_title),
        ("Open Graph Description", &metadata.og_description),
        ("Open Graph Image", &metadata.og_image),
        ("Twitter Card", &metadata.twitter_card),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            md.push_str(&format!("- **{}**: {}\n", label, value));
        }
    }
    md.push('\n');

    // Usage
    md.push_str("## Usage\n\n");
    md.push_str(&format!(
        "- **Used**: {} of {}\n",
        outcome.usage.used, outcome.usage.limit
    ));
    if let Some(reset_at) = outcome.usage.reset_at {
        md.push_str(&format!("- **Resets**: {}\n", reset_at.to_rfc3339()));
    }
    md.push('\n');

    // Text
    if !result.text.is_empty() {
        md.push_str("## Text\n\n");
        md.push_str(&result.text);
        md.push_str("\n\n");
    }

    push_list(&mut md, "Links", &result.links);
    push_list(&mut md, "Images", &result.images);

    md
}

fn push_list(md: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    md.push_str(&format!("## {} ({})\n\n", heading, items.len()));
    for item in items.iter().take(MAX_LISTED) {
        md.push_str(&format!("- {}\n", item));
    }
    if items.len() > MAX_LISTED {
        md.push_str(&format!("\n... and {} more\n", items.len() - MAX_LISTED));
    }
    md.push('\n');
}
