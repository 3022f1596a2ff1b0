//! Webscraper main entry point
//!
//! This is the command-line interface for scraping a single page.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use webscraper::config::{load_config_with_hash, Config};
use webscraper::output::{format_markdown, render_error_json, render_outcome_json, write_output};
use webscraper::storage::{open_store, KvStore, MemoryStore};
use webscraper::{check_url, OwnerType, ScrapeInput, Scraper};

/// Output format for a scraped page
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Markdown,
}

/// Webscraper: a polite single-page content extractor
///
/// Fetches one URL after checking it against the SSRF blocklist and the
/// site's robots.txt, and prints the extracted title, text, metadata, links
/// and images. Usage is counted against a per-owner daily quota.
#[derive(Parser, Debug)]
#[command(name = "webscraper")]
#[command(version = "1.0.0")]
#[command(about = "A polite single-page content extractor", long_about = None)]
struct Cli {
    /// URL to scrape
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Kind of owner the scrape is counted against
    #[arg(long, default_value = "guest")]
    owner_type: OwnerType,

    /// Owner identifier used in the quota key
    #[arg(long, default_value = "local")]
    owner_id: String,

    /// SQLite database holding quota records (in-memory when omitted)
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Only validate the URL and exit
    #[arg(long)]
    check: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;

    if cli.check {
        return Ok(handle_check(&cli, &config));
    }

    let store: Box<dyn KvStore> = match &cli.store {
        Some(path) => {
            tracing::info!("Using quota store: {}", path.display());
            let store = open_store(path)
                .with_context(|| format!("failed to open store {}", path.display()))?;
            match store.purge_expired() {
                Ok(0) => {}
                Ok(removed) => tracing::debug!("Purged {} expired quota records", removed),
                Err(e) => tracing::warn!("Failed to purge expired quota records: {}", e),
            }
            Box::new(store)
        }
        None => {
            tracing::debug!("No --store given, quota is tracked in memory");
            Box::new(MemoryStore::new())
        }
    };

    handle_scrape(&cli, config, store).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("webscraper=info,warn"),
            1 => EnvFilter::new("webscraper=debug,info"),
            2 => EnvFilter::new("webscraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none was given
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let Some(path) = &cli.config else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the --check mode: validates the URL without fetching anything
fn handle_check(cli: &Cli, config: &Config) -> ExitCode {
    let validation = check_url(&cli.url, &config.validation);
    match validation.reason {
        None => {
            println!("✓ {} is a valid scrape target", cli.url.trim());
            ExitCode::SUCCESS
        }
        Some(reason) => {
            println!("✗ {}", reason);
            ExitCode::FAILURE
        }
    }
}

/// Handles the main scrape operation
async fn handle_scrape(
    cli: &Cli,
    config: Config,
    store: Box<dyn KvStore>,
) -> anyhow::Result<ExitCode> {
    let scraper = Scraper::new(config, store).context("failed to build HTTP client")?;

    // Ctrl-C cancels the in-flight request
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling scrape");
            signal_token.cancel();
        }
    });

    let input = ScrapeInput::new(cli.url.clone());
    let result = scraper
        .scrape_with_cancellation(&input, cli.owner_type, &cli.owner_id, &cancel)
        .await;

    match result {
        Ok(outcome) => {
            let rendered = match cli.format {
                Format::Json => render_outcome_json(&outcome)?,
                Format::Markdown => format_markdown(&outcome),
            };
            emit(cli, &rendered)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            match cli.format {
                Format::Json => emit(cli, &render_error_json(&e)?)?,
                Format::Markdown => eprintln!("error[{}]: {}", e.code(), e),
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn emit(cli: &Cli, rendered: &str) -> anyhow::Result<()> {
    match &cli.output {
        Some(path) => {
            write_output(rendered, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Output written to: {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
