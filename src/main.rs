//! # menu_scrape
//!
//! Scrapes restaurant menus from HTML pages, a JSON ordering API and PDF
//! menus, normalizes every item into a common `{name, description, price}`
//! shape, and writes one JSON file per restaurant.
//!
//! ## Features
//!
//! - One scraper per restaurant (Andy's Adirondack Grille, Diamond Club,
//!   West Avenue Pizzeria, Harvey's Restaurant and Bar)
//! - A shared price/text normalizer: `Cup $4.50 | Bowl $6.50`, add-ons moved
//!   into the description, market price dropped
//! - PDF menus read page by page through a hosted vision model
//! - A `combine` step merging all outputs into a single CSV
//!
//! ## Usage
//!
//! ```sh
//! menu_scrape scrape
//! menu_scrape combine
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetch**: HTML, JSON or PDF bytes with bounded retry ([`fetch`])
//! 2. **Parse**: site-specific traversal into raw entries ([`scrapers`])
//! 3. **Normalize**: name, description and canonical price ([`normalize`])
//! 4. **Output**: `output/{site}.json`, optionally merged to CSV ([`outputs`])

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod fetch;
mod models;
mod normalize;
mod outputs;
mod scrapers;
mod utils;
mod vision;

use cli::{Cli, Command};
use config::AppConfig;
use outputs::{csv, json};
use scrapers::{ScrapeContext, Source};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    // Parse CLI
    let args = Cli::parse();
    debug!(config = %args.config.display(), output_dir = %args.output_dir.display(), "Parsed CLI arguments");

    match args.command {
        Command::Scrape { sources } => {
            info!("menu_scrape starting up");
            let config =
                AppConfig::load_or_default(&args.config).with_api_key_override(args.gemini_api_key);

            // Early check: fail before any network work if output is unwritable
            if let Err(e) = ensure_writable_dir(&args.output_dir).await {
                error!(
                    path = %args.output_dir.display(),
                    error = %e,
                    "Output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }

            let sources = if sources.is_empty() {
                Source::ALL.to_vec()
            } else {
                sources
            };
            let ctx = ScrapeContext::new(config)?;
            run_scrapers(&ctx, &sources, &args.output_dir).await;
        }
        Command::List => {
            for source in Source::ALL {
                let restaurant = source.restaurant();
                println!(
                    "{:<16} {:<30} {:<10} {}",
                    source.id(),
                    restaurant.name,
                    source.method(),
                    restaurant.url
                );
            }
            return Ok(());
        }
        Command::Combine { csv: csv_path } => {
            let stats = csv::combine_outputs(&args.output_dir, &csv_path).await?;
            for (restaurant, count) in &stats.by_restaurant {
                info!(restaurant = %restaurant, count, "Items per restaurant");
            }
        }
        Command::Normalize(normalize_args) => {
            let profile = normalize_args.profile();
            let normalized =
                normalize::normalize_entry(&normalize_args.text, &normalize_args.section, &profile);
            println!("{}", serde_json::to_string_pretty(&normalized)?);
            return Ok(());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Scrape `sources` one after another. A failing source is logged and still
/// gets an (empty) output file so stale results never linger.
#[instrument(level = "info", skip_all, fields(count = sources.len()))]
async fn run_scrapers(ctx: &ScrapeContext, sources: &[Source], output_dir: &std::path::Path) {
    let mut total = 0usize;
    let mut failed = Vec::new();

    for source in sources {
        let items = match source.scrape(ctx).await {
            Ok(items) => items,
            Err(e) => {
                error!(source = %source.id(), error = %e, "Scrape failed; writing empty output");
                failed.push(source.id());
                Vec::new()
            }
        };
        if items.is_empty() {
            warn!(source = %source.id(), "No menu items found");
        }
        total += items.len();

        if let Err(e) = json::write_items(&items, output_dir, source.restaurant().url).await {
            error!(source = %source.id(), error = %e, "Failed to write JSON");
        }
    }

    info!(
        sources = sources.len(),
        items = total,
        failed = failed.len(),
        failed_sources = ?failed,
        "Completed scraping"
    );
}
