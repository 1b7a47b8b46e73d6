//! Restaurant menu scrapers.
//!
//! Each submodule knows one restaurant's site and turns it into
//! [`MenuItem`]s through the shared normalizer, tuned by its own
//! [`SourceProfile`](crate::normalize::SourceProfile).
//!
//! # Supported Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | Andy's Adirondack Grille | [`andysadkgrille`] | HTML (`data-aid` attributes) |
//! | Diamond Club Restaurant | [`diamondclub`] | HTML (tabbed sections) |
//! | West Avenue Pizzeria | [`westavepizza`] | JSON menu API |
//! | Harvey's Restaurant and Bar | [`harveyspub`] | PDF + vision model |
//!
//! # Common Patterns
//!
//! Each scraper module exports:
//! - `RESTAURANT`: name and url written into every item
//! - `scrape(ctx)`: fetch and parse, returning `Vec<MenuItem>`
//! - a pure parse function over the fetched document, tested on fixtures
//!
//! A source that cannot be fetched yields an error here; the caller logs it
//! and still writes an (empty) output file.

pub mod andysadkgrille;
pub mod diamondclub;
pub mod harveyspub;
pub mod westavepizza;

use clap::ValueEnum;
use std::error::Error;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::fetch::HttpClient;
use crate::models::{MenuItem, Restaurant, dedupe_items};
use crate::vision::{GeminiVision, RetryVision};

/// Everything a scraper needs, built once per run.
#[derive(Debug)]
pub struct ScrapeContext {
    pub http: HttpClient,
    /// `None` when no API key is configured; vision sources are skipped.
    pub vision: Option<RetryVision<GeminiVision>>,
    pub config: AppConfig,
}

impl ScrapeContext {
    pub fn new(config: AppConfig) -> Result<Self, Box<dyn Error>> {
        let http = HttpClient::new(config.request_timeout(), config.retry_policy())?;
        let vision = config.gemini_api_key.as_ref().map(|key| {
            RetryVision::new(
                GeminiVision::new(http.client().clone(), key.clone(), config.vision_model.clone()),
                http.retry_policy().clone(),
            )
        });
        if vision.is_none() {
            warn!("No vision-model API key; PDF menus will be skipped");
        }
        Ok(Self {
            http,
            vision,
            config,
        })
    }
}

/// Every restaurant this crate can scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    Andysadkgrille,
    Diamondclub,
    Westavepizza,
    Harveyspub,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Andysadkgrille,
        Source::Diamondclub,
        Source::Westavepizza,
        Source::Harveyspub,
    ];

    pub fn restaurant(&self) -> Restaurant {
        match self {
            Source::Andysadkgrille => andysadkgrille::RESTAURANT,
            Source::Diamondclub => diamondclub::RESTAURANT,
            Source::Westavepizza => westavepizza::RESTAURANT,
            Source::Harveyspub => harveyspub::RESTAURANT,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Source::Andysadkgrille | Source::Diamondclub => "html",
            Source::Westavepizza => "json",
            Source::Harveyspub => "pdf+vision",
        }
    }

    /// The identifier accepted on the command line.
    pub fn id(&self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    }

    /// Scrape this source and drop duplicate `(name, price, section)` entries.
    #[instrument(level = "info", skip(self, ctx), fields(source = ?self))]
    pub async fn scrape(&self, ctx: &ScrapeContext) -> Result<Vec<MenuItem>, Box<dyn Error>> {
        let t0 = Instant::now();
        let items = match self {
            Source::Andysadkgrille => andysadkgrille::scrape(ctx).await?,
            Source::Diamondclub => diamondclub::scrape(ctx).await?,
            Source::Westavepizza => westavepizza::scrape(ctx).await?,
            Source::Harveyspub => harveyspub::scrape(ctx).await?,
        };
        let scraped = items.len();
        let items = dedupe_items(items);
        info!(
            scraped,
            unique = items.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Scraped menu"
        );
        Ok(items)
    }
}
