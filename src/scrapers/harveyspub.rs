//! Harvey's Restaurant and Bar menu scraper.
//!
//! The site only renders its menu PDF on a canvas, so the PDF is downloaded
//! directly and read page by page by the vision model.

use std::error::Error;
use tokio::fs;
use tracing::{info, instrument, warn};

use super::ScrapeContext;
use crate::models::{MenuItem, RawMenuItem, Restaurant};
use crate::normalize::{SourceProfile, normalize_item};
use crate::vision::{MENU_PROMPT, extract_menu_from_pdf};

pub const RESTAURANT: Restaurant = Restaurant {
    name: "Harvey's Restaurant and Bar",
    url: "https://harveyspub.com/",
};

const PDF_URL: &str = "https://harveyspub.com/wp-content/uploads/2025/12/Harveys-Menu-Fall-Winter-25-1.pdf";
const MENU_NAME: &str = "Menu";

pub fn profile() -> SourceProfile {
    SourceProfile::default()
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> Result<Vec<MenuItem>, Box<dyn Error>> {
    let Some(vision) = ctx.vision.as_ref() else {
        warn!("Skipping Harvey's: no vision-model API key configured");
        return Ok(Vec::new());
    };

    let pdf = ctx.http.get_bytes(PDF_URL).await?;
    let pdf_path = std::env::temp_dir().join(format!("harveyspub_menu_{}.pdf", std::process::id()));
    fs::write(&pdf_path, &pdf).await?;
    info!(bytes = pdf.len(), path = %pdf_path.display(), "Downloaded menu PDF");

    let raw = extract_menu_from_pdf(vision, &pdf_path, MENU_PROMPT, ctx.config.pdf_dpi).await;
    let _ = fs::remove_file(&pdf_path).await;

    let items = items_from_raw(raw?, &profile());
    info!(count = items.len(), "Parsed Harvey's menu");
    Ok(items)
}

/// Normalize vision-model records. Records without a section fall under
/// the default menu name.
pub fn items_from_raw(raw: Vec<RawMenuItem>, profile: &SourceProfile) -> Vec<MenuItem> {
    raw.into_iter()
        .filter_map(|record| {
            let section = record
                .menu_type
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(MENU_NAME)
                .to_string();
            let normalized = normalize_item(
                &record.name,
                record.description.as_deref().unwrap_or(""),
                &record.price_text(),
                &section,
                profile,
            );
            if normalized.name.is_empty() {
                return None;
            }
            Some(MenuItem::new(&RESTAURANT, &section, normalized).with_menu_name(MENU_NAME))
        })
        .collect()
}
