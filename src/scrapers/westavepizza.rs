//! West Avenue Pizzeria menu scraper.
//!
//! The ordering widget serves the whole menu as one JSON document:
//! main categories, their categories, and items with either a single
//! `item_Price` or a `multiplePrice` list of named sizes. Item
//! `modifiers` are add-ons.

use serde::Deserialize;
use std::error::Error;
use tracing::{info, instrument, warn};

use super::ScrapeContext;
use crate::models::{MenuItem, Restaurant};
use crate::normalize::addons::{ADDONS_MARKER, AddOn};
use crate::normalize::price::{LabeledPrice, assemble};
use crate::normalize::{Normalized, SourceProfile};
use crate::utils::collapse_whitespace;

pub const RESTAURANT: Restaurant = Restaurant {
    name: "West Avenue Pizzeria",
    url: "https://www.westavepizza.com/",
};

const MENU_JSON_URL: &str = "https://appkudos.blob.core.windows.net/menu-widget/348.json";
const DEFAULT_MENU: &str = "Menu";

#[derive(Debug, Deserialize)]
pub struct MenuFeed {
    pub menu: Option<FeedMenu>,
}

#[derive(Debug, Deserialize)]
pub struct FeedMenu {
    #[serde(rename = "main_Categories")]
    pub main_categories: Option<Vec<MainCategory>>,
}

#[derive(Debug, Deserialize)]
pub struct MainCategory {
    #[serde(rename = "main_Category_Name")]
    pub name: Option<String>,
    pub categories: Option<Vec<Category>>,
}

#[derive(Debug, Deserialize)]
pub struct Category {
    #[serde(rename = "category_Name")]
    pub name: Option<String>,
    pub items: Option<Vec<FeedItem>>,
}

#[derive(Debug, Deserialize)]
pub struct FeedItem {
    #[serde(rename = "item_Name")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "isMultiplePricing", default)]
    pub is_multiple_pricing: bool,
    #[serde(rename = "item_Price")]
    pub price: Option<f64>,
    #[serde(rename = "multiplePrice")]
    pub multiple_price: Option<Vec<PriceOption>>,
    pub modifiers: Option<Vec<Modifier>>,
}

#[derive(Debug, Deserialize)]
pub struct PriceOption {
    pub name: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Modifier {
    pub name: Option<String>,
    pub price: Option<f64>,
}

pub fn profile() -> SourceProfile {
    SourceProfile::default()
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> Result<Vec<MenuItem>, Box<dyn Error>> {
    let feed: MenuFeed = ctx.http.get_json(MENU_JSON_URL).await?;
    let items = items_from_feed(&feed, &profile());
    info!(count = items.len(), source = MENU_JSON_URL, "Parsed West Avenue menu");
    Ok(items)
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

fn amount(value: f64) -> String {
    format!("{:.2}", value)
}

fn item_price(item: &FeedItem, profile: &SourceProfile) -> String {
    let prices: Vec<LabeledPrice> = match (&item.multiple_price, item.price) {
        (Some(options), _) if item.is_multiple_pricing && !options.is_empty() => options
            .iter()
            .filter_map(|option| {
                let value = option.price.filter(|p| *p > 0.0)?;
                Some(LabeledPrice {
                    label: non_empty(&option.name),
                    amount: amount(value),
                })
            })
            .collect(),
        (_, Some(value)) if value > 0.0 => vec![LabeledPrice {
            label: None,
            amount: amount(value),
        }],
        _ => Vec::new(),
    };
    assemble(&prices, profile)
}

/// `Add-ons: Extra Cheese +$1.50, Well Done`: unpriced modifiers are listed
/// by name.
fn render_modifiers(modifiers: &[Modifier]) -> Option<String> {
    let parts: Vec<String> = modifiers
        .iter()
        .filter_map(|modifier| {
            let name = non_empty(&modifier.name)?;
            Some(match modifier.price.filter(|p| *p > 0.0) {
                Some(value) => AddOn {
                    name,
                    amount: amount(value),
                }
                .render(),
                None => name,
            })
        })
        .collect();
    (!parts.is_empty()).then(|| format!("{} {}", ADDONS_MARKER, parts.join(", ")))
}

/// Flatten the feed into items, one section per category.
pub fn items_from_feed(feed: &MenuFeed, profile: &SourceProfile) -> Vec<MenuItem> {
    let Some(main_categories) = feed.menu.as_ref().and_then(|m| m.main_categories.as_ref()) else {
        warn!("Menu feed has no categories");
        return Vec::new();
    };

    let mut items = Vec::new();
    for main in main_categories {
        let menu_name = non_empty(&main.name).unwrap_or_else(|| DEFAULT_MENU.to_string());
        for category in main.categories.iter().flatten() {
            let section = non_empty(&category.name).unwrap_or_else(|| menu_name.clone());
            for item in category.items.iter().flatten() {
                let Some(name) = non_empty(&item.name) else {
                    continue;
                };
                let description = non_empty(&item.description);
                let addons = item.modifiers.as_deref().and_then(render_modifiers);
                let description = match (description, addons) {
                    (Some(d), Some(a)) => format!("{} | {}", d, a),
                    (Some(d), None) => d,
                    (None, Some(a)) => a,
                    (None, None) => String::new(),
                };

                let normalized = Normalized {
                    name: profile.name_case.apply(&name),
                    description,
                    price: item_price(item, profile),
                };
                items.push(MenuItem::new(&RESTAURANT, &menu_name, normalized).with_section(&section));
            }
        }
    }
    items
}
