//! Diamond Club Restaurant menu scraper.
//!
//! The menu page has one `div.tab-content` per section with an `<h2>`
//! heading and a list of items. Each `<li>` starts with a `<strong>` holding
//! the name, price and dietary markers (`CAESAR SALAD $12 GF`); the rest of
//! the item is description. Later `<strong>` tags with a bare price belong to
//! an add-on named just before them ("with bacon <strong>$2</strong>").

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument};

use super::ScrapeContext;
use crate::models::{MenuItem, Restaurant};
use crate::normalize::{SourceProfile, normalize_item};
use crate::utils::collapse_whitespace;

pub const RESTAURANT: Restaurant = Restaurant {
    name: "Diamond Club Restaurant",
    url: "https://www.diamondclubrestaurantsaratoga.com/",
};

const MENU_URL: &str = "https://www.diamondclubrestaurantsaratoga.com/menu/";
const MENU_NAME: &str = "Main Menu";

static DIETARY_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:GFV|GF|V)\b").expect("valid dietary regex"));

static DIETARY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\s+(?:GFV|GF|V))+$").expect("valid dietary suffix regex"));

static BARE_PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$\d+(?:\.\d{1,2})?$").expect("valid bare price regex"));

static ADDON_LEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:add|with)\s+([^$]+?)\s*$").expect("valid add-on lead regex"));

/// A protein note under the salads: "Add Grilled Chicken, Salmon, or Steak $9".
static SECTION_ADDON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\badd\s+(?:grilled chicken|chicken|salmon|steak)[^$]*\$\d+(?:\.\d{1,2})?")
        .expect("valid section add-on regex")
});

pub fn profile() -> SourceProfile {
    SourceProfile::default()
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> Result<Vec<MenuItem>, Box<dyn Error>> {
    let html = ctx.http.get_text(MENU_URL).await?;
    let items = parse_menu(&html, &profile())?;
    info!(count = items.len(), source = MENU_URL, "Parsed Diamond Club menu");
    Ok(items)
}

fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of the siblings in front of `element`, in document order.
fn text_before(element: &ElementRef) -> String {
    let mut parts: Vec<String> = element
        .prev_siblings()
        .filter_map(|node| match node.value().as_text() {
            Some(text) => Some(text.to_string()),
            None => ElementRef::wrap(node).map(|el| element_text(&el)),
        })
        .collect();
    parts.reverse();
    collapse_whitespace(&parts.join(" "))
}

/// Priced add-ons written as a separate `<strong>` price. The phrase is
/// removed from `description` and re-appended as an `Add X +$Y` clause.
fn strong_price_addons(strongs: &[ElementRef], description: &mut String) {
    for strong in strongs {
        let price = element_text(strong);
        if !BARE_PRICE.is_match(&price) {
            continue;
        }
        let lead = text_before(strong);
        let Some(caps) = ADDON_LEAD.captures(&lead) else {
            continue;
        };
        let (Some(phrase), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let written = format!("{} {}", phrase.as_str(), price);
        *description = description.replacen(&written, "", 1);
        description.push_str(&format!(" Add {} +{}", name.as_str().trim(), price));
    }
}

fn parse_item(
    li: &ElementRef,
    strong: &Selector,
    section: &str,
    section_addon: Option<&str>,
    profile: &SourceProfile,
) -> Option<MenuItem> {
    let strongs: Vec<ElementRef> = li.select(strong).collect();
    let (head, rest) = strongs.split_first()?;
    let name_text = element_text(head);
    let full_text = element_text(li);

    let mut description = full_text.replacen(&name_text, "", 1);
    strong_price_addons(rest, &mut description);
    let mut description = DIETARY_IN_TEXT.replace_all(&description, "").into_owned();

    if let Some(addon) = section_addon {
        if section.to_lowercase().contains("salad") && name_text.to_uppercase().contains("SALAD") {
            description.push(' ');
            description.push_str(addon);
        }
    }

    let mut normalized = normalize_item(&name_text, &description, "", section, profile);
    normalized.name = DIETARY_SUFFIX.replace(&normalized.name, "").into_owned();
    if normalized.name.is_empty() || normalized.price.is_empty() {
        return None;
    }

    Some(
        MenuItem::new(&RESTAURANT, MENU_NAME, normalized)
            .with_section(section)
            .with_menu_name(MENU_NAME),
    )
}

/// Parse every tab section of the menu page.
pub fn parse_menu(html: &str, profile: &SourceProfile) -> Result<Vec<MenuItem>, Box<dyn Error>> {
    let document = Html::parse_document(html);
    let tab_selector = Selector::parse("div.tab-content")?;
    let heading_selector = Selector::parse("h2")?;
    let note_selector = Selector::parse("p")?;
    let li_selector = Selector::parse("li")?;
    let strong_selector = Selector::parse("strong")?;

    let mut items = Vec::new();
    for tab in document.select(&tab_selector) {
        let Some(heading) = tab.select(&heading_selector).next() else {
            continue;
        };
        let section = element_text(&heading);

        let section_addon = tab
            .select(&note_selector)
            .map(|p| element_text(&p))
            .find_map(|note| SECTION_ADDON.find(&note).map(|m| m.as_str().to_string()));

        let before = items.len();
        items.extend(tab.select(&li_selector).filter_map(|li| {
            parse_item(
                &li,
                &strong_selector,
                &section,
                section_addon.as_deref(),
                profile,
            )
        }));
        debug!(section = %section, count = items.len() - before, "Extracted section items");
    }
    Ok(items)
}
