//! Data models for scraped menu entries.
//!
//! - [`Restaurant`]: provenance constants owned by each scraper
//! - [`MenuItem`]: one normalized entry, the record written to `output/`
//! - [`RawMenuItem`]: the loosely-typed record a vision model answers with

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::Normalized;

/// Who a menu belongs to. Constant per scraper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restaurant {
    pub name: &'static str,
    pub url: &'static str,
}

/// A single sellable entry (dish, drink, product).
///
/// `price` is a canonical price string rather than a number: one item can
/// carry several simultaneous prices (`Cup $4.50 | Bowl $6.50`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    pub price: String,
    /// The category the item was grouped under on the source page.
    pub menu_type: String,
    /// Finer-grained heading, for sources that have both a menu and sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_name: Option<String>,
    pub restaurant_name: String,
    pub restaurant_url: String,
}

impl MenuItem {
    pub fn new(restaurant: &Restaurant, menu_type: &str, normalized: Normalized) -> Self {
        Self {
            name: normalized.name,
            description: normalized.description,
            price: normalized.price,
            menu_type: menu_type.to_string(),
            section: None,
            menu_name: None,
            restaurant_name: restaurant.name.to_string(),
            restaurant_url: restaurant.url.to_string(),
        }
    }

    pub fn with_section(mut self, section: &str) -> Self {
        self.section = Some(section.to_string());
        self
    }

    pub fn with_menu_name(mut self, menu_name: &str) -> Self {
        self.menu_name = Some(menu_name.to_string());
        self
    }

    /// The heading used for identity: `section` when present, else `menu_type`.
    pub fn grouping(&self) -> &str {
        self.section.as_deref().unwrap_or(&self.menu_type)
    }
}

/// Keep the first item per `(name, price, section)`.
///
/// The same dish may legitimately appear under two sections or with two
/// prices, so name alone is not an identity.
pub fn dedupe_items(items: Vec<MenuItem>) -> Vec<MenuItem> {
    items
        .into_iter()
        .unique_by(|item| {
            (
                item.name.to_lowercase(),
                item.price.clone(),
                item.grouping().to_lowercase(),
            )
        })
        .collect()
}

/// A menu record as returned by the vision model, before normalization.
///
/// Models are inconsistent about types, so `price` may be a string or a
/// bare number and the heading may be called `section` instead of
/// `menu_type`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMenuItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default, alias = "section")]
    pub menu_type: Option<String>,
}

impl RawMenuItem {
    pub fn price_text(&self) -> String {
        match &self.price {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DINER: Restaurant = Restaurant {
        name: "Test Diner",
        url: "https://testdiner.com/",
    };

    fn item(name: &str, price: &str, menu_type: &str) -> MenuItem {
        MenuItem::new(
            &DINER,
            menu_type,
            Normalized {
                name: name.into(),
                description: String::new(),
                price: price.into(),
            },
        )
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let json = serde_json::to_value(item("Nachos", "$12", "Starters")).unwrap();
        assert!(json.get("section").is_none());
        assert!(json.get("menu_name").is_none());
        assert_eq!(json["restaurant_name"], "Test Diner");

        let json =
            serde_json::to_value(item("Nachos", "$12", "Main Menu").with_section("Starters"))
                .unwrap();
        assert_eq!(json["section"], "Starters");
    }

    #[test]
    fn test_dedupe_keeps_variants() {
        let items = vec![
            item("Chicken Tenders", "$9", "APPETIZERS"),
            item("Chicken Tenders", "$9", "APPETIZERS"),
            item("Chicken Tenders", "$7", "KIDS CORNER"),
            item("Chicken Tenders", "$11", "APPETIZERS"),
        ];
        let deduped = dedupe_items(items);
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[1].menu_type, "KIDS CORNER");
    }

    #[test]
    fn test_dedupe_uses_section_over_menu_type() {
        let items = vec![
            item("House Salad", "$8", "Main Menu").with_section("Soup & Salad"),
            item("House Salad", "$8", "Main Menu").with_section("Kids Menu"),
        ];
        assert_eq!(dedupe_items(items).len(), 2);
    }

    #[test]
    fn test_raw_item_price_variants() {
        let raw: RawMenuItem =
            serde_json::from_str(r#"{"name": "Steak", "price": 25, "section": "MAINS"}"#).unwrap();
        assert_eq!(raw.price_text(), "25");
        assert_eq!(raw.menu_type.as_deref(), Some("MAINS"));

        let raw: RawMenuItem = serde_json::from_str(r#"{"name": "Steak", "price": " $25 "}"#).unwrap();
        assert_eq!(raw.price_text(), "$25");

        let raw: RawMenuItem = serde_json::from_str(r#"{"name": "Soup", "price": null}"#).unwrap();
        assert_eq!(raw.price_text(), "");
    }
}
