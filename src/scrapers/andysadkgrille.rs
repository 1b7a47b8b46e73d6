//! Andy's Adirondack Grille menu scraper.
//!
//! The menu page is a website-builder layout where every piece of text
//! carries a `data-aid` attribute:
//!
//! ```text
//! MENU_SECTION_TITLE_{s}          section heading
//! MENU_SECTION_DESCRIPTION_{s}    section blurb, sometimes a priced item
//! MENU_SECTION{s}_ITEM{i}_TITLE   item name
//! MENU_SECTION{s}_ITEM{i}_DESC    item description
//! MENU_SECTION{s}_ITEM{i}_PRICE   item price ("18.95/21.95", "cup-5,95, bowl-6,95")
//! ```
//!
//! Beverages are a single item whose description lists every drink with
//! its prices; it is split into one item per drink.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::error::Error;
use tracing::{debug, info, instrument};

use super::ScrapeContext;
use crate::models::{MenuItem, Restaurant};
use crate::normalize::price::scan_tokens;
use crate::normalize::{
    LabelStyle, NameCase, Normalized, SourceProfile, normalize_entry, normalize_item,
};
use crate::utils::collapse_whitespace;

pub const RESTAURANT: Restaurant = Restaurant {
    name: "Andy's Adirondack Grille",
    url: "https://andysadkgrille.com/",
};

const MENU_URL: &str = "https://andysadkgrille.com/menu";
const MAX_ITEMS_PER_SECTION: usize = 100;
const BEVERAGES: &str = "BEVERAGES";

static SECTION_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^MENU_SECTION_TITLE_(\d+)$").expect("valid section regex"));

static TRAILING_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:[.,]\d{1,2})?\s*$").expect("valid amount regex"));

static SERVED_WITH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+served with\s+").expect("valid served-with regex"));

static GLUED_ADD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9.,)])ADD\b").expect("valid add regex"));

/// Upper-case names, `$5.95 (Cup)` labels, and two unlabeled prices are
/// always Medium then Large.
pub fn profile() -> SourceProfile {
    SourceProfile::default()
        .with_name_case(NameCase::Upper)
        .with_label_style(LabelStyle::Suffix)
        .with_positional_labels(&["Medium", "Large"])
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> Result<Vec<MenuItem>, Box<dyn Error>> {
    let html = ctx.http.get_text(MENU_URL).await?;
    let items = parse_menu(&html, &profile())?;
    info!(count = items.len(), source = MENU_URL, "Parsed Andy's menu");
    Ok(items)
}

fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Long headings carry the size legend ("GOURMET PIZZA Medium-12 ..."); keep
/// the first two words of those.
fn clean_section_name(raw: &str) -> String {
    let name = collapse_whitespace(raw);
    let name = if name.len() > 50 {
        name.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
    } else {
        name
    };
    let upper = name.to_uppercase();
    if upper.contains("GOURMET PIZZA") {
        "GOURMET PIZZA".to_string()
    } else {
        upper
    }
}

/// Instructions and add-on rows share the item markup; skip them.
fn is_menu_item_name(name: &str) -> bool {
    let upper = name.to_uppercase();
    let lead: String = name.to_lowercase().chars().take(20).collect();
    let len = name.chars().count();
    len > 2
        && len < 100
        && !upper.starts_with("ADD ")
        && !upper.starts_with("ALL ")
        && !lead.contains("served with")
        && upper != "WHITE CRUST"
}

/// A section blurb that ends in an amount is itself an item:
/// `Steamed Clams-Little Necks served with drawn butter 14.95`.
fn section_description_item(
    text: &str,
    section: &str,
    profile: &SourceProfile,
) -> Option<MenuItem> {
    if !TRAILING_AMOUNT.is_match(text) {
        return None;
    }
    let normalized = match SERVED_WITH.find(text) {
        Some(m) => normalize_item(
            &text[..m.start()],
            &format!("Served with {}", &text[m.end()..]),
            "",
            section,
            profile,
        ),
        None => normalize_entry(text, section, profile),
    };
    if normalized.name.is_empty() || normalized.price.is_empty() {
        return None;
    }
    Some(MenuItem::new(&RESTAURANT, section, normalized))
}

fn is_joiner(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | ',' | '-' | '|' | '&')
}

/// Cut a run-on price list into one string per drink. A new entry starts
/// after a price whenever the text up to the next price is more than a
/// size label.
fn split_priced_entries(text: &str, profile: &SourceProfile) -> Vec<String> {
    let vocabulary = &profile.vocabulary;
    let tokens = scan_tokens(text);
    let joins = |gap: &str| {
        gap.chars().all(is_joiner)
            || vocabulary
                .label_before(gap)
                .is_some_and(|found| gap[..found.start].chars().all(is_joiner))
    };

    let mut entries = Vec::new();
    let mut entry_start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.start < entry_start {
            continue;
        }
        let end = token.end
            + vocabulary
                .label_after(&text[token.end..])
                .map(|(consumed, _)| consumed)
                .unwrap_or(0);
        let continues = tokens
            .get(i + 1)
            .is_some_and(|next| next.start >= end && joins(&text[end..next.start]));
        if !continues {
            entries.push(drop_unpriced_list(&text[entry_start..end]).trim().to_string());
            entry_start = end;
        }
    }
    entries
}

/// "Pepsi, Diet Pepsi, Ginger Ale, Tropicana Lemonade GLASS $3.50": the
/// unpriced sodas in front belong to no price.
fn drop_unpriced_list(entry: &str) -> &str {
    let head_end = scan_tokens(entry)
        .first()
        .map(|t| t.start)
        .unwrap_or(entry.len());
    match entry[..head_end].rfind(',') {
        Some(comma) => &entry[comma + 1..],
        None => entry,
    }
}

/// One item per drink in the beverage blurb. "Coffee / Tea / Hot Chocolate
/// $1.99" becomes three items sharing the price.
pub fn split_beverages(text: &str, profile: &SourceProfile) -> Vec<MenuItem> {
    let text = collapse_whitespace(text);
    split_priced_entries(&text, profile)
        .into_iter()
        .flat_map(|entry| {
            let normalized = normalize_entry(&entry, BEVERAGES, profile);
            if normalized.name.is_empty() || normalized.price.is_empty() {
                return Vec::new();
            }
            normalized
                .name
                .split('/')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| {
                    MenuItem::new(
                        &RESTAURANT,
                        BEVERAGES,
                        Normalized {
                            name: name.to_string(),
                            ..normalized.clone()
                        },
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Parse the menu page into items, in page order.
pub fn parse_menu(html: &str, profile: &SourceProfile) -> Result<Vec<MenuItem>, Box<dyn Error>> {
    let document = Html::parse_document(html);
    let tagged = Selector::parse("[data-aid]")?;

    let mut by_aid: HashMap<String, String> = HashMap::new();
    let mut sections: Vec<(String, String)> = Vec::new();
    for element in document.select(&tagged) {
        let Some(aid) = element.value().attr("data-aid") else {
            continue;
        };
        if !aid.starts_with("MENU_SECTION") {
            continue;
        }
        let text = element_text(&element);
        if let Some(number) = SECTION_TITLE.captures(aid).and_then(|c| c.get(1)) {
            sections.push((number.as_str().to_string(), text.clone()));
        }
        by_aid.entry(aid.to_string()).or_insert(text);
    }
    debug!(sections = sections.len(), "Found menu sections");

    let mut items = Vec::new();
    for (number, title) in &sections {
        if title.is_empty() {
            continue;
        }
        let section = clean_section_name(title);
        let before = items.len();

        if let Some(blurb) = by_aid.get(&format!("MENU_SECTION_DESCRIPTION_{number}")) {
            items.extend(section_description_item(blurb, &section, profile));
        }

        for i in 0..MAX_ITEMS_PER_SECTION {
            let key = |part: &str| format!("MENU_SECTION{number}_ITEM{i}_{part}");
            let Some(name) = by_aid.get(&key("TITLE")) else {
                break;
            };
            if !is_menu_item_name(name) {
                continue;
            }
            let description = by_aid
                .get(&key("DESC"))
                .map(|d| GLUED_ADD.replace_all(d, "$1 ADD").into_owned())
                .unwrap_or_default();
            let price_text = by_aid.get(&key("PRICE")).map(String::as_str).unwrap_or("");

            if section == BEVERAGES && name.eq_ignore_ascii_case(BEVERAGES) && !description.is_empty()
            {
                items.extend(split_beverages(&description, profile));
                continue;
            }

            let normalized = normalize_item(name, &description, price_text, &section, profile);
            items.push(MenuItem::new(&RESTAURANT, &section, normalized));
        }

        debug!(section = %section, count = items.len() - before, "Extracted section items");
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEVERAGE_BLURB: &str = "Pepsi, Diet Pepsi, Starry, Mug Root Beer, Ginger Ale, \
        Tropicana Lemonade GLASS $3.50/ Pitcher $7.95 Saranac Root Beer $3.75 /bottle \
        Milk &amp; Juice  Small $1.50 / Large $2.50 Iced Tea  $2.50 \
        Coffee / Tea / Hot Chocolate $1.99";

    fn fixture() -> String {
        format!(
            r#"<html><body>
            <h3 data-aid="MENU_SECTION_TITLE_0">Appetizers</h3>
            <p data-aid="MENU_SECTION_DESCRIPTION_0">Steamed Clams-Little Necks served with drawn butter 14.95</p>
            <h4 data-aid="MENU_SECTION0_ITEM0_TITLE">Chicken Tenders</h4>
            <p data-aid="MENU_SECTION0_ITEM0_DESC">Honey mustard on the side.ADD fries 3</p>
            <span data-aid="MENU_SECTION0_ITEM0_PRICE">11.95</span>
            <h4 data-aid="MENU_SECTION0_ITEM1_TITLE">Add Cheese</h4>
            <span data-aid="MENU_SECTION0_ITEM1_PRICE">1.50</span>
            <h4 data-aid="MENU_SECTION0_ITEM2_TITLE">Soup of the Day</h4>
            <span data-aid="MENU_SECTION0_ITEM2_PRICE">cup-5,95, bowl-6,95</span>
            <h4 data-aid="MENU_SECTION0_ITEM3_TITLE">Broiled Scallops</h4>
            <span data-aid="MENU_SECTION0_ITEM3_PRICE">Market Price</span>
            <h3 data-aid="MENU_SECTION_TITLE_1">GOURMET PIZZA Medium-12 inch Large-16 inch, all hand tossed daily</h3>
            <p data-aid="MENU_SECTION_DESCRIPTION_1">White or wheat crust available</p>
            <h4 data-aid="MENU_SECTION1_ITEM0_TITLE">Margherita</h4>
            <p data-aid="MENU_SECTION1_ITEM0_DESC">fresh mozzarella, basil</p>
            <span data-aid="MENU_SECTION1_ITEM0_PRICE">18.95/21.95</span>
            <h3 data-aid="MENU_SECTION_TITLE_2">Beverages</h3>
            <h4 data-aid="MENU_SECTION2_ITEM0_TITLE">Beverages</h4>
            <p data-aid="MENU_SECTION2_ITEM0_DESC">{BEVERAGE_BLURB}</p>
            </body></html>"#
        )
    }

    fn find<'a>(items: &'a [MenuItem], name: &str) -> &'a MenuItem {
        items
            .iter()
            .find(|i| i.name == name)
            .unwrap_or_else(|| panic!("missing {name}"))
    }

    #[test]
    fn test_parse_sections_and_items() {
        let items = parse_menu(&fixture(), &profile()).unwrap();

        let clams = find(&items, "STEAMED CLAMS-LITTLE NECKS");
        assert_eq!(clams.price, "$14.95");
        assert_eq!(clams.description, "Served with drawn butter");
        assert_eq!(clams.menu_type, "APPETIZERS");

        let tenders = find(&items, "CHICKEN TENDERS");
        assert_eq!(tenders.price, "$11.95");
        assert!(tenders.description.contains("Add-ons: fries +$3"));

        assert!(items.iter().all(|i| i.name != "ADD CHEESE"));
        assert_eq!(find(&items, "SOUP OF THE DAY").price, "$5.95 (Cup) | $6.95 (Bowl)");
        assert_eq!(find(&items, "BROILED SCALLOPS").price, "");
    }

    #[test]
    fn test_dual_price_gets_medium_large() {
        let items = parse_menu(&fixture(), &profile()).unwrap();
        let pizza = find(&items, "MARGHERITA");
        assert_eq!(pizza.menu_type, "GOURMET PIZZA");
        assert_eq!(pizza.price, "$18.95 (Medium) | $21.95 (Large)");
    }

    #[test]
    fn test_unpriced_section_blurb_is_not_an_item() {
        let items = parse_menu(&fixture(), &profile()).unwrap();
        assert!(items.iter().all(|i| !i.name.contains("WHEAT")));
    }

    #[test]
    fn test_beverage_blurb_is_split() {
        let items = split_beverages(&BEVERAGE_BLURB.replace("&amp;", "&"), &profile());
        let summary: Vec<(&str, &str)> = items
            .iter()
            .map(|i| (i.name.as_str(), i.price.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("TROPICANA LEMONADE", "$3.50 (Glass) | $7.95 (Pitcher)"),
                ("SARANAC ROOT BEER", "$3.75 (Bottle)"),
                ("MILK & JUICE", "$1.50 (Small) | $2.50 (Large)"),
                ("ICED TEA", "$2.50"),
                ("COFFEE", "$1.99"),
                ("TEA", "$1.99"),
                ("HOT CHOCOLATE", "$1.99"),
            ]
        );
        assert!(items.iter().all(|i| i.menu_type == BEVERAGES));
    }

    #[test]
    fn test_beverages_from_page() {
        let items = parse_menu(&fixture(), &profile()).unwrap();
        assert_eq!(find(&items, "MILK & JUICE").menu_type, BEVERAGES);
        assert!(items.iter().all(|i| i.name != "BEVERAGES"));
    }

    #[test]
    fn test_section_name_cleanup() {
        assert_eq!(clean_section_name("  Kids   Corner "), "KIDS CORNER");
        assert_eq!(
            clean_section_name("Gourmet Pizza Medium-12 inch Large-16 inch all pizzas hand tossed"),
            "GOURMET PIZZA"
        );
    }
}
