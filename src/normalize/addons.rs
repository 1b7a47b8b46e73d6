//! Add-on clauses ("Add Bacon +3", "add chicken $6") pulled out of item text.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

pub const ADDONS_MARKER: &str = "Add-ons:";

/// Longest add-on name accepted when its amount has neither `+` nor `$`.
const MAX_BARE_ADDON_WORDS: usize = 3;

static ADD_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\+?\s*\badd\b\s*:?\s+(?P<name>[a-z][^$+|;\d.!?]*?)\s*[:\-–]?\s*(?P<plus>\+)?\s*(?P<dollar>\$+)?\s?(?P<amount>\d+(?:\.\d{1,2})?)\b",
    )
    .expect("valid add-on regex")
});

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\badd[\s-]?ons?\s*:").expect("valid marker regex"));

static LISTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<name>[^,;|/+]+?)\s*\(?\+\s*\$*\s?(?P<amount>\d+(?:\.\d{1,2})?)\)?")
        .expect("valid listed add-on regex")
});

/// An optional priced modifier to a base item.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOn {
    pub name: String,
    pub amount: String,
}

impl AddOn {
    pub fn render(&self) -> String {
        format!("{} +${}", self.name, self.amount)
    }
}

/// `Add-ons: Bacon +$3, Egg +$2`
pub fn render_addons(addons: &[AddOn]) -> String {
    format!(
        "{} {}",
        ADDONS_MARKER,
        addons.iter().map(AddOn::render).collect::<Vec<_>>().join(", ")
    )
}

fn clean_name(name: &str) -> String {
    name.trim()
        .trim_end_matches(|c: char| c == ',' || c == '.' || c == ':' || c == '-')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split add-ons out of `text`. Returns the remaining text and the add-ons
/// in order of appearance. An existing `Add-ons:` list is read back so the
/// operation is idempotent.
pub fn extract_addons(text: &str) -> (String, Vec<AddOn>) {
    let mut addons = Vec::new();

    let (body, listed) = match MARKER.find(text) {
        Some(m) => (&text[..m.start()], Some(&text[m.end()..])),
        None => (text, None),
    };

    let mut remaining = String::with_capacity(body.len());
    let mut last = 0;
    for caps in ADD_CLAUSE.captures_iter(body) {
        let (Some(whole), Some(name), Some(amount)) =
            (caps.get(0), caps.name("name"), caps.name("amount"))
        else {
            continue;
        };
        let name = clean_name(name.as_str());
        if name.is_empty() {
            continue;
        }
        // "add dressing on the side 9": a bare number after a long or
        // comma-listed phrase is the item's own price.
        let marked = caps.name("plus").is_some() || caps.name("dollar").is_some();
        if !marked
            && (name.contains(',') || name.split_whitespace().count() > MAX_BARE_ADDON_WORDS)
        {
            continue;
        }
        remaining.push_str(&body[last..whole.start()]);
        remaining.push(' ');
        last = whole.end();
        addons.push(AddOn {
            name,
            amount: amount.as_str().to_string(),
        });
    }
    remaining.push_str(&body[last..]);

    if let Some(listed) = listed {
        for caps in LISTED.captures_iter(listed) {
            let (Some(name), Some(amount)) = (caps.name("name"), caps.name("amount")) else {
                continue;
            };
            let name = clean_name(name.as_str());
            if !name.is_empty() {
                addons.push(AddOn {
                    name,
                    amount: amount.as_str().to_string(),
                });
            }
        }
    }

    let addons: Vec<AddOn> = addons
        .into_iter()
        .unique_by(|a| (a.name.to_lowercase(), a.amount.clone()))
        .collect();

    (remaining, addons)
}
