//! Price token scanning and canonical price assembly.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::labels::positional_labels;
use super::profile::{LabelStyle, SourceProfile};

static CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$+\s?)?(\d+(?:\.\d{1,2})?)").expect("valid price regex"));

static COMMA_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+),(\d{2})\b").expect("valid comma regex"));

static MARKET_PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bmarket\s+price\b|\bm\.\s?p\b\.?|\bmp\b").expect("valid market regex")
});

/// `1/2`, `3/4`, `11:30`: never prices.
static FRACTION_OR_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d/\d\b|\b\d{1,2}:\d{2}\b").expect("valid fraction regex")
});

/// Words that turn a preceding number into a quantity.
static QUANTITY_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s?(?:oz|ounces?|pcs?|pieces?|ct|count|lbs?|pounds?|g|ml|cal|calories|inch(?:es)?|in\.|wings|minutes?|mins?|years?|yrs?)\b",
    )
    .expect("valid unit regex")
});

/// One numeric amount found in free text.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceToken {
    pub start: usize,
    pub end: usize,
    /// The amount as written, without `$`; single-digit cents padded.
    pub amount: String,
    pub had_dollar: bool,
    pub has_cents: bool,
}

impl PriceToken {
    pub fn value(&self) -> f64 {
        self.amount.parse().unwrap_or(0.0)
    }
}

/// A price with the size/option label it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPrice {
    pub label: Option<String>,
    pub amount: String,
}

impl LabeledPrice {
    pub fn render(&self, style: LabelStyle) -> String {
        match (&self.label, style) {
            (None, _) => format!("${}", self.amount),
            (Some(label), LabelStyle::Prefix) => format!("{} ${}", label, self.amount),
            (Some(label), LabelStyle::Suffix) => format!("${} ({})", self.amount, label),
        }
    }
}

/// `6,95` → `6.95` so European-style decimals scan as one token.
///
/// Comma lists of sizes (`12,14` or `12,14,16`) are left alone: a pair
/// inside a longer list never converts, and a lone pair only does when
/// the whole part is one digit or the cents end in 0, 5 or 9.
pub fn fix_comma_decimals(text: &str) -> String {
    COMMA_DECIMAL
        .replace_all(text, |caps: &Captures| {
            let (Some(whole), Some(int), Some(cents)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                return String::new();
            };
            let listed_before = text[..whole.start()].ends_with(',');
            let listed_after = text[whole.end()..]
                .strip_prefix(',')
                .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
            let cents_like = int.as_str().len() == 1
                || cents.as_str().ends_with(['0', '5', '9']);

            if listed_before || listed_after || !cents_like {
                whole.as_str().to_string()
            } else {
                format!("{}.{}", int.as_str(), cents.as_str())
            }
        })
        .into_owned()
}

/// True when the text is a market-price marker with no amount in it.
pub fn is_market_price(text: &str) -> bool {
    let marked = MARKET_PRICE.is_match(text) || text.trim().eq_ignore_ascii_case("market");
    marked && !text.chars().any(|c| c.is_ascii_digit())
}

/// True when the text carries a market-price marker anywhere.
pub fn has_market_marker(text: &str) -> bool {
    MARKET_PRICE.is_match(text)
}

/// Remove "MP" / "Market Price" / "M.P." markers.
pub fn strip_market_price(text: &str) -> String {
    MARKET_PRICE.replace_all(text, "").into_owned()
}

fn pad_cents(amount: &str) -> String {
    match amount.split_once('.') {
        Some((whole, cents)) if cents.len() == 1 => format!("{whole}.{cents}0"),
        _ => amount.to_string(),
    }
}

/// Every number in `text` that could be a price. Quantities (`12 oz`,
/// `6"`, `1/2`, `11:30`, `7UP`) are left out; plausibility against a
/// profile's threshold is decided later, once labels are known.
pub fn scan_tokens(text: &str) -> Vec<PriceToken> {
    let bytes = text.as_bytes();
    let excluded: Vec<(usize, usize)> = FRACTION_OR_TIME
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    let mut tokens = Vec::new();

    for caps in CANDIDATE.captures_iter(text) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let (start, end) = (whole.start(), whole.end());

        if excluded.iter().any(|&(s, e)| start < e && s < end) {
            continue;
        }
        if let Some(&prev) = start.checked_sub(1).and_then(|i| bytes.get(i)) {
            if prev.is_ascii_alphanumeric() || prev == b'.' || prev == b'_' {
                continue;
            }
        }

        let rest = &text[end..];
        if let Some(c) = rest.chars().next() {
            if c.is_alphanumeric() || matches!(c, '"' | '”' | '%' | '\'' | '°') {
                continue;
            }
        }
        if QUANTITY_UNIT.is_match(rest) {
            continue;
        }

        let amount = number.as_str();
        tokens.push(PriceToken {
            start,
            end,
            amount: pad_cents(amount),
            had_dollar: caps.get(1).is_some(),
            has_cents: amount.contains('.'),
        });
    }
    tokens
}

/// Whether an unlabeled token is believable as a price for this profile.
pub fn is_plausible(token: &PriceToken, labeled: bool, profile: &SourceProfile) -> bool {
    token.had_dollar || token.has_cents || labeled || token.value() >= profile.min_plausible_price
}

/// Fill unlabeled slots of a multi-price item by position. A slot whose
/// positional label is already used by another price stays unlabeled.
pub fn apply_positional_labels(prices: &mut [LabeledPrice], section: &str, profile: &SourceProfile) {
    if prices.iter().all(|p| p.label.is_some()) {
        return;
    }
    let Some(labels) =
        positional_labels(section, prices.len(), profile.positional_labels.as_deref())
    else {
        return;
    };
    let taken: Vec<String> = prices.iter().filter_map(|p| p.label.clone()).collect();
    for (price, label) in prices.iter_mut().zip(labels) {
        if price.label.is_none() && !taken.contains(&label) {
            price.label = Some(label);
        }
    }
}

/// Join labeled prices into the canonical string.
pub fn assemble(prices: &[LabeledPrice], profile: &SourceProfile) -> String {
    prices
        .iter()
        .map(|p| p.render(profile.label_style))
        .collect::<Vec<_>>()
        .join(profile.separator.as_str())
}
