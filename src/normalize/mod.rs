//! Menu text normalization.
//!
//! Turns raw menu text into a display name, a description with price and
//! size tokens removed, and a canonical price string such as
//! `Cup $4.50 | Bowl $6.50`.
//!
//! # Pipeline
//!
//! 1. **Add-ons**: `Add Bacon +3` clauses are pulled out first so their
//!    amounts never reach the price field ([`addons`]).
//! 2. **Tokens**: numbers that look like prices are located, skipping
//!    quantities like `12 oz` or `6"` ([`price`]).
//! 3. **Labels**: each price is paired with the size/option word directly
//!    in front of it (or trailing it as `(Cup)` / `/bottle`); unlabeled
//!    multi-price items get positional labels from the section ([`labels`]).
//! 4. **Assembly**: `{Label} ${amount}` or `${amount} ({Label})` joined by
//!    the source's separator. Re-running on the output is a no-op.
//! 5. **Name/description**: the text before the first price is the name,
//!    the rest is description, with a repeated name removed.
//!
//! All functions here are pure.

pub mod addons;
pub mod labels;
pub mod price;
pub mod profile;

use itertools::Itertools;
use serde::Serialize;

use crate::utils::collapse_whitespace;
use addons::{extract_addons, render_addons, AddOn};
use price::{
    apply_positional_labels, assemble, fix_comma_decimals, has_market_marker, is_market_price,
    is_plausible, scan_tokens, strip_market_price, LabeledPrice,
};
pub use profile::{LabelStyle, NameCase, Separator, SourceProfile};

const NAME_SEPARATORS: &[&str] = &[" - ", " – ", " — ", ": ", " | "];

/// The three strings derived from one menu entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Normalized {
    pub name: String,
    pub description: String,
    pub price: String,
}

/// Prices found in a piece of text plus the byte spans (label included)
/// they occupied.
#[derive(Debug, Default)]
struct PriceScan {
    prices: Vec<LabeledPrice>,
    spans: Vec<(usize, usize)>,
}

fn is_filler(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | ':' | '-' | '–' | '—' | '|' | ',' | '/' | '*' | '…')
}

/// Where the text being scanned came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceField {
    /// A dedicated price field: every amount in it is a price.
    Explicit,
    /// Free text that may also hold counts like `served 3 ways`.
    Mixed,
}

fn read_prices(
    text: &str,
    section: &str,
    profile: &SourceProfile,
    field: PriceField,
) -> PriceScan {
    let tokens = scan_tokens(text);
    let plausible = |token: &price::PriceToken, labeled: bool| {
        field == PriceField::Explicit || is_plausible(token, labeled, profile)
    };

    // Only amounts that will be read as prices decide whether the item has
    // several of them.
    let several = tokens
        .iter()
        .filter(|token| {
            let labeled = profile.vocabulary.label_before(&text[..token.start]).is_some()
                || profile.vocabulary.label_after(&text[token.end..]).is_some();
            plausible(token, labeled)
        })
        .count()
        > 1;
    let mut scan = PriceScan::default();
    let mut cursor = 0;

    for token in &tokens {
        if token.start < cursor {
            continue;
        }
        let gap = &text[cursor..token.start];

        // With a single price, a label glued to the item name ("Fruit Cup 4")
        // is part of the name, not a size.
        let before = profile.vocabulary.label_before(gap).filter(|found| {
            several || gap[..found.start].trim_matches(is_filler).is_empty()
        });
        let after = profile.vocabulary.label_after(&text[token.end..]);

        let label = before
            .as_ref()
            .map(|found| found.label.clone())
            .or_else(|| after.as_ref().map(|(_, label)| label.clone()));

        if !plausible(token, label.is_some()) {
            continue;
        }

        let start = before
            .as_ref()
            .map(|found| cursor + found.start)
            .unwrap_or(token.start);
        let end = token.end + after.as_ref().map(|(consumed, _)| *consumed).unwrap_or(0);

        scan.prices.push(LabeledPrice {
            label,
            amount: token.amount.clone(),
        });
        scan.spans.push((start, end));
        cursor = end;
    }

    apply_positional_labels(&mut scan.prices, section, profile);
    scan
}

/// Text of `source` outside the scanned price spans.
fn outside_spans(source: &str, spans: &[(usize, usize)]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for &(start, end) in spans {
        out.push_str(&source[last..start]);
        out.push(' ');
        last = end;
    }
    out.push_str(&source[last..]);
    out
}

/// Split the text in front of the first price into name and description.
fn split_name(head: &str) -> (String, String) {
    let head = head.trim_matches(is_filler);

    if let Some((idx, sep)) = NAME_SEPARATORS
        .iter()
        .filter_map(|sep| head.find(sep).map(|idx| (idx, *sep)))
        .min_by_key(|(idx, _)| *idx)
    {
        return (
            head[..idx].trim().to_string(),
            head[idx + sep.len()..].trim().to_string(),
        );
    }

    // "Caesar Salad Caesar Salad with croutons": the name repeated as the
    // lead of the description.
    let words: Vec<&str> = head.split_whitespace().collect();
    let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    for k in (2..=words.len() / 2).rev() {
        let prefix = &lower[..k];
        if (k..=words.len() - k).any(|i| &lower[i..i + k] == prefix) {
            return (words[..k].join(" "), words[k..].join(" "));
        }
    }

    (head.to_string(), String::new())
}

/// Case-insensitive whole-word occurrences of `needle` in `haystack`, as
/// byte ranges.
fn word_matches(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    let lower = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();
    let is_word = |c: char| c.is_alphanumeric();
    lower
        .match_indices(&needle)
        .map(|(start, found)| (start, start + found.len()))
        .filter(|&(start, end)| {
            !lower[..start].chars().next_back().is_some_and(is_word)
                && !lower[end..].chars().next().is_some_and(is_word)
        })
        .collect()
}

/// Drop the item name from its description when it is repeated there.
/// A one-word name is only dropped from the front ("Reuben Reuben on rye"),
/// longer names wherever they appear as whole words.
fn remove_repeated_name(description: &str, name: &str) -> String {
    let description = description.trim();
    if name.is_empty() {
        return description.to_string();
    }

    let multi_word = name.split_whitespace().count() >= 2;
    let spans: Vec<(usize, usize)> = word_matches(description, name)
        .into_iter()
        .filter(|&(start, _)| multi_word || start == 0)
        .collect();

    let mut stripped = String::with_capacity(description.len());
    let mut last = 0;
    for (start, end) in spans {
        stripped.push_str(&description[last..start]);
        last = end;
    }
    stripped.push_str(&description[last..]);

    collapse_whitespace(stripped.trim_start_matches(is_filler))
}

fn clean_description(description: &str) -> String {
    let description = collapse_whitespace(description);
    description
        .trim_start_matches(is_filler)
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '|' | ',' | ';' | '/' | '-'))
        .to_string()
}

fn with_addons(description: String, addons: &[AddOn]) -> String {
    if addons.is_empty() {
        return description;
    }
    if description.is_empty() {
        render_addons(addons)
    } else {
        format!("{} | {}", description, render_addons(addons))
    }
}

fn finish(
    name: &str,
    description: &str,
    price: String,
    addons: &[AddOn],
    profile: &SourceProfile,
) -> Normalized {
    let name = collapse_whitespace(name.trim_matches(is_filler));
    let description = clean_description(&remove_repeated_name(description, &name));
    Normalized {
        name: profile.name_case.apply(&name),
        description: with_addons(description, addons),
        price,
    }
}

/// Canonical price string for a price-only field. Market-price markers and
/// text without a believable amount give `""`. Add-on clauses are dropped
/// so their amounts never land in the price.
pub fn normalize_price(text: &str, section: &str, profile: &SourceProfile) -> String {
    let text = collapse_whitespace(&fix_comma_decimals(text));
    if text.is_empty() || is_market_price(&text) {
        return String::new();
    }
    let (body, _) = extract_addons(&text);
    let scan = read_prices(&body, section, profile, PriceField::Explicit);
    assemble(&scan.prices, profile)
}

/// Normalize a single raw fragment that mixes name, description and
/// prices, e.g. `"Soup Cup 4.50 Bowl 6.50"`.
pub fn normalize_entry(text: &str, section: &str, profile: &SourceProfile) -> Normalized {
    let text = collapse_whitespace(&fix_comma_decimals(text));
    let (body, addons) = extract_addons(&text);
    let body = collapse_whitespace(&body);

    let scan = read_prices(&body, section, profile, PriceField::Mixed);
    let (Some(&(first_start, _)), Some(&(_, last_end))) = (scan.spans.first(), scan.spans.last())
    else {
        let body = if has_market_marker(&body) {
            strip_market_price(&body)
        } else {
            body
        };
        let (name, description) = split_name(&body);
        return finish(&name, &description, String::new(), &addons, profile);
    };

    let (name, head_description) = split_name(&body[..first_start]);
    let description = format!("{} {}", head_description, &body[last_end..]);
    finish(
        &name,
        &description,
        assemble(&scan.prices, profile),
        &addons,
        profile,
    )
}

/// Normalize an item whose name, description and price arrived as separate
/// fields (an HTML node each, a JSON object, a vision-model record). When the
/// price field carries no amount, a price written into the name or the
/// description is lifted out of it.
pub fn normalize_item(
    name: &str,
    description: &str,
    price_text: &str,
    section: &str,
    profile: &SourceProfile,
) -> Normalized {
    let (description, mut addons) = extract_addons(&fix_comma_decimals(description));
    let (price_body, price_addons) = extract_addons(&fix_comma_decimals(price_text));
    addons.extend(price_addons);
    let addons: Vec<AddOn> = addons
        .into_iter()
        .unique_by(|a| (a.name.to_lowercase(), a.amount.clone()))
        .collect();

    let mut name = collapse_whitespace(name);
    let mut description = collapse_whitespace(&description);
    let price_body = collapse_whitespace(&price_body);

    let market = is_market_price(&price_body);
    let mut price = if market {
        String::new()
    } else {
        assemble(
            &read_prices(&price_body, section, profile, PriceField::Explicit).prices,
            profile,
        )
    };

    if price.is_empty() && !market {
        let from_name = read_prices(&name, section, profile, PriceField::Mixed);
        if let Some(&(first_start, _)) = from_name.spans.first() {
            price = assemble(&from_name.prices, profile);
            name = name[..first_start].to_string();
        } else {
            let from_description =
                read_prices(&description, section, profile, PriceField::Mixed);
            if !from_description.prices.is_empty() {
                price = assemble(&from_description.prices, profile);
                description = outside_spans(&description, &from_description.spans);
            }
        }
    }

    if price.is_empty() && has_market_marker(&name) {
        name = strip_market_price(&name);
    }

    finish(&name, &description, price, &addons, profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use addons::ADDONS_MARKER;
    use regex::Regex;

    fn suffix_upper() -> SourceProfile {
        SourceProfile::default()
            .with_label_style(LabelStyle::Suffix)
            .with_name_case(NameCase::Upper)
    }

    #[test]
    fn test_canonical_price_is_idempotent() {
        let profile = SourceProfile::default();
        for canonical in ["Small $5 | Large $7", "$12", "Cup $4.50 | Bowl $6.50", "Glass $9 | Bottle $34"] {
            assert_eq!(normalize_price(canonical, "", &profile), canonical);
        }
        let suffix = suffix_upper();
        let canonical = "$3.50 (Glass) | $7.95 (Pitcher)";
        assert_eq!(normalize_price(canonical, "", &suffix), canonical);
    }

    #[test]
    fn test_normalizing_twice_changes_nothing() {
        let profile = SourceProfile::default();
        let once = normalize_price("cup-5,95, bowl-6,95", "Soups", &profile);
        assert_eq!(once, "Cup $5.95 | Bowl $6.95");
        assert_eq!(normalize_price(&once, "Soups", &profile), once);
    }

    #[test]
    fn test_every_amount_has_exactly_one_dollar() {
        let profile = SourceProfile::default();
        let price = normalize_price("$$12 / 14.5", "Pizza", &profile);
        assert_eq!(price, "Small $12 | Large $14.50");
        assert!(!price.contains("$$"));
        let dollar_re = Regex::new(r"\$\d").unwrap();
        let amount_re = Regex::new(r"\d+(?:\.\d+)?").unwrap();
        assert_eq!(
            dollar_re.find_iter(&price).count(),
            amount_re.find_iter(&price).count()
        );
    }

    #[test]
    fn test_addons_stay_out_of_price() {
        let profile = SourceProfile::default();
        let result = normalize_entry("Burger 10 Add Bacon +3", "Burgers", &profile);
        assert_eq!(result.name, "Burger");
        assert_eq!(result.price, "$10");
        assert!(result.description.contains("Add-ons: Bacon +$3"));
        assert_eq!(normalize_price("10 Add Bacon +3", "", &profile), "$10");
    }

    #[test]
    fn test_size_labels_keep_order() {
        let profile = SourceProfile::default();
        let result = normalize_entry("Soup Cup 4.50 Bowl 6.50", "Soups", &profile);
        assert_eq!(result.name, "Soup");
        assert_eq!(result.price, "Cup $4.50 | Bowl $6.50");
        assert_eq!(result.description, "");
    }

    #[test]
    fn test_market_price_is_empty() {
        let profile = SourceProfile::default();
        assert_eq!(normalize_price("MP", "", &profile), "");
        assert_eq!(normalize_price("Market Price", "", &profile), "");
        assert_eq!(normalize_price("M.P.", "", &profile), "");
        let lobster = normalize_item("Lobster Tail MP", "broiled", "", "Seafood", &profile);
        assert_eq!(lobster.name, "Lobster Tail");
        assert_eq!(lobster.price, "");
    }

    #[test]
    fn test_repeated_name_not_in_description() {
        let profile = SourceProfile::default();
        let result = normalize_entry("Caesar Salad Caesar Salad with croutons 9", "Salads", &profile);
        assert_eq!(result.name, "Caesar Salad");
        assert_eq!(result.price, "$9");
        assert!(!result.description.to_lowercase().contains("caesar salad"));
        assert_eq!(result.description, "with croutons");
    }

    #[test]
    fn test_glass_pitcher_beverage() {
        let result = normalize_entry(
            "Tropicana Lemonade GLASS $3.50/ Pitcher $7.95",
            "BEVERAGES",
            &suffix_upper(),
        );
        assert_eq!(result.name, "TROPICANA LEMONADE");
        assert_eq!(result.price, "$3.50 (Glass) | $7.95 (Pitcher)");
    }

    #[test]
    fn test_small_bare_number_is_not_a_price() {
        let profile = SourceProfile::default();
        let result = normalize_entry("Sliders served 3 ways", "Apps", &profile);
        assert_eq!(result.price, "");
        assert_eq!(result.name, "Sliders served 3 ways");

        let lenient = SourceProfile::default().with_min_plausible_price(3.0);
        assert_eq!(normalize_entry("Kids Juice 3", "Drinks", &lenient).price, "$3");
        assert_eq!(normalize_entry("Kids Juice 3", "Drinks", &profile).price, "");
    }

    #[test]
    fn test_price_field_keeps_small_amounts() {
        let profile = SourceProfile::default();
        assert_eq!(normalize_price("3", "", &profile), "$3");
        assert_eq!(normalize_price("2 / 4", "Sides", &profile), "Small $2 | Large $4");
        let soda = normalize_item("Soda", "", "3", "Drinks", &profile);
        assert_eq!(soda.name, "Soda");
        assert_eq!(soda.price, "$3");
    }

    #[test]
    fn test_small_count_does_not_make_several_prices() {
        let profile = SourceProfile::default();
        let result = normalize_entry("Fruit Cup 4.50 with 2 dips", "Sides", &profile);
        assert_eq!(result.name, "Fruit Cup");
        assert_eq!(result.price, "$4.50");
        assert_eq!(result.description, "with 2 dips");
    }

    #[test]
    fn test_comma_lists_are_separate_prices() {
        let profile = SourceProfile::default();
        assert_eq!(normalize_price("12,14", "Pizza", &profile), "Small $12 | Large $14");
        let pizza = normalize_entry("Cheese Pizza 12,14,16", "Pizza", &profile);
        assert_eq!(pizza.name, "Cheese Pizza");
        assert_eq!(pizza.price, "Small $12 | Medium $14 | Large $16");
    }

    #[test]
    fn test_item_price_survives_unmarked_add_sentence() {
        let profile = SourceProfile::default();
        let nachos = normalize_entry("Nachos - cheese, salsa. Add chicken or beef. 11", "Apps", &profile);
        assert_eq!(nachos.name, "Nachos");
        assert_eq!(nachos.price, "$11");
        assert!(!nachos.description.contains(ADDONS_MARKER));

        let salad = normalize_entry("Garden Salad add dressing on the side 9", "Salads", &profile);
        assert_eq!(salad.price, "$9");
        assert!(!salad.description.contains(ADDONS_MARKER));
    }

    #[test]
    fn test_partial_labels_are_completed() {
        let profile = SourceProfile::default();
        assert_eq!(normalize_price("Cup 5 / 8", "Soups", &profile), "Cup $5 | Bowl $8");
    }

    #[test]
    fn test_custom_positional_labels_are_idempotent() {
        let profile = SourceProfile::default().with_positional_labels(&["Personal", "Family"]);
        let once = normalize_price("10 / 18", "Pizza", &profile);
        assert_eq!(once, "Personal $10 | Family $18");
        assert_eq!(normalize_price(&once, "Pizza", &profile), once);
    }

    #[test]
    fn test_name_inside_longer_word_is_kept() {
        let profile = SourceProfile::default();
        let ham = normalize_item("Ham", "Hamburger bun, swiss", "9", "Sandwiches", &profile);
        assert_eq!(ham.description, "Hamburger bun, swiss");
        let tea = normalize_item("Tea", "Teaspoon of honey on the side", "3", "Drinks", &profile);
        assert_eq!(tea.description, "Teaspoon of honey on the side");
        let reuben = normalize_item("Reuben", "Reuben on rye", "12", "Sandwiches", &profile);
        assert_eq!(reuben.description, "on rye");
    }

    #[test]
    fn test_label_glued_to_single_price_stays_in_name() {
        let profile = SourceProfile::default();
        let result = normalize_entry("Fruit Cup 4.50", "Sides", &profile);
        assert_eq!(result.name, "Fruit Cup");
        assert_eq!(result.price, "$4.50");
        assert_eq!(normalize_price("Cup 5", "", &profile), "Cup $5");
    }

    #[test]
    fn test_positional_labels_for_unlabeled_prices() {
        let profile = SourceProfile::default();
        assert_eq!(normalize_price("8 / 30", "Red Wine", &profile), "Glass $8 | Bottle $30");
        let andys = suffix_upper().with_positional_labels(&["Medium", "Large"]);
        assert_eq!(
            normalize_price("18.95/21.95", "GOURMET PIZZA", &andys),
            "$18.95 (Medium) | $21.95 (Large)"
        );
    }

    #[test]
    fn test_separator_and_trailing_labels() {
        let profile = SourceProfile::default().with_separator(Separator::Slash);
        assert_eq!(
            normalize_price("Small $1.50 / Large $2.50", "", &profile),
            "Small $1.50 / Large $2.50"
        );
        assert_eq!(normalize_price("$3.75 /bottle", "", &profile), "Bottle $3.75");
    }

    #[test]
    fn test_entry_with_separator_and_tail() {
        let profile = SourceProfile::default();
        let result = normalize_entry(
            "Buffalo Wings - crispy, tossed 14 served with blue cheese",
            "Apps",
            &profile,
        );
        assert_eq!(result.name, "Buffalo Wings");
        assert_eq!(result.price, "$14");
        assert_eq!(result.description, "crispy, tossed served with blue cheese");
    }

    #[test]
    fn test_item_lifts_price_from_name() {
        let profile = SourceProfile::default();
        let result = normalize_item("STEAK FRITES $32", "hanger steak, fries", "", "Entree", &profile);
        assert_eq!(result.name, "STEAK FRITES");
        assert_eq!(result.price, "$32");
        assert_eq!(result.description, "hanger steak, fries");
    }

    #[test]
    fn test_item_lifts_price_from_description() {
        let profile = SourceProfile::default();
        let result = normalize_item(
            "Chowder",
            "New England style Cup 5 Bowl 8",
            "",
            "Soups",
            &profile,
        );
        assert_eq!(result.price, "Cup $5 | Bowl $8");
        assert_eq!(result.description, "New England style");
    }

    #[test]
    fn test_item_collects_addons_from_both_fields() {
        let profile = SourceProfile::default();
        let result = normalize_item(
            "House Salad",
            "House Salad mixed greens. Add grilled chicken $6",
            "$11 add salmon 9",
            "Salads",
            &profile,
        );
        assert_eq!(result.price, "$11");
        assert_eq!(
            result.description,
            "mixed greens. | Add-ons: grilled chicken +$6, salmon +$9"
        );
    }
}
