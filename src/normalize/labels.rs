//! Size and option labels ("Small", "Cup", "GLS", `12"`, "Half Dozen").

use regex::Regex;

/// Default vocabulary as `(pattern, display)`. Longer alternatives come
/// first so "Half Dozen" wins over "Dozen" and "Extra Large" over "Large".
const DEFAULT_LABELS: &[(&str, &str)] = &[
    (r"half\s+dozen|1/2\s+dozen", "Half Dozen"),
    (r"dozen", "Dozen"),
    (r"extra\s+large|xl", "Extra Large"),
    (r"small|sml|sm", "Small"),
    (r"medium|med", "Medium"),
    (r"large|lrg|lg", "Large"),
    (r"personal", "Personal"),
    (r"regular|reg", "Regular"),
    (r"cup", "Cup"),
    (r"bowl", "Bowl"),
    (r"crock", "Crock"),
    (r"quart|qt", "Quart"),
    (r"pint|pt", "Pint"),
    (r"glass|gls", "Glass"),
    (r"bottles?|btl", "Bottle"),
    (r"pitcher", "Pitcher"),
    (r"carafe", "Carafe"),
    (r"single", "Single"),
    (r"double", "Double"),
    (r"triple", "Triple"),
    (r"half", "Half"),
    (r"whole", "Whole"),
    (r"full", "Full"),
];

const INCH: &str = r#"(?P<inch>\d{1,2})\s*(?:"|”|''|-?\s?inch(?:es)?\b|in\.)"#;

/// A label found directly in front of a price.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMatch {
    /// Byte offset of the label inside the searched text.
    pub start: usize,
    pub label: String,
}

/// Compiled size/option vocabulary.
#[derive(Debug, Clone)]
pub struct SizeVocabulary {
    entries: Vec<(Regex, String)>,
    before: Regex,
    after: Regex,
}

impl Default for SizeVocabulary {
    fn default() -> Self {
        Self::with_extra(&[])
    }
}

impl SizeVocabulary {
    /// Build the default vocabulary plus `extra` `(pattern, display)` pairs.
    /// Extra labels are tried first.
    pub fn with_extra(extra: &[(&str, &str)]) -> Self {
        let all: Vec<(&str, &str)> = extra.iter().chain(DEFAULT_LABELS.iter()).copied().collect();

        let entries = all
            .iter()
            .map(|(pattern, display)| {
                let anchored = Regex::new(&format!(r"(?i)^(?:{pattern})$"))
                    .expect("label patterns are valid regexes");
                (anchored, display.to_string())
            })
            .collect();

        let alt = all
            .iter()
            .map(|(pattern, _)| format!("(?:{pattern})"))
            .collect::<Vec<_>>()
            .join("|");

        let before = Regex::new(&format!(
            r"(?i)(?:\b(?P<word>{alt})\b|{INCH})[\s:\-–=/]*$"
        ))
        .expect("label patterns are valid regexes");

        let after = Regex::new(&format!(
            r"(?i)^(?:\s*\(\s*(?:(?P<word>{alt})|{INCH})\s*\)|\s*/(?P<slash>{alt})\b|\s+per\s+(?P<per>{alt})\b)"
        ))
        .expect("label patterns are valid regexes");

        Self {
            entries,
            before,
            after,
        }
    }

    /// Map raw label text ("GLS", "sm", "half  dozen") to its display form.
    pub fn canonical(&self, raw: &str) -> Option<String> {
        let raw = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        self.entries
            .iter()
            .find(|(re, _)| re.is_match(&raw))
            .map(|(_, display)| display.clone())
    }

    /// A label that ends `gap`, with only spacing or `: - = /` between it and
    /// the price that follows.
    pub fn label_before(&self, gap: &str) -> Option<LabelMatch> {
        let caps = self.before.captures(gap)?;
        if let Some(word) = caps.name("word") {
            return Some(LabelMatch {
                start: word.start(),
                label: self.canonical(word.as_str())?,
            });
        }
        let inch = caps.name("inch")?;
        Some(LabelMatch {
            start: inch.start(),
            label: format!("{}\"", inch.as_str()),
        })
    }

    /// A label trailing a price: `(Cup)`, `/bottle`, `per glass`.
    /// Returns the number of bytes consumed and the label.
    pub fn label_after(&self, rest: &str) -> Option<(usize, String)> {
        let caps = self.after.captures(rest)?;
        let consumed = caps.get(0)?.end();
        let label = if let Some(inch) = caps.name("inch") {
            format!("{}\"", inch.as_str())
        } else {
            let word = caps
                .name("word")
                .or_else(|| caps.name("slash"))
                .or_else(|| caps.name("per"))?;
            self.canonical(word.as_str())?
        };
        Some((consumed, label))
    }
}

/// Section conventions for unlabeled multi-price items: first is the
/// smaller serving, second the larger.
const SECTION_CONVENTIONS: &[(&[&str], &[&str])] = &[
    (&["soup", "chowder", "chili", "bisque"], &["Cup", "Bowl"]),
    (&["wine", "vino", "sangria"], &["Glass", "Bottle"]),
    (&["beer", "draft", "draught", "tap"], &["Pint", "Pitcher"]),
];

/// Labels handed out by position when none of `count` prices carried one.
pub fn positional_labels(
    section: &str,
    count: usize,
    overrides: Option<&[String]>,
) -> Option<Vec<String>> {
    if count < 2 {
        return None;
    }
    if let Some(labels) = overrides {
        if labels.len() >= count {
            return Some(labels[..count].to_vec());
        }
    }

    let section = section.to_lowercase();
    if count == 2 {
        for (keywords, labels) in SECTION_CONVENTIONS {
            if keywords.iter().any(|k| section.contains(k)) {
                return Some(labels.iter().map(|l| l.to_string()).collect());
            }
        }
    }

    match count {
        2 => Some(vec!["Small".into(), "Large".into()]),
        3 => Some(vec!["Small".into(), "Medium".into(), "Large".into()]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_abbreviations() {
        let vocab = SizeVocabulary::default();
        assert_eq!(vocab.canonical("GLS").as_deref(), Some("Glass"));
        assert_eq!(vocab.canonical("sm").as_deref(), Some("Small"));
        assert_eq!(vocab.canonical("Half   Dozen").as_deref(), Some("Half Dozen"));
        assert_eq!(vocab.canonical("burger"), None);
    }

    #[test]
    fn test_label_before_requires_adjacency() {
        let vocab = SizeVocabulary::default();
        let found = vocab.label_before("Tropicana Lemonade GLASS ").unwrap();
        assert_eq!(found.label, "Glass");
        assert_eq!(found.start, 19);
        assert!(vocab.label_before("Cup of soup ").is_none());
        assert_eq!(vocab.label_before("cup-").unwrap().label, "Cup");
    }

    #[test]
    fn test_label_before_prefers_longest() {
        let vocab = SizeVocabulary::default();
        assert_eq!(vocab.label_before("Wings Half Dozen ").unwrap().label, "Half Dozen");
        assert_eq!(vocab.label_before(" | Extra Large ").unwrap().label, "Extra Large");
    }

    #[test]
    fn test_inch_labels() {
        let vocab = SizeVocabulary::default();
        assert_eq!(vocab.label_before("Italian Sub 12\" ").unwrap().label, "12\"");
        assert_eq!(vocab.label_before("Cheese 16 inch ").unwrap().label, "16\"");
    }

    #[test]
    fn test_label_after_forms() {
        let vocab = SizeVocabulary::default();
        assert_eq!(vocab.label_after(" /bottle").unwrap(), (8, "Bottle".to_string()));
        assert_eq!(vocab.label_after(" (Glass) | $9").unwrap(), (8, "Glass".to_string()));
        assert_eq!(vocab.label_after(" per glass").unwrap().1, "Glass");
        assert!(vocab.label_after("/ Pitcher $7.95").is_none());
    }

    #[test]
    fn test_extra_labels_take_priority() {
        let vocab = SizeVocabulary::with_extra(&[(r"slice", "Slice")]);
        assert_eq!(vocab.label_before("Cheese Slice ").unwrap().label, "Slice");
    }

    #[test]
    fn test_positional_labels_by_section() {
        assert_eq!(
            positional_labels("Soups & Salads", 2, None).unwrap(),
            vec!["Cup", "Bowl"]
        );
        assert_eq!(
            positional_labels("Wines by the Glass", 2, None).unwrap(),
            vec!["Glass", "Bottle"]
        );
        assert_eq!(positional_labels("Pizza", 3, None).unwrap(), vec!["Small", "Medium", "Large"]);
        assert!(positional_labels("Pizza", 1, None).is_none());
        assert!(positional_labels("Pizza", 5, None).is_none());
    }

    #[test]
    fn test_positional_override() {
        let overrides = vec!["Medium".to_string(), "Large".to_string()];
        assert_eq!(
            positional_labels("Soup", 2, Some(&overrides)).unwrap(),
            vec!["Medium", "Large"]
        );
    }
}
