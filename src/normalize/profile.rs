//! Per-source tuning for the normalizer.
//!
//! Every restaurant writes its menu a little differently. Rather than
//! re-implementing the price heuristics per site, each scraper hands the
//! normalizer a [`SourceProfile`] describing the few knobs that actually
//! vary between sources.

use super::labels::SizeVocabulary;

/// How several simultaneous prices are joined in the canonical string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `Small $5 | Large $7`
    Pipe,
    /// `Small $5 / Large $7`
    Slash,
}

impl Separator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::Pipe => " | ",
            Separator::Slash => " / ",
        }
    }
}

/// Where a size/option label goes relative to its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// `Cup $4.50`
    Prefix,
    /// `$4.50 (Cup)`
    Suffix,
}

/// Casing applied to item names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCase {
    AsIs,
    Upper,
    Title,
}

impl NameCase {
    pub fn apply(&self, name: &str) -> String {
        match self {
            NameCase::AsIs => name.to_string(),
            NameCase::Upper => name.to_uppercase(),
            NameCase::Title => name
                .split_whitespace()
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => {
                            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                        }
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// The knobs one source tunes.
#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub separator: Separator,
    pub label_style: LabelStyle,
    /// A bare integer with no `$`, no cents and no label only counts as a
    /// price when it is at least this large.
    pub min_plausible_price: f64,
    pub name_case: NameCase,
    /// Labels to hand out by position when a source always lists the same
    /// two (or more) sizes without naming them.
    pub positional_labels: Option<Vec<String>>,
    pub vocabulary: SizeVocabulary,
    /// Source-specific `(pattern, display)` labels compiled into `vocabulary`.
    extra_labels: Vec<(String, String)>,
}

impl Default for SourceProfile {
    fn default() -> Self {
        Self {
            separator: Separator::Pipe,
            label_style: LabelStyle::Prefix,
            min_plausible_price: 5.0,
            name_case: NameCase::AsIs,
            positional_labels: None,
            vocabulary: SizeVocabulary::default(),
            extra_labels: Vec::new(),
        }
    }
}

impl SourceProfile {
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_label_style(mut self, label_style: LabelStyle) -> Self {
        self.label_style = label_style;
        self
    }

    pub fn with_min_plausible_price(mut self, min: f64) -> Self {
        self.min_plausible_price = min;
        self
    }

    pub fn with_name_case(mut self, name_case: NameCase) -> Self {
        self.name_case = name_case;
        self
    }

    /// Positional labels are also taught to the vocabulary, so a canonical
    /// string like `Family $18` reads back with its label.
    pub fn with_positional_labels(mut self, labels: &[&str]) -> Self {
        self.positional_labels = Some(labels.iter().map(|l| l.to_string()).collect());

        let unknown: Vec<(String, String)> = labels
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && l.chars().all(|c| c.is_alphanumeric() || c == ' '))
            .filter(|l| self.vocabulary.canonical(l).as_deref() != Some(*l))
            .map(|l| (regex::escape(l).replace(' ', r"\s+"), l.to_string()))
            .collect();
        let pairs: Vec<(&str, &str)> = unknown
            .iter()
            .map(|(pattern, display)| (pattern.as_str(), display.as_str()))
            .collect();
        self.with_extra_labels(&pairs)
    }

    /// Extend the size vocabulary with `(pattern, display)` labels, e.g.
    /// `(r"slices?", "Slice")`. Extra labels are tried before the defaults.
    pub fn with_extra_labels(mut self, extra: &[(&str, &str)]) -> Self {
        if extra.is_empty() {
            return self;
        }
        self.extra_labels
            .extend(extra.iter().map(|(p, d)| (p.to_string(), d.to_string())));
        let all: Vec<(&str, &str)> = self
            .extra_labels
            .iter()
            .map(|(pattern, display)| (pattern.as_str(), display.as_str()))
            .collect();
        self.vocabulary = SizeVocabulary::with_extra(&all);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(NameCase::Title.apply("CHICKEN  tenders"), "Chicken Tenders");
        assert_eq!(NameCase::Upper.apply("Iced Tea"), "ICED TEA");
        assert_eq!(NameCase::AsIs.apply("Iced Tea"), "Iced Tea");
    }

    #[test]
    fn test_builder_overrides_defaults() {
        let profile = SourceProfile::default()
            .with_separator(Separator::Slash)
            .with_min_plausible_price(4.0)
            .with_positional_labels(&["Medium", "Large"]);
        assert_eq!(profile.separator.as_str(), " / ");
        assert_eq!(profile.min_plausible_price, 4.0);
        assert_eq!(profile.positional_labels.unwrap(), vec!["Medium", "Large"]);
    }

    #[test]
    fn test_positional_labels_join_vocabulary() {
        let profile = SourceProfile::default().with_positional_labels(&["Personal", "Family"]);
        assert_eq!(profile.vocabulary.canonical("family").as_deref(), Some("Family"));
        assert_eq!(profile.vocabulary.label_before("Family ").unwrap().label, "Family");
        assert_eq!(profile.extra_labels.len(), 1);
    }

    #[test]
    fn test_extra_labels_accumulate() {
        let profile = SourceProfile::default()
            .with_extra_labels(&[(r"slices?", "Slice")])
            .with_extra_labels(&[(r"sheet", "Sheet")]);
        assert_eq!(profile.vocabulary.canonical("slices").as_deref(), Some("Slice"));
        assert_eq!(profile.vocabulary.canonical("Sheet").as_deref(), Some("Sheet"));
        assert_eq!(profile.vocabulary.canonical("cup").as_deref(), Some("Cup"));
    }
}
