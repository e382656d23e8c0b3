//! Keyword-based category classification.

use super::ExtractionMatch;

/// Category returned when no keyword matches.
pub const FALLBACK_CATEGORY: &str = "Other";

const NO_MATCH_CONFIDENCE: f32 = 0.3;
const PER_MATCH_CONFIDENCE: f32 = 0.2;
const MAX_CONFIDENCE: f32 = 0.9;

/// A category and the lowercase keywords that vote for it.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// Built-in category table. Ties go to the earlier entry.
pub const DEFAULT_CATEGORIES: &[CategoryRule] = &[
    CategoryRule {
        name: "Groceries",
        keywords: &["grocery", "supermarket", "food", "vegetables", "fruits", "milk"],
    },
    CategoryRule {
        name: "Restaurant",
        keywords: &["restaurant", "cafe", "dining", "menu", "takeaway"],
    },
    CategoryRule {
        name: "Transport",
        keywords: &["uber", "lyft", "taxi", "bus", "train", "fare"],
    },
    CategoryRule {
        name: "Utilities",
        keywords: &["electricity", "water", "gas", "internet", "phone"],
    },
    CategoryRule {
        name: "Entertainment",
        keywords: &["movie", "theatre", "concert", "game", "netflix"],
    },
];

/// Scores categories by counting keyword substrings in the text.
pub struct KeywordClassifier {
    rules: &'static [CategoryRule],
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_CATEGORIES,
        }
    }

    pub fn with_rules(rules: &'static [CategoryRule]) -> Self {
        Self { rules }
    }

    /// Best category and a confidence of `0.2` per matched keyword,
    /// capped at `0.9`; `Other` at `0.3` when nothing matches.
    pub fn classify(&self, text: &str) -> ExtractionMatch<String> {
        let text = text.to_lowercase();

        let mut best: Option<(&CategoryRule, usize)> = None;
        for rule in self.rules {
            let matches = rule.keywords.iter().filter(|k| text.contains(*k)).count();
            if matches > best.map_or(0, |(_, n)| n) {
                best = Some((rule, matches));
            }
        }

        match best {
            Some((rule, matches)) => {
                let confidence = (matches as f32 * PER_MATCH_CONFIDENCE).min(MAX_CONFIDENCE);
                ExtractionMatch::new(rule.name.to_string(), confidence)
            }
            None => ExtractionMatch::new(FALLBACK_CATEGORY.to_string(), NO_MATCH_CONFIDENCE),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transport() {
        let result = KeywordClassifier::new().classify("UBER trip - taxi fare");
        assert_eq!(result.value, "Transport");
        assert!((result.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_no_keywords() {
        let result = KeywordClassifier::new().classify("Hardware store\nhammer 12.00");
        assert_eq!(result.value, FALLBACK_CATEGORY);
        assert!((result.confidence - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_cap() {
        let text = "grocery supermarket food vegetables fruits milk";
        let result = KeywordClassifier::new().classify(text);
        assert_eq!(result.value, "Groceries");
        assert!((result.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_tie_keeps_first() {
        // One Restaurant keyword, one Entertainment keyword.
        let result = KeywordClassifier::new().classify("cafe then a movie");
        assert_eq!(result.value, "Restaurant");
    }
}
