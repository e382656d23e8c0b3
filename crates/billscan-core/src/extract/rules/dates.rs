//! Date extraction.

use super::patterns::NUMERIC_DATE;
use super::{ExtractionMatch, FieldExtractor};

/// Finds numeric `D/M/Y`-style dates. The match is returned as written;
/// it is not checked against the calendar.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        NUMERIC_DATE
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| {
                ExtractionMatch::new(m.as_str().to_string(), 0.9).with_position(m.start(), m.end())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_slash_date() {
        let extractor = DateExtractor::new();

        let result = extractor.extract("Total: $42.50\n05/01/2024").unwrap();
        assert_eq!(result.value, "05/01/2024");
    }

    #[test]
    fn test_extract_dash_and_short_year() {
        let extractor = DateExtractor::new();

        assert_eq!(extractor.extract("on 5-1-24 at noon").unwrap().value, "5-1-24");
    }

    #[test]
    fn test_iso_date_is_not_matched() {
        // Four-digit leading group does not fit D{1,2}.
        let extractor = DateExtractor::new();
        assert!(extractor.extract("2024-05-01").is_none());
    }

    #[test]
    fn test_impossible_date_is_kept() {
        let extractor = DateExtractor::new();
        assert_eq!(extractor.extract("99/99/9999").unwrap().value, "99/99/9999");
    }

    #[test]
    fn test_first_of_many() {
        let extractor = DateExtractor::new();
        let all = extractor.extract_all("from 01/02/2024 to 03/04/2024");

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].value, "01/02/2024");
    }
}
