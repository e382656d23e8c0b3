//! Total amount extraction.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::patterns::{CURRENCY_SYMBOL, TOTAL_AMOUNT};
use super::{ExtractionMatch, FieldExtractor};

/// Finds the amount following a total/amount-due/balance/payable label.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    /// The matched token, verbatim, currency symbol included.
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let caps = TOTAL_AMOUNT.captures(text)?;
        let token = caps.get(2)?;
        Some(
            ExtractionMatch::new(token.as_str().to_string(), 0.9)
                .with_position(token.start(), token.end()),
        )
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        TOTAL_AMOUNT
            .captures_iter(text)
            .filter_map(|caps| caps.get(2))
            .map(|token| {
                ExtractionMatch::new(token.as_str().to_string(), 0.9)
                    .with_position(token.start(), token.end())
            })
            .collect()
    }
}

/// Parse an amount token such as `$42.50` or `€17,00`.
///
/// A comma is the decimal separator when it is the only separator.
pub fn parse_amount(token: &str) -> Option<Decimal> {
    let cleaned = CURRENCY_SYMBOL.replace_all(token.trim(), "");
    let cleaned = cleaned.trim();

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(_), None) => cleaned.replace(',', "."),
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, _) => cleaned.to_string(),
    };

    let normalized = normalized.trim_end_matches('.');
    if normalized.is_empty() {
        return None;
    }

    Decimal::from_str(normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labeled_total_verbatim() {
        let extractor = AmountExtractor::new();

        let m = extractor.extract("Total: $42.50\n05/01/2024").unwrap();
        assert_eq!(m.value, "$42.50");
        assert_eq!(m.position, Some((7, 13)));
    }

    #[test]
    fn test_label_variants() {
        let extractor = AmountExtractor::new();

        assert_eq!(extractor.extract("AMOUNT DUE - €17,00").unwrap().value, "€17,00");
        assert_eq!(extractor.extract("balance 9.99").unwrap().value, "9.99");
        assert_eq!(extractor.extract("Payable: £120").unwrap().value, "£120");
    }

    #[test]
    fn test_first_match_wins() {
        let extractor = AmountExtractor::new();
        let text = "Total: 10.00\nBalance: 3.00";

        assert_eq!(extractor.extract(text).unwrap().value, "10.00");
        assert_eq!(extractor.extract_all(text).len(), 2);
    }

    #[test]
    fn test_no_label_is_none() {
        let extractor = AmountExtractor::new();
        assert!(extractor.extract("Coffee 3.50\nThank you").is_none());
        assert!(extractor.extract("").is_none());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$42.50"), Some(Decimal::from_str("42.50").unwrap()));
        assert_eq!(parse_amount("€17,00"), Some(Decimal::from_str("17.00").unwrap()));
        assert_eq!(parse_amount("1.234,56"), Some(Decimal::from_str("1234.56").unwrap()));
        assert_eq!(parse_amount("12."), Some(Decimal::from_str("12").unwrap()));
        assert_eq!(parse_amount("$"), None);
    }

    #[test]
    fn test_lone_comma_is_decimal() {
        assert_eq!(parse_amount("1,234"), Some(Decimal::from_str("1.234").unwrap()));
        assert_eq!(parse_amount("€12,345"), Some(Decimal::from_str("12.345").unwrap()));
        assert_eq!(parse_amount("£3,5"), Some(Decimal::from_str("3.5").unwrap()));
    }
}
