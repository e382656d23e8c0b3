//! Regex and keyword extraction, no model artifacts required.

use std::time::Instant;

use tracing::debug;

use crate::error::Result;
use crate::models::bill::{ExtractedFields, ExtractionMode, FieldValue};

use super::rules::{
    extract_merchant, parse_amount, AmountExtractor, DateExtractor, FieldExtractor,
    KeywordClassifier,
};
use super::BillExtractor;

/// Rule-based extractor: each field is an independent single-pattern search.
pub struct RuleExtractor {
    amounts: AmountExtractor,
    dates: DateExtractor,
    categories: KeywordClassifier,
}

impl RuleExtractor {
    pub fn new() -> Self {
        Self {
            amounts: AmountExtractor::new(),
            dates: DateExtractor::new(),
            categories: KeywordClassifier::new(),
        }
    }

    /// Merchant, amount and date only; category is left empty.
    ///
    /// The hybrid pipeline uses this and fills the category from a model.
    pub fn extract_base(&self, text: &str) -> ExtractedFields {
        let mut fields = ExtractedFields::new(ExtractionMode::Rules);

        fields.merchant = FieldValue::new(Some(extract_merchant(text)));

        let amount = self.amounts.extract(text).map(|m| m.value);
        fields.amount_value = amount.as_deref().and_then(parse_amount);
        fields.amount = FieldValue::new(amount);

        fields.date = FieldValue::new(self.dates.extract(text).map(|m| m.value));

        fields
    }

    /// Keyword category for the text.
    pub fn classify_category(&self, text: &str) -> FieldValue {
        let category = self.categories.classify(text);
        FieldValue::new(Some(category.value)).with_confidence(category.confidence)
    }
}

impl Default for RuleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl BillExtractor for RuleExtractor {
    fn extract(&self, text: &str) -> Result<ExtractedFields> {
        let start = Instant::now();

        let mut fields = self.extract_base(text);
        fields.category = self.classify_category(text);

        debug!(
            "Rule extraction over {} chars took {:?}",
            text.len(),
            start.elapsed()
        );
        Ok(fields)
    }

    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Rules
    }
}
