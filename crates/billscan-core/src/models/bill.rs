//! Bill field data model.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Merchant value used when nothing better can be determined.
pub const UNKNOWN_MERCHANT: &str = "Unknown Merchant";

/// The closed set of fields billscan extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Merchant,
    Amount,
    Date,
    Category,
}

impl FieldKind {
    /// Every supported field, in response order.
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Merchant,
        FieldKind::Amount,
        FieldKind::Date,
        FieldKind::Category,
    ];

    /// Artifact-file stem for this field.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Merchant => "merchant",
            FieldKind::Amount => "amount",
            FieldKind::Date => "date",
            FieldKind::Category => "category",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merchant" | "merchant_name" => Ok(FieldKind::Merchant),
            "amount" | "total_amount" => Ok(FieldKind::Amount),
            "date" => Ok(FieldKind::Date),
            "category" => Ok(FieldKind::Category),
            other => Err(ModelError::UnrecognizedField(other.to_string())),
        }
    }
}

/// Which pipeline produced a set of fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Regex fields plus keyword category.
    #[default]
    Rules,
    /// Regex fields plus ML category.
    Hybrid,
    /// Every field from its ML classifier.
    Ml,
}

impl ExtractionMode {
    /// Field kinds whose artifacts must be present to run this mode.
    pub fn required_fields(self) -> &'static [FieldKind] {
        match self {
            ExtractionMode::Rules => &[],
            ExtractionMode::Hybrid => &[FieldKind::Category],
            ExtractionMode::Ml => &FieldKind::ALL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMode::Rules => "rules",
            ExtractionMode::Hybrid => "hybrid",
            ExtractionMode::Ml => "ml",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" | "rule" | "regex" => Ok(ExtractionMode::Rules),
            "hybrid" => Ok(ExtractionMode::Hybrid),
            "ml" => Ok(ExtractionMode::Ml),
            other => Err(format!("unknown extraction mode '{}'", other)),
        }
    }
}

/// One extracted value and how sure the producer was about it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: Option<String>,
    pub confidence: Option<f32>,
}

impl FieldValue {
    pub fn new(value: Option<String>) -> Self {
        Self {
            value,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}

/// Fields extracted from one bill. No cross-field invariant is enforced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub merchant: FieldValue,
    pub amount: FieldValue,
    pub date: FieldValue,
    pub category: FieldValue,
    /// Numeric reading of `amount`, when it parses.
    pub amount_value: Option<Decimal>,
    /// Echoed input; set by the ML variants.
    pub raw_text: Option<String>,
    pub mode: ExtractionMode,
}

impl ExtractedFields {
    pub fn new(mode: ExtractionMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn get(&self, kind: FieldKind) -> &FieldValue {
        match kind {
            FieldKind::Merchant => &self.merchant,
            FieldKind::Amount => &self.amount,
            FieldKind::Date => &self.date,
            FieldKind::Category => &self.category,
        }
    }

    pub fn set(&mut self, kind: FieldKind, value: FieldValue) {
        match kind {
            FieldKind::Merchant => self.merchant = value,
            FieldKind::Amount => self.amount = value,
            FieldKind::Date => self.date = value,
            FieldKind::Category => self.category = value,
        }
    }

    /// Flatten into the wire layout used by the HTTP API.
    pub fn to_response(&self) -> BillResponse {
        BillResponse {
            merchant_name: self.merchant.value.clone(),
            total_amount: self.amount.value.clone(),
            date: self.date.value.clone(),
            category: self.category.value.clone(),
            amount_value: self.amount_value,
            merchant_confidence: self.merchant.confidence,
            amount_confidence: self.amount.confidence,
            date_confidence: self.date.confidence,
            category_confidence: self.category.confidence,
            raw_text: self.raw_text.clone(),
            mode: self.mode,
        }
    }
}

/// JSON shape returned for text extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillResponse {
    pub merchant_name: Option<String>,
    pub total_amount: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub mode: ExtractionMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_kind_parse() {
        assert_eq!("merchant".parse::<FieldKind>().unwrap(), FieldKind::Merchant);
        assert_eq!("Category".parse::<FieldKind>().unwrap(), FieldKind::Category);
        assert_eq!("total_amount".parse::<FieldKind>().unwrap(), FieldKind::Amount);

        let err = "vendor".parse::<FieldKind>().unwrap_err();
        assert!(matches!(err, ModelError::UnrecognizedField(name) if name == "vendor"));
    }

    #[test]
    fn test_required_fields() {
        assert!(ExtractionMode::Rules.required_fields().is_empty());
        assert_eq!(ExtractionMode::Hybrid.required_fields(), &[FieldKind::Category]);
        assert_eq!(ExtractionMode::Ml.required_fields().len(), 4);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let v = FieldValue::new(Some("x".into())).with_confidence(1.7);
        assert_eq!(v.confidence, Some(1.0));
    }

    #[test]
    fn test_response_omits_absent_confidence() {
        let mut fields = ExtractedFields::new(ExtractionMode::Rules);
        fields.merchant = FieldValue::new(Some("ACME".into()));

        let json = serde_json::to_value(fields.to_response()).unwrap();
        assert_eq!(json["merchant_name"], "ACME");
        assert!(json["total_amount"].is_null());
        assert!(json.get("merchant_confidence").is_none());
        assert_eq!(json["mode"], "rules");
    }
}
