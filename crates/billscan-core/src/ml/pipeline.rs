//! Extraction pipelines backed by field models.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::extract::rules::parse_amount;
use crate::extract::{BillExtractor, RuleExtractor};
use crate::models::bill::{ExtractedFields, ExtractionMode, FieldKind};
use crate::models::config::ModelConfig;

use super::predictor::FieldPredictor;
use super::store::ModelStore;

/// Every field predicted by its own classifier. Echoes the input text.
pub struct MlExtractor {
    predictor: FieldPredictor,
}

impl MlExtractor {
    pub fn new(predictor: FieldPredictor) -> Self {
        Self { predictor }
    }
}

impl BillExtractor for MlExtractor {
    fn extract(&self, text: &str) -> Result<ExtractedFields> {
        let start = Instant::now();
        let mut fields = ExtractedFields::new(ExtractionMode::Ml);

        for kind in FieldKind::ALL {
            let prediction = self.predictor.predict(kind, text)?;
            fields.set(kind, prediction.into_field_value());
        }
        fields.amount_value = fields.amount.value.as_deref().and_then(parse_amount);
        fields.raw_text = Some(text.to_string());

        debug!("ML extraction took {:?}", start.elapsed());
        Ok(fields)
    }

    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Ml
    }
}

/// Regex merchant, amount and date; category from a classifier fed the
/// merchant line followed by the full text.
pub struct HybridExtractor {
    rules: RuleExtractor,
    predictor: FieldPredictor,
}

impl HybridExtractor {
    pub fn new(predictor: FieldPredictor) -> Self {
        Self {
            rules: RuleExtractor::new(),
            predictor,
        }
    }
}

impl BillExtractor for HybridExtractor {
    fn extract(&self, text: &str) -> Result<ExtractedFields> {
        let mut fields = self.rules.extract_base(text);
        fields.mode = ExtractionMode::Hybrid;

        let merchant = fields.merchant.value.as_deref().unwrap_or_default();
        let input = format!("{} {}", merchant, text);
        fields.category = self
            .predictor
            .predict(FieldKind::Category, &input)?
            .into_field_value();
        fields.raw_text = Some(text.to_string());

        Ok(fields)
    }

    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Hybrid
    }
}

/// Build the extractor for a deployment mode, loading only the artifacts
/// that mode needs.
pub fn build_extractor(
    mode: ExtractionMode,
    models: &ModelConfig,
) -> Result<Arc<dyn BillExtractor>> {
    let extractor: Arc<dyn BillExtractor> = match mode {
        ExtractionMode::Rules => Arc::new(RuleExtractor::new()),
        ExtractionMode::Hybrid | ExtractionMode::Ml => {
            let store = ModelStore::load(models, mode.required_fields())?;
            let predictor = FieldPredictor::new(Arc::new(store));
            if mode == ExtractionMode::Ml {
                Arc::new(MlExtractor::new(predictor))
            } else {
                Arc::new(HybridExtractor::new(predictor))
            }
        }
    };

    info!("Using {} extraction", mode);
    Ok(extractor)
}
