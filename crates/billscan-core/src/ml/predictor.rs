//! Per-field label prediction from raw text.

use std::sync::Arc;

use tracing::debug;

use crate::error::ModelError;
use crate::models::bill::{FieldKind, FieldValue};

use super::store::ModelStore;

/// A predicted label and, when the classifier exposes probabilities, the
/// probability of that label.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub kind: FieldKind,
    pub label: String,
    pub confidence: Option<f32>,
}

impl Prediction {
    pub fn into_field_value(self) -> FieldValue {
        let value = FieldValue::new(Some(self.label));
        match self.confidence {
            Some(c) => value.with_confidence(c),
            None => value,
        }
    }
}

/// Vectorize-then-classify over a shared [`ModelStore`].
#[derive(Clone)]
pub struct FieldPredictor {
    store: Arc<ModelStore>,
}

impl FieldPredictor {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Predict one field independently of all others.
    pub fn predict(&self, kind: FieldKind, text: &str) -> Result<Prediction, ModelError> {
        let model = self.store.get(kind)?;

        let features = model.vectorizer.transform(text);
        let scores = model.classifier.classify(&features)?;

        let label = model
            .classifier
            .classes()
            .get(scores.index)
            .cloned()
            .ok_or_else(|| {
                ModelError::Inference(billscan_inference::InferenceError::OutputExtraction(
                    format!("class index {} out of range", scores.index),
                ))
            })?;
        let confidence = scores.confidence().map(|c| c.clamp(0.0, 1.0));

        debug!("Predicted {} = '{}' ({:?})", kind, label, confidence);

        Ok(Prediction {
            kind,
            label,
            confidence,
        })
    }
}
