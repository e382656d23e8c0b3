//! Process-wide table of loaded field models.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::ModelError;
use crate::models::bill::FieldKind;
use crate::models::config::ModelConfig;

use super::classifier::{Classifier, LinearClassifier};
use super::vectorizer::TfidfVectorizer;

/// A classifier bound to the vectorizer it was trained with.
pub struct FieldModel {
    pub vectorizer: TfidfVectorizer,
    pub classifier: Box<dyn Classifier>,
}

impl FieldModel {
    /// Pair a vectorizer with a classifier, checking that widths agree.
    pub fn new(
        vectorizer: TfidfVectorizer,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, ModelError> {
        if let Some(expected) = classifier.n_features() {
            if expected != vectorizer.n_features() {
                return Err(ModelError::DimensionMismatch {
                    expected,
                    actual: vectorizer.n_features(),
                });
            }
        }
        Ok(Self {
            vectorizer,
            classifier,
        })
    }
}

/// Immutable set of field models, loaded once before serving.
#[derive(Default)]
pub struct ModelStore {
    models: BTreeMap<FieldKind, FieldModel>,
}

impl ModelStore {
    /// Load every requested field from the artifact directory.
    ///
    /// Fails on the first missing or invalid artifact; a partial store is
    /// never returned.
    pub fn load(config: &ModelConfig, kinds: &[FieldKind]) -> Result<Self, ModelError> {
        let start = Instant::now();
        let mut models = BTreeMap::new();

        for &kind in kinds {
            let model = load_field(config, kind)?;
            info!(
                "Loaded {} model: {} features, {} classes",
                kind,
                model.vectorizer.n_features(),
                model.classifier.classes().len()
            );
            models.insert(kind, model);
        }

        info!(
            "Model store ready with {} field(s) from {} in {:?}",
            models.len(),
            config.model_dir.display(),
            start.elapsed()
        );
        Ok(Self { models })
    }

    /// Build a store from already constructed models.
    pub fn from_models(models: impl IntoIterator<Item = (FieldKind, FieldModel)>) -> Self {
        Self {
            models: models.into_iter().collect(),
        }
    }

    /// Model for a field; asking for one that was not loaded is a misuse.
    pub fn get(&self, kind: FieldKind) -> Result<&FieldModel, ModelError> {
        self.models
            .get(&kind)
            .ok_or_else(|| ModelError::UnrecognizedField(kind.to_string()))
    }

    pub fn contains(&self, kind: FieldKind) -> bool {
        self.models.contains_key(&kind)
    }

    /// Loaded field kinds in canonical order.
    pub fn kinds(&self) -> impl Iterator<Item = FieldKind> + '_ {
        self.models.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn missing(kind: FieldKind, path: &Path) -> ModelError {
    ModelError::MissingArtifact {
        field: kind.to_string(),
        path: path.to_path_buf(),
    }
}

fn load_field(config: &ModelConfig, kind: FieldKind) -> Result<FieldModel, ModelError> {
    let vectorizer_path = config.vectorizer_path(kind);
    if !vectorizer_path.is_file() {
        return Err(missing(kind, &vectorizer_path));
    }
    let vectorizer = TfidfVectorizer::from_file(&vectorizer_path)?;
    debug!("Loaded vectorizer {}", vectorizer_path.display());

    let onnx_path = config.onnx_model_path(kind);
    let linear_path = config.linear_model_path(kind);

    let classifier: Box<dyn Classifier> = if onnx_path.is_file() {
        let labels_path = config.labels_path(kind);
        if !labels_path.is_file() {
            return Err(missing(kind, &labels_path));
        }
        load_onnx(&onnx_path, &labels_path, config.num_threads)?
    } else if linear_path.is_file() {
        Box::new(LinearClassifier::from_file(&linear_path)?)
    } else {
        return Err(missing(kind, &linear_path));
    };

    FieldModel::new(vectorizer, classifier).map_err(|e| ModelError::InvalidArtifact {
        path: vectorizer_path,
        reason: e.to_string(),
    })
}

#[cfg(feature = "native")]
fn load_onnx(
    model_path: &Path,
    labels_path: &Path,
    num_threads: usize,
) -> Result<Box<dyn Classifier>, ModelError> {
    use super::classifier::OnnxClassifier;
    use billscan_inference::OrtBackend;

    let backend =
        OrtBackend::from_file(model_path, num_threads).map_err(|e| ModelError::InvalidArtifact {
            path: model_path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(Box::new(OnnxClassifier::new(backend, labels_path)?))
}

#[cfg(not(feature = "native"))]
fn load_onnx(
    model_path: &Path,
    _labels_path: &Path,
    _num_threads: usize,
) -> Result<Box<dyn Classifier>, ModelError> {
    Err(ModelError::InvalidArtifact {
        path: model_path.to_path_buf(),
        reason: "built without ONNX support".to_string(),
    })
}

/// Which artifact files exist for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    pub kind: FieldKind,
    pub vectorizer: bool,
    pub onnx_model: bool,
    pub labels: bool,
    pub linear_model: bool,
}

impl ArtifactStatus {
    /// Whether [`ModelStore::load`] would find every file it needs.
    pub fn is_complete(&self) -> bool {
        let classifier = if self.onnx_model {
            self.labels
        } else {
            self.linear_model
        };
        self.vectorizer && classifier
    }
}

/// Report artifact presence for every field kind without loading anything.
pub fn artifact_status(config: &ModelConfig) -> Vec<ArtifactStatus> {
    FieldKind::ALL
        .iter()
        .map(|&kind| ArtifactStatus {
            kind,
            vectorizer: config.vectorizer_path(kind).is_file(),
            onnx_model: config.onnx_model_path(kind).is_file(),
            labels: config.labels_path(kind).is_file(),
            linear_model: config.linear_model_path(kind).is_file(),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    pub(crate) const VECTORIZER: &str = r#"{
        "vocabulary": { "milk": 0, "uber": 1, "bread": 2, "taxi": 3 },
        "norm": null
    }"#;

    pub(crate) const LINEAR: &str = r#"{
        "classes": ["Groceries", "Transport"],
        "coef": [[1.0, 0.0, 1.0, 0.0], [0.0, 1.0, 0.0, 1.0]],
        "intercept": [0.0, 0.0]
    }"#;

    /// Write a vectorizer and linear model for each kind into `dir`.
    pub(crate) fn write_artifacts(dir: &Path, kinds: &[FieldKind]) {
        for kind in kinds {
            std::fs::write(dir.join(format!("{}_vectorizer.json", kind)), VECTORIZER).unwrap();
            std::fs::write(dir.join(format!("{}_model.json", kind)), LINEAR).unwrap();
        }
    }

    fn config_for(dir: &Path) -> ModelConfig {
        ModelConfig {
            model_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_requested_fields() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &[FieldKind::Category, FieldKind::Merchant]);

        let store = ModelStore::load(&config_for(dir.path()), &[FieldKind::Category]).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains(FieldKind::Category));
        assert!(!store.contains(FieldKind::Merchant));
        assert!(matches!(
            store.get(FieldKind::Merchant),
            Err(ModelError::UnrecognizedField(_))
        ));
    }

    #[test]
    fn test_missing_classifier_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &[FieldKind::Category]);
        std::fs::remove_file(dir.path().join("category_model.json")).unwrap();

        let err = ModelStore::load(&config_for(dir.path()), &[FieldKind::Category])
            .err()
            .unwrap();
        assert!(matches!(err, ModelError::MissingArtifact { field, .. } if field == "category"));
    }

    #[test]
    fn test_missing_vectorizer_fails_whole_store() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &[FieldKind::Merchant, FieldKind::Amount]);

        let result = ModelStore::load(&config_for(dir.path()), &FieldKind::ALL);
        assert!(matches!(result, Err(ModelError::MissingArtifact { .. })));
    }

    #[test]
    fn test_onnx_without_labels_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &[FieldKind::Date]);
        std::fs::write(dir.path().join("date_model.onnx"), b"not really onnx").unwrap();

        let err = ModelStore::load(&config_for(dir.path()), &[FieldKind::Date])
            .err()
            .unwrap();
        match err {
            ModelError::MissingArtifact { path, .. } => {
                assert_eq!(path, dir.path().join("date_labels.txt"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_width_mismatch_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &[FieldKind::Amount]);
        std::fs::write(
            dir.path().join("amount_vectorizer.json"),
            r#"{ "vocabulary": { "total": 0 } }"#,
        )
        .unwrap();

        let result = ModelStore::load(&config_for(dir.path()), &[FieldKind::Amount]);
        assert!(matches!(result, Err(ModelError::InvalidArtifact { .. })));
    }

    #[test]
    fn test_artifact_status() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &[FieldKind::Category]);
        std::fs::write(dir.path().join("merchant_vectorizer.json"), VECTORIZER).unwrap();

        let status = artifact_status(&config_for(dir.path()));
        assert_eq!(status.len(), 4);

        let category = status.iter().find(|s| s.kind == FieldKind::Category).unwrap();
        assert!(category.is_complete());
        let merchant = status.iter().find(|s| s.kind == FieldKind::Merchant).unwrap();
        assert!(merchant.vectorizer);
        assert!(!merchant.is_complete());
    }
}
