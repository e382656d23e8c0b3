//! Field classifiers: JSON linear models and ONNX exports.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;
use tracing::debug;

use billscan_inference::{InferenceBackend, InputTensor, OutputTensor};

use crate::error::ModelError;

/// Result of classifying one feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    /// Index into [`Classifier::classes`] of the winning label.
    pub index: usize,
    /// Per-class probabilities, when the model exposes them.
    pub probabilities: Option<Vec<f32>>,
}

impl ClassScores {
    /// Highest class probability, if known.
    pub fn confidence(&self) -> Option<f32> {
        self.probabilities
            .as_ref()
            .and_then(|p| p.get(self.index).copied())
    }
}

/// A trained classifier over fixed-width feature vectors.
pub trait Classifier: Send + Sync {
    /// Class labels in output order.
    fn classes(&self) -> &[String];

    /// Expected feature width, when the model declares one.
    fn n_features(&self) -> Option<usize>;

    /// Classify one feature vector.
    fn classify(&self, features: &[f32]) -> Result<ClassScores, ModelError>;
}

/// Index of the largest value; first wins on ties.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn softmax(scores: ArrayView1<f32>) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

#[derive(Debug, Deserialize)]
struct LinearModelFile {
    classes: Vec<String>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

/// Logistic-regression style linear model.
///
/// A single coefficient row with two classes is a binary model scored with
/// a sigmoid; otherwise there is one row per class and scores go through
/// a softmax.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    classes: Vec<String>,
    coef: Array2<f32>,
    intercept: Array1<f32>,
}

impl LinearClassifier {
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::InvalidArtifact {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|reason| ModelError::InvalidArtifact {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: LinearModelFile = serde_json::from_str(json).map_err(|e| e.to_string())?;

        let n_classes = file.classes.len();
        if n_classes < 2 {
            return Err(format!("need at least two classes, got {}", n_classes));
        }
        let rows = file.coef.len();
        let binary = rows == 1 && n_classes == 2;
        if !binary && rows != n_classes {
            return Err(format!(
                "{} coefficient rows for {} classes",
                rows, n_classes
            ));
        }
        if file.intercept.len() != rows {
            return Err(format!(
                "{} intercepts for {} coefficient rows",
                file.intercept.len(),
                rows
            ));
        }
        let width = file.coef[0].len();
        if width == 0 || file.coef.iter().any(|row| row.len() != width) {
            return Err("coefficient rows must be non-empty and equally wide".to_string());
        }

        let flat: Vec<f32> = file.coef.into_iter().flatten().collect();
        let coef = Array2::from_shape_vec((rows, width), flat).map_err(|e| e.to_string())?;

        Ok(Self {
            classes: file.classes,
            coef,
            intercept: Array1::from(file.intercept),
        })
    }
}

impl Classifier for LinearClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coef.ncols())
    }

    fn classify(&self, features: &[f32]) -> Result<ClassScores, ModelError> {
        if features.len() != self.coef.ncols() {
            return Err(ModelError::DimensionMismatch {
                expected: self.coef.ncols(),
                actual: features.len(),
            });
        }

        let x = ArrayView1::from(features);
        let scores = self.coef.dot(&x) + &self.intercept;

        let probabilities = if self.coef.nrows() == 1 {
            let p = sigmoid(scores[0]);
            vec![1.0 - p, p]
        } else {
            softmax(scores.view())
        };

        Ok(ClassScores {
            index: argmax(&probabilities),
            probabilities: Some(probabilities),
        })
    }
}

/// Classifier exported to ONNX, with labels from a sidecar text file.
pub struct OnnxClassifier<B: InferenceBackend> {
    backend: B,
    classes: Vec<String>,
    input_name: String,
}

impl<B: InferenceBackend> OnnxClassifier<B> {
    /// Wrap a loaded backend; `labels_path` holds one label per line.
    pub fn new(backend: B, labels_path: &Path) -> Result<Self, ModelError> {
        let classes = read_labels(labels_path)?;
        let input_name = backend
            .input_names()
            .first()
            .cloned()
            .ok_or_else(|| ModelError::InvalidArtifact {
                path: labels_path.to_path_buf(),
                reason: "model declares no inputs".to_string(),
            })?;

        debug!(
            "ONNX classifier with {} classes, input '{}'",
            classes.len(),
            input_name
        );

        Ok(Self {
            backend,
            classes,
            input_name,
        })
    }
}

fn read_labels(path: &Path) -> Result<Vec<String>, ModelError> {
    let invalid = |reason: String| ModelError::InvalidArtifact {
        path: PathBuf::from(path),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let labels: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    if labels.is_empty() {
        return Err(invalid("no labels".to_string()));
    }
    Ok(labels)
}

impl<B: InferenceBackend> Classifier for OnnxClassifier<B> {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn classify(&self, features: &[f32]) -> Result<ClassScores, ModelError> {
        let input = InputTensor::feature_row(features);
        let outputs = self.backend.run(&[(self.input_name.as_str(), input)])?;
        let n_classes = self.classes.len();

        // Prefer a probability output whose last axis spans the label set.
        let probabilities = outputs.iter().find_map(|(_, output)| {
            output
                .as_f32()
                .filter(|arr| arr.shape().last() == Some(&n_classes) && arr.len() == n_classes)
        });
        if let Some(arr) = probabilities {
            let probabilities: Vec<f32> = arr.iter().copied().collect();
            return Ok(ClassScores {
                index: argmax(&probabilities),
                probabilities: Some(probabilities),
            });
        }

        // Otherwise take the predicted label index.
        for (name, output) in &outputs {
            let Some(&label) = output.as_i64().and_then(|arr| arr.iter().next()) else {
                continue;
            };
            if label >= 0 && (label as usize) < n_classes {
                return Ok(ClassScores {
                    index: label as usize,
                    probabilities: None,
                });
            }
            debug!("Output '{}' label {} outside label set", name, label);
        }

        Err(ModelError::Inference(
            billscan_inference::InferenceError::OutputExtraction(format!(
                "no output matches {} classes",
                n_classes
            )),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const MULTICLASS: &str = r#"{
        "classes": ["Groceries", "Transport", "Other"],
        "coef": [[2.0, 0.0], [0.0, 2.0], [0.5, 0.5]],
        "intercept": [0.0, 0.0, 0.0]
    }"#;

    #[test]
    fn test_multiclass_softmax() {
        let model = LinearClassifier::from_json(MULTICLASS).unwrap();
        let scores = model.classify(&[0.0, 1.0]).unwrap();

        assert_eq!(model.classes()[scores.index], "Transport");
        let probs = scores.probabilities.as_ref().unwrap();
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(scores.confidence().unwrap() > 0.5);
    }

    #[test]
    fn test_binary_sigmoid() {
        let json = r#"{ "classes": ["no", "yes"], "coef": [[4.0]], "intercept": [-2.0] }"#;
        let model = LinearClassifier::from_json(json).unwrap();

        let low = model.classify(&[0.0]).unwrap();
        assert_eq!(low.index, 0);
        let high = model.classify(&[1.0]).unwrap();
        assert_eq!(high.index, 1);
        assert!((high.confidence().unwrap() - sigmoid(2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch() {
        let model = LinearClassifier::from_json(MULTICLASS).unwrap();
        let err = model.classify(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_rejects_shape_errors() {
        let one_class = r#"{ "classes": ["a"], "coef": [[1.0]], "intercept": [0.0] }"#;
        assert!(LinearClassifier::from_json(one_class).is_err());

        let ragged = r#"{ "classes": ["a", "b", "c"], "coef": [[1.0], [1.0, 2.0], [0.0]], "intercept": [0, 0, 0] }"#;
        assert!(LinearClassifier::from_json(ragged).is_err());

        let intercepts = r#"{ "classes": ["a", "b"], "coef": [[1.0]], "intercept": [0.0, 1.0] }"#;
        assert!(LinearClassifier::from_json(intercepts).is_err());
    }

    struct FixedBackend {
        inputs: Vec<String>,
        outputs: Vec<(String, OutputTensor)>,
    }

    impl InferenceBackend for FixedBackend {
        fn run(
            &self,
            inputs: &[(&str, InputTensor)],
        ) -> billscan_inference::Result<Vec<(String, OutputTensor)>> {
            assert_eq!(inputs[0].1.shape(), &[1, 2]);
            Ok(self.outputs.clone())
        }

        fn input_names(&self) -> &[String] {
            &self.inputs
        }

        fn output_names(&self) -> &[String] {
            &[]
        }
    }

    fn labels_file(labels: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(labels.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_onnx_probability_output() {
        let labels = labels_file("Groceries\nTransport\n");
        let backend = FixedBackend {
            inputs: vec!["float_input".to_string()],
            outputs: vec![
                (
                    "output_label".to_string(),
                    OutputTensor::Int64(ArrayD::from_shape_vec(vec![1], vec![1]).unwrap()),
                ),
                (
                    "output_probability".to_string(),
                    OutputTensor::Float32(
                        ArrayD::from_shape_vec(vec![1, 2], vec![0.25, 0.75]).unwrap(),
                    ),
                ),
            ],
        };

        let model = OnnxClassifier::new(backend, labels.path()).unwrap();
        let scores = model.classify(&[0.1, 0.2]).unwrap();

        assert_eq!(model.classes()[scores.index], "Transport");
        assert_eq!(scores.confidence(), Some(0.75));
    }

    #[test]
    fn test_onnx_label_only_output() {
        let labels = labels_file("a\nb\nc\n");
        let backend = FixedBackend {
            inputs: vec!["input".to_string()],
            outputs: vec![(
                "label".to_string(),
                OutputTensor::Int64(ArrayD::from_shape_vec(vec![1], vec![2]).unwrap()),
            )],
        };

        let model = OnnxClassifier::new(backend, labels.path()).unwrap();
        let scores = model.classify(&[0.0, 0.0]).unwrap();
        assert_eq!(scores.index, 2);
        assert_eq!(scores.confidence(), None);
    }

    #[test]
    fn test_empty_labels_file() {
        let labels = labels_file("\n\n");
        let backend = FixedBackend {
            inputs: vec!["input".to_string()],
            outputs: vec![],
        };
        assert!(matches!(
            OnnxClassifier::new(backend, labels.path()),
            Err(ModelError::InvalidArtifact { .. })
        ));
    }
}
