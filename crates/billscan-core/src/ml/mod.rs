//! Classical ML field prediction.
//!
//! Each field kind has a TF-IDF vectorizer and a classifier stored side by
//! side in the model directory. The [`ModelStore`] loads them once; the
//! [`FieldPredictor`] runs text through a vectorizer and its classifier.

pub mod classifier;
mod pipeline;
mod predictor;
pub mod store;
pub mod vectorizer;

pub use classifier::{ClassScores, Classifier, LinearClassifier, OnnxClassifier};
pub use pipeline::{build_extractor, HybridExtractor, MlExtractor};
pub use predictor::{FieldPredictor, Prediction};
pub use store::{artifact_status, ArtifactStatus, FieldModel, ModelStore};
pub use vectorizer::TfidfVectorizer;
