//! TF-IDF text vectorizer loaded from a JSON artifact.

use std::collections::HashMap;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::ModelError;

lazy_static! {
    // Words of two or more word characters.
    static ref WORD_TOKEN: Regex = Regex::new(r"\b\w\w+\b").unwrap();
}

/// Row normalization applied after weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

#[derive(Debug, Deserialize)]
struct VectorizerFile {
    vocabulary: HashMap<String, usize>,
    #[serde(default)]
    idf: Option<Vec<f32>>,
    #[serde(default = "default_true")]
    lowercase: bool,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
}

fn default_true() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// Deterministic transform from text to a fixed-width feature vector.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f32>>,
    lowercase: bool,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Option<Norm>,
    n_features: usize,
}

impl TfidfVectorizer {
    /// Load and validate a vectorizer artifact.
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

    /// Parse and validate a vectorizer from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: VectorizerFile = serde_json::from_str(json).map_err(|e| e.to_string())?;

        let n_features = file.vocabulary.len();
        if n_features == 0 {
            return Err("empty vocabulary".to_string());
        }
        if let Some((term, index)) = file.vocabulary.iter().find(|(_, index)| **index >= n_features) {
            return Err(format!(
                "term '{}' maps to column {} outside {} features",
                term, index, n_features
            ));
        }
        if let Some(idf) = &file.idf {
            if idf.len() != n_features {
                return Err(format!(
                    "idf has {} weights for {} features",
                    idf.len(),
                    n_features
                ));
            }
        }
        let (min_n, max_n) = file.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!("invalid ngram_range ({}, {})", min_n, max_n));
        }

        Ok(Self {
            vocabulary: file.vocabulary,
            idf: file.idf,
            lowercase: file.lowercase,
            ngram_range: file.ngram_range,
            sublinear_tf: file.sublinear_tf,
            norm: file.norm,
            n_features,
        })
    }

    /// Width of every vector produced by [`transform`](Self::transform).
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Vectorize one document. Out-of-vocabulary terms are ignored.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = WORD_TOKEN.find_iter(&text).map(|m| m.as_str()).collect();

        let mut features = vec![0.0f32; self.n_features];
        let (min_n, max_n) = self.ngram_range;
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                let term = window.join(" ");
                if let Some(&index) = self.vocabulary.get(&term) {
                    features[index] += 1.0;
                }
            }
        }

        if self.sublinear_tf {
            for value in features.iter_mut().filter(|v| **v > 0.0) {
                *value = 1.0 + value.ln();
            }
        }

        if let Some(idf) = &self.idf {
            for (value, weight) in features.iter_mut().zip(idf) {
                *value *= weight;
            }
        }

        let scale = match self.norm {
            Some(Norm::L2) => features.iter().map(|v| v * v).sum::<f32>().sqrt(),
            Some(Norm::L1) => features.iter().map(|v| v.abs()).sum::<f32>(),
            None => 1.0,
        };
        if scale > 0.0 {
            for value in features.iter_mut() {
                *value /= scale;
            }
        }

        features
    }
}
