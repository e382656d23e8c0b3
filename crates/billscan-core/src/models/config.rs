//! Configuration for the extraction service.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::models::bill::{ExtractionMode, FieldKind};

/// Main configuration for billscan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillscanConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Text extraction configuration.
    pub extraction: ExtractionConfig,

    /// Model artifact configuration.
    pub models: ModelConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Generation endpoint configuration.
    pub llm: LlmConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind: String,

    /// Maximum accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Text extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Which pipeline `/process_bill` runs.
    pub mode: ExtractionMode,
}

/// Model artifact locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing `<field>_model.*` and `<field>_vectorizer.json`.
    pub model_dir: PathBuf,

    /// ONNX Runtime intra-op threads per classifier.
    pub num_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            num_threads: 1,
        }
    }
}

impl ModelConfig {
    /// Path of the vectorizer artifact for a field.
    pub fn vectorizer_path(&self, field: FieldKind) -> PathBuf {
        self.model_dir.join(format!("{}_vectorizer.json", field))
    }

    /// Path of the ONNX classifier for a field.
    pub fn onnx_model_path(&self, field: FieldKind) -> PathBuf {
        self.model_dir.join(format!("{}_model.onnx", field))
    }

    /// Path of the label list accompanying an ONNX classifier.
    pub fn labels_path(&self, field: FieldKind) -> PathBuf {
        self.model_dir.join(format!("{}_labels.txt", field))
    }

    /// Path of the JSON linear classifier for a field.
    pub fn linear_model_path(&self, field: FieldKind) -> PathBuf {
        self.model_dir.join(format!("{}_model.json", field))
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Load an OCR engine at startup.
    pub enabled: bool,

    /// Engine data directory (ONNX models and dictionary, or tessdata).
    pub data_dir: PathBuf,

    /// Recognition language (Tesseract engine only).
    pub language: String,

    /// Adaptive threshold neighbourhood size, in pixels. Forced odd.
    pub block_size: u32,

    /// Constant subtracted from the local mean.
    pub threshold_c: i32,

    /// Upper bound on a single recognition, in seconds.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: PathBuf::from("ocr"),
            language: "eng".to_string(),
            block_size: 15,
            threshold_c: 5,
            timeout_secs: 30,
        }
    }
}

/// Generation endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Full URL of the streaming generate endpoint.
    pub endpoint: String,

    /// Model name sent with each request.
    pub model: String,

    /// Upper bound on one generation, in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "mistral".to_string(),
            timeout_secs: 120,
        }
    }
}

impl BillscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `BILLSCAN_*` environment overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using an arbitrary lookup; unset keys are left alone.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("BILLSCAN_BIND") {
            self.server.bind = bind;
        }
        if let Some(mode) = lookup("BILLSCAN_MODE") {
            self.extraction.mode = mode.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "BILLSCAN_MODE".to_string(),
                value: mode.clone(),
            })?;
        }
        if let Some(dir) = lookup("BILLSCAN_MODEL_DIR") {
            self.models.model_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("BILLSCAN_OCR_DATA_DIR").or_else(|| lookup("TESSDATA_PREFIX")) {
            self.ocr.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("BILLSCAN_LLM_URL") {
            self.llm.endpoint = url;
        }
        if let Some(model) = lookup("BILLSCAN_LLM_MODEL") {
            self.llm.model = model;
        }

        debug!("Configuration after environment overrides: {:?}", self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "extraction": { "mode": "ml" }, "ocr": { "block_size": 21 } }"#)
            .unwrap();

        let config = BillscanConfig::from_file(&path).unwrap();
        assert_eq!(config.extraction.mode, ExtractionMode::Ml);
        assert_eq!(config.ocr.block_size, 21);
        assert_eq!(config.ocr.threshold_c, 5);
        assert_eq!(config.llm.model, "mistral");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BillscanConfig::default();
        config.server.bind = "127.0.0.1:9000".to_string();
        config.save(&path).unwrap();

        let loaded = BillscanConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.bind, "127.0.0.1:9000");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BILLSCAN_MODE", "hybrid"),
            ("BILLSCAN_MODEL_DIR", "/srv/models"),
            ("TESSDATA_PREFIX", "/usr/share/tessdata"),
        ]
        .into_iter()
        .collect();

        let mut config = BillscanConfig::default();
        config
            .apply_env_from(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.extraction.mode, ExtractionMode::Hybrid);
        assert_eq!(config.models.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.ocr.data_dir, PathBuf::from("/usr/share/tessdata"));
    }

    #[test]
    fn test_invalid_mode_env() {
        let mut config = BillscanConfig::default();
        let err = config
            .apply_env_from(|k| (k == "BILLSCAN_MODE").then(|| "neural".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn test_artifact_paths() {
        let models = ModelConfig::default();
        assert_eq!(
            models.vectorizer_path(FieldKind::Category),
            PathBuf::from("models/category_vectorizer.json")
        );
        assert_eq!(
            models.onnx_model_path(FieldKind::Merchant),
            PathBuf::from("models/merchant_model.onnx")
        );
    }
}
