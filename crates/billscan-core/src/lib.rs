//! Core library for bill and receipt field extraction.
//!
//! This crate provides:
//! - Rule-based extraction (regex fields, keyword category)
//! - ML field prediction from TF-IDF vectorizers and classifiers
//! - OCR of uploaded images with adaptive thresholding
//! - Extraction through an external streaming generation endpoint
//! - Configuration and error types shared by the server and CLI

pub mod error;
pub mod extract;
pub mod llm;
pub mod ml;
pub mod models;
pub mod ocr;

pub use error::{BillscanError, ConfigError, GenerationError, ModelError, OcrError, Result};
pub use extract::{BillExtractor, RuleExtractor};
pub use llm::{ChunkConsumer, ExtractionPrompt, GenerationClient};
pub use ml::{build_extractor, FieldPredictor, ModelStore, Prediction};
pub use models::bill::{
    BillResponse, ExtractedFields, ExtractionMode, FieldKind, FieldValue, UNKNOWN_MERCHANT,
};
pub use models::config::BillscanConfig;
pub use ocr::{create_adapter, OcrAdapter, OcrBackend};

/// Re-export inference types.
pub use billscan_inference::{InferenceBackend, InputTensor, OutputTensor};

#[cfg(feature = "native")]
pub use billscan_inference::OrtBackend;
