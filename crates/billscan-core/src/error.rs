//! Error types for the billscan-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the billscan library.
#[derive(Error, Debug)]
pub enum BillscanError {
    /// Model store or prediction error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Generation endpoint error.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A blocking task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Task(String),
}

/// Errors related to the model store and field prediction.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A required artifact file is absent. Fatal at startup.
    #[error("missing artifact for field '{field}': {}", path.display())]
    MissingArtifact { field: String, path: PathBuf },

    /// An artifact exists but cannot be parsed or is inconsistent.
    #[error("invalid artifact {}: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    /// A field name outside the supported set, or one that was not loaded.
    #[error("unrecognized field: {0}")]
    UnrecognizedField(String),

    /// Feature vector width does not match the classifier.
    #[error("feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Inference error from the ONNX layer.
    #[error("inference error: {0}")]
    Inference(#[from] billscan_inference::InferenceError),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The uploaded bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// Thresholding or re-encoding failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// The recognition engine failed.
    #[error("OCR engine failed: {0}")]
    Engine(String),

    /// Engine models or data could not be loaded.
    #[error("failed to load OCR engine: {0}")]
    ModelLoad(String),

    /// Recognition did not finish within the configured bound.
    #[error("OCR timed out after {0}s")]
    Timeout(u64),

    /// OCR is switched off in this deployment.
    #[error("OCR is disabled")]
    Disabled,
}

/// Errors from the external generation endpoint.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The endpoint could not be reached.
    #[error("failed to reach generation endpoint: {0}")]
    Connect(String),

    /// The endpoint answered with a non-success status.
    #[error("generation endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response stream broke off mid-way.
    #[error("generation stream failed: {0}")]
    Stream(String),

    /// The stream did not complete within the configured bound.
    #[error("generation timed out after {0}s")]
    Timeout(u64),
}

/// Errors loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading or writing the file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid configuration in {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: String, value: String },
}

/// Result type for the billscan library.
pub type Result<T> = std::result::Result<T, BillscanError>;
