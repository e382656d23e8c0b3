//! Error types for the inference layer.

use thiserror::Error;

/// Errors that can occur while loading or running an ONNX model.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The model bytes could not be turned into a session.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Session builder rejected an option.
    #[error("failed to create session: {0}")]
    SessionCreate(String),

    /// Input tensor has the wrong shape or element type.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The runtime failed while executing the graph.
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    /// An output could not be converted into an [`crate::OutputTensor`].
    #[error("failed to extract output: {0}")]
    OutputExtraction(String),

    /// I/O error when reading a model file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
