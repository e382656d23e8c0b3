//! ONNX inference layer for billscan.
//!
//! Field classifiers exported to ONNX are executed through the
//! [`InferenceBackend`] trait. The native build uses `ort` with the
//! XNNPACK execution provider.

mod backend;
mod error;
mod tensor;

pub use backend::InferenceBackend;
pub use error::InferenceError;
pub use tensor::{InputTensor, OutputTensor};

#[cfg(feature = "native")]
pub use backend::ort::OrtBackend;

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
