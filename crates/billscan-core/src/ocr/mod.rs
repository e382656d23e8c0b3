//! OCR for uploaded bill images.
//!
//! Every image is decoded, converted to grayscale and binarized with an
//! adaptive mean threshold before being handed to an [`OcrBackend`].

mod engine;
mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;
#[cfg(feature = "tesseract")]
mod tesseract;

pub use engine::{decode_image, sniff_mime, OcrAdapter, OcrBackend};
pub use preprocessing::ImagePreprocessor;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrBackend;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractBackend;

use std::sync::Arc;

use tracing::info;

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Build the adapter for this deployment, or `None` when OCR is disabled.
///
/// Tesseract is used when compiled in; otherwise the ONNX engine.
pub fn create_adapter(config: &OcrConfig) -> Result<Option<OcrAdapter>, OcrError> {
    if !config.enabled {
        info!("OCR disabled by configuration");
        return Ok(None);
    }

    let backend = create_backend(config)?;
    Ok(Some(OcrAdapter::new(backend, config)))
}

#[cfg(feature = "tesseract")]
fn create_backend(config: &OcrConfig) -> Result<Arc<dyn OcrBackend>, OcrError> {
    Ok(Arc::new(TesseractBackend::new(
        config.data_dir.clone(),
        &config.language,
    )?))
}

#[cfg(all(feature = "native", not(feature = "tesseract")))]
fn create_backend(config: &OcrConfig) -> Result<Arc<dyn OcrBackend>, OcrError> {
    Ok(Arc::new(PureOcrBackend::from_dir(&config.data_dir)?))
}

#[cfg(not(any(feature = "native", feature = "tesseract")))]
fn create_backend(_config: &OcrConfig) -> Result<Arc<dyn OcrBackend>, OcrError> {
    Err(OcrError::ModelLoad(
        "no OCR engine compiled in".to_string(),
    ))
}
