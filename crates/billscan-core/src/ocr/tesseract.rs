//! OCR backend using Tesseract through `leptess`.

use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat};
use leptess::LepTess;
use tracing::info;

use crate::error::OcrError;

use super::engine::OcrBackend;

/// Tesseract with tessdata from a directory. A fresh handle is created per
/// image since `LepTess` is not shareable across threads.
pub struct TesseractBackend {
    data_dir: PathBuf,
    language: String,
}

impl TesseractBackend {
    /// Check that the language data loads, then keep the settings.
    pub fn new(data_dir: PathBuf, language: &str) -> Result<Self, OcrError> {
        let backend = Self {
            data_dir,
            language: language.to_string(),
        };
        backend.handle()?;
        info!(
            "Tesseract ready with '{}' from {}",
            backend.language,
            backend.data_dir.display()
        );
        Ok(backend)
    }

    fn handle(&self) -> Result<LepTess, OcrError> {
        let data_path = self.data_dir.to_string_lossy();
        LepTess::new(Some(data_path.as_ref()), &self.language)
            .map_err(|e| OcrError::ModelLoad(format!("tesseract: {}", e)))
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| OcrError::Preprocessing(e.to_string()))?;

        let mut tess = self.handle()?;
        tess.set_image_from_mem(png.get_ref())
            .map_err(|e| OcrError::Engine(format!("tesseract: {}", e)))?;
        tess.get_utf8_text()
            .map_err(|e| OcrError::Engine(format!("tesseract: {}", e)))
    }
}
