//! OCR adapter: decode, threshold, recognize.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::{BillscanError, OcrError, Result};
use crate::models::config::OcrConfig;

use super::preprocessing::ImagePreprocessor;

/// A text recognition engine.
///
/// Engines receive the already binarized image and return raw text.
pub trait OcrBackend: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    fn recognize(&self, image: &DynamicImage) -> std::result::Result<String, OcrError>;
}

/// Turns uploaded image bytes into trimmed text.
#[derive(Clone)]
pub struct OcrAdapter {
    backend: Arc<dyn OcrBackend>,
    preprocessor: ImagePreprocessor,
    timeout: Duration,
}

impl OcrAdapter {
    pub fn new(backend: Arc<dyn OcrBackend>, config: &OcrConfig) -> Self {
        Self {
            backend,
            preprocessor: ImagePreprocessor::new(config.block_size, config.threshold_c),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Decode, binarize and recognize on the calling thread.
    pub fn process(&self, bytes: &[u8]) -> std::result::Result<String, OcrError> {
        let start = Instant::now();

        let image = decode_image(bytes)?;
        let (width, height) = image.dimensions();
        let binary = self.preprocessor.binarize(&image);
        let text = self.backend.recognize(&binary)?;

        info!(
            "OCR ({}) on {}x{} image produced {} chars in {:?}",
            self.backend.name(),
            width,
            height,
            text.trim().len(),
            start.elapsed()
        );
        Ok(text.trim().to_string())
    }

    /// Run [`process`](Self::process) on the blocking pool, bounded by the
    /// configured timeout.
    pub async fn extract_text(&self, bytes: Vec<u8>) -> Result<String> {
        let adapter = self.clone();
        let task = tokio::task::spawn_blocking(move || adapter.process(&bytes));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(e)) => Err(BillscanError::Task(e.to_string())),
            Err(_) => Err(OcrError::Timeout(self.timeout.as_secs()).into()),
        }
    }
}

/// Decode image bytes in any format the `image` crate recognizes.
pub fn decode_image(bytes: &[u8]) -> std::result::Result<DynamicImage, OcrError> {
    if bytes.is_empty() {
        return Err(OcrError::Decode("empty upload".to_string()));
    }
    let image = image::load_from_memory(bytes).map_err(|e| OcrError::Decode(e.to_string()))?;
    debug!("Decoded image {}x{}", image.width(), image.height());
    Ok(image)
}

/// MIME type sniffed from the leading bytes, if the format is known.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use image::ImageFormat;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Records what it was handed and returns fixed text.
    struct FixedBackend {
        text: String,
        seen: Mutex<Option<(u32, u32, bool)>>,
    }

    impl FixedBackend {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                seen: Mutex::new(None),
            }
        }
    }

    impl OcrBackend for FixedBackend {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn recognize(&self, image: &DynamicImage) -> std::result::Result<String, OcrError> {
            let luma = matches!(image, DynamicImage::ImageLuma8(_));
            *self.seen.lock().unwrap() = Some((image.width(), image.height(), luma));
            Ok(self.text.clone())
        }
    }

    struct SlowBackend;

    impl OcrBackend for SlowBackend {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<String, OcrError> {
            std::thread::sleep(Duration::from_millis(1500));
            Ok(String::new())
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::new_rgb8(width, height);
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        let backend = Arc::new(FixedBackend::new("unused"));
        let adapter = OcrAdapter::new(backend, &OcrConfig::default());

        let err = adapter.process(b"definitely not an image").unwrap_err();
        assert!(matches!(err, OcrError::Decode(_)));
        assert!(matches!(adapter.process(b""), Err(OcrError::Decode(_))));
    }

    #[test]
    fn test_backend_sees_binarized_image_and_text_is_trimmed() {
        let backend = Arc::new(FixedBackend::new("  ACME\nTotal 5.00 \n\n"));
        let adapter = OcrAdapter::new(backend.clone(), &OcrConfig::default());

        let text = adapter.process(&png_bytes(12, 7)).unwrap();
        assert_eq!(text, "ACME\nTotal 5.00");
        assert_eq!(*backend.seen.lock().unwrap(), Some((12, 7, true)));
    }

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(&png_bytes(1, 1)), Some("image/png"));
        assert_eq!(sniff_mime(b"plain text"), None);
    }

    #[tokio::test]
    async fn test_extract_text_async() {
        let adapter = OcrAdapter::new(Arc::new(FixedBackend::new("hello")), &OcrConfig::default());
        assert_eq!(adapter.extract_text(png_bytes(4, 4)).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_extract_text_timeout() {
        let config = OcrConfig {
            timeout_secs: 1,
            ..Default::default()
        };
        let adapter = OcrAdapter::new(Arc::new(SlowBackend), &config);

        let err = adapter.extract_text(png_bytes(4, 4)).await.unwrap_err();
        assert!(matches!(err, BillscanError::Ocr(OcrError::Timeout(1))));
    }
}
