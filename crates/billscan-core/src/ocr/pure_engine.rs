//! OCR backend using `pure-onnx-ocr`.

use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use tracing::{debug, info};

use crate::error::OcrError;

use super::engine::OcrBackend;

/// Rows closer than this many pixels are read as one line.
const ROW_HEIGHT: f32 = 20.0;

/// Detection + recognition models loaded from a data directory containing
/// `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
pub struct PureOcrBackend {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
}

impl PureOcrBackend {
    pub fn from_dir(data_dir: &Path) -> Result<Self, OcrError> {
        let det_path = data_dir.join("det.onnx");
        let rec_path = data_dir.join("latin_rec.onnx");
        let dict_path = data_dir.join("latin_dict.txt");

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.is_file() {
                return Err(OcrError::ModelLoad(format!(
                    "missing OCR file {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", data_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
        })
    }
}

impl OcrBackend for PureOcrBackend {
    fn name(&self) -> &'static str {
        "pure-onnx-ocr"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        // The detector expects three channels.
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

        let engine = self
            .engine
            .lock()
            .map_err(|e| OcrError::Engine(format!("engine lock poisoned: {}", e)))?;
        let results = engine
            .run_from_image(&rgb)
            .map_err(|e| OcrError::Engine(format!("pure-onnx-ocr: {}", e)))?;
        drop(engine);

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let mut lines: Vec<(f32, f32, String)> = results
            .iter()
            .map(|r| {
                let (x, y) = top_left(&r.bounding_box);
                (x, y, r.text.replace("[UNK]", " "))
            })
            .collect();

        sort_reading_order(&mut lines);

        Ok(lines
            .into_iter()
            .map(|(_, _, text)| text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32) {
    polygon
        .exterior()
        .coords()
        .fold((f32::INFINITY, f32::INFINITY), |(x, y), c| {
            (x.min(c.x as f32), y.min(c.y as f32))
        })
}

/// Top-to-bottom by row band, then left-to-right.
fn sort_reading_order(lines: &mut [(f32, f32, String)]) {
    lines.sort_by(|a, b| {
        let row_a = (a.1 / ROW_HEIGHT) as i32;
        let row_b = (b.1 / ROW_HEIGHT) as i32;
        row_a
            .cmp(&row_b)
            .then(a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reading_order() {
        let mut lines = vec![
            (200.0, 42.0, "12.00".to_string()),
            (10.0, 5.0, "ACME".to_string()),
            (10.0, 45.0, "Total".to_string()),
        ];
        sort_reading_order(&mut lines);

        let texts: Vec<&str> = lines.iter().map(|l| l.2.as_str()).collect();
        assert_eq!(texts, vec!["ACME", "Total", "12.00"]);
    }

    #[test]
    fn test_missing_models() {
        let dir = tempfile::tempdir().unwrap();
        let err = PureOcrBackend::from_dir(dir.path()).err().unwrap();
        assert!(matches!(err, OcrError::ModelLoad(msg) if msg.contains("det.onnx")));
    }
}
