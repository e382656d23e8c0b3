//! Image preprocessing for OCR.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::debug;

/// Grayscale conversion followed by adaptive mean thresholding.
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    block_size: u32,
    c: i32,
}

impl ImagePreprocessor {
    /// `block_size` is rounded up to the next odd number, minimum 3.
    pub fn new(block_size: u32, c: i32) -> Self {
        let block_size = block_size.max(3) | 1;
        Self { block_size, c }
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Convert to single-channel intensity and binarize.
    pub fn binarize(&self, image: &DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        debug!(
            "Thresholding {}x{} image (block {}, c {})",
            width, height, self.block_size, self.c
        );

        let gray = image.to_luma8();
        DynamicImage::ImageLuma8(self.adaptive_threshold(&gray))
    }

    /// A pixel becomes white when it is brighter than the mean of its
    /// `block_size` neighbourhood minus `c`, black otherwise. The window is
    /// clipped at the image border.
    pub fn adaptive_threshold(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut result = GrayImage::new(width, height);
        if width == 0 || height == 0 {
            return result;
        }

        let integral = integral_image(image);
        let stride = width as usize + 1;
        let half = self.block_size / 2;

        for y in 0..height {
            let y0 = y.saturating_sub(half) as usize;
            let y1 = (y + half + 1).min(height) as usize;
            for x in 0..width {
                let x0 = x.saturating_sub(half) as usize;
                let x1 = (x + half + 1).min(width) as usize;

                let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                    - integral[y0 * stride + x1]
                    - integral[y1 * stride + x0];
                let count = ((y1 - y0) * (x1 - x0)) as u64;

                let mean = (sum / count) as i32;
                let pixel = image.get_pixel(x, y)[0] as i32;
                let output = if pixel > mean - self.c { 255 } else { 0 };
                result.put_pixel(x, y, Luma([output]));
            }
        }

        result
    }
}

/// Summed-area table with a zero first row and column.
fn integral_image(image: &GrayImage) -> Vec<u64> {
    let (width, height) = image.dimensions();
    let stride = width as usize + 1;
    let mut table = vec![0u64; stride * (height as usize + 1)];

    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += image.get_pixel(x as u32, y as u32)[0] as u64;
            table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_size_forced_odd() {
        assert_eq!(ImagePreprocessor::new(15, 5).block_size(), 15);
        assert_eq!(ImagePreprocessor::new(16, 5).block_size(), 17);
        assert_eq!(ImagePreprocessor::new(0, 5).block_size(), 3);
    }

    #[test]
    fn test_uniform_image_turns_white() {
        let gray = GrayImage::from_pixel(20, 10, Luma([120]));
        let out = ImagePreprocessor::new(15, 5).adaptive_threshold(&gray);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_dark_stroke_on_light_background() {
        let mut gray = GrayImage::from_pixel(30, 30, Luma([230]));
        for x in 5..25 {
            gray.put_pixel(x, 15, Luma([20]));
        }

        let out = ImagePreprocessor::new(15, 5).adaptive_threshold(&gray);
        assert_eq!(out.get_pixel(10, 15)[0], 0);
        assert_eq!(out.get_pixel(10, 5)[0], 255);
        assert_eq!(out.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_binarize_outputs_single_channel() {
        let rgb = DynamicImage::new_rgb8(8, 4);
        let out = ImagePreprocessor::new(15, 5).binarize(&rgb);
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
        assert_eq!(out.dimensions(), (8, 4));
    }

    #[test]
    fn test_integral_image_total() {
        let gray = GrayImage::from_pixel(4, 3, Luma([2]));
        let table = integral_image(&gray);
        assert_eq!(*table.last().unwrap(), 24);
    }
}
