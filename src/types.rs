//! Core types for background classification and editing

use crate::{config::OutputFormat, error::Result, services::OutputFormatHandler};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, GenericImageView, ImageBuffer};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mask value for pixels classified as background
pub const BACKGROUND: u8 = 0;

/// Mask value for pixels classified as foreground
pub const FOREGROUND: u8 = 255;

/// Per-pixel background/foreground classification for one bitmap.
///
/// The mask is derived by a [`crate::segmentation::MaskPolicy`], consumed by
/// the compositor in the same pass, and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundMask {
    /// Row-major classification values ([`BACKGROUND`] or [`FOREGROUND`])
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl BackgroundMask {
    /// Create a mask from raw classification values
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Create an all-foreground mask for the given dimensions
    #[must_use]
    pub fn all_foreground(dimensions: (u32, u32)) -> Self {
        let len = (dimensions.0 as usize) * (dimensions.1 as usize);
        Self::new(vec![FOREGROUND; len], dimensions)
    }

    /// Whether the pixel at the given row-major index is background
    #[must_use]
    pub fn is_background(&self, index: usize) -> bool {
        self.data.get(index).is_some_and(|&value| value == BACKGROUND)
    }

    /// Number of classified pixels
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the mask covers zero pixels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert the mask to a grayscale image (useful for debugging output)
    pub fn to_image(&self) -> Result<ImageBuffer<image::Luma<u8>, Vec<u8>>> {
        let (width, height) = self.dimensions;
        ImageBuffer::from_raw(width, height, self.data.clone()).ok_or_else(|| {
            crate::error::OutfitError::processing("failed to create image from mask data")
        })
    }

    /// Get mask statistics
    #[must_use]
    pub fn statistics(&self) -> MaskStatistics {
        let total_pixels = self.data.len();
        let background_pixels = self.data.iter().filter(|&&value| value == BACKGROUND).count();
        let foreground_pixels = total_pixels - background_pixels;

        let total = total_pixels.max(1) as f32;
        MaskStatistics {
            total_pixels,
            foreground_pixels,
            background_pixels,
            foreground_ratio: foreground_pixels as f32 / total,
            background_ratio: background_pixels as f32 / total,
        }
    }
}

/// Statistics about a background mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    pub total_pixels: usize,
    pub foreground_pixels: usize,
    pub background_pixels: usize,
    pub foreground_ratio: f32,
    pub background_ratio: f32,
}

/// Result of a background editing operation
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// The edited image (RGBA, alpha or fill already applied)
    pub image: DynamicImage,

    /// The classification mask that drove the edit
    pub mask: BackgroundMask,

    /// Original image dimensions
    pub original_dimensions: (u32, u32),

    /// Processing metadata
    pub metadata: ProcessingMetadata,
}

impl ProcessedImage {
    /// Create a new processed image result
    #[must_use]
    pub fn new(
        image: DynamicImage,
        mask: BackgroundMask,
        original_dimensions: (u32, u32),
        metadata: ProcessingMetadata,
    ) -> Self {
        Self {
            image,
            mask,
            original_dimensions,
            metadata,
        }
    }

    /// Get image dimensions
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Get the timing breakdown for this operation
    #[must_use]
    pub fn timings(&self) -> &ProcessingTimings {
        &self.metadata.timings
    }

    /// Encode the image in the specified format
    pub fn to_bytes(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Png => {
                let mut buffer = Vec::new();
                let mut cursor = std::io::Cursor::new(&mut buffer);
                self.image.write_to(&mut cursor, image::ImageFormat::Png)?;
                Ok(buffer)
            },
            OutputFormat::Jpeg => {
                // JPEG carries no alpha; flatten to RGB first
                let mut buffer = Vec::new();
                let mut cursor = std::io::Cursor::new(&mut buffer);
                let rgb_image = self.image.to_rgb8();
                let mut jpeg_encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
                jpeg_encoder.encode_image(&rgb_image)?;
                Ok(buffer)
            },
            OutputFormat::WebP => {
                let mut buffer = Vec::new();
                let mut cursor = std::io::Cursor::new(&mut buffer);
                self.image.write_to(&mut cursor, image::ImageFormat::WebP)?;
                Ok(buffer)
            },
        }
    }

    /// Encode the image as a base64 data URI for JSON transport
    pub fn to_data_uri(&self, format: OutputFormat, quality: u8) -> Result<String> {
        let bytes = self.to_bytes(format, quality)?;
        Ok(format!(
            "data:{};base64,{}",
            OutputFormatHandler::mime_type(format),
            BASE64.encode(bytes)
        ))
    }

    /// Save the result as PNG with alpha channel
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Save in the specified format
    pub fn save<P: AsRef<Path>>(&self, path: P, format: OutputFormat, quality: u8) -> Result<()> {
        let bytes = self.to_bytes(format, quality)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Get the image as raw RGBA bytes
    #[must_use]
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.image.to_rgba8().into_raw()
    }
}

/// Timing breakdown for one background editing pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Image decoding from bytes (0 when processing a pre-decoded image)
    pub decode_ms: u64,

    /// Pixel classification pass (includes edge sampling when applicable)
    pub classify_ms: u64,

    /// Mask application (alpha rewrite or flat fill)
    pub composite_ms: u64,

    /// Final image encoding, when the caller requested bytes
    pub encode_ms: Option<u64>,

    /// Total end-to-end time
    pub total_ms: u64,
}

impl ProcessingTimings {
    /// One-line timing summary for logs
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Total: {}ms | Decode: {}ms | Classify: {}ms | Composite: {}ms",
            self.total_ms, self.decode_ms, self.classify_ms, self.composite_ms
        );
        if let Some(encode_ms) = self.encode_ms {
            summary.push_str(&format!(" | Encode: {encode_ms}ms"));
        }
        summary
    }
}

/// Metadata about one background editing operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Timing breakdown
    pub timings: ProcessingTimings,

    /// Classification policy that produced the mask
    pub policy: String,

    /// Composite mode that was applied
    pub mode: String,

    /// Output format the result is intended for
    pub output_format: String,
}

impl ProcessingMetadata {
    /// Create metadata for the given policy and mode
    #[must_use]
    pub fn new(policy: &str, mode: &str, output_format: OutputFormat) -> Self {
        Self {
            timings: ProcessingTimings::default(),
            policy: policy.to_string(),
            mode: mode.to_string(),
            output_format: output_format.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_creation() {
        let data = vec![FOREGROUND, BACKGROUND, BACKGROUND, FOREGROUND];
        let mask = BackgroundMask::new(data, (2, 2));

        assert_eq!(mask.dimensions, (2, 2));
        assert_eq!(mask.len(), 4);
        assert!(!mask.is_background(0));
        assert!(mask.is_background(1));
        assert!(!mask.is_background(99));
    }

    #[test]
    fn test_mask_statistics() {
        let data = vec![FOREGROUND, FOREGROUND, BACKGROUND, BACKGROUND];
        let mask = BackgroundMask::new(data, (2, 2));

        let stats = mask.statistics();
        assert_eq!(stats.total_pixels, 4);
        assert_eq!(stats.foreground_pixels, 2);
        assert_eq!(stats.background_pixels, 2);
        assert_eq!(stats.foreground_ratio, 0.5);
        assert_eq!(stats.background_ratio, 0.5);
    }

    #[test]
    fn test_mask_to_image_roundtrip() {
        let mask = BackgroundMask::new(vec![BACKGROUND, FOREGROUND, FOREGROUND, BACKGROUND], (2, 2));
        let image = mask.to_image().unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0).0[0], BACKGROUND);
        assert_eq!(image.get_pixel(1, 0).0[0], FOREGROUND);
    }

    #[test]
    fn test_processed_image_data_uri() {
        let rgba = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        let result = ProcessedImage::new(
            DynamicImage::ImageRgba8(rgba),
            BackgroundMask::all_foreground((2, 2)),
            (2, 2),
            ProcessingMetadata::new("threshold", "transparent", OutputFormat::Png),
        );

        let uri = result.to_data_uri(OutputFormat::Png, 90).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        // The payload must decode back to a valid PNG
        let payload = uri.split(',').nth(1).unwrap();
        let bytes = BASE64.decode(payload).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (2, 2));
    }

    #[test]
    fn test_timing_summary() {
        let timings = ProcessingTimings {
            decode_ms: 4,
            classify_ms: 10,
            composite_ms: 2,
            encode_ms: Some(7),
            total_ms: 23,
        };
        let summary = timings.summary();
        assert!(summary.contains("Total: 23ms"));
        assert!(summary.contains("Encode: 7ms"));
    }
}
