//! Output format handling service

use crate::{config::OutputFormat, error::Result};
use image::{DynamicImage, ImageBuffer, RgbaImage};

/// Service for handling output format conversions
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Convert an RGBA image to the specified output format
    ///
    /// # Errors
    ///
    /// Currently infallible for the supported formats; kept fallible to
    /// match the signature of the encode step that follows it.
    pub fn convert_format(rgba_image: RgbaImage, format: OutputFormat) -> Result<DynamicImage> {
        match format {
            OutputFormat::Png | OutputFormat::WebP => Ok(DynamicImage::ImageRgba8(rgba_image)),
            OutputFormat::Jpeg => {
                // Convert RGBA to RGB by dropping alpha channel
                let (width, height) = rgba_image.dimensions();
                let mut rgb_image = ImageBuffer::new(width, height);

                for (x, y, pixel) in rgba_image.enumerate_pixels() {
                    rgb_image.put_pixel(x, y, image::Rgb([pixel[0], pixel[1], pixel[2]]));
                }

                Ok(DynamicImage::ImageRgb8(rgb_image))
            },
        }
    }

    /// Get the appropriate file extension for a given output format
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }

    /// Get the MIME type for a given output format
    #[must_use]
    pub fn mime_type(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// Check if a format supports transparency (alpha channel)
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png | OutputFormat::WebP => true,
            OutputFormat::Jpeg => false,
        }
    }

    /// Warn when a format cannot carry a transparent background
    pub fn validate_for_transparency(format: OutputFormat) {
        if !Self::supports_transparency(format) {
            log::warn!(
                "Output format {:?} does not support transparency. Removed backgrounds will appear with a solid background.",
                format
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_convert_format_png() {
        let rgba_image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        let converted = OutputFormatHandler::convert_format(rgba_image, OutputFormat::Png).unwrap();
        assert_eq!(converted.width(), 2);
        assert_eq!(converted.height(), 2);
    }

    #[test]
    fn test_convert_format_jpeg_drops_alpha() {
        let rgba_image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 128]));
        let converted =
            OutputFormatHandler::convert_format(rgba_image, OutputFormat::Jpeg).unwrap();

        match converted {
            DynamicImage::ImageRgb8(_) => {},
            _ => panic!("Expected RGB8 image for JPEG format"),
        }
    }

    #[test]
    fn test_get_extension() {
        assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
        assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Jpeg), "jpg");
        assert_eq!(OutputFormatHandler::get_extension(OutputFormat::WebP), "webp");
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(OutputFormatHandler::mime_type(OutputFormat::Png), "image/png");
        assert_eq!(OutputFormatHandler::mime_type(OutputFormat::Jpeg), "image/jpeg");
        assert_eq!(OutputFormatHandler::mime_type(OutputFormat::WebP), "image/webp");
    }

    #[test]
    fn test_supports_transparency() {
        assert!(OutputFormatHandler::supports_transparency(OutputFormat::Png));
        assert!(OutputFormatHandler::supports_transparency(OutputFormat::WebP));
        assert!(!OutputFormatHandler::supports_transparency(OutputFormat::Jpeg));
    }
}
