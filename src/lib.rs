#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Outfitgen
//!
//! Library and HTTP service behind an AI outfit try-on product: users
//! upload clothing images and a photo, and a hosted generative-image model
//! composites the virtual try-on. The pixel work done locally — the part
//! this crate actually owns — is heuristic background editing: per-pixel
//! background classification plus a compositing pass that either punches
//! the background out to transparency or flattens it to a fill color.
//!
//! ## Features
//!
//! - **Two classification policies**: a context-free whiteness threshold
//!   for garment photos, and an edge-sampled color-distance rule for
//!   person photos with arbitrary uniform backgrounds
//! - **Two composite modes**: transparent background or flat fill
//! - **Generative provider client**: base64 inline-image requests, with
//!   provider failures classified into stable categories
//! - **Hosted wardrobe store**: garment/outfit CRUD plus image uploads
//! - **HTTP server** (`server` feature): the JSON/multipart API surface
//! - **Vectorizer proxy** (`vectorize` feature): an unrelated sub-app
//!   forwarding images to a commercial vectorization API
//!
//! ## Quick start
//!
//! ```rust
//! use outfitgen::{remove_background_from_image, ProcessorConfig};
//! use image::{DynamicImage, RgbaImage, Rgba};
//!
//! # fn example() -> outfitgen::Result<()> {
//! let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
//!     64, 64, Rgba([240, 240, 240, 255]),
//! ));
//! let result = remove_background_from_image(&photo, &ProcessorConfig::portrait_cutout())?;
//! let png_bytes = result.to_bytes(outfitgen::OutputFormat::Png, 90)?;
//! # let _ = png_bytes;
//! # Ok(())
//! # }
//! ```
//!
//! ## Library vs server usage
//!
//! The pixel pipeline and the external-service clients work without the
//! server. To use only the library:
//!
//! ```toml
//! [dependencies]
//! outfitgen = { version = "0.2", default-features = false }
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod gemini;
pub mod processor;
pub mod segmentation;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
#[cfg(feature = "server")]
pub mod tracing_config;
pub mod types;
#[cfg(feature = "vectorize")]
pub mod vectorize;
pub mod wardrobe;

// Internal imports for lib functions
use tokio::io::AsyncRead;

// Public API exports
pub use compositor::{CompositeMode, Compositor};
pub use config::{AppConfig, GeminiConfig, OutputFormat, StorageConfig};
pub use error::{OutfitError, ProviderError, ProviderErrorKind, Result};
pub use gemini::{
    GeminiClient, GeneratedImage, GenerationRequest, ImageGenerator, ImagePayload,
};
pub use processor::{BackgroundProcessor, ProcessorConfig, ProcessorConfigBuilder};
pub use segmentation::{EdgeSampledPolicy, MaskPolicy, PolicyConfig, ThresholdPolicy};
pub use services::{ImageIOService, OutputFormatHandler};
pub use types::{
    BackgroundMask, MaskStatistics, ProcessedImage, ProcessingMetadata, ProcessingTimings,
};
pub use wardrobe::{GarmentKind, GarmentRecord, OutfitRecord, WardrobeStore};

#[cfg(feature = "server")]
pub use tracing_config::{TracingConfig, TracingFormat};

#[cfg(feature = "vectorize")]
pub use vectorize::{VectorFormat, VectorizeMode, VectorizeOptions, VectorizerClient};

/// Edit the background of an image provided as encoded bytes.
///
/// Decodes the bytes, runs the configured classification policy, applies
/// the composite mode, and returns the edited bitmap with its mask and
/// timings. Suitable for web handlers and memory-based processing.
pub fn remove_background_from_bytes(
    image_bytes: &[u8],
    config: &ProcessorConfig,
) -> Result<ProcessedImage> {
    let processor = BackgroundProcessor::new(config.clone())?;
    processor.process_bytes(image_bytes)
}

/// Edit the background of a pre-decoded image.
///
/// The most direct entry point: no decoding, no I/O, one synchronous pass
/// over the pixel buffer.
pub fn remove_background_from_image(
    image: &image::DynamicImage,
    config: &ProcessorConfig,
) -> Result<ProcessedImage> {
    let processor = BackgroundProcessor::new(config.clone())?;
    processor.process_image(image)
}

/// Edit the background of an image read from an async stream.
///
/// Reads the stream to the end, then processes it like
/// [`remove_background_from_bytes`].
pub async fn remove_background_from_reader<R: AsyncRead + Unpin>(
    mut reader: R,
    config: &ProcessorConfig,
) -> Result<ProcessedImage> {
    let mut buffer = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut buffer)
        .await
        .map_err(|e| OutfitError::processing(format!("failed to read from stream: {e}")))?;

    remove_background_from_bytes(&buffer, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn encoded_test_image() -> Vec<u8> {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        image.put_pixel(1, 1, Rgba([20, 20, 20, 255]));
        let mut bytes = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut bytes);
        DynamicImage::ImageRgba8(image)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_remove_background_from_bytes() {
        let result =
            remove_background_from_bytes(&encoded_test_image(), &ProcessorConfig::default())
                .unwrap();
        let rgba = result.image.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0).0[3], 0, "white pixel becomes transparent");
        assert_eq!(rgba.get_pixel(1, 1).0[3], 255, "dark pixel stays opaque");
    }

    #[tokio::test]
    async fn test_remove_background_from_reader() {
        let bytes = encoded_test_image();
        let reader = std::io::Cursor::new(bytes);
        let result = remove_background_from_reader(reader, &ProcessorConfig::default())
            .await
            .unwrap();
        assert_eq!(result.original_dimensions, (4, 4));
    }
}
