//! Unified background editing processor
//!
//! Drives the full decode → classify → composite pipeline for one image.
//! The pass is synchronous and runs to completion; there is no shared state
//! between invocations and no cancellation.

use crate::{
    compositor::{CompositeMode, Compositor},
    config::OutputFormat,
    error::{OutfitError, Result},
    segmentation::{MaskPolicy, PolicyConfig},
    services::{ImageIOService, OutputFormatHandler},
    types::{ProcessedImage, ProcessingMetadata, ProcessingTimings},
};
use image::{DynamicImage, GenericImageView};
use instant::Instant;
use tracing::debug;

/// Unified configuration for the background processor
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorConfig {
    /// Classification policy selection and constants
    #[serde(default)]
    pub policy: PolicyConfig,

    /// How background pixels are rewritten
    #[serde(default)]
    pub mode: CompositeMode,

    /// Output format for encoded results
    #[serde(default)]
    pub output_format: OutputFormat,

    /// JPEG quality (0-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Enable debug mode (additional logging)
    #[serde(default)]
    pub debug: bool,
}

fn default_jpeg_quality() -> u8 {
    90
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            mode: CompositeMode::default(),
            output_format: OutputFormat::default(),
            jpeg_quality: default_jpeg_quality(),
            debug: false,
        }
    }
}

impl ProcessorConfig {
    /// Create a new processor configuration builder
    #[must_use]
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::new()
    }

    /// Preset used when cleaning up garment photos for the wardrobe:
    /// absolute threshold, flat white fill.
    ///
    /// The constants here and in [`Self::portrait_cutout`] were tuned
    /// independently at their call sites; do not consolidate them.
    #[must_use]
    pub fn garment_whitening() -> Self {
        Self {
            policy: PolicyConfig::Threshold {
                white_cutoff: 240,
                brightness_cutoff: 0.90,
            },
            mode: CompositeMode::WHITE_FILL,
            output_format: OutputFormat::Png,
            jpeg_quality: default_jpeg_quality(),
            debug: false,
        }
    }

    /// Preset used when cutting a person out of their photo: edge-sampled
    /// estimate, transparent background.
    #[must_use]
    pub fn portrait_cutout() -> Self {
        Self {
            policy: PolicyConfig::EdgeSampled {
                color_cutoff: 40.0,
                brightness_cutoff: 0.85,
                max_samples: 200,
            },
            mode: CompositeMode::Transparent,
            output_format: OutputFormat::Png,
            jpeg_quality: default_jpeg_quality(),
            debug: false,
        }
    }
}

/// Builder for `ProcessorConfig`
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ProcessorConfig::default(),
        }
    }

    #[must_use]
    pub fn policy(mut self, policy: PolicyConfig) -> Self {
        self.config.policy = policy;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: CompositeMode) -> Self {
        self.config.mode = mode;
        self
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(0, 100);
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the processor configuration
    ///
    /// # Errors
    ///
    /// Returns `OutfitError` for out-of-range cutoffs, too few border
    /// samples, or an invalid JPEG quality.
    pub fn build(self) -> Result<ProcessorConfig> {
        if self.config.jpeg_quality > 100 {
            return Err(OutfitError::invalid_config("JPEG quality must be 0-100"));
        }
        match self.config.policy {
            PolicyConfig::Threshold {
                brightness_cutoff, ..
            } => {
                if !(0.0..=1.0).contains(&brightness_cutoff) {
                    return Err(OutfitError::invalid_config(
                        "brightness cutoff must be within 0.0-1.0",
                    ));
                }
            },
            PolicyConfig::EdgeSampled {
                color_cutoff,
                brightness_cutoff,
                max_samples,
            } => {
                if !(0.0..=1.0).contains(&brightness_cutoff) {
                    return Err(OutfitError::invalid_config(
                        "brightness cutoff must be within 0.0-1.0",
                    ));
                }
                if color_cutoff < 0.0 {
                    return Err(OutfitError::invalid_config(
                        "color cutoff must not be negative",
                    ));
                }
                if max_samples < 4 {
                    return Err(OutfitError::invalid_config(
                        "edge sampling needs at least 4 samples",
                    ));
                }
            },
        }

        Ok(self.config)
    }
}

impl Default for ProcessorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Background processor that applies one classification policy and one
/// composite mode to images
pub struct BackgroundProcessor {
    config: ProcessorConfig,
    policy: Box<dyn MaskPolicy>,
}

impl BackgroundProcessor {
    /// Create a processor for the given configuration
    ///
    /// # Errors
    ///
    /// Returns `OutfitError` when the configuration fails validation.
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        // Re-run builder validation so hand-constructed configs are checked too
        let config = ProcessorConfigBuilder { config }.build()?;
        let policy = config.policy.build();
        Ok(Self { config, policy })
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Classify and composite a pre-decoded image.
    ///
    /// # Errors
    ///
    /// Returns `OutfitError` for mask application failures.
    pub fn process_image(&self, image: &DynamicImage) -> Result<ProcessedImage> {
        let total_start = Instant::now();
        let original_dimensions = image.dimensions();
        let mut rgba = image.to_rgba8();

        let classify_start = Instant::now();
        let mask = self.policy.classify(&rgba);
        let classify_ms = classify_start.elapsed().as_millis() as u64;

        let composite_start = Instant::now();
        Compositor::apply(&mut rgba, &mask, self.config.mode)?;
        let composite_ms = composite_start.elapsed().as_millis() as u64;

        if self.config.debug {
            let stats = mask.statistics();
            debug!(
                policy = self.policy.name(),
                mode = self.config.mode.name(),
                background_ratio = stats.background_ratio,
                "background classification complete"
            );
        }

        OutputFormatHandler::validate_for_transparency(self.config.output_format);

        let mut metadata = ProcessingMetadata::new(
            self.policy.name(),
            self.config.mode.name(),
            self.config.output_format,
        );
        metadata.timings = ProcessingTimings {
            decode_ms: 0,
            classify_ms,
            composite_ms,
            encode_ms: None,
            total_ms: total_start.elapsed().as_millis() as u64,
        };

        Ok(ProcessedImage::new(
            DynamicImage::ImageRgba8(rgba),
            mask,
            original_dimensions,
            metadata,
        ))
    }

    /// Decode image bytes, then classify and composite.
    ///
    /// # Errors
    ///
    /// Returns `OutfitError` when the bytes do not decode as an image or
    /// mask application fails.
    pub fn process_bytes(&self, bytes: &[u8]) -> Result<ProcessedImage> {
        let decode_start = Instant::now();
        let image = ImageIOService::decode_bytes(bytes)?;
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        let mut result = self.process_image(&image)?;
        result.metadata.timings.decode_ms = decode_ms;
        result.metadata.timings.total_ms += decode_ms;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn white_corner_image() -> DynamicImage {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        DynamicImage::ImageRgba8(image)
    }

    #[test]
    fn test_threshold_transparent_end_to_end() {
        // 2x2 bitmap, top-left white, cutoff 240: only the top-left pixel
        // becomes transparent, row-major alpha [0, 255, 255, 255]
        let config = ProcessorConfig::builder()
            .policy(PolicyConfig::Threshold {
                white_cutoff: 240,
                brightness_cutoff: 0.90,
            })
            .mode(CompositeMode::Transparent)
            .build()
            .unwrap();
        let processor = BackgroundProcessor::new(config).unwrap();

        let result = processor.process_image(&white_corner_image()).unwrap();
        let rgba = result.image.to_rgba8();
        let alphas: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
        assert_eq!(alphas, vec![0, 255, 255, 255]);
    }

    #[test]
    fn test_transparent_output_is_stable_under_reprocessing() {
        let processor = BackgroundProcessor::new(ProcessorConfig::default()).unwrap();

        let once = processor.process_image(&white_corner_image()).unwrap();
        let twice = processor.process_image(&once.image).unwrap();

        assert_eq!(
            once.image.to_rgba8().as_raw(),
            twice.image.to_rgba8().as_raw(),
            "already-processed pixels must not change further"
        );
    }

    #[test]
    fn test_process_bytes_records_decode_time() {
        let mut bytes = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut bytes);
        white_corner_image()
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();

        let processor = BackgroundProcessor::new(ProcessorConfig::default()).unwrap();
        let result = processor.process_bytes(&bytes).unwrap();
        assert_eq!(result.original_dimensions, (2, 2));
        assert_eq!(result.metadata.policy, "threshold");
    }

    #[test]
    fn test_garment_whitening_preset_fills_white() {
        let processor = BackgroundProcessor::new(ProcessorConfig::garment_whitening()).unwrap();
        let result = processor.process_image(&white_corner_image()).unwrap();

        let rgba = result.image.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(rgba.get_pixel(1, 1).0, [0, 0, 0, 255]);
        assert_eq!(result.metadata.mode, "flat-fill");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = ProcessorConfig::builder()
            .policy(PolicyConfig::Threshold {
                white_cutoff: 240,
                brightness_cutoff: 1.5,
            })
            .build();
        assert!(result.is_err());

        let result = ProcessorConfig::builder()
            .policy(PolicyConfig::EdgeSampled {
                color_cutoff: 40.0,
                brightness_cutoff: 0.85,
                max_samples: 2,
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_portrait_cutout_preset() {
        let processor = BackgroundProcessor::new(ProcessorConfig::portrait_cutout()).unwrap();
        assert_eq!(processor.config().policy.name(), "edge-sampled");

        // Uniform border, distinct center: the center survives the cutout
        let mut image = RgbaImage::from_pixel(5, 5, Rgba([120, 120, 120, 255]));
        image.put_pixel(2, 2, Rgba([200, 30, 30, 255]));
        let result = processor
            .process_image(&DynamicImage::ImageRgba8(image))
            .unwrap();

        let rgba = result.image.to_rgba8();
        assert_eq!(rgba.get_pixel(2, 2).0[3], 255);
        assert_eq!(rgba.get_pixel(0, 0).0[3], 0);
    }
}
