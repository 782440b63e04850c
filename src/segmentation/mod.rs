//! Pixel classification policies
//!
//! Two interchangeable heuristics decide, per pixel, whether it belongs to
//! the background: a context-free absolute threshold (garment whitening) and
//! an edge-sampled color-distance rule (portrait cutout). Both are
//! single-pass and infallible; a malformed bitmap is a precondition
//! violation of the decode step, not a condition handled here.

mod edge_sampled;
mod threshold;

pub use edge_sampled::EdgeSampledPolicy;
pub use threshold::ThresholdPolicy;

use crate::types::BackgroundMask;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// A per-pixel background/foreground classification rule.
///
/// Policies are heuristics, not segmentation algorithms: they always produce
/// a classification and never report confidence.
pub trait MaskPolicy: Send + Sync {
    /// Stable policy name for logs and response metadata
    fn name(&self) -> &'static str;

    /// Classify every pixel of the image
    fn classify(&self, image: &RgbaImage) -> BackgroundMask;
}

/// Serializable policy selection, used by request payloads and the
/// processor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum PolicyConfig {
    /// Absolute whiteness/brightness threshold
    #[serde(rename_all = "camelCase")]
    Threshold {
        /// Per-channel white cutoff (a pixel with all channels at or above
        /// this value is background)
        #[serde(default = "threshold::default_white_cutoff")]
        white_cutoff: u8,
        /// Mean-brightness fraction cutoff in [0, 1]
        #[serde(default = "threshold::default_brightness_cutoff")]
        brightness_cutoff: f32,
    },
    /// Color distance from a border-sampled background estimate
    #[serde(rename_all = "camelCase")]
    EdgeSampled {
        /// Maximum RGB Euclidean distance from the estimate
        #[serde(default = "edge_sampled::default_color_cutoff")]
        color_cutoff: f32,
        /// Mean-brightness fraction cutoff in [0, 1]
        #[serde(default = "edge_sampled::default_brightness_cutoff")]
        brightness_cutoff: f32,
        /// Total border samples, spread over the four edges
        #[serde(default = "edge_sampled::default_max_samples")]
        max_samples: usize,
    },
}

impl PolicyConfig {
    /// Construct the policy this configuration describes
    #[must_use]
    pub fn build(&self) -> Box<dyn MaskPolicy> {
        match *self {
            Self::Threshold {
                white_cutoff,
                brightness_cutoff,
            } => Box::new(ThresholdPolicy::new(white_cutoff, brightness_cutoff)),
            Self::EdgeSampled {
                color_cutoff,
                brightness_cutoff,
                max_samples,
            } => Box::new(EdgeSampledPolicy::new(
                color_cutoff,
                brightness_cutoff,
                max_samples,
            )),
        }
    }

    /// Policy name without building it
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Threshold { .. } => "threshold",
            Self::EdgeSampled { .. } => "edge-sampled",
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let policy = ThresholdPolicy::default();
        Self::Threshold {
            white_cutoff: policy.white_cutoff,
            brightness_cutoff: policy.brightness_cutoff,
        }
    }
}

/// Mean brightness of a pixel as a fraction of full white
#[inline]
pub(crate) fn brightness_fraction(r: u8, g: u8, b: u8) -> f32 {
    (u32::from(r) + u32::from(g) + u32::from(b)) as f32 / (3.0 * 255.0)
}
