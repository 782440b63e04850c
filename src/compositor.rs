//! Mask application
//!
//! Rewrites classified background pixels in place: either punched out to
//! transparent alpha, or flattened to a fixed fill color. Foreground pixels
//! are never touched, which makes the transparent transform idempotent.

use crate::{
    error::{OutfitError, Result},
    types::BackgroundMask,
};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// How classified background pixels are rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum CompositeMode {
    /// Background pixels get alpha 0; color channels are left as-is
    Transparent,
    /// Background pixels get the fill color at full opacity
    FlatFill {
        /// RGB fill color
        color: [u8; 3],
    },
}

impl CompositeMode {
    /// Flat white fill, the garment-whitening default
    pub const WHITE_FILL: Self = Self::FlatFill {
        color: [255, 255, 255],
    };

    /// Stable mode name for logs and response metadata
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transparent => "transparent",
            Self::FlatFill { .. } => "flat-fill",
        }
    }
}

impl Default for CompositeMode {
    fn default() -> Self {
        Self::Transparent
    }
}

/// Applies a classification mask to a bitmap
pub struct Compositor;

impl Compositor {
    /// Rewrite background pixels in place according to the composite mode.
    ///
    /// # Errors
    ///
    /// Returns a processing error when the mask and image dimensions do not
    /// match.
    pub fn apply(
        image: &mut RgbaImage,
        mask: &BackgroundMask,
        mode: CompositeMode,
    ) -> Result<()> {
        if image.dimensions() != mask.dimensions {
            return Err(OutfitError::processing(format!(
                "image {}x{} and mask {}x{} dimensions do not match",
                image.width(),
                image.height(),
                mask.dimensions.0,
                mask.dimensions.1,
            )));
        }

        for (index, pixel) in image.pixels_mut().enumerate() {
            if !mask.is_background(index) {
                continue;
            }
            match mode {
                CompositeMode::Transparent => {
                    pixel.0[3] = 0;
                },
                CompositeMode::FlatFill { color } => {
                    pixel.0 = [color[0], color[1], color[2], 255];
                },
            }
        }

        Ok(())
    }
}
