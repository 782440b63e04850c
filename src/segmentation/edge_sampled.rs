//! Edge-sampled background classification

use super::{brightness_fraction, MaskPolicy};
use crate::types::{BackgroundMask, BACKGROUND, FOREGROUND};
use image::RgbaImage;
use tracing::debug;

pub(super) fn default_color_cutoff() -> f32 {
    40.0
}

pub(super) fn default_brightness_cutoff() -> f32 {
    0.85
}

pub(super) fn default_max_samples() -> usize {
    200
}

/// Color distance from a border-sampled background estimate.
///
/// The background color is estimated as the arithmetic mean of R, G and B —
/// each averaged independently — over evenly spaced samples along the four
/// border lines. A pixel is background when its RGB Euclidean distance from
/// the estimate falls below `color_cutoff`, or when its mean brightness
/// fraction reaches `brightness_cutoff`.
///
/// Adapts to non-white backgrounds, but assumes the subject does not touch
/// the image border and that the border is uniform. It is a heuristic, not a
/// segmentation algorithm: it always yields a classification and never
/// reports low confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSampledPolicy {
    /// Maximum RGB Euclidean distance from the background estimate
    pub color_cutoff: f32,
    /// Mean-brightness fraction cutoff in [0, 1]
    pub brightness_cutoff: f32,
    /// Total number of border samples, spread over the four edges
    pub max_samples: usize,
}

impl EdgeSampledPolicy {
    /// Create a policy with explicit cutoffs and sample count
    #[must_use]
    pub fn new(color_cutoff: f32, brightness_cutoff: f32, max_samples: usize) -> Self {
        Self {
            color_cutoff,
            brightness_cutoff,
            max_samples,
        }
    }

    /// Estimate the background color from the image border.
    ///
    /// Samples are taken at evenly spaced positions along the top, bottom,
    /// left and right edges; each channel is averaged independently. The
    /// sample set is bounded by `max_samples` and discarded after the pass.
    #[must_use]
    pub fn estimate_background(&self, image: &RgbaImage) -> [f32; 3] {
        let (width, height) = image.dimensions();
        let per_edge = (self.max_samples / 4).max(1);

        let mut sum = [0.0f64; 3];
        let mut count = 0usize;

        let mut sample = |x: u32, y: u32| {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            sum[0] += f64::from(r);
            sum[1] += f64::from(g);
            sum[2] += f64::from(b);
            count += 1;
        };

        for i in 0..per_edge {
            let x = spread(i, per_edge, width);
            sample(x, 0);
            sample(x, height - 1);
        }
        for i in 0..per_edge {
            let y = spread(i, per_edge, height);
            sample(0, y);
            sample(width - 1, y);
        }

        let n = count.max(1) as f64;
        [
            (sum[0] / n) as f32,
            (sum[1] / n) as f32,
            (sum[2] / n) as f32,
        ]
    }

    /// Whether a pixel is background relative to the given estimate
    #[must_use]
    pub fn is_background(&self, r: u8, g: u8, b: u8, estimate: [f32; 3]) -> bool {
        let dr = f32::from(r) - estimate[0];
        let dg = f32::from(g) - estimate[1];
        let db = f32::from(b) - estimate[2];
        let distance = (dr * dr + dg * dg + db * db).sqrt();

        distance < self.color_cutoff || brightness_fraction(r, g, b) >= self.brightness_cutoff
    }
}

/// Evenly spaced sample position `i` of `n` within `0..len`
fn spread(i: usize, n: usize, len: u32) -> u32 {
    if n <= 1 || len <= 1 {
        return 0;
    }
    ((i as u64) * u64::from(len - 1) / ((n - 1) as u64)) as u32
}

impl Default for EdgeSampledPolicy {
    fn default() -> Self {
        Self {
            color_cutoff: default_color_cutoff(),
            brightness_cutoff: default_brightness_cutoff(),
            max_samples: default_max_samples(),
        }
    }
}

impl MaskPolicy for EdgeSampledPolicy {
    fn name(&self) -> &'static str {
        "edge-sampled"
    }

    fn classify(&self, image: &RgbaImage) -> BackgroundMask {
        let estimate = self.estimate_background(image);
        debug!(
            r = estimate[0],
            g = estimate[1],
            b = estimate[2],
            "estimated background color from border samples"
        );

        let mut data = Vec::with_capacity(image.pixels().len());
        for pixel in image.pixels() {
            let [r, g, b, _] = pixel.0;
            data.push(if self.is_background(r, g, b, estimate) {
                BACKGROUND
            } else {
                FOREGROUND
            });
        }
        BackgroundMask::new(data, image.dimensions())
    }
}
