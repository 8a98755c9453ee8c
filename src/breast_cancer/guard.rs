//! Heuristic filter keeping non-ultrasound images away from the classifier.
//!
//! Breast ultrasounds are grayscale, mostly dark and high-contrast. The
//! checks run in order on the decoded image at its original size and the
//! first failing one is reported.

use std::fmt;

use image::RgbImage;

/// Mean absolute channel difference above which an image counts as colour.
const MAX_COLOR_VARIANCE: f64 = 15.0;
/// Mean grayscale intensity above which an image is too bright.
const MAX_MEAN_INTENSITY: f64 = 150.0;
/// Grayscale standard deviation below which an image is too flat.
const MIN_STD_DEV: f64 = 15.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Rejection {
    NonMedical { color_variance: f64 },
    TooBright { mean_intensity: f64 },
    TooFlat { std_dev: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NonMedical { color_variance } => write!(
                f,
                "Image detected as non-medical (Color variance: {color_variance:.1}). Please upload a grayscale ultrasound."
            ),
            Rejection::TooBright { mean_intensity } => write!(
                f,
                "Image is too bright (Mean intensity: {mean_intensity:.1}). Ultrasounds are typically darker."
            ),
            Rejection::TooFlat { std_dev } => write!(
                f,
                "Image is too flat/uniform (Std Dev: {std_dev:.1}). Ultrasounds have more contrast."
            ),
        }
    }
}

/// Pixel statistics the guard decides on.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImageStats {
    /// Average of the mean |R-G|, |R-B| and |G-B| differences.
    pub color_variance: f64,
    /// Mean of the per-pixel channel mean.
    pub mean_intensity: f64,
    /// Population standard deviation of the per-pixel channel mean.
    pub std_dev: f64,
}

impl ImageStats {
    pub fn measure(img: &RgbImage) -> Self {
        let n = f64::from(img.width()) * f64::from(img.height());
        if n == 0.0 {
            return Self {
                color_variance: 0.0,
                mean_intensity: 0.0,
                std_dev: 0.0,
            };
        }

        let (mut rg, mut rb, mut gb, mut sum) = (0.0, 0.0, 0.0, 0.0);
        for px in img.pixels() {
            let [r, g, b] = px.0.map(f64::from);
            rg += (r - g).abs();
            rb += (r - b).abs();
            gb += (g - b).abs();
            sum += (r + g + b) / 3.0;
        }
        let mean_intensity = sum / n;

        let squares: f64 = img
            .pixels()
            .map(|px| {
                let [r, g, b] = px.0.map(f64::from);
                let d = (r + g + b) / 3.0 - mean_intensity;
                d * d
            })
            .sum();

        Self {
            color_variance: (rg / n + rb / n + gb / n) / 3.0,
            mean_intensity,
            std_dev: (squares / n).sqrt(),
        }
    }
}

/// Accept the image or name the first check it fails.
pub fn inspect(img: &RgbImage) -> Result<ImageStats, Rejection> {
    let stats = ImageStats::measure(img);
    if stats.color_variance > MAX_COLOR_VARIANCE {
        return Err(Rejection::NonMedical {
            color_variance: stats.color_variance,
        });
    }
    if stats.mean_intensity > MAX_MEAN_INTENSITY {
        return Err(Rejection::TooBright {
            mean_intensity: stats.mean_intensity,
        });
    }
    if stats.std_dev < MIN_STD_DEV {
        return Err(Rejection::TooFlat {
            std_dev: stats.std_dev,
        });
    }
    Ok(stats)
}
