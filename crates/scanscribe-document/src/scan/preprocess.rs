// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page preparation before recognition — grayscale conversion, automatic
// (Otsu) inverted binarization, and non-local-means colour denoising.

use image::{DynamicImage, GrayImage};
use imageproc::contrast::{ThresholdType, threshold};
use tracing::{debug, info, instrument};

use crate::scan::denoise::{NlMeansParams, denoise_colored};

/// Cleans a rendered page for text recognition.
///
/// The pipeline runs in a fixed order:
///
/// 1. Convert the page to grayscale.
/// 2. Binarize it with an Otsu threshold, inverted so dark text becomes 255.
/// 3. Denoise the **original colour page** with non-local means
///    (luma strength 10, colour strength 10, template 7, search 21).
///
/// The denoised colour page is what gets returned and recognised. The binary
/// image from step 2 is only measured and logged; nothing downstream reads
/// it. That is how the conversion tool has always behaved, although the
/// binary page was most likely meant to be the recognition input. Changing
/// it alters every recognition result, so it stays as is until that is
/// decided deliberately.
#[derive(Debug, Clone)]
pub struct PagePreprocessor {
    params: NlMeansParams,
}

/// A page cleaned for recognition. Same dimensions as the rendered page.
#[derive(Debug, Clone)]
pub struct PreprocessedPage {
    image: DynamicImage,
}

impl PreprocessedPage {
    /// The denoised colour image handed to orientation and recognition.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

impl Default for PagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PagePreprocessor {
    /// Preprocessor with the fixed document denoise settings.
    pub fn new() -> Self {
        Self {
            params: NlMeansParams::DOCUMENT,
        }
    }

    /// Preprocessor with custom denoise settings (benchmarks and tests).
    pub fn with_params(params: NlMeansParams) -> Self {
        Self { params }
    }

    /// Run the full preparation pipeline on one rendered page.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn preprocess(&self, page: &DynamicImage) -> PreprocessedPage {
        info!("Preprocessing page");

        // Step 1: Grayscale conversion.
        let gray = page.to_luma8();

        // Step 2: Otsu threshold, inverted. Measured, then dropped.
        let otsu_level = otsu_threshold(&gray);
        let binary = binarize_inverted(&gray, otsu_level);
        let foreground = binary.pixels().filter(|p| p.0[0] == 255).count();
        let total = (binary.width() as usize * binary.height() as usize).max(1);
        debug!(
            otsu_level,
            foreground_ratio = foreground as f64 / total as f64,
            "Inverted Otsu binarization computed"
        );

        // Step 3: Denoise the colour page itself, not the binary one.
        let denoised = denoise_colored(&page.to_rgb8(), self.params);

        info!("Page preprocessed");
        PreprocessedPage {
            image: DynamicImage::ImageRgb8(denoised),
        }
    }
}

/// Map pixels above `level` to 0 and all others to 255.
pub fn binarize_inverted(gray: &GrayImage, level: u8) -> GrayImage {
    threshold(gray, level, ThresholdType::BinaryInverted)
}

/// Compute the Otsu threshold for a grayscale image.
///
/// Returns the level `t` that maximises the between-class variance (and so
/// minimises the intra-class variance) of the classes `<= t` and `> t`.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 0;
    }

    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background: f64 = 0.0;
    let mut weight_background: u64 = 0;
    let mut max_variance: f64 = 0.0;
    let mut best_threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}
