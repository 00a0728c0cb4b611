// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Non-local-means denoising for colour page images.
//
// The page is split into a luma plane and two chroma planes (full-range
// BT.601 YCbCr). Each plane is filtered independently: every output pixel is
// the weighted mean of the pixels in a search window around it, weighted by
// how similar the template patch around each candidate is to the template
// patch around the pixel itself. Similar patches on either side of a stroke
// edge are rare, so edges survive while flat paper noise is averaged away.
//
// Patch distances are computed per search offset with a summed-area table,
// which makes the cost independent of the template size. Rows are filtered in
// independent bands on the rayon pool.

use image::{Rgb, RgbImage};
use rayon::prelude::*;
use tracing::debug;

/// Filter strengths and window sizes for [`denoise_colored`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlMeansParams {
    /// Filter strength for the luma plane. Larger removes more noise and detail.
    pub h_luma: f32,
    /// Filter strength for both chroma planes.
    pub h_color: f32,
    /// Side of the square patch compared between pixels (odd).
    pub template_window: u32,
    /// Side of the square area searched for similar patches (odd).
    pub search_window: u32,
}

impl NlMeansParams {
    /// Settings used for scanned pages before recognition.
    pub const DOCUMENT: Self = Self {
        h_luma: 10.0,
        h_color: 10.0,
        template_window: 7,
        search_window: 21,
    };
}

impl Default for NlMeansParams {
    fn default() -> Self {
        Self::DOCUMENT
    }
}

/// Output rows filtered per rayon task.
const BAND_ROWS: usize = 64;

/// Weights below `exp(-WEIGHT_CUTOFF)` (~1e-4) are treated as zero.
const WEIGHT_CUTOFF: f32 = 9.21;

/// Resolution of the weight lookup table, in entries per unit of mean squared
/// patch distance.
const LUT_STEPS_PER_UNIT: f32 = 4.0;

/// Denoise a colour image, preserving its dimensions.
pub fn denoise_colored(image: &RgbImage, params: NlMeansParams) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let [luma, cb, cr] = split_ycbcr(image);
    let template = params.template_window.max(1) as usize;
    let search = params.search_window.max(1) as usize;

    let (luma, (cb, cr)) = rayon::join(
        || denoise_plane(&luma, params.h_luma, template, search),
        || {
            rayon::join(
                || denoise_plane(&cb, params.h_color, template, search),
                || denoise_plane(&cr, params.h_color, template, search),
            )
        },
    );

    debug!(width, height, "Non-local-means denoise complete");
    merge_ycbcr(&luma, &cb, &cr)
}

// -- Planes -------------------------------------------------------------------

/// A single-channel floating-point image.
#[derive(Debug, Clone)]
struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Copy with a `margin`-pixel border replicating the edge pixels.
    fn padded(&self, margin: usize) -> Plane {
        let width = self.width + 2 * margin;
        let height = self.height + 2 * margin;
        let mut data = Vec::with_capacity(width * height);
        for py in 0..height {
            let sy = py.saturating_sub(margin).min(self.height - 1);
            let row = &self.data[sy * self.width..(sy + 1) * self.width];
            for px in 0..width {
                let sx = px.saturating_sub(margin).min(self.width - 1);
                data.push(row[sx]);
            }
        }
        Plane {
            width,
            height,
            data,
        }
    }

    #[inline]
    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }
}

fn split_ycbcr(image: &RgbImage) -> [Plane; 3] {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let mut planes = [
        Plane::new(width, height),
        Plane::new(width, height),
        Plane::new(width, height),
    ];
    for (i, pixel) in image.pixels().enumerate() {
        let [r, g, b] = pixel.0.map(f32::from);
        planes[0].data[i] = 0.299 * r + 0.587 * g + 0.114 * b;
        planes[1].data[i] = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
        planes[2].data[i] = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    }
    planes
}

fn merge_ycbcr(luma: &Plane, cb: &Plane, cr: &Plane) -> RgbImage {
    let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    let mut out = RgbImage::new(luma.width as u32, luma.height as u32);
    for (i, pixel) in out.pixels_mut().enumerate() {
        let y = luma.data[i];
        let cb = cb.data[i] - 128.0;
        let cr = cr.data[i] - 128.0;
        *pixel = Rgb([
            to_u8(y + 1.402 * cr),
            to_u8(y - 0.344_136 * cb - 0.714_136 * cr),
            to_u8(y + 1.772 * cb),
        ]);
    }
    out
}

// -- Filtering ----------------------------------------------------------------

/// `exp(-d / h²)` tabulated over the mean squared patch distance `d`.
struct WeightTable {
    weights: Vec<f32>,
}

impl WeightTable {
    fn new(h: f32) -> Self {
        let h2 = h * h;
        let len = (WEIGHT_CUTOFF * h2 * LUT_STEPS_PER_UNIT).ceil() as usize + 1;
        let weights = (0..len)
            .map(|i| (-(i as f32 / LUT_STEPS_PER_UNIT) / h2).exp())
            .collect();
        Self { weights }
    }

    #[inline]
    fn weight(&self, mean_sq_distance: f32) -> f32 {
        // Negative rounding noise saturates to index 0.
        let index = (mean_sq_distance * LUT_STEPS_PER_UNIT).round() as usize;
        self.weights.get(index).copied().unwrap_or(0.0)
    }
}

/// Geometry shared by every band of one plane.
struct Kernel<'a> {
    padded: &'a Plane,
    weights: WeightTable,
    width: usize,
    template_radius: usize,
    search_radius: usize,
    margin: usize,
}

fn denoise_plane(plane: &Plane, h: f32, template: usize, search: usize) -> Plane {
    if h <= 0.0 {
        return plane.clone();
    }

    let template_radius = template / 2;
    let search_radius = search / 2;
    let margin = template_radius + search_radius;
    let padded = plane.padded(margin);
    let kernel = Kernel {
        padded: &padded,
        weights: WeightTable::new(h),
        width: plane.width,
        template_radius,
        search_radius,
        margin,
    };

    let mut out = Plane::new(plane.width, plane.height);
    out.data
        .par_chunks_mut(BAND_ROWS * plane.width)
        .enumerate()
        .for_each(|(band, rows)| kernel.filter_band(band * BAND_ROWS, rows));
    out
}

impl Kernel<'_> {
    /// Filter output rows starting at `y0` into `rows`.
    fn filter_band(&self, y0: usize, rows: &mut [f32]) {
        let width = self.width;
        let band_height = rows.len() / width;
        let tr = self.template_radius;
        let template = 2 * tr + 1;
        let patch_area = (template * template) as f64;

        // Summed-area table over the band plus a template-radius apron.
        let table_width = width + 2 * tr;
        let table_height = band_height + 2 * tr;
        let stride = table_width + 1;
        let mut integral = vec![0f64; stride * (table_height + 1)];

        let mut weight_sum = vec![0f32; rows.len()];
        let mut value_sum = vec![0f32; rows.len()];

        let sr = self.search_radius as isize;
        // Padded coordinate of table cell (0, 0).
        let origin_x = self.margin - tr;
        let origin_y = y0 + self.margin - tr;

        for dy in -sr..=sr {
            for dx in -sr..=sr {
                for ty in 0..table_height {
                    let py = origin_y + ty;
                    let qy = (py as isize + dy) as usize;
                    let mut row_sum = 0f64;
                    for tx in 0..table_width {
                        let px = origin_x + tx;
                        let qx = (px as isize + dx) as usize;
                        let diff = self.padded.at(px, py) - self.padded.at(qx, qy);
                        row_sum += f64::from(diff * diff);
                        integral[(ty + 1) * stride + tx + 1] =
                            row_sum + integral[ty * stride + tx + 1];
                    }
                }

                for by in 0..band_height {
                    let r1 = by * stride;
                    let r2 = (by + template) * stride;
                    let qy = ((y0 + by + self.margin) as isize + dy) as usize;
                    for x in 0..width {
                        let ssd = integral[r2 + x + template] - integral[r1 + x + template]
                            - integral[r2 + x]
                            + integral[r1 + x];
                        let weight = self.weights.weight((ssd / patch_area) as f32);
                        if weight > 0.0 {
                            let qx = ((x + self.margin) as isize + dx) as usize;
                            let i = by * width + x;
                            weight_sum[i] += weight;
                            value_sum[i] += weight * self.padded.at(qx, qy);
                        }
                    }
                }
            }
        }

        // The zero offset always contributes weight 1, so the sum is never 0.
        for (i, out) in rows.iter_mut().enumerate() {
            *out = value_sum[i] / weight_sum[i];
        }
    }
}
