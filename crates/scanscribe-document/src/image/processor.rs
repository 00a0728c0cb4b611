// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — quarter-turn rotation and PNG encoding of in-memory page
// images using the `image` crate.

use image::{DynamicImage, ImageFormat};
use scanscribe_core::Rotation;
use scanscribe_core::error::ScanscribeError;

/// Transformations applied to a single in-memory page image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let upright = ImageProcessor::from_dynamic(page)
///     .rotate(Rotation::Deg90)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Rotate clockwise by a quarter-turn multiple.
    ///
    /// Pixels are only transposed and flipped, never resampled, so a full turn
    /// restores the original exactly.
    pub fn rotate(self, rotation: Rotation) -> Self {
        let image = match rotation {
            Rotation::Deg0 => self.image,
            Rotation::Deg90 => self.image.rotate90(),
            Rotation::Deg180 => self.image.rotate180(),
            Rotation::Deg270 => self.image.rotate270(),
        };
        Self { image }
    }
}

/// Encode a `DynamicImage` as PNG, returning the raw bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ScanscribeError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| ScanscribeError::Image(format!("PNG encoding failed: {}", err)))?;
    Ok(buffer)
}
