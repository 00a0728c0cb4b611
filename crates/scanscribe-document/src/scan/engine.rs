// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The recognition-engine seam: image in, text out, tuned by language,
// engine mode, and segmentation mode.

use image::DynamicImage;
use scanscribe_core::error::Result;
use scanscribe_core::{EngineMode, SegmentationMode};

/// Parameters for one recognition call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    /// Language hint. `None` lets the engine use its own default.
    pub language: Option<String>,
    pub engine_mode: EngineMode,
    pub segmentation_mode: SegmentationMode,
}

impl RecognitionRequest {
    /// Request used to score a candidate orientation: no language hint.
    pub fn probe(engine_mode: EngineMode, segmentation_mode: SegmentationMode) -> Self {
        Self {
            language: None,
            engine_mode,
            segmentation_mode,
        }
    }

    /// Request used for the final text of a page.
    pub fn with_language(
        language: impl Into<String>,
        engine_mode: EngineMode,
        segmentation_mode: SegmentationMode,
    ) -> Self {
        Self {
            language: Some(language.into()),
            engine_mode,
            segmentation_mode,
        }
    }
}

/// Extracts text from a single image.
///
/// Implementations must be deterministic for identical input if byte-identical
/// re-runs are expected. Errors abort the document being processed.
pub trait RecognitionEngine {
    fn recognize(&self, image: &DynamicImage, request: &RecognitionRequest) -> Result<String>;
}

impl<T: RecognitionEngine + ?Sized> RecognitionEngine for &T {
    fn recognize(&self, image: &DynamicImage, request: &RecognitionRequest) -> Result<String> {
        (**self).recognize(image, request)
    }
}

impl<T: RecognitionEngine + ?Sized> RecognitionEngine for Box<T> {
    fn recognize(&self, image: &DynamicImage, request: &RecognitionRequest) -> Result<String> {
        (**self).recognize(image, request)
    }
}
