// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — page preprocessing (binarization, denoising),
// orientation correction, and optical character recognition (OCR).

pub mod denoise;
pub mod engine;
pub mod orientation;
pub mod preprocess;
pub mod tesseract;

#[cfg(feature = "ocrs")]
pub mod ocr;

pub use engine::{RecognitionEngine, RecognitionRequest};
pub use orientation::{OrientationCandidate, OrientationResolver};
pub use preprocess::{PagePreprocessor, PreprocessedPage};
pub use tesseract::TesseractEngine;

#[cfg(feature = "ocrs")]
pub use ocr::{OcrsConfig, OcrsEngine};
