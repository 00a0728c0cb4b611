// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanscribe-document — Page processing for Scanscribe.
//
// Provides page rasterisation (pdftoppm, with a lopdf page-count check), page
// preprocessing (binarization, non-local-means denoising), orientation
// correction, text recognition backends, the per-document conversion
// pipeline, DOCX export, and word-count tabulation.

pub mod export;
pub mod image;
pub mod pdf;
pub mod pipeline;
pub mod scan;
pub mod wordcount;

// Re-export the primary types so callers can use `scanscribe_document::DocumentPipeline` etc.
pub use export::DocxWriter;
pub use image::processor::ImageProcessor;
pub use pdf::raster::{PdftoppmRasterizer, Rasterizer};
pub use pdf::reader::PdfReader;
pub use pipeline::{DocumentOutput, DocumentPipeline, PipelineSettings, discover_sources};
pub use scan::engine::{RecognitionEngine, RecognitionRequest};
pub use scan::orientation::OrientationResolver;
pub use scan::preprocess::PagePreprocessor;
pub use scan::tesseract::TesseractEngine;

#[cfg(feature = "ocrs")]
pub use scan::ocr::{OcrsConfig, OcrsEngine};
