// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document pipeline — render, preprocess, orient, and recognise every page of
// a source PDF, then write the accumulated text as one artifact.
//
// Per document:
//
//   Start → Rendering → (Preprocess → Orient → Rotate → Recognize)* → Writing → Done
//
// with `Failed` reachable from every step. A failure abandons only the
// document it happened in; the batch runner logs it and moves on.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use scanscribe_core::error::{Result, ScanscribeError};
use scanscribe_core::human_errors::humanize_error;
use scanscribe_core::{
    AppConfig, BatchReport, DocumentOutcome, EngineMode, OutcomeStatus, RENDER_DPI, Rotation,
    SegmentationMode,
};
use tracing::{error, info, instrument};

use crate::image::processor::ImageProcessor;
use crate::pdf::raster::Rasterizer;
use crate::scan::engine::{RecognitionEngine, RecognitionRequest};
use crate::scan::orientation::OrientationResolver;
use crate::scan::preprocess::PagePreprocessor;

/// Recognition and naming settings for a run, taken from validated config.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub language: String,
    pub engine_mode: EngineMode,
    pub segmentation_mode: SegmentationMode,
    pub output_dir: PathBuf,
    pub output_prefix: String,
    pub output_suffix: String,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            language: config.ocr_lang.clone(),
            engine_mode: config.ocr_engine_mode,
            segmentation_mode: config.page_segmentation_mode,
            output_dir: config.output_folder.clone(),
            output_prefix: config.output_prefix.clone(),
            output_suffix: config.output_suffix.clone(),
        }
    }

    /// `{output_dir}/{prefix}{stem}{suffix}.txt` for a source document.
    pub fn artifact_path(&self, source: &Path) -> Result<PathBuf> {
        let stem = source_stem(source)?;
        Ok(self.output_dir.join(artifact_name(
            &self.output_prefix,
            &stem,
            &self.output_suffix,
            "txt",
        )))
    }
}

/// `{prefix}{stem}{suffix}.{extension}`.
pub fn artifact_name(prefix: &str, stem: &str, suffix: &str, extension: &str) -> String {
    format!("{prefix}{stem}{suffix}.{extension}")
}

/// File name of `source` without its extension.
pub fn source_stem(source: &Path) -> Result<String> {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ScanscribeError::Render(format!("{} has no file name", source.display()))
        })
}

/// Recognised text of one document, before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    /// Every page's text followed by `"\n"`, in page order.
    pub text: String,
    /// Rotation applied to each page, in page order.
    pub rotations: Vec<Rotation>,
}

/// A successfully converted document.
#[derive(Debug, Clone)]
pub struct DocumentOutput {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rotations: Vec<Rotation>,
}

impl DocumentOutput {
    pub fn page_count(&self) -> usize {
        self.rotations.len()
    }
}

/// Converts source PDFs to text artifacts.
pub struct DocumentPipeline<R, E> {
    rasterizer: R,
    engine: E,
    preprocessor: PagePreprocessor,
    settings: PipelineSettings,
}

impl<R: Rasterizer, E: RecognitionEngine> DocumentPipeline<R, E> {
    pub fn new(rasterizer: R, engine: E, settings: PipelineSettings) -> Self {
        Self {
            rasterizer,
            engine,
            preprocessor: PagePreprocessor::new(),
            settings,
        }
    }

    /// Replace the page preprocessor (e.g. smaller denoise windows in tests).
    pub fn with_preprocessor(mut self, preprocessor: PagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Render and recognise every page of `source`. Writes nothing.
    #[instrument(skip(self), fields(document = %source.display()))]
    pub fn recognize_document(&self, source: &Path) -> Result<DocumentText> {
        let pages = self.rasterizer.render(source, RENDER_DPI)?;
        let total = pages.len();

        let resolver = OrientationResolver::new(
            &self.engine,
            self.settings.engine_mode,
            self.settings.segmentation_mode,
        );
        let request = RecognitionRequest::with_language(
            self.settings.language.clone(),
            self.settings.engine_mode,
            self.settings.segmentation_mode,
        );

        let mut text = String::new();
        let mut rotations = Vec::with_capacity(total);

        for (index, page) in pages.into_iter().enumerate() {
            let page_number = index + 1;
            info!(page = page_number, total, "Processing page");

            let preprocessed = self.preprocessor.preprocess(&page);
            drop(page);

            let rotation = resolver.resolve(preprocessed.image())?;
            let upright = ImageProcessor::from_dynamic(preprocessed.into_image())
                .rotate(rotation)
                .into_dynamic();

            info!(page = page_number, "Performing OCR");
            let page_text = self.engine.recognize(&upright, &request)?;
            text.push_str(&page_text);
            text.push('\n');
            rotations.push(rotation);

            info!(page = page_number, total, rotation = %rotation, "Page processed");
        }

        Ok(DocumentText { text, rotations })
    }

    /// Convert one document and write its text artifact.
    ///
    /// The artifact is written to a temporary file next to its destination and
    /// renamed into place, so a failure never leaves a partial file behind.
    #[instrument(skip(self), fields(document = %source.display()))]
    pub fn process_document(&self, source: &Path) -> Result<DocumentOutput> {
        let output = self.settings.artifact_path(source)?;
        info!("Starting conversion");

        let recognized = self.recognize_document(source)?;

        info!(output = %output.display(), "Writing output");
        write_atomically(&output, recognized.text.as_bytes())?;
        info!("Text extracted and saved");

        Ok(DocumentOutput {
            source: source.to_path_buf(),
            output,
            rotations: recognized.rotations,
        })
    }

    /// Convert every source in order, isolating failures per document.
    pub fn run_batch(&self, sources: &[PathBuf]) -> BatchReport {
        let started_at = Utc::now();
        info!(count = sources.len(), "Processing documents");

        let documents = sources
            .iter()
            .map(|source| match self.process_document(source) {
                Ok(done) => DocumentOutcome {
                    source: done.source,
                    status: OutcomeStatus::Converted,
                    output: Some(done.output),
                    pages: done.rotations.len(),
                    rotations: done.rotations,
                    error: None,
                    suggestion: None,
                },
                Err(err) => {
                    error!(document = %source.display(), error = %err, "Document failed");
                    DocumentOutcome {
                        source: source.clone(),
                        status: OutcomeStatus::Failed,
                        output: None,
                        pages: 0,
                        rotations: Vec::new(),
                        error: Some(err.to_string()),
                        suggestion: Some(humanize_error(&err).suggestion),
                    }
                }
            })
            .collect();

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            documents,
        };
        info!(
            converted = report.converted_count(),
            failed = report.failed().count(),
            "All documents processed"
        );
        report
    }
}

/// List the `*.pdf` files directly inside `input_folder`, sorted by name.
///
/// A missing or empty folder is a configuration error: nothing would be
/// converted and the run would silently succeed otherwise.
pub fn discover_sources(input_folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(input_folder).map_err(|err| {
        ScanscribeError::Config(format!(
            "input folder {} cannot be read: {}",
            input_folder.display(),
            err
        ))
    })?;

    let mut any_entry = false;
    let mut sources = Vec::new();
    for entry in entries {
        let path = entry?.path();
        any_entry = true;
        if path.is_file() && has_extension(&path, "pdf") {
            sources.push(path);
        }
    }

    if !any_entry {
        return Err(ScanscribeError::Config(format!(
            "input folder {} is empty",
            input_folder.display()
        )));
    }

    sources.sort();
    Ok(sources)
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Write `contents` to `path` via a temporary file in the same directory.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| ScanscribeError::Io(err.error))?;
    Ok(())
}
