// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end pipeline behaviour with scripted rasteriser and engine fakes.
//
// Each fake page encodes its id in its longer side: `max(width, height) - 30`.
// The fake engine reads landscape images as long text and portrait images as
// short text, so the upright orientation is always the landscape one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};
use scanscribe_core::{
    EngineMode, OutcomeStatus, Result, Rotation, ScanscribeError, SegmentationMode,
};
use scanscribe_document::scan::denoise::NlMeansParams;
use scanscribe_document::{
    DocumentPipeline, PagePreprocessor, PipelineSettings, Rasterizer, RecognitionEngine,
    RecognitionRequest,
};

const BLANK: u32 = 0;
const FAILS: u32 = 9;

fn landscape(id: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(30 + id, 20, Rgb([240, 240, 235])))
}

fn portrait(id: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 30 + id, Rgb([240, 240, 235])))
}

/// Serves canned pages by source file name; unknown names fail to render.
#[derive(Default)]
struct FakeRasterizer {
    documents: HashMap<String, Vec<DynamicImage>>,
    dpis: RefCell<Vec<u32>>,
}

impl FakeRasterizer {
    fn with(mut self, name: &str, pages: Vec<DynamicImage>) -> Self {
        self.documents.insert(name.to_string(), pages);
        self
    }
}

impl Rasterizer for FakeRasterizer {
    fn render(&self, source: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        self.dpis.borrow_mut().push(dpi);
        let name = source.file_name().unwrap().to_string_lossy().into_owned();
        self.documents
            .get(&name)
            .cloned()
            .ok_or_else(|| ScanscribeError::Render(format!("cannot open {name}")))
    }
}

/// Deterministic engine keyed on page geometry. Records every call.
#[derive(Default)]
struct FakeEngine {
    calls: RefCell<Vec<(u32, u32, RecognitionRequest)>>,
}

impl RecognitionEngine for FakeEngine {
    fn recognize(&self, image: &DynamicImage, request: &RecognitionRequest) -> Result<String> {
        let (width, height) = (image.width(), image.height());
        self.calls.borrow_mut().push((width, height, request.clone()));

        let id = width.max(height) - 30;
        match id {
            BLANK => Ok(String::new()),
            FAILS => Err(ScanscribeError::Ocr("engine crashed".into())),
            _ if request.language.is_none() => {
                Ok(if width > height { "x".repeat(50) } else { "x".repeat(5) })
            }
            _ => Ok(format!("page {id}")),
        }
    }
}

impl FakeEngine {
    fn final_calls(&self) -> Vec<(u32, u32, RecognitionRequest)> {
        self.calls
            .borrow()
            .iter()
            .filter(|(_, _, r)| r.language.is_some())
            .cloned()
            .collect()
    }
}

fn settings(output_dir: &Path) -> PipelineSettings {
    PipelineSettings {
        language: "eng".into(),
        engine_mode: EngineMode(1),
        segmentation_mode: SegmentationMode(6),
        output_dir: output_dir.to_path_buf(),
        output_prefix: "ocr_".into(),
        output_suffix: "_text".into(),
    }
}

fn pipeline<'a>(
    rasterizer: &'a FakeRasterizer,
    engine: &'a FakeEngine,
    output_dir: &Path,
) -> DocumentPipeline<&'a FakeRasterizer, &'a FakeEngine> {
    DocumentPipeline::new(rasterizer, engine, settings(output_dir)).with_preprocessor(
        PagePreprocessor::with_params(NlMeansParams {
            template_window: 3,
            search_window: 5,
            ..NlMeansParams::DOCUMENT
        }),
    )
}

fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn pages_are_written_in_source_order() {
    let out = tempfile::tempdir().unwrap();
    let rasterizer =
        FakeRasterizer::default().with("three.pdf", vec![landscape(1), landscape(2), landscape(3)]);
    let engine = FakeEngine::default();

    let done = pipeline(&rasterizer, &engine, out.path())
        .process_document(Path::new("in/three.pdf"))
        .unwrap();

    assert_eq!(done.output, out.path().join("ocr_three_text.txt"));
    assert_eq!(done.page_count(), 3);
    assert_eq!(
        std::fs::read_to_string(&done.output).unwrap(),
        "page 1\npage 2\npage 3\n"
    );
    assert_eq!(*rasterizer.dpis.borrow(), vec![300]);
}

#[test]
fn failed_document_is_isolated_and_leaves_no_artifact() {
    let out = tempfile::tempdir().unwrap();
    let rasterizer = FakeRasterizer::default()
        .with("a.pdf", vec![landscape(1)])
        .with("c.pdf", vec![landscape(3)]);
    let engine = FakeEngine::default();

    let sources: Vec<PathBuf> = ["a.pdf", "b.pdf", "c.pdf"].iter().map(PathBuf::from).collect();
    let report = pipeline(&rasterizer, &engine, out.path()).run_batch(&sources);

    assert_eq!(report.converted_count(), 2);
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].source, PathBuf::from("b.pdf"));
    assert_eq!(failed[0].status, OutcomeStatus::Failed);
    assert!(failed[0].output.is_none());
    assert!(failed[0].error.as_deref().unwrap().contains("cannot open b.pdf"));
    assert!(failed[0].suggestion.is_some());

    assert_eq!(output_files(out.path()), vec!["ocr_a_text.txt", "ocr_c_text.txt"]);
}

#[test]
fn engine_failure_mid_document_discards_earlier_pages() {
    let out = tempfile::tempdir().unwrap();
    let rasterizer = FakeRasterizer::default()
        .with("mixed.pdf", vec![landscape(1), landscape(FAILS), landscape(2)]);
    let engine = FakeEngine::default();

    let err = pipeline(&rasterizer, &engine, out.path())
        .process_document(Path::new("mixed.pdf"))
        .unwrap_err();

    assert!(matches!(err, ScanscribeError::Ocr(_)));
    assert!(output_files(out.path()).is_empty());
}

#[test]
fn blank_page_keeps_zero_rotation_and_contributes_a_newline() {
    let out = tempfile::tempdir().unwrap();
    let rasterizer =
        FakeRasterizer::default().with("mostly.pdf", vec![landscape(1), landscape(BLANK), landscape(2)]);
    let engine = FakeEngine::default();

    let done = pipeline(&rasterizer, &engine, out.path())
        .process_document(Path::new("mostly.pdf"))
        .unwrap();

    assert_eq!(done.rotations, vec![Rotation::Deg0; 3]);
    assert_eq!(std::fs::read_to_string(&done.output).unwrap(), "page 1\n\npage 2\n");
}

#[test]
fn sideways_page_is_turned_upright_before_recognition() {
    let out = tempfile::tempdir().unwrap();
    let rasterizer = FakeRasterizer::default().with("turned.pdf", vec![portrait(4)]);
    let engine = FakeEngine::default();

    let done = pipeline(&rasterizer, &engine, out.path())
        .process_document(Path::new("turned.pdf"))
        .unwrap();

    assert_eq!(done.rotations, vec![Rotation::Deg90]);
    let finals = engine.final_calls();
    assert_eq!(finals.len(), 1);
    assert_eq!((finals[0].0, finals[0].1), (34, 20));
    assert_eq!(std::fs::read_to_string(&done.output).unwrap(), "page 4\n");
}

#[test]
fn probes_omit_language_and_final_pass_uses_configured_settings() {
    let out = tempfile::tempdir().unwrap();
    let rasterizer = FakeRasterizer::default().with("one.pdf", vec![landscape(5)]);
    let engine = FakeEngine::default();

    pipeline(&rasterizer, &engine, out.path())
        .process_document(Path::new("one.pdf"))
        .unwrap();

    let calls = engine.calls.borrow();
    assert_eq!(calls.len(), 5, "four probes and one final pass");
    for (_, _, request) in &calls[..4] {
        assert_eq!(request.language, None);
    }
    let last = &calls[4].2;
    assert_eq!(last.language.as_deref(), Some("eng"));
    assert!(calls
        .iter()
        .all(|(_, _, r)| r.engine_mode == EngineMode(1) && r.segmentation_mode == SegmentationMode(6)));
}

#[test]
fn rerun_produces_identical_bytes() {
    let out = tempfile::tempdir().unwrap();
    let rasterizer =
        FakeRasterizer::default().with("again.pdf", vec![landscape(7), portrait(8), landscape(BLANK)]);
    let engine = FakeEngine::default();
    let pipeline = pipeline(&rasterizer, &engine, out.path());

    let first = pipeline.process_document(Path::new("again.pdf")).unwrap();
    let first_bytes = std::fs::read(&first.output).unwrap();
    let second = pipeline.process_document(Path::new("again.pdf")).unwrap();

    assert_eq!(first.output, second.output);
    assert_eq!(first_bytes, std::fs::read(&second.output).unwrap());
    assert_eq!(output_files(out.path()), vec!["ocr_again_text.txt"]);
}

#[test]
fn failed_rerun_keeps_previous_artifact_intact() {
    let out = tempfile::tempdir().unwrap();
    let good = FakeRasterizer::default().with("doc.pdf", vec![landscape(1)]);
    let bad = FakeRasterizer::default().with("doc.pdf", vec![landscape(1), landscape(FAILS)]);
    let engine = FakeEngine::default();

    let done = pipeline(&good, &engine, out.path())
        .process_document(Path::new("doc.pdf"))
        .unwrap();
    assert!(pipeline(&bad, &engine, out.path())
        .process_document(Path::new("doc.pdf"))
        .is_err());

    assert_eq!(std::fs::read_to_string(&done.output).unwrap(), "page 1\n");
}
