// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orientation correction by brute force: recognise the page at every quarter
// turn and keep the rotation that yields the most text.
//
// Recognition engines read text lines in one direction only, so a page turned
// 90°, 180° or 270° away from upright produces far fewer characters than the
// upright page. This costs four recognition passes per page but needs no
// dedicated orientation classifier.

use image::DynamicImage;
use scanscribe_core::error::Result;
use scanscribe_core::{EngineMode, Rotation, SegmentationMode};
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;
use crate::scan::engine::{RecognitionEngine, RecognitionRequest};

/// Score of one probed rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationCandidate {
    pub rotation: Rotation,
    /// Characters in the probe text, whitespace included.
    pub char_count: usize,
}

/// Picks the upright rotation of a preprocessed page.
pub struct OrientationResolver<E> {
    engine: E,
    engine_mode: EngineMode,
    segmentation_mode: SegmentationMode,
}

impl<E: RecognitionEngine> OrientationResolver<E> {
    pub fn new(engine: E, engine_mode: EngineMode, segmentation_mode: SegmentationMode) -> Self {
        Self {
            engine,
            engine_mode,
            segmentation_mode,
        }
    }

    /// Probe all four rotations in order and return every score.
    ///
    /// Probes carry no language hint. The first engine error aborts the scan.
    pub fn probe(&self, page: &DynamicImage) -> Result<Vec<OrientationCandidate>> {
        let request = RecognitionRequest::probe(self.engine_mode, self.segmentation_mode);
        Rotation::ALL
            .iter()
            .map(|&rotation| {
                let rotated = ImageProcessor::from_dynamic(page.clone())
                    .rotate(rotation)
                    .into_dynamic();
                let text = self.engine.recognize(&rotated, &request)?;
                let candidate = OrientationCandidate {
                    rotation,
                    char_count: text.chars().count(),
                };
                debug!(rotation = %rotation, chars = candidate.char_count, "Orientation probe");
                Ok(candidate)
            })
            .collect()
    }

    /// Rotation yielding the most characters; ties keep the earliest angle.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn resolve(&self, page: &DynamicImage) -> Result<Rotation> {
        info!("Detecting page orientation");
        let candidates = self.probe(page)?;
        let best = select_best(&candidates);
        info!(rotation = %best, "Detected orientation");
        Ok(best)
    }
}

/// Strict-maximum selection over candidates in probe order.
///
/// Falls back to 0° when no candidate beats an empty page.
pub fn select_best(candidates: &[OrientationCandidate]) -> Rotation {
    let mut best = Rotation::Deg0;
    let mut max_chars = 0;
    for candidate in candidates {
        if candidate.char_count > max_chars {
            max_chars = candidate.char_count;
            best = candidate.rotation;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use image::RgbImage;
    use scanscribe_core::ScanscribeError;

    /// Returns canned text per call, in call order, and records each request.
    struct Scripted {
        replies: RefCell<Vec<Result<String>>>,
        seen: RefCell<Vec<(u32, u32, RecognitionRequest)>>,
    }

    impl Scripted {
        fn counts(counts: &[usize]) -> Self {
            Self::new(counts.iter().map(|&n| Ok("x".repeat(n))).collect())
        }

        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: RefCell::new(replies.into_iter().rev().collect()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl RecognitionEngine for Scripted {
        fn recognize(&self, image: &DynamicImage, request: &RecognitionRequest) -> Result<String> {
            self.seen
                .borrow_mut()
                .push((image.width(), image.height(), request.clone()));
            self.replies
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn page() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(30, 20))
    }

    fn resolver(engine: &Scripted) -> OrientationResolver<&Scripted> {
        OrientationResolver::new(engine, EngineMode(1), SegmentationMode(6))
    }

    #[test]
    fn unique_maximum_wins() {
        let engine = Scripted::counts(&[12, 40, 8, 8]);
        assert_eq!(resolver(&engine).resolve(&page()).unwrap(), Rotation::Deg90);
    }

    #[test]
    fn all_equal_keeps_zero() {
        let engine = Scripted::counts(&[10, 10, 10, 10]);
        assert_eq!(resolver(&engine).resolve(&page()).unwrap(), Rotation::Deg0);
    }

    #[test]
    fn blank_page_keeps_zero() {
        let engine = Scripted::counts(&[0, 0, 0, 0]);
        assert_eq!(resolver(&engine).resolve(&page()).unwrap(), Rotation::Deg0);
    }

    #[test]
    fn later_tie_does_not_replace_earlier_maximum() {
        let engine = Scripted::counts(&[3, 9, 2, 9]);
        assert_eq!(resolver(&engine).resolve(&page()).unwrap(), Rotation::Deg90);
    }

    #[test]
    fn upside_down_page() {
        let engine = Scripted::counts(&[5, 1, 70, 2]);
        assert_eq!(resolver(&engine).resolve(&page()).unwrap(), Rotation::Deg180);
    }

    #[test]
    fn whitespace_counts_towards_score() {
        let engine = Scripted::new(vec![
            Ok("ab".into()),
            Ok("a b \n".into()),
            Ok(String::new()),
            Ok("abc".into()),
        ]);
        assert_eq!(resolver(&engine).resolve(&page()).unwrap(), Rotation::Deg90);
    }

    #[test]
    fn score_counts_characters_not_bytes() {
        let engine = Scripted::new(vec![
            Ok("ééé".into()),
            Ok("abcd".into()),
            Ok(String::new()),
            Ok(String::new()),
        ]);
        let candidates = resolver(&engine).probe(&page()).unwrap();
        assert_eq!(candidates[0].char_count, 3);
        assert_eq!(select_best(&candidates), Rotation::Deg90);
    }

    #[test]
    fn probes_rotate_page_and_omit_language() {
        let engine = Scripted::counts(&[1, 1, 1, 1]);
        resolver(&engine).resolve(&page()).unwrap();

        let seen = engine.seen.borrow();
        let dims: Vec<(u32, u32)> = seen.iter().map(|(w, h, _)| (*w, *h)).collect();
        assert_eq!(dims, vec![(30, 20), (20, 30), (30, 20), (20, 30)]);
        for (_, _, request) in seen.iter() {
            assert_eq!(request.language, None);
            assert_eq!(request.engine_mode, EngineMode(1));
            assert_eq!(request.segmentation_mode, SegmentationMode(6));
        }
    }

    #[test]
    fn engine_error_propagates() {
        let engine = Scripted::new(vec![
            Ok("text".into()),
            Err(ScanscribeError::Ocr("engine crashed".into())),
        ]);
        let err = resolver(&engine).resolve(&page()).unwrap_err();
        assert!(matches!(err, ScanscribeError::Ocr(_)));
        assert_eq!(engine.seen.borrow().len(), 2, "no probes after the failure");
    }

    #[test]
    fn select_best_of_nothing_is_zero() {
        assert_eq!(select_best(&[]), Rotation::Deg0);
    }
}
