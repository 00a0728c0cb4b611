// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure-Rust recognition backend built on the `ocrs` crate, whose neural
// network models are executed via `rten`. An alternative to the tesseract
// executable on machines where installing tesseract is not an option.
//
// # Feature Gate
//
// This module is only available when the `ocrs` feature is enabled:
//
// ```toml
// scanscribe-document = { path = "crates/scanscribe-document", features = ["ocrs"] }
// ```
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`) — locates text regions in the image.
// - **Recognition model** (`text-recognition.rten`) — decodes characters from detected regions.
//
// They are downloaded to `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`) by
// running `ocrs-cli` once.
//
// # Limitations
//
// ocrs ships a single Latin-script model with fixed segmentation, so the
// language, engine mode, and segmentation mode of a request are accepted and
// ignored.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsInner, OcrEngineParams};
use rten::Model;
use scanscribe_core::error::{Result, ScanscribeError};
use tracing::{debug, info, instrument};

use crate::scan::engine::{RecognitionEngine, RecognitionRequest};

/// Default directory for cached model files.
///
/// Follows the XDG Base Directory specification: `$XDG_CACHE_HOME/ocrs`, falling
/// back to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Model locations for an [`OcrsEngine`].
#[derive(Debug, Clone)]
pub struct OcrsConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrsConfig {
    /// Points at the default model cache directory.
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrsConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(ScanscribeError::Dependency(format!(
                    "ocrs model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Recognition engine backed by `ocrs`.
///
/// Model loading is the expensive step; build the engine once per run and
/// reuse it for every page.
pub struct OcrsEngine {
    engine: OcrsInner,
}

impl OcrsEngine {
    /// Load both models and initialise the engine.
    ///
    /// The `ocrs` and `rten` crates must be compiled in release mode; debug
    /// builds are 10-100x slower.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrsConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading ocrs models");
        let detection_model = load_model(&config.detection_model_path)?;
        let recognition_model = load_model(&config.recognition_model_path)?;

        let engine = OcrsInner::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| ScanscribeError::Ocr(format!("failed to initialise ocrs: {}", err)))?;

        info!("ocrs engine ready");
        Ok(Self { engine })
    }
}

fn load_model(path: &Path) -> Result<Model> {
    Model::load_file(path).map_err(|err| {
        ScanscribeError::Ocr(format!("failed to load model {}: {}", path.display(), err))
    })
}

impl RecognitionEngine for OcrsEngine {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage, request: &RecognitionRequest) -> Result<String> {
        debug!(
            language = ?request.language,
            engine_mode = %request.engine_mode,
            segmentation_mode = %request.segmentation_mode,
            "ocrs ignores language and mode settings"
        );

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            ScanscribeError::Ocr(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| ScanscribeError::Ocr(format!("ocrs preprocessing failed: {}", err)))?;

        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| ScanscribeError::Ocr(format!("ocrs recognition failed: {}", err)))?;

        debug!(char_count = text.chars().count(), "ocrs returned text");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_to_cache_dir() {
        let config = OcrsConfig::default();
        assert!(config.detection_model_path.ends_with(DETECTION_MODEL_FILENAME));
        assert!(config.recognition_model_path.ends_with(RECOGNITION_MODEL_FILENAME));
    }

    #[test]
    fn config_from_dir() {
        let config = OcrsConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn missing_models_are_a_dependency_error() {
        let err = OcrsEngine::new(OcrsConfig::from_dir("/nonexistent/ocr-models"))
            .err()
            .unwrap();
        assert!(matches!(err, ScanscribeError::Dependency(_)));
    }
}
