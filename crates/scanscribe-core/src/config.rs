// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration, read from a TOML file (`scanscribe.toml` by
// default) and validated before any document is touched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::error::{Result, ScanscribeError};
use crate::types::{EngineMode, SegmentationMode};

/// File name looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "scanscribe.toml";

/// Settings for a conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Folder scanned for `*.pdf` sources.
    pub input_folder: PathBuf,
    /// Folder receiving one `.txt` per converted source.
    pub output_folder: PathBuf,
    /// Folder receiving the `.docx` rendition of each text file.
    pub docx_output_folder: PathBuf,
    /// Tesseract executable. Threaded into every recognition call.
    pub tesseract_path: PathBuf,
    /// Poppler `pdftoppm` executable used for rasterisation.
    #[serde(default = "default_pdftoppm_path")]
    pub pdftoppm_path: PathBuf,
    /// Recognition language code (e.g. `eng`, `deu+eng`).
    #[serde(default = "default_ocr_lang")]
    pub ocr_lang: String,
    #[serde(default)]
    pub ocr_engine_mode: EngineMode,
    #[serde(default)]
    pub page_segmentation_mode: SegmentationMode,
    /// Prepended to the source base name of every artifact.
    #[serde(default)]
    pub output_prefix: String,
    /// Appended to the source base name of every artifact (before the extension).
    #[serde(default)]
    pub output_suffix: String,
    /// Log level used when `RUST_LOG` is unset. Accepts the `tracing` level
    /// names and the `WARNING`, `CRITICAL` and `NOTSET` spellings.
    #[serde(default = "default_logging_level")]
    pub logging_level: String,
    /// Folder tabulated by the word counter. Defaults to `output_folder`.
    #[serde(default)]
    pub word_count_input_folder: Option<PathBuf>,
    /// CSV written by the word counter.
    #[serde(default = "default_word_count_output")]
    pub word_count_output_path: PathBuf,
}

fn default_pdftoppm_path() -> PathBuf {
    PathBuf::from("pdftoppm")
}

fn default_ocr_lang() -> String {
    "eng".into()
}

fn default_logging_level() -> String {
    "info".into()
}

fn default_word_count_output() -> PathBuf {
    PathBuf::from("word_counts.csv")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::from("PDFs"),
            output_folder: PathBuf::from("Converted_TXT"),
            docx_output_folder: PathBuf::from("Converted_DOCX"),
            tesseract_path: PathBuf::from("/usr/bin/tesseract"),
            pdftoppm_path: default_pdftoppm_path(),
            ocr_lang: default_ocr_lang(),
            ocr_engine_mode: EngineMode::default(),
            page_segmentation_mode: SegmentationMode::default(),
            output_prefix: String::new(),
            output_suffix: String::new(),
            logging_level: default_logging_level(),
            word_count_input_folder: None,
            word_count_output_path: default_word_count_output(),
        }
    }
}

impl AppConfig {
    /// Read and parse a TOML config file. Does not validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            ScanscribeError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a TOML document. Does not validate.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check every value the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("input_folder", &self.input_folder),
            ("output_folder", &self.output_folder),
            ("docx_output_folder", &self.docx_output_folder),
            ("tesseract_path", &self.tesseract_path),
            ("pdftoppm_path", &self.pdftoppm_path),
        ];
        for (key, value) in required {
            if value.as_os_str().is_empty() {
                return Err(ScanscribeError::Config(format!("`{key}` must not be empty")));
            }
        }

        if !is_valid_language(&self.ocr_lang) {
            return Err(ScanscribeError::Config(format!(
                "`ocr_lang` {:?} is not a language code (expected e.g. `eng` or `deu+eng`)",
                self.ocr_lang
            )));
        }
        if !self.ocr_engine_mode.is_valid() {
            return Err(ScanscribeError::Config(format!(
                "`ocr_engine_mode` {} is out of range 0..={}",
                self.ocr_engine_mode,
                EngineMode::MAX
            )));
        }
        if !self.page_segmentation_mode.is_valid() {
            return Err(ScanscribeError::Config(format!(
                "`page_segmentation_mode` {} is out of range 0..={}",
                self.page_segmentation_mode,
                SegmentationMode::MAX
            )));
        }
        if has_path_separator(&self.output_prefix) || has_path_separator(&self.output_suffix) {
            return Err(ScanscribeError::Config(
                "`output_prefix` and `output_suffix` must not contain path separators".into(),
            ));
        }
        self.log_level()?;
        Ok(())
    }

    /// `logging_level` as a `tracing` level filter.
    pub fn log_level(&self) -> Result<LevelFilter> {
        parse_log_level(&self.logging_level).ok_or_else(|| {
            ScanscribeError::Config(format!(
                "`logging_level` {:?} is not a log level (expected one of off, error, warn, info, debug, trace)",
                self.logging_level
            ))
        })
    }

    /// Folder the word counter reads from.
    pub fn word_count_folder(&self) -> &Path {
        self.word_count_input_folder
            .as_deref()
            .unwrap_or(&self.output_folder)
    }
}

fn is_valid_language(lang: &str) -> bool {
    !lang.is_empty()
        && lang
            .split('+')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

fn parse_log_level(name: &str) -> Option<LevelFilter> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("warning") {
        Some(LevelFilter::WARN)
    } else if name.eq_ignore_ascii_case("critical") || name.eq_ignore_ascii_case("fatal") {
        Some(LevelFilter::ERROR)
    } else if name.eq_ignore_ascii_case("notset") {
        Some(LevelFilter::TRACE)
    } else if name.is_empty() || name.bytes().all(|b| b.is_ascii_digit()) {
        // `LevelFilter` also parses 0..=5; keep the config to names.
        None
    } else {
        name.parse().ok()
    }
}

fn has_path_separator(value: &str) -> bool {
    value.contains('/') || value.contains('\\')
}
