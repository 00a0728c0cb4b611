// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanscribe.

use thiserror::Error;

/// Top-level error type for all Scanscribe operations.
#[derive(Debug, Error)]
pub enum ScanscribeError {
    // -- Source documents --
    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Page processing --
    #[error("image processing failed: {0}")]
    Image(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    // -- Export --
    #[error("DOCX export failed: {0}")]
    Export(String),

    // -- Setup --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("missing dependency: {0}")]
    Dependency(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config file parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanscribeError>;
