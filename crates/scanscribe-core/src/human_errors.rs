// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator-facing explanations for failed documents.
//
// The batch log records the raw error; the end-of-run summary prints these
// instead, so whoever re-runs the failed documents knows what to fix first.

use crate::error::ScanscribeError;

/// A plain-language explanation with a concrete next step.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the operator should try.
    pub suggestion: String,
}

/// Explain a `ScanscribeError` to the person running the batch.
pub fn humanize_error(err: &ScanscribeError) -> HumanError {
    match err {
        ScanscribeError::Render(detail) => humanize_render_error(detail),

        ScanscribeError::Pdf(_) => HumanError {
            message: "The PDF structure could not be read.".into(),
            suggestion: "The file may be damaged or encrypted. Open it in a viewer to check, or re-export it.".into(),
        },

        ScanscribeError::Image(_) => HumanError {
            message: "A rendered page image could not be processed.".into(),
            suggestion: "Re-run the document; if it fails again, check that pdftoppm produces readable PNGs for it.".into(),
        },

        ScanscribeError::Ocr(detail) => humanize_ocr_error(detail),

        ScanscribeError::Export(_) => HumanError {
            message: "The DOCX file could not be written.".into(),
            suggestion: "Check that the DOCX output folder is writable and has free space.".into(),
        },

        ScanscribeError::Config(detail) => HumanError {
            message: "The configuration is invalid.".into(),
            suggestion: format!("Fix scanscribe.toml and run again. ({detail})"),
        },

        ScanscribeError::Dependency(detail) => HumanError {
            message: "A required tool is missing.".into(),
            suggestion: format!("Run `scanscribe doctor` for installation instructions. ({detail})"),
        },

        ScanscribeError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file or folder could not be found.".into(),
                suggestion: "It may have been moved while the batch was running. Check the input and output folders.".into(),
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied.".into(),
                suggestion: "Check that the input files are readable and the output folder is writable.".into(),
            },
            _ => HumanError {
                message: "A file could not be read or written.".into(),
                suggestion: "Re-run the document. If it keeps failing, check free disk space.".into(),
            },
        },

        ScanscribeError::Serialization(_) => HumanError {
            message: "The run report could not be written.".into(),
            suggestion: "The text artifacts are unaffected. Please report this.".into(),
        },

        ScanscribeError::TomlParse(_) => HumanError {
            message: "The configuration file is not valid TOML.".into(),
            suggestion: "Check scanscribe.toml for typos, missing quotes, or missing required keys.".into(),
        },
    }
}

fn humanize_render_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("failed to invoke") || lower.contains("no such file or directory (os error 2)") {
        HumanError {
            message: "The page renderer (pdftoppm) is not available.".into(),
            suggestion: "Install poppler-utils, or set `pdftoppm_path` in scanscribe.toml.".into(),
        }
    } else if lower.contains("incorrect password") || lower.contains("encrypted") {
        HumanError {
            message: "The PDF is password protected.".into(),
            suggestion: "Remove the password (e.g. `qpdf --decrypt`) and re-run this document.".into(),
        }
    } else if lower.contains("no pages") {
        HumanError {
            message: "The PDF has no pages.".into(),
            suggestion: "Check that the file is a complete scan and not a truncated download.".into(),
        }
    } else {
        HumanError {
            message: "The PDF could not be rendered.".into(),
            suggestion: format!("The file may be damaged. Open it in a viewer to check. (Detail: {detail})"),
        }
    }
}

fn humanize_ocr_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("failed loading language") || lower.contains("error opening data file") {
        HumanError {
            message: "The OCR language data is not installed.".into(),
            suggestion: "Install the traineddata for `ocr_lang` (e.g. `tesseract-ocr-deu`) or change the language.".into(),
        }
    } else if lower.contains("failed to invoke") {
        HumanError {
            message: "Tesseract could not be started.".into(),
            suggestion: "Check `tesseract_path` in scanscribe.toml, or run `scanscribe doctor`.".into(),
        }
    } else {
        HumanError {
            message: "Text recognition failed on a page.".into(),
            suggestion: format!("Re-run the document; if it fails again, try another `page_segmentation_mode`. (Detail: {detail})"),
        }
    }
}
