// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract recognition backend. Each call spawns the configured tesseract
// executable, pipes the page in as PNG on stdin, and reads the text from
// stdout.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use image::DynamicImage;
use scanscribe_core::error::{Result, ScanscribeError};
use tracing::{debug, instrument};

use crate::image::processor::encode_png;
use crate::scan::engine::{RecognitionEngine, RecognitionRequest};

/// Runs the tesseract command-line engine.
///
/// The executable path is fixed at construction and used for every call.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    executable: PathBuf,
}

impl TesseractEngine {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

/// Command-line arguments for one request: `stdin stdout [-l L] --oem N --psm N`.
fn build_args(request: &RecognitionRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["stdin".into(), "stdout".into()];
    if let Some(language) = &request.language {
        args.push("-l".into());
        args.push(language.into());
    }
    args.push("--oem".into());
    args.push(request.engine_mode.to_string().into());
    args.push("--psm".into());
    args.push(request.segmentation_mode.to_string().into());
    args
}

impl RecognitionEngine for TesseractEngine {
    #[instrument(skip_all, fields(
        width = image.width(),
        height = image.height(),
        lang = request.language.as_deref().unwrap_or("-"),
    ))]
    fn recognize(&self, image: &DynamicImage, request: &RecognitionRequest) -> Result<String> {
        let png = encode_png(image)?;

        let mut child = Command::new(&self.executable)
            .args(build_args(request))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                ScanscribeError::Ocr(format!(
                    "failed to invoke {}: {}",
                    self.executable.display(),
                    err
                ))
            })?;

        // Feed stdin from a separate thread so a chatty child cannot deadlock us.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScanscribeError::Ocr("tesseract stdin was not captured".into()))?;
        let writer = std::thread::spawn(move || stdin.write_all(&png));

        let output = child.wait_with_output().map_err(|err| {
            ScanscribeError::Ocr(format!("failed to wait for tesseract: {}", err))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanscribeError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        writer
            .join()
            .map_err(|_| ScanscribeError::Ocr("stdin writer thread panicked".into()))?
            .map_err(|err| {
                ScanscribeError::Ocr(format!("failed to pipe page image to tesseract: {}", err))
            })?;

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(char_count = text.chars().count(), "tesseract returned text");
        Ok(text)
    }
}
