// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX writer — wrap recognised text in a Word document using `docx-rs`.
//
// The whole text goes into one paragraph; every newline becomes a line break
// inside it, so the page boundaries of the text artifact survive.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use docx_rs::{BreakType, Docx, Paragraph, Run};
use rayon::prelude::*;
use scanscribe_core::error::{Result, ScanscribeError};
use tracing::{error, info, instrument};

use crate::pipeline::{artifact_name, has_extension, source_stem, write_atomically};

/// Builds single-paragraph DOCX documents from plain text.
#[derive(Debug, Clone, Default)]
pub struct DocxWriter;

impl DocxWriter {
    pub fn new() -> Self {
        Self
    }

    /// Serialise `text` as a DOCX package.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub fn create_from_text(&self, text: &str) -> Result<Vec<u8>> {
        let mut run = Run::new();
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                run = run.add_break(BreakType::TextWrapping);
            }
            let line = line.strip_suffix('\r').unwrap_or(line);
            if !line.is_empty() {
                run = run.add_text(line);
            }
        }

        let mut buffer = Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(run))
            .build()
            .pack(&mut buffer)
            .map_err(|err| ScanscribeError::Export(format!("failed to pack DOCX: {}", err)))?;

        Ok(buffer.into_inner())
    }

    /// Convert one text file into `{docx_dir}/{prefix}{stem}{suffix}.docx`.
    pub fn convert_file(
        &self,
        text_file: &Path,
        docx_dir: &Path,
        prefix: &str,
        suffix: &str,
    ) -> Result<PathBuf> {
        let text = std::fs::read_to_string(text_file)?;
        let stem = source_stem(text_file)?;
        let output = docx_dir.join(artifact_name(prefix, &stem, suffix, "docx"));

        let bytes = self.create_from_text(&text)?;
        write_atomically(&output, &bytes)?;
        Ok(output)
    }
}

/// Result of converting one text file.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub error: Option<String>,
}

impl ExportOutcome {
    pub fn is_converted(&self) -> bool {
        self.output.is_some()
    }
}

/// Convert every `*.txt` in `text_dir` to DOCX.
///
/// Files are converted in parallel; outcomes come back in file-name order.
/// A missing folder or one without text files is a configuration error.
/// Individual files that fail are logged and reported; the rest continue.
#[instrument(skip_all, fields(text_dir = %text_dir.display(), docx_dir = %docx_dir.display()))]
pub fn convert_text_folder(
    text_dir: &Path,
    docx_dir: &Path,
    prefix: &str,
    suffix: &str,
) -> Result<Vec<ExportOutcome>> {
    let entries = std::fs::read_dir(text_dir).map_err(|err| {
        ScanscribeError::Config(format!(
            "text folder {} cannot be read ({}); run `scanscribe convert` first",
            text_dir.display(),
            err
        ))
    })?;

    let mut text_files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, "txt") {
            text_files.push(path);
        }
    }
    if text_files.is_empty() {
        return Err(ScanscribeError::Config(format!(
            "no text files found in {}; run `scanscribe convert` first",
            text_dir.display()
        )));
    }
    text_files.sort();

    std::fs::create_dir_all(docx_dir)?;
    info!(count = text_files.len(), "Converting text files to DOCX");

    let writer = DocxWriter::new();
    let outcomes = text_files
        .into_par_iter()
        .map(|source| match writer.convert_file(&source, docx_dir, prefix, suffix) {
            Ok(output) => {
                info!(source = %source.display(), output = %output.display(), "Converted");
                ExportOutcome {
                    source,
                    output: Some(output),
                    error: None,
                }
            }
            Err(err) => {
                error!(source = %source.display(), error = %err, "Error converting text file");
                ExportOutcome {
                    source,
                    output: None,
                    error: Some(err.to_string()),
                }
            }
        })
        .collect::<Vec<_>>();

    info!("All text files converted to DOCX");
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_a_zip_package() {
        let bytes = DocxWriter::new().create_from_text("hello\nworld\n").unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_text_still_makes_a_document() {
        let bytes = DocxWriter::new().create_from_text("").unwrap();
        assert!(docx_rs::read_docx(&bytes).is_ok());
    }

    #[test]
    fn converts_folder_and_names_outputs() {
        let text_dir = tempfile::tempdir().unwrap();
        let docx_dir = text_dir.path().join("docx");
        std::fs::write(text_dir.path().join("b.txt"), "second\n").unwrap();
        std::fs::write(text_dir.path().join("a.txt"), "first\n").unwrap();
        std::fs::write(text_dir.path().join("skip.pdf"), "").unwrap();

        let outcomes = convert_text_folder(text_dir.path(), &docx_dir, "pre_", "_post").unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(ExportOutcome::is_converted));
        assert_eq!(
            outcomes[0].output.as_deref(),
            Some(docx_dir.join("pre_a_post.docx").as_path())
        );
        assert!(docx_dir.join("pre_b_post.docx").is_file());
    }

    #[test]
    fn bad_file_does_not_stop_the_folder() {
        let text_dir = tempfile::tempdir().unwrap();
        let docx_dir = text_dir.path().join("docx");
        std::fs::write(text_dir.path().join("bad.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        std::fs::write(text_dir.path().join("good.txt"), "fine\n").unwrap();

        let outcomes = convert_text_folder(text_dir.path(), &docx_dir, "", "").unwrap();
        assert!(!outcomes[0].is_converted());
        assert!(outcomes[0].error.is_some());
        assert!(outcomes[1].is_converted());
        assert!(!docx_dir.join("bad.docx").exists());
    }

    #[test]
    fn parallel_conversion_keeps_name_order_and_isolates_failures() {
        let text_dir = tempfile::tempdir().unwrap();
        let docx_dir = text_dir.path().join("docx");
        for index in (0..24).rev() {
            let name = format!("page_{index:02}.txt");
            if index == 13 {
                std::fs::write(text_dir.path().join(name), [0xc3, 0x28]).unwrap();
            } else {
                std::fs::write(text_dir.path().join(name), format!("text {index}\n")).unwrap();
            }
        }

        let outcomes = convert_text_folder(text_dir.path(), &docx_dir, "", "").unwrap();

        let names: Vec<String> = outcomes
            .iter()
            .map(|o| o.source.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        let expected: Vec<String> = (0..24).map(|i| format!("page_{i:02}.txt")).collect();
        assert_eq!(names, expected);

        let failed: Vec<&ExportOutcome> = outcomes.iter().filter(|o| !o.is_converted()).collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].source.ends_with("page_13.txt"));
        assert!(!docx_dir.join("page_13.docx").exists());
        assert!(docx_dir.join("page_23.docx").is_file());
    }

    #[test]
    fn missing_or_empty_text_folder_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let docx_dir = dir.path().join("docx");
        assert!(matches!(
            convert_text_folder(&dir.path().join("missing"), &docx_dir, "", ""),
            Err(ScanscribeError::Config(_))
        ));
        assert!(matches!(
            convert_text_folder(dir.path(), &docx_dir, "", ""),
            Err(ScanscribeError::Config(_))
        ));
    }
}
