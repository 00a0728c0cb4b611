// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word-count tabulation over converted TXT and DOCX files, exported as CSV.

use std::path::{Path, PathBuf};

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use scanscribe_core::error::{Result, ScanscribeError};
use tracing::{debug, info, instrument};

use crate::pipeline::{has_extension, write_atomically};

/// Word count of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCount {
    pub file_name: String,
    pub words: usize,
}

/// Whitespace-separated words in `text`.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Count the words of a `.txt` or `.docx` file. Other files count as 0.
pub fn count_words_in_file(path: &Path) -> Result<usize> {
    if has_extension(path, "txt") {
        Ok(count_words(&std::fs::read_to_string(path)?))
    } else if has_extension(path, "docx") {
        let bytes = std::fs::read(path)?;
        let paragraphs = docx_paragraphs(&bytes).map_err(|err| {
            ScanscribeError::Export(format!("failed to read {}: {}", path.display(), err))
        })?;
        Ok(paragraphs.iter().map(|p| count_words(p)).sum())
    } else {
        Ok(0)
    }
}

/// Plain text of every top-level paragraph; line breaks become `\n`.
fn docx_paragraphs(bytes: &[u8]) -> std::result::Result<Vec<String>, docx_rs::ReaderError> {
    let docx = docx_rs::read_docx(bytes)?;
    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        let DocumentChild::Paragraph(paragraph) = child else {
            continue;
        };
        let mut text = String::new();
        for child in &paragraph.children {
            let ParagraphChild::Run(run) = child else {
                continue;
            };
            for child in &run.children {
                match child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Break(_) => text.push('\n'),
                    RunChild::Tab(_) => text.push('\t'),
                    _ => {}
                }
            }
        }
        paragraphs.push(text);
    }
    Ok(paragraphs)
}

/// Count every `*.txt` and `*.docx` directly inside `folder`, sorted by name.
#[instrument(skip_all, fields(folder = %folder.display()))]
pub fn count_folder(folder: &Path) -> Result<Vec<WordCount>> {
    let entries = std::fs::read_dir(folder).map_err(|err| {
        ScanscribeError::Config(format!(
            "word count folder {} cannot be read: {}",
            folder.display(),
            err
        ))
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && (has_extension(&path, "txt") || has_extension(&path, "docx")) {
            files.push(path);
        }
    }

    let mut counts = Vec::with_capacity(files.len());
    for path in files {
        let words = count_words_in_file(&path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(file = %file_name, words, "Counted");
        counts.push(WordCount { file_name, words });
    }
    counts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(counts)
}

/// Render counts as CSV with a `Filename,Word Count` header.
pub fn to_csv(counts: &[WordCount]) -> String {
    let mut csv = String::from("Filename,Word Count\r\n");
    for count in counts {
        csv.push_str(&csv_field(&count.file_name));
        csv.push(',');
        csv.push_str(&count.words.to_string());
        csv.push_str("\r\n");
    }
    csv
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Count `folder` and write the CSV to `output`, creating its directory.
pub fn write_report(folder: &Path, output: &Path) -> Result<Vec<WordCount>> {
    let counts = count_folder(folder)?;
    write_atomically(output, to_csv(&counts).as_bytes())?;
    info!(files = counts.len(), output = %output.display(), "Word counts saved");
    Ok(counts)
}
