// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — structural inspection of source documents using the `lopdf`
// crate.

use std::path::Path;

use lopdf::Document;
use scanscribe_core::error::ScanscribeError;
use tracing::{debug, instrument};

/// Reads an existing PDF's object structure.
///
/// Used to cross-check the rasteriser: the number of rendered pages must
/// match the page tree.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanscribeError> {
        let path_ref = path.as_ref();

        let document = Document::load(path_ref).map_err(|err| {
            ScanscribeError::Pdf(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }
}

/// Build an in-memory PDF with `pages` empty A4 pages.
#[cfg(test)]
pub(crate) fn blank_pdf(pages: usize) -> Vec<u8> {
    use lopdf::{Object, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("in-memory PDF save");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.pdf");
        std::fs::write(&path, blank_pdf(3)).unwrap();

        assert_eq!(PdfReader::open(&path).unwrap().page_count(), 3);
    }

    #[test]
    fn garbage_is_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();

        let err = PdfReader::open(&path).err().unwrap();
        assert!(matches!(err, ScanscribeError::Pdf(_)));
    }

    #[test]
    fn missing_file_is_pdf_error() {
        assert!(PdfReader::open("/nonexistent/scan.pdf").is_err());
    }
}
