// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterisation — render every page of a source PDF to an RGB image by
// shelling out to poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use scanscribe_core::error::{Result, ScanscribeError};
use tracing::{debug, info, instrument, warn};

use crate::pdf::reader::PdfReader;

/// Renders a source document into page images, in page order.
pub trait Rasterizer {
    fn render(&self, source: &Path, dpi: u32) -> Result<Vec<DynamicImage>>;
}

impl<T: Rasterizer + ?Sized> Rasterizer for &T {
    fn render(&self, source: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        (**self).render(source, dpi)
    }
}

impl<T: Rasterizer + ?Sized> Rasterizer for Box<T> {
    fn render(&self, source: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        (**self).render(source, dpi)
    }
}

/// File-name prefix handed to pdftoppm inside the scratch directory.
const PAGE_PREFIX: &str = "page";

/// Rasteriser backed by poppler's `pdftoppm`.
///
/// Pages are rendered as PNG into a scratch directory that is removed when
/// rendering finishes, successfully or not.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Rasterizer for PdftoppmRasterizer {
    #[instrument(skip(self), fields(source = %source.display()))]
    fn render(&self, source: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        if !source.is_file() {
            return Err(ScanscribeError::Render(format!(
                "source {} does not exist or is not a file",
                source.display()
            )));
        }

        let scratch = tempfile::Builder::new()
            .prefix("scanscribe-render-")
            .tempdir()?;

        let output = Command::new(&self.program)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(source)
            .arg(scratch.path().join(PAGE_PREFIX))
            .output()
            .map_err(|err| {
                ScanscribeError::Render(format!(
                    "failed to invoke {}: {}",
                    self.program.display(),
                    err
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanscribeError::Render(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let files = rendered_page_files(scratch.path())?;
        if files.is_empty() {
            return Err(ScanscribeError::Render(format!(
                "no pages rendered from {}",
                source.display()
            )));
        }
        check_page_count(source, files.len())?;

        let mut pages = Vec::with_capacity(files.len());
        for (number, path) in &files {
            let page = image::open(path).map_err(|err| {
                ScanscribeError::Image(format!("failed to load rendered page {}: {}", number, err))
            })?;
            pages.push(DynamicImage::ImageRgb8(page.to_rgb8()));
        }

        info!(pages = pages.len(), dpi, "Document rendered");
        Ok(pages)
    }
}

/// Collect `page-N.png` files, sorted by page number.
///
/// pdftoppm zero-pads `N` to the width of the page count, so names are
/// parsed rather than sorted lexically.
fn rendered_page_files(dir: &Path) -> Result<Vec<(usize, PathBuf)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(number) = parse_page_number(name) {
            files.push((number, path));
        }
    }
    files.sort_by_key(|(number, _)| *number);
    debug!(count = files.len(), "Rendered page files collected");
    Ok(files)
}

fn parse_page_number(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

/// Compare the rendered page count with the PDF page tree.
///
/// Some PDFs that poppler renders fine cannot be parsed by lopdf; in that
/// case the rendered pages are trusted as they are.
fn check_page_count(source: &Path, rendered: usize) -> Result<()> {
    match PdfReader::open(source) {
        Ok(reader) if reader.page_count() != rendered => Err(ScanscribeError::Render(format!(
            "rendered {} pages but {} has {}",
            rendered,
            source.display(),
            reader.page_count()
        ))),
        Ok(_) => Ok(()),
        Err(err) => {
            warn!(%err, "Could not cross-check page count");
            Ok(())
        }
    }
}
