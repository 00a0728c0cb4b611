// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export of recognised text into word-processor formats.

pub mod docx;

pub use docx::{DocxWriter, ExportOutcome, convert_text_folder};
