// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Scanscribe.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resolution every source page is rasterised at.
pub const RENDER_DPI: u32 = 300;

/// A clockwise quarter-turn rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Every rotation, in the order orientation probes are evaluated.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Angle in degrees (clockwise).
    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Recognition-engine model selection (tesseract `--oem`).
///
/// Opaque to Scanscribe apart from range validation; passed straight through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineMode(pub u8);

impl EngineMode {
    pub const MAX: u8 = 3;

    pub fn is_valid(self) -> bool {
        self.0 <= Self::MAX
    }
}

impl Default for EngineMode {
    /// Engine default: whatever the installed engine supports best.
    fn default() -> Self {
        Self(3)
    }
}

impl std::fmt::Display for EngineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Expected page layout (tesseract `--psm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentationMode(pub u8);

impl SegmentationMode {
    pub const MAX: u8 = 13;

    pub fn is_valid(self) -> bool {
        self.0 <= Self::MAX
    }
}

impl Default for SegmentationMode {
    /// Fully automatic page segmentation.
    fn default() -> Self {
        Self(3)
    }
}

impl std::fmt::Display for SegmentationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final state of one source document in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Every page was recognised and the text artifact written.
    Converted,
    /// The document was abandoned; no artifact exists for it.
    Failed,
}

/// Per-document entry of a [`BatchReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// Source document path.
    pub source: PathBuf,
    pub status: OutcomeStatus,
    /// Written text artifact (only for converted documents).
    pub output: Option<PathBuf>,
    /// Number of pages recognised.
    pub pages: usize,
    /// Rotation chosen for each page, in page order.
    pub rotations: Vec<Rotation>,
    /// Error detail for failed documents.
    pub error: Option<String>,
    /// What the operator should try before re-running a failed document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl DocumentOutcome {
    pub fn is_converted(&self) -> bool {
        self.status == OutcomeStatus::Converted
    }
}

/// Summary of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents: Vec<DocumentOutcome>,
}

impl BatchReport {
    pub fn converted_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_converted()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.documents.iter().filter(|d| !d.is_converted())
    }

    pub fn all_converted(&self) -> bool {
        self.documents.iter().all(DocumentOutcome::is_converted)
    }
}
