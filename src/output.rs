//! Result types returned by the conversion entry points.

use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything produced by one [`crate::convert::convert`] run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The complete LaTeX document.
    pub latex: String,
    /// Per-image results in sorted input order.
    pub images: Vec<ImageResult>,
    pub stats: ConversionStats,
}

/// Outcome of OCR for a single image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    /// 0-based position in sorted input order.
    pub index: usize,
    /// File name, used as the section title.
    pub file_name: String,
    pub path: PathBuf,
    /// Raw text as returned by the engine. Empty when extraction failed.
    pub text: String,
    /// Set when extraction failed.
    pub error: Option<OcrError>,
    pub duration_ms: u64,
}

impl ImageResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate numbers for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Images discovered in the input directory.
    pub total_images: usize,
    /// Images whose text was extracted.
    pub processed_images: usize,
    /// Images represented by a placeholder section.
    pub failed_images: usize,
    pub total_duration_ms: u64,
    /// Wall-clock time spent in the OCR stage.
    pub ocr_duration_ms: u64,
}
