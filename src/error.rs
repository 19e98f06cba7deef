//! Error types for the notes2tex library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Notes2TexError`] is **fatal**. The run cannot proceed at all (input
//!   directory missing, OCR engine not installed, output not writable).
//!   Returned as `Err(Notes2TexError)` from the top-level `convert*` functions.
//!
//! * [`OcrError`] is **per image**. One photo could not be decoded or the
//!   engine failed on it. Stored inside [`crate::output::ImageResult`] so the
//!   document can carry a placeholder section for it, unless the configured
//!   [`crate::config::FailurePolicy`] turns it into
//!   [`Notes2TexError::ExtractionFailed`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the notes2tex library.
#[derive(Debug, Error)]
pub enum Notes2TexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The configured input directory does not exist.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is readable.")]
    DirectoryNotFound { path: PathBuf },

    /// The input path exists but is a file, not a directory.
    #[error("Input path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// The directory exists but listing it failed (permissions, I/O).
    #[error("Failed to read input directory '{path}': {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// OCR failed for one image and the failure policy is `Abort`.
    #[error("Text extraction failed for '{image}': {cause}")]
    ExtractionFailed {
        image: PathBuf,
        #[source]
        cause: OcrError,
    },

    /// The OCR engine is not installed or cannot be started.
    #[error("OCR engine '{engine}' is not available.\n{hint}")]
    OcrEngineUnavailable { engine: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output LaTeX file.
    #[error("Failed to write output file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure to extract text from a single image.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum OcrError {
    /// The file could not be read or decoded as an image.
    #[error("image could not be decoded: {detail}")]
    Decode { detail: String },

    /// The engine executable could not be started.
    #[error("OCR program '{program}' could not be started: {detail}")]
    EngineNotFound { program: String, detail: String },

    /// The engine ran but exited unsuccessfully.
    #[error("OCR engine exited with {status}: {stderr}")]
    EngineFailed { status: String, stderr: String },

    /// The engine produced output that is not valid UTF-8.
    #[error("OCR engine produced invalid output: {detail}")]
    InvalidOutput { detail: String },

    /// The engine did not finish within the per-image timeout.
    #[error("OCR timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Temp-file or other local I/O failed while preparing the image.
    #[error("I/O error: {detail}")]
    Io { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_not_found_names_path() {
        let e = Notes2TexError::DirectoryNotFound {
            path: PathBuf::from("/no/such/photos"),
        };
        assert!(e.to_string().contains("/no/such/photos"));
    }

    #[test]
    fn extraction_failed_names_image_and_cause() {
        let e = Notes2TexError::ExtractionFailed {
            image: PathBuf::from("photos/b.jpg"),
            cause: OcrError::Timeout { secs: 30 },
        };
        let msg = e.to_string();
        assert!(msg.contains("photos/b.jpg"), "got: {msg}");
        assert!(msg.contains("30s"), "got: {msg}");
    }

    #[test]
    fn write_failed_exposes_source() {
        use std::error::Error as _;

        let e = Notes2TexError::WriteFailed {
            path: PathBuf::from("out/notes.tex"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("out/notes.tex"));
        assert!(e.source().is_some());
    }

    #[test]
    fn engine_failed_display() {
        let e = OcrError::EngineFailed {
            status: "exit status: 1".into(),
            stderr: "Error in pixReadStream".into(),
        };
        assert!(e.to_string().contains("pixReadStream"));
    }
}
