//! # notes2tex
//!
//! Batch-convert photos of handwritten or printed notes into a single LaTeX
//! document using an external OCR engine (Tesseract by default).
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo directory
//!  │
//!  ├─ 1. Discover    matching images, sorted by file name
//!  ├─ 2. Preprocess  decode + convert to RGB (spawn_blocking)
//!  ├─ 3. OCR         one engine call per image, bounded concurrency
//!  ├─ 4. LaTeX       escape text, one \section per image
//!  └─ 5. Output      atomic write of the .tex file + stats
//! ```
//!
//! Compiling the document (`pdflatex notes.tex`) is left to the user.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notes2tex::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let stats = convert_to_file("initial_trial_photos", "notes.tex", &config).await?;
//!     eprintln!("{} images, {} failed", stats.total_images, stats.failed_images);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom OCR engines
//!
//! Anything implementing [`OcrEngine`] can replace Tesseract:
//!
//! ```rust
//! use notes2tex::{OcrEngine, OcrError, ConversionConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct Fixed;
//!
//! #[async_trait::async_trait]
//! impl OcrEngine for Fixed {
//!     fn name(&self) -> &str { "fixed" }
//!     async fn extract(&self, _image: &Path) -> Result<String, OcrError> {
//!         Ok("lorem ipsum".into())
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .engine(Arc::new(Fixed))
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `notes2tex` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, FailurePolicy, DEFAULT_EXTENSIONS};
pub use convert::{convert, convert_sync, convert_to_file, inspect, write_document};
pub use error::{Notes2TexError, OcrError};
pub use output::{ConversionOutput, ConversionStats, ImageResult};
pub use pipeline::discover::{discover, ImageRef};
pub use pipeline::latex::{build_document, escape_latex, DocumentMeta, Section, SectionBody};
pub use pipeline::ocr::{extract_text, OcrEngine, TesseractEngine};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
