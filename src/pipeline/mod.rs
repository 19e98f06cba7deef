//! Pipeline stages for image-to-LaTeX conversion.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the OCR backend can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ preprocess ──▶ ocr ──▶ latex
//! (sorted)     (decode/RGB)   (engine) (escape + assemble)
//! ```
//!
//! 1. [`discover`]: list matching image files, sorted by file name
//! 2. [`preprocess`]: decode and normalise to RGB PNG; runs in
//!    `spawn_blocking` because decoding is CPU-bound
//! 3. [`ocr`]: the [`ocr::OcrEngine`] seam and the Tesseract CLI
//!    engine; the only stage that spawns processes
//! 4. [`latex`]: escape OCR text and build the final document

pub mod discover;
pub mod latex;
pub mod ocr;
pub mod preprocess;
