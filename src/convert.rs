//! Conversion entry points: directory of photos in, LaTeX document out.
//!
//! [`convert`] runs the whole pipeline in memory and returns the document
//! together with per-image results. [`convert_to_file`] adds the final
//! write, which [`write_document`] also exposes on its own. All of them
//! return `Err` only for fatal problems; how a single bad photo is handled
//! depends on [`FailurePolicy`].

use crate::config::{ConversionConfig, FailurePolicy};
use crate::error::Notes2TexError;
use crate::output::{ConversionOutput, ConversionStats, ImageResult};
use crate::pipeline::discover::{self, ImageRef};
use crate::pipeline::latex::{self, DocumentMeta, Section};
use crate::pipeline::ocr::{self, OcrEngine, TesseractEngine};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Convert every image in `input_dir` into one LaTeX document.
///
/// # Returns
/// `Ok(ConversionOutput)` on success. Under [`FailurePolicy::Placeholder`]
/// this includes runs where some images failed (check
/// `output.stats.failed_images`). An empty directory yields a document with
/// zero sections.
///
/// # Errors
/// - input directory missing or unreadable
/// - OCR engine not available (only checked when there is work to do)
/// - [`Notes2TexError::ExtractionFailed`] for the first failing image under
///   [`FailurePolicy::Abort`]
pub async fn convert(
    input_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Notes2TexError> {
    let total_start = Instant::now();
    let input_dir = input_dir.as_ref();
    info!("Starting conversion: {}", input_dir.display());

    // ── Step 1: Discover images ──────────────────────────────────────────
    let images = discover::discover(input_dir, &config.extensions)?;
    let total = images.len();
    if total == 0 {
        warn!("No images found in {}", input_dir.display());
    } else {
        info!("Found {} images to process", total);
    }

    // ── Step 2: Resolve OCR engine ───────────────────────────────────────
    let engine = resolve_engine(config);
    if total > 0 && !engine.is_available().await {
        return Err(Notes2TexError::OcrEngineUnavailable {
            engine: engine.name().to_string(),
            hint: engine_hint(config),
        });
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    // ── Step 3: Extract text ─────────────────────────────────────────────
    let ocr_start = Instant::now();
    let results = extract_all(&engine, &images, config).await?;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;

    // ── Step 4: Assemble document ────────────────────────────────────────
    let sections: Vec<Section> = results.iter().map(Section::from).collect();
    let latex = latex::build_document(&sections, &DocumentMeta::from_config(config));
    debug!("Assembled document: {} sections, {} bytes", sections.len(), latex.len());

    // ── Step 5: Stats ────────────────────────────────────────────────────
    let processed = results.iter().filter(|r| r.is_success()).count();
    let stats = ConversionStats {
        total_images: total,
        processed_images: processed,
        failed_images: total - processed,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        ocr_duration_ms,
    };

    info!(
        "Conversion complete: {}/{} images, {}ms total",
        processed, total, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, processed);
    }

    Ok(ConversionOutput {
        latex,
        images: results,
        stats,
    })
}

/// Convert `input_dir` and write the document to `output_path`.
///
/// See [`write_document`] for how the file is written.
pub async fn convert_to_file(
    input_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Notes2TexError> {
    let output = convert(input_dir, config).await?;
    write_document(output_path, &output.latex).await?;
    Ok(output.stats)
}

/// Write a finished document to `output_path`.
///
/// Creates missing parent directories and replaces any existing file.
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// half-written document behind.
pub async fn write_document(output_path: impl AsRef<Path>, latex: &str) -> Result<(), Notes2TexError> {
    let path = output_path.as_ref();
    let write_failed = |source| Notes2TexError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("tex.tmp");
    tokio::fs::write(&tmp_path, latex).await.map_err(write_failed)?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }

    info!("LaTeX document written: {}", path.display());
    Ok(())
}

/// Synchronous wrapper around [`convert_to_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Notes2TexError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Notes2TexError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_to_file(input_dir, output_path, config))
}

/// List the images a conversion of `input_dir` would process, in order.
///
/// Does not require an OCR engine.
pub fn inspect(
    input_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<Vec<ImageRef>, Notes2TexError> {
    discover::discover(input_dir.as_ref(), &config.extensions)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// A caller-supplied engine wins; otherwise Tesseract from the config.
fn resolve_engine(config: &ConversionConfig) -> Arc<dyn OcrEngine> {
    match config.engine {
        Some(ref engine) => Arc::clone(engine),
        None => Arc::new(TesseractEngine::from_config(config)),
    }
}

fn engine_hint(config: &ConversionConfig) -> String {
    if config.engine.is_some() {
        return "The configured OCR engine reported itself unavailable.".to_string();
    }
    format!(
        "Could not run '{} --version'.\n\
        Install Tesseract (e.g. `apt install tesseract-ocr` or `brew install tesseract`)\n\
        or point --tesseract / NOTES2TEX_TESSERACT at the executable.",
        config.tesseract_cmd
    )
}

/// Run OCR over `images`, at most `config.concurrency` at a time.
///
/// `buffered` yields results in input order regardless of completion order,
/// so the returned vector is already sorted. Under `Abort` the first failure
/// in that order ends the stream and in-flight work is dropped.
async fn extract_all(
    engine: &Arc<dyn OcrEngine>,
    images: &[ImageRef],
    config: &ConversionConfig,
) -> Result<Vec<ImageResult>, Notes2TexError> {
    let total = images.len();
    let timeout = Duration::from_secs(config.ocr_timeout_secs);
    let policy = config.failure_policy;

    stream::iter(images.iter().map(|image| {
        let engine = Arc::clone(engine);
        let callback = config.progress_callback.clone();
        async move {
            if let Some(ref cb) = callback {
                cb.on_image_start(image.index, total, &image.file_name);
            }

            let result = ocr::extract_text(engine.as_ref(), image, timeout).await;

            if let Some(ref cb) = callback {
                match &result.error {
                    None => cb.on_image_complete(image.index, total, &image.file_name, result.text.len()),
                    Some(e) => cb.on_image_error(image.index, total, &image.file_name, &e.to_string()),
                }
            }

            match (&result.error, policy) {
                (Some(cause), FailurePolicy::Abort) => Err(Notes2TexError::ExtractionFailed {
                    image: result.path.clone(),
                    cause: cause.clone(),
                }),
                _ => Ok(result),
            }
        }
    }))
    .buffered(config.concurrency.max(1))
    .try_collect()
    .await
}
