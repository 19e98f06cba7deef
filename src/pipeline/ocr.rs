//! OCR: the pluggable engine seam and the Tesseract CLI implementation.
//!
//! The pipeline never talks to Tesseract directly. It holds an
//! `Arc<dyn OcrEngine>`, so tests run against stubs and callers can swap
//! in any engine that maps an image path to text.
//!
//! [`TesseractEngine`] shells out to the `tesseract` binary
//! (`tesseract <image> stdout`) rather than linking libtesseract, which keeps
//! the build free of C toolchain requirements. The child is spawned with
//! `kill_on_drop`, so when the per-image timeout in [`extract_text`] fires
//! and the future is dropped, the process goes with it.

use crate::config::ConversionConfig;
use crate::error::OcrError;
use crate::output::ImageResult;
use crate::pipeline::discover::ImageRef;
use crate::pipeline::preprocess::prepare_image;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// An OCR capability: image in, recognised text out.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Whether the engine can be used at all (binary installed, model loaded…).
    async fn is_available(&self) -> bool {
        true
    }

    /// Recognise the text in the image at `image`.
    ///
    /// Implementations return the text as recognised; the pipeline does not
    /// correct or reformat it.
    async fn extract(&self, image: &Path) -> Result<String, OcrError>;
}

/// Tesseract driven through its command-line interface.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: String,
    language: Option<String>,
    page_seg_mode: Option<u8>,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: None,
            page_seg_mode: None,
        }
    }

    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.language = Some(lang.into());
        self
    }

    pub fn with_page_seg_mode(mut self, psm: u8) -> Self {
        self.page_seg_mode = Some(psm);
        self
    }

    /// Build an engine from the Tesseract settings in `config`.
    pub fn from_config(config: &ConversionConfig) -> Self {
        let mut engine = Self::new(config.tesseract_cmd.clone());
        if let Some(ref lang) = config.language {
            engine = engine.with_language(lang.clone());
        }
        if let Some(psm) = config.page_seg_mode {
            engine = engine.with_page_seg_mode(psm);
        }
        engine
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for recognising `image`, printing the text to stdout.
    fn args(&self, image: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![image.as_os_str().to_owned(), "stdout".into()];
        if let Some(ref lang) = self.language {
            args.push("-l".into());
            args.push(lang.into());
        }
        if let Some(psm) = self.page_seg_mode {
            args.push("--psm".into());
            args.push(psm.to_string().into());
        }
        args
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn extract(&self, image: &Path) -> Result<String, OcrError> {
        let prepared = prepare_image(image).await?;

        let output = Command::new(&self.program)
            .args(self.args(prepared.path()))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| OcrError::EngineNotFound {
                program: self.program.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8(output.stdout).map_err(|e| OcrError::InvalidOutput {
            detail: e.to_string(),
        })?;

        // Tesseract terminates every page with a form feed.
        Ok(text.trim().to_string())
    }
}

/// Run `engine` on one image under `timeout`.
///
/// Always returns an [`ImageResult`]; a failure is recorded in
/// `result.error` so the caller can apply its failure policy.
pub async fn extract_text(engine: &dyn OcrEngine, image: &ImageRef, timeout: Duration) -> ImageResult {
    let start = Instant::now();

    let outcome = match tokio::time::timeout(timeout, engine.extract(&image.path)).await {
        Ok(result) => result,
        Err(_) => Err(OcrError::Timeout {
            secs: timeout.as_secs(),
        }),
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    let (text, error) = match outcome {
        Ok(text) => {
            debug!(
                "{}: {} chars in {}ms via {}",
                image.file_name,
                text.len(),
                duration_ms,
                engine.name()
            );
            (text, None)
        }
        Err(e) => {
            warn!("{}: extraction failed: {}", image.file_name, e);
            (String::new(), Some(e))
        }
    };

    ImageResult {
        index: image.index,
        file_name: image.file_name.clone(),
        path: image.path.clone(),
        text,
        error,
        duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct SlowEngine;

    #[async_trait]
    impl OcrEngine for SlowEngine {
        fn name(&self) -> &str {
            "slow"
        }

        async fn extract(&self, _image: &Path) -> Result<String, OcrError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".into())
        }
    }

    struct EchoEngine;

    #[async_trait]
    impl OcrEngine for EchoEngine {
        fn name(&self) -> &str {
            "echo"
        }

        async fn extract(&self, image: &Path) -> Result<String, OcrError> {
            Ok(format!("text of {}", image.display()))
        }
    }

    fn image_ref(path: &str) -> ImageRef {
        let path = PathBuf::from(path);
        ImageRef {
            file_name: path.file_name().unwrap().to_string_lossy().into_owned(),
            path,
            index: 3,
        }
    }

    #[test]
    fn tesseract_args_default() {
        let engine = TesseractEngine::default();
        let args = engine.args(Path::new("/tmp/a.png"));
        assert_eq!(args, vec![OsString::from("/tmp/a.png"), OsString::from("stdout")]);
    }

    #[test]
    fn tesseract_args_with_language_and_psm() {
        let engine = TesseractEngine::new("tesseract")
            .with_language("eng+deu")
            .with_page_seg_mode(6);
        let args: Vec<String> = engine
            .args(Path::new("x.png"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["x.png", "stdout", "-l", "eng+deu", "--psm", "6"]);
    }

    #[test]
    fn from_config_copies_tesseract_settings() {
        let config = ConversionConfig::builder()
            .tesseract_cmd("/opt/tess/bin/tesseract")
            .language("fra")
            .build()
            .unwrap();
        let engine = TesseractEngine::from_config(&config);
        assert_eq!(engine.program(), "/opt/tess/bin/tesseract");
        assert_eq!(engine.language.as_deref(), Some("fra"));
        assert_eq!(engine.page_seg_mode, None);
    }

    #[tokio::test]
    async fn missing_program_is_engine_not_found() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("page.png");
        RgbImage::from_pixel(4, 4, Rgb([255, 255, 255])).save(&src).unwrap();

        let engine = TesseractEngine::new("notes2tex-no-such-ocr-binary");
        assert!(!engine.is_available().await);

        let err = engine.extract(&src).await.unwrap_err();
        assert!(matches!(err, OcrError::EngineNotFound { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn undecodable_image_fails_before_spawning() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("broken.jpg");
        std::fs::write(&src, b"\xff\xd8 truncated").unwrap();

        let engine = TesseractEngine::new("notes2tex-no-such-ocr-binary");
        let err = engine.extract(&src).await.unwrap_err();
        assert!(matches!(err, OcrError::Decode { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn extract_text_records_success() {
        let result = extract_text(&EchoEngine, &image_ref("photos/a.jpg"), Duration::from_secs(5)).await;
        assert!(result.is_success());
        assert_eq!(result.index, 3);
        assert_eq!(result.file_name, "a.jpg");
        assert_eq!(result.text, "text of photos/a.jpg");
    }

    #[tokio::test]
    async fn extract_text_times_out() {
        let result = extract_text(&SlowEngine, &image_ref("b.jpg"), Duration::from_millis(50)).await;
        assert!(matches!(result.error, Some(OcrError::Timeout { .. })));
        assert!(result.text.is_empty());
    }

    // ── Tesseract output handling, against stand-in shell scripts ────────

    /// Writes an executable `/bin/sh` script plus a decodable page image.
    #[cfg(unix)]
    fn fake_tesseract(body: &str) -> (TempDir, TesseractEngine, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("fake-tesseract");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let page = tmp.path().join("page.png");
        RgbImage::from_pixel(4, 4, Rgb([255, 255, 255])).save(&page).unwrap();

        let engine = TesseractEngine::new(script.to_string_lossy());
        (tmp, engine, page)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_engine_failed_with_stderr() {
        let (_tmp, engine, page) = fake_tesseract("echo boom >&2\nexit 3");

        match engine.extract(&page).await {
            Err(OcrError::EngineFailed { status, stderr }) => {
                assert!(status.contains('3'), "status: {status}");
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected EngineFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn trailing_form_feed_is_trimmed() {
        let (_tmp, engine, page) = fake_tesseract(r"printf 'Hello\n\f'");

        assert_eq!(engine.extract(&page).await.unwrap(), "Hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_stdout_is_invalid_output() {
        let (_tmp, engine, page) = fake_tesseract(r"printf '\377\376'");

        let err = engine.extract(&page).await.unwrap_err();
        assert!(matches!(err, OcrError::InvalidOutput { .. }), "got: {err:?}");
    }
}
