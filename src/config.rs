//! Configuration types for image-to-LaTeX conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The input directory and output path
//! are not part of the config; they are passed to the `convert*` entry
//! points so one config can be reused across several photo folders.

use crate::error::Notes2TexError;
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use notes2tex::{ConversionConfig, FailurePolicy};
///
/// let config = ConversionConfig::builder()
///     .language("eng+deu")
///     .concurrency(2)
///     .failure_policy(FailurePolicy::Abort)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Accepted file extensions, lowercase, without the dot.
    /// Default: `jpg`, `jpeg`, `png`. Matching is case-insensitive.
    pub extensions: Vec<String>,

    /// Number of images handed to the OCR engine at once. Default: 4.
    ///
    /// Results are always merged back in sorted input order, so this only
    /// affects wall-clock time. Use 1 for strictly sequential processing.
    pub concurrency: usize,

    /// What to do when a single image cannot be processed. Default: placeholder section.
    pub failure_policy: FailurePolicy,

    /// Per-image OCR timeout in seconds. Default: 120.
    pub ocr_timeout_secs: u64,

    /// Tesseract executable name or path. Default: `tesseract`.
    pub tesseract_cmd: String,

    /// Tesseract language(s), e.g. `eng` or `eng+fra`. If None, Tesseract's default is used.
    pub language: Option<String>,

    /// Tesseract page segmentation mode (`--psm`, 0–13). If None, Tesseract's default is used.
    pub page_seg_mode: Option<u8>,

    /// Pre-constructed OCR engine. Takes precedence over the Tesseract settings.
    pub engine: Option<Arc<dyn OcrEngine>>,

    /// Document `\title{}`. Default: "Converted Notes from Images".
    pub title: String,

    /// Document `\author{}`. Default: "OCR Conversion System".
    pub author: String,

    /// Emit the short unnumbered Introduction section. Default: true.
    pub include_intro: bool,

    /// Optional progress events sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            concurrency: 4,
            failure_policy: FailurePolicy::default(),
            ocr_timeout_secs: 120,
            tesseract_cmd: "tesseract".to_string(),
            language: None,
            page_seg_mode: None,
            engine: None,
            title: "Converted Notes from Images".to_string(),
            author: "OCR Conversion System".to_string(),
            include_intro: true,
            progress_callback: None,
        }
    }
}

/// Extensions accepted when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("extensions", &self.extensions)
            .field("concurrency", &self.concurrency)
            .field("failure_policy", &self.failure_policy)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("language", &self.language)
            .field("page_seg_mode", &self.page_seg_mode)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("title", &self.title)
            .field("author", &self.author)
            .field("include_intro", &self.include_intro)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// Replace the accepted extension set. Leading dots are stripped and
    /// entries lowercased; empty entries are ignored.
    pub fn extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.extensions = exts
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs;
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = Some(lang.into());
        self
    }

    pub fn page_seg_mode(mut self, psm: u8) -> Self {
        self.config.page_seg_mode = Some(psm);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.author = author.into();
        self
    }

    pub fn include_intro(mut self, v: bool) -> Self {
        self.config.include_intro = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Notes2TexError> {
        let c = &self.config;
        if c.extensions.is_empty() {
            return Err(Notes2TexError::InvalidConfig(
                "At least one image extension must be accepted".into(),
            ));
        }
        if c.ocr_timeout_secs == 0 {
            return Err(Notes2TexError::InvalidConfig(
                "OCR timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(psm) = c.page_seg_mode {
            if psm > 13 {
                return Err(Notes2TexError::InvalidConfig(format!(
                    "Page segmentation mode must be 0–13, got {}",
                    psm
                )));
            }
        }
        if c.engine.is_none() && c.tesseract_cmd.trim().is_empty() {
            return Err(Notes2TexError::InvalidConfig(
                "Tesseract command must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How a per-image OCR failure affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Emit a section with an error marker for the image and keep going. (default)
    #[default]
    Placeholder,
    /// Stop at the first failing image (in input order) and write nothing.
    Abort,
}
