//! CLI binary for notes2tex.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use notes2tex::{
    convert, inspect, write_document, ConversionConfig, ConversionProgressCallback, FailurePolicy,
    ProgressCallback,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per image.
/// Lines may arrive out of order when `--concurrency` > 1.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-image wall-clock start times, keyed by index.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Scanning directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_images: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total_images as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("OCR");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_images} images to process"))
        ));
    }

    fn on_image_start(&self, index: usize, _total: usize, file_name: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(file_name.to_string());
    }

    fn on_image_complete(&self, index: usize, total: usize, file_name: &str, text_len: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            green("✓"),
            index + 1,
            total,
            file_name,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, index: usize, total: usize, file_name: &str, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            red("✗"),
            index + 1,
            total,
            file_name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_images: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed > 0 {
            eprintln!(
                "{} {}/{} images recognised  ({} failed)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_images,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert ./initial_trial_photos into ./notes.tex
  notes2tex

  # Explicit input and output
  notes2tex ~/scans/lecture-03 -o lecture-03.tex

  # German + English handwriting, one column of text per photo
  notes2tex photos --lang deu+eng --psm 4

  # Stop at the first unreadable photo instead of inserting a placeholder
  notes2tex photos --on-error abort

  # Show which files would be processed
  notes2tex photos --list-only

AFTER CONVERSION:
  pdflatex notes.tex

ENVIRONMENT VARIABLES:
  NOTES2TEX_INPUT_DIR     Input directory (default: initial_trial_photos)
  NOTES2TEX_OUTPUT        Output .tex path (default: notes.tex)
  NOTES2TEX_TESSERACT     Tesseract executable (default: tesseract)
  NOTES2TEX_LANG          Tesseract language(s), e.g. eng+fra
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Convert a directory of note photos into a LaTeX document via Tesseract OCR.
#[derive(Parser, Debug)]
#[command(
    name = "notes2tex",
    version,
    about = "Convert a directory of note photos into a LaTeX document via Tesseract OCR",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the images.
    #[arg(env = "NOTES2TEX_INPUT_DIR", default_value = "initial_trial_photos")]
    input_dir: PathBuf,

    /// Output LaTeX file (created or overwritten).
    #[arg(short, long, env = "NOTES2TEX_OUTPUT", default_value = "notes.tex")]
    output: PathBuf,

    /// Tesseract executable name or path.
    #[arg(long, env = "NOTES2TEX_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// Tesseract language(s), e.g. eng, eng+deu.
    #[arg(long, env = "NOTES2TEX_LANG")]
    lang: Option<String>,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, env = "NOTES2TEX_PSM", value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: Option<u8>,

    /// Number of images processed concurrently.
    #[arg(short, long, env = "NOTES2TEX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Per-image OCR timeout in seconds.
    #[arg(long, env = "NOTES2TEX_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// What to do when an image cannot be processed.
    #[arg(long, env = "NOTES2TEX_ON_ERROR", value_enum, default_value = "placeholder")]
    on_error: OnErrorArg,

    /// Accepted image extensions.
    #[arg(long, env = "NOTES2TEX_EXT", value_delimiter = ',', default_value = "jpg,jpeg,png")]
    ext: Vec<String>,

    /// Document title.
    #[arg(long, env = "NOTES2TEX_TITLE")]
    title: Option<String>,

    /// Document author.
    #[arg(long, env = "NOTES2TEX_AUTHOR")]
    author: Option<String>,

    /// Omit the introduction paragraph.
    #[arg(long)]
    no_intro: bool,

    /// List the images that would be processed, then exit.
    #[arg(long)]
    list_only: bool,

    /// Print per-image results and stats as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "NOTES2TEX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OnErrorArg {
    Placeholder,
    Abort,
}

impl From<OnErrorArg> for FailurePolicy {
    fn from(v: OnErrorArg) -> Self {
        match v {
            OnErrorArg::Placeholder => FailurePolicy::Placeholder,
            OnErrorArg::Abort => FailurePolicy::Abort,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would interleave with the progress bar, so they are only
    // shown when the bar is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List-only mode ───────────────────────────────────────────────────
    if cli.list_only {
        let config = build_config(&cli, None)?;
        let images = inspect(&cli.input_dir, &config)
            .with_context(|| format!("Failed to list images in {}", cli.input_dir.display()))?;
        if cli.json {
            let names: Vec<&str> = images.iter().map(|i| i.file_name.as_str()).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&names).context("Failed to serialise image list")?
            );
        } else {
            for image in &images {
                println!("{}", image.path.display());
            }
            if !cli.quiet {
                eprintln!("{} images", images.len());
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input_dir, &config).await.with_context(|| {
        format!("Conversion of {} failed", cli.input_dir.display())
    })?;
    write_document(&cli.output, &output.latex)
        .await
        .with_context(|| format!("Could not write {}", cli.output.display()))?;
    let stats = &output.stats;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise conversion output")?
        );
    }

    if !cli.quiet {
        if stats.total_images == 0 {
            eprintln!(
                "{}  No images found in {}; wrote an empty document",
                cyan("⚠"),
                cli.input_dir.display()
            );
        }
        eprintln!(
            "{}  {}/{} images  {}ms  →  {}",
            if stats.failed_images == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.processed_images,
            stats.total_images,
            stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
        eprintln!(
            "   {}",
            dim(&format!("To compile: pdflatex {}", cli.output.display()))
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .extensions(&cli.ext)
        .concurrency(cli.concurrency)
        .ocr_timeout_secs(cli.timeout)
        .failure_policy(cli.on_error.into())
        .tesseract_cmd(cli.tesseract.clone())
        .include_intro(!cli.no_intro);

    if let Some(ref lang) = cli.lang {
        builder = builder.language(lang.clone());
    }
    if let Some(psm) = cli.psm {
        builder = builder.page_seg_mode(psm);
    }
    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(ref author) = cli.author {
        builder = builder.author(author.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
