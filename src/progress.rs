//! Progress-callback trait for per-image conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the photo directory. The CLI uses
//! this to drive its progress bar; library callers can forward events
//! wherever they like.
//!
//! # Example
//!
//! ```rust
//! use notes2tex::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, index: usize, total: usize, file_name: &str, text_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} ({} chars)", index + 1, total, file_name, text_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each image.
///
/// With `concurrency > 1` the per-image methods may be called concurrently,
/// so implementations must protect shared mutable state. All methods have
/// no-op defaults.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after discovery, before any OCR work.
    fn on_conversion_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called just before the OCR engine is invoked for an image.
    ///
    /// `index` is the 0-based position in sorted input order.
    fn on_image_start(&self, index: usize, total_images: usize, file_name: &str) {
        let _ = (index, total_images, file_name);
    }

    /// Called when text was extracted. `text_len` is the byte length of the
    /// raw OCR text (0 for a blank page).
    fn on_image_complete(&self, index: usize, total_images: usize, file_name: &str, text_len: usize) {
        let _ = (index, total_images, file_name, text_len);
    }

    /// Called when extraction failed for an image.
    fn on_image_error(&self, index: usize, total_images: usize, file_name: &str, error: &str) {
        let _ = (index, total_images, file_name, error);
    }

    /// Called once after every image has been attempted.
    fn on_conversion_complete(&self, total_images: usize, success_count: usize) {
        let _ = (total_images, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        started_total: AtomicUsize,
        completed_total: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_conversion_start(&self, total_images: usize) {
            self.started_total.store(total_images, Ordering::SeqCst);
        }

        fn on_image_start(&self, _index: usize, _total: usize, _file_name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_complete(&self, _index: usize, _total: usize, _file_name: &str, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_error(&self, _index: usize, _total: usize, _file_name: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _total_images: usize, success_count: usize) {
            self.completed_total.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(2);
        cb.on_image_start(0, 2, "a.jpg");
        cb.on_image_complete(0, 2, "a.jpg", 42);
        cb.on_image_error(1, 2, "b.jpg", "decode failed");
        cb.on_conversion_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_conversion_start(3);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);

        tracker.on_image_start(0, 3, "a.jpg");
        tracker.on_image_complete(0, 3, "a.jpg", 100);
        tracker.on_image_start(1, 3, "b.jpg");
        tracker.on_image_complete(1, 3, "b.jpg", 0);
        tracker.on_image_start(2, 3, "c.jpg");
        tracker.on_image_error(2, 3, "c.jpg", "OCR timed out after 5s");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);

        tracker.on_conversion_complete(3, 2);
        assert_eq!(tracker.completed_total.load(Ordering::SeqCst), 2);
    }
}
