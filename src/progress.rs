//! Progress-callback trait for per-image conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConvertOptionsBuilder::progress_callback`] to hear about
//! each image as the assembler places it.
//!
//! Images are processed strictly one after another, so events arrive in
//! page order: `on_image_start(1)`, `on_image_complete(1)`,
//! `on_image_start(2)`, … A failing image produces `on_image_error` and
//! the conversion stops; `on_conversion_complete` is only sent on success.
//!
//! # Example
//!
//! ```rust
//! use snap2pdf::{ConversionProgressCallback, ConvertOptions};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     placed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, page_num: usize, total: usize, jpeg_bytes: usize) {
//!         self.placed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} placed ({} bytes)", page_num, total, jpeg_bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { placed: AtomicUsize::new(0) });
//!
//! let options = ConvertOptions::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the assembler as it processes each image.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first image is decoded.
    fn on_conversion_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called before an image is decoded.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page the image will land on
    /// * `total`: number of images in the run
    fn on_image_start(&self, page_num: usize, total: usize) {
        let _ = (page_num, total);
    }

    /// Called once an image has been placed on its page.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total`: number of images in the run
    /// * `jpeg_bytes`: size of the embedded JPEG stream
    fn on_image_complete(&self, page_num: usize, total: usize, jpeg_bytes: usize) {
        let _ = (page_num, total, jpeg_bytes);
    }

    /// Called when an image fails. The conversion aborts right after.
    fn on_image_error(&self, page_num: usize, total: usize, error: &str) {
        let _ = (page_num, total, error);
    }

    /// Called once the PDF has been serialised.
    fn on_conversion_complete(&self, total_pages: usize, pdf_bytes: usize) {
        let _ = (total_pages, pdf_bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConvertOptions`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
