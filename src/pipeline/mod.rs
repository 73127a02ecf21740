//! Pipeline stages for image-to-PDF conversion.
//!
//! Each submodule implements one transformation step and can be tested on
//! its own. [`crate::convert`] drives them in order, one image at a time.
//!
//! ## Data Flow
//!
//! ```text
//! acquire ──▶ watermark ──▶ compose ──▶ document
//! (decode,     (surface +     (JPEG +      (pdf-writer,
//!  HEIC→JPEG)   overlay)       fit)         DCTDecode)
//! ```
//!
//! 1. [`acquire`]   turns raw files into [`acquire::LoadedImage`]s, going
//!    through [`transcode`] for HEIC/HEIF. Runs in `spawn_blocking`.
//! 2. [`watermark`] copies an image onto a drawing surface and overlays the
//!    text, outlined by a [`font::WatermarkFont`].
//! 3. [`compose`]   encodes the surface as JPEG and fits it onto the page.
//! 4. [`document`]  collects the pages and writes the PDF.
//!
//! [`encode`] holds the shared data-URI and JPEG helpers.

pub mod acquire;
pub mod compose;
pub mod document;
pub mod encode;
pub mod font;
pub mod transcode;
pub mod watermark;
