//! # snap2pdf
//!
//! Turn a handful of photos or scans into a single PDF, one image per page.
//!
//! Everything happens locally: images are decoded in-process (HEIC/HEIF
//! photos are transcoded to JPEG first), optionally stamped with a text
//! watermark, re-encoded as JPEG at the chosen quality, and embedded on
//! A4 or Letter pages, scaled to fit and centred.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Acquire    decode, HEIC→JPEG, probe size (spawn_blocking)
//!  ├─ 2. Watermark  copy onto a surface, draw shadow + text
//!  ├─ 3. Compose    JPEG at quality q, fit-to-page placement
//!  └─ 4. Assemble   one page per image, DCTDecode XObjects
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snap2pdf::{acquire, convert, ConvertOptions, RawFile, WatermarkOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let files = vec![
//!         RawFile::from_path("receipt-1.jpg").await?,
//!         // HEIC/HEIF needs the `heif` feature; without it this file
//!         // fails with `Snap2PdfError::Decode`.
//!         RawFile::from_path("receipt-2.heic").await?,
//!     ];
//!     let images = acquire(files).await?;
//!
//!     let options = ConvertOptions::builder()
//!         .quality(0.8)
//!         .watermark(WatermarkOptions::new("COPY"))
//!         .build()?;
//!     let output = convert(&images, &options).await?;
//!     std::fs::write("receipts.pdf", &output.pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `snap2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `heif`  | off     | HEIC/HEIF decoding through libheif (needs the system library) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! snap2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod images;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    Compression, ConvertOptions, ConvertOptionsBuilder, Orientation, PageDimensions, PageSize,
    WatermarkOptions, WatermarkPosition,
};
pub use convert::{convert, convert_files, convert_sync, convert_to_file, images_to_pdf, save_pdf};
pub use error::Snap2PdfError;
pub use images::ImageList;
pub use output::{ConversionOutput, ConversionStats, PageResult};
pub use pipeline::acquire::{acquire, acquire_with, read_files, LoadedImage, RawFile};
pub use pipeline::compose::{fit_to_page, place_on_page, ComposedPage, Placement};
pub use pipeline::document::DocumentBuilder;
pub use pipeline::font::{OutlineFont, WatermarkFont};
pub use pipeline::transcode::{default_transcoder, Transcoder};
pub use pipeline::watermark::{apply_watermark, Surface};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
