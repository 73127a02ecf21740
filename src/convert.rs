//! Conversion entry points.
//!
//! [`convert`] is the core: it walks the images strictly in order, runs each
//! one's decode → watermark → encode work on the blocking pool, and places
//! the result on its own page. The other functions are conveniences around
//! it for writing to disk, blocking callers, and starting from file paths.

use crate::config::{ConvertOptions, PageDimensions, WatermarkOptions};
use crate::error::Snap2PdfError;
use crate::output::{ConversionOutput, ConversionStats, PageResult};
use crate::pipeline::acquire::{acquire, read_files, LoadedImage};
use crate::pipeline::compose::{place_on_page, ComposedPage};
use crate::pipeline::document::DocumentBuilder;
use crate::pipeline::encode::from_data_uri;
use crate::pipeline::font::{OutlineFont, WatermarkFont};
use crate::pipeline::watermark::apply_watermark;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert loaded images into a PDF, one image per page.
///
/// Every image is scaled to fit the configured page without distortion and
/// centred on it. If a watermark is active it is drawn on each image at the
/// image's own resolution before scaling.
///
/// # Errors
/// - [`Snap2PdfError::EmptyInput`] if `images` is empty; nothing else is
///   attempted.
/// - [`Snap2PdfError::Decode`] naming the first image that cannot be read.
/// - [`Snap2PdfError::Render`] if the watermark cannot be drawn.
/// - [`Snap2PdfError::Encode`] if a page's JPEG cannot be produced.
///
/// Any error discards the partially built document.
pub async fn convert(
    images: &[LoadedImage],
    options: &ConvertOptions,
) -> Result<ConversionOutput, Snap2PdfError> {
    if images.is_empty() {
        return Err(Snap2PdfError::EmptyInput);
    }

    let start = Instant::now();
    let total = images.len();
    let page = options.page_dimensions();
    let quality = options.quality();
    let watermark = options.active_watermark().cloned();
    info!(
        "Converting {} image(s) → {:?} {:?} ({}×{} pt), quality {:.2}",
        total, options.size, options.orientation, page.width, page.height, quality
    );

    let font = match watermark {
        Some(_) => resolve_font(options).await?,
        None => None,
    };

    if let Some(ref cb) = options.progress_callback {
        cb.on_conversion_start(total);
    }

    let mut builder = DocumentBuilder::new(page);
    if let Some(ref title) = options.title {
        builder = builder.title(title);
    }
    if let Some(ref author) = options.author {
        builder = builder.author(author);
    }

    let mut pages = Vec::with_capacity(total);
    for (i, image) in images.iter().enumerate() {
        let page_num = i + 1;
        if let Some(ref cb) = options.progress_callback {
            cb.on_image_start(page_num, total);
        }

        let name = image.name.clone();
        let src = Arc::clone(&image.src);
        let wm = watermark.clone();
        let font = font.clone();
        let composed = tokio::task::spawn_blocking(move || {
            render_page(&name, &src, wm.as_ref(), font.as_deref(), quality, page, page_num)
        })
        .await
        .map_err(|e| Snap2PdfError::Internal(format!("Page task panicked: {}", e)))
        .and_then(|r| r);

        let composed = match composed {
            Ok(c) => c,
            Err(e) => {
                warn!("Page {} ({}) failed: {}", page_num, image.name, e);
                if let Some(ref cb) = options.progress_callback {
                    cb.on_image_error(page_num, total, &e.to_string());
                }
                return Err(e);
            }
        };

        debug!(
            "Page {}/{}: {} placed at ({:.2}, {:.2}) size {:.2}×{:.2} pt",
            page_num,
            total,
            image.name,
            composed.placement.offset_x,
            composed.placement.offset_y,
            composed.placement.draw_width,
            composed.placement.draw_height
        );
        let jpeg_bytes = composed.jpeg.len();
        pages.push(PageResult {
            page_num,
            image_id: image.id,
            image_name: image.name.clone(),
            page_size: page,
            placement: composed.placement,
            jpeg_bytes,
        });

        if i > 0 {
            builder.add_page(page);
        }
        builder.place_image(composed);

        if let Some(ref cb) = options.progress_callback {
            cb.on_image_complete(page_num, total, jpeg_bytes);
        }
    }

    let pdf = builder.finish();
    let stats = ConversionStats {
        total_images: total,
        total_jpeg_bytes: pages.iter().map(|p| p.jpeg_bytes).sum(),
        pdf_bytes: pdf.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: {} page(s), {} bytes, {}ms",
        total, stats.pdf_bytes, stats.duration_ms
    );

    if let Some(ref cb) = options.progress_callback {
        cb.on_conversion_complete(total, pdf.len());
    }

    Ok(ConversionOutput { pdf, pages, stats })
}

/// Like [`convert`], returning only the PDF bytes.
pub async fn images_to_pdf(
    images: &[LoadedImage],
    options: &ConvertOptions,
) -> Result<Vec<u8>, Snap2PdfError> {
    convert(images, options).await.map(|output| output.pdf)
}

/// Convert and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// truncated PDF behind.
pub async fn convert_to_file(
    images: &[LoadedImage],
    output_path: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<ConversionStats, Snap2PdfError> {
    let output = convert(images, options).await?;
    save_pdf(&output.pdf, output_path).await?;
    Ok(output.stats)
}

/// Atomically write PDF bytes to `path`, creating parent directories.
pub async fn save_pdf(pdf: &[u8], path: impl AsRef<Path>) -> Result<(), Snap2PdfError> {
    let path = path.as_ref();
    let write_failed = |e: std::io::Error| Snap2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, pdf).await.map_err(write_failed)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }
    debug!("Wrote {} bytes to {}", pdf.len(), path.display());
    Ok(())
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    images: &[LoadedImage],
    options: &ConvertOptions,
) -> Result<ConversionOutput, Snap2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Snap2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(images, options))
}

/// Read image files from disk, acquire them, and convert.
pub async fn convert_files(
    paths: &[PathBuf],
    options: &ConvertOptions,
) -> Result<ConversionOutput, Snap2PdfError> {
    if paths.is_empty() {
        return Err(Snap2PdfError::EmptyInput);
    }
    let files = read_files(paths).await?;
    let images = acquire(files).await?;
    convert(&images, options).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The injected font if any, otherwise the system sans-serif face.
async fn resolve_font(
    options: &ConvertOptions,
) -> Result<Option<Arc<dyn WatermarkFont>>, Snap2PdfError> {
    if let Some(ref font) = options.font {
        return Ok(Some(Arc::clone(font)));
    }
    let system = tokio::task::spawn_blocking(OutlineFont::system)
        .await
        .map_err(|e| Snap2PdfError::Internal(format!("Font lookup panicked: {}", e)))?;
    if system.is_none() {
        warn!("No system font found; watermark cannot be drawn");
    }
    Ok(system.map(|f| f as Arc<dyn WatermarkFont>))
}

/// Blocking per-image work: decode, watermark, encode, fit.
fn render_page(
    name: &str,
    src: &str,
    watermark: Option<&WatermarkOptions>,
    font: Option<&dyn WatermarkFont>,
    quality: f32,
    page: PageDimensions,
    page_num: usize,
) -> Result<ComposedPage, Snap2PdfError> {
    let (_, bytes) = from_data_uri(src).map_err(|e| Snap2PdfError::decode(name, e))?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| Snap2PdfError::decode(name, e))?;
    let surface = apply_watermark(&decoded, watermark, font)?;
    place_on_page(&surface, quality, page).map_err(|e| Snap2PdfError::Encode {
        page: page_num,
        detail: e.to_string(),
    })
}
