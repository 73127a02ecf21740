//! Configuration types for image-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConvertOptions`], built
//! via its [`ConvertOptionsBuilder`]. A value is immutable once built and is
//! only ever borrowed by the pipeline, so the caller can keep tweaking its
//! own copy between runs without affecting a conversion in flight.

use crate::error::Snap2PdfError;
use crate::pipeline::font::WatermarkFont;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lowest accepted JPEG quality factor.
pub const MIN_QUALITY: f32 = 0.1;
/// Highest accepted JPEG quality factor (visually lossless).
pub const MAX_QUALITY: f32 = 1.0;
/// Quality used when compression is switched off.
pub const UNCOMPRESSED_QUALITY: f32 = 0.95;

/// Clamp a requested quality factor into `[MIN_QUALITY, MAX_QUALITY]`.
///
/// `NaN` is treated as "no preference" and maps to [`UNCOMPRESSED_QUALITY`].
pub fn clamp_quality(q: f32) -> f32 {
    if q.is_nan() {
        return UNCOMPRESSED_QUALITY;
    }
    q.clamp(MIN_QUALITY, MAX_QUALITY)
}

/// Options for one conversion run.
///
/// Built via [`ConvertOptions::builder()`] or [`ConvertOptions::default()`].
///
/// # Example
/// ```rust
/// use snap2pdf::{ConvertOptions, Orientation, PageSize, WatermarkOptions};
///
/// let options = ConvertOptions::builder()
///     .size(PageSize::Letter)
///     .orientation(Orientation::Landscape)
///     .quality(0.7)
///     .watermark(WatermarkOptions::new("DRAFT"))
///     .build()
///     .unwrap();
/// assert_eq!(options.page_dimensions().width, 792.0);
/// ```
#[derive(Clone)]
pub struct ConvertOptions {
    /// Page preset. Default: A4.
    pub size: PageSize,

    /// Page orientation. Default: portrait.
    pub orientation: Orientation,

    /// JPEG quality factor, 0.1–1.0. Default: 0.95.
    ///
    /// Read it through [`ConvertOptions::quality`], which clamps.
    pub quality: f32,

    /// Optional text watermark. `None` means no overlay.
    pub watermark: Option<WatermarkOptions>,

    /// Font used to draw the watermark. If None, a system sans-serif face
    /// is looked up the first time a watermark is drawn.
    pub font: Option<Arc<dyn WatermarkFont>>,

    /// Written to the PDF document information dictionary.
    pub title: Option<String>,

    /// Written to the PDF document information dictionary.
    pub author: Option<String>,

    /// Per-image progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            size: PageSize::default(),
            orientation: Orientation::default(),
            quality: UNCOMPRESSED_QUALITY,
            watermark: None,
            font: None,
            title: None,
            author: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("size", &self.size)
            .field("orientation", &self.orientation)
            .field("quality", &self.quality)
            .field("watermark", &self.watermark)
            .field("font", &self.font.as_ref().map(|_| "<dyn WatermarkFont>"))
            .field("title", &self.title)
            .field("author", &self.author)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConvertOptions {
    /// Create a new builder for `ConvertOptions`.
    pub fn builder() -> ConvertOptionsBuilder {
        ConvertOptionsBuilder {
            options: Self::default(),
        }
    }

    /// The effective quality factor, always within `[0.1, 1.0]`.
    pub fn quality(&self) -> f32 {
        clamp_quality(self.quality)
    }

    /// Page size in PDF points for the configured preset and orientation.
    pub fn page_dimensions(&self) -> PageDimensions {
        self.size.dimensions(self.orientation)
    }

    /// The watermark, only if it would actually draw something.
    pub fn active_watermark(&self) -> Option<&WatermarkOptions> {
        self.watermark.as_ref().filter(|w| w.is_active())
    }
}

/// Builder for [`ConvertOptions`].
#[derive(Debug)]
pub struct ConvertOptionsBuilder {
    options: ConvertOptions,
}

impl ConvertOptionsBuilder {
    pub fn size(mut self, size: PageSize) -> Self {
        self.options.size = size;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.options.orientation = orientation;
        self
    }

    pub fn quality(mut self, q: f32) -> Self {
        self.options.quality = clamp_quality(q);
        self
    }

    /// Derive the quality from the compression preset.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.options.quality = compression.quality();
        self
    }

    pub fn watermark(mut self, watermark: WatermarkOptions) -> Self {
        self.options.watermark = Some(watermark);
        self
    }

    pub fn font(mut self, font: Arc<dyn WatermarkFont>) -> Self {
        self.options.font = Some(font);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.options.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.options.author = Some(author.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.options.progress_callback = Some(cb);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<ConvertOptions, Snap2PdfError> {
        if let Some(ref w) = self.options.watermark {
            if !(w.font_size.is_finite() && w.font_size > 0.0) {
                return Err(Snap2PdfError::InvalidConfig(format!(
                    "Watermark font size must be positive, got {}",
                    w.font_size
                )));
            }
            if !w.rotation.is_finite() {
                return Err(Snap2PdfError::InvalidConfig(
                    "Watermark rotation must be a finite number of degrees".into(),
                ));
            }
        }
        Ok(self.options)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Page size preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// ISO A4, 595 × 842 pt. (default)
    #[default]
    A4,
    /// US Letter, 612 × 792 pt.
    Letter,
}

impl PageSize {
    /// Page dimensions in PDF points (1/72 in).
    pub fn dimensions(self, orientation: Orientation) -> PageDimensions {
        let (w, h) = match self {
            PageSize::A4 => (595.0, 842.0),
            PageSize::Letter => (612.0, 792.0),
        };
        match orientation {
            Orientation::Portrait => PageDimensions::new(w, h),
            Orientation::Landscape => PageDimensions::new(h, w),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide. (default)
    #[default]
    Portrait,
    /// Wider than tall.
    Landscape,
}

/// Width and height of a page in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f32,
    pub height: f32,
}

impl PageDimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// The compression switch and slider of the conversion form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Compression {
    /// Near-lossless output (quality 0.95). (default)
    #[default]
    Off,
    /// Compressed output; the slider value runs 40–95 (percent).
    On(u8),
}

impl Compression {
    /// Lowest slider value.
    pub const MIN_LEVEL: u8 = 40;
    /// Highest slider value.
    pub const MAX_LEVEL: u8 = 95;
    /// Slider position when compression is first switched on.
    pub const DEFAULT_LEVEL: u8 = 70;

    /// Compression switched on at the default slider position.
    pub fn on() -> Self {
        Compression::On(Self::DEFAULT_LEVEL)
    }

    /// The quality factor this preset maps to.
    pub fn quality(self) -> f32 {
        match self {
            Compression::Off => UNCOMPRESSED_QUALITY,
            Compression::On(level) => {
                let level = level.clamp(Self::MIN_LEVEL, Self::MAX_LEVEL);
                clamp_quality(level as f32 / 100.0)
            }
        }
    }
}

/// Where the watermark is anchored before rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    TopLeft,
    #[default]
    Center,
    BottomRight,
}

/// Text watermark drawn on every image before it is placed on its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    /// Master switch, mirroring the form toggle. Default: true.
    pub enabled: bool,
    /// Watermark text. Empty or whitespace-only disables the overlay.
    pub text: String,
    /// Font size in pixels of the source image. Default: 32.
    pub font_size: f32,
    /// 0.0–1.0; values outside are clamped when drawing. Default: 0.3.
    pub opacity: f32,
    /// Degrees, any value. Default: 0.
    pub rotation: f32,
    /// Default: center.
    pub position: WatermarkPosition,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            text: String::new(),
            font_size: 32.0,
            opacity: 0.3,
            rotation: 0.0,
            position: WatermarkPosition::default(),
        }
    }
}

impl WatermarkOptions {
    /// Watermark with the given text and default styling.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn font_size(mut self, px: f32) -> Self {
        self.font_size = px;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn position(mut self, position: WatermarkPosition) -> Self {
        self.position = position;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether drawing this watermark changes any pixel.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.text.trim().is_empty() && self.clamped_opacity() > 0.0
    }

    /// Opacity clamped into `[0, 1]`; `NaN` counts as fully transparent.
    pub fn clamped_opacity(&self) -> f32 {
        if self.opacity.is_nan() {
            0.0
        } else {
            self.opacity.clamp(0.0, 1.0)
        }
    }

    /// Rotation normalised into `[0, 360)`.
    pub fn normalized_rotation(&self) -> f32 {
        self.rotation.rem_euclid(360.0)
    }
}
