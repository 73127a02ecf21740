//! Watermark rendering onto a private drawing surface.
//!
//! Every image is copied onto a [`Surface`] of exactly its own size, with
//! or without a watermark, so the page compositor always encodes from the
//! same kind of buffer. When a watermark is active the text is drawn twice:
//! a dark pass offset by 2 px as a drop shadow, then the light foreground.
//!
//! The shadow has a fixed alpha; only the foreground follows the configured
//! opacity. Rotation turns the text about its own centre, so the anchor
//! point chosen by [`anchor_point`] stays where the reader expects it.

use crate::config::{WatermarkOptions, WatermarkPosition};
use crate::error::Snap2PdfError;
use crate::pipeline::font::WatermarkFont;
use image::{DynamicImage, Rgb, RgbImage};
use tiny_skia::{Color, FillRule, Paint, Path, Pixmap, Transform};
use tracing::{debug, warn};

/// Distance in pixels between the text and the surface edge for the
/// corner positions.
pub const EDGE_INSET: f32 = 24.0;
/// Drop-shadow offset in pixels, along both axes.
pub const SHADOW_OFFSET: f32 = 2.0;
/// Alpha of the drop shadow.
pub const SHADOW_ALPHA: f32 = 0.6;
/// Alpha of the foreground text before the configured opacity is applied.
pub const FOREGROUND_ALPHA: f32 = 0.9;

/// An RGBA drawing surface with canvas-style global alpha.
pub struct Surface {
    pixmap: Pixmap,
    global_alpha: f32,
}

impl Surface {
    /// Allocate a surface the size of `image` and copy its pixels in.
    pub fn from_image(image: &DynamicImage) -> Result<Self, Snap2PdfError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Snap2PdfError::Render(format!("cannot allocate a {width}x{height} drawing surface"))
        })?;

        for (dst, src) in pixmap.data_mut().chunks_exact_mut(4).zip(rgba.pixels()) {
            let [r, g, b, a] = src.0;
            dst[0] = premultiply(r, a);
            dst[1] = premultiply(g, a);
            dst[2] = premultiply(b, a);
            dst[3] = a;
        }

        Ok(Self {
            pixmap,
            global_alpha: 1.0,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Alpha multiplied into every fill.
    pub fn global_alpha(&self) -> f32 {
        self.global_alpha
    }

    /// Run `draw` with the global alpha set to `alpha` clamped into
    /// `[0, 1]`, restoring the previous value afterwards.
    pub fn with_global_alpha<R>(&mut self, alpha: f32, draw: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.global_alpha;
        self.global_alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
        let result = draw(self);
        self.global_alpha = saved;
        result
    }

    /// Fill `path` with `color`, modulated by the global alpha.
    pub fn fill_path(&mut self, path: &Path, color: Color, transform: Transform) {
        let mut color = color;
        color.apply_opacity(self.global_alpha);
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, transform, None);
    }

    /// Straight (non-premultiplied) RGBA at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Flatten onto a white background for encoders without alpha.
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut out = RgbImage::new(self.width(), self.height());
        for (dst, src) in out.pixels_mut().zip(self.pixmap.pixels()) {
            let background = 255 - src.alpha();
            *dst = Rgb([
                src.red().saturating_add(background),
                src.green().saturating_add(background),
                src.blue().saturating_add(background),
            ]);
        }
        out
    }
}

fn premultiply(c: u8, a: u8) -> u8 {
    ((c as u16 * a as u16 + 127) / 255) as u8
}

/// Left edge and vertical middle of the text before rotation.
pub fn anchor_point(
    position: WatermarkPosition,
    surface_width: f32,
    surface_height: f32,
    text_width: f32,
    font_size: f32,
) -> (f32, f32) {
    match position {
        WatermarkPosition::TopLeft => (EDGE_INSET, EDGE_INSET + font_size / 2.0),
        WatermarkPosition::Center => (
            surface_width / 2.0 - text_width / 2.0,
            surface_height / 2.0,
        ),
        WatermarkPosition::BottomRight => (
            surface_width - text_width - EDGE_INSET,
            surface_height - EDGE_INSET - font_size / 2.0,
        ),
    }
}

/// Copy `image` onto a fresh surface and draw the watermark, if active.
///
/// An inactive or absent watermark yields a plain copy. An active one
/// requires `font`; without it the call fails with
/// [`Snap2PdfError::Render`].
pub fn apply_watermark(
    image: &DynamicImage,
    watermark: Option<&WatermarkOptions>,
    font: Option<&dyn WatermarkFont>,
) -> Result<Surface, Snap2PdfError> {
    let mut surface = Surface::from_image(image)?;

    let Some(wm) = watermark.filter(|w| w.is_active()) else {
        return Ok(surface);
    };
    let font = font.ok_or_else(|| {
        Snap2PdfError::Render("no font available to draw the watermark text".into())
    })?;

    let text = wm.text.as_str();
    let text_width = font.measure(text, wm.font_size);
    if !text_width.is_finite() || text_width < 0.0 {
        return Err(Snap2PdfError::Render(format!(
            "could not measure watermark text {:?}",
            text
        )));
    }
    let path = font.outline(text, wm.font_size).ok_or_else(|| {
        warn!("Watermark text {:?} has no visible glyphs in this font", text);
        Snap2PdfError::Render(format!("font has no outlines for watermark text {:?}", text))
    })?;

    let (x, y) = anchor_point(
        wm.position,
        surface.width() as f32,
        surface.height() as f32,
        text_width,
        wm.font_size,
    );
    let rotation = Transform::from_rotate_at(wm.normalized_rotation(), x + text_width / 2.0, y);
    debug!(
        "Watermark {:?} at ({:.1}, {:.1}), width {:.1}px, rotation {}°",
        text,
        x,
        y,
        text_width,
        wm.normalized_rotation()
    );

    let shadow = Color::from_rgba8(0, 0, 0, alpha_u8(SHADOW_ALPHA));
    surface.fill_path(
        &path,
        shadow,
        rotation.pre_translate(x + SHADOW_OFFSET, y + SHADOW_OFFSET),
    );

    let foreground = Color::from_rgba8(255, 255, 255, alpha_u8(FOREGROUND_ALPHA));
    surface.with_global_alpha(wm.clamped_opacity(), |s| {
        s.fill_path(&path, foreground, rotation.pre_translate(x, y));
    });

    Ok(surface)
}

fn alpha_u8(alpha: f32) -> u8 {
    (alpha * 255.0).round() as u8
}
