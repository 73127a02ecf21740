//! Watermark text: measuring and outlining a string with a real font.
//!
//! The renderer only needs two things from a font: how wide a string is at
//! a given pixel size, and the string's outline as a path it can fill. The
//! [`WatermarkFont`] trait captures exactly that so hosts (and tests) can
//! bring their own face. [`OutlineFont`] is the stock implementation: glyph
//! outlines come from `skrifa`, and [`OutlineFont::system`] picks an
//! installed sans-serif face through `fontdb`.
//!
//! Coordinates follow the canvas convention: y grows downwards, the path
//! starts at x = 0 on the left edge of the text, and y = 0 is the vertical
//! middle of the em box.

use once_cell::sync::Lazy;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef, GlyphId, MetadataProvider};
use std::fmt;
use std::sync::Arc;
use tiny_skia::{Path, PathBuilder};
use tracing::{debug, warn};

/// Families tried, in order, before falling back to any sans-serif face.
const PREFERRED_FAMILIES: &[&str] = &["Segoe UI", "Roboto", "Noto Sans Tamil", "Noto Sans"];

/// Measures and outlines watermark text.
pub trait WatermarkFont: Send + Sync {
    /// Advance width of `text` at `font_size` pixels.
    fn measure(&self, text: &str, font_size: f32) -> f32;

    /// Outline of `text` at `font_size` pixels, or `None` if nothing
    /// visible would be drawn.
    fn outline(&self, text: &str, font_size: f32) -> Option<Path>;
}

/// A TrueType/OpenType face rendered through its glyph outlines.
#[derive(Clone)]
pub struct OutlineFont {
    data: Arc<Vec<u8>>,
    index: u32,
}

impl fmt::Debug for OutlineFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineFont")
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

static SYSTEM_FONT: Lazy<Option<Arc<OutlineFont>>> = Lazy::new(load_system_font);

impl OutlineFont {
    /// Wrap font file bytes; `index` selects the face in a collection.
    pub fn from_data(data: Vec<u8>, index: u32) -> Result<Self, String> {
        FontRef::from_index(&data, index).map_err(|e| format!("unreadable font: {e}"))?;
        Ok(Self {
            data: Arc::new(data),
            index,
        })
    }

    /// Load a font file from disk (first face).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
        Self::from_data(data, 0)
    }

    /// An installed sans-serif face, looked up once per process.
    pub fn system() -> Option<Arc<OutlineFont>> {
        SYSTEM_FONT.clone()
    }

    fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.index).ok()
    }
}

impl WatermarkFont for OutlineFont {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        let Some(font) = self.font_ref() else {
            return 0.0;
        };
        let charmap = font.charmap();
        let metrics = font.glyph_metrics(Size::new(font_size), LocationRef::default());
        text.chars()
            .map(|c| {
                let gid = charmap.map(c).unwrap_or(GlyphId::NOTDEF);
                metrics.advance_width(gid).unwrap_or(0.0)
            })
            .sum()
    }

    fn outline(&self, text: &str, font_size: f32) -> Option<Path> {
        let font = self.font_ref()?;
        let size = Size::new(font_size);
        let charmap = font.charmap();
        let glyph_metrics = font.glyph_metrics(size, LocationRef::default());
        let outlines = font.outline_glyphs();

        // Baseline that puts the middle of the em box on y = 0.
        let m = font.metrics(size, LocationRef::default());
        let baseline = (m.ascent + m.descent) / 2.0;

        let mut pen = OutlineBuilder {
            builder: PathBuilder::new(),
            x: 0.0,
            baseline,
        };

        for c in text.chars() {
            let gid = charmap.map(c).unwrap_or(GlyphId::NOTDEF);
            if let Some(glyph) = outlines.get(gid) {
                let settings = DrawSettings::unhinted(size, LocationRef::default());
                if let Err(e) = glyph.draw(settings, &mut pen) {
                    warn!("Skipping glyph for {:?}: {:?}", c, e);
                }
            }
            pen.x += glyph_metrics.advance_width(gid).unwrap_or(0.0);
        }

        pen.builder.finish()
    }
}

/// Collects glyph outlines into one path, flipping y and shifting each
/// glyph to its pen position.
struct OutlineBuilder {
    builder: PathBuilder,
    x: f32,
    baseline: f32,
}

impl OutlineBuilder {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x, self.baseline - y)
    }
}

impl OutlinePen for OutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let (cx0, cy0) = self.map(cx0, cy0);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(cx0, cy0, x, y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let (cx0, cy0) = self.map(cx0, cy0);
        let (cx1, cy1) = self.map(cx1, cy1);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(cx0, cy0, cx1, cy1, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn load_system_font() -> Option<Arc<OutlineFont>> {
    use fontdb::{Database, Family, Query};

    let mut db = Database::new();
    db.load_system_fonts();
    debug!("fontdb: {} system faces", db.len());

    let mut families: Vec<Family<'_>> = PREFERRED_FAMILIES.iter().map(|f| Family::Name(*f)).collect();
    families.push(Family::SansSerif);

    let id = db
        .query(&Query {
            families: &families,
            ..Query::default()
        })
        .or_else(|| db.faces().next().map(|face| face.id))?;

    let font = db.with_face_data(id, |data, index| OutlineFont::from_data(data.to_vec(), index))?;
    match font {
        Ok(font) => Some(Arc::new(font)),
        Err(e) => {
            warn!("System font rejected: {}", e);
            None
        }
    }
}
