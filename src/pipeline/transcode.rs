//! HEIC/HEIF → JPEG transcoding.
//!
//! The `image` crate cannot read HEVC-coded stills, so phone photos in
//! HEIC/HEIF are converted to baseline JPEG before anything else looks at
//! them. Decoding goes through libheif when the `heif` feature is on; the
//! [`Transcoder`] trait lets a host plug in whatever decoder it already
//! ships instead.

use crate::pipeline::acquire::RawFile;
use std::sync::Arc;

/// Quality used for the intermediate JPEG.
pub const TRANSCODE_QUALITY: f32 = 0.92;

/// Converts a file the decoder cannot read into JPEG bytes.
pub trait Transcoder: Send + Sync {
    /// Return baseline JPEG bytes for `file`, or a human-readable reason.
    fn transcode(&self, file: &RawFile) -> Result<Vec<u8>, String>;
}

/// The transcoder used by [`crate::acquire`].
pub fn default_transcoder() -> Arc<dyn Transcoder> {
    #[cfg(feature = "heif")]
    {
        Arc::new(HeifTranscoder)
    }
    #[cfg(not(feature = "heif"))]
    {
        Arc::new(UnsupportedTranscoder)
    }
}

/// Fails every request; used when no HEIF decoder is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedTranscoder;

impl Transcoder for UnsupportedTranscoder {
    fn transcode(&self, _file: &RawFile) -> Result<Vec<u8>, String> {
        Err("HEIC/HEIF support is not compiled in (rebuild with `--features heif`)".into())
    }
}

/// libheif-backed transcoder.
#[cfg(feature = "heif")]
#[derive(Debug, Default, Clone, Copy)]
pub struct HeifTranscoder;

#[cfg(feature = "heif")]
impl Transcoder for HeifTranscoder {
    fn transcode(&self, file: &RawFile) -> Result<Vec<u8>, String> {
        use crate::pipeline::encode::encode_jpeg;
        use image::RgbImage;
        use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

        let lib_heif = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(&file.bytes).map_err(|e| e.to_string())?;
        let handle = ctx.primary_image_handle().map_err(|e| e.to_string())?;
        let decoded = lib_heif
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| e.to_string())?;

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| "decoded HEIF image has no interleaved RGB plane".to_string())?;

        let (width, height) = (plane.width, plane.height);
        let row_len = width as usize * 3;
        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in plane.data.chunks(plane.stride).take(height as usize) {
            pixels.extend_from_slice(&row[..row_len]);
        }

        let rgb = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| "HEIF plane size does not match its dimensions".to_string())?;
        encode_jpeg(&rgb, TRANSCODE_QUALITY).map_err(|e| e.to_string())
    }
}
