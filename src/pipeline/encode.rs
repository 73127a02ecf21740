//! Byte-level encodings used between stages.
//!
//! Loaded images travel as `data:<mime>;base64,<payload>` URIs: one
//! self-contained string per image that the caller can hand to a preview
//! widget as-is and that the assembler can decode again without touching
//! the file system. Pages leave the pipeline as baseline JPEG, which PDF
//! embeds verbatim through the `DCTDecode` filter.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::debug;

/// Wrap raw file bytes in a base64 data URI.
pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), b64.len());
    format!("data:{};base64,{}", mime_type, b64)
}

/// Split a base64 data URI back into its MIME type and payload bytes.
pub fn from_data_uri(uri: &str) -> Result<(String, Vec<u8>), String> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URI".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data URI has no payload".to_string())?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| "data URI is not base64-encoded".to_string())?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 payload: {e}"))?;
    Ok((mime.to_string(), bytes))
}

/// Map a 0.1–1.0 quality factor onto the JPEG encoder's 1–100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode RGB pixels as baseline JPEG at the given quality factor.
pub fn encode_jpeg(rgb: &RgbImage, quality: f32) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
    encoder.encode_image(rgb)?;
    debug!(
        "Encoded {}x{} px → {} bytes JPEG (q={})",
        rgb.width(),
        rgb.height(),
        buf.len(),
        jpeg_quality(quality)
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn data_uri_round_trip() {
        let uri = to_data_uri("image/png", b"\x89PNG fake");
        assert!(uri.starts_with("data:image/png;base64,"));
        let (mime, bytes) = from_data_uri(&uri).expect("valid data URI");
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"\x89PNG fake");
    }

    #[test]
    fn rejects_malformed_uris() {
        assert!(from_data_uri("https://example.com/a.png").is_err());
        assert!(from_data_uri("data:image/png;base64").is_err());
        assert!(from_data_uri("data:image/png,rawbytes").is_err());
        assert!(from_data_uri("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn quality_mapping() {
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.95), 95);
        assert_eq!(jpeg_quality(0.1), 10);
        assert_eq!(jpeg_quality(0.0), 1);
    }

    #[test]
    fn encode_small_image() {
        let img = RgbImage::from_pixel(16, 8, Rgb([200, 40, 40]));
        let jpeg = encode_jpeg(&img, 0.9).expect("encode should succeed");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "JPEG SOI marker");
        let decoded = image::load_from_memory(&jpeg).expect("decodable");
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn lower_quality_gives_smaller_output() {
        let img = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8]));
        let high = encode_jpeg(&img, 1.0).unwrap();
        let low = encode_jpeg(&img, 0.1).unwrap();
        assert!(low.len() < high.len(), "low={} high={}", low.len(), high.len());
    }
}
