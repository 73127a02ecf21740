//! Error types for the snap2pdf library.
//!
//! A single error type covers the whole pipeline because a conversion is
//! all-or-nothing: the first image that fails to decode, render, or encode
//! aborts the run and no partial PDF is returned. The variants still let a
//! caller tell apart the three situations that matter to a user:
//!
//! * [`Snap2PdfError::Decode`]: one of *their* files is broken or in a
//!   format we cannot read. The message names the file.
//! * [`Snap2PdfError::EmptyInput`]: nothing to convert; fix the selection.
//! * [`Snap2PdfError::Render`]: the environment let us down (no font for
//!   the watermark, surface allocation failed). Retrying will not help.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the snap2pdf library.
#[derive(Debug, Error)]
pub enum Snap2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The bytes could not be interpreted as an image, or HEIC/HEIF
    /// transcoding failed.
    #[error("Could not decode image '{name}': {detail}")]
    Decode { name: String, detail: String },

    /// Conversion was requested with zero images.
    #[error("No images provided; add at least one image before converting")]
    EmptyInput,

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// Drawing-surface allocation or watermark text rendering failed.
    #[error("Rendering failed: {0}")]
    Render(String),

    /// JPEG re-encoding of a page failed.
    #[error("Encoding page {page} failed: {detail}")]
    Encode { page: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Snap2PdfError {
    /// Build a [`Snap2PdfError::Decode`] for the named file.
    pub(crate) fn decode(name: impl Into<String>, detail: impl ToString) -> Self {
        Snap2PdfError::Decode {
            name: name.into(),
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_display_names_the_file() {
        let e = Snap2PdfError::decode("holiday.heic", "truncated box");
        let msg = e.to_string();
        assert!(msg.contains("holiday.heic"), "got: {msg}");
        assert!(msg.contains("truncated box"), "got: {msg}");
    }

    #[test]
    fn empty_input_display() {
        assert!(Snap2PdfError::EmptyInput.to_string().contains("No images"));
    }

    #[test]
    fn encode_display() {
        let e = Snap2PdfError::Encode {
            page: 3,
            detail: "writer closed".into(),
        };
        assert!(e.to_string().contains("page 3"));
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = Snap2PdfError::OutputWriteFailed {
            path: PathBuf::from("/nope/out.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing dir"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("out.pdf"));
    }
}
