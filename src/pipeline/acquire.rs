//! Image acquisition: raw files → decoded, measured [`LoadedImage`]s.
//!
//! Each file goes through three steps, strictly in input order:
//!
//! 1. HEIC/HEIF files are transcoded to JPEG (see [`crate::pipeline::transcode`]).
//! 2. The bytes are wrapped in a data URI, the form every later stage reads.
//! 3. The image is decoded once to learn its pixel size. A file that fails
//!    here is rejected with its name so the user knows which one to drop.
//!
//! Decoding is CPU-bound, so both the transcode and the probe run on
//! tokio's blocking pool. Files are still handled one at a time: the
//! caller's list order is the page order of the eventual PDF.

use crate::error::Snap2PdfError;
use crate::pipeline::encode::{from_data_uri, to_data_uri};
use crate::pipeline::transcode::{default_transcoder, Transcoder};
use image::ImageFormat;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

static HEIF_MIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)heic|heif").unwrap());
static HEIF_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.hei[cf]$").unwrap());

/// A user-supplied file before acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    /// File name as shown to the user, e.g. `IMG_0042.HEIC`.
    pub name: String,
    /// Declared content type; may be empty when unknown.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    /// (falling back to sniffing the content).
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Snap2PdfError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => Snap2PdfError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Snap2PdfError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = guess_mime_type(path, &bytes);
        debug!("Read {} ({}, {} bytes)", name, mime_type, bytes.len());

        Ok(Self::new(name, mime_type, bytes))
    }
}

/// One picture after acquisition, ready for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// Random per-upload identifier; the key for removal and reordering.
    pub id: Uuid,
    /// Display name (after transcoding, `.heic` becomes `.jpg`).
    pub name: String,
    pub mime_type: String,
    /// `data:<mime>;base64,<payload>` URI holding the (transcoded) file.
    pub src: Arc<str>,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
}

impl LoadedImage {
    /// The encoded file bytes behind [`LoadedImage::src`].
    pub fn bytes(&self) -> Result<Vec<u8>, Snap2PdfError> {
        from_data_uri(&self.src)
            .map(|(_, bytes)| bytes)
            .map_err(|e| Snap2PdfError::decode(&self.name, e))
    }
}

/// Whether a file needs transcoding before the decoder can read it.
pub fn needs_transcode(file: &RawFile) -> bool {
    HEIF_MIME.is_match(&file.mime_type) || HEIF_EXTENSION.is_match(&file.name)
}

/// `photo.HEIC` → `photo.jpg`; other names are returned unchanged.
pub fn transcoded_name(name: &str) -> String {
    HEIF_EXTENSION.replace(name, ".jpg").into_owned()
}

/// Acquire images using the default transcoder.
pub async fn acquire(files: Vec<RawFile>) -> Result<Vec<LoadedImage>, Snap2PdfError> {
    acquire_with(files, default_transcoder()).await
}

/// Acquire images, transcoding HEIC/HEIF through `transcoder`.
///
/// The output has one entry per input file, in input order. The first file
/// that cannot be transcoded or decoded aborts the whole call.
pub async fn acquire_with(
    files: Vec<RawFile>,
    transcoder: Arc<dyn Transcoder>,
) -> Result<Vec<LoadedImage>, Snap2PdfError> {
    info!("Acquiring {} file(s)", files.len());
    let mut loaded = Vec::with_capacity(files.len());

    for file in files {
        let transcoder = Arc::clone(&transcoder);
        let image = tokio::task::spawn_blocking(move || load_one(file, transcoder.as_ref()))
            .await
            .map_err(|e| Snap2PdfError::Internal(format!("Decode task panicked: {}", e)))??;
        debug!(
            "Loaded {} → {}x{} px (id {})",
            image.name, image.width, image.height, image.id
        );
        loaded.push(image);
    }

    Ok(loaded)
}

/// Blocking implementation of a single file's acquisition.
fn load_one(file: RawFile, transcoder: &dyn Transcoder) -> Result<LoadedImage, Snap2PdfError> {
    let file = if needs_transcode(&file) {
        debug!("Transcoding {} from HEIC/HEIF", file.name);
        let jpeg = transcoder
            .transcode(&file)
            .map_err(|e| Snap2PdfError::decode(&file.name, format!("HEIC/HEIF transcode failed: {e}")))?;
        RawFile::new(transcoded_name(&file.name), "image/jpeg", jpeg)
    } else {
        file
    };

    let (width, height) = image::load_from_memory(&file.bytes)
        .map(|img| (img.width(), img.height()))
        .map_err(|e| Snap2PdfError::decode(&file.name, e))?;

    let mime_type = if file.mime_type.is_empty() {
        sniff_mime_type(&file.bytes)
    } else {
        file.mime_type
    };
    let src = to_data_uri(&mime_type, &file.bytes);

    Ok(LoadedImage {
        id: Uuid::new_v4(),
        name: file.name,
        mime_type,
        src: Arc::from(src),
        width,
        height,
    })
}

fn guess_mime_type(path: &Path, bytes: &[u8]) -> String {
    if let Ok(format) = ImageFormat::from_path(path) {
        return format.to_mime_type().to_string();
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "heic" => "image/heic".to_string(),
        "heif" => "image/heif".to_string(),
        _ => sniff_mime_type(bytes),
    }
}

fn sniff_mime_type(bytes: &[u8]) -> String {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

/// Read several files from disk, in order.
pub async fn read_files(paths: &[PathBuf]) -> Result<Vec<RawFile>, Snap2PdfError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(RawFile::from_path(path).await?);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::transcode::UnsupportedTranscoder;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 20, 30])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("png encode");
        buf
    }

    struct FakeHeif;

    impl Transcoder for FakeHeif {
        fn transcode(&self, _file: &RawFile) -> Result<Vec<u8>, String> {
            Ok(png_bytes(7, 5))
        }
    }

    #[test]
    fn heif_detection() {
        let by_mime = RawFile::new("photo", "image/HEIC", vec![]);
        let by_ext = RawFile::new("IMG_1.HeIf", "", vec![]);
        let plain = RawFile::new("scan.png", "image/png", vec![]);
        let heic_in_middle = RawFile::new("heic-notes.png", "image/png", vec![]);
        assert!(needs_transcode(&by_mime));
        assert!(needs_transcode(&by_ext));
        assert!(!needs_transcode(&plain));
        assert!(!needs_transcode(&heic_in_middle));
    }

    #[test]
    fn transcoded_names() {
        assert_eq!(transcoded_name("IMG_0042.HEIC"), "IMG_0042.jpg");
        assert_eq!(transcoded_name("a.heif"), "a.jpg");
        assert_eq!(transcoded_name("scan.png"), "scan.png");
    }

    #[tokio::test]
    async fn acquire_preserves_order_and_dimensions() {
        let files = vec![
            RawFile::new("wide.png", "image/png", png_bytes(40, 20)),
            RawFile::new("tall.png", "image/png", png_bytes(20, 40)),
            RawFile::new("square.png", "", png_bytes(10, 10)),
        ];
        let loaded = acquire_with(files, Arc::new(UnsupportedTranscoder)).await.unwrap();

        let names: Vec<_> = loaded.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["wide.png", "tall.png", "square.png"]);
        assert_eq!((loaded[0].width, loaded[0].height), (40, 20));
        assert_eq!((loaded[1].width, loaded[1].height), (20, 40));
        assert_eq!(loaded[2].mime_type, "image/png", "sniffed from content");
        assert!(loaded[0].src.starts_with("data:image/png;base64,"));
        assert_ne!(loaded[0].id, loaded[1].id);
        assert_eq!(loaded[0].bytes().unwrap(), png_bytes(40, 20));
    }

    #[tokio::test]
    async fn heif_goes_through_transcoder() {
        let files = vec![RawFile::new("IMG_7.HEIC", "image/heic", vec![0; 32])];
        let loaded = acquire_with(files, Arc::new(FakeHeif)).await.unwrap();
        assert_eq!(loaded[0].name, "IMG_7.jpg");
        assert_eq!(loaded[0].mime_type, "image/jpeg");
        assert_eq!((loaded[0].width, loaded[0].height), (7, 5));
    }

    #[tokio::test]
    async fn transcode_failure_is_a_decode_error() {
        let files = vec![RawFile::new("IMG_7.heic", "", vec![0; 32])];
        let err = acquire_with(files, Arc::new(UnsupportedTranscoder)).await.unwrap_err();
        match err {
            Snap2PdfError::Decode { name, .. } => assert_eq!(name, "IMG_7.heic"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_bytes_name_the_file() {
        let files = vec![
            RawFile::new("ok.png", "image/png", png_bytes(4, 4)),
            RawFile::new("broken.jpg", "image/jpeg", b"definitely not a jpeg".to_vec()),
        ];
        let err = acquire(files).await.unwrap_err();
        assert!(err.to_string().contains("broken.jpg"), "got: {err}");
    }

    #[tokio::test]
    async fn from_path_reads_and_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, png_bytes(3, 2)).unwrap();

        let file = RawFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "page.png");
        assert_eq!(file.mime_type, "image/png");

        let missing = RawFile::from_path(dir.path().join("nope.png")).await.unwrap_err();
        assert!(matches!(missing, Snap2PdfError::FileNotFound { .. }));
    }
}
