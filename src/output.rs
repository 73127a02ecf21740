//! Conversion results.

use crate::config::PageDimensions;
use crate::pipeline::compose::Placement;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of one conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The serialized PDF.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    /// One entry per page, in page order.
    pub pages: Vec<PageResult>,
    pub stats: ConversionStats,
}

/// Where one image ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    pub image_id: Uuid,
    pub image_name: String,
    pub page_size: PageDimensions,
    pub placement: Placement,
    /// Size of the embedded JPEG stream.
    pub jpeg_bytes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_images: usize,
    pub total_jpeg_bytes: usize,
    pub pdf_bytes: usize,
    pub duration_ms: u64,
}
