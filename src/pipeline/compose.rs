//! Page composition: fit a rendered surface onto a page and encode it.

use crate::config::PageDimensions;
use crate::pipeline::encode::encode_jpeg;
use crate::pipeline::watermark::Surface;
use serde::{Deserialize, Serialize};

/// Where an image lands on its page, in points from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub draw_width: f32,
    pub draw_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Scale `width × height` to the largest size that fits the page without
/// distortion, centred on both axes.
pub fn fit_to_page(width: u32, height: u32, page: PageDimensions) -> Placement {
    if width == 0 || height == 0 {
        return Placement {
            draw_width: 0.0,
            draw_height: 0.0,
            offset_x: page.width / 2.0,
            offset_y: page.height / 2.0,
        };
    }
    let (w, h) = (width as f32, height as f32);
    let scale = (page.width / w).min(page.height / h);
    let draw_width = w * scale;
    let draw_height = h * scale;
    Placement {
        draw_width,
        draw_height,
        offset_x: (page.width - draw_width) / 2.0,
        offset_y: (page.height - draw_height) / 2.0,
    }
}

/// A surface encoded as JPEG together with its page placement.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPage {
    pub jpeg: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub placement: Placement,
}

/// Encode `surface` at `quality` and compute its placement on `page`.
pub fn place_on_page(
    surface: &Surface,
    quality: f32,
    page: PageDimensions,
) -> Result<ComposedPage, image::ImageError> {
    let rgb = surface.to_rgb_image();
    let jpeg = encode_jpeg(&rgb, quality)?;
    Ok(ComposedPage {
        jpeg,
        pixel_width: surface.width(),
        pixel_height: surface.height(),
        placement: fit_to_page(surface.width(), surface.height(), page),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Orientation, PageSize};
    use image::{DynamicImage, Rgb, RgbImage};

    const A4: PageDimensions = PageDimensions {
        width: 595.0,
        height: 842.0,
    };

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn landscape_photo_on_portrait_a4() {
        let p = fit_to_page(800, 600, A4);
        assert!(approx(p.draw_width, 595.0));
        assert!(approx(p.draw_height, 446.25));
        assert!(approx(p.offset_x, 0.0));
        assert!(approx(p.offset_y, 197.875));
    }

    #[test]
    fn portrait_photo_on_portrait_a4() {
        let p = fit_to_page(600, 800, A4);
        assert!(approx(p.draw_width, 595.0));
        assert!((p.draw_height - 793.33).abs() < 0.01);
        assert!((p.offset_y - 24.33).abs() < 0.01);
    }

    #[test]
    fn keeps_aspect_ratio_and_stays_on_page() {
        let pages = [
            PageSize::A4.dimensions(Orientation::Portrait),
            PageSize::A4.dimensions(Orientation::Landscape),
            PageSize::Letter.dimensions(Orientation::Portrait),
            PageSize::Letter.dimensions(Orientation::Landscape),
        ];
        let sizes = [(1, 1), (4000, 3000), (3000, 4000), (10, 2000), (2000, 10), (595, 842)];
        for page in pages {
            for (w, h) in sizes {
                let p = fit_to_page(w, h, page);
                let ratio = w as f32 / h as f32;
                assert!(((p.draw_width / p.draw_height) - ratio).abs() / ratio < 1e-3);
                assert!(p.draw_width <= page.width + 1e-3);
                assert!(p.draw_height <= page.height + 1e-3);
                assert!(approx(p.draw_width, page.width) || approx(p.draw_height, page.height));
                assert!(approx(p.offset_x * 2.0 + p.draw_width, page.width));
                assert!(approx(p.offset_y * 2.0 + p.draw_height, page.height));
            }
        }
    }

    #[test]
    fn small_images_are_scaled_up() {
        let p = fit_to_page(10, 10, A4);
        assert!(approx(p.draw_width, 595.0));
        assert!(approx(p.offset_y, (842.0 - 595.0) / 2.0));
    }

    #[test]
    fn place_on_page_encodes_full_resolution() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([0, 90, 200])));
        let surface = Surface::from_image(&img).unwrap();
        let page = place_on_page(&surface, 0.8, A4).unwrap();
        assert_eq!((page.pixel_width, page.pixel_height), (64, 48));
        assert_eq!(&page.jpeg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&page.jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
        assert_eq!(page.placement, fit_to_page(64, 48, A4));
    }
}
