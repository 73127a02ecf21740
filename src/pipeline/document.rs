//! Multi-page PDF assembly.
//!
//! [`DocumentBuilder`] mirrors how a page-oriented PDF API is driven: a new
//! document already has one blank page, [`DocumentBuilder::add_page`]
//! appends another, and [`DocumentBuilder::place_image`] draws onto the most
//! recent one. Nothing is serialized until [`DocumentBuilder::finish`], so
//! object numbers are allocated in one pass.
//!
//! Images are embedded as-is with the `DCTDecode` filter; the pipeline never
//! re-encodes a JPEG once the compositor has produced it.

use crate::config::PageDimensions;
use crate::pipeline::compose::ComposedPage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};
use tracing::debug;

/// Producer string written into the document information dictionary.
pub const PRODUCER: &str = concat!("snap2pdf ", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
struct PageSpec {
    dimensions: PageDimensions,
    images: Vec<ComposedPage>,
}

impl PageSpec {
    fn blank(dimensions: PageDimensions) -> Self {
        Self {
            dimensions,
            images: Vec::new(),
        }
    }
}

/// Accumulates pages and serializes them into one PDF.
#[derive(Debug)]
pub struct DocumentBuilder {
    pages: Vec<PageSpec>,
    title: Option<String>,
    author: Option<String>,
}

impl DocumentBuilder {
    /// A document with one blank page of the given size.
    pub fn new(dimensions: PageDimensions) -> Self {
        Self {
            pages: vec![PageSpec::blank(dimensions)],
            title: None,
            author: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Append a blank page; later images go onto it.
    pub fn add_page(&mut self, dimensions: PageDimensions) {
        self.pages.push(PageSpec::blank(dimensions));
    }

    /// Draw `image` on the current (last) page at its placement.
    pub fn place_image(&mut self, image: ComposedPage) {
        if let Some(page) = self.pages.last_mut() {
            page.images.push(image);
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialize the document.
    pub fn finish(self) -> Vec<u8> {
        let mut alloc = Ref::new(1);
        let catalog_id = alloc.bump();
        let page_tree_id = alloc.bump();
        let info_id = alloc.bump();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);

        let page_ids: Vec<Ref> = self.pages.iter().map(|_| alloc.bump()).collect();
        pdf.pages(page_tree_id)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);

        for (page, &page_id) in self.pages.iter().zip(&page_ids) {
            let PageDimensions { width, height } = page.dimensions;
            let content_id = alloc.bump();
            let image_ids: Vec<Ref> = page.images.iter().map(|_| alloc.bump()).collect();
            let names: Vec<String> = (1..=page.images.len()).map(|i| format!("Im{i}")).collect();

            let mut writer = pdf.page(page_id);
            writer
                .media_box(Rect::new(0.0, 0.0, width, height))
                .parent(page_tree_id)
                .contents(content_id);
            {
                let mut resources = writer.resources();
                let mut x_objects = resources.x_objects();
                for (name, &id) in names.iter().zip(&image_ids) {
                    x_objects.pair(Name(name.as_bytes()), id);
                }
                x_objects.finish();
                resources.finish();
            }
            writer.finish();

            let mut content = Content::new();
            for (image, name) in page.images.iter().zip(&names) {
                let p = image.placement;
                content.save_state();
                content.transform([
                    p.draw_width,
                    0.0,
                    0.0,
                    p.draw_height,
                    p.offset_x,
                    height - p.offset_y - p.draw_height,
                ]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
            }
            pdf.stream(content_id, &content.finish());

            for (image, &id) in page.images.iter().zip(&image_ids) {
                let mut xobject = pdf.image_xobject(id, &image.jpeg);
                xobject.filter(Filter::DctDecode);
                xobject.width(image.pixel_width as i32);
                xobject.height(image.pixel_height as i32);
                xobject.color_space().device_rgb();
                xobject.bits_per_component(8);
                xobject.finish();
            }
        }

        {
            let mut info = pdf.document_info(info_id);
            info.producer(TextStr(PRODUCER));
            if let Some(title) = &self.title {
                info.title(TextStr(title));
            }
            if let Some(author) = &self.author {
                info.author(TextStr(author));
            }
            info.finish();
        }

        let bytes = pdf.finish();
        debug!("Serialized {} page(s) → {} bytes", page_ids.len(), bytes.len());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::compose::fit_to_page;
    use crate::pipeline::encode::encode_jpeg;
    use image::{Rgb, RgbImage};
    use lopdf::{Document, Object};

    const A4: PageDimensions = PageDimensions {
        width: 595.0,
        height: 842.0,
    };

    fn composed(w: u32, h: u32, page: PageDimensions) -> ComposedPage {
        let jpeg = encode_jpeg(&RgbImage::from_pixel(w, h, Rgb([20, 120, 220])), 0.9).unwrap();
        ComposedPage {
            jpeg,
            pixel_width: w,
            pixel_height: h,
            placement: fit_to_page(w, h, page),
        }
    }

    fn media_box(doc: &Document, page_id: lopdf::ObjectId) -> Vec<f32> {
        let page = doc.get_dictionary(page_id).unwrap();
        page.get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| match o {
                Object::Integer(i) => *i as f32,
                Object::Real(r) => *r,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn new_document_has_one_blank_page() {
        let builder = DocumentBuilder::new(A4);
        assert_eq!(builder.page_count(), 1);
        let doc = Document::load_mem(&builder.finish()).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn pages_carry_their_media_box_and_image() {
        let mut builder = DocumentBuilder::new(A4).title("Receipts");
        builder.place_image(composed(80, 60, A4));
        let landscape = PageDimensions::new(842.0, 595.0);
        builder.add_page(landscape);
        builder.place_image(composed(60, 80, landscape));
        let bytes = builder.finish();
        assert!(bytes.starts_with(b"%PDF-"));

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(media_box(&doc, pages[&1]), vec![0.0, 0.0, 595.0, 842.0]);
        assert_eq!(media_box(&doc, pages[&2]), vec![0.0, 0.0, 842.0, 595.0]);

        for (_, id) in pages {
            let page = doc.get_dictionary(id).unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            let image_ref = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
            let stream = doc.get_object(image_ref).unwrap().as_stream().unwrap();
            assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
            assert!(stream.content.starts_with(&[0xFF, 0xD8]));
        }

        let info_ref = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_ref).unwrap();
        assert!(info.get(b"Title").is_ok());
        assert!(info.get(b"Producer").is_ok());
    }

    #[test]
    fn image_is_drawn_at_its_placement() {
        let image = composed(800, 600, A4);
        let mut builder = DocumentBuilder::new(A4);
        builder.place_image(image);
        let doc = Document::load_mem(&builder.finish()).unwrap();
        let page_id = doc.get_pages()[&1];
        let content = doc.get_and_decode_page_content(page_id).unwrap();

        let cm = content
            .operations
            .iter()
            .find(|op| op.operator == "cm")
            .expect("transform operator");
        let nums: Vec<f32> = cm.operands.iter().map(|o| o.as_float().unwrap()).collect();
        let expected = [595.0, 0.0, 0.0, 446.25, 0.0, 842.0 - 197.875 - 446.25];
        for (got, want) in nums.iter().zip(expected) {
            assert!((got - want).abs() < 0.01, "cm {nums:?}");
        }
        assert!(content.operations.iter().any(|op| op.operator == "Do"));
    }
}
