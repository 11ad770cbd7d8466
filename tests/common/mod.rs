#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use lopdf::Document;
use pdfworks::document::SourceDocument;
use pdfworks::order::PageIndex;
use pdfworks::raster::Rasterizer;

mod fixture;

pub use fixture::{page_widths, sample_pdf, SAMPLE_HEIGHT};

/// Renders each page as a flat grey sheet of the right size. Unlike the
/// blank placeholder it counts as a real renderer.
pub struct FlatRasterizer;

impl Rasterizer for FlatRasterizer {
    fn render_page(
        &self,
        source: &SourceDocument,
        page: PageIndex,
        scale: f64,
    ) -> pdfworks::Result<RgbaImage> {
        let viewport = source.viewport(page, scale)?;
        Ok(RgbaImage::from_pixel(
            viewport.width,
            viewport.height,
            Rgba([128, 128, 128, 255]),
        ))
    }
}

/// Decompressed content of every page.
pub fn page_contents(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("reload output");
    doc.get_pages()
        .into_values()
        .map(|id| String::from_utf8_lossy(&doc.get_page_content(id).expect("content")).into_owned())
        .collect()
}
