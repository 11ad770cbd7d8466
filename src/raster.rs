//! Page rasterization seam.
//!
//! Rendering is owned by an external library. [`Rasterizer`] is the
//! contract the tools need from it; [`BlankRasterizer`] is the built-in
//! placeholder that renders the page area only, and the `pdfium` feature
//! adds [`pdfium_backend::PdfiumRasterizer`] for real output.

use image::{Rgba, RgbaImage};

use crate::document::SourceDocument;
#[cfg(feature = "pdfium")]
use crate::error::Error;
use crate::error::Result;
use crate::order::PageIndex;

/// Scale used for thumbnails in page lists.
pub const THUMBNAIL_SCALE: f64 = 0.5;

/// Renders pages of a loaded document.
pub trait Rasterizer {
    /// Render `page` at `scale` (1.0 = one pixel per point). The image
    /// must match `source.viewport(page, scale)`.
    fn render_page(&self, source: &SourceDocument, page: PageIndex, scale: f64)
    -> Result<RgbaImage>;

    /// Render `pages` in order, handing each image to `sink` before the
    /// next one is produced. Backends that parse the document override
    /// this to parse it once per batch.
    fn render_pages(
        &self,
        source: &SourceDocument,
        pages: &[PageIndex],
        scale: f64,
        sink: &mut dyn FnMut(PageIndex, RgbaImage) -> Result<()>,
    ) -> Result<()> {
        for &page in pages {
            sink(page, self.render_page(source, page, scale)?)?;
        }
        Ok(())
    }

    /// True when the output only stands in for the page and carries none
    /// of its content.
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// White page with a light border, sized exactly like a real rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankRasterizer;

impl Rasterizer for BlankRasterizer {
    fn render_page(
        &self,
        source: &SourceDocument,
        page: PageIndex,
        scale: f64,
    ) -> Result<RgbaImage> {
        let viewport = source.viewport(page, scale)?;
        let (width, height) = (viewport.width, viewport.height);
        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        if width >= 4 && height >= 4 {
            let border = Rgba([220, 220, 220, 255]);
            for x in 0..width {
                image.put_pixel(x, 0, border);
                image.put_pixel(x, height - 1, border);
            }
            for y in 0..height {
                image.put_pixel(0, y, border);
                image.put_pixel(width - 1, y, border);
            }
        }
        Ok(image)
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}

/// Thumbnails of every page, rendered one page at a time so that only one
/// raster buffer is being produced at once.
pub fn thumbnails<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    source: &SourceDocument,
    scale: f64,
) -> Result<Vec<RgbaImage>> {
    let pages: Vec<PageIndex> = (0..source.page_count()).collect();
    let mut out = Vec::with_capacity(pages.len());
    rasterizer.render_pages(source, &pages, scale, &mut |_, image| {
        out.push(image);
        Ok(())
    })?;
    log::debug!("rendered {} thumbnails of {}", out.len(), source.name());
    Ok(out)
}

/// Pick the rasterizer for this build: pdfium when compiled in and the
/// library can be bound, the blank placeholder otherwise.
pub fn default_rasterizer() -> Box<dyn Rasterizer> {
    #[cfg(feature = "pdfium")]
    {
        match pdfium_backend::PdfiumRasterizer::from_system_library() {
            Ok(r) => return Box::new(r),
            Err(e) => log::warn!("{e}; falling back to blank pages"),
        }
    }
    #[cfg(not(feature = "pdfium"))]
    log::warn!("built without the pdfium feature; pages render blank and image export is disabled");
    Box::new(BlankRasterizer)
}

#[cfg(feature = "pdfium")]
pub mod pdfium_backend {
    use super::*;
    use pdfium_render::prelude::*;

    fn render_error(e: impl std::fmt::Display) -> Error {
        Error::Render(e.to_string())
    }

    /// Rasterizer backed by a system pdfium library.
    pub struct PdfiumRasterizer {
        pdfium: Pdfium,
    }

    impl std::fmt::Debug for PdfiumRasterizer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("PdfiumRasterizer").finish_non_exhaustive()
        }
    }

    impl PdfiumRasterizer {
        pub fn from_system_library() -> Result<Self> {
            let bindings = Pdfium::bind_to_system_library()
                .map_err(|e| render_error(format!("failed to bind pdfium system library: {e}")))?;
            Ok(Self {
                pdfium: Pdfium::new(bindings),
            })
        }

        fn load<'a>(&'a self, source: &'a SourceDocument) -> Result<PdfDocument<'a>> {
            self.pdfium
                .load_pdf_from_byte_slice(source.bytes(), None)
                .map_err(render_error)
        }
    }

    fn render_loaded(
        document: &PdfDocument<'_>,
        source: &SourceDocument,
        page: PageIndex,
        scale: f64,
    ) -> Result<RgbaImage> {
        let viewport = source.viewport(page, scale)?;
        let index = u16::try_from(page).map_err(render_error)?;
        let pdf_page = document.pages().get(index).map_err(render_error)?;
        let config = PdfRenderConfig::new()
            .set_target_width(viewport.width as i32)
            .set_target_height(viewport.height as i32);
        let bitmap = pdf_page.render_with_config(&config).map_err(render_error)?;
        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
            .ok_or_else(|| render_error("pdfium returned a short buffer"))
    }

    impl Rasterizer for PdfiumRasterizer {
        fn render_page(
            &self,
            source: &SourceDocument,
            page: PageIndex,
            scale: f64,
        ) -> Result<RgbaImage> {
            let document = self.load(source)?;
            render_loaded(&document, source, page, scale)
        }

        fn render_pages(
            &self,
            source: &SourceDocument,
            pages: &[PageIndex],
            scale: f64,
            sink: &mut dyn FnMut(PageIndex, RgbaImage) -> Result<()>,
        ) -> Result<()> {
            let document = self.load(source)?;
            for &page in pages {
                sink(page, render_loaded(&document, source, page, scale)?)?;
            }
            Ok(())
        }
    }
}
