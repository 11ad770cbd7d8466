//! Export pipeline
//!
//! One function per tool. Each takes the loaded [`SourceDocument`] plus the
//! tool's final state and returns an [`Artifact`]: the bytes to hand to the
//! user, with the file name and media type they are offered under.
//!
//! Exports never mutate their inputs, so a failed export leaves the caller's
//! state exactly as it was.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::document::SourceDocument;
use crate::error::{Error, Result};
use crate::geometry::PageMapping;
use crate::merge::MergeEntry;
use crate::order::{PageIndex, PageOrder, SelectionSet};
use crate::pdf_ops::{self, PlacedText};
use crate::raster::Rasterizer;
use crate::text::TextBlocks;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const ZIP_MEDIA_TYPE: &str = "application/zip";

pub const ARRANGED_FILE: &str = "arranged.pdf";
pub const SPLIT_FILE: &str = "split.pdf";
pub const MERGED_FILE: &str = "merged.pdf";
pub const ANNOTATED_FILE: &str = "annotated.pdf";
pub const EDITED_FILE: &str = "edited.pdf";
pub const IMAGES_ARCHIVE_FILE: &str = "pdf-images.zip";

/// A finished export, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    fn pdf(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            media_type: PDF_MEDIA_TYPE,
            bytes,
        }
    }

    /// Write the artifact into `dir` under its file name, creating the
    /// directory if needed.
    pub fn save_into(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Raster formats offered by the To Image tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// Encode `image`. `quality` (1-100) only applies to JPEG; PNG and WebP
    /// are lossless.
    pub fn encode(self, image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
        let (width, height) = image.dimensions();
        let mut out = Vec::new();
        match self {
            ImageFormat::Png => PngEncoder::new(&mut out).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )?,
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut out, quality).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )?
            }
            ImageFormat::Webp => WebPEncoder::new_lossless(&mut out).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )?,
        }
        Ok(out)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        })
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(format!("unknown image format '{other}' (png, jpeg, webp)")),
        }
    }
}

/// Settings for [`export_images`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageExport {
    pub format: ImageFormat,
    pub scale: f64,
    pub quality: u8,
}

impl Default for ImageExport {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            scale: 2.0,
            quality: 95,
        }
    }
}

/// Pages in `order`, duplicates included.
pub fn export_arrange(source: &SourceDocument, order: &PageOrder) -> Result<Artifact> {
    let bytes = pdf_ops::copy_pages(source, order.as_slice())?;
    log::info!("arranged {} into {} pages", source.name(), order.len());
    Ok(Artifact::pdf(ARRANGED_FILE, bytes))
}

/// Selected pages in ascending original order.
pub fn export_split(source: &SourceDocument, selection: &SelectionSet) -> Result<Artifact> {
    let pages = selection.to_sorted_vec();
    let bytes = pdf_ops::copy_pages(source, &pages)?;
    log::info!("split {} pages out of {}", pages.len(), source.name());
    Ok(Artifact::pdf(SPLIT_FILE, bytes))
}

/// Every page of every entry, in list order.
pub fn export_merge(entries: &[MergeEntry]) -> Result<Artifact> {
    let sources: Vec<&SourceDocument> = entries.iter().map(|e| &e.document).collect();
    let bytes = pdf_ops::merge_documents(&sources)?;
    log::info!(
        "merged {} files ({} pages)",
        entries.len(),
        entries.iter().map(MergeEntry::page_count).sum::<usize>()
    );
    Ok(Artifact::pdf(MERGED_FILE, bytes))
}

/// Stamp each page's ink overlay over the page. Blank overlays are skipped.
pub fn export_draw(
    source: &SourceDocument,
    overlays: &BTreeMap<PageIndex, RgbaImage>,
) -> Result<Artifact> {
    let inked: BTreeMap<PageIndex, RgbaImage> = overlays
        .iter()
        .filter(|(_, image)| image.pixels().any(|p| p.0[3] != 0))
        .map(|(&page, image)| (page, image.clone()))
        .collect();
    let bytes = pdf_ops::overlay_images(source, &inked)?;
    log::info!("annotated {} pages of {}", inked.len(), source.name());
    Ok(Artifact::pdf(ANNOTATED_FILE, bytes))
}

/// Draw every text block. Block positions are in render pixels of the
/// page's viewport at `edit_scale`.
pub fn export_edit(
    source: &SourceDocument,
    blocks: &TextBlocks,
    edit_scale: f64,
) -> Result<Artifact> {
    let mut placed = Vec::with_capacity(blocks.len());
    for block in blocks.iter() {
        let mapping = PageMapping::new(
            source.page_box(block.page)?,
            source.viewport(block.page, edit_scale)?,
        );
        placed.push(PlacedText {
            page: block.page,
            anchor: mapping.text_anchor(block.position(), block.font_size),
            color: block.color,
            text: block.text.clone(),
        });
    }
    let bytes = pdf_ops::draw_text(source, &placed)?;
    log::info!("drew {} text blocks on {}", placed.len(), source.name());
    Ok(Artifact::pdf(EDITED_FILE, bytes))
}

/// File name of one exported page image; `page` is zero based.
pub fn page_image_name(page: PageIndex, format: ImageFormat) -> String {
    format!("page-{}.{}", page + 1, format.extension())
}

/// Rasterize the selected pages. One page yields the image itself, several
/// yield a zip archive with one entry per page in ascending order.
pub fn export_images<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    source: &SourceDocument,
    selection: &SelectionSet,
    settings: ImageExport,
) -> Result<Artifact> {
    let pages = selection.to_sorted_vec();
    if pages.is_empty() {
        return Err(Error::EmptySelection);
    }

    let mut encoded = Vec::with_capacity(pages.len());
    rasterizer.render_pages(source, &pages, settings.scale, &mut |page, image| {
        let bytes = settings.format.encode(&image, settings.quality)?;
        log::debug!("encoded page {} as {} ({} bytes)", page + 1, settings.format, bytes.len());
        encoded.push((page_image_name(page, settings.format), bytes));
        Ok(())
    })?;

    let artifact = if encoded.len() == 1 {
        let (file_name, bytes) = encoded.remove(0);
        Artifact {
            file_name,
            media_type: settings.format.media_type(),
            bytes,
        }
    } else {
        Artifact {
            file_name: IMAGES_ARCHIVE_FILE.to_string(),
            media_type: ZIP_MEDIA_TYPE,
            bytes: zip_entries(&encoded)?,
        }
    };
    log::info!("exported {} page images from {}", pages.len(), source.name());
    Ok(artifact)
}

fn zip_entries(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}
