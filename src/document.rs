//! Loaded source documents.
//!
//! A [`SourceDocument`] is the handle every tool works against: the original
//! bytes, the parsed `lopdf` model and the size of every page. It is
//! immutable after load; exports work on clones of the parsed model.

use std::fs;
use std::path::Path;

use lopdf::{Document, ObjectId};

use crate::error::{Error, Result};
use crate::geometry::{PageBox, Viewport};
use crate::order::PageIndex;
use crate::pdf_ops;

/// How far into the input a `%PDF-` header may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// A parsed, page-indexed PDF.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    name: String,
    bytes: Vec<u8>,
    doc: Document,
    page_ids: Vec<ObjectId>,
    page_boxes: Vec<PageBox>,
}

impl SourceDocument {
    /// Parse `bytes` as a PDF. `name` is only used for display and logs.
    pub fn load(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        if !looks_like_pdf(&bytes) {
            return Err(Error::NotPdf);
        }
        let doc = Document::load_mem(&bytes).map_err(|e| Error::Parse(e.to_string()))?;
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(Error::NoPages);
        }
        let page_boxes = page_ids
            .iter()
            .map(|&id| {
                pdf_ops::page_box(&doc, id).unwrap_or_else(|| {
                    log::warn!("{name}: page {id:?} has no usable MediaBox, assuming Letter");
                    PageBox::LETTER
                })
            })
            .collect();
        log::debug!("loaded {} ({} pages, {} bytes)", name, page_ids.len(), bytes.len());
        Ok(Self {
            name,
            bytes,
            doc,
            page_ids,
            page_boxes,
        })
    }

    /// Read and parse a file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::load(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn page_box(&self, page: PageIndex) -> Result<PageBox> {
        self.page_boxes
            .get(page)
            .copied()
            .ok_or(Error::PageOutOfRange {
                page,
                page_count: self.page_count(),
            })
    }

    pub fn page_boxes(&self) -> &[PageBox] {
        &self.page_boxes
    }

    /// Canvas size of `page` at `scale`.
    pub fn viewport(&self, page: PageIndex, scale: f64) -> Result<Viewport> {
        Ok(self.page_box(page)?.viewport(scale))
    }

    /// Fresh mutable copy of the parsed model together with its page ids,
    /// index-aligned with [`PageIndex`].
    pub(crate) fn working_copy(&self) -> (Document, Vec<ObjectId>) {
        (self.doc.clone(), self.page_ids.clone())
    }

    pub(crate) fn check_page(&self, page: PageIndex) -> Result<()> {
        if page < self.page_count() {
            Ok(())
        } else {
            Err(Error::PageOutOfRange {
                page,
                page_count: self.page_count(),
            })
        }
    }
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

#[cfg(test)]
#[path = "../tests/common/fixture.rs"]
pub(crate) mod test_support;
