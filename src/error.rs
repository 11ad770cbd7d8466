//! Error type shared by every tool.
//!
//! Load failures and export failures are kept apart so a session can tell
//! "the file could not be opened" from "the output could not be produced".

use thiserror::Error;

use crate::order::PageIndex;

/// Errors produced while loading, editing or exporting documents.
#[derive(Debug, Error)]
pub enum Error {
    /// Input does not carry a PDF header.
    #[error("input is not a PDF file")]
    NotPdf,
    /// The PDF structure could not be parsed.
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    /// The PDF parsed but has an empty page tree.
    #[error("document has no pages")]
    NoPages,
    /// A page index outside of `[0, page_count)`.
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: PageIndex, page_count: usize },
    /// A page-tree object was missing or had the wrong type.
    #[error("malformed page tree: {0}")]
    PageTree(String),
    /// Export requested with nothing selected.
    #[error("no pages selected")]
    EmptySelection,
    /// Merge requested with fewer than two files.
    #[error("merge needs at least 2 files, got {0}")]
    NotEnoughFiles(usize),
    /// Export requested before any document was loaded.
    #[error("no document loaded")]
    NoDocument,
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
    /// Text that the standard font encoding cannot represent.
    #[error("character {0:?} cannot be drawn with the standard font")]
    Unencodable(char),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("failed to save PDF: {0}")]
    Save(String),
    #[error("render error: {0}")]
    Render(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that happen while opening a document, as opposed
    /// to failures of an export over an already loaded one.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Error::NotPdf | Error::Parse(_) | Error::NoPages | Error::PageTree(_)
        )
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_classification() {
        assert!(Error::NotPdf.is_load_failure());
        assert!(Error::Parse("bad xref".into()).is_load_failure());
        assert!(!Error::EmptySelection.is_load_failure());
        assert!(!Error::Save("disk full".into()).is_load_failure());
    }

    #[test]
    fn test_messages() {
        let err = Error::PageOutOfRange { page: 7, page_count: 3 };
        assert_eq!(err.to_string(), "page 7 out of range (page_count=3)");
        assert_eq!(
            Error::NotEnoughFiles(1).to_string(),
            "merge needs at least 2 files, got 1"
        );
    }
}
