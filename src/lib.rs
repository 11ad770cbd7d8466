//! # pdfworks
//!
//! A toolkit of page-level PDF editing tools. Parsing and mutation are done
//! with `lopdf`, rasterization goes through the [`raster::Rasterizer`] seam.
//! This library provides:
//!
//! - **Arrange**: Reorder, duplicate and delete pages
//! - **Split**: Extract a selection of pages
//! - **Merge**: Concatenate several files in a chosen order
//! - **Draw**: Freehand ink stamped over pages
//! - **Edit**: Text blocks drawn with the standard Helvetica font
//! - **To Image**: Pages exported as PNG, JPEG or WebP (zipped when several)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfworks::order::PageOrder;
//! use pdfworks::document::SourceDocument;
//! use pdfworks::export;
//!
//! let source = SourceDocument::open("input.pdf").expect("Failed to load");
//!
//! // page 2 twice, then page 1
//! let order = PageOrder::from(vec![1, 1, 0]);
//! let artifact = export::export_arrange(&source, &order).expect("Failed to arrange");
//! artifact.save_into(".").expect("Failed to write");
//! ```
//!
//! ## Modules
//!
//! - [`document`]: Loading and page geometry of source files
//! - [`order`]: Page order and page selection state
//! - [`geometry`]: Screen, canvas and page coordinate mapping
//! - [`ink`] / [`text`]: Annotation state of the Draw and Edit tools
//! - [`merge`] / [`drag`]: Merge list and drag-to-reorder
//! - [`export`]: One export per tool, producing an [`export::Artifact`]
//! - [`pdf_ops`]: The underlying PDF mutations
//! - [`session`]: Shared load/edit/export lifecycle of every tool
//! - [`app`] / [`tool`] / [`config`]: Application root and navigation
//!
//! ## Examples
//!
//! ### Interactive session
//!
//! ```rust,no_run
//! use pdfworks::app::App;
//! use pdfworks::config::Config;
//! use pdfworks::geometry::Point;
//!
//! let mut app = App::new(Config::default());
//! app.draw.open("input.pdf").expect("Failed to load");
//! app.draw
//!     .edit(|tool, _| {
//!         tool.begin_stroke(Point::new(20.0, 20.0));
//!         tool.extend_stroke(Point::new(200.0, 120.0));
//!         tool.end_stroke();
//!     })
//!     .expect("No document");
//! let artifact = app.draw.export().expect("Failed to export");
//! assert_eq!(artifact.file_name, "annotated.pdf");
//! ```
//!
//! ### Merging PDFs
//!
//! ```rust,no_run
//! use pdfworks::parallel;
//!
//! let artifact = parallel::merge_files_parallel(&["file1.pdf", "file2.pdf"])
//!     .expect("Failed to merge");
//! artifact.save_into("out").expect("Failed to write");
//! ```

pub mod app;
pub mod color;
pub mod config;
pub mod document;
pub mod drag;
pub mod error;
pub mod export;
pub mod geometry;
pub mod ink;
pub mod merge;
pub mod order;
pub mod parallel;
pub mod pdf_ops;
pub mod raster;
pub mod session;
pub mod text;
pub mod tool;

pub use error::{Error, Result};
