use crate::document::SourceDocument;
use crate::export::{self, Artifact};
use crate::merge::MergeList;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::Path;

/// Parallel document loading using Rayon
///
/// Files are independent until they are concatenated, so reading and
/// parsing them is done concurrently. Result order always matches input
/// order.

/// Load and parse several PDFs in parallel
///
/// # Example
/// ```rust,no_run
/// use pdfworks::parallel;
///
/// let docs = parallel::load_documents_parallel(&["a.pdf", "b.pdf"]).expect("load");
/// assert_eq!(docs.len(), 2);
/// ```
pub fn load_documents_parallel<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<SourceDocument>> {
    paths
        .par_iter()
        .map(|path| {
            let path = path.as_ref();
            SourceDocument::open(path).with_context(|| format!("Failed to load {}", path.display()))
        })
        .collect()
}

/// Merge PDF files in parallel
///
/// Loads all inputs concurrently, then concatenates their pages in input
/// order (concatenation itself is sequential).
///
/// # Example
/// ```rust,no_run
/// use pdfworks::parallel;
///
/// let artifact = parallel::merge_files_parallel(&["a.pdf", "b.pdf"]).expect("merge");
/// artifact.save_into(".").expect("write");
/// ```
pub fn merge_files_parallel<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Artifact> {
    if paths.len() < 2 {
        anyhow::bail!("Merge needs at least 2 input PDFs, got {}", paths.len());
    }
    let mut list = MergeList::new();
    list.add(load_documents_parallel(paths)?);
    Ok(export::export_merge(list.entries())?)
}

/// Page counts of several PDFs, loaded in parallel
pub fn page_counts_parallel<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<(String, usize)>> {
    Ok(load_documents_parallel(paths)?
        .into_iter()
        .map(|doc| (doc.name().to_string(), doc.page_count()))
        .collect())
}
