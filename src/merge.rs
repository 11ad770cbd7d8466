//! Merge list: the ordered set of files the Merge tool concatenates.

use uuid::Uuid;

use crate::document::SourceDocument;
use crate::drag::DragController;

/// One uploaded file in the merge list.
#[derive(Debug, Clone)]
pub struct MergeEntry {
    pub id: Uuid,
    pub document: SourceDocument,
}

impl MergeEntry {
    pub fn new(document: SourceDocument) -> Self {
        Self {
            id: Uuid::new_v4(),
            document,
        }
    }

    pub fn name(&self) -> &str {
        self.document.name()
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }
}

/// Ordered merge entries with drag reordering.
#[derive(Debug, Clone, Default)]
pub struct MergeList {
    entries: Vec<MergeEntry>,
    drag: DragController,
}

impl MergeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append documents in the order given, returning their ids.
    pub fn add(&mut self, documents: impl IntoIterator<Item = SourceDocument>) -> Vec<Uuid> {
        let start = self.entries.len();
        self.entries
            .extend(documents.into_iter().map(MergeEntry::new));
        self.entries[start..].iter().map(|e| e.id).collect()
    }

    /// Drop the entry with `id`. A drag in progress is cancelled, since
    /// its index may now point at another file.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.drag.end();
        }
        removed
    }

    pub fn entries(&self) -> &[MergeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge is offered from two files on.
    pub fn can_merge(&self) -> bool {
        self.entries.len() >= 2
    }

    pub fn total_pages(&self) -> usize {
        self.entries.iter().map(MergeEntry::page_count).sum()
    }

    pub fn drag_start(&mut self, pos: usize) {
        self.drag.start(pos);
    }

    pub fn drag_over(&mut self, pos: usize) -> bool {
        self.drag.over(&mut self.entries, pos)
    }

    pub fn drag_end(&mut self) {
        self.drag.end();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.drag.end();
    }
}
