//! Page order and page selection state
//!
//! Both structures are expressed over [`PageIndex`] values of the *original*
//! document. Arrange works on a [`PageOrder`] (ordered, duplicates allowed),
//! Split and To Image work on a [`SelectionSet`] (unique, ascending).
//!
//! All mutators return `true` when state changed. Guarded or out-of-range
//! calls are no-ops and return `false`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Zero-based index of a page in the originally loaded document.
pub type PageIndex = usize;

/// The user's desired output page sequence.
///
/// # Example
///
/// ```rust
/// use pdfworks::order::PageOrder;
///
/// let mut order = PageOrder::identity(3);
/// order.reorder(0, 2);
/// assert_eq!(order.as_slice(), &[1, 2, 0]);
/// order.duplicate_at(1);
/// assert_eq!(order.as_slice(), &[1, 2, 2, 0]);
/// order.delete_at(0);
/// assert_eq!(order.as_slice(), &[2, 2, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageOrder(Vec<PageIndex>);

impl PageOrder {
    /// `[0, 1, .., page_count - 1]`
    pub fn identity(page_count: usize) -> Self {
        Self((0..page_count).collect())
    }

    pub fn as_slice(&self) -> &[PageIndex] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Original page shown at output position `pos`.
    pub fn get(&self, pos: usize) -> Option<PageIndex> {
        self.0.get(pos).copied()
    }

    /// Move the entry at `from` so that it ends up at `to`, shifting the
    /// entries in between by one. This is a splice, not a swap.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.0.len() || to >= self.0.len() {
            return false;
        }
        let page = self.0.remove(from);
        self.0.insert(to, page);
        true
    }

    /// Remove the entry at `pos`. At least one page always remains.
    pub fn delete_at(&mut self, pos: usize) -> bool {
        if self.0.len() <= 1 || pos >= self.0.len() {
            return false;
        }
        self.0.remove(pos);
        true
    }

    /// Insert a copy of the entry at `pos` directly after it.
    pub fn duplicate_at(&mut self, pos: usize) -> bool {
        match self.0.get(pos).copied() {
            Some(page) => {
                self.0.insert(pos + 1, page);
                true
            }
            None => false,
        }
    }

    /// True when every entry is a valid index for a document with
    /// `page_count` pages.
    pub fn is_valid_for(&self, page_count: usize) -> bool {
        self.0.iter().all(|&p| p < page_count)
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<PageIndex> {
        &mut self.0
    }
}

impl From<Vec<PageIndex>> for PageOrder {
    fn from(pages: Vec<PageIndex>) -> Self {
        Self(pages)
    }
}

/// Pages picked for Split or image export.
///
/// Iteration order is always ascending original index, whatever order the
/// pages were toggled in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
    pages: BTreeSet<PageIndex>,
    page_count: usize,
}

impl SelectionSet {
    /// Empty selection over a document with `page_count` pages.
    pub fn new(page_count: usize) -> Self {
        Self {
            pages: BTreeSet::new(),
            page_count,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, page: PageIndex) -> bool {
        self.pages.contains(&page)
    }

    /// Flip membership of `page`.
    pub fn toggle(&mut self, page: PageIndex) -> bool {
        if page >= self.page_count {
            return false;
        }
        if !self.pages.remove(&page) {
            self.pages.insert(page);
        }
        true
    }

    pub fn select(&mut self, page: PageIndex) -> bool {
        page < self.page_count && self.pages.insert(page)
    }

    pub fn select_all(&mut self) -> bool {
        let before = self.pages.len();
        self.pages.extend(0..self.page_count);
        self.pages.len() != before
    }

    pub fn select_none(&mut self) -> bool {
        let changed = !self.pages.is_empty();
        self.pages.clear();
        changed
    }

    /// Selected pages, ascending.
    pub fn iter(&self) -> impl Iterator<Item = PageIndex> + '_ {
        self.pages.iter().copied()
    }

    pub fn to_sorted_vec(&self) -> Vec<PageIndex> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(PageOrder::identity(4).as_slice(), &[0, 1, 2, 3]);
        assert!(PageOrder::identity(0).is_empty());
    }

    #[test]
    fn test_reorder_is_splice_not_swap() {
        let mut order = PageOrder::identity(5);
        assert!(order.reorder(0, 3));
        // a swap would give [3, 1, 2, 0, 4]
        assert_eq!(order.as_slice(), &[1, 2, 3, 0, 4]);

        assert!(order.reorder(4, 1));
        assert_eq!(order.as_slice(), &[1, 4, 2, 3, 0]);
    }

    #[test]
    fn test_reorder_round_trip_not_identity_for_far_moves() {
        let mut order = PageOrder::identity(4);
        order.reorder(0, 3);
        order.reorder(3, 0);
        assert_eq!(order.as_slice(), &[0, 1, 2, 3]);

        // moving back from a different position does not undo the shift
        let mut order = PageOrder::identity(4);
        order.reorder(0, 2);
        order.reorder(1, 0);
        assert_eq!(order.as_slice(), &[2, 1, 0, 3]);
    }

    #[test]
    fn test_reorder_out_of_range() {
        let mut order = PageOrder::identity(3);
        assert!(!order.reorder(0, 3));
        assert!(!order.reorder(5, 0));
        assert!(!order.reorder(1, 1));
        assert_eq!(order.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_delete_keeps_last_page() {
        let mut order = PageOrder::identity(2);
        assert!(order.delete_at(0));
        assert_eq!(order.as_slice(), &[1]);
        assert!(!order.delete_at(0));
        assert_eq!(order.as_slice(), &[1]);
    }

    #[test]
    fn test_duplicate_inserts_after() {
        let mut order = PageOrder::identity(3);
        assert!(order.duplicate_at(2));
        assert_eq!(order.as_slice(), &[0, 1, 2, 2]);
        assert!(!order.duplicate_at(9));
    }

    #[test]
    fn test_end_to_end_edit_sequence() {
        let mut order = PageOrder::identity(3);
        order.reorder(0, 2);
        assert_eq!(order.as_slice(), &[1, 2, 0]);
        order.duplicate_at(1);
        assert_eq!(order.as_slice(), &[1, 2, 2, 0]);
        order.delete_at(0);
        assert_eq!(order.as_slice(), &[2, 2, 0]);
        assert!(order.is_valid_for(3));
        assert!(!order.is_valid_for(2));
    }

    #[test]
    fn test_selection_sorted_regardless_of_toggle_order() {
        let mut sel = SelectionSet::new(4);
        sel.toggle(3);
        sel.toggle(0);
        assert_eq!(sel.to_sorted_vec(), vec![0, 3]);
    }

    #[test]
    fn test_selection_bounds_and_idempotence() {
        let mut sel = SelectionSet::new(3);
        assert!(!sel.toggle(3));
        assert!(sel.select_all());
        assert!(!sel.select_all());
        assert_eq!(sel.len(), 3);
        assert!(sel.select_none());
        assert!(!sel.select_none());
        assert!(sel.select(1));
        assert!(!sel.select(1));
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn delete_never_empties(len in 1usize..20, pos in 0usize..25) {
            let mut order = PageOrder::identity(len);
            order.delete_at(pos);
            prop_assert!(!order.is_empty());
            if len == 1 {
                prop_assert_eq!(order.as_slice(), &[0]);
            }
        }

        #[test]
        fn duplicate_grows_by_one(pages in prop::collection::vec(0usize..10, 1..20), pos in 0usize..20) {
            prop_assume!(pos < pages.len());
            let mut order = PageOrder::from(pages.clone());
            let value = pages[pos];
            prop_assert!(order.duplicate_at(pos));
            prop_assert_eq!(order.len(), pages.len() + 1);
            prop_assert_eq!(order.get(pos + 1), Some(value));
            prop_assert_eq!(order.get(pos), Some(value));
        }

        #[test]
        fn reorder_matches_splice(len in 1usize..15, from in 0usize..15, to in 0usize..15) {
            prop_assume!(from < len && to < len);
            let mut order = PageOrder::identity(len);
            order.reorder(from, to);

            let mut expected: Vec<usize> = (0..len).collect();
            let moved = expected.remove(from);
            expected.insert(to, moved);
            prop_assert_eq!(order.as_slice(), expected.as_slice());
            prop_assert_eq!(order.get(to), Some(from));
        }

        #[test]
        fn toggle_is_its_own_inverse(
            count in 1usize..30,
            initial in prop::collection::vec(0usize..30, 0..10),
            page in 0usize..30,
        ) {
            let mut sel = SelectionSet::new(count);
            for p in initial {
                sel.select(p);
            }
            let before = sel.clone();
            sel.toggle(page);
            sel.toggle(page);
            prop_assert_eq!(sel, before);
        }

        #[test]
        fn selection_is_ascending_subset(count in 1usize..30, toggles in prop::collection::vec(0usize..40, 0..30)) {
            let mut sel = SelectionSet::new(count);
            for p in toggles {
                sel.toggle(p);
            }
            let pages = sel.to_sorted_vec();
            prop_assert!(pages.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(pages.iter().all(|&p| p < count));
        }
    }
}
