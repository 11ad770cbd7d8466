//! Drag-to-reorder controller shared by Arrange (pages) and Merge (files).
//!
//! The controller only remembers which position is being dragged. Every
//! hover over another position splices the dragged item there and the
//! dragged position follows it, so the list is always in its live order.

/// Tracks one drag gesture over a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragController {
    dragging: Option<usize>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, pos: usize) {
        self.dragging = Some(pos);
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Hovering `pos` while dragging moves the dragged item there.
    /// Returns `true` when `items` changed.
    pub fn over<T>(&mut self, items: &mut Vec<T>, pos: usize) -> bool {
        let Some(from) = self.dragging else {
            return false;
        };
        if from == pos || from >= items.len() || pos >= items.len() {
            return false;
        }
        let item = items.remove(from);
        items.insert(pos, item);
        self.dragging = Some(pos);
        true
    }

    pub fn end(&mut self) {
        self.dragging = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_follows_item() {
        let mut items = vec!['a', 'b', 'c', 'd'];
        let mut drag = DragController::new();
        drag.start(0);
        assert!(drag.over(&mut items, 1));
        assert!(drag.over(&mut items, 2));
        assert_eq!(items, vec!['b', 'c', 'a', 'd']);
        assert_eq!(drag.dragging(), Some(2));
        drag.end();
        assert!(!drag.over(&mut items, 0));
        assert_eq!(items, vec!['b', 'c', 'a', 'd']);
    }

    #[test]
    fn test_over_same_or_invalid_position() {
        let mut items = vec![1, 2, 3];
        let mut drag = DragController::new();
        drag.start(1);
        assert!(!drag.over(&mut items, 1));
        assert!(!drag.over(&mut items, 7));
        assert_eq!(items, vec![1, 2, 3]);
    }
}
