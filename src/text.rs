//! Text blocks placed by the Edit tool.
//!
//! Positions and font sizes are stored in the render pixels of the page's
//! editing viewport; they are mapped to PDF points only at export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Rgb;
use crate::geometry::Point;
use crate::order::PageIndex;

pub const DEFAULT_TEXT: &str = "Type here";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub page: PageIndex,
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub color: Rgb,
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

impl TextBlock {
    pub fn new(page: PageIndex, at: Point, font_size: f64, color: Rgb) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            x: at.x,
            y: at.y,
            text: DEFAULT_TEXT.to_string(),
            font_size,
            color,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Partial update applied by [`TextBlocks::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlockPatch {
    pub text: Option<String>,
    pub position: Option<Point>,
    pub font_size: Option<f64>,
    pub color: Option<Rgb>,
}

/// All text blocks of a document, grouped by page in creation order.
#[derive(Debug, Clone, Default)]
pub struct TextBlocks {
    pages: BTreeMap<PageIndex, Vec<TextBlock>>,
}

impl TextBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `block` and return its id.
    pub fn add(&mut self, block: TextBlock) -> Uuid {
        let id = block.id;
        self.pages.entry(block.page).or_default().push(block);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&TextBlock> {
        self.iter().find(|b| b.id == id)
    }

    pub fn on_page(&self, page: PageIndex) -> &[TextBlock] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Apply `patch` to the block with `id`. Returns `false` for unknown ids.
    pub fn update(&mut self, id: Uuid, patch: TextBlockPatch) -> bool {
        let Some(block) = self.pages.values_mut().flatten().find(|b| b.id == id) else {
            return false;
        };
        if let Some(text) = patch.text {
            block.text = text;
        }
        if let Some(at) = patch.position {
            block.x = at.x;
            block.y = at.y;
        }
        if let Some(size) = patch.font_size {
            block.font_size = size;
        }
        if let Some(color) = patch.color {
            block.color = color;
        }
        true
    }

    pub fn remove(&mut self, id: Uuid) -> Option<TextBlock> {
        for blocks in self.pages.values_mut() {
            if let Some(pos) = blocks.iter().position(|b| b.id == id) {
                return Some(blocks.remove(pos));
            }
        }
        None
    }

    /// Every block, page by page.
    pub fn iter(&self) -> impl Iterator<Item = &TextBlock> {
        self.pages.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
