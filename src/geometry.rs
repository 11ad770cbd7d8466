//! Coordinate mapping between screen, canvas and page space
//!
//! Three spaces are involved:
//!
//! - **client space**: pointer coordinates as reported by the windowing
//!   layer, relative to the window, in display units.
//! - **render space**: pixels of the canvas a page was rasterized into at a
//!   given scale. Origin top-left, Y grows downward.
//! - **page space**: PDF points. Origin bottom-left of the page box, Y grows
//!   upward, independent of zoom.
//!
//! ```text
//! client --CanvasBox::to_device--> render --PageMapping::to_page--> page
//! ```

use serde::{Deserialize, Serialize};

/// A point in any of the coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// On-screen placement of a canvas together with its backing store size.
///
/// The canvas may be displayed larger or smaller than its pixel buffer; the
/// mapping corrects for that before anything is drawn or placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBox {
    pub left: f64,
    pub top: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl CanvasBox {
    /// Canvas shown at exactly its pixel size at `(left, top)`.
    pub fn unscaled(left: f64, top: f64, viewport: Viewport) -> Self {
        Self {
            left,
            top,
            display_width: f64::from(viewport.width),
            display_height: f64::from(viewport.height),
            pixel_width: viewport.width,
            pixel_height: viewport.height,
        }
    }

    fn factors(&self) -> (f64, f64) {
        let fx = if self.display_width > 0.0 {
            f64::from(self.pixel_width) / self.display_width
        } else {
            1.0
        };
        let fy = if self.display_height > 0.0 {
            f64::from(self.pixel_height) / self.display_height
        } else {
            1.0
        };
        (fx, fy)
    }

    /// Client coordinates to canvas pixel coordinates.
    pub fn to_device(&self, client: Point) -> Point {
        let (fx, fy) = self.factors();
        Point::new((client.x - self.left) * fx, (client.y - self.top) * fy)
    }

    /// Canvas pixel coordinates back to client coordinates.
    pub fn to_client(&self, device: Point) -> Point {
        let (fx, fy) = self.factors();
        Point::new(device.x / fx + self.left, device.y / fy + self.top)
    }
}

/// Visible page area in PDF points (the MediaBox).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    /// US Letter, used when a page carries no usable MediaBox.
    pub const LETTER: PageBox = PageBox {
        x: 0.0,
        y: 0.0,
        width: 612.0,
        height: 792.0,
    };

    /// Box from the four MediaBox numbers `[llx lly urx ury]`.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Canvas size this page rasterizes to at `scale`.
    pub fn viewport(&self, scale: f64) -> Viewport {
        Viewport {
            width: (self.width * scale).floor().max(1.0) as u32,
            height: (self.height * scale).floor().max(1.0) as u32,
        }
    }
}

/// Pixel size of a rendered page canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Where and how large text lands in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextAnchor {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

/// Render-space to page-space mapping for one page at one viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMapping {
    page: PageBox,
    scale_x: f64,
    scale_y: f64,
}

impl PageMapping {
    pub fn new(page: PageBox, viewport: Viewport) -> Self {
        Self {
            page,
            scale_x: page.width / f64::from(viewport.width.max(1)),
            scale_y: page.height / f64::from(viewport.height.max(1)),
        }
    }

    /// Points per render pixel along X and Y.
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }

    /// Render pixel to PDF point, flipping the Y axis.
    pub fn to_page(&self, render: Point) -> Point {
        Point::new(
            self.page.x + render.x * self.scale_x,
            self.page.y + self.page.height - render.y * self.scale_y,
        )
    }

    /// PDF point to render pixel.
    pub fn to_render(&self, page: Point) -> Point {
        Point::new(
            (page.x - self.page.x) / self.scale_x,
            (self.page.y + self.page.height - page.y) / self.scale_y,
        )
    }

    /// Baseline origin and size for text clicked at `render` with a font
    /// size expressed in render pixels. The click marks the top of the
    /// glyphs; text drawing anchors at the baseline, one font size lower.
    pub fn text_anchor(&self, render: Point, font_size: f64) -> TextAnchor {
        TextAnchor {
            x: self.page.x + render.x * self.scale_x,
            y: self.page.y + self.page.height
                - render.y * self.scale_y
                - font_size * self.scale_y,
            size: font_size * self.scale_x,
        }
    }
}
