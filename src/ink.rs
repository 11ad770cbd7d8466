//! Freehand ink capture for the Draw tool.
//!
//! An [`InkCanvas`] is a transparent raster the size of the page's editing
//! viewport. Strokes are painted as round-capped, round-joined polylines.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::geometry::{Point, Viewport};

/// Brush colors offered by the Draw tool.
pub const PALETTE: [Rgb; 6] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0xef, 0x44, 0x44),
    Rgb::new(0x3b, 0x82, 0xf6),
    Rgb::new(0x22, 0xc5, 0x5e),
    Rgb::new(0xf5, 0x9e, 0x0b),
    Rgb::new(0x8b, 0x5c, 0xf6),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub color: Rgb,
    /// Line width in canvas pixels.
    pub size: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Rgb::BLACK,
            size: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    last: Point,
    brush: Brush,
}

/// Transparent raster receiving strokes.
#[derive(Debug, Clone)]
pub struct InkCanvas {
    image: RgbaImage,
    stroke: Option<ActiveStroke>,
}

impl InkCanvas {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            image: RgbaImage::new(viewport.width, viewport.height),
            stroke: None,
        }
    }

    /// Resume drawing on a previously saved overlay.
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image, stroke: None }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    /// True when no pixel carries ink.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }

    /// Pointer down. Nothing is painted until the pointer moves.
    pub fn begin_stroke(&mut self, at: Point, brush: Brush) {
        self.stroke = Some(ActiveStroke { last: at, brush });
    }

    /// Pointer move. Paints from the previous point to `to`.
    pub fn extend_stroke(&mut self, to: Point) {
        let Some(stroke) = self.stroke else {
            return;
        };
        paint_segment(&mut self.image, stroke.last, to, stroke.brush);
        self.stroke = Some(ActiveStroke { last: to, ..stroke });
    }

    /// Pointer up. Returns whether a stroke was in progress.
    pub fn end_stroke(&mut self) -> bool {
        self.stroke.take().is_some()
    }

    pub fn clear(&mut self) {
        self.stroke = None;
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
}

fn paint_segment(image: &mut RgbaImage, a: Point, b: Point, brush: Brush) {
    let radius = (brush.size / 2.0).max(0.5);
    let ink = Rgba([brush.color.r, brush.color.g, brush.color.b, 255]);
    let (w, h) = (f64::from(image.width()), f64::from(image.height()));

    let x0 = (a.x.min(b.x) - radius).floor().max(0.0);
    let x1 = (a.x.max(b.x) + radius).ceil().min(w - 1.0);
    let y0 = (a.y.min(b.y) - radius).floor().max(0.0);
    let y1 = (a.y.max(b.y) + radius).ceil().min(h - 1.0);
    if x0 > x1 || y0 > y1 {
        return;
    }

    for y in y0 as u32..=y1 as u32 {
        for x in x0 as u32..=x1 as u32 {
            let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if distance_to_segment(center, a, b) <= radius {
                image.put_pixel(x, y, ink);
            }
        }
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}
