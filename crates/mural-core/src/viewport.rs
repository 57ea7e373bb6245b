//! Viewport pan/zoom transform between screen and document space.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 10.0;

/// The view transform for the canvas.
///
/// `offset` is the screen position of the document origin; zooming at a
/// cursor keeps the document point under that cursor fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Current translation offset (pan), in screen pixels.
    pub offset: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The affine transform converting document to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// The inverse transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to document coordinates.
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    /// Convert a document point to screen coordinates.
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        self.transform() * canvas
    }

    /// Pan by a delta in screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let anchor = self.screen_to_canvas(screen);
        self.zoom = new_zoom;
        let new_screen = self.canvas_to_screen(anchor);
        self.offset += Vec2::new(screen.x - new_screen.x, screen.y - new_screen.y);
    }

    /// Reset to the origin at 100%.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// The document rectangle currently visible in a screen area of the
    /// given size. Used to cull spatial index queries.
    pub fn visible_rect(&self, screen_width: f64, screen_height: f64) -> Rect {
        let top_left = self.screen_to_canvas(Point::ORIGIN);
        let bottom_right = self.screen_to_canvas(Point::new(screen_width, screen_height));
        Rect::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
    }
}
