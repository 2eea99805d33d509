//! Screen/canvas coordinate conversion.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Maps canvas-space units to screen pixels.
///
/// `screen = origin + canvas * zoom`. The origin is where the canvas's
/// top-left corner sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen position of the canvas origin.
    pub origin: Point,
    /// Scale from canvas units to screen pixels.
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(origin: Point, zoom: f64) -> Self {
        Self { origin, zoom }
    }

    /// Canvas to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2()) * Affine::scale(self.zoom)
    }

    /// Screen to canvas transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.origin.to_vec2())
    }

    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        self.transform() * canvas_point
    }

    /// Convert a screen-space distance to canvas units.
    pub fn screen_distance_to_canvas(&self, distance: f64) -> f64 {
        distance / self.zoom
    }

    /// Convert a screen-space delta to canvas units.
    pub fn screen_delta_to_canvas(&self, delta: Vec2) -> Vec2 {
        delta / self.zoom
    }
}
