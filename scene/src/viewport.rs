//! Scene bounds and client/scene coordinate conversion.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::consts::{DEFAULT_SCENE_HEIGHT, DEFAULT_SCENE_WIDTH};

/// A point in either client or scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Scene bounds and the mapping between client space and scene space.
///
/// Client space has its origin at the top-left with y growing downward.
/// Scene space has its origin at the bottom-left with y growing upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: DEFAULT_SCENE_WIDTH, height: DEFAULT_SCENE_HEIGHT }
    }
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Convert a client-space point to scene coordinates.
    #[must_use]
    pub fn client_to_scene(&self, client: Point) -> Point {
        Point { x: client.x, y: self.height - client.y }
    }

    /// Convert a scene-space point to client coordinates.
    #[must_use]
    pub fn scene_to_client(&self, scene: Point) -> Point {
        Point { x: scene.x, y: self.height - scene.y }
    }

    /// Client-space top-left corner of a box whose scene bottom-left is `(x, y)`.
    #[must_use]
    pub fn box_top_left(&self, x: f64, y: f64, h: f64) -> Point {
        Point { x, y: self.height - y - h }
    }

    /// Scene position of a box of height `h` whose client top-left is `top_left`,
    /// rounded to whole units.
    #[must_use]
    pub fn box_origin(&self, top_left: Point, h: f64) -> Point {
        Point { x: top_left.x.round(), y: (self.height - top_left.y - h).round() }
    }

    /// Clamp a box origin so a `w` × `h` box stays inside the scene.
    #[must_use]
    pub fn clamp(&self, origin: Point, w: f64, h: f64) -> Point {
        Point {
            x: origin.x.min(self.width - w).max(0.0),
            y: origin.y.min(self.height - h).max(0.0),
        }
    }
}
