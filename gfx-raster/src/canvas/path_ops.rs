//! Path building operations for Canvas.
//!
//! Coordinates are recorded untransformed; the current matrix is applied at
//! drawing time.

use super::Canvas;
use crate::error::RasterResult;
use crate::geometry::{
    ArcParams, CubicBezierParams, EllipseParams, Point, QuadraticBezierParams, RectParams,
    RoundRectParams, SvgArcParams,
};
use crate::path::Path;

impl Canvas<'_> {
    /// Discard the current path.
    pub fn new_path(&mut self) {
        log::debug!(target: "raster", "new_path");
        self.path.clear();
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> RasterResult<()> {
        self.path.move_to(x, y)
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> RasterResult<()> {
        self.path.line_to(x, y)
    }

    pub fn quad_to(&mut self, params: &QuadraticBezierParams) -> RasterResult<()> {
        self.path.quad_to(params)
    }

    pub fn cubic_to(&mut self, params: &CubicBezierParams) -> RasterResult<()> {
        self.path.cubic_to(params)
    }

    /// SVG-style elliptical arc from the current point.
    pub fn arc_to(&mut self, params: &SvgArcParams) -> RasterResult<()> {
        self.path.arc_to(params)
    }

    pub fn rect(&mut self, params: &RectParams) -> RasterResult<()> {
        self.path.add_rect(params)
    }

    pub fn round_rect(&mut self, params: &RoundRectParams) -> RasterResult<()> {
        self.path.add_round_rect(params)
    }

    pub fn ellipse(&mut self, params: &EllipseParams) -> RasterResult<()> {
        self.path.add_ellipse(params)
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32) -> RasterResult<()> {
        self.path.add_circle(cx, cy, r)
    }

    /// Circular arc, joined to the current point with a line if there is one.
    pub fn arc(&mut self, params: &ArcParams) -> RasterResult<()> {
        self.path.add_arc(params)
    }

    pub fn close_path(&mut self) -> RasterResult<()> {
        self.path.close()
    }

    /// Append `path` to the current path as-is.
    pub fn add_path(&mut self, path: &Path) -> RasterResult<()> {
        self.path.add_path(path, None)
    }

    /// Current point in user space.
    pub fn current_point(&self) -> Point {
        self.path.current_point()
    }

    /// Borrow the current path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
