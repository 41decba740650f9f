//! Edge list construction.

use crate::error::RasterResult;
use crate::flatten::Contour;
use crate::geometry::Point;

/// Vertical samples per destination row.
pub const SUBSAMPLES: i32 = 5;

/// A polygon edge in sub-sampled device space. `y0 < y1` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// +1 when the edge originally pointed down, -1 when it pointed up.
    pub dir: i32,
}

/// Edges collected for one rasterize call.
#[derive(Debug, Default)]
pub struct EdgeList {
    edges: Vec<Edge>,
}

impl EdgeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Add the edge `(x0, y0) -> (x1, y1)` given in device pixels.
    ///
    /// Horizontal edges contribute nothing and are dropped.
    pub fn add_edge(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) -> RasterResult<()> {
        if y0 == y1 {
            return Ok(());
        }
        let y0 = y0 * SUBSAMPLES as f32;
        let y1 = y1 * SUBSAMPLES as f32;
        let edge = if y0 < y1 {
            Edge {
                x0,
                y0,
                x1,
                y1,
                dir: 1,
            }
        } else {
            Edge {
                x0: x1,
                y0: y1,
                x1: x0,
                y1: y0,
                dir: -1,
            }
        };
        self.edges.try_reserve(1)?;
        self.edges.push(edge);
        Ok(())
    }

    /// Add a closed polygon, wrapping the last vertex back to the first.
    pub fn add_polygon(&mut self, points: &[Point]) -> RasterResult<()> {
        if points.len() < 2 {
            return Ok(());
        }
        self.edges.try_reserve(points.len())?;
        let mut prev = points[points.len() - 1];
        for &p in points {
            self.add_edge(prev.x, prev.y, p.x, p.y)?;
            prev = p;
        }
        Ok(())
    }

    /// Add every flattened contour as an implicitly closed polygon.
    pub fn add_contours(&mut self, contours: &[Contour]) -> RasterResult<()> {
        for contour in contours {
            let n = contour.points.len();
            if n < 2 {
                continue;
            }
            self.edges.try_reserve(n)?;
            let mut prev = contour.points[n - 1].pos;
            for point in &contour.points {
                self.add_edge(prev.x, prev.y, point.pos.x, point.pos.y)?;
                prev = point.pos;
            }
        }
        Ok(())
    }

    /// Order edges by their top y.
    pub fn sort(&mut self) {
        self.edges.sort_unstable_by(|a, b| a.y0.total_cmp(&b.y0));
    }
}
