//! Adaptive cubic flattening.
//!
//! Curves are subdivided with de Casteljau's construction until the two
//! interior control points lie close enough to the chord. Subdivision uses
//! an explicit stack so the depth never touches the call stack.

use crate::config::RasterConfig;
use crate::error::RasterResult;
use crate::geometry::Point;
use crate::matrix::Matrix;
use crate::path::{Path, Segment};

/// Maximum subdivision depth for a single cubic.
const MAX_LEVEL: u32 = 10;

/// The vertex is a real corner of the input (segment end), not a curve sample.
pub const PT_CORNER: u8 = 0x01;
/// The join at this vertex is drawn beveled.
pub const PT_BEVEL: u8 = 0x02;
/// The path turns left at this vertex.
pub const PT_LEFT: u8 = 0x04;

/// A flattened vertex together with the per-vertex data the stroker fills in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathPoint {
    pub pos: Point,
    /// Unit direction of the segment leaving this vertex.
    pub dir: Point,
    /// Length of the segment leaving this vertex.
    pub len: f32,
    /// Scaled miter extrusion vector.
    pub dm: Point,
    pub flags: u8,
}

impl PathPoint {
    pub fn new(pos: Point, flags: u8) -> Self {
        Self {
            pos,
            flags,
            ..Default::default()
        }
    }
}

/// One flattened contour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<PathPoint>,
    pub closed: bool,
}

impl Contour {
    /// Append a vertex, merging it into the previous one when they coincide.
    pub(crate) fn add_point(&mut self, pos: Point, flags: u8, dist_tol: f32) -> RasterResult<()> {
        if let Some(last) = self.points.last_mut() {
            if last.pos.approx_eq(pos, dist_tol) {
                last.flags |= flags;
                return Ok(());
            }
        }
        self.points.try_reserve(1)?;
        self.points.push(PathPoint::new(pos, flags));
        Ok(())
    }

    /// Polyline length, including the closing segment for closed contours.
    pub fn length(&self) -> f32 {
        let open: f32 = self
            .points
            .windows(2)
            .map(|w| w[0].pos.distance(w[1].pos))
            .sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) => open + last.pos.distance(first.pos),
            _ => open,
        }
    }
}

/// Lazy flattening of one cubic segment.
///
/// Yields the end point of every flat piece, in order, paired with `true` for
/// the cubic's own end point. The start point is never yielded.
pub struct FlattenCubic {
    stack: Vec<([Point; 4], u32)>,
    tess_tol: f32,
}

/// Flatten the cubic `p0..p3` with the given flatness tolerance.
pub fn flatten_cubic(p0: Point, p1: Point, p2: Point, p3: Point, tess_tol: f32) -> FlattenCubic {
    let mut stack = Vec::with_capacity(MAX_LEVEL as usize + 1);
    stack.push(([p0, p1, p2, p3], 0));
    FlattenCubic { stack, tess_tol }
}

impl Iterator for FlattenCubic {
    type Item = (Point, bool);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ([p1, p2, p3, p4], level) = self.stack.pop()?;

            let dx = p4.x - p1.x;
            let dy = p4.y - p1.y;
            let d2 = ((p2.x - p4.x) * dy - (p2.y - p4.y) * dx).abs();
            let d3 = ((p3.x - p4.x) * dy - (p3.y - p4.y) * dx).abs();

            if level >= MAX_LEVEL || (d2 + d3) * (d2 + d3) <= self.tess_tol * (dx * dx + dy * dy) {
                return Some((p4, self.stack.is_empty()));
            }

            let p12 = p1.lerp(p2, 0.5);
            let p23 = p2.lerp(p3, 0.5);
            let p34 = p3.lerp(p4, 0.5);
            let p123 = p12.lerp(p23, 0.5);
            let p234 = p23.lerp(p34, 0.5);
            let p1234 = p123.lerp(p234, 0.5);

            // Right half goes first so the left half is processed first
            self.stack.push(([p1234, p234, p34, p4], level + 1));
            self.stack.push(([p1, p12, p123, p1234], level + 1));
        }
    }
}

/// Flatten a path into polyline contours, transforming every point by `matrix`.
///
/// Segment end points carry [`PT_CORNER`]; interior curve samples carry no
/// flags. A closed contour repeats its start point at the end.
pub fn flatten_path(
    path: &Path,
    matrix: &Matrix,
    config: &RasterConfig,
) -> RasterResult<Vec<Contour>> {
    let mut contours: Vec<Contour> = Vec::new();
    let mut current = Contour::default();
    let mut start = Point::default();
    let mut last = Point::default();

    let finish = |contours: &mut Vec<Contour>, contour: &mut Contour| -> RasterResult<()> {
        if !contour.points.is_empty() {
            contours.try_reserve(1)?;
            contours.push(std::mem::take(contour));
        }
        Ok(())
    };

    for segment in path.segments() {
        match *segment {
            Segment::MoveTo(p) => {
                finish(&mut contours, &mut current)?;
                start = matrix.map_point(p);
                last = start;
                current.add_point(start, PT_CORNER, config.dist_tol)?;
            }
            Segment::LineTo(p) => {
                if current.points.is_empty() {
                    current.add_point(last, PT_CORNER, config.dist_tol)?;
                }
                last = matrix.map_point(p);
                current.add_point(last, PT_CORNER, config.dist_tol)?;
            }
            Segment::CubicTo(c1, c2, end) => {
                if current.points.is_empty() {
                    current.add_point(last, PT_CORNER, config.dist_tol)?;
                }
                let c1 = matrix.map_point(c1);
                let c2 = matrix.map_point(c2);
                let end = matrix.map_point(end);
                for (p, is_end) in flatten_cubic(last, c1, c2, end, config.tess_tol) {
                    let flags = if is_end { PT_CORNER } else { 0 };
                    current.add_point(p, flags, config.dist_tol)?;
                }
                last = end;
            }
            Segment::Close => {
                if !current.points.is_empty() {
                    current.add_point(start, PT_CORNER, config.dist_tol)?;
                    current.closed = true;
                    finish(&mut contours, &mut current)?;
                }
                last = start;
            }
        }
    }
    finish(&mut contours, &mut current)?;

    log::trace!(
        target: "raster",
        "flattened {} segments into {} contours",
        path.segments().len(),
        contours.len()
    );
    Ok(contours)
}
