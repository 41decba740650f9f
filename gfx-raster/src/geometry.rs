//! Points, rectangles and parameter structs for path building.
//!
//! The parameter structs replace long positional argument lists with named
//! fields, grouping semantically related values together.

use std::ops::{Add, Mul, Sub};

/// A point (or vector) in user or device space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// True when the two points are closer than `tol`.
    pub fn approx_eq(self, other: Point, tol: f32) -> bool {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy < tol * tol
    }

    /// Linear interpolation between `self` and `other`.
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// A floating point rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Smallest rectangle containing all `points`, or `None` if there are none.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Rect> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in iter {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Grow the rectangle by `delta` on every side.
    pub fn inflate(self, delta: f32) -> Rect {
        Rect::new(
            self.x - delta,
            self.y - delta,
            self.w + delta * 2.0,
            self.h + delta * 2.0,
        )
    }
}

/// An integer rectangle in device pixels. `w` and `h` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl IntRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Intersection of two rectangles; empty rectangles collapse to zero size.
    pub fn intersect(&self, other: &IntRect) -> IntRect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        IntRect::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0))
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Parameters for an axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectParams {
    /// X coordinate of the top-left corner.
    pub x: f32,
    /// Y coordinate of the top-left corner.
    pub y: f32,
    /// Rectangle width.
    pub width: f32,
    /// Rectangle height.
    pub height: f32,
}

/// Parameters for a rectangle with elliptical corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundRectParams {
    /// X coordinate of the top-left corner.
    pub x: f32,
    /// Y coordinate of the top-left corner.
    pub y: f32,
    /// Rectangle width.
    pub width: f32,
    /// Rectangle height.
    pub height: f32,
    /// Horizontal corner radius (clamped to half the width).
    pub rx: f32,
    /// Vertical corner radius (clamped to half the height).
    pub ry: f32,
}

/// Parameters for a full ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseParams {
    /// X coordinate of the ellipse center.
    pub cx: f32,
    /// Y coordinate of the ellipse center.
    pub cy: f32,
    /// X-axis radius.
    pub rx: f32,
    /// Y-axis radius.
    pub ry: f32,
}

/// Parameters for a circular arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcParams {
    /// X coordinate of the arc center.
    pub cx: f32,
    /// Y coordinate of the arc center.
    pub cy: f32,
    /// Radius of the arc.
    pub radius: f32,
    /// Starting angle in radians.
    pub start_angle: f32,
    /// Ending angle in radians.
    pub end_angle: f32,
    /// If true, sweep counterclockwise.
    pub anticlockwise: bool,
}

/// Parameters for an SVG elliptical arc from the current point to `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgArcParams {
    /// X-axis radius.
    pub rx: f32,
    /// Y-axis radius.
    pub ry: f32,
    /// Rotation of the ellipse x-axis, in degrees.
    pub x_axis_rotation: f32,
    /// Choose the larger of the two candidate arcs.
    pub large_arc: bool,
    /// Sweep in the positive-angle direction.
    pub sweep: bool,
    /// End point X.
    pub x: f32,
    /// End point Y.
    pub y: f32,
}

/// Parameters for a cubic Bezier curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezierParams {
    /// First control point X.
    pub cp1x: f32,
    /// First control point Y.
    pub cp1y: f32,
    /// Second control point X.
    pub cp2x: f32,
    /// Second control point Y.
    pub cp2y: f32,
    /// End point X.
    pub x: f32,
    /// End point Y.
    pub y: f32,
}

/// Parameters for a quadratic Bezier curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticBezierParams {
    /// Control point X.
    pub cpx: f32,
    /// Control point Y.
    pub cpy: f32,
    /// End point X.
    pub x: f32,
    /// End point Y.
    pub y: f32,
}

/// Parameters for a linear gradient axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearGradientParams {
    /// Start point X (offset 0).
    pub x1: f32,
    /// Start point Y (offset 0).
    pub y1: f32,
    /// End point X (offset 1).
    pub x2: f32,
    /// End point Y (offset 1).
    pub y2: f32,
}

/// Parameters for a two-circle radial gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGradientParams {
    /// Outer circle center X (offset 1).
    pub cx: f32,
    /// Outer circle center Y (offset 1).
    pub cy: f32,
    /// Outer circle radius.
    pub cr: f32,
    /// Focal circle center X (offset 0).
    pub fx: f32,
    /// Focal circle center Y (offset 0).
    pub fy: f32,
    /// Focal circle radius.
    pub fr: f32,
}
