//! Path store: an append-only list of move/line/cubic/close segments.
//!
//! Every producer (canvas calls, SVG path data, glyph outlines) feeds the
//! rasterizer through this type. Quadratic curves and arcs are converted to
//! cubics on the way in, so consumers only ever see four segment kinds.

use crate::config::RasterConfig;
use crate::error::{RasterError, RasterResult};
use crate::flatten::flatten_path;
use crate::geometry::{
    ArcParams, CubicBezierParams, EllipseParams, Point, QuadraticBezierParams, Rect,
    RectParams, RoundRectParams, SvgArcParams,
};
use crate::matrix::Matrix;
use std::f32::consts::{FRAC_PI_2, PI};

/// Control point distance for approximating a quarter circle with a cubic.
pub(crate) const KAPPA: f32 = 0.552_284_77;

/// A single path segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// Start a new contour at the point.
    MoveTo(Point),
    /// Straight line from the current point.
    LineTo(Point),
    /// Cubic Bezier from the current point: two control points and the end point.
    CubicTo(Point, Point, Point),
    /// Close the current contour back to its start point.
    Close,
}

/// An ordered sequence of segments plus the current and start points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<Segment>,
    start_point: Point,
    current_point: Point,
    num_contours: usize,
    num_curves: usize,
}

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse SVG path data (`d` attribute syntax) into a new path.
    ///
    /// Arcs and shorthand commands are normalized to lines and curves by
    /// the parser before they reach the path.
    pub fn from_svg_data(path_data: &str) -> RasterResult<Self> {
        let mut path = Path::new();

        for segment in svgtypes::SimplifyingPathParser::from(path_data) {
            let segment = segment
                .map_err(|e| RasterError::PathParse(format!("{path_data:?}: {e}")))?;

            match segment {
                svgtypes::SimplePathSegment::MoveTo { x, y } => {
                    path.move_to(x as f32, y as f32)?;
                }
                svgtypes::SimplePathSegment::LineTo { x, y } => {
                    path.line_to(x as f32, y as f32)?;
                }
                svgtypes::SimplePathSegment::Quadratic { x1, y1, x, y } => {
                    path.quad_to(&QuadraticBezierParams {
                        cpx: x1 as f32,
                        cpy: y1 as f32,
                        x: x as f32,
                        y: y as f32,
                    })?;
                }
                svgtypes::SimplePathSegment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    path.cubic_to(&CubicBezierParams {
                        cp1x: x1 as f32,
                        cp1y: y1 as f32,
                        cp2x: x2 as f32,
                        cp2y: y2 as f32,
                        x: x as f32,
                        y: y as f32,
                    })?;
                }
                svgtypes::SimplePathSegment::ClosePath => {
                    path.close()?;
                }
            }
        }

        Ok(path)
    }

    fn push(&mut self, segment: Segment) -> RasterResult<()> {
        self.segments.try_reserve(1)?;
        self.segments.push(segment);
        Ok(())
    }

    /// Make sure a contour is open before drawing from the current point.
    fn ensure_move(&mut self) -> RasterResult<()> {
        if self.segments.is_empty() {
            self.move_to(0.0, 0.0)?;
        }
        Ok(())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of contours started by `move_to`.
    pub fn num_contours(&self) -> usize {
        self.num_contours
    }

    /// Number of cubic segments.
    pub fn num_curves(&self) -> usize {
        self.num_curves
    }

    /// The current point, or the origin for an empty path.
    pub fn current_point(&self) -> Point {
        self.current_point
    }

    /// Start point of the current contour.
    pub fn start_point(&self) -> Point {
        self.start_point
    }

    /// Remove every segment.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.start_point = Point::default();
        self.current_point = Point::default();
        self.num_contours = 0;
        self.num_curves = 0;
    }

    /// Start a new contour.
    pub fn move_to(&mut self, x: f32, y: f32) -> RasterResult<()> {
        let p = Point::new(x, y);
        self.push(Segment::MoveTo(p))?;
        self.start_point = p;
        self.current_point = p;
        self.num_contours += 1;
        Ok(())
    }

    /// Draw a line to a point. An empty path first moves to the origin.
    pub fn line_to(&mut self, x: f32, y: f32) -> RasterResult<()> {
        self.ensure_move()?;
        let p = Point::new(x, y);
        self.push(Segment::LineTo(p))?;
        self.current_point = p;
        Ok(())
    }

    /// Draw a quadratic Bezier curve, stored as the equivalent cubic.
    pub fn quad_to(&mut self, params: &QuadraticBezierParams) -> RasterResult<()> {
        let p0 = self.current_point;
        let c = Point::new(params.cpx, params.cpy);
        let end = Point::new(params.x, params.y);
        let c1 = p0.lerp(c, 2.0 / 3.0);
        let c2 = end.lerp(c, 2.0 / 3.0);
        self.cubic_to(&CubicBezierParams {
            cp1x: c1.x,
            cp1y: c1.y,
            cp2x: c2.x,
            cp2y: c2.y,
            x: end.x,
            y: end.y,
        })
    }

    /// Draw a cubic Bezier curve. An empty path first moves to the origin.
    pub fn cubic_to(&mut self, params: &CubicBezierParams) -> RasterResult<()> {
        self.ensure_move()?;
        let end = Point::new(params.x, params.y);
        self.push(Segment::CubicTo(
            Point::new(params.cp1x, params.cp1y),
            Point::new(params.cp2x, params.cp2y),
            end,
        ))?;
        self.current_point = end;
        self.num_curves += 1;
        Ok(())
    }

    /// Draw an SVG elliptical arc from the current point.
    ///
    /// Zero radii or coincident end points degrade to a straight line, as
    /// the SVG implementation notes require.
    pub fn arc_to(&mut self, params: &SvgArcParams) -> RasterResult<()> {
        self.ensure_move()?;
        let from = self.current_point;
        let arc = kurbo::SvgArc {
            from: kurbo::Point::new(from.x as f64, from.y as f64),
            to: kurbo::Point::new(params.x as f64, params.y as f64),
            radii: kurbo::Vec2::new(params.rx.abs() as f64, params.ry.abs() as f64),
            x_rotation: (params.x_axis_rotation as f64).to_radians(),
            large_arc: params.large_arc,
            sweep: params.sweep,
        };

        let Some(arc) = kurbo::Arc::from_svg_arc(&arc) else {
            return self.line_to(params.x, params.y);
        };

        for el in arc.append_iter(0.1) {
            if let kurbo::PathEl::CurveTo(p1, p2, p3) = el {
                self.cubic_to(&CubicBezierParams {
                    cp1x: p1.x as f32,
                    cp1y: p1.y as f32,
                    cp2x: p2.x as f32,
                    cp2y: p2.y as f32,
                    x: p3.x as f32,
                    y: p3.y as f32,
                })?;
            }
        }
        // Land exactly on the requested end point
        self.current_point = Point::new(params.x, params.y);
        if let Some(Segment::CubicTo(_, _, end)) = self.segments.last_mut() {
            *end = self.current_point;
        }
        Ok(())
    }

    /// Close the current contour. No-op on an empty path.
    pub fn close(&mut self) -> RasterResult<()> {
        if self.segments.is_empty() {
            return Ok(());
        }
        self.push(Segment::Close)?;
        self.current_point = self.start_point;
        Ok(())
    }

    /// Add a closed rectangle contour.
    pub fn add_rect(&mut self, params: &RectParams) -> RasterResult<()> {
        let RectParams {
            x,
            y,
            width: w,
            height: h,
        } = *params;
        self.segments.try_reserve(6)?;
        self.move_to(x, y)?;
        self.line_to(x + w, y)?;
        self.line_to(x + w, y + h)?;
        self.line_to(x, y + h)?;
        self.line_to(x, y)?;
        self.close()
    }

    /// Add a rectangle with elliptical corners.
    pub fn add_round_rect(&mut self, params: &RoundRectParams) -> RasterResult<()> {
        let RoundRectParams {
            x,
            y,
            width: w,
            height: h,
            ..
        } = *params;
        let rx = params.rx.min(w * 0.5);
        let ry = params.ry.min(h * 0.5);
        if rx == 0.0 && ry == 0.0 {
            return self.add_rect(&RectParams {
                x,
                y,
                width: w,
                height: h,
            });
        }

        let right = x + w;
        let bottom = y + h;
        let cpx = rx * KAPPA;
        let cpy = ry * KAPPA;

        self.segments.try_reserve(10)?;
        self.move_to(x, y + ry)?;
        self.cubic_to(&cubic(x, y + ry - cpy, x + rx - cpx, y, x + rx, y))?;
        self.line_to(right - rx, y)?;
        self.cubic_to(&cubic(right - rx + cpx, y, right, y + ry - cpy, right, y + ry))?;
        self.line_to(right, bottom - ry)?;
        self.cubic_to(&cubic(
            right,
            bottom - ry + cpy,
            right - rx + cpx,
            bottom,
            right - rx,
            bottom,
        ))?;
        self.line_to(x + rx, bottom)?;
        self.cubic_to(&cubic(x + rx - cpx, bottom, x, bottom - ry + cpy, x, bottom - ry))?;
        self.line_to(x, y + ry)?;
        self.close()
    }

    /// Add a closed ellipse made of four cubic quadrants.
    pub fn add_ellipse(&mut self, params: &EllipseParams) -> RasterResult<()> {
        let EllipseParams { cx, cy, rx, ry } = *params;
        let left = cx - rx;
        let top = cy - ry;
        let right = cx + rx;
        let bottom = cy + ry;
        let cpx = rx * KAPPA;
        let cpy = ry * KAPPA;

        self.segments.try_reserve(6)?;
        self.move_to(cx, top)?;
        self.cubic_to(&cubic(cx + cpx, top, right, cy - cpy, right, cy))?;
        self.cubic_to(&cubic(right, cy + cpy, cx + cpx, bottom, cx, bottom))?;
        self.cubic_to(&cubic(cx - cpx, bottom, left, cy + cpy, left, cy))?;
        self.cubic_to(&cubic(left, cy - cpy, cx - cpx, top, cx, top))?;
        self.close()
    }

    /// Add a closed circle.
    pub fn add_circle(&mut self, cx: f32, cy: f32, r: f32) -> RasterResult<()> {
        self.add_ellipse(&EllipseParams { cx, cy, rx: r, ry: r })
    }

    /// Add a circular arc made of at most quarter-turn cubic segments.
    ///
    /// An empty path starts at the arc's first point; otherwise a line joins
    /// the current point to it.
    pub fn add_arc(&mut self, params: &ArcParams) -> RasterResult<()> {
        let ArcParams {
            cx,
            cy,
            radius: r,
            start_angle: a0,
            end_angle: a1,
            anticlockwise: ccw,
        } = *params;

        let mut da = a1 - a0;
        if da.abs() > 2.0 * PI {
            da = 2.0 * PI;
        } else if da != 0.0 && ccw != (da < 0.0) {
            da += if ccw { -2.0 * PI } else { 2.0 * PI };
        }

        let seg_n = (da.abs() / FRAC_PI_2).ceil() as usize;
        if seg_n == 0 {
            return Ok(());
        }

        let mut a = a0;
        let mut ax = cx + a.cos() * r;
        let mut ay = cy + a.sin() * r;

        let seg_a = da / seg_n as f32;
        let d = (seg_a / FRAC_PI_2) * KAPPA * r;
        let mut dx = -a.sin() * d;
        let mut dy = a.cos() * d;

        self.segments.try_reserve(1 + seg_n)?;
        if self.segments.is_empty() {
            self.move_to(ax, ay)?;
        } else {
            self.line_to(ax, ay)?;
        }

        for _ in 0..seg_n {
            let cp1x = ax + dx;
            let cp1y = ay + dy;

            a += seg_a;
            ax = cx + a.cos() * r;
            ay = cy + a.sin() * r;
            dx = -a.sin() * d;
            dy = a.cos() * d;

            self.cubic_to(&cubic(cp1x, cp1y, ax - dx, ay - dy, ax, ay))?;
        }
        Ok(())
    }

    /// Append another path, optionally transforming its points.
    pub fn add_path(&mut self, source: &Path, matrix: Option<&Matrix>) -> RasterResult<()> {
        self.segments.try_reserve(source.segments.len())?;
        let map = |p: Point| matrix.map_or(p, |m| m.map_point(p));
        for segment in &source.segments {
            match *segment {
                Segment::MoveTo(p) => {
                    let p = map(p);
                    self.move_to(p.x, p.y)?;
                }
                Segment::LineTo(p) => {
                    let p = map(p);
                    self.line_to(p.x, p.y)?;
                }
                Segment::CubicTo(c1, c2, end) => {
                    let (c1, c2, end) = (map(c1), map(c2), map(end));
                    self.cubic_to(&cubic(c1.x, c1.y, c2.x, c2.y, end.x, end.y))?;
                }
                Segment::Close => self.close()?,
            }
        }
        Ok(())
    }

    /// Transform every point of the path in place.
    pub fn transform(&mut self, matrix: &Matrix) {
        for segment in &mut self.segments {
            match segment {
                Segment::MoveTo(p) | Segment::LineTo(p) => *p = matrix.map_point(*p),
                Segment::CubicTo(c1, c2, end) => {
                    *c1 = matrix.map_point(*c1);
                    *c2 = matrix.map_point(*c2);
                    *end = matrix.map_point(*end);
                }
                Segment::Close => {}
            }
        }
        self.start_point = matrix.map_point(self.start_point);
        self.current_point = matrix.map_point(self.current_point);
    }

    /// Bounding box of the path.
    ///
    /// With `tight` the box covers the flattened outline; otherwise it covers
    /// every control point. Returns `None` for an empty path.
    pub fn extents(&self, tight: bool) -> Option<Rect> {
        if tight {
            let contours = flatten_path(self, &Matrix::identity(), &RasterConfig::default()).ok()?;
            Rect::from_points(contours.iter().flat_map(|c| c.points.iter().map(|p| p.pos)))
        } else {
            Rect::from_points(self.segments.iter().flat_map(|s| match *s {
                Segment::MoveTo(p) | Segment::LineTo(p) => vec![p],
                Segment::CubicTo(c1, c2, end) => vec![c1, c2, end],
                Segment::Close => Vec::new(),
            }))
        }
    }

    /// Total length of the flattened outline, including closing segments.
    pub fn length(&self) -> f32 {
        flatten_path(self, &Matrix::identity(), &RasterConfig::default())
            .map(|contours| contours.iter().map(|c| c.length()).sum())
            .unwrap_or(0.0)
    }
}

fn cubic(cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32) -> CubicBezierParams {
    CubicBezierParams {
        cp1x,
        cp1y,
        cp2x,
        cp2y,
        x,
        y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_to_on_empty_path_inserts_move() {
        let mut path = Path::new();
        path.line_to(10.0, 5.0).unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::MoveTo(Point::new(0.0, 0.0)),
                Segment::LineTo(Point::new(10.0, 5.0))
            ]
        );
        assert_eq!(path.num_contours(), 1);
    }

    #[test]
    fn test_close_empty_is_noop() {
        let mut path = Path::new();
        path.close().unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_close_resets_current_point() {
        let mut path = Path::new();
        path.move_to(1.0, 2.0).unwrap();
        path.line_to(5.0, 2.0).unwrap();
        path.close().unwrap();
        assert_eq!(path.current_point(), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_quad_to_becomes_cubic() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).unwrap();
        path.quad_to(&QuadraticBezierParams {
            cpx: 3.0,
            cpy: 3.0,
            x: 6.0,
            y: 0.0,
        })
        .unwrap();
        match path.segments()[1] {
            Segment::CubicTo(c1, c2, end) => {
                assert!((c1.x - 2.0).abs() < 1e-5 && (c1.y - 2.0).abs() < 1e-5);
                assert!((c2.x - 4.0).abs() < 1e-5 && (c2.y - 2.0).abs() < 1e-5);
                assert_eq!(end, Point::new(6.0, 0.0));
            }
            other => panic!("expected cubic, got {other:?}"),
        }
    }

    #[test]
    fn test_add_rect_segments() {
        let mut path = Path::new();
        path.add_rect(&RectParams {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
        })
        .unwrap();
        assert_eq!(path.segments().len(), 6);
        assert_eq!(path.segments()[5], Segment::Close);
        assert_eq!(path.extents(false), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn test_round_rect_zero_radius_is_rect() {
        let mut a = Path::new();
        a.add_round_rect(&RoundRectParams {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            rx: 0.0,
            ry: 0.0,
        })
        .unwrap();
        let mut b = Path::new();
        b.add_rect(&RectParams {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        })
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_circle_length_and_extents() {
        let mut path = Path::new();
        path.add_circle(50.0, 50.0, 20.0).unwrap();
        let expected = 2.0 * PI * 20.0;
        assert!((path.length() - expected).abs() < 0.5, "{}", path.length());

        let ext = path.extents(true).unwrap();
        assert!((ext.x - 30.0).abs() < 0.1);
        assert!((ext.w - 40.0).abs() < 0.1);
    }

    #[test]
    fn test_add_arc_quarter_segments() {
        let mut path = Path::new();
        path.add_arc(&ArcParams {
            cx: 0.0,
            cy: 0.0,
            radius: 10.0,
            start_angle: 0.0,
            end_angle: PI,
            anticlockwise: false,
        })
        .unwrap();
        // move + two quarter cubics
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.num_curves(), 2);
        let end = path.current_point();
        assert!((end.x + 10.0).abs() < 1e-4 && end.y.abs() < 1e-4);
    }

    #[test]
    fn test_add_arc_joins_existing_contour_with_line() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).unwrap();
        path.add_arc(&ArcParams {
            cx: 20.0,
            cy: 0.0,
            radius: 5.0,
            start_angle: 0.0,
            end_angle: FRAC_PI_2,
            anticlockwise: false,
        })
        .unwrap();
        assert!(matches!(path.segments()[1], Segment::LineTo(p) if p == Point::new(25.0, 0.0)));
    }

    #[test]
    fn test_arc_to_zero_radius_is_line() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).unwrap();
        path.arc_to(&SvgArcParams {
            rx: 0.0,
            ry: 0.0,
            x_axis_rotation: 0.0,
            large_arc: false,
            sweep: true,
            x: 10.0,
            y: 0.0,
        })
        .unwrap();
        assert_eq!(path.segments()[1], Segment::LineTo(Point::new(10.0, 0.0)));
    }

    #[test]
    fn test_arc_to_half_circle() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).unwrap();
        path.arc_to(&SvgArcParams {
            rx: 5.0,
            ry: 5.0,
            x_axis_rotation: 0.0,
            large_arc: false,
            sweep: true,
            x: 10.0,
            y: 0.0,
        })
        .unwrap();
        assert!(path.num_curves() >= 2);
        assert_eq!(path.current_point(), Point::new(10.0, 0.0));
        // Half circle of radius 5
        assert!((path.length() - 5.0 * PI).abs() < 0.3, "{}", path.length());
    }

    #[test]
    fn test_add_path_with_matrix() {
        let mut src = Path::new();
        src.move_to(1.0, 1.0).unwrap();
        src.line_to(2.0, 1.0).unwrap();
        src.close().unwrap();

        let mut dst = Path::new();
        dst.add_path(&src, Some(&Matrix::translation(10.0, 0.0))).unwrap();
        assert_eq!(dst.segments()[0], Segment::MoveTo(Point::new(11.0, 1.0)));
        assert_eq!(dst.segments()[2], Segment::Close);
    }

    #[test]
    fn test_from_svg_data() {
        let path = Path::from_svg_data("M10 10 L20 10 Q25 15 20 20 Z").unwrap();
        assert_eq!(path.num_contours(), 1);
        assert_eq!(path.num_curves(), 1);
        assert!(matches!(path.segments().last(), Some(Segment::Close)));

        assert!(matches!(
            Path::from_svg_data("M10 10 L20"),
            Err(RasterError::PathParse(_))
        ));
    }
}
