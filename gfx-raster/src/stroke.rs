//! Stroke outline generation.
//!
//! A flattened contour is expanded into closed polygons that the edge builder
//! fills with the nonzero rule. The right side of the stroke is walked
//! forward and the left side backward, so an open contour becomes one ring
//! (right side, end cap, reversed left side, start cap) and a closed contour
//! becomes two rings of opposite orientation.

use crate::error::RasterResult;
use crate::flatten::{Contour, PathPoint, PT_BEVEL, PT_CORNER, PT_LEFT};
use crate::geometry::Point;
use std::f32::consts::PI;

/// Line cap style for open contour ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Flat edge at the endpoint.
    #[default]
    Butt,
    /// Rounded edge extending past the endpoint.
    Round,
    /// Square edge extending past the endpoint.
    Square,
}

/// Line join style for stroke corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    /// Sharp corner, beveled beyond the miter limit.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Beveled corner.
    Bevel,
}

/// Stroke parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    /// Alternating on/off lengths. Empty means a solid stroke.
    pub dash_array: Vec<f32>,
    pub dash_offset: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::default(),
            join: LineJoin::default(),
            miter_limit: 10.0,
            dash_array: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

impl StrokeStyle {
    /// True when the dash array describes a visible pattern.
    pub fn is_dashed(&self) -> bool {
        dash_total(&self.dash_array) > 1e-6
    }
}

/// Pattern length, doubled for odd-length arrays so on/off alternate evenly.
fn dash_total(dashes: &[f32]) -> f32 {
    let total: f32 = dashes.iter().sum();
    if dashes.len() % 2 == 1 {
        total * 2.0
    } else {
        total
    }
}

fn normalize(v: Point) -> (Point, f32) {
    let d = (v.x * v.x + v.y * v.y).sqrt();
    if d > 1e-6 {
        (Point::new(v.x / d, v.y / d), d)
    } else {
        (v, d)
    }
}

/// Number of segments needed to approximate an arc of radius `r` spanning
/// `arc` radians within `tol`.
pub(crate) fn curve_divs(r: f32, arc: f32, tol: f32) -> usize {
    let da = (r / (r + tol)).acos() * 2.0;
    let divs = (arc / da).ceil();
    if divs.is_finite() && divs > 2.0 {
        divs as usize
    } else {
        2
    }
}

/// Compute segment directions, miter vectors and join flags for a contour.
pub(crate) fn prepare_stroke(points: &mut [PathPoint], miter_limit: f32, join: LineJoin) {
    let n = points.len();
    if n == 0 {
        return;
    }

    for i in 0..n {
        let next = points[(i + 1) % n].pos;
        let (dir, len) = normalize(next - points[i].pos);
        points[i].dir = dir;
        points[i].len = len;
    }

    for j in 0..n {
        let p0 = points[(j + n - 1) % n];
        let p1 = &mut points[j];

        let dl0 = Point::new(p0.dir.y, -p0.dir.x);
        let dl1 = Point::new(p1.dir.y, -p1.dir.x);
        let mut dm = (dl0 + dl1) * 0.5;
        let dmr2 = dm.x * dm.x + dm.y * dm.y;
        if dmr2 > 0.000_001 {
            let s2 = (1.0 / dmr2).min(600.0);
            dm = dm * s2;
        }
        p1.dm = dm;

        // Clear flags, but keep the corner
        p1.flags &= PT_CORNER;

        let cross = p1.dir.x * p0.dir.y - p0.dir.x * p1.dir.y;
        if cross > 0.0 {
            p1.flags |= PT_LEFT;
        }

        if p1.flags & PT_CORNER != 0
            && (dmr2 * miter_limit * miter_limit < 1.0
                || join == LineJoin::Bevel
                || join == LineJoin::Round)
        {
            p1.flags |= PT_BEVEL;
        }
    }
}

/// Left/right offset chains collected while walking a contour.
#[derive(Default)]
struct Sides {
    left: Vec<Point>,
    right: Vec<Point>,
}

impl Sides {
    fn push(&mut self, l: Point, r: Point) -> RasterResult<()> {
        self.left.try_reserve(1)?;
        self.right.try_reserve(1)?;
        self.left.push(l);
        self.right.push(r);
        Ok(())
    }

    fn push_left(&mut self, l: Point) -> RasterResult<()> {
        self.left.try_reserve(1)?;
        self.left.push(l);
        Ok(())
    }

    fn push_right(&mut self, r: Point) -> RasterResult<()> {
        self.right.try_reserve(1)?;
        self.right.push(r);
        Ok(())
    }
}

/// Expands flattened contours into fillable outline polygons.
#[derive(Debug, Clone)]
pub struct Stroker<'a> {
    style: &'a StrokeStyle,
    /// Maximum deviation of round caps and joins from a true arc.
    arc_tol: f32,
    /// Distance below which flattened points are merged.
    dist_tol: f32,
}

impl<'a> Stroker<'a> {
    pub fn new(style: &'a StrokeStyle, arc_tol: f32, dist_tol: f32) -> Self {
        Self {
            style,
            arc_tol,
            dist_tol,
        }
    }

    /// Stroke every contour, appending outline polygons to `out`.
    pub fn stroke(&self, contours: &[Contour], out: &mut Vec<Vec<Point>>) -> RasterResult<()> {
        for contour in contours {
            self.stroke_contour(contour, out)?;
        }
        Ok(())
    }

    fn stroke_contour(&self, contour: &Contour, out: &mut Vec<Vec<Point>>) -> RasterResult<()> {
        if contour.points.len() < 2 {
            return Ok(());
        }

        let mut points = contour.points.clone();
        let mut closed = contour.closed;

        // A contour that ends where it starts is treated as closed
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if first.pos.approx_eq(last.pos, self.dist_tol) {
                points.pop();
                closed = true;
            }
        }
        if points.len() < 2 {
            return Ok(());
        }

        let style = self.style;
        if style.is_dashed() {
            for mut run in dash_contour(
                &points,
                closed,
                &style.dash_array,
                style.dash_offset,
                self.dist_tol,
            )? {
                prepare_stroke(&mut run, style.miter_limit, style.join);
                self.expand(&run, false, out)?;
            }
        } else {
            prepare_stroke(&mut points, style.miter_limit, style.join);
            self.expand(&points, closed, out)?;
        }
        Ok(())
    }

    fn expand(
        &self,
        points: &[PathPoint],
        closed: bool,
        out: &mut Vec<Vec<Point>>,
    ) -> RasterResult<()> {
        let n = points.len();
        let style = self.style;
        let w = style.width * 0.5;
        let ncap = curve_divs(w, PI, self.arc_tol);

        let mut sides = Sides::default();
        let mut start_cap = Vec::new();

        let (mut i0, mut i1, s, e) = if closed {
            (n - 1, 0, 0, n)
        } else {
            (0, 1, 1, n - 1)
        };

        if closed {
            let (l, r) = init_closed(&points[i0], &points[i1], w);
            sides.push(l, r)?;
        } else {
            let (dir, _) = normalize(points[i1].pos - points[i0].pos);
            let fan = self.cap(points[i0].pos, dir, w, ncap);
            sides.push(fan[0], fan[fan.len() - 1])?;
            start_cap.extend_from_slice(&fan[1..fan.len() - 1]);
        }

        for _ in s..e {
            let (p0, p1) = (&points[i0], &points[i1]);
            if p1.flags & PT_CORNER != 0 {
                if style.join == LineJoin::Round {
                    round_join(&mut sides, p0, p1, w, ncap)?;
                } else if style.join == LineJoin::Bevel || p1.flags & PT_BEVEL != 0 {
                    bevel_join(&mut sides, p0, p1, w)?;
                } else {
                    miter_join(&mut sides, p0, p1, w)?;
                }
            } else {
                let l = p1.pos - p1.dm * w;
                let r = p1.pos + p1.dm * w;
                sides.push(l, r)?;
            }
            i0 = i1;
            i1 += 1;
        }

        let Sides { mut left, mut right } = sides;
        out.try_reserve(2)?;
        if closed {
            left.reverse();
            out.push(right);
            out.push(left);
        } else {
            let (dir, _) = normalize(points[i1].pos - points[i0].pos);
            // Walking backwards swaps the sides: the fan runs from right to left
            let fan = self.cap(points[i1].pos, dir * -1.0, w, ncap);
            right.try_reserve(fan.len() + left.len() + start_cap.len())?;
            right.extend_from_slice(&fan[..fan.len() - 1]);
            left.push(fan[fan.len() - 1]);
            right.extend(left.iter().rev());
            right.extend(start_cap);
            out.push(right);
        }
        Ok(())
    }

    /// Cap points at `p` for a contour leaving in direction `dir`, running
    /// from the left side to the right side. Always at least two points.
    fn cap(&self, p: Point, dir: Point, w: f32, ncap: usize) -> Vec<Point> {
        let dl = Point::new(dir.y, -dir.x);
        match self.style.cap {
            LineCap::Butt => vec![p - dl * w, p + dl * w],
            LineCap::Square => {
                let p = p - dir * w;
                vec![p - dl * w, p + dl * w]
            }
            LineCap::Round => (0..ncap)
                .map(|i| {
                    let a = i as f32 / (ncap - 1) as f32 * PI;
                    let (sin, cos) = a.sin_cos();
                    p - dl * (cos * w) - dir * (sin * w)
                })
                .collect(),
        }
    }
}

fn init_closed(p0: &PathPoint, p1: &PathPoint, w: f32) -> (Point, Point) {
    let (dir, len) = normalize(p1.pos - p0.pos);
    let p = p0.pos + dir * (len * 0.5);
    let dl = Point::new(dir.y, -dir.x);
    (p - dl * w, p + dl * w)
}

fn bevel_join(sides: &mut Sides, p0: &PathPoint, p1: &PathPoint, w: f32) -> RasterResult<()> {
    let dl0 = Point::new(p0.dir.y, -p0.dir.x);
    let dl1 = Point::new(p1.dir.y, -p1.dir.x);
    sides.push(p1.pos - dl0 * w, p1.pos + dl0 * w)?;
    sides.push(p1.pos - dl1 * w, p1.pos + dl1 * w)
}

fn miter_join(sides: &mut Sides, p0: &PathPoint, p1: &PathPoint, w: f32) -> RasterResult<()> {
    let dl0 = Point::new(p0.dir.y, -p0.dir.x);
    let dl1 = Point::new(p1.dir.y, -p1.dir.x);

    if p1.flags & PT_LEFT != 0 {
        sides.push_left(p1.pos - p1.dm * w)?;
        sides.push_right(p1.pos + dl0 * w)?;
        sides.push_right(p1.pos + dl1 * w)
    } else {
        sides.push_left(p1.pos - dl0 * w)?;
        sides.push_left(p1.pos - dl1 * w)?;
        sides.push_right(p1.pos + p1.dm * w)
    }
}

fn round_join(
    sides: &mut Sides,
    p0: &PathPoint,
    p1: &PathPoint,
    w: f32,
    ncap: usize,
) -> RasterResult<()> {
    let a0 = (-p0.dir.x).atan2(p0.dir.y);
    let a1 = (-p1.dir.x).atan2(p1.dir.y);
    let mut da = a1 - a0;
    if da < PI {
        da += PI * 2.0;
    }
    if da > PI {
        da -= PI * 2.0;
    }

    let n = ((da.abs() / PI) * ncap as f32).ceil() as usize;
    let n = n.clamp(2, ncap.max(2));

    for i in 0..n {
        let u = i as f32 / (n - 1) as f32;
        let a = a0 + u * da;
        let (sin, cos) = a.sin_cos();
        let offset = Point::new(cos * w, sin * w);
        sides.push(p1.pos - offset, p1.pos + offset)?;
    }
    Ok(())
}

/// Split a contour into the "on" runs of a dash pattern.
///
/// Each returned run is an open polyline of at least two points. Odd-length
/// patterns are traversed twice per period; a pattern whose total length is
/// about zero yields the contour unchanged as a single run.
pub fn dash_contour(
    points: &[PathPoint],
    closed: bool,
    dashes: &[f32],
    dash_offset: f32,
    dist_tol: f32,
) -> RasterResult<Vec<Vec<PathPoint>>> {
    let mut runs = Vec::new();
    let total = dash_total(dashes);
    if points.len() < 2 || total <= 1e-6 {
        if points.len() >= 2 {
            let mut run = points.to_vec();
            if closed {
                run.push(points[0]);
            }
            runs.push(run);
        }
        return Ok(runs);
    }

    let mut source = points.to_vec();
    if closed {
        source.push(points[0]);
    }

    // Find the location inside the pattern
    let mut offset = dash_offset % total;
    if offset < 0.0 {
        offset += total;
    }
    let mut idash = 0;
    let mut dash_on = true;
    while offset > dashes[idash] {
        offset -= dashes[idash];
        idash = (idash + 1) % dashes.len();
        dash_on = !dash_on;
    }
    let mut dash_len = dashes[idash] - offset;

    let mut cur = source[0];
    let mut run = Contour::default();
    run.points.push(cur);
    let mut total_dist = 0.0;

    let mut j = 1;
    while j < source.len() {
        let delta = source[j].pos - cur.pos;
        let dist = (delta.x * delta.x + delta.y * delta.y).sqrt();

        if total_dist + dist > dash_len {
            let d = (dash_len - total_dist) / dist;
            let split = cur.pos + delta * d;
            run.add_point(split, PT_CORNER, dist_tol)?;

            if run.points.len() > 1 && dash_on {
                runs.try_reserve(1)?;
                runs.push(std::mem::take(&mut run.points));
            }

            dash_on = !dash_on;
            idash = (idash + 1) % dashes.len();
            dash_len = dashes[idash];

            cur = PathPoint::new(split, PT_CORNER);
            total_dist = 0.0;
            run.points.clear();
            run.points.push(cur);
        } else {
            total_dist += dist;
            cur = source[j];
            run.points.try_reserve(1)?;
            run.points.push(cur);
            j += 1;
        }
    }

    if run.points.len() > 1 && dash_on {
        runs.try_reserve(1)?;
        runs.push(run.points);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn open_polyline(pts: &[(f32, f32)]) -> Vec<PathPoint> {
        pts.iter()
            .map(|&(x, y)| PathPoint::new(Point::new(x, y), PT_CORNER))
            .collect()
    }

    /// Signed area of a polygon via the shoelace formula.
    fn signed_area(poly: &[Point]) -> f32 {
        let n = poly.len();
        (0..n)
            .map(|i| {
                let a = poly[i];
                let b = poly[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum::<f32>()
            * 0.5
    }

    #[test]
    fn test_curve_divs_minimum() {
        assert_eq!(curve_divs(0.5, PI, 0.25), 2);
        assert_eq!(curve_divs(0.01, 0.01, 0.25), 2);
        assert!(curve_divs(50.0, PI, 0.25) > 10);
    }

    #[test]
    fn test_dash_on_off_runs() {
        let points = open_polyline(&[(0.0, 0.0), (16.0, 0.0)]);
        let runs = dash_contour(&points, false, &[4.0, 4.0], 0.0, 0.01).unwrap();
        assert_eq!(runs.len(), 2);

        let spans: Vec<(f32, f32)> = runs
            .iter()
            .map(|r| (r[0].pos.x, r[r.len() - 1].pos.x))
            .collect();
        assert_eq!(spans, vec![(0.0, 4.0), (8.0, 12.0)]);
        // Gaps between runs are 4 units each: [4, 8) and [12, 16)
        assert_eq!(spans[1].0 - spans[0].1, 4.0);
        assert_eq!(16.0 - spans[1].1, 4.0);
    }

    #[test]
    fn test_dash_offset_shifts_pattern() {
        let points = open_polyline(&[(0.0, 0.0), (16.0, 0.0)]);
        let runs = dash_contour(&points, false, &[4.0, 4.0], 2.0, 0.01).unwrap();
        let spans: Vec<(f32, f32)> = runs
            .iter()
            .map(|r| (r[0].pos.x, r[r.len() - 1].pos.x))
            .collect();
        assert_eq!(spans, vec![(0.0, 2.0), (6.0, 10.0), (14.0, 16.0)]);
    }

    #[rstest]
    #[case(&[4.0, 4.0], 6.0, 16.0, vec![(2.0, 6.0), (10.0, 14.0)])]
    #[case(&[4.0, 4.0], 10.0, 16.0, vec![(0.0, 2.0), (6.0, 10.0), (14.0, 16.0)])]
    #[case(&[3.0], 4.0, 12.0, vec![(2.0, 5.0), (8.0, 11.0)])]
    #[case(&[3.0], -2.0, 12.0, vec![(2.0, 5.0), (8.0, 11.0)])]
    fn test_dash_offset_past_first_entry_keeps_phase(
        #[case] dashes: &[f32],
        #[case] offset: f32,
        #[case] length: f32,
        #[case] expected: Vec<(f32, f32)>,
    ) {
        let points = open_polyline(&[(0.0, 0.0), (length, 0.0)]);
        let runs = dash_contour(&points, false, dashes, offset, 0.01).unwrap();
        let spans: Vec<(f32, f32)> = runs
            .iter()
            .map(|r| (r[0].pos.x, r[r.len() - 1].pos.x))
            .collect();
        assert_eq!(spans.len(), expected.len(), "{spans:?}");
        for (got, want) in spans.iter().zip(&expected) {
            assert!(
                (got.0 - want.0).abs() < 1e-4 && (got.1 - want.1).abs() < 1e-4,
                "{spans:?} vs {expected:?}"
            );
        }
    }

    #[test]
    fn test_dash_odd_array_is_doubled() {
        let points = open_polyline(&[(0.0, 0.0), (12.0, 0.0)]);
        // [3] behaves like [3, 3]
        let runs = dash_contour(&points, false, &[3.0], 0.0, 0.01).unwrap();
        let spans: Vec<(f32, f32)> = runs
            .iter()
            .map(|r| (r[0].pos.x, r[r.len() - 1].pos.x))
            .collect();
        assert_eq!(spans, vec![(0.0, 3.0), (6.0, 9.0)]);
    }

    #[test]
    fn test_zero_total_dash_disables_dashing() {
        let style = StrokeStyle {
            dash_array: vec![0.0, 0.0],
            ..Default::default()
        };
        assert!(!style.is_dashed());
        let points = open_polyline(&[(0.0, 0.0), (16.0, 0.0)]);
        let runs = dash_contour(&points, false, &[0.0, 0.0], 0.0, 0.01).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 2);
    }

    #[test]
    fn test_butt_line_is_rectangle() {
        let style = StrokeStyle {
            width: 4.0,
            ..Default::default()
        };
        let contour = Contour {
            points: open_polyline(&[(0.0, 0.0), (10.0, 0.0)]),
            closed: false,
        };
        let mut out = Vec::new();
        Stroker::new(&style, 0.25, 0.01)
            .stroke(&[contour], &mut out)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!((signed_area(&out[0]).abs() - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_square_cap_extends_line() {
        let style = StrokeStyle {
            width: 4.0,
            cap: LineCap::Square,
            ..Default::default()
        };
        let contour = Contour {
            points: open_polyline(&[(0.0, 0.0), (10.0, 0.0)]),
            closed: false,
        };
        let mut out = Vec::new();
        Stroker::new(&style, 0.25, 0.01)
            .stroke(&[contour], &mut out)
            .unwrap();
        // 10 + 2 * 2 long, 4 wide
        assert!((signed_area(&out[0]).abs() - 56.0).abs() < 1e-3);
    }

    #[test]
    fn test_round_cap_area() {
        let style = StrokeStyle {
            width: 10.0,
            cap: LineCap::Round,
            ..Default::default()
        };
        let contour = Contour {
            points: open_polyline(&[(0.0, 0.0), (20.0, 0.0)]),
            closed: false,
        };
        let mut out = Vec::new();
        Stroker::new(&style, 0.25, 0.01)
            .stroke(&[contour], &mut out)
            .unwrap();
        // Body plus two inscribed half circles of radius 5
        let full = 200.0 + PI * 25.0;
        let area = signed_area(&out[0]).abs();
        assert!(area > 270.0 && area <= full, "area={area}");
    }

    #[test]
    fn test_closed_rect_gives_two_rings() {
        let style = StrokeStyle {
            width: 2.0,
            ..Default::default()
        };
        let contour = Contour {
            points: open_polyline(&[
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 6.0),
                (0.0, 6.0),
                (0.0, 0.0),
            ]),
            closed: true,
        };
        let mut out = Vec::new();
        Stroker::new(&style, 0.25, 0.01)
            .stroke(&[contour], &mut out)
            .unwrap();
        assert_eq!(out.len(), 2);
        // Outer ring bounds the miter corners; the inner ring runs the other way
        let outer = signed_area(&out[0]);
        let inner = signed_area(&out[1]);
        assert!(outer * inner < 0.0);
        assert!((outer.abs() - 96.0).abs() < 1e-3, "outer={outer}");
        assert!(inner.abs() < 40.0, "inner={inner}");
    }

    #[test]
    fn test_miter_limit_bevels_sharp_corner() {
        let mut points = open_polyline(&[(0.0, 0.0), (10.0, 0.0), (0.0, 1.0)]);
        prepare_stroke(&mut points, 4.0, LineJoin::Miter);
        assert_ne!(points[1].flags & PT_BEVEL, 0);

        let mut points = open_polyline(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        prepare_stroke(&mut points, 4.0, LineJoin::Miter);
        assert_eq!(points[1].flags & PT_BEVEL, 0);
    }

    #[test]
    fn test_single_point_contour_is_skipped() {
        let style = StrokeStyle::default();
        let contour = Contour {
            points: open_polyline(&[(3.0, 3.0)]),
            closed: false,
        };
        let mut out = Vec::new();
        Stroker::new(&style, 0.25, 0.01)
            .stroke(&[contour], &mut out)
            .unwrap();
        assert!(out.is_empty());
    }
}
