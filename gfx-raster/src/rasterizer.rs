//! Anti-aliased scanline rasterizer.
//!
//! Edges are swept top to bottom with [`SUBSAMPLES`] samples per pixel row.
//! Horizontal coverage is exact (fixed point with 10 fractional bits), so a
//! row's coverage is the sum of the per-sample run coverages. Each finished
//! row is appended to a [`SpanBuffer`] as runs of constant coverage.

use crate::config::RasterConfig;
use crate::edge::{EdgeList, SUBSAMPLES};
use crate::error::RasterResult;
use crate::flatten::flatten_path;
use crate::geometry::{IntRect, Point};
use crate::matrix::Matrix;
use crate::path::Path;
use crate::span::SpanBuffer;
use crate::stroke::{StrokeStyle, Stroker};

const FIXSHIFT: i32 = 10;
const FIX: i32 = 1 << FIXSHIFT;
const FIXMASK: i32 = FIX - 1;

/// Coverage added by one fully covered sample.
const MAX_WEIGHT: i32 = 255 / SUBSAMPLES;

/// Rule deciding which regions of a self-overlapping shape are inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// Inside where the winding number is not zero.
    #[default]
    NonZero,
    /// Inside where the winding number is odd.
    EvenOdd,
}

/// An edge crossing the current sample line.
#[derive(Debug, Clone, Copy, Default)]
struct ActiveEdge {
    /// Current x, relative to the clip origin, in fixed point.
    x: i32,
    /// Edge start, relative to the clip origin.
    x0: f32,
    y0: f32,
    dxdy: f32,
    /// Sample y at which the edge ends.
    ey: f32,
    dir: i32,
}

impl ActiveEdge {
    /// Fixed-point x on sample line `scany`, evaluated from the edge start so
    /// tall edges do not accumulate stepping error.
    fn x_at(&self, scany: f32) -> i32 {
        (FIX as f32 * (self.x0 + self.dxdy * (scany - self.y0))).floor() as i32
    }
}

/// Reusable rasterizer state.
///
/// The edge list, active-edge slab and coverage row are kept between calls
/// and only grow.
#[derive(Debug, Default)]
pub struct Rasterizer {
    edges: EdgeList,
    pool: Vec<ActiveEdge>,
    free: Vec<usize>,
    /// Indices into `pool`, ordered by `x`.
    active: Vec<usize>,
    scanline: Vec<u8>,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rasterize the interior of `path` transformed by `matrix`.
    ///
    /// `out` is cleared first and receives spans inside `clip` only.
    pub fn fill_path(
        &mut self,
        path: &Path,
        matrix: &Matrix,
        fill_rule: FillRule,
        clip: &IntRect,
        config: &RasterConfig,
        out: &mut SpanBuffer,
    ) -> RasterResult<()> {
        out.clear();
        self.edges.clear();

        let contours = flatten_path(path, matrix, config)?;
        self.edges.add_contours(&contours)?;
        self.rasterize(fill_rule, clip, out)
    }

    /// Rasterize the outline of `path` stroked with `style`.
    ///
    /// The outline is built in user space, so a non-uniform `matrix` distorts
    /// the pen the same way it distorts the path.
    pub fn stroke_path(
        &mut self,
        path: &Path,
        matrix: &Matrix,
        style: &StrokeStyle,
        clip: &IntRect,
        config: &RasterConfig,
        out: &mut SpanBuffer,
    ) -> RasterResult<()> {
        out.clear();
        self.edges.clear();

        let scale = matrix.scale_factor();
        if !(style.width * scale > config.min_stroke_width) {
            return Ok(());
        }

        let user = config.scaled(scale);
        let contours = flatten_path(path, &Matrix::identity(), &user)?;
        let mut polygons = Vec::new();
        Stroker::new(style, config.tess_tol / scale, user.dist_tol)
            .stroke(&contours, &mut polygons)?;

        let mut device: Vec<Point> = Vec::new();
        for polygon in &polygons {
            device.clear();
            device.try_reserve(polygon.len())?;
            device.extend(polygon.iter().map(|p| matrix.map_point(*p)));
            self.edges.add_polygon(&device)?;
        }
        self.rasterize(FillRule::NonZero, clip, out)
    }

    /// Rasterize closed polygons given in device space.
    pub fn fill_polygons(
        &mut self,
        polygons: &[Vec<Point>],
        fill_rule: FillRule,
        clip: &IntRect,
        out: &mut SpanBuffer,
    ) -> RasterResult<()> {
        out.clear();
        self.edges.clear();
        for polygon in polygons {
            self.edges.add_polygon(polygon)?;
        }
        self.rasterize(fill_rule, clip, out)
    }

    fn alloc(&mut self, node: ActiveEdge) -> RasterResult<usize> {
        if let Some(idx) = self.free.pop() {
            self.pool[idx] = node;
            return Ok(idx);
        }
        self.pool.try_reserve(1)?;
        // Keep room to recycle every node without growing the free list
        self.free
            .try_reserve((self.pool.len() + 1).saturating_sub(self.free.len()))?;
        self.pool.push(node);
        Ok(self.pool.len() - 1)
    }

    fn rasterize(
        &mut self,
        fill_rule: FillRule,
        clip: &IntRect,
        out: &mut SpanBuffer,
    ) -> RasterResult<()> {
        if clip.is_empty() || self.edges.is_empty() {
            return Ok(());
        }
        self.edges.sort();

        let len = clip.w as usize;
        self.scanline.clear();
        self.scanline.try_reserve(len)?;
        self.scanline.resize(len, 0);
        self.pool.clear();
        self.free.clear();
        self.active.clear();

        let x_origin = clip.x as f32;
        let mut next_edge = 0;

        for y in clip.y..clip.bottom() {
            self.scanline.fill(0);
            let mut xmin = clip.w;
            let mut xmax = 0;

            for s in 0..SUBSAMPLES {
                let scany = (y * SUBSAMPLES + s) as f32 + 0.5;

                // Drop edges that end above this sample line, advance the rest
                let mut k = 0;
                while k < self.active.len() {
                    let idx = self.active[k];
                    let node = &mut self.pool[idx];
                    if node.ey <= scany {
                        self.active.remove(k);
                        self.free.push(idx);
                    } else {
                        node.x = node.x_at(scany);
                        k += 1;
                    }
                }

                // Advancing may have swapped neighbours
                loop {
                    let mut changed = false;
                    for k in 1..self.active.len() {
                        if self.pool[self.active[k - 1]].x > self.pool[self.active[k]].x {
                            self.active.swap(k - 1, k);
                            changed = true;
                        }
                    }
                    if !changed {
                        break;
                    }
                }

                while let Some(&e) = self.edges.edges().get(next_edge) {
                    if e.y0 > scany {
                        break;
                    }
                    next_edge += 1;
                    if e.y1 <= scany {
                        continue;
                    }

                    let mut node = ActiveEdge {
                        x: 0,
                        x0: e.x0 - x_origin,
                        y0: e.y0,
                        dxdy: (e.x1 - e.x0) / (e.y1 - e.y0),
                        ey: e.y1,
                        dir: e.dir,
                    };
                    node.x = node.x_at(scany);
                    let x = node.x;

                    let idx = self.alloc(node)?;
                    let pos = self
                        .active
                        .iter()
                        .position(|&i| self.pool[i].x >= x)
                        .unwrap_or(self.active.len());
                    self.active.try_reserve(1)?;
                    self.active.insert(pos, idx);
                }

                if !self.active.is_empty() {
                    self.fill_active_edges(fill_rule, &mut xmin, &mut xmax);
                }
            }

            let xmin = xmin.max(0);
            let xmax = xmax.min(clip.w - 1);
            if xmin <= xmax {
                out.push_row(
                    clip.x + xmin,
                    y,
                    &self.scanline[xmin as usize..=xmax as usize],
                )?;
            }
        }

        log::trace!(
            target: "raster",
            "rasterized {} edges into {} spans",
            self.edges.len(),
            out.spans().len()
        );
        Ok(())
    }

    fn fill_active_edges(&mut self, fill_rule: FillRule, xmin: &mut i32, xmax: &mut i32) {
        let mut x0 = 0;
        let mut w = 0;
        for &idx in &self.active {
            let edge = &self.pool[idx];
            match fill_rule {
                FillRule::NonZero => {
                    if w == 0 {
                        x0 = edge.x;
                        w += edge.dir;
                    } else {
                        w += edge.dir;
                        if w == 0 {
                            fill_scanline(&mut self.scanline, x0, edge.x, xmin, xmax);
                        }
                    }
                }
                FillRule::EvenOdd => {
                    if w == 0 {
                        x0 = edge.x;
                        w = 1;
                    } else {
                        w = 0;
                        fill_scanline(&mut self.scanline, x0, edge.x, xmin, xmax);
                    }
                }
            }
        }
    }
}

/// Add one sample's coverage for the run `[x0, x1)` (fixed point).
fn fill_scanline(scanline: &mut [u8], x0: i32, x1: i32, xmin: &mut i32, xmax: &mut i32) {
    let len = scanline.len() as i32;
    let mut i = x0 >> FIXSHIFT;
    let mut j = x1 >> FIXSHIFT;
    *xmin = (*xmin).min(i);
    *xmax = (*xmax).max(j);

    if i >= len || j < 0 {
        return;
    }
    let add = |px: &mut u8, v: i32| *px = px.saturating_add(v as u8);

    if i == j {
        add(&mut scanline[i as usize], ((x1 - x0) * MAX_WEIGHT) >> FIXSHIFT);
        return;
    }

    if i >= 0 {
        add(
            &mut scanline[i as usize],
            ((FIX - (x0 & FIXMASK)) * MAX_WEIGHT) >> FIXSHIFT,
        );
    } else {
        i = -1;
    }

    if j < len {
        add(&mut scanline[j as usize], ((x1 & FIXMASK) * MAX_WEIGHT) >> FIXSHIFT);
    } else {
        j = len;
    }

    for px in &mut scanline[(i + 1) as usize..j as usize] {
        add(px, MAX_WEIGHT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RectParams;
    use crate::stroke::LineJoin;
    use rstest::rstest;
    use std::f32::consts::PI;

    fn total_coverage(spans: &SpanBuffer) -> f32 {
        spans
            .spans()
            .iter()
            .map(|s| s.coverage as f32 * s.len as f32)
            .sum::<f32>()
            / 255.0
    }

    fn coverage_at(spans: &SpanBuffer, x: i32, y: i32) -> u8 {
        spans
            .spans()
            .iter()
            .find(|s| s.y == y && x >= s.x && x < s.x + s.len)
            .map(|s| s.coverage)
            .unwrap_or(0)
    }

    fn to_image(spans: &SpanBuffer, w: i32, h: i32) -> Vec<u8> {
        let mut img = vec![0u8; (w * h) as usize];
        for s in spans.spans() {
            for x in s.x..s.x + s.len {
                img[(s.y * w + x) as usize] = s.coverage;
            }
        }
        img
    }

    fn star() -> Path {
        let mut path = Path::new();
        for k in 0..5 {
            let a = -PI / 2.0 + k as f32 * 4.0 * PI / 5.0;
            let (x, y) = (50.0 + 40.0 * a.cos(), 50.0 + 40.0 * a.sin());
            if k == 0 {
                path.move_to(x, y).unwrap();
            } else {
                path.line_to(x, y).unwrap();
            }
        }
        path.close().unwrap();
        path
    }

    #[test]
    fn test_triangle_coverage_matches_area() {
        let mut path = Path::new();
        path.move_to(2.0, 2.0).unwrap();
        path.line_to(18.0, 2.0).unwrap();
        path.line_to(10.0, 12.0).unwrap();
        path.close().unwrap();

        let mut r = Rasterizer::new();
        let mut spans = SpanBuffer::new();
        r.fill_path(
            &path,
            &Matrix::identity(),
            FillRule::NonZero,
            &IntRect::new(0, 0, 20, 20),
            &RasterConfig::default(),
            &mut spans,
        )
        .unwrap();

        let area = total_coverage(&spans);
        assert!((area - 80.0).abs() < 1.0, "area={area}");
        // Fully inside pixels get full coverage
        assert_eq!(coverage_at(&spans, 10, 4), 255);
        assert_eq!(coverage_at(&spans, 1, 1), 0);
    }

    #[test]
    fn test_tall_edge_area_does_not_drift() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).unwrap();
        path.line_to(300.0, 0.0).unwrap();
        path.line_to(0.0, 900.0).unwrap();
        path.close().unwrap();

        let mut r = Rasterizer::new();
        let mut spans = SpanBuffer::new();
        r.fill_path(
            &path,
            &Matrix::identity(),
            FillRule::NonZero,
            &IntRect::new(0, 0, 300, 900),
            &RasterConfig::default(),
            &mut spans,
        )
        .unwrap();

        let area = spans
            .spans()
            .iter()
            .map(|s| s.coverage as f64 * s.len as f64)
            .sum::<f64>()
            / 255.0;
        // Coverage truncation loses at most 5/255 px per row; stepping adds nothing
        assert!((area - 135000.0).abs() < 25.0, "area={area}");
    }

    fn stroked_l_area(points: [(f32, f32); 3], join: LineJoin) -> f32 {
        let mut path = Path::new();
        path.move_to(points[0].0, points[0].1).unwrap();
        path.line_to(points[1].0, points[1].1).unwrap();
        path.line_to(points[2].0, points[2].1).unwrap();
        let style = StrokeStyle {
            width: 4.0,
            join,
            ..Default::default()
        };
        let mut r = Rasterizer::new();
        let mut spans = SpanBuffer::new();
        r.stroke_path(
            &path,
            &Matrix::identity(),
            &style,
            &IntRect::new(0, 0, 40, 40),
            &RasterConfig::default(),
            &mut spans,
        )
        .unwrap();
        total_coverage(&spans)
    }

    #[rstest]
    #[case(LineJoin::Miter, 159.5, 160.5)]
    #[case(LineJoin::Bevel, 157.5, 158.5)]
    #[case(LineJoin::Round, 158.2, 159.2)]
    fn test_join_outline_area(#[case] join: LineJoin, #[case] min: f32, #[case] max: f32) {
        // Right then down, and its mirror image turning the other way
        let clockwise = stroked_l_area([(10.0, 10.0), (30.0, 10.0), (30.0, 30.0)], join);
        let counter = stroked_l_area([(30.0, 10.0), (10.0, 10.0), (10.0, 30.0)], join);
        assert!(clockwise > min && clockwise < max, "{join:?}: area={clockwise}");
        assert!((clockwise - counter).abs() < 0.1, "{clockwise} vs {counter}");
    }

    #[rstest]
    #[case(FillRule::NonZero, 255)]
    #[case(FillRule::EvenOdd, 0)]
    fn test_star_center(#[case] rule: FillRule, #[case] expected: u8) {
        let mut r = Rasterizer::new();
        let mut spans = SpanBuffer::new();
        r.fill_path(
            &star(),
            &Matrix::identity(),
            rule,
            &IntRect::new(0, 0, 100, 100),
            &RasterConfig::default(),
            &mut spans,
        )
        .unwrap();
        assert_eq!(coverage_at(&spans, 50, 50), expected);
        // A star tip is filled under both rules
        assert_eq!(coverage_at(&spans, 50, 15), 255);
    }

    #[test]
    fn test_spans_stay_inside_clip() {
        let mut path = Path::new();
        path.add_rect(&RectParams {
            x: -10.0,
            y: -10.0,
            width: 100.0,
            height: 100.0,
        })
        .unwrap();

        let clip = IntRect::new(5, 6, 10, 4);
        let mut r = Rasterizer::new();
        let mut spans = SpanBuffer::new();
        r.fill_path(
            &path,
            &Matrix::identity(),
            FillRule::NonZero,
            &clip,
            &RasterConfig::default(),
            &mut spans,
        )
        .unwrap();
        assert_eq!(spans.extents(), clip);
        assert_eq!(total_coverage(&spans), 40.0);
    }

    #[test]
    fn test_stroked_rect_area_and_rotation_symmetry() {
        let mut path = Path::new();
        path.add_rect(&RectParams {
            x: 8.0,
            y: 12.0,
            width: 24.0,
            height: 14.0,
        })
        .unwrap();
        let style = StrokeStyle {
            width: 2.0,
            ..Default::default()
        };
        let clip = IntRect::new(0, 0, 40, 40);
        let config = RasterConfig::default();

        let mut r = Rasterizer::new();
        let mut upright = SpanBuffer::new();
        r.stroke_path(&path, &Matrix::identity(), &style, &clip, &config, &mut upright)
            .unwrap();
        let area = total_coverage(&upright);
        assert!((area - 76.0 * 2.0).abs() < 1.0, "area={area}");

        // Quarter turn around the canvas centre
        let m = Matrix::translation(-20.0, -20.0)
            .then(&Matrix::rotation(PI / 2.0))
            .then(&Matrix::translation(20.0, 20.0));
        let mut rotated = SpanBuffer::new();
        r.stroke_path(&path, &m, &style, &clip, &config, &mut rotated)
            .unwrap();

        let a = to_image(&upright, 40, 40);
        let b = to_image(&rotated, 40, 40);
        for qy in 0..40 {
            for qx in 0..40 {
                let expected = a[((39 - qx) * 40 + qy) as usize] as i32;
                let actual = b[(qy * 40 + qx) as usize] as i32;
                assert!((expected - actual).abs() <= 2, "pixel ({qx},{qy})");
            }
        }
    }

    #[test]
    fn test_hairline_stroke_draws_nothing() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).unwrap();
        path.line_to(10.0, 10.0).unwrap();
        let style = StrokeStyle {
            width: 0.005,
            ..Default::default()
        };
        let mut r = Rasterizer::new();
        let mut spans = SpanBuffer::new();
        r.stroke_path(
            &path,
            &Matrix::identity(),
            &style,
            &IntRect::new(0, 0, 20, 20),
            &RasterConfig::default(),
            &mut spans,
        )
        .unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_rasterizer_reuse_resets_state() {
        let mut r = Rasterizer::new();
        let mut first = SpanBuffer::new();
        let mut second = SpanBuffer::new();
        let clip = IntRect::new(0, 0, 100, 100);
        let config = RasterConfig::default();
        r.fill_path(&star(), &Matrix::identity(), FillRule::NonZero, &clip, &config, &mut first)
            .unwrap();
        r.fill_path(&star(), &Matrix::identity(), FillRule::NonZero, &clip, &config, &mut second)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fill_scanline_partial_pixels() {
        let mut row = [0u8; 4];
        let (mut xmin, mut xmax) = (4, 0);
        // From x = 0.5 to x = 2.25
        fill_scanline(&mut row, FIX / 2, 2 * FIX + FIX / 4, &mut xmin, &mut xmax);
        assert_eq!(row, [25, 51, 12, 0]);
        assert_eq!((xmin, xmax), (0, 2));
    }
}
