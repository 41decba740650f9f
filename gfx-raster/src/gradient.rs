//! Linear and radial gradients.

use crate::color::{interpolate_pixel, Color};
use crate::geometry::{LinearGradientParams, RadialGradientParams};
use crate::matrix::Matrix;

/// Number of entries in a gradient color table.
pub const COLOR_TABLE_SIZE: usize = 256;

/// How a gradient continues outside the `[0, 1]` offset range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpreadMethod {
    /// Extend the end colors.
    #[default]
    Pad,
    /// Mirror the ramp on every repetition.
    Reflect,
    /// Restart the ramp on every repetition.
    Repeat,
}

/// A color stop in a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Offset position (0.0 to 1.0).
    pub offset: f32,
    /// Color at this stop.
    pub color: Color,
}

/// Type of gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientType {
    Linear(LinearGradientParams),
    Radial(RadialGradientParams),
}

/// A gradient paint in its own coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub gradient_type: GradientType,
    /// Color stops, kept sorted by offset.
    pub stops: Vec<GradientStop>,
    pub spread: SpreadMethod,
    /// Gradient space to user space.
    pub matrix: Matrix,
}

impl Gradient {
    /// Create a new linear gradient.
    pub fn new_linear(params: &LinearGradientParams) -> Self {
        Self {
            gradient_type: GradientType::Linear(*params),
            stops: Vec::new(),
            spread: SpreadMethod::default(),
            matrix: Matrix::identity(),
        }
    }

    /// Create a new radial gradient.
    pub fn new_radial(params: &RadialGradientParams) -> Self {
        Self {
            gradient_type: GradientType::Radial(*params),
            stops: Vec::new(),
            spread: SpreadMethod::default(),
            matrix: Matrix::identity(),
        }
    }

    pub fn with_spread(mut self, spread: SpreadMethod) -> Self {
        self.spread = spread;
        self
    }

    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrix = matrix;
        self
    }

    /// Add a color stop. The offset is clamped to `[0, 1]`; non-finite
    /// offsets are ignored.
    pub fn add_color_stop(&mut self, offset: f32, color: Color) {
        if !offset.is_finite() {
            return;
        }
        self.stops.push(GradientStop {
            offset: offset.clamp(0.0, 1.0),
            color,
        });
        // Stable, so stops at equal offsets keep insertion order
        self.stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    }

    pub fn with_stops<I: IntoIterator<Item = (f32, Color)>>(mut self, stops: I) -> Self {
        for (offset, color) in stops {
            self.add_color_stop(offset, color);
        }
        self
    }

    /// Resolve the gradient for drawing under `ctm` with `opacity`.
    ///
    /// Returns `None` when there is nothing to draw: no stops, or a matrix
    /// that cannot be inverted.
    pub(crate) fn prepare(&self, ctm: &Matrix, opacity: f32) -> Option<GradientShader> {
        if self.stops.is_empty() {
            return None;
        }
        let inverse = self.matrix.then(ctm).invert()?;
        Some(GradientShader {
            table: ColorTable::build(&self.stops, opacity),
            inverse,
            spread: self.spread,
            geometry: Geometry::new(&self.gradient_type),
        })
    }
}

/// A 256-entry premultiplied color ramp. Entry `i` holds the color at
/// offset `i / 255`.
#[derive(Clone)]
pub struct ColorTable(Box<[u32; COLOR_TABLE_SIZE]>);

impl std::fmt::Debug for ColorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorTable")
            .field("first", &format_args!("{:#010x}", self.0[0]))
            .field("last", &format_args!("{:#010x}", self.0[COLOR_TABLE_SIZE - 1]))
            .finish()
    }
}

impl ColorTable {
    /// Resample sorted `stops` into a table.
    pub fn build(stops: &[GradientStop], opacity: f32) -> Self {
        let mut table = Box::new([0u32; COLOR_TABLE_SIZE]);
        let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
            return Self(table);
        };
        let first_color = first.color.premultiplied(opacity);
        let last_color = last.color.premultiplied(opacity);

        let mut k = 0;
        for (i, entry) in table.iter_mut().enumerate() {
            let t = i as f32 / (COLOR_TABLE_SIZE - 1) as f32;
            if t <= first.offset {
                *entry = first_color;
                continue;
            }
            if t >= last.offset {
                *entry = last_color;
                continue;
            }
            while k + 1 < stops.len() && stops[k + 1].offset <= t {
                k += 1;
            }
            let (curr, next) = (&stops[k], &stops[k + 1]);
            let span = next.offset - curr.offset;
            let dist = if span > 0.0 {
                ((t - curr.offset) / span * 255.0) as u32
            } else {
                255
            };
            let dist = dist.min(255);
            *entry = interpolate_pixel(
                curr.color.premultiplied(opacity),
                255 - dist,
                next.color.premultiplied(opacity),
                dist,
            );
        }
        Self(table)
    }

    pub fn get(&self, index: usize) -> u32 {
        self.0[index.min(COLOR_TABLE_SIZE - 1)]
    }

    /// Color at gradient position `t` after applying `spread`.
    pub fn lookup(&self, t: f32, spread: SpreadMethod) -> u32 {
        let ipos = (t * (COLOR_TABLE_SIZE - 1) as f32 + 0.5) as i32;
        self.0[spread_index(ipos, spread)]
    }
}

/// Map an unbounded table index into `[0, 255]`.
fn spread_index(ipos: i32, spread: SpreadMethod) -> usize {
    const SIZE: i32 = COLOR_TABLE_SIZE as i32;
    let i = match spread {
        SpreadMethod::Pad => ipos.clamp(0, SIZE - 1),
        SpreadMethod::Repeat => ipos.rem_euclid(SIZE),
        SpreadMethod::Reflect => {
            let limit = SIZE * 2;
            let i = ipos.rem_euclid(limit);
            if i >= SIZE {
                limit - 1 - i
            } else {
                i
            }
        }
    };
    i as usize
}

/// Per-draw gradient geometry with the derived constants precomputed.
#[derive(Debug, Clone, Copy)]
enum Geometry {
    Linear {
        dx: f32,
        dy: f32,
        off: f32,
        degenerate: bool,
    },
    Radial {
        fx: f32,
        fy: f32,
        dx: f32,
        dy: f32,
        dr: f32,
        fr: f32,
        a: f32,
        extended: bool,
    },
}

impl Geometry {
    fn new(gradient_type: &GradientType) -> Self {
        match *gradient_type {
            GradientType::Linear(p) => {
                let dx = p.x2 - p.x1;
                let dy = p.y2 - p.y1;
                let l = dx * dx + dy * dy;
                if l != 0.0 {
                    let (dx, dy) = (dx / l, dy / l);
                    Geometry::Linear {
                        dx,
                        dy,
                        off: -dx * p.x1 - dy * p.y1,
                        degenerate: false,
                    }
                } else {
                    Geometry::Linear {
                        dx: 0.0,
                        dy: 0.0,
                        off: 0.0,
                        degenerate: true,
                    }
                }
            }
            GradientType::Radial(p) => {
                let dx = p.cx - p.fx;
                let dy = p.cy - p.fy;
                let dr = p.cr - p.fr;
                let a = dr * dr - dx * dx - dy * dy;
                Geometry::Radial {
                    fx: p.fx,
                    fy: p.fy,
                    dx,
                    dy,
                    dr,
                    fr: p.fr,
                    a,
                    extended: p.fr != 0.0 || a <= 0.0,
                }
            }
        }
    }
}

/// A gradient ready to produce device pixels.
#[derive(Debug, Clone)]
pub(crate) struct GradientShader {
    table: ColorTable,
    /// Device space to gradient space.
    inverse: Matrix,
    spread: SpreadMethod,
    geometry: Geometry,
}

impl GradientShader {
    /// Fill `out` with the colors of pixels `(x..x + out.len(), y)`.
    pub(crate) fn fetch(&self, x: i32, y: i32, out: &mut [u32]) {
        let inv = &self.inverse;
        let py = y as f32 + 0.5;
        match self.geometry {
            Geometry::Linear {
                dx,
                dy,
                off,
                degenerate,
            } => {
                if degenerate {
                    out.fill(self.table.lookup(0.0, self.spread));
                    return;
                }
                for (i, px) in out.iter_mut().enumerate() {
                    let fx = (x + i as i32) as f32 + 0.5;
                    let rx = inv.c * py + inv.a * fx + inv.e;
                    let ry = inv.d * py + inv.b * fx + inv.f;
                    let t = dx * rx + dy * ry + off;
                    *px = self.table.lookup(t, self.spread);
                }
            }
            Geometry::Radial {
                fx: focus_x,
                fy: focus_y,
                dx,
                dy,
                dr,
                fr,
                a,
                extended,
            } => {
                if a == 0.0 {
                    out.fill(0);
                    return;
                }
                let inv2a = 1.0 / (2.0 * a);
                for (i, px) in out.iter_mut().enumerate() {
                    let fx = (x + i as i32) as f32 + 0.5;
                    let rx = inv.c * py + inv.a * fx + inv.e - focus_x;
                    let ry = inv.d * py + inv.b * fx + inv.f - focus_y;
                    let b = 2.0 * (dr * fr + rx * dx + ry * dy);
                    let det = b * b - 4.0 * a * (fr * fr - rx * rx - ry * ry);
                    *px = if extended {
                        if det >= 0.0 {
                            let w = (det.sqrt() - b) * inv2a;
                            if fr + dr * w >= 0.0 {
                                self.table.lookup(w, self.spread)
                            } else {
                                0
                            }
                        } else {
                            0
                        }
                    } else {
                        let t = (det.max(0.0).sqrt() - b) * inv2a;
                        self.table.lookup(t, self.spread)
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::alpha;
    use rstest::rstest;

    const RED: u32 = 0xffff0000;
    const BLUE: u32 = 0xff0000ff;

    fn red_blue() -> Vec<GradientStop> {
        vec![
            GradientStop {
                offset: 0.0,
                color: Color::new(1.0, 0.0, 0.0, 1.0),
            },
            GradientStop {
                offset: 1.0,
                color: Color::new(0.0, 0.0, 1.0, 1.0),
            },
        ]
    }

    #[test]
    fn test_two_stop_table_is_monotonic() {
        let table = ColorTable::build(&red_blue(), 1.0);
        assert_eq!(table.get(0), RED);
        assert_eq!(table.get(255), BLUE);
        for i in 1..COLOR_TABLE_SIZE {
            let (prev, curr) = (table.get(i - 1), table.get(i));
            assert!((curr >> 16) & 0xff <= (prev >> 16) & 0xff, "red rises at {i}");
            assert!(curr & 0xff >= prev & 0xff, "blue falls at {i}");
            assert_eq!(alpha(curr), 255);
        }
    }

    #[test]
    fn test_table_pads_outside_stops() {
        let stops = vec![
            GradientStop {
                offset: 0.25,
                color: Color::new(1.0, 0.0, 0.0, 1.0),
            },
            GradientStop {
                offset: 0.75,
                color: Color::new(0.0, 0.0, 1.0, 1.0),
            },
        ];
        let table = ColorTable::build(&stops, 1.0);
        assert_eq!(table.get(10), RED);
        assert_eq!(table.get(250), BLUE);
    }

    #[test]
    fn test_table_applies_opacity() {
        let table = ColorTable::build(&red_blue(), 0.5);
        assert_eq!(table.get(0), 0x80800000);
    }

    #[rstest]
    #[case(SpreadMethod::Pad, -10, 0)]
    #[case(SpreadMethod::Pad, 300, 255)]
    #[case(SpreadMethod::Repeat, 256, 0)]
    #[case(SpreadMethod::Repeat, -1, 255)]
    #[case(SpreadMethod::Reflect, 256, 255)]
    #[case(SpreadMethod::Reflect, 300, 211)]
    #[case(SpreadMethod::Reflect, -1, 0)]
    fn test_spread_index(#[case] spread: SpreadMethod, #[case] ipos: i32, #[case] expected: usize) {
        assert_eq!(spread_index(ipos, spread), expected);
    }

    #[test]
    fn test_add_color_stop_sorts_and_clamps() {
        let mut g = Gradient::new_linear(&LinearGradientParams {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 0.0,
        });
        g.add_color_stop(1.5, Color::WHITE);
        g.add_color_stop(0.2, Color::BLACK);
        g.add_color_stop(f32::NAN, Color::BLACK);
        let offsets: Vec<f32> = g.stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.2, 1.0]);
    }

    #[test]
    fn test_linear_fetch_along_axis() {
        let g = Gradient::new_linear(&LinearGradientParams {
            x1: 0.0,
            y1: 0.0,
            x2: 256.0,
            y2: 0.0,
        })
        .with_stops([(0.0, Color::new(1.0, 0.0, 0.0, 1.0)), (1.0, Color::new(0.0, 0.0, 1.0, 1.0))]);
        let shader = g.prepare(&Matrix::identity(), 1.0).unwrap();
        let mut row = [0u32; 256];
        shader.fetch(0, 0, &mut row);
        assert_eq!(row[0], RED);
        assert_eq!(row[255], BLUE);
        // Padding past the end
        let mut tail = [0u32; 4];
        shader.fetch(300, 7, &mut tail);
        assert!(tail.iter().all(|&c| c == BLUE));
    }

    #[test]
    fn test_radial_fetch_center_and_edge() {
        let g = Gradient::new_radial(&RadialGradientParams {
            cx: 50.0,
            cy: 50.0,
            cr: 40.0,
            fx: 50.0,
            fy: 50.0,
            fr: 0.0,
        })
        .with_stops([(0.0, Color::new(1.0, 0.0, 0.0, 1.0)), (1.0, Color::new(0.0, 0.0, 1.0, 1.0))]);
        let shader = g.prepare(&Matrix::identity(), 1.0).unwrap();
        let mut px = [0u32; 1];
        shader.fetch(49, 49, &mut px);
        // Pixel centre (49.5, 49.5) is next to the focus
        assert!((px[0] >> 16) & 0xff > 240);
        assert!(px[0] & 0xff < 16);
        shader.fetch(95, 50, &mut px);
        assert_eq!(px[0], BLUE);
    }

    #[test]
    fn test_singular_matrix_draws_nothing() {
        let g = Gradient::new_linear(&LinearGradientParams {
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 0.0,
        })
        .with_stops([(0.0, Color::BLACK)])
        .with_matrix(Matrix::scaling(0.0, 1.0));
        assert!(g.prepare(&Matrix::identity(), 1.0).is_none());
    }
}
