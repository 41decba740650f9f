//! Coverage spans.

use crate::color::div255;
use crate::error::RasterResult;
use crate::geometry::IntRect;

/// A horizontal run of pixels with constant coverage on one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub x: i32,
    pub len: i32,
    pub y: i32,
    pub coverage: u8,
}

/// Spans in row-major order: sorted by `y`, then by `x`, never overlapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanBuffer {
    spans: Vec<Span>,
}

impl SpanBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    pub fn push(&mut self, span: Span) -> RasterResult<()> {
        self.spans.try_reserve(1)?;
        self.spans.push(span);
        Ok(())
    }

    /// Split one row of per-pixel coverage starting at `x` into constant runs.
    /// Zero coverage is skipped.
    pub fn push_row(&mut self, x: i32, y: i32, coverage: &[u8]) -> RasterResult<()> {
        let mut i = 0;
        while i < coverage.len() {
            let c = coverage[i];
            let start = i;
            while i < coverage.len() && coverage[i] == c {
                i += 1;
            }
            if c != 0 {
                self.push(Span {
                    x: x + start as i32,
                    len: (i - start) as i32,
                    y,
                    coverage: c,
                })?;
            }
        }
        Ok(())
    }

    /// Replace the contents with full coverage over `rect`.
    pub fn init_rect(&mut self, rect: &IntRect) -> RasterResult<()> {
        self.spans.clear();
        if rect.is_empty() {
            return Ok(());
        }
        self.spans.try_reserve(rect.h as usize)?;
        for y in rect.y..rect.bottom() {
            self.spans.push(Span {
                x: rect.x,
                len: rect.w,
                y,
                coverage: 255,
            });
        }
        Ok(())
    }

    pub fn copy_from(&mut self, other: &SpanBuffer) -> RasterResult<()> {
        self.spans.clear();
        self.spans.try_reserve(other.spans.len())?;
        self.spans.extend_from_slice(&other.spans);
        Ok(())
    }

    /// Replace the contents with the intersection of `a` and `b`.
    ///
    /// Both inputs are walked once in row-major order. Overlapping pieces get
    /// the product of the two coverages.
    pub fn intersect(&mut self, a: &SpanBuffer, b: &SpanBuffer) -> RasterResult<()> {
        self.spans.clear();
        let (a, b) = (&a.spans, &b.spans);
        let (mut i, mut j) = (0, 0);

        while i < a.len() && j < b.len() {
            let (sa, sb) = (a[i], b[j]);
            if sb.y > sa.y {
                i += 1;
                continue;
            }
            if sa.y != sb.y {
                j += 1;
                continue;
            }

            let a_end = sa.x + sa.len;
            let b_end = sb.x + sb.len;
            if b_end <= sa.x {
                j += 1;
                continue;
            }
            if a_end <= sb.x {
                i += 1;
                continue;
            }

            let x = sa.x.max(sb.x);
            let len = a_end.min(b_end) - x;
            if len > 0 {
                self.push(Span {
                    x,
                    len,
                    y: sa.y,
                    coverage: div255(sa.coverage as u32 * sb.coverage as u32) as u8,
                })?;
            }
            if a_end < b_end {
                i += 1;
            } else {
                j += 1;
            }
        }
        Ok(())
    }

    /// Bounding box of all spans. Empty buffers give an empty rectangle.
    pub fn extents(&self) -> IntRect {
        let Some(first) = self.spans.first() else {
            return IntRect::default();
        };
        let (mut x0, mut x1) = (i32::MAX, i32::MIN);
        let (mut y0, mut y1) = (first.y, first.y);
        for s in &self.spans {
            x0 = x0.min(s.x);
            x1 = x1.max(s.x + s.len);
            y0 = y0.min(s.y);
            y1 = y1.max(s.y);
        }
        IntRect::new(x0, y0, x1 - x0, y1 - y0 + 1)
    }
}
