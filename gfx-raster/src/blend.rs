//! Span compositing.
//!
//! Each operator exists twice: once for a constant source color and once for
//! a per-pixel source row, so the inner loops never branch on paint kind.
//! `const_alpha` is the span coverage (already scaled by texture opacity).

use crate::color::{alpha, byte_mul, interpolate_pixel};
use crate::matrix::Matrix;
use crate::paint::Paint;
use crate::sink::PixelSink;
use crate::span::SpanBuffer;

/// Pixels composited per sink read/write round trip.
const BUFFER_SIZE: usize = 128;

/// Porter-Duff compositing operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    /// Replace the destination (blended by coverage).
    Src,
    /// Source over destination.
    #[default]
    SrcOver,
    /// Keep the destination where the source is opaque.
    DstIn,
    /// Keep the destination where the source is transparent.
    DstOut,
}

impl Operator {
    /// Whether the destination's previous value affects the result for a
    /// fully covered span.
    fn reads_destination(self, const_alpha: u32) -> bool {
        !(self == Operator::Src && const_alpha == 255)
    }
}

pub(crate) fn composite_solid(op: Operator, dest: &mut [u32], color: u32, const_alpha: u32) {
    match op {
        Operator::Src => {
            if const_alpha == 255 {
                dest.fill(color);
            } else {
                let ialpha = 255 - const_alpha;
                let color = byte_mul(color, const_alpha);
                for d in dest.iter_mut() {
                    *d = color.wrapping_add(byte_mul(*d, ialpha));
                }
            }
        }
        Operator::SrcOver => {
            let color = if const_alpha != 255 {
                byte_mul(color, const_alpha)
            } else {
                color
            };
            let ialpha = 255 - alpha(color);
            for d in dest.iter_mut() {
                *d = color.wrapping_add(byte_mul(*d, ialpha));
            }
        }
        Operator::DstIn | Operator::DstOut => {
            let source_alpha = if op == Operator::DstIn {
                alpha(color)
            } else {
                alpha(!color)
            };
            let a = if const_alpha != 255 {
                byte_mul(source_alpha, const_alpha) + 255 - const_alpha
            } else {
                source_alpha
            };
            for d in dest.iter_mut() {
                *d = byte_mul(*d, a);
            }
        }
    }
}

pub(crate) fn composite(op: Operator, dest: &mut [u32], src: &[u32], const_alpha: u32) {
    let pixels = dest.iter_mut().zip(src.iter().copied());
    match op {
        Operator::Src => {
            if const_alpha == 255 {
                for (d, s) in pixels {
                    *d = s;
                }
            } else {
                let ialpha = 255 - const_alpha;
                for (d, s) in pixels {
                    *d = interpolate_pixel(s, const_alpha, *d, ialpha);
                }
            }
        }
        Operator::SrcOver => {
            if const_alpha == 255 {
                for (d, s) in pixels {
                    if s >= 0xff000000 {
                        *d = s;
                    } else if s != 0 {
                        *d = s.wrapping_add(byte_mul(*d, alpha(!s)));
                    }
                }
            } else {
                for (d, s) in pixels {
                    let s = byte_mul(s, const_alpha);
                    *d = s.wrapping_add(byte_mul(*d, alpha(!s)));
                }
            }
        }
        Operator::DstIn | Operator::DstOut => {
            let cia = 255 - const_alpha;
            for (d, s) in pixels {
                let source_alpha = if op == Operator::DstIn {
                    alpha(s)
                } else {
                    alpha(!s)
                };
                let a = if const_alpha == 255 {
                    source_alpha
                } else {
                    byte_mul(source_alpha, const_alpha) + cia
                };
                *d = byte_mul(*d, a);
            }
        }
    }
}

/// Composite `paint` through every span of `spans` into `sink`.
///
/// `ctm` maps user space to device space; gradient and texture matrices are
/// applied on top of it. Paints that cannot be drawn (no gradient stops,
/// singular matrix, zero opacity) leave the sink untouched.
pub(crate) fn blend(
    sink: &mut PixelSink<'_>,
    spans: &SpanBuffer,
    paint: &Paint,
    ctm: &Matrix,
    opacity: f32,
    op: Operator,
) {
    let mut dest = [0u32; BUFFER_SIZE];
    let mut src = [0u32; BUFFER_SIZE];

    match paint {
        Paint::Color(color) => {
            let color = color.premultiplied(opacity);
            // An opaque source covers the destination completely
            let op = if op == Operator::SrcOver && alpha(color) == 255 {
                Operator::Src
            } else {
                op
            };
            for span in spans.spans() {
                let const_alpha = span.coverage as u32;
                for_each_chunk(span.x, span.len, |x, n| {
                    let dest = &mut dest[..n];
                    if op.reads_destination(const_alpha) {
                        sink.read(x, span.y, dest);
                    }
                    composite_solid(op, dest, color, const_alpha);
                    sink.write(x, span.y, dest);
                });
            }
        }
        Paint::Gradient(gradient) => {
            let Some(shader) = gradient.prepare(ctm, opacity) else {
                return;
            };
            for span in spans.spans() {
                let const_alpha = span.coverage as u32;
                for_each_chunk(span.x, span.len, |x, n| {
                    let (dest, src) = (&mut dest[..n], &mut src[..n]);
                    shader.fetch(x, span.y, src);
                    if op.reads_destination(const_alpha) {
                        sink.read(x, span.y, dest);
                    }
                    composite(op, dest, src, const_alpha);
                    sink.write(x, span.y, dest);
                });
            }
        }
        Paint::Texture(texture) => {
            let Some(shader) = texture.prepare(ctm, opacity) else {
                return;
            };
            for span in spans.spans() {
                let const_alpha = shader.scale_coverage(span.coverage);
                if const_alpha == 0 {
                    continue;
                }
                for_each_chunk(span.x, span.len, |x, n| {
                    let range = shader.fetch(x, span.y, &mut src[..n]);
                    if range.is_empty() {
                        return;
                    }
                    let x = x + range.start as i32;
                    let (dest, src) = (&mut dest[range.clone()], &src[range]);
                    if op.reads_destination(const_alpha) {
                        sink.read(x, span.y, dest);
                    }
                    composite(op, dest, src, const_alpha);
                    sink.write(x, span.y, dest);
                });
            }
        }
    }

    log::trace!(target: "raster", "blended {} spans with {:?}", spans.spans().len(), op);
}

/// Split `[x, x + len)` into chunks of at most `BUFFER_SIZE` pixels.
fn for_each_chunk(mut x: i32, len: i32, mut f: impl FnMut(i32, usize)) {
    let mut remaining = len.max(0) as usize;
    while remaining > 0 {
        let n = remaining.min(BUFFER_SIZE);
        f(x, n);
        x += n as i32;
        remaining -= n;
    }
}
