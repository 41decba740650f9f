//! Anti-aliased scanline rasterization of vector paths.
//!
//! The crate turns paths made of lines and cubic Beziers into coverage spans
//! and composites a paint (solid color, linear or radial gradient, texture)
//! through those spans into a pixel sink. It uses:
//! - `kurbo` for SVG arc conversion and `svgtypes` for SVG path data
//! - `csscolorparser` for CSS color strings
//! - `png` to export direct buffers
//!
//! Pixels are 32-bit premultiplied ARGB. The sink is either a borrowed buffer
//! or a pair of read/write callbacks, so targets without a framebuffer
//! (displays driven over a bus, tiled renderers) can be drawn to directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use gfx_raster::{Canvas, Color, DirectBuffer};
//!
//! let mut pixels = vec![0u32; 400 * 300];
//! let mut canvas = Canvas::new(DirectBuffer::new(&mut pixels, 400, 300, 400)?);
//! canvas.set_color(Color::new(1.0, 0.0, 0.0, 1.0));
//! canvas.fill_rect(10.0, 10.0, 100.0, 50.0)?;
//! let png_data = canvas.to_png()?;
//! ```

mod blend;
mod canvas;
mod color;
mod config;
mod drawing_state;
mod edge;
mod error;
mod flatten;
mod geometry;
mod gradient;
mod matrix;
mod paint;
mod path;
mod rasterizer;
mod sink;
mod span;
mod stroke;
mod texture;

// Re-export public API
pub use blend::Operator;
pub use canvas::{Canvas, CanvasBuilder};
pub use color::{
    alpha, byte_mul, div255, interpolate_pixel, pack_argb, premultiply_argb, unpremultiply_argb,
    Color,
};
pub use config::RasterConfig;
pub use drawing_state::CanvasState;
pub use edge::{Edge, EdgeList, SUBSAMPLES};
pub use error::{RasterError, RasterResult};
pub use flatten::{
    flatten_cubic, flatten_path, Contour, FlattenCubic, PathPoint, PT_BEVEL, PT_CORNER, PT_LEFT,
};
pub use geometry::{
    ArcParams, CubicBezierParams, EllipseParams, IntRect, LinearGradientParams, Point,
    QuadraticBezierParams, RadialGradientParams, Rect, RectParams, RoundRectParams, SvgArcParams,
};
pub use gradient::{
    ColorTable, Gradient, GradientStop, GradientType, SpreadMethod, COLOR_TABLE_SIZE,
};
pub use matrix::Matrix;
pub use paint::Paint;
pub use path::{Path, Segment};
pub use rasterizer::{FillRule, Rasterizer};
pub use sink::{CallbackSink, DirectBuffer, PixelSink, ReadFn, SinkTarget, WriteFn};
pub use span::{Span, SpanBuffer};
pub use stroke::{dash_contour, LineCap, LineJoin, StrokeStyle, Stroker};
pub use texture::{Texture, TextureSource, TextureType};
