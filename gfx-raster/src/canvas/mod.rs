//! Stateful drawing front end over the rasterizer.
//!
//! A [`Canvas`] owns a [`PixelSink`], the current path and a save/restore
//! stack of [`CanvasState`]. Paths are recorded in user space and mapped
//! through the current matrix when they are filled, stroked or clipped.

mod drawing;
mod path_ops;
mod transform;

use crate::blend::Operator;
use crate::color::Color;
use crate::config::RasterConfig;
use crate::drawing_state::CanvasState;
use crate::error::RasterResult;
use crate::geometry::{LinearGradientParams, RadialGradientParams};
use crate::gradient::{Gradient, GradientStop, SpreadMethod};
use crate::paint::Paint;
use crate::path::Path;
use crate::rasterizer::{FillRule, Rasterizer};
use crate::sink::PixelSink;
use crate::span::SpanBuffer;
use crate::stroke::{LineCap, LineJoin};
use crate::texture::Texture;

/// Builder for [`Canvas`].
pub struct CanvasBuilder<'a> {
    sink: PixelSink<'a>,
    config: RasterConfig,
}

impl<'a> CanvasBuilder<'a> {
    /// Start building a canvas that draws into `sink`.
    pub fn new(sink: impl Into<PixelSink<'a>>) -> Self {
        Self {
            sink: sink.into(),
            config: RasterConfig::default(),
        }
    }

    /// Override the flattening and stroking tolerances.
    pub fn with_config(mut self, config: RasterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Canvas<'a> {
        log::debug!(
            target: "raster",
            "new canvas {}x{}",
            self.sink.width(),
            self.sink.height()
        );
        Canvas {
            sink: self.sink,
            config: self.config,
            state: CanvasState::default(),
            state_stack: Vec::new(),
            path: Path::new(),
            rasterizer: Rasterizer::new(),
            fill_spans: SpanBuffer::new(),
            clip_scratch: SpanBuffer::new(),
        }
    }
}

/// A drawing context bound to a pixel sink.
pub struct Canvas<'a> {
    pub(crate) sink: PixelSink<'a>,
    pub(crate) config: RasterConfig,
    /// Current drawing state.
    pub(crate) state: CanvasState,
    /// Stack of saved drawing states.
    state_stack: Vec<CanvasState>,
    /// Current path in user space.
    pub(crate) path: Path,
    pub(crate) rasterizer: Rasterizer,
    /// Coverage of the shape being drawn.
    pub(crate) fill_spans: SpanBuffer,
    /// Scratch output for clip intersection.
    pub(crate) clip_scratch: SpanBuffer,
}

impl<'a> Canvas<'a> {
    /// Create a canvas with the default configuration.
    pub fn new(sink: impl Into<PixelSink<'a>>) -> Self {
        CanvasBuilder::new(sink).build()
    }

    pub fn builder(sink: impl Into<PixelSink<'a>>) -> CanvasBuilder<'a> {
        CanvasBuilder::new(sink)
    }

    /// Width of the target in pixels.
    pub fn width(&self) -> u32 {
        self.sink.width()
    }

    /// Height of the target in pixels.
    pub fn height(&self) -> u32 {
        self.sink.height()
    }

    pub fn sink(&self) -> &PixelSink<'a> {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut PixelSink<'a> {
        &mut self.sink
    }

    /// Consume the canvas and hand back its sink.
    pub fn into_sink(self) -> PixelSink<'a> {
        self.sink
    }

    /// Encode the target as PNG. Only direct buffers can be exported.
    pub fn to_png(&self) -> RasterResult<Vec<u8>> {
        self.sink.to_png()
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    /// Push a copy of the current drawing state.
    pub fn save(&mut self) {
        log::debug!(target: "raster", "save");
        self.state_stack.push(self.state.clone());
    }

    /// Restore the previously saved drawing state. The base state is never
    /// popped.
    pub fn restore(&mut self) {
        log::debug!(target: "raster", "restore");
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }

    /// Number of states on the stack, including the base state.
    pub fn save_depth(&self) -> usize {
        self.state_stack.len() + 1
    }

    /// Borrow the current drawing state.
    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    // Paint sources

    pub fn set_paint(&mut self, paint: impl Into<Paint>) {
        self.state.paint = paint.into();
    }

    pub fn get_paint(&self) -> &Paint {
        &self.state.paint
    }

    pub fn set_color(&mut self, color: Color) {
        self.state.paint = Paint::Color(color);
    }

    /// Set a solid color from components in `[0, 1]`.
    pub fn set_rgba(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.set_color(Color::new(r, g, b, a));
    }

    /// Set a solid color from a CSS color string.
    pub fn set_css_color(&mut self, css: &str) -> RasterResult<()> {
        let color = Color::from_css(css)?;
        self.set_color(color);
        Ok(())
    }

    /// Set a linear gradient paint. The gradient is defined in user space.
    pub fn set_linear_gradient(
        &mut self,
        params: &LinearGradientParams,
        spread: SpreadMethod,
        stops: &[GradientStop],
    ) {
        let gradient = Gradient::new_linear(params)
            .with_spread(spread)
            .with_stops(stops.iter().map(|s| (s.offset, s.color)));
        self.state.paint = Paint::Gradient(gradient);
    }

    /// Set a two-circle radial gradient paint.
    pub fn set_radial_gradient(
        &mut self,
        params: &RadialGradientParams,
        spread: SpreadMethod,
        stops: &[GradientStop],
    ) {
        let gradient = Gradient::new_radial(params)
            .with_spread(spread)
            .with_stops(stops.iter().map(|s| (s.offset, s.color)));
        self.state.paint = Paint::Gradient(gradient);
    }

    pub fn set_texture(&mut self, texture: Texture) {
        self.state.paint = Paint::Texture(texture);
    }

    // State

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) {
        self.state.fill_rule = fill_rule;
    }

    pub fn get_fill_rule(&self) -> FillRule {
        self.state.fill_rule
    }

    pub fn set_operator(&mut self, op: Operator) {
        self.state.operator = op;
    }

    pub fn get_operator(&self) -> Operator {
        self.state.operator
    }

    /// Set the global opacity. Values outside `[0, 1]` are ignored.
    pub fn set_opacity(&mut self, opacity: f32) {
        if (0.0..=1.0).contains(&opacity) {
            self.state.opacity = opacity;
        }
    }

    pub fn get_opacity(&self) -> f32 {
        self.state.opacity
    }

    /// Set the stroke width. Negative and non-finite widths are ignored.
    pub fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width >= 0.0 {
            self.state.stroke.width = width;
        }
    }

    pub fn get_line_width(&self) -> f32 {
        self.state.stroke.width
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.state.stroke.cap = cap;
    }

    pub fn get_line_cap(&self) -> LineCap {
        self.state.stroke.cap
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.state.stroke.join = join;
    }

    pub fn get_line_join(&self) -> LineJoin {
        self.state.stroke.join
    }

    /// Set the miter limit. Non-positive and non-finite limits are ignored.
    pub fn set_miter_limit(&mut self, limit: f32) {
        if limit.is_finite() && limit > 0.0 {
            self.state.stroke.miter_limit = limit;
        }
    }

    pub fn get_miter_limit(&self) -> f32 {
        self.state.stroke.miter_limit
    }

    /// Set the dash pattern and its starting offset.
    ///
    /// The whole call is ignored if any entry is negative or non-finite. An
    /// empty array turns dashing off.
    pub fn set_dash(&mut self, offset: f32, dashes: &[f32]) {
        if !offset.is_finite() || dashes.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return;
        }
        self.state.stroke.dash_offset = offset;
        self.state.stroke.dash_array = dashes.to_vec();
    }

    /// Current dash array and offset.
    pub fn get_dash(&self) -> (&[f32], f32) {
        (&self.state.stroke.dash_array, self.state.stroke.dash_offset)
    }

    pub fn set_font_size(&mut self, size: f32) {
        if size.is_finite() && size >= 0.0 {
            self.state.font_size = size;
        }
    }

    pub fn get_font_size(&self) -> f32 {
        self.state.font_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::DirectBuffer;

    #[test]
    fn test_save_restore_depth() {
        let mut data = vec![0u32; 16];
        let buffer = DirectBuffer::new(&mut data, 4, 4, 4).unwrap();
        let mut canvas = Canvas::new(buffer);
        assert_eq!(canvas.save_depth(), 1);

        canvas.set_line_width(4.0);
        canvas.save();
        canvas.set_line_width(8.0);
        canvas.set_fill_rule(FillRule::EvenOdd);
        assert_eq!(canvas.save_depth(), 2);

        canvas.restore();
        assert_eq!(canvas.get_line_width(), 4.0);
        assert_eq!(canvas.get_fill_rule(), FillRule::NonZero);

        // The base state stays
        canvas.restore();
        assert_eq!(canvas.save_depth(), 1);
        assert_eq!(canvas.get_line_width(), 4.0);
    }

    #[test]
    fn test_invalid_setter_values_are_ignored() {
        let mut data = vec![0u32; 4];
        let buffer = DirectBuffer::new(&mut data, 2, 2, 2).unwrap();
        let mut canvas = Canvas::new(buffer);

        canvas.set_line_width(-1.0);
        canvas.set_line_width(f32::NAN);
        assert_eq!(canvas.get_line_width(), 1.0);

        canvas.set_miter_limit(0.0);
        assert_eq!(canvas.get_miter_limit(), 10.0);

        canvas.set_opacity(1.5);
        assert_eq!(canvas.get_opacity(), 1.0);

        canvas.set_dash(0.0, &[4.0, 2.0]);
        canvas.set_dash(1.0, &[4.0, -2.0]);
        assert_eq!(canvas.get_dash(), (&[4.0, 2.0][..], 0.0));

        assert!(canvas.set_css_color("not a color").is_err());
        assert!(matches!(canvas.get_paint(), Paint::Color(c) if *c == Color::BLACK));
    }
}
