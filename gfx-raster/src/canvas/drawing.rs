//! Fill, stroke, clip and paint operations for Canvas.

use super::Canvas;
use crate::blend::blend;
use crate::error::{RasterError, RasterResult};
use crate::geometry::{Rect, RectParams};
use crate::paint::Paint;
use crate::path::Path;
use crate::stroke::{LineCap, LineJoin};

impl Canvas<'_> {
    // --- Clipping ---

    /// Intersect the clip with the current path, then clear the path.
    pub fn clip(&mut self) -> RasterResult<()> {
        self.clip_preserve()?;
        self.path.clear();
        Ok(())
    }

    /// Intersect the clip with the current path.
    pub fn clip_preserve(&mut self) -> RasterResult<()> {
        let path = std::mem::take(&mut self.path);
        let result = self.clip_path(&path);
        self.path = path;
        result
    }

    /// Intersect the clip with a rectangle in user space.
    pub fn clip_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> RasterResult<()> {
        let path = rect_path(x, y, width, height)?;
        self.clip_path(&path)
    }

    /// Intersect the clip with `path` under the current fill rule.
    ///
    /// An empty path clips everything away.
    pub fn clip_path(&mut self, path: &Path) -> RasterResult<()> {
        log::debug!(target: "raster", "clip {:?}", self.state.fill_rule);
        let clip = self.sink.canvas_clip();
        self.rasterizer.fill_path(
            path,
            &self.state.matrix,
            self.state.fill_rule,
            &clip,
            &self.config,
            &mut self.fill_spans,
        )?;

        if self.state.clipping {
            self.clip_scratch
                .intersect(&self.fill_spans, &self.state.clip_spans)?;
            std::mem::swap(&mut self.state.clip_spans, &mut self.clip_scratch);
        } else {
            std::mem::swap(&mut self.state.clip_spans, &mut self.fill_spans);
            self.state.clipping = true;
        }
        log::trace!(
            target: "raster",
            "clip holds {} spans",
            self.state.clip_spans.spans().len()
        );
        Ok(())
    }

    /// Remove the clip.
    pub fn reset_clip(&mut self) {
        log::debug!(target: "raster", "reset_clip");
        self.state.clipping = false;
        self.state.clip_spans.clear();
    }

    // --- Drawing operations ---

    /// Fill the current path, then clear it.
    pub fn fill(&mut self) -> RasterResult<()> {
        self.fill_preserve()?;
        self.path.clear();
        Ok(())
    }

    /// Fill the current path and keep it.
    pub fn fill_preserve(&mut self) -> RasterResult<()> {
        let path = std::mem::take(&mut self.path);
        let result = self.fill_path(&path);
        self.path = path;
        result
    }

    /// Fill `path` with the current paint. The current path is not touched.
    pub fn fill_path(&mut self, path: &Path) -> RasterResult<()> {
        log::debug!(target: "raster", "fill {:?}", self.state.fill_rule);
        self.check_drawable(path)?;
        let clip = self.sink.canvas_clip();
        self.rasterizer.fill_path(
            path,
            &self.state.matrix,
            self.state.fill_rule,
            &clip,
            &self.config,
            &mut self.fill_spans,
        )?;
        self.blend_fill_spans()
    }

    /// Stroke the current path, then clear it.
    pub fn stroke(&mut self) -> RasterResult<()> {
        self.stroke_preserve()?;
        self.path.clear();
        Ok(())
    }

    /// Stroke the current path and keep it.
    pub fn stroke_preserve(&mut self) -> RasterResult<()> {
        let path = std::mem::take(&mut self.path);
        let result = self.stroke_path(&path);
        self.path = path;
        result
    }

    /// Stroke `path` with the current pen and paint.
    pub fn stroke_path(&mut self, path: &Path) -> RasterResult<()> {
        log::debug!(
            target: "raster",
            "stroke width={} dashed={}",
            self.state.stroke.width,
            self.state.stroke.is_dashed()
        );
        self.check_drawable(path)?;
        let clip = self.sink.canvas_clip();
        self.rasterizer.stroke_path(
            path,
            &self.state.matrix,
            &self.state.stroke,
            &clip,
            &self.config,
            &mut self.fill_spans,
        )?;
        self.blend_fill_spans()
    }

    /// Fill a rectangle in user space without touching the current path.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> RasterResult<()> {
        let path = rect_path(x, y, width, height)?;
        self.fill_path(&path)
    }

    /// Stroke a rectangle in user space without touching the current path.
    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> RasterResult<()> {
        let path = rect_path(x, y, width, height)?;
        self.stroke_path(&path)
    }

    /// Paint the whole clip region.
    pub fn paint(&mut self) -> RasterResult<()> {
        log::debug!(target: "raster", "paint");
        self.check_paint()?;
        if self.state.clipping {
            blend(
                &mut self.sink,
                &self.state.clip_spans,
                &self.state.paint,
                &self.state.matrix,
                self.state.opacity,
                self.state.operator,
            );
        } else {
            let clip = self.sink.canvas_clip();
            self.fill_spans.init_rect(&clip)?;
            blend(
                &mut self.sink,
                &self.fill_spans,
                &self.state.paint,
                &self.state.matrix,
                self.state.opacity,
                self.state.operator,
            );
        }
        Ok(())
    }

    // --- Queries ---

    /// Bounds of the current path in canvas coordinates.
    pub fn fill_extents(&self) -> Option<Rect> {
        let extents = self.path.extents(true)?;
        Some(self.state.matrix.map_rect(&extents))
    }

    /// Conservative bounds of the stroked current path in canvas coordinates.
    pub fn stroke_extents(&self) -> Option<Rect> {
        let style = &self.state.stroke;
        let mut cap_limit = style.width / 2.0;
        if style.cap == LineCap::Square {
            cap_limit *= std::f32::consts::SQRT_2;
        }
        let mut join_limit = style.width / 2.0;
        if style.join == LineJoin::Miter {
            join_limit *= style.miter_limit;
        }

        let extents = self.path.extents(true)?.inflate(cap_limit.max(join_limit));
        Some(self.state.matrix.map_rect(&extents))
    }

    /// Bounds of the clip in canvas coordinates.
    pub fn clip_extents(&self) -> Rect {
        let r = if self.state.clipping {
            self.state.clip_spans.extents()
        } else {
            self.sink.canvas_clip()
        };
        Rect::new(r.x as f32, r.y as f32, r.w as f32, r.h as f32)
    }

    // --- Helpers ---

    fn check_drawable(&self, path: &Path) -> RasterResult<()> {
        if path.is_empty() {
            return Err(RasterError::InvalidState(
                "Cannot draw an empty path".to_string(),
            ));
        }
        self.check_paint()
    }

    fn check_paint(&self) -> RasterResult<()> {
        match &self.state.paint {
            Paint::Gradient(gradient) if gradient.stops.is_empty() => Err(
                RasterError::InvalidState("Gradient has no color stops".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Composite `fill_spans`, restricted to the clip, with the current paint.
    fn blend_fill_spans(&mut self) -> RasterResult<()> {
        let spans = if self.state.clipping {
            self.clip_scratch
                .intersect(&self.fill_spans, &self.state.clip_spans)?;
            &self.clip_scratch
        } else {
            &self.fill_spans
        };
        blend(
            &mut self.sink,
            spans,
            &self.state.paint,
            &self.state.matrix,
            self.state.opacity,
            self.state.operator,
        );
        Ok(())
    }
}

fn rect_path(x: f32, y: f32, width: f32, height: f32) -> RasterResult<Path> {
    let mut path = Path::new();
    path.add_rect(&RectParams {
        x,
        y,
        width,
        height,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use crate::canvas::Canvas;
    use crate::color::Color;
    use crate::error::RasterError;
    use crate::geometry::{LinearGradientParams, RectParams};
    use crate::gradient::SpreadMethod;
    use crate::sink::DirectBuffer;

    fn pixel(data: &[u32], width: usize, x: usize, y: usize) -> u32 {
        data[y * width + x]
    }

    #[test]
    fn test_fill_rect_covers_pixels() {
        let mut data = vec![0u32; 64];
        {
            let mut canvas = Canvas::new(DirectBuffer::new(&mut data, 8, 8, 8).unwrap());
            canvas.set_color(Color::new(1.0, 0.0, 0.0, 1.0));
            canvas.fill_rect(2.0, 2.0, 4.0, 4.0).unwrap();
        }
        assert_eq!(pixel(&data, 8, 3, 3), 0xffff0000);
        assert_eq!(pixel(&data, 8, 5, 5), 0xffff0000);
        assert_eq!(pixel(&data, 8, 1, 1), 0);
        assert_eq!(pixel(&data, 8, 6, 6), 0);
    }

    #[test]
    fn test_fill_clears_path_but_preserve_keeps_it() {
        let mut data = vec![0u32; 64];
        let mut canvas = Canvas::new(DirectBuffer::new(&mut data, 8, 8, 8).unwrap());
        canvas
            .rect(&RectParams {
                x: 0.0,
                y: 0.0,
                width: 4.0,
                height: 4.0,
            })
            .unwrap();
        canvas.fill_preserve().unwrap();
        assert!(!canvas.path().is_empty());
        canvas.fill().unwrap();
        assert!(canvas.path().is_empty());
    }

    #[test]
    fn test_empty_path_and_missing_stops_are_invalid_state() {
        let mut data = vec![0u32; 16];
        let mut canvas = Canvas::new(DirectBuffer::new(&mut data, 4, 4, 4).unwrap());
        assert!(matches!(canvas.fill(), Err(RasterError::InvalidState(_))));
        assert!(matches!(canvas.stroke(), Err(RasterError::InvalidState(_))));

        canvas.set_linear_gradient(
            &LinearGradientParams {
                x1: 0.0,
                y1: 0.0,
                x2: 4.0,
                y2: 0.0,
            },
            SpreadMethod::Pad,
            &[],
        );
        assert!(matches!(
            canvas.fill_rect(0.0, 0.0, 4.0, 4.0),
            Err(RasterError::InvalidState(_))
        ));
        assert!(matches!(canvas.paint(), Err(RasterError::InvalidState(_))));
    }

    #[test]
    fn test_clip_restricts_paint() {
        let mut data = vec![0u32; 64];
        {
            let mut canvas = Canvas::new(DirectBuffer::new(&mut data, 8, 8, 8).unwrap());
            canvas.clip_rect(0.0, 0.0, 4.0, 8.0).unwrap();
            canvas.clip_rect(2.0, 0.0, 6.0, 8.0).unwrap();
            let extents = canvas.clip_extents();
            assert_eq!((extents.x, extents.w), (2.0, 2.0));
            canvas.set_color(Color::WHITE);
            canvas.paint().unwrap();
        }
        assert_eq!(pixel(&data, 8, 1, 0), 0);
        assert_eq!(pixel(&data, 8, 2, 4), 0xffffffff);
        assert_eq!(pixel(&data, 8, 3, 7), 0xffffffff);
        assert_eq!(pixel(&data, 8, 4, 4), 0);
    }

    #[test]
    fn test_restore_drops_clip() {
        let mut data = vec![0u32; 16];
        {
            let mut canvas = Canvas::new(DirectBuffer::new(&mut data, 4, 4, 4).unwrap());
            canvas.save();
            canvas.clip_rect(0.0, 0.0, 1.0, 1.0).unwrap();
            canvas.restore();
            canvas.set_color(Color::WHITE);
            canvas.paint().unwrap();
        }
        assert!(data.iter().all(|&p| p == 0xffffffff));
    }

    #[test]
    fn test_stroke_extents_include_pen() {
        let mut data = vec![0u32; 16];
        let mut canvas = Canvas::new(DirectBuffer::new(&mut data, 4, 4, 4).unwrap());
        canvas.move_to(0.0, 0.0).unwrap();
        canvas.line_to(10.0, 0.0).unwrap();
        canvas.set_line_width(2.0);
        canvas.set_line_join(crate::stroke::LineJoin::Bevel);
        let fill = canvas.fill_extents().unwrap();
        let stroke = canvas.stroke_extents().unwrap();
        assert_eq!((fill.x, fill.w, fill.h), (0.0, 10.0, 0.0));
        assert_eq!((stroke.x, stroke.y, stroke.w, stroke.h), (-1.0, -1.0, 12.0, 2.0));
    }
}
