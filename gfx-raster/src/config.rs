//! Tunables shared by the flattener, stroker and rasterizer.

/// Tolerances used when turning curves into polylines.
///
/// All values are in device pixels. The defaults match what small displays
/// need: curves deviate from their polyline by at most half a pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterConfig {
    /// Flatness tolerance for cubic subdivision (compared against squared
    /// control point deviation).
    pub tess_tol: f32,
    /// Consecutive flattened points closer than this are merged.
    pub dist_tol: f32,
    /// Strokes thinner than this in device space are not drawn.
    pub min_stroke_width: f32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            tess_tol: 0.25,
            dist_tol: 0.01,
            min_stroke_width: 0.01,
        }
    }
}

impl RasterConfig {
    /// Tolerances for geometry processed in a space that is `scale` times
    /// smaller than device space (e.g. user space for strokes).
    pub(crate) fn scaled(&self, scale: f32) -> Self {
        if !(scale.is_finite() && scale > 0.0) || scale == 1.0 {
            return *self;
        }
        Self {
            tess_tol: self.tess_tol / (scale * scale),
            dist_tol: self.dist_tol / scale,
            min_stroke_width: self.min_stroke_width / scale,
        }
    }
}
