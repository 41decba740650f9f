//! Drawing state that can be saved and restored.

use crate::blend::Operator;
use crate::matrix::Matrix;
use crate::paint::Paint;
use crate::rasterizer::FillRule;
use crate::span::SpanBuffer;
use crate::stroke::StrokeStyle;

/// Drawing state that can be saved and restored.
#[derive(Debug, Clone)]
pub struct CanvasState {
    /// User space to canvas space.
    pub matrix: Matrix,
    /// Fill rule used by fill and clip.
    pub fill_rule: FillRule,
    /// Compositing operator.
    pub operator: Operator,
    /// Global opacity in `[0, 1]`.
    pub opacity: f32,
    /// Pen used by stroke.
    pub stroke: StrokeStyle,
    /// Current paint source.
    pub paint: Paint,
    /// Clip coverage in canvas coordinates. Only meaningful while `clipping`.
    pub clip_spans: SpanBuffer,
    /// Whether a clip has been set.
    pub clipping: bool,
    /// Font size handed to glyph producers.
    pub font_size: f32,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            matrix: Matrix::identity(),
            fill_rule: FillRule::default(),
            operator: Operator::default(),
            opacity: 1.0,
            stroke: StrokeStyle::default(),
            paint: Paint::default(),
            clip_spans: SpanBuffer::new(),
            clipping: false,
            font_size: 12.0,
        }
    }
}
