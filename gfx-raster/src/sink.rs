//! Pixel destinations.
//!
//! The compositor talks to a [`PixelSink`] through two calls, `read` and
//! `write`, each covering a horizontal run of pixels in canvas coordinates.
//! The sink maps them onto its target (a memory buffer or a pair of
//! callbacks) after applying its offset and clip rectangle.

use crate::color::{premultiply_argb, unpremultiply_argb};
use crate::error::{RasterError, RasterResult};
use crate::geometry::IntRect;
use std::fmt;

/// A borrowed, fully addressable premultiplied ARGB32 pixel buffer.
pub struct DirectBuffer<'a> {
    data: &'a mut [u32],
    width: u32,
    height: u32,
    /// Row stride in pixels.
    stride: usize,
}

impl fmt::Debug for DirectBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish()
    }
}

impl<'a> DirectBuffer<'a> {
    /// Wrap `data` as a `width` x `height` image with `stride` pixels per row.
    pub fn new(data: &'a mut [u32], width: u32, height: u32, stride: usize) -> RasterResult<Self> {
        validate_size(width, height)?;
        if stride < width as usize {
            return Err(RasterError::InvalidArgument(format!(
                "Stride {} is smaller than width {}",
                stride, width
            )));
        }
        let needed = stride * (height as usize - 1) + width as usize;
        if data.len() < needed {
            return Err(RasterError::InvalidArgument(format!(
                "Buffer holds {} pixels, {}x{} with stride {} needs {}",
                data.len(),
                width,
                height,
                stride,
                needed
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u32] {
        &*self.data
    }

    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut *self.data
    }

    /// Pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y as usize * self.stride + x as usize).copied()
    }

    fn row(&self, y: i32) -> &[u32] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize]
    }

    fn row_mut(&mut self, y: i32) -> &mut [u32] {
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.width as usize]
    }

    /// Encode the buffer as an RGBA8 PNG, un-premultiplying every pixel.
    pub fn to_png(&self) -> RasterResult<Vec<u8>> {
        let mut rgba = Vec::new();
        rgba.try_reserve(self.width as usize * self.height as usize * 4)?;
        for y in 0..self.height as i32 {
            for &px in self.row(y) {
                let c = unpremultiply_argb(px);
                rgba.extend_from_slice(&[(c >> 16) as u8, (c >> 8) as u8, c as u8, (c >> 24) as u8]);
            }
        }

        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&rgba)?;
        }
        Ok(png_data)
    }
}

/// Reads the pixel at `(x, y)` of a callback target.
pub type ReadFn<'a> = Box<dyn FnMut(i32, i32) -> u32 + 'a>;
/// Fills a rectangle of a callback target with one color.
pub type WriteFn<'a> = Box<dyn FnMut(IntRect, u32) + 'a>;

/// A target reachable only through read/write callbacks.
///
/// Colors cross the callbacks as premultiplied ARGB32 unless
/// [`CallbackSink::with_straight_alpha`] is set.
pub struct CallbackSink<'a> {
    width: u32,
    height: u32,
    read: ReadFn<'a>,
    write: WriteFn<'a>,
    straight_alpha: bool,
}

impl fmt::Debug for CallbackSink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSink")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("straight_alpha", &self.straight_alpha)
            .finish()
    }
}

impl<'a> CallbackSink<'a> {
    pub fn new<R, W>(width: u32, height: u32, read: R, write: W) -> RasterResult<Self>
    where
        R: FnMut(i32, i32) -> u32 + 'a,
        W: FnMut(IntRect, u32) + 'a,
    {
        validate_size(width, height)?;
        Ok(Self {
            width,
            height,
            read: Box::new(read),
            write: Box::new(write),
            straight_alpha: false,
        })
    }

    /// Exchange straight-alpha ARGB32 with the callbacks.
    pub fn with_straight_alpha(mut self) -> Self {
        self.straight_alpha = true;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn read_pixel(&mut self, x: i32, y: i32) -> u32 {
        let c = (self.read)(x, y);
        if self.straight_alpha {
            premultiply_argb(c)
        } else {
            c
        }
    }

    fn write_run(&mut self, x: i32, y: i32, len: i32, color: u32) {
        let color = if self.straight_alpha {
            unpremultiply_argb(color)
        } else {
            color
        };
        (self.write)(IntRect::new(x, y, len, 1), color);
    }
}

fn validate_size(width: u32, height: u32) -> RasterResult<()> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidArgument(format!(
            "Sink size {}x{} is empty",
            width, height
        )));
    }
    if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
        return Err(RasterError::InvalidArgument(format!(
            "Sink size {}x{} is too large",
            width, height
        )));
    }
    Ok(())
}

/// The concrete destination behind a [`PixelSink`].
#[derive(Debug)]
pub enum SinkTarget<'a> {
    Direct(DirectBuffer<'a>),
    Callback(CallbackSink<'a>),
}

/// A destination plus the offset and clip applied to every access.
#[derive(Debug)]
pub struct PixelSink<'a> {
    target: SinkTarget<'a>,
    offset_x: i32,
    offset_y: i32,
    /// In target coordinates, always inside the target bounds.
    clip: IntRect,
}

impl<'a> From<DirectBuffer<'a>> for PixelSink<'a> {
    fn from(buffer: DirectBuffer<'a>) -> Self {
        PixelSink::new(SinkTarget::Direct(buffer))
    }
}

impl<'a> From<CallbackSink<'a>> for PixelSink<'a> {
    fn from(sink: CallbackSink<'a>) -> Self {
        PixelSink::new(SinkTarget::Callback(sink))
    }
}

impl<'a> PixelSink<'a> {
    pub fn new(target: SinkTarget<'a>) -> Self {
        let (w, h) = match &target {
            SinkTarget::Direct(b) => (b.width, b.height),
            SinkTarget::Callback(c) => (c.width, c.height),
        };
        Self {
            target,
            offset_x: 0,
            offset_y: 0,
            clip: IntRect::new(0, 0, w as i32, h as i32),
        }
    }

    /// Canvas pixel `(x, y)` lands on target pixel `(x + dx, y + dy)`.
    pub fn with_offset(mut self, dx: i32, dy: i32) -> Self {
        self.offset_x = dx;
        self.offset_y = dy;
        self
    }

    /// Restrict writes to `rect` (target coordinates), clamped to the target.
    pub fn set_clip(&mut self, rect: IntRect) {
        self.clip = rect.intersect(&self.bounds());
    }

    pub fn with_clip(mut self, rect: IntRect) -> Self {
        self.set_clip(rect);
        self
    }

    pub fn target(&self) -> &SinkTarget<'a> {
        &self.target
    }

    pub fn into_target(self) -> SinkTarget<'a> {
        self.target
    }

    pub fn width(&self) -> u32 {
        match &self.target {
            SinkTarget::Direct(b) => b.width,
            SinkTarget::Callback(c) => c.width,
        }
    }

    pub fn height(&self) -> u32 {
        match &self.target {
            SinkTarget::Direct(b) => b.height,
            SinkTarget::Callback(c) => c.height,
        }
    }

    pub fn offset(&self) -> (i32, i32) {
        (self.offset_x, self.offset_y)
    }

    /// Target bounds in target coordinates.
    pub fn bounds(&self) -> IntRect {
        IntRect::new(0, 0, self.width() as i32, self.height() as i32)
    }

    /// The writable area in canvas coordinates.
    pub fn canvas_clip(&self) -> IntRect {
        IntRect::new(
            self.clip.x - self.offset_x,
            self.clip.y - self.offset_y,
            self.clip.w,
            self.clip.h,
        )
    }

    /// Clip the run starting at canvas `(x, y)` with `len` pixels.
    ///
    /// Returns the target position of the first visible pixel and the
    /// visible index range within the run.
    fn clip_run(&self, x: i32, y: i32, len: usize) -> Option<(i32, i32, std::ops::Range<usize>)> {
        let ty = y + self.offset_y;
        if ty < self.clip.y || ty >= self.clip.bottom() {
            return None;
        }
        let tx = x + self.offset_x;
        let start = (self.clip.x - tx).max(0) as usize;
        let end = ((self.clip.right() - tx).max(0) as usize).min(len);
        if start >= end {
            return None;
        }
        Some((tx + start as i32, ty, start..end))
    }

    /// Read canvas pixels `(x..x + out.len(), y)`. Pixels outside the clip
    /// read as transparent.
    pub fn read(&mut self, x: i32, y: i32, out: &mut [u32]) {
        let Some((tx, ty, range)) = self.clip_run(x, y, out.len()) else {
            out.fill(0);
            return;
        };
        out[..range.start].fill(0);
        out[range.end..].fill(0);
        let visible = &mut out[range];
        match &mut self.target {
            SinkTarget::Direct(buffer) => {
                let row = buffer.row(ty);
                let tx = tx as usize;
                visible.copy_from_slice(&row[tx..tx + visible.len()]);
            }
            SinkTarget::Callback(sink) => {
                for (i, px) in visible.iter_mut().enumerate() {
                    *px = sink.read_pixel(tx + i as i32, ty);
                }
            }
        }
    }

    /// Write canvas pixels `(x..x + src.len(), y)`. Pixels outside the clip
    /// are dropped.
    pub fn write(&mut self, x: i32, y: i32, src: &[u32]) {
        let Some((tx, ty, range)) = self.clip_run(x, y, src.len()) else {
            return;
        };
        let visible = &src[range];
        match &mut self.target {
            SinkTarget::Direct(buffer) => {
                let row = buffer.row_mut(ty);
                let tx = tx as usize;
                row[tx..tx + visible.len()].copy_from_slice(visible);
            }
            SinkTarget::Callback(sink) => {
                // Runs of one color go out as a single rectangle
                let mut i = 0;
                while i < visible.len() {
                    let color = visible[i];
                    let start = i;
                    while i < visible.len() && visible[i] == color {
                        i += 1;
                    }
                    sink.write_run(tx + start as i32, ty, (i - start) as i32, color);
                }
            }
        }
    }

    /// Encode a direct-buffer target as PNG.
    pub fn to_png(&self) -> RasterResult<Vec<u8>> {
        match &self.target {
            SinkTarget::Direct(buffer) => buffer.to_png(),
            SinkTarget::Callback(_) => Err(RasterError::InvalidState(
                "PNG export needs a direct buffer sink".to_string(),
            )),
        }
    }
}
