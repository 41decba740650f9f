//! Raster texture paint.

use crate::error::{RasterError, RasterResult};
use crate::matrix::Matrix;
use std::fmt;
use std::sync::Arc;

/// One in 16.16 fixed point.
const FIXED_SCALE: f32 = 65536.0;

/// Texture addressing outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureType {
    /// Pixels outside the image are not drawn (or transparent under a
    /// general transform).
    #[default]
    Plain,
    /// Coordinates wrap around the image in both directions.
    Tiled,
}

/// Where texture pixels come from. Pixels are premultiplied ARGB32.
#[derive(Clone)]
pub enum TextureSource {
    /// Row-major pixels; `stride` is in pixels.
    Direct { data: Arc<[u32]>, stride: usize },
    /// A sampler called with in-bounds image coordinates.
    Callback(Arc<dyn Fn(i32, i32) -> u32 + Send + Sync>),
}

impl fmt::Debug for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureSource::Direct { data, stride } => f
                .debug_struct("Direct")
                .field("len", &data.len())
                .field("stride", stride)
                .finish(),
            TextureSource::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// A texture paint.
#[derive(Debug, Clone)]
pub struct Texture {
    width: i32,
    height: i32,
    source: TextureSource,
    pub texture_type: TextureType,
    /// Texture space to user space.
    pub matrix: Matrix,
    pub opacity: f32,
}

impl Texture {
    /// Create a texture over premultiplied ARGB32 pixels.
    pub fn from_pixels(
        data: impl Into<Arc<[u32]>>,
        width: u32,
        height: u32,
        stride: usize,
    ) -> RasterResult<Self> {
        let data = data.into();
        let (w, h) = validate_size(width, height)?;
        if stride < width as usize {
            return Err(RasterError::InvalidArgument(format!(
                "Texture stride {} is smaller than width {}",
                stride, width
            )));
        }
        let needed = stride * (height as usize - 1) + width as usize;
        if data.len() < needed {
            return Err(RasterError::InvalidArgument(format!(
                "Texture data holds {} pixels, {}x{} with stride {} needs {}",
                data.len(),
                width,
                height,
                stride,
                needed
            )));
        }
        Ok(Self::with_source(w, h, TextureSource::Direct { data, stride }))
    }

    /// Create a texture whose pixels are produced by `sampler(x, y)`.
    pub fn from_callback<F>(width: u32, height: u32, sampler: F) -> RasterResult<Self>
    where
        F: Fn(i32, i32) -> u32 + Send + Sync + 'static,
    {
        let (w, h) = validate_size(width, height)?;
        Ok(Self::with_source(
            w,
            h,
            TextureSource::Callback(Arc::new(sampler)),
        ))
    }

    fn with_source(width: i32, height: i32, source: TextureSource) -> Self {
        Self {
            width,
            height,
            source,
            texture_type: TextureType::default(),
            matrix: Matrix::identity(),
            opacity: 1.0,
        }
    }

    pub fn with_type(mut self, texture_type: TextureType) -> Self {
        self.texture_type = texture_type;
        self
    }

    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        if opacity.is_finite() {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        self
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    /// Pixel at in-bounds coordinates.
    fn pixel(&self, x: i32, y: i32) -> u32 {
        match &self.source {
            TextureSource::Direct { data, stride } => {
                data.get(y as usize * stride + x as usize).copied().unwrap_or(0)
            }
            TextureSource::Callback(sampler) => sampler(x, y),
        }
    }

    /// Resolve the texture for drawing under `ctm` with the state `opacity`.
    ///
    /// Returns `None` when the combined matrix cannot be inverted or the
    /// texture is fully transparent.
    pub(crate) fn prepare(&self, ctm: &Matrix, opacity: f32) -> Option<TextureShader<'_>> {
        let inverse = self.matrix.then(ctm).invert()?;
        let const_alpha = (opacity * self.opacity * 256.0).round().clamp(0.0, 256.0) as u32;
        if const_alpha == 0 {
            return None;
        }
        Some(TextureShader {
            texture: self,
            inverse,
            const_alpha,
        })
    }
}

fn validate_size(width: u32, height: u32) -> RasterResult<(i32, i32)> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidArgument(format!(
            "Texture size {}x{} is empty",
            width, height
        )));
    }
    let w = i32::try_from(width)
        .map_err(|_| RasterError::InvalidArgument(format!("Texture width {} too large", width)))?;
    let h = i32::try_from(height)
        .map_err(|_| RasterError::InvalidArgument(format!("Texture height {} too large", height)))?;
    Ok((w, h))
}

/// A texture ready to produce device pixels.
#[derive(Debug)]
pub(crate) struct TextureShader<'a> {
    texture: &'a Texture,
    /// Device space to texture space.
    inverse: Matrix,
    /// Opacity in `[0, 256]`, applied to coverage.
    const_alpha: u32,
}

impl TextureShader<'_> {
    /// Coverage after applying the texture's constant alpha.
    pub(crate) fn scale_coverage(&self, coverage: u8) -> u32 {
        (coverage as u32 * self.const_alpha) >> 8
    }

    /// Sample pixels `(x..x + out.len(), y)` into `out`.
    ///
    /// Returns the sub-range of `out` that should be composited. Only an
    /// untranslated plain texture yields less than the full range; pixels
    /// outside the image are then left untouched.
    pub(crate) fn fetch(&self, x: i32, y: i32, out: &mut [u32]) -> std::ops::Range<usize> {
        let tex = self.texture;
        let inv = &self.inverse;
        let len = out.len();

        if inv.is_translation() {
            // Pixel centres land on texel floor(x + 0.5 + e), as in the general path
            let xoff = (inv.e + 0.5).floor() as i32;
            let yoff = (inv.f + 0.5).floor() as i32;
            return match tex.texture_type {
                TextureType::Plain => {
                    let sy = yoff + y;
                    let sx = xoff + x;
                    if sy < 0 || sy >= tex.height || sx >= tex.width {
                        return 0..0;
                    }
                    let skip = (-sx).max(0) as usize;
                    if skip >= len {
                        return 0..0;
                    }
                    let start_sx = sx.max(0);
                    let count = (len - skip).min((tex.width - start_sx) as usize);
                    for (i, px) in out[skip..skip + count].iter_mut().enumerate() {
                        *px = tex.pixel(start_sx + i as i32, sy);
                    }
                    skip..skip + count
                }
                TextureType::Tiled => {
                    let sy = (yoff + y).rem_euclid(tex.height);
                    let mut sx = (xoff + x).rem_euclid(tex.width);
                    for px in out.iter_mut() {
                        *px = tex.pixel(sx, sy);
                        sx += 1;
                        if sx == tex.width {
                            sx = 0;
                        }
                    }
                    0..len
                }
            };
        }

        let fdx = (inv.a * FIXED_SCALE) as i32;
        let fdy = (inv.b * FIXED_SCALE) as i32;
        let cx = x as f32 + 0.5;
        let cy = y as f32 + 0.5;
        let mut fx = ((inv.c * cy + inv.a * cx + inv.e) * FIXED_SCALE) as i32;
        let mut fy = ((inv.d * cy + inv.b * cx + inv.f) * FIXED_SCALE) as i32;

        for px in out.iter_mut() {
            let sx = fx >> 16;
            let sy = fy >> 16;
            *px = match tex.texture_type {
                TextureType::Plain => {
                    if sx < 0 || sx >= tex.width || sy < 0 || sy >= tex.height {
                        0
                    } else {
                        tex.pixel(sx, sy)
                    }
                }
                TextureType::Tiled => {
                    tex.pixel(sx.rem_euclid(tex.width), sy.rem_euclid(tex.height))
                }
            };
            fx = fx.wrapping_add(fdx);
            fy = fy.wrapping_add(fdy);
        }
        0..len
    }
}
