//! Colors and premultiplied ARGB32 pixel arithmetic.
//!
//! Pixels are `u32` values laid out as `0xAARRGGBB` with the color channels
//! already multiplied by alpha. The helpers work on two channels at a time
//! (`0x00RR00BB` and `0x00AA00GG`) inside one 32-bit word.

use crate::error::{RasterError, RasterResult};

/// Alpha channel of a packed pixel.
#[inline]
pub fn alpha(c: u32) -> u32 {
    c >> 24
}

/// Multiply every channel of `x` by `a / 255`.
#[inline]
pub fn byte_mul(x: u32, a: u32) -> u32 {
    let mut t = (x & 0xff00ff).wrapping_mul(a);
    t = (t.wrapping_add((t >> 8) & 0xff00ff).wrapping_add(0x800080)) >> 8;
    t &= 0xff00ff;

    let mut x = ((x >> 8) & 0xff00ff).wrapping_mul(a);
    x = x.wrapping_add((x >> 8) & 0xff00ff).wrapping_add(0x800080);
    x &= 0xff00ff00;
    x | t
}

/// `x * a / 255 + y * b / 255` per channel. Expects `a + b <= 255`.
#[inline]
pub fn interpolate_pixel(x: u32, a: u32, y: u32, b: u32) -> u32 {
    let mut t = (x & 0xff00ff)
        .wrapping_mul(a)
        .wrapping_add((y & 0xff00ff).wrapping_mul(b));
    t = (t.wrapping_add((t >> 8) & 0xff00ff).wrapping_add(0x800080)) >> 8;
    t &= 0xff00ff;

    let mut x = ((x >> 8) & 0xff00ff)
        .wrapping_mul(a)
        .wrapping_add(((y >> 8) & 0xff00ff).wrapping_mul(b));
    x = x.wrapping_add((x >> 8) & 0xff00ff).wrapping_add(0x800080);
    x &= 0xff00ff00;
    x | t
}

/// Exact `round(x / 255)` for `x <= 255 * 255`.
#[inline]
pub fn div255(x: u32) -> u32 {
    ((x + 1) * 257) >> 16
}

#[inline]
pub fn pack_argb(a: u32, r: u32, g: u32, b: u32) -> u32 {
    (a << 24) | (r << 16) | (g << 8) | b
}

/// Convert straight-alpha ARGB to premultiplied ARGB.
pub fn premultiply_argb(c: u32) -> u32 {
    let a = alpha(c);
    if a == 255 {
        return c;
    }
    let r = ((c >> 16) & 0xff) * a / 255;
    let g = ((c >> 8) & 0xff) * a / 255;
    let b = (c & 0xff) * a / 255;
    pack_argb(a, r, g, b)
}

/// Convert premultiplied ARGB to straight-alpha ARGB.
pub fn unpremultiply_argb(c: u32) -> u32 {
    let a = alpha(c);
    match a {
        0 => 0,
        255 => c,
        _ => {
            let r = (((c >> 16) & 0xff) * 255 / a).min(255);
            let g = (((c >> 8) & 0xff) * 255 / a).min(255);
            let b = ((c & 0xff) * 255 / a).min(255);
            pack_argb(a, r, g, b)
        }
    }
}

/// A straight-alpha color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Color from 8-bit channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Parse a CSS color string such as `"#ff8800"`, `"rgba(0,0,255,0.5)"` or `"teal"`.
    pub fn from_css(s: &str) -> RasterResult<Self> {
        let parsed = csscolorparser::parse(s)
            .map_err(|e| RasterError::ColorParse(format!("{}: {}", s, e)))?;
        let [r, g, b, a] = parsed.to_array();
        Ok(Self::new(r, g, b, a))
    }

    /// Channels clamped to `[0, 1]`; non-finite channels become 0.
    pub fn clamped(&self) -> Self {
        let c = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self::new(c(self.r), c(self.g), c(self.b), c(self.a))
    }

    /// Premultiplied ARGB32 of this color with its alpha scaled by `opacity`.
    pub fn premultiplied(&self, opacity: f32) -> u32 {
        let c = self.clamped();
        let opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let a = (c.a * opacity * 255.0).round() as u32;
        let r = (c.r * a as f32).round() as u32;
        let g = (c.g * a as f32).round() as u32;
        let b = (c.b * a as f32).round() as u32;
        pack_argb(a, r, g, b)
    }

    /// Straight-alpha ARGB32 of this color.
    pub fn to_argb(&self) -> u32 {
        let c = self.clamped();
        let q = |v: f32| (v * 255.0).round() as u32;
        pack_argb(q(c.a), q(c.r), q(c.g), q(c.b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0xffffffff, 255, 0xffffffff)]
    #[case(0xffffffff, 0, 0)]
    #[case(0xff804020, 128, 0x80402010)]
    #[case(0x12345678, 255, 0x12345678)]
    fn test_byte_mul(#[case] x: u32, #[case] a: u32, #[case] expected: u32) {
        assert_eq!(byte_mul(x, a), expected);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let red = 0xffff0000;
        let blue = 0xff0000ff;
        assert_eq!(interpolate_pixel(red, 255, blue, 0), red);
        assert_eq!(interpolate_pixel(red, 0, blue, 255), blue);
    }

    #[test]
    fn test_div255_exact() {
        for x in [0u32, 1, 127, 128, 255, 256, 32768, 65025] {
            assert_eq!(div255(x), (x as f32 / 255.0).round() as u32, "x={x}");
        }
    }

    #[test]
    fn test_premultiply_round_trip_opaque_and_clear() {
        assert_eq!(premultiply_argb(0xff123456), 0xff123456);
        assert_eq!(unpremultiply_argb(0xff123456), 0xff123456);
        assert_eq!(unpremultiply_argb(0x00000000), 0);
        assert_eq!(premultiply_argb(0x80ff0000), 0x80800000);
        assert_eq!(unpremultiply_argb(0x80800000), 0x80ff0000);
    }

    #[test]
    fn test_color_premultiplied() {
        assert_eq!(Color::BLACK.premultiplied(1.0), 0xff000000);
        assert_eq!(Color::new(1.0, 0.0, 0.0, 1.0).premultiplied(0.5), 0x80800000);
        assert_eq!(Color::WHITE.premultiplied(0.0), 0);
    }

    #[test]
    fn test_color_from_css() {
        let c = Color::from_css("#ff0000").unwrap();
        assert_eq!(c.premultiplied(1.0), 0xffff0000);
        let c = Color::from_css("rgba(0, 0, 255, 0.5)").unwrap();
        assert!((c.a - 0.5).abs() < 1e-6);
        assert!(matches!(
            Color::from_css("not-a-color"),
            Err(RasterError::ColorParse(_))
        ));
    }
}
