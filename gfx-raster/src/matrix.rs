//! Affine transformation matrix.

use crate::geometry::{Point, Rect};

/// A 2D affine transformation matrix.
///
/// The matrix is represented as:
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Scale X component.
    pub a: f32,
    /// Skew Y component.
    pub b: f32,
    /// Skew X component.
    pub c: f32,
    /// Scale Y component.
    pub d: f32,
    /// Translate X component.
    pub e: f32,
    /// Translate Y component.
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    /// Create a new matrix with the specified components.
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create an identity matrix.
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub const fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub const fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `angle` radians (clockwise on a y-down surface).
    pub fn rotation(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Shear by `shx`/`shy` radians along the x and y axes.
    pub fn shearing(shx: f32, shy: f32) -> Self {
        Self::new(1.0, shy.tan(), shx.tan(), 1.0, 0.0, 0.0)
    }

    /// The matrix that applies `self` first and then `next`.
    pub fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    /// Apply a translation in the local (pre-transform) coordinate system.
    pub fn pre_translate(&self, tx: f32, ty: f32) -> Matrix {
        Matrix::translation(tx, ty).then(self)
    }

    /// Apply a scale in the local coordinate system.
    pub fn pre_scale(&self, sx: f32, sy: f32) -> Matrix {
        Matrix::scaling(sx, sy).then(self)
    }

    /// Apply a rotation in the local coordinate system.
    pub fn pre_rotate(&self, angle: f32) -> Matrix {
        Matrix::rotation(angle).then(self)
    }

    /// Apply a shear in the local coordinate system.
    pub fn pre_shear(&self, shx: f32, shy: f32) -> Matrix {
        Matrix::shearing(shx, shy).then(self)
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// The inverse matrix, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Matrix {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// True when the matrix only translates.
    pub fn is_translation(&self) -> bool {
        self.a == 1.0 && self.b == 0.0 && self.c == 0.0 && self.d == 1.0
    }

    pub fn is_identity(&self) -> bool {
        self.is_translation() && self.e == 0.0 && self.f == 0.0
    }

    /// Average linear scale of the matrix (square root of the area factor).
    pub fn scale_factor(&self) -> f32 {
        self.determinant().abs().sqrt()
    }

    pub fn map_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Bounding box of the transformed rectangle.
    pub fn map_rect(&self, r: &Rect) -> Rect {
        let corners = [
            Point::new(r.x, r.y),
            Point::new(r.x + r.w, r.y),
            Point::new(r.x + r.w, r.y + r.h),
            Point::new(r.x, r.y + r.h),
        ];
        Rect::from_points(corners.iter().map(|p| self.map_point(*p))).unwrap_or_default()
    }
}
