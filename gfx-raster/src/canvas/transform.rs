//! Transform operations for Canvas.

use super::Canvas;
use crate::matrix::Matrix;

impl Canvas<'_> {
    /// Translate the user space.
    pub fn translate(&mut self, tx: f32, ty: f32) {
        log::debug!(target: "raster", "translate {} {}", tx, ty);
        self.state.matrix = self.state.matrix.pre_translate(tx, ty);
    }

    /// Scale the user space.
    pub fn scale(&mut self, sx: f32, sy: f32) {
        log::debug!(target: "raster", "scale {} {}", sx, sy);
        self.state.matrix = self.state.matrix.pre_scale(sx, sy);
    }

    /// Rotate the user space by `angle` radians.
    pub fn rotate(&mut self, angle: f32) {
        log::debug!(target: "raster", "rotate {}", angle);
        self.state.matrix = self.state.matrix.pre_rotate(angle);
    }

    /// Shear the user space.
    pub fn shear(&mut self, shx: f32, shy: f32) {
        log::debug!(target: "raster", "shear {} {}", shx, shy);
        self.state.matrix = self.state.matrix.pre_shear(shx, shy);
    }

    /// Apply `matrix` before the current transform.
    pub fn transform(&mut self, matrix: &Matrix) {
        log::debug!(target: "raster", "transform {:?}", matrix);
        self.state.matrix = matrix.then(&self.state.matrix);
    }

    /// Replace the current transform.
    pub fn set_matrix(&mut self, matrix: Matrix) {
        log::debug!(target: "raster", "set_matrix {:?}", matrix);
        self.state.matrix = matrix;
    }

    /// Reset the transform to identity.
    pub fn identity_matrix(&mut self) {
        self.state.matrix = Matrix::identity();
    }

    pub fn matrix(&self) -> Matrix {
        self.state.matrix
    }
}
