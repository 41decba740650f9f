//! Error types for gfx-raster.

use std::collections::TryReserveError;
use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Errors that can occur while building paths or rasterizing them.
///
/// Degenerate geometry (zero-height edges, empty contours, zero-length dash
/// patterns) is resolved locally and never reported here.
#[derive(Debug, Error)]
pub enum RasterError {
    /// Growing an edge array, active-edge pool or span buffer failed.
    #[error("Out of memory")]
    OutOfMemory,

    /// An argument was out of range (zero-sized sink, short buffer, bad stride).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not valid in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Failed to parse SVG path data.
    #[error("Failed to parse path data: {0}")]
    PathParse(String),

    /// Failed to parse a color value.
    #[error("Failed to parse color: {0}")]
    ColorParse(String),

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    Png(String),
}

impl From<TryReserveError> for RasterError {
    fn from(_: TryReserveError) -> Self {
        RasterError::OutOfMemory
    }
}

impl From<png::EncodingError> for RasterError {
    fn from(err: png::EncodingError) -> Self {
        RasterError::Png(err.to_string())
    }
}
