//! SVG error types

use thiserror::Error;

/// Errors from parsing or rasterizing SVG documents
#[derive(Error, Debug)]
pub enum SvgError {
    /// SVG parsing error
    #[error("SVG parsing error: {0}")]
    Parse(String),

    /// Raster target with a zero dimension
    #[error("invalid raster dimensions {width}x{height}: width and height must be > 0")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixmap allocation or rendering failure
    #[error("rasterization failed: {0}")]
    Raster(String),
}
