//! Error types for style validation, configuration loading and rendering

use std::io;

use stipple_svg::SvgError;
use thiserror::Error;

/// Module grid does not describe a usable QR symbol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("module grid is empty")]
    Empty,

    #[error("module grid is not square: row {row} has {len} modules, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("module kind table is {kinds}x{kinds}, grid is {size}x{size}")]
    KindMismatch { size: usize, kinds: usize },

    #[error("QR symbols have an odd module count, got {0}")]
    EvenSize(usize),

    #[error("QR symbols have at least 21 modules per side, got {0}")]
    TooSmall(usize),
}

/// Invalid style configuration, raised before any grid scan
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("invalid color {0:?}: expected #RGB, #RRGGBB or #AARRGGBB")]
    InvalidColor(String),

    #[error("invalid tile size {0:?}: expected WxH, e.g. \"2x2\"")]
    InvalidTileSize(String),

    #[error("tile size {0} has no assets")]
    EmptyTilePool(String),

    #[error("tile style needs at least one tile size")]
    NoTiles,

    #[error("grouping size {0} out of range 1..=5")]
    GroupSize(usize),

    #[error("line thickness {0} out of range (0, 1]")]
    LineThickness(f64),

    #[error("{0} fragment contains no path, rect, circle, ellipse, polygon, polyline or line")]
    MissingPrimitive(&'static str),

    #[error("{0} fragment has no drawable geometry")]
    UndrawablePrimitive(&'static str),

    #[error("logo size {0} out of range (0, 1)")]
    LogoSize(f64),

    #[error("logo margin {0} out of range [0, 0.5)")]
    LogoMargin(f64),

    #[error("asset name is empty")]
    EmptyAssetName,
}

/// Errors while loading or saving a style file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read style file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse style file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize style: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// A failed render, tagged with the stage that failed
#[derive(Error, Debug)]
pub enum RenderError {
    /// The module grid handed over by the encoder is unusable
    #[error("encoding: {0}")]
    Encoding(#[from] GridError),

    #[error("styling: {0}")]
    Styling(#[from] StyleError),

    #[error("compositing: {0}")]
    Compositing(#[from] SvgError),
}

impl RenderError {
    /// Short name of the failing stage
    pub fn stage(&self) -> &'static str {
        match self {
            RenderError::Encoding(_) => "encoding",
            RenderError::Styling(_) => "styling",
            RenderError::Compositing(_) => "compositing",
        }
    }
}
