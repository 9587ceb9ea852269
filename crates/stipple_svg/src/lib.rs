//! SVG handling for Stipple
//!
//! Path data parsing, path geometry, single-primitive fragment extraction,
//! full-document loading through `usvg` and rasterization through `resvg`.
//!
//! # Example
//!
//! ```
//! use stipple_svg::{normalize, parse, serialize};
//!
//! let commands = parse("M0,0 L10,0 L10,10 Z");
//! let shape = normalize(&commands, 100.0);
//! assert_eq!(serialize(&shape.commands), "M0,0L100,0L100,100Z");
//! ```

mod document;
mod error;
mod geometry;
mod parser;
mod rasterize;
mod shape;

pub use document::{SvgDocument, SvgDrawCommand};
pub use error::SvgError;
pub use geometry::{
    bounding_box, bounding_box_of_points, normalize, rotated_bounding_box, serialize, to_path,
    BoundingBox, NormalizedShape,
};
pub use parser::{parse, Point64, SvgCommand};
pub use rasterize::RasterizedImage;
pub use shape::{
    extract_inner_svg, extract_main_shape, extract_rotation, extract_view_box, parse_points,
    parse_view_box, Attributes, ExtractedShape, ShapeTag, ViewBox,
};
