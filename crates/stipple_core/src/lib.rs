//! Stipple Core
//!
//! Foundational types shared by the Stipple crates:
//!
//! - **Geometry**: points, sizes, rectangles and 2D affine transforms
//! - **Paint**: colors, gradients and brushes
//! - **Draw Context**: the drawing surface a rendered QR code is replayed onto
//!
//! # Example
//!
//! ```rust
//! use stipple_core::{Brush, Color, DrawContext, Path, Rect, RecordingContext, Size};
//!
//! let mut ctx = RecordingContext::new(Size::new(100.0, 100.0));
//! ctx.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0.into(), Color::BLACK.into());
//! ctx.fill_path(&Path::rect(Rect::new(10.0, 0.0, 10.0, 10.0)), Brush::Solid(Color::BLACK));
//! assert_eq!(ctx.commands().len(), 2);
//! ```

pub mod draw;
pub mod geometry;
pub mod paint;

pub use draw::{
    ClipShape, DrawCommand, DrawContext, ImageOptions, LineCap, LineJoin, Path, PathCommand,
    RecordingContext, Stroke,
};
pub use geometry::{Affine2D, Point, Rect, Size};
pub use paint::{Brush, Color, CornerRadius, Gradient, GradientSpace, GradientStop, ImageBrush};
