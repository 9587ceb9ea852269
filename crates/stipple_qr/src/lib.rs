//! Stipple QR
//!
//! Renders a QR module grid in a custom style. The encoder's output (dark
//! modules plus a structural classification) goes through three stages:
//!
//! - **Grouping**: dark modules are merged into blocks, line runs or asset
//!   tiles while finder patterns stay intact
//! - **Placement**: every group becomes local geometry plus one transform
//! - **Output**: the primitives, fills, backdrop and logo are serialized to
//!   SVG, replayed onto a [`stipple_core::DrawContext`] or rasterized
//!
//! Styles are loaded from TOML ([`StyleConfig`]) and validated once
//! ([`Style`]). Randomness (asset selection) only comes from an injected
//! [`RandomSource`].
//!
//! # Example
//!
//! ```rust
//! use stipple_qr::{ModuleGrid, NoAssets, Renderer, SeededRandom, StyleConfig};
//!
//! let style = StyleConfig::from_toml_str(
//!     r#"
//!     [dots]
//!     kind = "lines"
//!     direction = "vertical"
//!     "#,
//! )
//! .unwrap();
//!
//! let grid = ModuleGrid::with_finder_patterns(vec![vec![true; 21]; 21]).unwrap();
//! let renderer = Renderer::new(&style, &NoAssets).unwrap();
//! let rendering = renderer.render(&grid, &mut SeededRandom::new(7)).unwrap();
//!
//! assert!(rendering.to_svg().starts_with("<svg"));
//! ```

mod assets;
mod config;
mod error;
mod grid;
mod grouping;
mod logo;
mod placement;
mod random;
mod render;
mod style;

pub use assets::{
    Asset, AssetCache, AssetGate, AssetResolver, DirectoryAssets, DocumentAsset, MemoryAssets,
    NoAssets, ResolvedAsset,
};
pub use error::{ConfigError, GridError, RenderError, StyleError};
pub use grid::{finder_centers, AvailabilityMask, ModuleGrid, ModuleKind};
pub use grouping::{GroupingEngine, ModuleGroup, Placement, RunEnd, ShapeKind};
pub use logo::{scan_assist_frame, LogoGeometry};
pub use placement::{Composer, LocalShape, Paint, RenderPrimitive, ShapeTransform};
pub use random::{FixedSequence, RandomSource, SeededRandom};
pub use render::{Definition, FillPaint, LogoLayer, Renderer, Rendering};
pub use style::{
    Backdrop, BackdropConfig, DotConfig, DotStyle, EyeConfig, EyeStyle, Fill, FillConfig,
    FragmentGrouping, GradientDirection, LineCapStyle, LineDirection, LogoAdjustment, LogoConfig,
    LogoPosition, LogoShape, Style, StyleConfig, TileSize,
};
