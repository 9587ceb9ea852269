//! Render pipeline
//!
//! [`Renderer`] holds a validated style and an asset resolver. Each call to
//! [`Renderer::render`] validates the grid, groups and places modules with a
//! fresh asset cache, resolves fills and the logo, and returns a
//! [`Rendering`] that can be serialized to SVG, replayed onto any
//! [`DrawContext`] or rasterized.

use std::fmt::Write as _;

use stipple_core::{
    Affine2D, Brush, ClipShape, Color, CornerRadius, DrawContext, Gradient, ImageBrush,
    ImageOptions, LineCap, LineJoin, Path, Point, Rect, Stroke,
};
use stipple_svg::RasterizedImage;

use crate::assets::{AssetCache, AssetResolver, ResolvedAsset};
use crate::error::RenderError;
use crate::grid::{AvailabilityMask, ModuleGrid};
use crate::grouping::GroupingEngine;
use crate::logo::LogoGeometry;
use crate::placement::{fit_asset, fmt_num, Composer, LocalShape, Paint, RenderPrimitive};
use crate::random::RandomSource;
use crate::style::{EyeStyle, Fill, Style, StyleConfig};

const FOREGROUND_ID: &str = "stipple-fg";
const BACKGROUND_ID: &str = "stipple-bg";
const MODULES_MASK_ID: &str = "stipple-modules";
const LOGO_CLIP_ID: &str = "stipple-logo";

const FRAME_CAP: LineCap = LineCap::Square;
const FRAME_JOIN: LineJoin = LineJoin::Miter;

// ─────────────────────────────────────────────────────────────────────────────
// Paint
// ─────────────────────────────────────────────────────────────────────────────

/// A resolved fill, in module space
#[derive(Clone, Debug, PartialEq)]
pub enum FillPaint {
    Solid(Color),
    Gradient(Gradient),
    /// Image stretched over the view box
    Image { href: String },
}

impl FillPaint {
    pub fn brush(&self) -> Brush {
        match self {
            FillPaint::Solid(color) => Brush::Solid(*color),
            FillPaint::Gradient(gradient) => Brush::Gradient(gradient.clone()),
            FillPaint::Image { href } => Brush::Image(ImageBrush::new(href.clone())),
        }
    }

    fn resolve(
        fill: &Fill,
        view_box: Rect,
        assets: &mut AssetCache,
        fallback: Color,
    ) -> FillPaint {
        match fill {
            Fill::Solid(color) => FillPaint::Solid(*color),
            Fill::LinearGradient {
                start,
                end,
                direction,
            } => {
                let (from, to) = direction.unit_points();
                let map = |p: Point| {
                    Point::new(
                        view_box.x() + p.x * view_box.width(),
                        view_box.y() + p.y * view_box.height(),
                    )
                };
                FillPaint::Gradient(Gradient::linear(map(from), map(to), *start, *end))
            }
            Fill::Image { asset } => match assets.get(asset) {
                Some(ResolvedAsset::Image { href, .. }) => FillPaint::Image { href },
                Some(ResolvedAsset::Document(_)) => {
                    tracing::warn!(asset = %asset, "image fill needs a bitmap asset, using a solid fill");
                    FillPaint::Solid(fallback)
                }
                None => FillPaint::Solid(fallback),
            },
        }
    }

    /// `fill`/`stroke` attribute value plus opacity for `attr`
    fn svg_attrs(&self, attr: &str, id: &str) -> String {
        match self {
            FillPaint::Solid(color) if color.is_opaque() => {
                format!(r#" {attr}="{}""#, color.to_hex_rgb())
            }
            FillPaint::Solid(color) => format!(
                r#" {attr}="{}" {attr}-opacity="{}""#,
                color.to_hex_rgb(),
                fmt_num(color.a as f64)
            ),
            FillPaint::Gradient(_) | FillPaint::Image { .. } => {
                format!(r#" {attr}="url(#{id})""#)
            }
        }
    }

    fn definition(&self, id: &str, view_box: Rect) -> Option<Definition> {
        match self {
            FillPaint::Solid(_) => None,
            FillPaint::Gradient(gradient) => Some(Definition::LinearGradient {
                id: id.to_string(),
                gradient: gradient.clone(),
            }),
            FillPaint::Image { href } => Some(Definition::ImagePattern {
                id: id.to_string(),
                href: href.clone(),
                rect: view_box,
            }),
        }
    }
}

/// Entry of the SVG `<defs>` section
#[derive(Clone, Debug, PartialEq)]
pub enum Definition {
    LinearGradient { id: String, gradient: Gradient },
    ImagePattern { id: String, href: String, rect: Rect },
    ClipPath { id: String, path: Path },
}

impl Definition {
    pub fn id(&self) -> &str {
        match self {
            Definition::LinearGradient { id, .. }
            | Definition::ImagePattern { id, .. }
            | Definition::ClipPath { id, .. } => id,
        }
    }

    fn to_svg(&self) -> String {
        match self {
            Definition::LinearGradient { id, gradient } => {
                let Gradient::Linear {
                    start, end, stops, ..
                } = gradient;
                let mut out = format!(
                    r#"<linearGradient id="{id}" gradientUnits="userSpaceOnUse" x1="{}" y1="{}" x2="{}" y2="{}">"#,
                    fmt_num(start.x as f64),
                    fmt_num(start.y as f64),
                    fmt_num(end.x as f64),
                    fmt_num(end.y as f64)
                );
                for stop in stops {
                    let _ = write!(
                        out,
                        r#"<stop offset="{}" stop-color="{}""#,
                        fmt_num(stop.offset as f64),
                        stop.color.to_hex_rgb()
                    );
                    if !stop.color.is_opaque() {
                        let _ = write!(out, r#" stop-opacity="{}""#, fmt_num(stop.color.a as f64));
                    }
                    out.push_str("/>");
                }
                out.push_str("</linearGradient>");
                out
            }
            Definition::ImagePattern { id, href, rect } => format!(
                r#"<pattern id="{id}" patternUnits="userSpaceOnUse" {}><image href="{href}" {} preserveAspectRatio="none"/></pattern>"#,
                rect_attrs(*rect),
                rect_attrs(*rect)
            ),
            Definition::ClipPath { id, path } => format!(
                r#"<clipPath id="{id}"><path d="{}"/></clipPath>"#,
                path.to_svg_data()
            ),
        }
    }
}

fn rect_attrs(rect: Rect) -> String {
    format!(
        r#"x="{}" y="{}" width="{}" height="{}""#,
        fmt_num(rect.x() as f64),
        fmt_num(rect.y() as f64),
        fmt_num(rect.width() as f64),
        fmt_num(rect.height() as f64)
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// The logo drawn over the modules
#[derive(Clone, Debug)]
pub struct LogoLayer {
    pub geometry: LogoGeometry,
    /// The asset fitted into the logo rect
    pub primitive: RenderPrimitive,
}

/// Output of one render, in module units
#[derive(Clone, Debug)]
pub struct Rendering {
    /// Grid plus quiet zone; module `(0, 0)` is at the origin
    pub view_box: Rect,
    pub corner_radius: f32,
    pub background: FillPaint,
    pub foreground: FillPaint,
    pub primitives: Vec<RenderPrimitive>,
    pub defs: Vec<Definition>,
    pub logo: Option<LogoLayer>,
}

impl Rendering {
    /// Serialize as a standalone SVG document
    pub fn to_svg(&self) -> String {
        let vb = self.view_box;
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            fmt_num(vb.x() as f64),
            fmt_num(vb.y() as f64),
            fmt_num(vb.width() as f64),
            fmt_num(vb.height() as f64)
        );

        let solid = matches!(self.foreground, FillPaint::Solid(_));
        let (painted, own): (Vec<&RenderPrimitive>, Vec<&RenderPrimitive>) = self
            .primitives
            .iter()
            .partition(|p| p.paint != Paint::Own);

        let white = FillPaint::Solid(Color::WHITE);
        if !self.defs.is_empty() || !solid {
            svg.push_str("<defs>");
            for def in &self.defs {
                svg.push_str(&def.to_svg());
            }
            if !solid {
                // Gradient and image fills are painted through a mask of the
                // module shapes so their coordinates stay in module space
                let _ = write!(
                    svg,
                    r##"<mask id="{MODULES_MASK_ID}" maskUnits="userSpaceOnUse" {}><g fill="#ffffff">"##,
                    rect_attrs(vb)
                );
                for primitive in &painted {
                    svg.push_str(&primitive_svg(primitive, &white));
                }
                svg.push_str("</g></mask>");
            }
            svg.push_str("</defs>");
        }

        let radius = if self.corner_radius > 0.0 {
            let r = fmt_num(self.corner_radius as f64);
            format!(r#" rx="{r}" ry="{r}""#)
        } else {
            String::new()
        };
        let _ = write!(
            svg,
            "<rect {}{radius}{}/>",
            rect_attrs(vb),
            self.background.svg_attrs("fill", BACKGROUND_ID)
        );

        svg.push_str(r#"<g id="modules">"#);
        if solid {
            let _ = write!(svg, "<g{}>", self.foreground.svg_attrs("fill", FOREGROUND_ID));
            for primitive in &painted {
                svg.push_str(&primitive_svg(primitive, &self.foreground));
            }
            svg.push_str("</g>");
        } else {
            let _ = write!(
                svg,
                r#"<rect {}{} mask="url(#{MODULES_MASK_ID})"/>"#,
                rect_attrs(vb),
                self.foreground.svg_attrs("fill", FOREGROUND_ID)
            );
        }
        for primitive in &own {
            svg.push_str(&primitive_svg(primitive, &self.foreground));
        }
        svg.push_str("</g>");

        if let Some(logo) = &self.logo {
            let _ = write!(
                svg,
                r#"<path d="{}"{}/>"#,
                logo.geometry.holder_path.to_svg_data(),
                self.background.svg_attrs("fill", BACKGROUND_ID)
            );
            if let Some((frame, width)) = &logo.geometry.frame {
                let _ = write!(
                    svg,
                    r#"<path d="{}" fill="none"{} stroke-width="{}" stroke-linecap="{}" stroke-linejoin="{}"/>"#,
                    frame.to_svg_data(),
                    self.foreground.svg_attrs("stroke", FOREGROUND_ID),
                    fmt_num(*width as f64),
                    FRAME_CAP.as_svg(),
                    FRAME_JOIN.as_svg()
                );
            }
            let _ = write!(
                svg,
                r#"<g clip-path="url(#{LOGO_CLIP_ID})">{}</g>"#,
                primitive_svg(&logo.primitive, &self.foreground)
            );
        }

        svg.push_str("</svg>");
        svg
    }

    /// Replay onto a drawing surface at `module_px` pixels per module
    pub fn draw(&self, ctx: &mut dyn DrawContext, module_px: f32) {
        let vb = self.view_box;
        ctx.push_transform(
            Affine2D::scale(module_px, module_px)
                .then(&Affine2D::translation(-vb.x(), -vb.y())),
        );

        ctx.fill_rect(
            vb,
            CornerRadius::uniform(self.corner_radius),
            self.background.brush(),
        );
        for primitive in &self.primitives {
            draw_primitive(ctx, primitive, &self.foreground);
        }

        if let Some(logo) = &self.logo {
            ctx.fill_path(&logo.geometry.holder_path, self.background.brush());
            if let Some((frame, width)) = &logo.geometry.frame {
                let stroke = Stroke::new(*width)
                    .with_cap(FRAME_CAP)
                    .with_join(FRAME_JOIN);
                ctx.stroke_path(frame, &stroke, self.foreground.brush());
            }
            ctx.push_clip(ClipShape::Path(logo.geometry.logo_path.clone()));
            draw_primitive(ctx, &logo.primitive, &self.foreground);
            ctx.pop_clip();
        }

        ctx.pop_transform();
    }

    /// Rasterize to a square image `width_px` pixels wide
    pub fn rasterize(&self, width_px: u32) -> Result<RasterizedImage, RenderError> {
        Ok(RasterizedImage::from_str(&self.to_svg(), width_px, width_px)?)
    }
}

fn primitive_svg(primitive: &RenderPrimitive, foreground: &FillPaint) -> String {
    let mut attrs = format!(r#" transform="{}""#, primitive.transform.to_svg());
    if let Paint::Stroke { width } = primitive.paint {
        let _ = write!(
            attrs,
            r#" fill="none"{} stroke-width="{}""#,
            foreground.svg_attrs("stroke", FOREGROUND_ID),
            fmt_num(width)
        );
    }
    primitive.shape.to_svg_element(&attrs)
}

fn draw_primitive(ctx: &mut dyn DrawContext, primitive: &RenderPrimitive, foreground: &FillPaint) {
    let transform = primitive.transform.to_affine();
    match &primitive.shape {
        LocalShape::Document(doc) => {
            let vb = doc.view_box;
            ctx.push_transform(transform);
            doc.document.draw_into(
                ctx,
                Rect::new(
                    vb.min_x as f32,
                    vb.min_y as f32,
                    vb.width as f32,
                    vb.height as f32,
                ),
            );
            ctx.pop_transform();
        }
        LocalShape::Image {
            href,
            width,
            height,
        } => {
            let (w, h) = (*width as f32, *height as f32);
            ctx.push_transform(transform);
            ctx.draw_image(
                href,
                Rect::new(-w / 2.0, -h / 2.0, w, h),
                &ImageOptions::default(),
            );
            ctx.pop_transform();
        }
        shape => {
            let Some(path) = shape.to_path() else {
                return;
            };
            // Paths go out in module space so gradients line up across shapes
            let path = path.transformed(&transform);
            match primitive.paint {
                Paint::Stroke { width } => {
                    let (sx, sy) = primitive.transform.scale;
                    let stroke = Stroke::new((width * (sx.abs() + sy.abs()) / 2.0) as f32);
                    ctx.stroke_path(&path, &stroke, foreground.brush());
                }
                Paint::Fill | Paint::Own => ctx.fill_path(&path, foreground.brush()),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// Renders module grids in one style
pub struct Renderer<'r> {
    style: Style,
    resolver: &'r dyn AssetResolver,
}

impl<'r> Renderer<'r> {
    /// Validate `config` and build a renderer
    pub fn new(config: &StyleConfig, resolver: &'r dyn AssetResolver) -> Result<Self, RenderError> {
        Ok(Self::with_style(Style::from_config(config)?, resolver))
    }

    pub fn with_style(style: Style, resolver: &'r dyn AssetResolver) -> Self {
        Self { style, resolver }
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn render(
        &self,
        grid: &ModuleGrid,
        random: &mut dyn RandomSource,
    ) -> Result<Rendering, RenderError> {
        grid.validate()?;

        let mut assets = AssetCache::new(self.resolver);
        let eye = match &self.style.eye {
            EyeStyle::Asset { name } if assets.get(name).is_none() => {
                tracing::warn!(name = %name, "eye asset did not resolve, drawing square eyes");
                EyeStyle::Squares
            }
            eye => eye.clone(),
        };

        let engine = GroupingEngine::new(&self.style.dots, &eye);
        let composer = Composer::new(&self.style.dots, &eye)?;
        let mut mask = AvailabilityMask::for_grid(grid);
        let groups = engine.group(grid, &mut mask, random, &mut assets);

        let primitives: Vec<RenderPrimitive> = groups
            .iter()
            .flat_map(|group| &group.placements)
            .filter_map(|placement| composer.place(placement, &mut assets))
            .collect();

        let quiet_zone = self.style.backdrop.quiet_zone as f32;
        let side = grid.size() as f32 + 2.0 * quiet_zone;
        let view_box = Rect::new(-quiet_zone, -quiet_zone, side, side);

        let foreground =
            FillPaint::resolve(&self.style.foreground, view_box, &mut assets, Color::BLACK);
        let background =
            FillPaint::resolve(&self.style.background, view_box, &mut assets, Color::WHITE);

        let logo = self.style.logo.as_ref().and_then(|adjustment| {
            let Some(asset) = assets.get(&adjustment.asset) else {
                tracing::warn!(asset = %adjustment.asset, "skipping logo, asset did not resolve");
                return None;
            };
            let geometry = LogoGeometry::compute(adjustment, view_box, quiet_zone);
            let primitive = fit_asset(asset, geometry.logo);
            Some(LogoLayer {
                geometry,
                primitive,
            })
        });

        let mut defs: Vec<Definition> = [
            foreground.definition(FOREGROUND_ID, view_box),
            background.definition(BACKGROUND_ID, view_box),
        ]
        .into_iter()
        .flatten()
        .collect();
        if let Some(logo) = &logo {
            defs.push(Definition::ClipPath {
                id: LOGO_CLIP_ID.to_string(),
                path: logo.geometry.logo_path.clone(),
            });
        }

        tracing::debug!(
            size = grid.size(),
            groups = groups.len(),
            primitives = primitives.len(),
            assets = assets.len(),
            "rendered grid"
        );

        Ok(Rendering {
            view_box,
            corner_radius: self.style.backdrop.corner_radius as f32,
            background,
            foreground,
            primitives,
            defs,
            logo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MemoryAssets, NoAssets};
    use crate::error::{GridError, StyleError};
    use crate::grid::sample_symbol;
    use crate::random::SeededRandom;
    use crate::style::{DotConfig, EyeConfig, FillConfig, GradientDirection, LogoConfig};
    use stipple_core::{DrawCommand, RecordingContext, Size};

    const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><circle cx="5" cy="5" r="5" fill="#e11d48"/></svg>"##;

    fn render(config: &StyleConfig, assets: &dyn AssetResolver, seed: u64) -> Rendering {
        Renderer::new(config, assets)
            .unwrap()
            .render(&sample_symbol(21, seed), &mut SeededRandom::new(seed))
            .unwrap()
    }

    #[test]
    fn test_rejects_invalid_grid() {
        let renderer = Renderer::new(&StyleConfig::default(), &NoAssets).unwrap();
        let grid = ModuleGrid::with_finder_patterns(vec![vec![false; 22]; 22]).unwrap();

        let err = renderer
            .render(&grid, &mut SeededRandom::new(1))
            .unwrap_err();
        assert!(matches!(err, RenderError::Encoding(GridError::EvenSize(22))));
        assert_eq!(err.stage(), "encoding");
    }

    #[test]
    fn test_rejects_invalid_style() {
        let config = StyleConfig {
            foreground: FillConfig::Solid {
                color: "#12345".to_string(),
            },
            ..StyleConfig::default()
        };
        let err = Renderer::new(&config, &NoAssets).err().unwrap();
        assert!(matches!(err, RenderError::Styling(StyleError::InvalidColor(_))));
    }

    #[test]
    fn test_rejects_undrawable_eye() {
        let config = StyleConfig {
            eye: EyeConfig::Fragment {
                svg: r#"<path d=""/>"#.to_string(),
            },
            ..StyleConfig::default()
        };
        let err = Renderer::new(&config, &NoAssets).err().unwrap();
        assert_eq!(err.stage(), "styling");
        assert!(matches!(
            err,
            RenderError::Styling(StyleError::UndrawablePrimitive("eye"))
        ));

        // Hand-built styles skip validation and fail at render time
        let style = Style {
            eye: EyeStyle::Fragment {
                shape: stipple_svg::extract_main_shape(r#"<path d="zz"/>"#).unwrap(),
            },
            ..Style::default()
        };
        let err = Renderer::with_style(style, &NoAssets)
            .render(&sample_symbol(21, 3), &mut SeededRandom::new(3))
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Styling(StyleError::UndrawablePrimitive("eye"))
        ));
    }

    #[test]
    fn test_default_svg_structure() {
        let rendering = render(&StyleConfig::default(), &NoAssets, 4);
        let svg = rendering.to_svg();

        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-1 -1 23 23">"#));
        assert!(svg.contains(r##"<rect x="-1" y="-1" width="23" height="23" fill="#ffffff"/>"##));
        assert!(svg.contains(r##"<g id="modules"><g fill="#000000">"##));
        assert!(svg.ends_with("</g></g></svg>"));
        assert!(!svg.contains("<defs>"));

        // Three finder rings
        let rings = rendering
            .primitives
            .iter()
            .filter(|p| p.paint == Paint::Stroke { width: 1.0 })
            .count();
        assert_eq!(rings, 3);
        assert_eq!(svg.matches(r##"fill="none" stroke="#000000" stroke-width="1""##).count(), 3);
    }

    #[test]
    fn test_render_is_deterministic() {
        let config = StyleConfig {
            dots: DotConfig::Lines {
                direction: crate::style::LineDirection::DiagonalDown,
                cap: crate::style::LineCapStyle::Angular,
                thickness: 0.7,
            },
            ..StyleConfig::default()
        };
        let first = render(&config, &NoAssets, 9).to_svg();
        let second = render(&config, &NoAssets, 9).to_svg();
        assert_eq!(first, second);
    }

    #[test]
    fn test_gradient_foreground_uses_mask() {
        let config = StyleConfig {
            foreground: FillConfig::LinearGradient {
                start: "#1e3a8a".to_string(),
                end: "#9333ea".to_string(),
                direction: GradientDirection::LeftToRight,
            },
            backdrop: crate::style::BackdropConfig {
                quiet_zone: 2,
                corner_radius: 1.5,
            },
            ..StyleConfig::default()
        };
        let rendering = render(&config, &NoAssets, 2);

        let Some(Definition::LinearGradient { gradient, .. }) = rendering.defs.first() else {
            panic!("expected a gradient definition");
        };
        let Gradient::Linear { start, end, .. } = gradient;
        assert_eq!((start.x, start.y), (-2.0, 10.5));
        assert_eq!((end.x, end.y), (23.0, 10.5));

        let svg = rendering.to_svg();
        assert!(svg.contains(r#"<linearGradient id="stipple-fg" gradientUnits="userSpaceOnUse" x1="-2" y1="10.5" x2="23" y2="10.5">"#));
        assert!(svg.contains(r##"<mask id="stipple-modules" maskUnits="userSpaceOnUse" x="-2" y="-2" width="25" height="25"><g fill="#ffffff">"##));
        assert!(svg.contains(r#"mask="url(#stipple-modules)""#));
        assert!(svg.contains(r#"rx="1.5" ry="1.5""#));
    }

    #[test]
    fn test_unresolved_fill_and_eye_fall_back() {
        let config = StyleConfig {
            eye: EyeConfig::Asset {
                name: "missing-eye".to_string(),
            },
            background: FillConfig::Image {
                asset: "missing-paper".to_string(),
            },
            ..StyleConfig::default()
        };
        let rendering = render(&config, &NoAssets, 6);

        assert_eq!(rendering.background, FillPaint::Solid(Color::WHITE));
        let rings = rendering
            .primitives
            .iter()
            .filter(|p| matches!(p.paint, Paint::Stroke { .. }))
            .count();
        assert_eq!(rings, 3);
    }

    #[test]
    fn test_image_background_and_eye_asset() {
        let assets = MemoryAssets::new()
            .with_image("paper", "data:image/png;base64,AAAA", 4, 4)
            .with_svg("eye", LOGO);
        let config = StyleConfig {
            eye: EyeConfig::Asset {
                name: "eye".to_string(),
            },
            background: FillConfig::Image {
                asset: "paper".to_string(),
            },
            ..StyleConfig::default()
        };
        let rendering = render(&config, &assets, 8);

        assert!(matches!(rendering.background, FillPaint::Image { .. }));
        let eyes = rendering
            .primitives
            .iter()
            .filter(|p| p.paint == Paint::Own)
            .count();
        assert_eq!(eyes, 3);

        let svg = rendering.to_svg();
        assert!(svg.contains(r#"<pattern id="stipple-bg""#));
        assert!(svg.contains(r#"fill="url(#stipple-bg)""#));
    }

    #[test]
    fn test_logo_layers() {
        let assets = MemoryAssets::new().with_svg("brand", LOGO);
        let mut config = StyleConfig {
            logo: Some(LogoConfig {
                asset: "brand".to_string(),
                position: crate::style::LogoPosition::Center,
                style: crate::style::LogoShape::ScanAssistRoundedRect,
                size: 0.3,
                margin: 0.02,
            }),
            ..StyleConfig::default()
        };

        let rendering = render(&config, &assets, 3);
        let logo = rendering.logo.as_ref().unwrap();
        assert!(logo.geometry.frame.is_some());
        assert!(rendering.defs.iter().any(|d| d.id() == "stipple-logo"));

        let svg = rendering.to_svg();
        assert!(svg.contains(r#"<clipPath id="stipple-logo">"#));
        assert!(svg.contains(r#"stroke-linecap="square""#));
        assert!(svg.contains(r#"<g clip-path="url(#stipple-logo)"><g transform="#));

        config.logo.as_mut().unwrap().asset = "missing".to_string();
        let rendering = render(&config, &assets, 3);
        assert!(rendering.logo.is_none());
        assert!(rendering.defs.is_empty());
    }

    #[test]
    fn test_draw_replay() {
        let assets = MemoryAssets::new().with_svg("brand", LOGO);
        let config = StyleConfig {
            logo: Some(LogoConfig {
                asset: "brand".to_string(),
                position: crate::style::LogoPosition::Center,
                style: crate::style::LogoShape::Round,
                size: 0.2,
                margin: 0.02,
            }),
            ..StyleConfig::default()
        };
        let rendering = render(&config, &assets, 5);

        let mut ctx = RecordingContext::new(Size::new(230.0, 230.0));
        rendering.draw(&mut ctx, 10.0);
        let commands = ctx.commands();

        assert!(matches!(commands.first(), Some(DrawCommand::PushTransform(_))));
        assert!(matches!(commands.last(), Some(DrawCommand::PopTransform)));
        assert!(matches!(commands[1], DrawCommand::FillRect { .. }));
        assert_eq!(ctx.clip_depth(), 0);
        assert!(commands.iter().any(|c| matches!(c, DrawCommand::PushClip(_))));

        let strokes = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::StrokePath { .. }))
            .count();
        assert_eq!(strokes, 3);
        let pushes = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::PushTransform(_)))
            .count();
        let pops = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::PopTransform))
            .count();
        assert_eq!(pushes, pops);

        // Replaying the recording reproduces it
        let mut copy = RecordingContext::new(Size::new(230.0, 230.0));
        for command in commands {
            command.replay(&mut copy);
        }
        assert_eq!(copy.commands(), commands);
    }

    #[test]
    fn test_rasterize() {
        let rendering = render(&StyleConfig::default(), &NoAssets, 1);
        let image = rendering.rasterize(230).unwrap();
        assert_eq!(image.dimensions(), (230, 230));

        // Quiet zone is background
        let corner = image.pixel(2, 2).unwrap();
        assert!(corner[0] > 200 && corner[3] > 200);
        // Finder center module (3, 3) spans pixels 40..50
        let finder = image.pixel(45, 45).unwrap();
        assert!(finder[0] < 60 && finder[3] > 200);

        assert!(matches!(
            rendering.rasterize(0),
            Err(RenderError::Compositing(_))
        ));
    }
}
