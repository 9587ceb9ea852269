//! Shape placement
//!
//! Turns a [`Placement`] into a [`RenderPrimitive`]: local geometry plus one
//! `translate · scale · rotate · translate(-origin)` transform that maps it
//! onto its block of modules. Procedural shapes (blocks, caps, finder parts)
//! are built directly around the origin; fragments and assets are measured
//! once and fitted into every target block.

use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt::Write as _;
use std::sync::Arc;

use stipple_core::{Affine2D, Path, Point, Rect};
use stipple_svg::{
    bounding_box_of_points, normalize, parse, rotated_bounding_box, serialize, to_path,
    ExtractedShape, Point64, ShapeTag, SvgCommand,
};

use crate::assets::{AssetCache, DocumentAsset, ResolvedAsset};
use crate::error::StyleError;
use crate::grouping::{Placement, RunEnd, ShapeKind};
use crate::style::{DotStyle, EyeStyle, LineCapStyle, LineDirection};

/// Control point distance for a quarter circle drawn as one cubic
const KAPPA: f64 = 0.552_284_749_8;

/// Side length path fragments are normalized to
const NORMALIZED_SIZE: f64 = 100.0;

// ─────────────────────────────────────────────────────────────────────────────
// Transform
// ─────────────────────────────────────────────────────────────────────────────

/// `translate(translate) scale(scale) rotate(rotate_deg) translate(-origin)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeTransform {
    pub translate: (f64, f64),
    pub scale: (f64, f64),
    pub rotate_deg: f64,
    pub origin: (f64, f64),
}

impl Default for ShapeTransform {
    fn default() -> Self {
        Self {
            translate: (0.0, 0.0),
            scale: (1.0, 1.0),
            rotate_deg: 0.0,
            origin: (0.0, 0.0),
        }
    }
}

impl ShapeTransform {
    /// Unscaled, unrotated shape centered at `(x, y)`
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            translate: (x, y),
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotate_deg = degrees;
        self
    }

    /// SVG transform list; zero rotation and a zero origin are left out
    pub fn to_svg(&self) -> String {
        let mut out = format!(
            "translate({},{}) scale({},{})",
            fmt_num(self.translate.0),
            fmt_num(self.translate.1),
            fmt_scale(self.scale.0),
            fmt_scale(self.scale.1)
        );
        if fmt_num(self.rotate_deg) != "0" {
            let _ = write!(out, " rotate({})", fmt_num(self.rotate_deg));
        }
        if fmt_num(self.origin.0) != "0" || fmt_num(self.origin.1) != "0" {
            let _ = write!(
                out,
                " translate({},{})",
                fmt_num(-self.origin.0),
                fmt_num(-self.origin.1)
            );
        }
        out
    }

    pub fn to_affine(&self) -> Affine2D {
        Affine2D::translation(self.translate.0 as f32, self.translate.1 as f32)
            .then(&Affine2D::scale(self.scale.0 as f32, self.scale.1 as f32))
            .then(&Affine2D::rotation_degrees(self.rotate_deg as f32))
            .then(&Affine2D::translation(
                -self.origin.0 as f32,
                -self.origin.1 as f32,
            ))
    }

    /// Map a local point to module space
    pub fn apply(&self, p: Point64) -> Point64 {
        let (x, y) = (p.x - self.origin.0, p.y - self.origin.1);
        let (sin, cos) = self.rotate_deg.to_radians().sin_cos();
        let (x, y) = (x * cos - y * sin, x * sin + y * cos);
        Point64::new(
            x * self.scale.0 + self.translate.0,
            y * self.scale.1 + self.translate.1,
        )
    }
}

/// Format a scale factor keeping about five significant digits, so large
/// viewBoxes shrunk into a module never collapse to zero
fn fmt_scale(v: f64) -> String {
    if v == 0.0 || !v.is_finite() {
        return "0".to_string();
    }
    let decimals = (4 - v.abs().log10().floor() as i32).clamp(4, 12);
    let factor = 10f64.powi(decimals);
    format!("{}", (v * factor).round() / factor)
}

/// Format a coordinate for SVG output, rounded to 1e-4
pub(crate) fn fmt_num(v: f64) -> String {
    let rounded = (v * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 || !rounded.is_finite() {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Primitives
// ─────────────────────────────────────────────────────────────────────────────

/// Geometry in a primitive's local frame
#[derive(Clone, Debug)]
pub enum LocalShape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
        ry: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Polygon {
        points: Vec<Point64>,
        closed: bool,
    },
    Line {
        from: Point64,
        to: Point64,
    },
    Path(Vec<SvgCommand>),
    /// SVG asset drawn in its own viewBox units
    Document(Arc<DocumentAsset>),
    /// Bitmap asset centered on the origin
    Image {
        href: String,
        width: f64,
        height: f64,
    },
}

impl LocalShape {
    fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        LocalShape::Rect {
            x,
            y,
            width,
            height,
            rx: 0.0,
            ry: 0.0,
        }
    }

    /// Outline as a drawing path; assets have none
    pub fn to_path(&self) -> Option<Path> {
        let pt = |p: Point64| Point::new(p.x as f32, p.y as f32);
        let path = match self {
            LocalShape::Rect {
                x,
                y,
                width,
                height,
                rx,
                ..
            } => {
                let rect = Rect::new(*x as f32, *y as f32, *width as f32, *height as f32);
                if *rx > 0.0 {
                    Path::rounded_rect(rect, *rx as f32)
                } else {
                    Path::rect(rect)
                }
            }
            LocalShape::Circle { cx, cy, r } => {
                Path::circle(Point::new(*cx as f32, *cy as f32), *r as f32)
            }
            LocalShape::Ellipse { cx, cy, rx, ry } => {
                Path::ellipse(Point::new(*cx as f32, *cy as f32), *rx as f32, *ry as f32)
            }
            LocalShape::Polygon { points, closed } => {
                let points: Vec<Point> = points.iter().map(|p| pt(*p)).collect();
                Path::polygon(&points, *closed)
            }
            LocalShape::Line { from, to } => Path::line(pt(*from), pt(*to)),
            LocalShape::Path(commands) => to_path(commands),
            LocalShape::Document(_) | LocalShape::Image { .. } => return None,
        };
        Some(path)
    }

    /// SVG element with `attrs` appended to the element's attributes
    pub fn to_svg_element(&self, attrs: &str) -> String {
        match self {
            LocalShape::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                let mut el = format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}""#,
                    fmt_num(*x),
                    fmt_num(*y),
                    fmt_num(*width),
                    fmt_num(*height)
                );
                if *rx > 0.0 || *ry > 0.0 {
                    let _ = write!(el, r#" rx="{}" ry="{}""#, fmt_num(*rx), fmt_num(*ry));
                }
                format!("{el}{attrs}/>")
            }
            LocalShape::Circle { cx, cy, r } => format!(
                r#"<circle cx="{}" cy="{}" r="{}"{attrs}/>"#,
                fmt_num(*cx),
                fmt_num(*cy),
                fmt_num(*r)
            ),
            LocalShape::Ellipse { cx, cy, rx, ry } => format!(
                r#"<ellipse cx="{}" cy="{}" rx="{}" ry="{}"{attrs}/>"#,
                fmt_num(*cx),
                fmt_num(*cy),
                fmt_num(*rx),
                fmt_num(*ry)
            ),
            LocalShape::Polygon { points, closed } => {
                let tag = if *closed { "polygon" } else { "polyline" };
                let points: Vec<String> = points
                    .iter()
                    .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
                    .collect();
                format!(r#"<{tag} points="{}"{attrs}/>"#, points.join(" "))
            }
            LocalShape::Line { from, to } => format!(
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{attrs}/>"#,
                fmt_num(from.x),
                fmt_num(from.y),
                fmt_num(to.x),
                fmt_num(to.y)
            ),
            LocalShape::Path(commands) => {
                format!(r#"<path d="{}"{attrs}/>"#, serialize(commands))
            }
            LocalShape::Document(doc) => format!("<g{attrs}>{}</g>", doc.inner),
            LocalShape::Image {
                href,
                width,
                height,
            } => format!(
                r#"<image href="{href}" x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none"{attrs}/>"#,
                fmt_num(-width / 2.0),
                fmt_num(-height / 2.0),
                fmt_num(*width),
                fmt_num(*height)
            ),
        }
    }
}

/// How a primitive is painted
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Paint {
    /// Filled with the foreground fill
    Fill,
    /// Stroked with the foreground fill, width in local units
    Stroke { width: f64 },
    /// Asset keeps its own paint
    Own,
}

/// A shape ready to draw
#[derive(Clone, Debug)]
pub struct RenderPrimitive {
    pub shape: LocalShape,
    pub transform: ShapeTransform,
    pub paint: Paint,
}

// ─────────────────────────────────────────────────────────────────────────────
// Fragments
// ─────────────────────────────────────────────────────────────────────────────

/// An extracted primitive measured for fitting
#[derive(Clone, Debug)]
struct Fragment {
    shape: LocalShape,
    /// Natural size that is stretched over the target block
    extent: (f64, f64),
    rotate_deg: f64,
    origin: (f64, f64),
    paint: Paint,
}

impl Fragment {
    fn prepare(shape: &ExtractedShape) -> Option<Self> {
        let attrs = &shape.attributes;
        let fragment = match shape.tag {
            ShapeTag::Path => {
                let commands = parse(shape.path_data()?);
                let draws = commands
                    .iter()
                    .any(|c| !matches!(c, SvgCommand::Move(_) | SvgCommand::Close));
                if !draws {
                    tracing::warn!("path fragment has no drawable segments");
                    return None;
                }
                let normalized = normalize(&commands, NORMALIZED_SIZE);
                let center = normalized.bounds.center();
                Fragment {
                    shape: LocalShape::Path(normalized.commands),
                    extent: (NORMALIZED_SIZE, NORMALIZED_SIZE),
                    rotate_deg: 0.0,
                    origin: (center.x, center.y),
                    paint: Paint::Fill,
                }
            }
            ShapeTag::Rect => {
                let width = attrs.numeric("width", 0.0);
                let height = attrs.numeric("height", 0.0);
                let rx = attrs.numeric("rx", 0.0);
                let ry = attrs.numeric("ry", rx);
                let rotate_deg = attrs.rotation("transform");
                let (rw, rh) = rotated_bounding_box(width, height, rotate_deg);
                let size = rw.max(rh);
                Fragment {
                    shape: LocalShape::Rect {
                        x: -width / 2.0,
                        y: -height / 2.0,
                        width,
                        height,
                        rx,
                        ry,
                    },
                    extent: (size, size),
                    rotate_deg,
                    origin: (0.0, 0.0),
                    paint: Paint::Fill,
                }
            }
            ShapeTag::Circle => {
                let r = attrs.numeric("r", 0.0);
                Fragment {
                    shape: LocalShape::Circle {
                        cx: 0.0,
                        cy: 0.0,
                        r,
                    },
                    extent: (2.0 * r, 2.0 * r),
                    rotate_deg: 0.0,
                    origin: (0.0, 0.0),
                    paint: Paint::Fill,
                }
            }
            ShapeTag::Ellipse => {
                let rx = attrs.numeric("rx", 0.0);
                let ry = attrs.numeric("ry", 0.0);
                Fragment {
                    shape: LocalShape::Ellipse {
                        cx: 0.0,
                        cy: 0.0,
                        rx,
                        ry,
                    },
                    extent: (2.0 * rx, 2.0 * ry),
                    rotate_deg: 0.0,
                    origin: (0.0, 0.0),
                    paint: Paint::Fill,
                }
            }
            ShapeTag::Polygon | ShapeTag::Polyline => {
                let points = attrs.points("points");
                if points.len() < 2 {
                    tracing::warn!(tag = shape.tag.as_str(), "fragment has fewer than two points");
                    return None;
                }
                let bounds = bounding_box_of_points(&points);
                let center = bounds.center();
                let rotate_deg = attrs.rotation("transform");
                let (rw, rh) = rotated_bounding_box(bounds.width, bounds.height, rotate_deg);
                let size = rw.max(rh);
                Fragment {
                    shape: LocalShape::Polygon {
                        points: points.into_iter().map(|p| p - center).collect(),
                        closed: shape.tag == ShapeTag::Polygon,
                    },
                    extent: (size, size),
                    rotate_deg,
                    origin: (0.0, 0.0),
                    paint: Paint::Fill,
                }
            }
            ShapeTag::Line => {
                let from = Point64::new(attrs.numeric("x1", 0.0), attrs.numeric("y1", 0.0));
                let to = Point64::new(attrs.numeric("x2", 0.0), attrs.numeric("y2", 0.0));
                let center = bounding_box_of_points(&[from, to]).center();
                let size = (to.x - from.x).abs().max((to.y - from.y).abs());
                Fragment {
                    shape: LocalShape::Line {
                        from: from - center,
                        to: to - center,
                    },
                    extent: (size, size),
                    rotate_deg: 0.0,
                    origin: (0.0, 0.0),
                    // Paint attributes are stripped on extraction
                    paint: Paint::Stroke {
                        width: 0.1 * if size > 0.0 { size } else { 1.0 },
                    },
                }
            }
        };
        Some(fragment)
    }

    fn place(&self, placement: &Placement) -> RenderPrimitive {
        let (cx, cy) = placement.center();
        RenderPrimitive {
            shape: self.shape.clone(),
            transform: ShapeTransform {
                translate: (cx, cy),
                scale: (
                    fit(placement.width as f64, self.extent.0),
                    fit(placement.height as f64, self.extent.1),
                ),
                rotate_deg: self.rotate_deg,
                origin: self.origin,
            },
            paint: self.paint,
        }
    }
}

/// Scale that stretches `natural` over `target`; degenerate sizes keep scale 1
fn fit(target: f64, natural: f64) -> f64 {
    if natural > 0.0 && natural.is_finite() {
        target / natural
    } else {
        1.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line art
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
struct LineArt {
    cap: LineCapStyle,
    /// Half the line thickness
    half: f64,
}

impl LineArt {
    /// Half the length of one cell along the run axis
    fn half_length(direction: LineDirection) -> f64 {
        if direction.is_diagonal() {
            FRAC_1_SQRT_2
        } else {
            0.5
        }
    }

    /// Start cap, pointing along -x from the cell center
    fn cap(&self, direction: LineDirection) -> LocalShape {
        let h = self.half;
        let l = Self::half_length(direction);
        match self.cap {
            LineCapStyle::None => LocalShape::rect(-l, -h, 2.0 * l, 2.0 * h),
            LineCapStyle::Angular => LocalShape::Polygon {
                points: vec![
                    Point64::new(l, -h),
                    Point64::new(l, h),
                    Point64::new(0.0, h),
                    Point64::new(-h, 0.0),
                    Point64::new(0.0, -h),
                ],
                closed: true,
            },
            LineCapStyle::Rounded => {
                let k = KAPPA * h;
                LocalShape::Path(vec![
                    SvgCommand::Move(Point64::new(0.0, -h)),
                    SvgCommand::Line(Point64::new(l, -h)),
                    SvgCommand::Line(Point64::new(l, h)),
                    SvgCommand::Line(Point64::new(0.0, h)),
                    SvgCommand::Cubic {
                        control1: Point64::new(-k, h),
                        control2: Point64::new(-h, k),
                        end: Point64::new(-h, 0.0),
                    },
                    SvgCommand::Cubic {
                        control1: Point64::new(-h, -k),
                        control2: Point64::new(-k, -h),
                        end: Point64::new(0.0, -h),
                    },
                    SvgCommand::Close,
                ])
            }
        }
    }

    /// Isolated module
    fn dot(&self) -> LocalShape {
        let h = self.half;
        match self.cap {
            LineCapStyle::None => LocalShape::rect(-h, -h, 2.0 * h, 2.0 * h),
            LineCapStyle::Angular => LocalShape::Polygon {
                points: vec![
                    Point64::new(0.0, -h),
                    Point64::new(h, 0.0),
                    Point64::new(0.0, h),
                    Point64::new(-h, 0.0),
                ],
                closed: true,
            },
            LineCapStyle::Rounded => LocalShape::Circle {
                cx: 0.0,
                cy: 0.0,
                r: h,
            },
        }
    }

    /// Bar over `cells` interior modules, starting at the first one's center
    fn body(&self, cells: usize, direction: LineDirection) -> LocalShape {
        let l = Self::half_length(direction);
        let span = (cells.max(1) - 1) as f64 * 2.0 * l;
        LocalShape::rect(-l, -self.half, span + 2.0 * l, 2.0 * self.half)
    }
}

/// Center of the first interior cell of a body placement
fn body_anchor(placement: &Placement, direction: LineDirection) -> (f64, f64) {
    let x = match direction {
        LineDirection::DiagonalUp => placement.x + placement.width as i32 - 1,
        _ => placement.x,
    };
    (x as f64 + 0.5, placement.y as f64 + 0.5)
}

/// Fail unless `shape` yields geometry the composer can place
pub(crate) fn ensure_drawable(
    shape: &ExtractedShape,
    role: &'static str,
) -> Result<(), StyleError> {
    Fragment::prepare(shape)
        .map(|_| ())
        .ok_or(StyleError::UndrawablePrimitive(role))
}

// ─────────────────────────────────────────────────────────────────────────────
// Composer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum DotShape {
    Square,
    Fragment(Fragment),
    Lines(LineArt),
}

#[derive(Clone, Debug)]
enum EyeGlyph {
    None,
    Asset(String),
    Fragment(Fragment),
}

/// Maps placements to primitives for one style
#[derive(Clone, Debug)]
pub struct Composer {
    dots: DotShape,
    eye: EyeGlyph,
}

impl Composer {
    /// Measure the style's fragments once; undrawable fragments are an error
    pub fn new(dots: &DotStyle, eye: &EyeStyle) -> Result<Self, StyleError> {
        let dots = match dots {
            DotStyle::Fragment { shape, .. } => DotShape::Fragment(
                Fragment::prepare(shape).ok_or(StyleError::UndrawablePrimitive("dot"))?,
            ),
            DotStyle::Lines { cap, thickness, .. } => DotShape::Lines(LineArt {
                cap: *cap,
                half: thickness / 2.0,
            }),
            DotStyle::Square { .. } | DotStyle::Tiles(_) => DotShape::Square,
        };
        let eye = match eye {
            EyeStyle::Asset { name } => EyeGlyph::Asset(name.clone()),
            EyeStyle::Fragment { shape } => EyeGlyph::Fragment(
                Fragment::prepare(shape).ok_or(StyleError::UndrawablePrimitive("eye"))?,
            ),
            EyeStyle::Squares | EyeStyle::Modules => EyeGlyph::None,
        };
        Ok(Self { dots, eye })
    }

    /// Primitive for one placement, `None` when its asset is unavailable
    pub fn place(&self, placement: &Placement, assets: &mut AssetCache) -> Option<RenderPrimitive> {
        let (cx, cy) = placement.center();
        let (w, h) = (placement.width as f64, placement.height as f64);

        let primitive = match &placement.kind {
            ShapeKind::Block => match &self.dots {
                DotShape::Fragment(fragment) => fragment.place(placement),
                DotShape::Square | DotShape::Lines(_) => RenderPrimitive {
                    shape: LocalShape::rect(-w / 2.0, -h / 2.0, w, h),
                    transform: ShapeTransform::at(cx, cy),
                    paint: Paint::Fill,
                },
            },
            ShapeKind::FinderCenter => RenderPrimitive {
                shape: LocalShape::rect(-w / 2.0, -h / 2.0, w, h),
                transform: ShapeTransform::at(cx, cy),
                paint: Paint::Fill,
            },
            ShapeKind::FinderRing => RenderPrimitive {
                // Ring stroke of width 1 centered between the outer module edges
                shape: LocalShape::rect(-(w - 1.0) / 2.0, -(h - 1.0) / 2.0, w - 1.0, h - 1.0),
                transform: ShapeTransform::at(cx, cy),
                paint: Paint::Stroke { width: 1.0 },
            },
            ShapeKind::EyeGlyph => match &self.eye {
                EyeGlyph::Fragment(fragment) => fragment.place(placement),
                EyeGlyph::Asset(name) => place_asset(name, placement, assets)?,
                EyeGlyph::None => {
                    tracing::warn!(x = placement.x, y = placement.y, "eye glyph without an eye style");
                    return None;
                }
            },
            ShapeKind::Asset(name) => place_asset(name, placement, assets)?,
            ShapeKind::LineCap { end, direction } => {
                let art = self.line_art();
                let rotation = match end {
                    RunEnd::Start => direction.angle(),
                    RunEnd::End => direction.angle() + 180.0,
                };
                RenderPrimitive {
                    shape: art.cap(*direction),
                    transform: ShapeTransform::at(cx, cy).with_rotation(rotation),
                    paint: Paint::Fill,
                }
            }
            ShapeKind::LineBody { cells, direction } => {
                let (ax, ay) = body_anchor(placement, *direction);
                RenderPrimitive {
                    shape: self.line_art().body(*cells, *direction),
                    transform: ShapeTransform::at(ax, ay).with_rotation(direction.angle()),
                    paint: Paint::Fill,
                }
            }
            ShapeKind::LineDot => RenderPrimitive {
                shape: self.line_art().dot(),
                transform: ShapeTransform::at(cx, cy),
                paint: Paint::Fill,
            },
        };
        Some(primitive)
    }

    fn line_art(&self) -> LineArt {
        match &self.dots {
            DotShape::Lines(art) => *art,
            _ => LineArt {
                cap: LineCapStyle::None,
                half: 0.5,
            },
        }
    }
}

fn place_asset(
    name: &str,
    placement: &Placement,
    assets: &mut AssetCache,
) -> Option<RenderPrimitive> {
    let Some(asset) = assets.get(name) else {
        tracing::warn!(name, x = placement.x, y = placement.y, "omitting unresolved asset");
        return None;
    };
    Some(fit_asset(
        asset,
        Rect::new(
            placement.x as f32,
            placement.y as f32,
            placement.width as f32,
            placement.height as f32,
        ),
    ))
}

/// Stretch an asset over `target`
pub(crate) fn fit_asset(asset: ResolvedAsset, target: Rect) -> RenderPrimitive {
    let center = target.center();
    let (aw, ah) = asset.size();
    let transform = |origin: (f64, f64)| ShapeTransform {
        translate: (center.x as f64, center.y as f64),
        scale: (
            fit(target.width() as f64, aw),
            fit(target.height() as f64, ah),
        ),
        rotate_deg: 0.0,
        origin,
    };

    match asset {
        ResolvedAsset::Document(doc) => {
            let center = doc.view_box.center();
            RenderPrimitive {
                shape: LocalShape::Document(doc),
                transform: transform((center.x, center.y)),
                paint: Paint::Own,
            }
        }
        ResolvedAsset::Image {
            href,
            width,
            height,
        } => RenderPrimitive {
            shape: LocalShape::Image {
                href,
                width: width as f64,
                height: height as f64,
            },
            transform: transform((0.0, 0.0)),
            paint: Paint::Own,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::random::{RandomSource, SeededRandom};
    use crate::style::FragmentGrouping;
    use stipple_svg::extract_main_shape;

    const EPS: f64 = 1e-4;

    fn fragment_dots(svg: &str) -> DotStyle {
        DotStyle::Fragment {
            shape: extract_main_shape(svg).unwrap(),
            grouping: FragmentGrouping::None,
        }
    }

    fn compose(dots: &DotStyle, eye: &EyeStyle) -> Composer {
        Composer::new(dots, eye).unwrap()
    }

    fn lines(direction: LineDirection, cap: LineCapStyle) -> Composer {
        let dots = DotStyle::Lines {
            direction,
            cap,
            thickness: 1.0,
        };
        compose(&dots, &EyeStyle::Squares)
    }

    /// Module-space bounds of a primitive's outline
    fn placed_bounds(primitive: &RenderPrimitive) -> Rect {
        primitive
            .shape
            .to_path()
            .unwrap()
            .transformed(&primitive.transform.to_affine())
            .bounds()
    }

    fn assert_rect_close(actual: Rect, expected: Rect) {
        let close = |a: f32, b: f32| (a - b).abs() < 1e-3;
        assert!(
            close(actual.x(), expected.x())
                && close(actual.y(), expected.y())
                && close(actual.width(), expected.width())
                && close(actual.height(), expected.height()),
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn test_transform_svg() {
        let transform = ShapeTransform {
            translate: (5.5, 2.0),
            scale: (0.01, 0.03),
            rotate_deg: 0.0,
            origin: (50.0, 25.0),
        };
        assert_eq!(
            transform.to_svg(),
            "translate(5.5,2) scale(0.01,0.03) translate(-50,-25)"
        );
        assert_eq!(
            ShapeTransform::at(1.0, 1.0).with_rotation(45.0).to_svg(),
            "translate(1,1) scale(1,1) rotate(45)"
        );
    }

    #[test]
    fn test_affine_matches_apply() {
        let transform = ShapeTransform {
            translate: (3.0, 4.0),
            scale: (2.0, 0.5),
            rotate_deg: 30.0,
            origin: (1.0, -2.0),
        };
        let affine = transform.to_affine();
        for p in [Point64::new(0.0, 0.0), Point64::new(1.0, -2.0), Point64::new(7.5, 3.25)] {
            let expected = transform.apply(p);
            let actual = affine.transform_point(Point::new(p.x as f32, p.y as f32));
            assert!((actual.x as f64 - expected.x).abs() < 1e-4);
            assert!((actual.y as f64 - expected.y).abs() < 1e-4);
        }
        let origin = transform.apply(Point64::new(1.0, -2.0));
        assert!((origin.x - 3.0).abs() < EPS && (origin.y - 4.0).abs() < EPS);
    }

    #[test]
    fn test_path_fragment_fills_block() {
        let composer = compose(
            &fragment_dots(r#"<path d="M10,10 L30,10 L30,30 L10,30 Z" fill="red"/>"#),
            &EyeStyle::Squares,
        );
        let mut assets = AssetCache::new(&crate::assets::NoAssets);
        let placement = Placement::new(4, 6, 3, 1, ShapeKind::Block);

        let primitive = composer.place(&placement, &mut assets).unwrap();
        assert_eq!(primitive.transform.translate, (5.5, 6.5));
        assert_eq!(primitive.transform.scale, (0.03, 0.01));
        assert_eq!(primitive.transform.origin, (50.0, 50.0));
        assert_rect_close(placed_bounds(&primitive), Rect::new(4.0, 6.0, 3.0, 1.0));
    }

    #[test]
    fn test_rotated_rect_fits_block() {
        let composer = compose(
            &fragment_dots(r#"<rect width="10" height="10" transform="rotate(45)"/>"#),
            &EyeStyle::Squares,
        );
        let mut assets = AssetCache::new(&crate::assets::NoAssets);
        let primitive = composer
            .place(&Placement::new(0, 0, 1, 1, ShapeKind::Block), &mut assets)
            .unwrap();

        assert_eq!(primitive.transform.rotate_deg, 45.0);
        let corners = [(-5.0, -5.0), (5.0, -5.0), (5.0, 5.0), (-5.0, 5.0)];
        for (x, y) in corners {
            let p = primitive.transform.apply(Point64::new(x, y));
            assert!(p.x > -EPS && p.x < 1.0 + EPS, "{p:?}");
            assert!(p.y > -EPS && p.y < 1.0 + EPS, "{p:?}");
        }
    }

    #[test]
    fn test_circle_and_ellipse_scale() {
        let mut assets = AssetCache::new(&crate::assets::NoAssets);
        let placement = Placement::new(2, 2, 2, 2, ShapeKind::Block);

        let circle = compose(&fragment_dots(r#"<circle cx="7" cy="7" r="4"/>"#), &EyeStyle::Squares)
            .place(&placement, &mut assets)
            .unwrap();
        assert_eq!(circle.transform.scale, (0.25, 0.25));
        assert_rect_close(placed_bounds(&circle), Rect::new(2.0, 2.0, 2.0, 2.0));

        let ellipse = compose(
            &fragment_dots(r#"<ellipse rx="4" ry="1"/>"#),
            &EyeStyle::Squares,
        )
        .place(&placement, &mut assets)
        .unwrap();
        assert_eq!(ellipse.transform.scale, (0.25, 1.0));
    }

    #[test]
    fn test_polygon_and_line_fragments() {
        let mut assets = AssetCache::new(&crate::assets::NoAssets);
        let placement = Placement::new(0, 0, 1, 1, ShapeKind::Block);

        let polygon = compose(
            &fragment_dots(r#"<polygon points="0,0 20,0 10,10"/>"#),
            &EyeStyle::Squares,
        )
        .place(&placement, &mut assets)
        .unwrap();
        let LocalShape::Polygon { points, closed } = &polygon.shape else {
            panic!("expected a polygon");
        };
        assert!(closed);
        assert_eq!(points[0], Point64::new(-10.0, -5.0));
        assert_eq!(polygon.transform.scale, (0.05, 0.05));

        let line = compose(
            &fragment_dots(r#"<line x1="0" y1="0" x2="10" y2="0" stroke-width="3"/>"#),
            &EyeStyle::Squares,
        )
        .place(&placement, &mut assets)
        .unwrap();
        assert_eq!(line.paint, Paint::Stroke { width: 1.0 });
        assert_eq!(line.transform.scale, (0.1, 0.1));
    }

    #[test]
    fn test_degenerate_fragment_uses_unit_scale() {
        let mut assets = AssetCache::new(&crate::assets::NoAssets);
        let primitive = compose(&fragment_dots(r#"<circle r="0"/>"#), &EyeStyle::Squares)
            .place(&Placement::new(1, 1, 1, 1, ShapeKind::Block), &mut assets)
            .unwrap();
        assert_eq!(primitive.transform.scale, (1.0, 1.0));
    }

    #[test]
    fn test_rounded_run_primitives() {
        let composer = lines(LineDirection::Horizontal, LineCapStyle::Rounded);
        let mut assets = AssetCache::new(&crate::assets::NoAssets);
        let direction = LineDirection::Horizontal;

        let start = composer
            .place(
                &Placement::new(5, 5, 1, 1, ShapeKind::LineCap { end: RunEnd::Start, direction }),
                &mut assets,
            )
            .unwrap();
        let body = composer
            .place(
                &Placement::new(6, 5, 1, 1, ShapeKind::LineBody { cells: 1, direction }),
                &mut assets,
            )
            .unwrap();
        let end = composer
            .place(
                &Placement::new(7, 5, 1, 1, ShapeKind::LineCap { end: RunEnd::End, direction }),
                &mut assets,
            )
            .unwrap();

        assert!(matches!(start.shape, LocalShape::Path(_)));
        assert_eq!(start.transform.rotate_deg, 0.0);
        assert_eq!(end.transform.rotate_deg, 180.0);
        assert_rect_close(placed_bounds(&start), Rect::new(5.0, 5.0, 1.0, 1.0));
        assert_rect_close(placed_bounds(&body), Rect::new(6.0, 5.0, 1.0, 1.0));
        assert_rect_close(placed_bounds(&end), Rect::new(7.0, 5.0, 1.0, 1.0));
    }

    #[test]
    fn test_cap_styles_and_dots() {
        let mut assets = AssetCache::new(&crate::assets::NoAssets);
        let dot = Placement::new(3, 3, 1, 1, ShapeKind::LineDot);

        let square = lines(LineDirection::Vertical, LineCapStyle::None)
            .place(&dot, &mut assets)
            .unwrap();
        assert!(matches!(square.shape, LocalShape::Rect { .. }));

        let diamond = lines(LineDirection::Vertical, LineCapStyle::Angular)
            .place(&dot, &mut assets)
            .unwrap();
        assert!(matches!(&diamond.shape, LocalShape::Polygon { points, .. } if points.len() == 4));

        let circle = lines(LineDirection::Vertical, LineCapStyle::Rounded)
            .place(&dot, &mut assets)
            .unwrap();
        assert!(matches!(circle.shape, LocalShape::Circle { r, .. } if r == 0.5));

        let cap = lines(LineDirection::Vertical, LineCapStyle::Angular)
            .place(
                &Placement::new(
                    3,
                    3,
                    1,
                    1,
                    ShapeKind::LineCap {
                        end: RunEnd::Start,
                        direction: LineDirection::Vertical,
                    },
                ),
                &mut assets,
            )
            .unwrap();
        assert_eq!(cap.transform.rotate_deg, 90.0);
        assert_rect_close(placed_bounds(&cap), Rect::new(3.0, 3.0, 1.0, 1.0));
    }

    #[test]
    fn test_diagonal_up_body_anchor() {
        let composer = lines(LineDirection::DiagonalUp, LineCapStyle::None);
        let mut assets = AssetCache::new(&crate::assets::NoAssets);
        let body = composer
            .place(
                &Placement::new(
                    7,
                    3,
                    2,
                    2,
                    ShapeKind::LineBody {
                        cells: 2,
                        direction: LineDirection::DiagonalUp,
                    },
                ),
                &mut assets,
            )
            .unwrap();

        assert_eq!(body.transform.translate, (8.5, 3.5));
        assert_eq!(body.transform.rotate_deg, 135.0);
        // Bar runs from the first interior center to the last, plus half a cell each side
        let last = body.transform.apply(Point64::new(2.0 * FRAC_1_SQRT_2, 0.0));
        assert!((last.x - 7.5).abs() < EPS && (last.y - 4.5).abs() < EPS);
    }

    #[test]
    fn test_finder_parts() {
        let composer = compose(&DotStyle::Square { max_group: 3 }, &EyeStyle::Squares);
        let mut assets = AssetCache::new(&crate::assets::NoAssets);

        let center = composer
            .place(&Placement::new(2, 2, 3, 3, ShapeKind::FinderCenter), &mut assets)
            .unwrap();
        assert_rect_close(placed_bounds(&center), Rect::new(2.0, 2.0, 3.0, 3.0));

        let ring = composer
            .place(&Placement::new(0, 0, 7, 7, ShapeKind::FinderRing), &mut assets)
            .unwrap();
        assert_eq!(ring.paint, Paint::Stroke { width: 1.0 });
        assert_rect_close(placed_bounds(&ring), Rect::new(0.5, 0.5, 6.0, 6.0));
    }

    #[test]
    fn test_asset_placement() {
        let resolver = MemoryAssets::new()
            .with_svg(
                "blob",
                r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="10 10 20 40"><rect x="10" y="10" width="20" height="40"/></svg>"#,
            )
            .with_image("photo", "photo.png", 50, 25);
        let mut assets = AssetCache::new(&resolver);
        let composer = compose(&DotStyle::Square { max_group: 3 }, &EyeStyle::Squares);

        let blob = composer
            .place(
                &Placement::new(0, 0, 2, 2, ShapeKind::Asset("blob".to_string())),
                &mut assets,
            )
            .unwrap();
        assert_eq!(blob.transform.translate, (1.0, 1.0));
        assert_eq!(blob.transform.scale, (0.1, 0.05));
        assert_eq!(blob.transform.origin, (20.0, 30.0));
        assert_eq!(blob.paint, Paint::Own);
        assert!(blob.shape.to_svg_element("").starts_with("<g><rect"));

        let photo = composer
            .place(
                &Placement::new(1, 0, 1, 1, ShapeKind::Asset("photo".to_string())),
                &mut assets,
            )
            .unwrap();
        assert_eq!(photo.transform.scale, (0.02, 0.04));

        assert!(composer
            .place(
                &Placement::new(0, 0, 1, 1, ShapeKind::Asset("missing".to_string())),
                &mut assets
            )
            .is_none());
    }

    #[test]
    fn test_eye_fragment_covers_pattern() {
        let eye = EyeStyle::Fragment {
            shape: extract_main_shape(r#"<circle r="10"/>"#).unwrap(),
        };
        let composer = compose(&DotStyle::Square { max_group: 3 }, &eye);
        let mut assets = AssetCache::new(&crate::assets::NoAssets);
        let glyph = composer
            .place(&Placement::new(14, 0, 7, 7, ShapeKind::EyeGlyph), &mut assets)
            .unwrap();
        assert_rect_close(placed_bounds(&glyph), Rect::new(14.0, 0.0, 7.0, 7.0));
    }

    #[test]
    fn test_svg_elements() {
        let rect = LocalShape::Rect {
            x: -0.5,
            y: -0.5,
            width: 1.0,
            height: 1.0,
            rx: 0.25,
            ry: 0.25,
        };
        assert_eq!(
            rect.to_svg_element(r#" transform="translate(1,1)""#),
            r#"<rect x="-0.5" y="-0.5" width="1" height="1" rx="0.25" ry="0.25" transform="translate(1,1)"/>"#
        );
        let line = LocalShape::Polygon {
            points: vec![Point64::new(0.0, 0.0), Point64::new(1.0, 2.0)],
            closed: false,
        };
        assert_eq!(line.to_svg_element(""), r#"<polyline points="0,0 1,2"/>"#);
        assert_eq!(fmt_num(1.0 / 3.0), "0.3333");
        assert_eq!(fmt_num(-0.00001), "0");
    }

    #[test]
    fn test_large_view_box_keeps_scale() {
        let resolver = MemoryAssets::new().with_svg(
            "poster",
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20000 40000"><rect width="20000" height="40000"/></svg>"#,
        );
        let mut assets = AssetCache::new(&resolver);
        let composer = compose(&DotStyle::Square { max_group: 3 }, &EyeStyle::Squares);

        let poster = composer
            .place(
                &Placement::new(0, 0, 1, 1, ShapeKind::Asset("poster".to_string())),
                &mut assets,
            )
            .unwrap();
        assert_eq!(
            poster.transform.to_svg(),
            "translate(0.5,0.5) scale(0.00005,0.000025) translate(-10000,-20000)"
        );
        assert_eq!(fmt_scale(2.0 / 3.0), "0.66667");
        assert_eq!(fmt_scale(0.0), "0");
    }

    #[test]
    fn test_garbage_paths_never_panic() {
        const ALPHABET: &[u8] = b"MmLlHhVvCcSsQqTtAaZz0123456789.,- eE+";
        let mut rng = SeededRandom::new(2024);
        let mut assets = AssetCache::new(&crate::assets::NoAssets);
        let placement = Placement::new(0, 0, 1, 1, ShapeKind::Block);

        for _ in 0..200 {
            let len = rng.pick(40).unwrap_or(0);
            let d: String = (0..len)
                .filter_map(|_| rng.pick(ALPHABET.len()).map(|i| ALPHABET[i] as char))
                .collect();
            let svg = format!(r#"<path d="{d}"/>"#);
            let Some(shape) = extract_main_shape(&svg) else {
                continue;
            };
            let dots = DotStyle::Fragment {
                shape,
                grouping: FragmentGrouping::None,
            };
            let Ok(composer) = Composer::new(&dots, &EyeStyle::Squares) else {
                continue;
            };
            if let Some(primitive) = composer.place(&placement, &mut assets) {
                let _ = primitive.transform.to_svg();
                let _ = primitive.shape.to_svg_element("");
            }
        }
    }

    #[test]
    fn test_undrawable_fragments_are_rejected() {
        for svg in [
            r#"<path d=""/>"#,
            r#"<path d="zz"/>"#,
            r#"<path d="M4,4"/>"#,
            r#"<polygon points="1"/>"#,
        ] {
            let shape = extract_main_shape(svg).unwrap();
            assert_eq!(
                ensure_drawable(&shape, "dot"),
                Err(StyleError::UndrawablePrimitive("dot")),
                "{svg}"
            );

            let dots = DotStyle::Fragment {
                shape: shape.clone(),
                grouping: FragmentGrouping::None,
            };
            assert_eq!(
                Composer::new(&dots, &EyeStyle::Squares).err(),
                Some(StyleError::UndrawablePrimitive("dot"))
            );
            let eye = EyeStyle::Fragment { shape };
            assert_eq!(
                Composer::new(&DotStyle::Square { max_group: 3 }, &eye).err(),
                Some(StyleError::UndrawablePrimitive("eye"))
            );
        }

        // Degenerate but parseable geometry is still placed
        let point = extract_main_shape(r#"<path d="M1,1 L1,1"/>"#).unwrap();
        assert_eq!(ensure_drawable(&point, "dot"), Ok(()));
    }
}
