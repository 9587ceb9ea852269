//! SVG document loading
//!
//! Full SVG assets (dot tiles, eye glyphs, logos) are parsed with `usvg` so a
//! broken asset is rejected before it is placed, and so the document can be
//! replayed onto a [`DrawContext`].

use stipple_core::{
    Affine2D, Brush, Color, DrawContext, Gradient, GradientSpace, GradientStop, LineCap,
    LineJoin, Path, PathCommand, Point, Rect, Stroke,
};
use usvg::{Options, Tree};

use crate::error::SvgError;

/// A loaded and parsed SVG document
#[derive(Clone)]
pub struct SvgDocument {
    tree: Tree,
    /// Size of the document's viewport
    pub width: f32,
    pub height: f32,
}

impl std::fmt::Debug for SvgDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgDocument")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A drawing command extracted from the document
#[derive(Clone, Debug, PartialEq)]
pub enum SvgDrawCommand {
    FillPath { path: Path, brush: Brush },
    StrokePath {
        path: Path,
        stroke: Stroke,
        brush: Brush,
    },
}

impl SvgDocument {
    /// Load an SVG document from raw bytes
    pub fn from_data(data: &[u8]) -> Result<Self, SvgError> {
        let tree = Tree::from_data(data, &Options::default())
            .map_err(|e| SvgError::Parse(e.to_string()))?;
        let size = tree.size();

        Ok(Self {
            tree,
            width: size.width(),
            height: size.height(),
        })
    }

    /// Load an SVG document from a string
    pub fn from_str(svg: &str) -> Result<Self, SvgError> {
        Self::from_data(svg.as_bytes())
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub(crate) fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Fill and stroke commands in document coordinates
    pub fn commands(&self) -> Vec<SvgDrawCommand> {
        let mut commands = Vec::new();
        collect_commands(self.tree.root(), &mut commands);
        commands
    }

    /// Draw the document stretched over `target`
    pub fn draw_into(&self, ctx: &mut dyn DrawContext, target: Rect) {
        if self.width <= 0.0 || self.height <= 0.0 {
            tracing::warn!("skipping SVG document with an empty viewport");
            return;
        }

        let transform = Affine2D::translation(target.x(), target.y()).then(&Affine2D::scale(
            target.width() / self.width,
            target.height() / self.height,
        ));

        ctx.push_transform(transform);
        for command in self.commands() {
            match command {
                SvgDrawCommand::FillPath { path, brush } => ctx.fill_path(&path, brush),
                SvgDrawCommand::StrokePath {
                    path,
                    stroke,
                    brush,
                } => ctx.stroke_path(&path, &stroke, brush),
            }
        }
        ctx.pop_transform();
    }
}

fn collect_commands(group: &usvg::Group, commands: &mut Vec<SvgDrawCommand>) {
    for child in group.children() {
        match child {
            usvg::Node::Group(g) => collect_commands(g, commands),
            usvg::Node::Path(p) => {
                let path = convert_path(p.data(), &p.abs_transform());

                if let Some(brush) = p
                    .fill()
                    .and_then(|fill| paint_to_brush(fill.paint(), fill.opacity().get()))
                {
                    commands.push(SvgDrawCommand::FillPath {
                        path: path.clone(),
                        brush,
                    });
                }

                if let Some((stroke, brush)) = p.stroke().and_then(convert_stroke) {
                    commands.push(SvgDrawCommand::StrokePath {
                        path,
                        stroke,
                        brush,
                    });
                }
            }
            usvg::Node::Image(_) => {
                tracing::debug!("embedded raster images are not replayed onto draw contexts");
            }
            // usvg flattens text into paths
            usvg::Node::Text(_) => {}
        }
    }
}

/// usvg segments in absolute document coordinates
fn convert_path(data: &usvg::tiny_skia_path::Path, transform: &usvg::Transform) -> Path {
    use usvg::tiny_skia_path::PathSegment;

    let affine = Affine2D {
        elements: [
            transform.sx,
            transform.ky,
            transform.kx,
            transform.sy,
            transform.tx,
            transform.ty,
        ],
    };
    let pt = |p: usvg::tiny_skia_path::Point| affine.transform_point(Point::new(p.x, p.y));

    let commands = data
        .segments()
        .map(|segment| match segment {
            PathSegment::MoveTo(p) => PathCommand::MoveTo(pt(p)),
            PathSegment::LineTo(p) => PathCommand::LineTo(pt(p)),
            PathSegment::QuadTo(c, e) => PathCommand::QuadTo {
                control: pt(c),
                end: pt(e),
            },
            PathSegment::CubicTo(c1, c2, e) => PathCommand::CubicTo {
                control1: pt(c1),
                control2: pt(c2),
                end: pt(e),
            },
            PathSegment::Close => PathCommand::Close,
        })
        .collect();

    Path::from_commands(commands)
}

fn convert_color(color: usvg::Color, alpha: f32) -> Color {
    Color::rgba(
        color.red as f32 / 255.0,
        color.green as f32 / 255.0,
        color.blue as f32 / 255.0,
        alpha,
    )
}

fn convert_stops(stops: &[usvg::Stop], opacity: f32) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|s| {
            GradientStop::new(
                s.offset().get(),
                convert_color(s.color(), s.opacity().get() * opacity),
            )
        })
        .collect()
}

fn paint_to_brush(paint: &usvg::Paint, opacity: f32) -> Option<Brush> {
    match paint {
        usvg::Paint::Color(color) => Some(Brush::Solid(convert_color(*color, opacity))),
        usvg::Paint::LinearGradient(lg) => Some(Brush::Gradient(Gradient::linear_with_stops(
            Point::new(lg.x1() as f32, lg.y1() as f32),
            Point::new(lg.x2() as f32, lg.y2() as f32),
            convert_stops(lg.stops(), opacity),
            GradientSpace::UserSpace,
        ))),
        // Only linear gradients are modelled; radial ones keep their first stop
        usvg::Paint::RadialGradient(rg) => convert_stops(rg.stops(), opacity)
            .first()
            .map(|stop| Brush::Solid(stop.color)),
        usvg::Paint::Pattern(_) => {
            tracing::debug!("pattern paint in SVG asset is not supported");
            None
        }
    }
}

fn convert_stroke(stroke: &usvg::Stroke) -> Option<(Stroke, Brush)> {
    let brush = paint_to_brush(stroke.paint(), stroke.opacity().get())?;

    let cap = match stroke.linecap() {
        usvg::LineCap::Butt => LineCap::Butt,
        usvg::LineCap::Round => LineCap::Round,
        usvg::LineCap::Square => LineCap::Square,
    };
    let join = match stroke.linejoin() {
        usvg::LineJoin::Miter | usvg::LineJoin::MiterClip => LineJoin::Miter,
        usvg::LineJoin::Round => LineJoin::Round,
        usvg::LineJoin::Bevel => LineJoin::Bevel,
    };

    Some((
        Stroke::new(stroke.width().get() as f32).with_cap(cap).with_join(join),
        brush,
    ))
}
