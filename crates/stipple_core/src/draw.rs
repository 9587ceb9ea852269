//! Drawing surface
//!
//! A rendered QR code is a list of vector primitives; any surface that can
//! fill and stroke paths, fill rectangles, draw images and clip implements
//! [`DrawContext`] and can receive it. [`RecordingContext`] stores the calls
//! as [`DrawCommand`]s for later replay or inspection.

use crate::geometry::{Affine2D, Point, Rect, Size};
use crate::paint::{Brush, CornerRadius};

// Magic number for cubic Bézier circle approximation
const KAPPA: f32 = 0.552_284_8;

// ─────────────────────────────────────────────────────────────────────────────
// Stroke Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Line cap style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    /// Flat cap at the endpoint
    #[default]
    Butt,
    /// Rounded cap extending past the endpoint
    Round,
    /// Square cap extending past the endpoint
    Square,
}

impl LineCap {
    /// SVG `stroke-linecap` keyword
    pub fn as_svg(&self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

/// Line join style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    /// Miter join (sharp corner)
    #[default]
    Miter,
    /// Round join
    Round,
    /// Bevel join (flat corner)
    Bevel,
}

impl LineJoin {
    /// SVG `stroke-linejoin` keyword
    pub fn as_svg(&self) -> &'static str {
        match self {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        }
    }
}

/// Stroke style configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    /// Line width
    pub width: f32,
    /// Line cap style
    pub cap: LineCap,
    /// Line join style
    pub join: LineJoin,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
        }
    }
}

impl Stroke {
    /// Create a new stroke with the given width
    pub fn new(width: f32) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    /// Set line cap style
    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    /// Set line join style
    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Types
// ─────────────────────────────────────────────────────────────────────────────

/// Path command for building vector paths
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    /// Move to a point
    MoveTo(Point),
    /// Line to a point
    LineTo(Point),
    /// Quadratic Bézier curve
    QuadTo { control: Point, end: Point },
    /// Cubic Bézier curve
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    /// Close the current subpath
    Close,
}

impl PathCommand {
    /// Apply an affine transform to every point of the command
    pub fn transformed(&self, t: &Affine2D) -> PathCommand {
        match *self {
            PathCommand::MoveTo(p) => PathCommand::MoveTo(t.transform_point(p)),
            PathCommand::LineTo(p) => PathCommand::LineTo(t.transform_point(p)),
            PathCommand::QuadTo { control, end } => PathCommand::QuadTo {
                control: t.transform_point(control),
                end: t.transform_point(end),
            },
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => PathCommand::CubicTo {
                control1: t.transform_point(control1),
                control2: t.transform_point(control2),
                end: t.transform_point(end),
            },
            PathCommand::Close => PathCommand::Close,
        }
    }
}

/// A vector path
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    /// Create a new empty path
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Create a path from a vector of commands
    pub fn from_commands(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }

    /// Move to a point
    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::MoveTo(Point::new(x, y)));
        self
    }

    /// Line to a point
    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::LineTo(Point::new(x, y)));
        self
    }

    /// Cubic Bézier curve
    pub fn cubic_to(mut self, cx1: f32, cy1: f32, cx2: f32, cy2: f32, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::CubicTo {
            control1: Point::new(cx1, cy1),
            control2: Point::new(cx2, cy2),
            end: Point::new(x, y),
        });
        self
    }

    /// Close the path
    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    /// Create a rectangle path
    pub fn rect(rect: Rect) -> Self {
        Self::new()
            .move_to(rect.x(), rect.y())
            .line_to(rect.max_x(), rect.y())
            .line_to(rect.max_x(), rect.max_y())
            .line_to(rect.x(), rect.max_y())
            .close()
    }

    /// Create a circle path
    pub fn circle(center: Point, radius: f32) -> Self {
        Self::ellipse(center, radius, radius)
    }

    /// Create an ellipse path from four cubic Bézier curves
    pub fn ellipse(center: Point, rx: f32, ry: f32) -> Self {
        let (cx, cy) = (center.x, center.y);
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);

        Self::new()
            .move_to(cx + rx, cy)
            .cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry)
            .cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy)
            .cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry)
            .cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy)
            .close()
    }

    /// Create a polyline through `points`, closed when `closed` is set
    pub fn polygon(points: &[Point], closed: bool) -> Self {
        let mut path = Self::new();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            path = path.move_to(first.x, first.y);
            for p in iter {
                path = path.line_to(p.x, p.y);
            }
            if closed {
                path = path.close();
            }
        }
        path
    }

    /// Create a line path
    pub fn line(from: Point, to: Point) -> Self {
        Self::new().move_to(from.x, from.y).line_to(to.x, to.y)
    }

    /// Create a rounded rectangle path
    pub fn rounded_rect(rect: Rect, corner_radius: impl Into<CornerRadius>) -> Self {
        let r = corner_radius.into();
        let x = rect.x();
        let y = rect.y();
        let w = rect.width();
        let h = rect.height();

        // Clamp radii to half the minimum dimension
        let max_r = (w.min(h) / 2.0).max(0.0);
        let tl = r.top_left.min(max_r);
        let tr = r.top_right.min(max_r);
        let br = r.bottom_right.min(max_r);
        let bl = r.bottom_left.min(max_r);
        let k = 1.0 - KAPPA;

        let mut path = Self::new().move_to(x + tl, y);

        path = path.line_to(x + w - tr, y);
        if tr > 0.0 {
            path = path.cubic_to(x + w - tr * k, y, x + w, y + tr * k, x + w, y + tr);
        }

        path = path.line_to(x + w, y + h - br);
        if br > 0.0 {
            path = path.cubic_to(x + w, y + h - br * k, x + w - br * k, y + h, x + w - br, y + h);
        }

        path = path.line_to(x + bl, y + h);
        if bl > 0.0 {
            path = path.cubic_to(x + bl * k, y + h, x, y + h - bl * k, x, y + h - bl);
        }

        path = path.line_to(x, y + tl);
        if tl > 0.0 {
            path = path.cubic_to(x, y + tl * k, x + tl * k, y, x + tl, y);
        }

        path.close()
    }

    /// Get the path commands
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Check if the path is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Return a copy with every point mapped through `transform`
    pub fn transformed(&self, transform: &Affine2D) -> Path {
        Path {
            commands: self
                .commands
                .iter()
                .map(|c| c.transformed(transform))
                .collect(),
        }
    }

    /// Calculate the bounding rectangle of this path (control points included)
    pub fn bounds(&self) -> Rect {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        let mut include = |p: &Point| {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        };

        for cmd in &self.commands {
            match cmd {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => include(p),
                PathCommand::QuadTo { control, end } => {
                    include(control);
                    include(end);
                }
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => {
                    include(control1);
                    include(control2);
                    include(end);
                }
                PathCommand::Close => {}
            }
        }

        if min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite() {
            Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
        } else {
            Rect::ZERO
        }
    }

    /// SVG path data (`d` attribute) for this path
    pub fn to_svg_data(&self) -> String {
        let mut d = String::new();
        for cmd in &self.commands {
            match cmd {
                PathCommand::MoveTo(p) => d.push_str(&format!("M{},{}", p.x, p.y)),
                PathCommand::LineTo(p) => d.push_str(&format!("L{},{}", p.x, p.y)),
                PathCommand::QuadTo { control, end } => d.push_str(&format!(
                    "Q{},{},{},{}",
                    control.x, control.y, end.x, end.y
                )),
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => d.push_str(&format!(
                    "C{},{},{},{},{},{}",
                    control1.x, control1.y, control2.x, control2.y, end.x, end.y
                )),
                PathCommand::Close => d.push('Z'),
            }
        }
        d
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clip Shape
// ─────────────────────────────────────────────────────────────────────────────

/// Shape used for clipping
#[derive(Clone, Debug, PartialEq)]
pub enum ClipShape {
    Rect(Rect),
    /// Clip to the fill area of a path
    Path(Path),
}

impl ClipShape {
    /// The clip outline as a path
    pub fn to_path(&self) -> Path {
        match self {
            ClipShape::Rect(rect) => Path::rect(*rect),
            ClipShape::Path(path) => path.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Image Types
// ─────────────────────────────────────────────────────────────────────────────

/// Image rendering options
#[derive(Clone, Debug, PartialEq)]
pub struct ImageOptions {
    /// Opacity (1.0 = fully opaque)
    pub opacity: f32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self { opacity: 1.0 }
    }
}

impl ImageOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Draw Context
// ─────────────────────────────────────────────────────────────────────────────

/// The drawing surface a rendering is replayed onto
///
/// Transforms pushed on the stack compose with the current one; a pushed
/// transform applies to everything drawn until the matching pop.
pub trait DrawContext {
    /// Push a transform onto the stack
    fn push_transform(&mut self, transform: Affine2D);

    /// Pop the top transform from the stack
    fn pop_transform(&mut self);

    /// Get the current combined transform
    fn current_transform(&self) -> Affine2D;

    /// Push a clip shape
    fn push_clip(&mut self, shape: ClipShape);

    /// Pop the top clip shape
    fn pop_clip(&mut self);

    /// Fill a path with a brush
    fn fill_path(&mut self, path: &Path, brush: Brush);

    /// Stroke a path
    fn stroke_path(&mut self, path: &Path, stroke: &Stroke, brush: Brush);

    /// Fill a rectangle, optionally rounded
    fn fill_rect(&mut self, rect: Rect, corner_radius: CornerRadius, brush: Brush);

    /// Draw an image into `rect`; `source` is an href or data URI
    fn draw_image(&mut self, source: &str, rect: Rect, options: &ImageOptions);
}

/// A draw command that can be recorded and replayed
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    PushTransform(Affine2D),
    PopTransform,
    PushClip(ClipShape),
    PopClip,
    FillPath {
        path: Path,
        brush: Brush,
    },
    StrokePath {
        path: Path,
        stroke: Stroke,
        brush: Brush,
    },
    FillRect {
        rect: Rect,
        corner_radius: CornerRadius,
        brush: Brush,
    },
    DrawImage {
        source: String,
        rect: Rect,
        options: ImageOptions,
    },
}

impl DrawCommand {
    /// Replay this command onto another context
    pub fn replay(&self, ctx: &mut dyn DrawContext) {
        match self {
            DrawCommand::PushTransform(t) => ctx.push_transform(*t),
            DrawCommand::PopTransform => ctx.pop_transform(),
            DrawCommand::PushClip(shape) => ctx.push_clip(shape.clone()),
            DrawCommand::PopClip => ctx.pop_clip(),
            DrawCommand::FillPath { path, brush } => ctx.fill_path(path, brush.clone()),
            DrawCommand::StrokePath {
                path,
                stroke,
                brush,
            } => ctx.stroke_path(path, stroke, brush.clone()),
            DrawCommand::FillRect {
                rect,
                corner_radius,
                brush,
            } => ctx.fill_rect(*rect, *corner_radius, brush.clone()),
            DrawCommand::DrawImage {
                source,
                rect,
                options,
            } => ctx.draw_image(source, *rect, options),
        }
    }
}

/// A draw context that records commands for later execution
#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    transform_stack: Vec<Affine2D>,
    clip_depth: usize,
    viewport: Size,
}

impl RecordingContext {
    /// Create a new recording context
    pub fn new(viewport: Size) -> Self {
        Self {
            commands: Vec::new(),
            transform_stack: vec![Affine2D::IDENTITY],
            clip_depth: 0,
            viewport,
        }
    }

    /// Get the recorded commands
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Number of clips currently pushed
    pub fn clip_depth(&self) -> usize {
        self.clip_depth
    }
}

impl DrawContext for RecordingContext {
    fn push_transform(&mut self, transform: Affine2D) {
        self.commands.push(DrawCommand::PushTransform(transform));
        let combined = self.current_transform().then(&transform);
        self.transform_stack.push(combined);
    }

    fn pop_transform(&mut self) {
        self.commands.push(DrawCommand::PopTransform);
        if self.transform_stack.len() > 1 {
            self.transform_stack.pop();
        } else {
            tracing::warn!("pop_transform without matching push_transform");
        }
    }

    fn current_transform(&self) -> Affine2D {
        self.transform_stack.last().copied().unwrap_or_default()
    }

    fn push_clip(&mut self, shape: ClipShape) {
        self.commands.push(DrawCommand::PushClip(shape));
        self.clip_depth += 1;
    }

    fn pop_clip(&mut self) {
        self.commands.push(DrawCommand::PopClip);
        if self.clip_depth > 0 {
            self.clip_depth -= 1;
        } else {
            tracing::warn!("pop_clip without matching push_clip");
        }
    }

    fn fill_path(&mut self, path: &Path, brush: Brush) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            brush,
        });
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke, brush: Brush) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            stroke: stroke.clone(),
            brush,
        });
    }

    fn fill_rect(&mut self, rect: Rect, corner_radius: CornerRadius, brush: Brush) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            corner_radius,
            brush,
        });
    }

    fn draw_image(&mut self, source: &str, rect: Rect, options: &ImageOptions) {
        self.commands.push(DrawCommand::DrawImage {
            source: source.to_string(),
            rect,
            options: options.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;

    #[test]
    fn test_recording_context() {
        let mut ctx = RecordingContext::new(Size::new(800.0, 600.0));

        ctx.push_transform(Affine2D::translation(10.0, 20.0));
        ctx.fill_rect(
            Rect::new(0.0, 0.0, 100.0, 50.0),
            CornerRadius::uniform(8.0),
            Color::BLACK.into(),
        );
        ctx.draw_image("logo.png", Rect::new(0.0, 0.0, 5.0, 5.0), &ImageOptions::new());
        ctx.pop_transform();

        assert_eq!(ctx.commands().len(), 4);
    }

    #[test]
    fn test_transform_stack_composes() {
        let mut ctx = RecordingContext::new(Size::new(800.0, 600.0));

        ctx.push_transform(Affine2D::translation(10.0, 20.0));
        ctx.push_transform(Affine2D::scale(2.0, 2.0));
        let p = ctx.current_transform().transform_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(12.0, 22.0));

        ctx.pop_transform();
        ctx.pop_transform();
        assert!(ctx.current_transform().is_identity());

        // Should not panic when popping past the root
        ctx.pop_transform();
    }

    #[test]
    fn test_replay_copies_commands() {
        let mut source = RecordingContext::new(Size::new(10.0, 10.0));
        source.push_clip(ClipShape::Path(Path::circle(Point::new(5.0, 5.0), 2.0)));
        source.fill_path(&Path::circle(Point::new(5.0, 5.0), 2.0), Color::WHITE.into());
        source.pop_clip();

        let mut target = RecordingContext::new(Size::new(10.0, 10.0));
        for cmd in source.commands() {
            cmd.replay(&mut target);
        }
        assert_eq!(source.commands(), target.commands());
        assert_eq!(target.clip_depth(), 0);

        let clip = ClipShape::Rect(Rect::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(clip.to_path().bounds(), Rect::new(0.0, 0.0, 2.0, 2.0));
    }

    #[test]
    fn test_path_shortcuts() {
        let rect = Path::rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(rect.commands().len(), 5); // move + 3 lines + close
        assert_eq!(rect.bounds(), Rect::new(0.0, 0.0, 100.0, 50.0));

        let circle = Path::circle(Point::new(50.0, 50.0), 25.0);
        let b = circle.bounds();
        assert!((b.width() - 50.0).abs() < 1e-3);

        assert!(Path::polygon(&[], true).is_empty());
        let tri = Path::polygon(
            &[Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
            true,
        );
        assert_eq!(tri.commands().len(), 4);
    }

    #[test]
    fn test_path_transformed_and_svg_data() {
        let path = Path::new().move_to(0.0, 0.0).line_to(1.0, 0.0).close();
        let moved = path.transformed(&Affine2D::translation(2.0, 3.0));
        assert_eq!(moved.to_svg_data(), "M2,3L3,3Z");
    }
}
