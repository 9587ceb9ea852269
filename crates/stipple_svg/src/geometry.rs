//! Path geometry utilities
//!
//! Bounding boxes, uniform normalization into a fixed frame and
//! re-serialization of parsed commands.

use stipple_core::{Path, PathCommand, Point};

use crate::parser::{Point64, SvgCommand};

/// Axis-aligned bounding box in path coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn max_x(&self) -> f64 {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.min_y + self.height
    }

    pub fn center(&self) -> Point64 {
        Point64::new(
            self.min_x + self.width / 2.0,
            self.min_y + self.height / 2.0,
        )
    }

    /// Larger of width and height
    pub fn extent(&self) -> f64 {
        self.width.max(self.height)
    }

    fn from_points(points: impl IntoIterator<Item = Point64>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        let (mut min, mut max) = (first, first);
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Self {
            min_x: min.x,
            min_y: min.y,
            width: max.x - min.x,
            height: max.y - min.y,
        }
    }
}

/// Commands in a frame whose larger side equals the target size
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedShape {
    pub bounds: BoundingBox,
    pub commands: Vec<SvgCommand>,
}

/// Smallest box containing every terminal and control point
///
/// `Close` carries no point and is ignored; an empty sequence gives an
/// all-zero box.
pub fn bounding_box(commands: &[SvgCommand]) -> BoundingBox {
    BoundingBox::from_points(commands.iter().flat_map(|c| c.points()))
}

/// Bounding box of a point list (polygon and polyline primitives)
pub fn bounding_box_of_points(points: &[Point64]) -> BoundingBox {
    BoundingBox::from_points(points.iter().copied())
}

/// Translate the bounding box's minimum corner to the origin and scale
/// uniformly so `max(width, height) == target`
///
/// A zero-size box is only translated.
pub fn normalize(commands: &[SvgCommand], target: f64) -> NormalizedShape {
    let bbox = bounding_box(commands);
    let extent = bbox.extent();
    let origin = Point64::new(bbox.min_x, bbox.min_y);

    // Dividing by the extent first keeps the largest coordinate exactly at `target`
    let map = |p: Point64| -> Point64 {
        let d = p - origin;
        if extent > 0.0 && extent.is_finite() {
            Point64::new(d.x / extent * target, d.y / extent * target)
        } else {
            d
        }
    };

    let commands: Vec<SvgCommand> = commands.iter().map(|c| c.map_points(map)).collect();
    NormalizedShape {
        bounds: bounding_box(&commands),
        commands,
    }
}

/// Re-emit commands as absolute path data with no separators between commands
pub fn serialize(commands: &[SvgCommand]) -> String {
    let mut out = String::new();
    for command in commands {
        match command {
            SvgCommand::Move(p) => out.push_str(&format!("M{},{}", p.x, p.y)),
            SvgCommand::Line(p) => out.push_str(&format!("L{},{}", p.x, p.y)),
            SvgCommand::Quad { control, end } => out.push_str(&format!(
                "Q{},{},{},{}",
                control.x, control.y, end.x, end.y
            )),
            SvgCommand::Cubic {
                control1,
                control2,
                end,
            } => out.push_str(&format!(
                "C{},{},{},{},{},{}",
                control1.x, control1.y, control2.x, control2.y, end.x, end.y
            )),
            SvgCommand::Close => out.push('Z'),
        }
    }
    out
}

/// Size of the axis-aligned box around a `width × height` rectangle rotated
/// by `degrees` about its center
pub fn rotated_bounding_box(width: f64, height: f64, degrees: f64) -> (f64, f64) {
    let theta = degrees.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    (width * cos + height * sin, width * sin + height * cos)
}

/// Convert to a drawing path
pub fn to_path(commands: &[SvgCommand]) -> Path {
    let pt = |p: Point64| Point::new(p.x as f32, p.y as f32);
    Path::from_commands(
        commands
            .iter()
            .map(|c| match *c {
                SvgCommand::Move(p) => PathCommand::MoveTo(pt(p)),
                SvgCommand::Line(p) => PathCommand::LineTo(pt(p)),
                SvgCommand::Quad { control, end } => PathCommand::QuadTo {
                    control: pt(control),
                    end: pt(end),
                },
                SvgCommand::Cubic {
                    control1,
                    control2,
                    end,
                } => PathCommand::CubicTo {
                    control1: pt(control1),
                    control2: pt(control2),
                    end: pt(end),
                },
                SvgCommand::Close => PathCommand::Close,
            })
            .collect(),
    )
}
