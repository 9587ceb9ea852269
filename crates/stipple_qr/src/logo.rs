//! Logo holder and scan-assist frame geometry
//!
//! All rectangles are in module units on the rendering canvas (the view box,
//! quiet zone included). Logo size and margin are fractions of the canvas
//! width.

use std::f32::consts::{FRAC_PI_2, PI};

use stipple_core::{Path, Point, Rect};

use crate::style::{LogoAdjustment, LogoPosition, LogoShape};

const KAPPA: f32 = 0.552_284_8;

/// Where the logo and its holder go
#[derive(Clone, Debug, PartialEq)]
pub struct LogoGeometry {
    /// Area cleared behind the logo
    pub holder: Rect,
    /// Area the logo is drawn into
    pub logo: Rect,
    pub holder_path: Path,
    /// Clip outline of the logo
    pub logo_path: Path,
    /// Scan-assist corner marks and their stroke width
    pub frame: Option<(Path, f32)>,
}

impl LogoGeometry {
    pub fn compute(adjustment: &LogoAdjustment, canvas: Rect, quiet_zone: f32) -> Self {
        let side = canvas.width() * adjustment.size as f32;
        let margin = canvas.width() * adjustment.margin as f32;

        if adjustment.shape.is_scan_assist() {
            return Self::scan_assist(adjustment, canvas, quiet_zone, side, margin);
        }

        let holder = match adjustment.position {
            LogoPosition::Center => Rect::new(
                canvas.x() + (canvas.width() - side) / 2.0 - margin,
                canvas.y() + (canvas.height() - side) / 2.0 - margin,
                side + margin * 2.0,
                side + margin * 2.0,
            ),
            LogoPosition::BottomRight => Rect::new(
                canvas.max_x() - side - margin - quiet_zone.floor(),
                canvas.max_y() - side - margin - quiet_zone.floor(),
                side + margin * 2.0,
                side + margin * 2.0,
            ),
        };
        let logo = holder.inset(margin, margin);

        let (holder_path, logo_path) = match adjustment.shape {
            LogoShape::Round => (oval(holder), oval(logo)),
            LogoShape::RoundedRect => (
                Path::rounded_rect(holder, holder.width() * 0.2),
                Path::rounded_rect(logo, side * 0.2),
            ),
            _ => (Path::rect(holder), Path::rect(logo)),
        };

        Self {
            holder,
            logo,
            holder_path,
            logo_path,
            frame: None,
        }
    }

    fn scan_assist(
        adjustment: &LogoAdjustment,
        canvas: Rect,
        quiet_zone: f32,
        side: f32,
        margin: f32,
    ) -> Self {
        let holder = match adjustment.position {
            LogoPosition::Center => Rect::new(
                canvas.x() + (canvas.width() - side) / 2.0,
                canvas.y() + (canvas.height() - side) / 2.0,
                side,
                side,
            ),
            LogoPosition::BottomRight => Rect::new(
                canvas.max_x() - side - quiet_zone.floor(),
                canvas.max_y() - side - quiet_zone.floor(),
                side,
                side,
            ),
        };

        let line_width = holder.width() * 0.07;
        let inset = line_width + margin;
        let logo = Rect::new(
            holder.x() + inset,
            holder.y() + inset,
            (holder.width() - inset * 2.0).max(0.0),
            (holder.height() - inset * 2.0).max(0.0),
        );

        let (holder_path, logo_path, corner_radius) = match adjustment.shape {
            LogoShape::ScanAssistRoundedRect => {
                let radius = holder.width() * 0.2;
                (
                    Path::rounded_rect(holder, radius),
                    Path::rounded_rect(logo, logo.width() * 0.2),
                    radius,
                )
            }
            _ => (Path::rect(holder), Path::rect(logo), 0.0),
        };

        Self {
            holder,
            logo,
            holder_path,
            logo_path,
            frame: Some((
                scan_assist_frame(holder, corner_radius, line_width),
                line_width,
            )),
        }
    }
}

fn oval(rect: Rect) -> Path {
    Path::ellipse(rect.center(), rect.width() / 2.0, rect.height() / 2.0)
}

/// Four L-shaped corner marks stroked inside `rect`
///
/// Arms are a quarter of the width long. With a positive corner radius each
/// corner is rounded, the radius limited so the arm keeps a straight part.
pub fn scan_assist_frame(rect: Rect, corner_radius: f32, line_width: f32) -> Path {
    let arm = rect.width() * 0.25;
    let inset = line_width / 2.0;
    let r = rect.inset(inset, inset);

    let radius = corner_radius
        .min(arm - line_width)
        .min(r.width() / 2.0)
        .min(r.height() / 2.0);

    if radius <= 0.0 {
        return Path::new()
            .move_to(r.x(), r.y() + arm)
            .line_to(r.x(), r.y())
            .line_to(r.x() + arm, r.y())
            .move_to(r.max_x() - arm, r.y())
            .line_to(r.max_x(), r.y())
            .line_to(r.max_x(), r.y() + arm)
            .move_to(r.max_x(), r.max_y() - arm)
            .line_to(r.max_x(), r.max_y())
            .line_to(r.max_x() - arm, r.max_y())
            .move_to(r.x() + arm, r.max_y())
            .line_to(r.x(), r.max_y())
            .line_to(r.x(), r.max_y() - arm);
    }

    let mut path = Path::new()
        .move_to(r.x(), r.y() + arm)
        .line_to(r.x(), r.y() + radius);
    path = quarter_arc(path, Point::new(r.x() + radius, r.y() + radius), radius, PI);
    path = path
        .line_to(r.x() + arm, r.y())
        .move_to(r.max_x() - arm, r.y())
        .line_to(r.max_x() - radius, r.y());
    path = quarter_arc(
        path,
        Point::new(r.max_x() - radius, r.y() + radius),
        radius,
        PI * 1.5,
    );
    path = path
        .line_to(r.max_x(), r.y() + arm)
        .move_to(r.max_x(), r.max_y() - arm)
        .line_to(r.max_x(), r.max_y() - radius);
    path = quarter_arc(
        path,
        Point::new(r.max_x() - radius, r.max_y() - radius),
        radius,
        0.0,
    );
    path = path
        .line_to(r.max_x() - arm, r.max_y())
        .move_to(r.x() + arm, r.max_y())
        .line_to(r.x() + radius, r.max_y());
    path = quarter_arc(
        path,
        Point::new(r.x() + radius, r.max_y() - radius),
        radius,
        FRAC_PI_2,
    );
    path.line_to(r.x(), r.max_y() - arm)
}

/// Quarter circle from `start` to `start + π/2` (clockwise with y down)
fn quarter_arc(path: Path, center: Point, radius: f32, start: f32) -> Path {
    let end = start + FRAC_PI_2;
    let k = KAPPA * radius;
    let (s0, c0) = start.sin_cos();
    let (s1, c1) = end.sin_cos();
    let p0 = Point::new(center.x + radius * c0, center.y + radius * s0);
    let p1 = Point::new(center.x + radius * c1, center.y + radius * s1);
    path.cubic_to(
        p0.x - k * s0,
        p0.y + k * c0,
        p1.x + k * s1,
        p1.y - k * c1,
        p1.x,
        p1.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stipple_core::PathCommand;

    fn adjustment(position: LogoPosition, shape: LogoShape) -> LogoAdjustment {
        LogoAdjustment {
            asset: "brand".to_string(),
            position,
            shape,
            size: 0.2,
            margin: 0.05,
        }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_centered_holder_includes_margin() {
        let canvas = Rect::new(0.0, 0.0, 100.0, 100.0);
        let geometry =
            LogoGeometry::compute(&adjustment(LogoPosition::Center, LogoShape::Rect), canvas, 0.0);

        assert_eq!(geometry.holder, Rect::new(35.0, 35.0, 30.0, 30.0));
        assert_eq!(geometry.logo, Rect::new(40.0, 40.0, 20.0, 20.0));
        assert!(geometry.frame.is_none());
    }

    #[test]
    fn test_canvas_offset_by_quiet_zone() {
        // 21 modules plus a quiet zone of 2
        let canvas = Rect::new(-2.0, -2.0, 25.0, 25.0);
        let geometry = LogoGeometry::compute(
            &adjustment(LogoPosition::BottomRight, LogoShape::Round),
            canvas,
            2.0,
        );

        // side 5, margin 1.25
        assert!(close(geometry.holder.x(), 23.0 - 5.0 - 1.25 - 2.0));
        assert!(close(geometry.holder.width(), 7.5));
        assert!(close(geometry.logo.width(), 5.0));
        let bounds = geometry.holder_path.bounds();
        assert!(close(bounds.width(), 7.5));
    }

    #[test]
    fn test_scan_assist_geometry() {
        let canvas = Rect::new(0.0, 0.0, 100.0, 100.0);
        let geometry = LogoGeometry::compute(
            &adjustment(LogoPosition::Center, LogoShape::ScanAssistRect),
            canvas,
            0.0,
        );

        // Holder is not grown by the margin
        assert_eq!(geometry.holder, Rect::new(40.0, 40.0, 20.0, 20.0));
        let (frame, width) = geometry.frame.unwrap();
        assert!(close(width, 1.4));
        // inset = frame 1.4 + margin 5
        assert!(close(geometry.logo.x(), 46.4));
        assert!(close(geometry.logo.width(), 7.2));
        // Four L shapes of three points each
        let moves = frame
            .commands()
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count();
        assert_eq!(moves, 4);
        assert_eq!(frame.commands().len(), 12);
    }

    #[test]
    fn test_rounded_frame_stays_inside_holder() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        let frame = scan_assist_frame(rect, 4.0, 1.0);
        let cubics = frame
            .commands()
            .iter()
            .filter(|c| matches!(c, PathCommand::CubicTo { .. }))
            .count();
        assert_eq!(cubics, 4);

        let bounds = frame.bounds();
        assert!(close(bounds.x(), 10.5));
        assert!(close(bounds.max_x(), 29.5));
        assert!(close(bounds.max_y(), 29.5));
    }

    #[test]
    fn test_quarter_arc_endpoints() {
        let path = quarter_arc(Path::new().move_to(0.0, 1.0), Point::ZERO, 1.0, FRAC_PI_2);
        let Some(PathCommand::CubicTo {
            control1,
            control2,
            end,
        }) = path.commands().last()
        else {
            panic!("expected a cubic");
        };
        assert!(close(end.x, -1.0) && close(end.y, 0.0));
        assert!(close(control1.x, -KAPPA) && close(control1.y, 1.0));
        assert!(close(control2.x, -1.0) && close(control2.y, KAPPA));
    }
}
