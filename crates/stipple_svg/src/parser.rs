//! SVG path data parser
//!
//! Parses the `d` attribute mini-language (`M L V H Q T C S Z`, absolute and
//! relative) into absolute [`SvgCommand`]s. The parser is total: characters it
//! does not understand end the current number, numbers that fail to parse are
//! dropped, and an incomplete argument group at the end of a command is
//! ignored.

use std::ops::{Add, Sub};

/// A point in path coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point64 {
    pub x: f64,
    pub y: f64,
}

impl Point64 {
    pub const ORIGIN: Point64 = Point64 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point64 {
    type Output = Point64;

    fn add(self, rhs: Point64) -> Point64 {
        Point64::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point64 {
    type Output = Point64;

    fn sub(self, rhs: Point64) -> Point64 {
        Point64::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An absolute path command
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SvgCommand {
    Move(Point64),
    Line(Point64),
    Quad {
        control: Point64,
        end: Point64,
    },
    Cubic {
        control1: Point64,
        control2: Point64,
        end: Point64,
    },
    Close,
}

impl SvgCommand {
    /// Terminal point, `None` for `Close`
    pub fn end_point(&self) -> Option<Point64> {
        match *self {
            SvgCommand::Move(p) | SvgCommand::Line(p) => Some(p),
            SvgCommand::Quad { end, .. } | SvgCommand::Cubic { end, .. } => Some(end),
            SvgCommand::Close => None,
        }
    }

    /// Control and terminal points in drawing order
    pub fn points(&self) -> impl Iterator<Item = Point64> {
        let (buf, len) = match *self {
            SvgCommand::Move(p) | SvgCommand::Line(p) => ([p, p, p], 1),
            SvgCommand::Quad { control, end } => ([control, end, end], 2),
            SvgCommand::Cubic {
                control1,
                control2,
                end,
            } => ([control1, control2, end], 3),
            SvgCommand::Close => ([Point64::ORIGIN; 3], 0),
        };
        buf.into_iter().take(len)
    }

    /// Map every point through `f`
    pub fn map_points(&self, f: impl Fn(Point64) -> Point64) -> SvgCommand {
        match *self {
            SvgCommand::Move(p) => SvgCommand::Move(f(p)),
            SvgCommand::Line(p) => SvgCommand::Line(f(p)),
            SvgCommand::Quad { control, end } => SvgCommand::Quad {
                control: f(control),
                end: f(end),
            },
            SvgCommand::Cubic {
                control1,
                control2,
                end,
            } => SvgCommand::Cubic {
                control1: f(control1),
                control2: f(control2),
                end: f(end),
            },
            SvgCommand::Close => SvgCommand::Close,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verb {
    Move,
    Line,
    Vertical,
    Horizontal,
    Quad,
    SmoothQuad,
    Cubic,
    SmoothCubic,
    Close,
}

impl Verb {
    /// Verb and relative flag for a command letter
    fn from_letter(c: char) -> Option<(Verb, bool)> {
        let verb = match c.to_ascii_uppercase() {
            'M' => Verb::Move,
            'L' => Verb::Line,
            'V' => Verb::Vertical,
            'H' => Verb::Horizontal,
            'Q' => Verb::Quad,
            'T' => Verb::SmoothQuad,
            'C' => Verb::Cubic,
            'S' => Verb::SmoothCubic,
            'Z' => Verb::Close,
            _ => return None,
        };
        Some((verb, c.is_ascii_lowercase()))
    }

    fn arity(self) -> usize {
        match self {
            Verb::Move | Verb::Line | Verb::SmoothQuad => 2,
            Verb::Vertical | Verb::Horizontal => 1,
            Verb::Quad | Verb::SmoothCubic => 4,
            Verb::Cubic => 6,
            Verb::Close => 0,
        }
    }
}

struct PathParser {
    commands: Vec<SvgCommand>,
    verb: Verb,
    relative: bool,
    buffer: String,
}

impl PathParser {
    fn new() -> Self {
        // Numbers before the first command letter are treated as an absolute move
        Self {
            commands: Vec::new(),
            verb: Verb::Move,
            relative: false,
            buffer: String::new(),
        }
    }

    fn switch(&mut self, verb: Verb, relative: bool) {
        self.flush();
        self.verb = verb;
        self.relative = relative;
    }

    fn flush(&mut self) {
        let numbers = tokenize_numbers(&self.buffer);
        self.buffer.clear();

        let arity = self.verb.arity();
        if arity == 0 {
            self.commands.push(SvgCommand::Close);
            return;
        }
        for group in numbers.chunks_exact(arity) {
            let command = self.build(group);
            self.commands.push(command);
        }
    }

    /// Start of the current subpath: the most recent move, or the origin
    fn subpath_start(&self) -> Point64 {
        self.commands
            .iter()
            .rev()
            .find_map(|c| match c {
                SvgCommand::Move(p) => Some(*p),
                _ => None,
            })
            .unwrap_or(Point64::ORIGIN)
    }

    /// Current pen position; after a close it is the subpath start
    fn current_point(&self) -> Point64 {
        match self.commands.last() {
            Some(SvgCommand::Close) => self.subpath_start(),
            Some(c) => c.end_point().unwrap_or(Point64::ORIGIN),
            None => Point64::ORIGIN,
        }
    }

    /// Control point a smooth curve reflects, or the current point when the
    /// previous command is not of the same curve family
    fn reflected_control(&self, verb: Verb) -> Point64 {
        let current = self.current_point();
        let last_control = match (verb, self.commands.last()) {
            (Verb::SmoothQuad, Some(SvgCommand::Quad { control, .. })) => *control,
            (Verb::SmoothCubic, Some(SvgCommand::Cubic { control2, .. })) => *control2,
            _ => current,
        };
        current + (current - last_control)
    }

    fn build(&self, n: &[f64]) -> SvgCommand {
        let current = self.current_point();
        let offset = if self.relative {
            current
        } else {
            Point64::ORIGIN
        };
        let at = |x: f64, y: f64| Point64::new(x, y) + offset;

        match self.verb {
            Verb::Move => SvgCommand::Move(at(n[0], n[1])),
            Verb::Line => SvgCommand::Line(at(n[0], n[1])),
            Verb::Vertical if self.relative => SvgCommand::Line(at(0.0, n[0])),
            Verb::Vertical => SvgCommand::Line(Point64::new(current.x, n[0])),
            Verb::Horizontal if self.relative => SvgCommand::Line(at(n[0], 0.0)),
            Verb::Horizontal => SvgCommand::Line(Point64::new(n[0], current.y)),
            Verb::Quad => SvgCommand::Quad {
                control: at(n[0], n[1]),
                end: at(n[2], n[3]),
            },
            Verb::SmoothQuad => SvgCommand::Quad {
                control: self.reflected_control(Verb::SmoothQuad),
                end: at(n[0], n[1]),
            },
            Verb::Cubic => SvgCommand::Cubic {
                control1: at(n[0], n[1]),
                control2: at(n[2], n[3]),
                end: at(n[4], n[5]),
            },
            Verb::SmoothCubic => SvgCommand::Cubic {
                control1: self.reflected_control(Verb::SmoothCubic),
                control2: at(n[0], n[1]),
                end: at(n[2], n[3]),
            },
            Verb::Close => SvgCommand::Close,
        }
    }
}

/// Parse SVG path data into absolute commands. Never fails.
pub fn parse(d: &str) -> Vec<SvgCommand> {
    let mut parser = PathParser::new();
    for c in d.chars() {
        match Verb::from_letter(c) {
            Some((verb, relative)) => parser.switch(verb, relative),
            None => parser.buffer.push(c),
        }
    }
    parser.flush();

    tracing::trace!(commands = parser.commands.len(), "parsed path data");
    parser.commands
}

fn is_number_char(c: char) -> bool {
    matches!(c, '-' | '.' | '0'..='9' | 'e' | 'E')
}

/// Split the argument text of one command into numbers
///
/// A `-` not preceded by an exponent marker and a second `.` start a new
/// token; any character outside `-.0123456789eE` ends the current one.
pub(crate) fn tokenize_numbers(text: &str) -> Vec<f64> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut last: Option<char> = None;
    let mut is_decimal = false;

    for c in text.chars() {
        let starts_token = (c == '-' && last.is_some_and(|l| l != 'e' && l != 'E'))
            || (c == '.' && is_decimal);

        if starts_token {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
                is_decimal = false;
            }
            current.push(c);
        } else if is_number_char(c) {
            current.push(c);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
            is_decimal = false;
        }

        last = Some(c);
        if c == '.' {
            is_decimal = true;
        }
    }
    tokens.push(current);

    tokens
        .iter()
        .filter_map(|t| t.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point64 {
        Point64::new(x, y)
    }

    #[test]
    fn test_parse_triangle() {
        let commands = parse("M0,0 L10,0 L10,10 Z");
        assert_eq!(
            commands,
            vec![
                SvgCommand::Move(p(0.0, 0.0)),
                SvgCommand::Line(p(10.0, 0.0)),
                SvgCommand::Line(p(10.0, 10.0)),
                SvgCommand::Close,
            ]
        );
    }

    #[test]
    fn test_tokenizer_splits() {
        assert_eq!(tokenize_numbers("1-2"), vec![1.0, -2.0]);
        assert_eq!(tokenize_numbers("0.5.5"), vec![0.5, 0.5]);
        assert_eq!(tokenize_numbers("1e-2,3E2"), vec![0.01, 300.0]);
        assert_eq!(tokenize_numbers(" 4 ,5 "), vec![4.0, 5.0]);
        assert_eq!(tokenize_numbers("-.5-.5"), vec![-0.5, -0.5]);
    }

    #[test]
    fn test_unparseable_tokens_dropped() {
        assert_eq!(tokenize_numbers("- . e 7"), vec![7.0]);
        assert!(tokenize_numbers("").is_empty());
    }

    #[test]
    fn test_incomplete_group_dropped() {
        let commands = parse("M1 2 3");
        assert_eq!(commands, vec![SvgCommand::Move(p(1.0, 2.0))]);
    }

    #[test]
    fn test_implicit_repeats() {
        let commands = parse("M0 0 L1 1 2 2 3 3");
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[3], SvgCommand::Line(p(3.0, 3.0)));
    }

    #[test]
    fn test_relative_commands() {
        let commands = parse("m10 10 l5 0 l0 5");
        assert_eq!(
            commands,
            vec![
                SvgCommand::Move(p(10.0, 10.0)),
                SvgCommand::Line(p(15.0, 10.0)),
                SvgCommand::Line(p(15.0, 15.0)),
            ]
        );
    }

    #[test]
    fn test_vertical_horizontal() {
        let commands = parse("M2 3 H7 V9 h1 v-2");
        assert_eq!(
            commands[1..],
            [
                SvgCommand::Line(p(7.0, 3.0)),
                SvgCommand::Line(p(7.0, 9.0)),
                SvgCommand::Line(p(8.0, 9.0)),
                SvgCommand::Line(p(8.0, 7.0)),
            ]
        );
    }

    #[test]
    fn test_smooth_quad_reflects_only_after_quad() {
        let commands = parse("M0 0 Q5 10 10 0 T20 0");
        assert_eq!(
            commands[2],
            SvgCommand::Quad {
                control: p(15.0, -10.0),
                end: p(20.0, 0.0),
            }
        );

        // After a line the control collapses to the current point
        let commands = parse("M0 0 L10 0 T20 0");
        assert_eq!(
            commands[2],
            SvgCommand::Quad {
                control: p(10.0, 0.0),
                end: p(20.0, 0.0),
            }
        );
    }

    #[test]
    fn test_smooth_cubic_relative() {
        let commands = parse("M0 0 C0 5 5 10 10 10 s10 -10 10 -10");
        assert_eq!(
            commands[2],
            SvgCommand::Cubic {
                control1: p(15.0, 10.0),
                control2: p(20.0, 0.0),
                end: p(20.0, 0.0),
            }
        );
    }

    #[test]
    fn test_relative_after_close_uses_subpath_start() {
        let commands = parse("M10 10 L20 10 L20 20 z m1 1 l1 0");
        assert_eq!(commands[4], SvgCommand::Move(p(11.0, 11.0)));
        assert_eq!(commands[5], SvgCommand::Line(p(12.0, 11.0)));
    }

    #[test]
    fn test_close_ignores_numbers() {
        let commands = parse("M0 0 L1 1 Z 5 5 Z");
        assert_eq!(commands.iter().filter(|c| **c == SvgCommand::Close).count(), 2);
        assert_eq!(commands.len(), 4);
    }

    #[test]
    fn test_garbage_never_panics() {
        let inputs = [
            "",
            "Z",
            "zzzz",
            "M",
            "M-",
            "M1e",
            "M1e5e5",
            "A 1 1 0 0 1 5 5",
            "M0,0 L10 Q",
            "S S T T",
            "m1 1 c1 2 3",
            "—«M»1,2✓",
            "M1.2.3.4-5-6e-7e",
            "h5 v5 H V",
        ];
        for input in inputs {
            let commands = parse(input);
            for c in &commands {
                for pt in c.points() {
                    assert!(pt.x.is_finite() && pt.y.is_finite(), "{input}");
                }
            }
        }
    }
}
