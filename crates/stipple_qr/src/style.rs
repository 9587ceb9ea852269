//! Style configuration
//!
//! [`StyleConfig`] is the serde form loaded from TOML; [`Style`] is the
//! validated form the renderer works with. Validation happens once, before
//! any grid is scanned, so a bad color or an empty tile pool fails the whole
//! render up front instead of leaving holes in the output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stipple_core::{Color, Point};
use stipple_svg::{extract_main_shape, ExtractedShape};

use crate::error::StyleError;
use crate::placement::ensure_drawable;

// =============================================================================
// Configuration (serde)
// =============================================================================

/// Complete style description as written in a style file
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StyleConfig {
    #[serde(default)]
    pub dots: DotConfig,
    #[serde(default)]
    pub eye: EyeConfig,
    #[serde(default = "default_foreground")]
    pub foreground: FillConfig,
    #[serde(default = "default_background")]
    pub background: FillConfig,
    #[serde(default)]
    pub backdrop: BackdropConfig,
    #[serde(default)]
    pub logo: Option<LogoConfig>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            dots: DotConfig::default(),
            eye: EyeConfig::default(),
            foreground: default_foreground(),
            background: default_background(),
            backdrop: BackdropConfig::default(),
            logo: None,
        }
    }
}

fn default_foreground() -> FillConfig {
    FillConfig::Solid {
        color: "#000000".to_string(),
    }
}

fn default_background() -> FillConfig {
    FillConfig::Solid {
        color: "#ffffff".to_string(),
    }
}

/// How data modules are drawn
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DotConfig {
    /// Plain squares, merged into blocks up to `max_group` modules wide
    Square {
        #[serde(default = "default_max_group")]
        max_group: usize,
    },
    /// A single-primitive SVG fragment stretched over every block
    Fragment {
        svg: String,
        #[serde(default)]
        grouping: FragmentGrouping,
    },
    /// Procedural line art along runs of modules
    Lines {
        #[serde(default)]
        direction: LineDirection,
        #[serde(default)]
        cap: LineCapStyle,
        #[serde(default = "default_thickness")]
        thickness: f64,
    },
    /// Named assets keyed by tile size tag (`"2x2"`)
    Tiles { tiles: BTreeMap<String, Vec<String>> },
}

impl Default for DotConfig {
    fn default() -> Self {
        DotConfig::Square {
            max_group: default_max_group(),
        }
    }
}

fn default_max_group() -> usize {
    3
}

fn default_thickness() -> f64 {
    0.8
}

/// Grouping mode of fragment dots
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentGrouping {
    /// One fragment per module
    None,
    /// Square blocks up to the given size
    Group(usize),
}

impl Default for FragmentGrouping {
    fn default() -> Self {
        FragmentGrouping::Group(3)
    }
}

/// Direction of line-art runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineDirection {
    /// Along +x
    #[default]
    Horizontal,
    /// Along +y
    Vertical,
    /// Along (+x, +y)
    DiagonalDown,
    /// Along (-x, +y)
    DiagonalUp,
}

impl LineDirection {
    /// Grid step between consecutive modules of a run
    pub fn step(&self) -> (isize, isize) {
        match self {
            LineDirection::Horizontal => (1, 0),
            LineDirection::Vertical => (0, 1),
            LineDirection::DiagonalDown => (1, 1),
            LineDirection::DiagonalUp => (-1, 1),
        }
    }

    /// Angle of the run axis in degrees, y pointing down
    pub fn angle(&self) -> f64 {
        match self {
            LineDirection::Horizontal => 0.0,
            LineDirection::Vertical => 90.0,
            LineDirection::DiagonalDown => 45.0,
            LineDirection::DiagonalUp => 135.0,
        }
    }

    pub fn is_diagonal(&self) -> bool {
        matches!(self, LineDirection::DiagonalDown | LineDirection::DiagonalUp)
    }
}

/// End shape of line-art runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCapStyle {
    /// Flat square ends
    None,
    /// Chamfered ends, outer corners cut at 45°
    Angular,
    #[default]
    Rounded,
}

/// How the finder patterns are drawn
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EyeConfig {
    /// Filled 3×3 center and a stroked ring
    #[default]
    Squares,
    /// Filled 3×3 center and border modules drawn like data modules
    Modules,
    /// A named asset over the whole 7×7 pattern
    Asset { name: String },
    /// A single-primitive SVG fragment over the whole 7×7 pattern
    Fragment { svg: String },
}

/// Paint for the foreground (modules) or the background
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillConfig {
    Solid {
        color: String,
    },
    LinearGradient {
        start: String,
        end: String,
        #[serde(default)]
        direction: GradientDirection,
    },
    /// A named image asset stretched over the canvas
    Image {
        asset: String,
    },
}

/// Gradient axis across the canvas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientDirection {
    #[default]
    TopToBottom,
    LeftToRight,
    TopLeftToBottomRight,
    TopRightToBottomLeft,
}

impl GradientDirection {
    /// Start and end points in the unit square
    pub fn unit_points(&self) -> (Point, Point) {
        match self {
            GradientDirection::TopToBottom => (Point::new(0.5, 0.0), Point::new(0.5, 1.0)),
            GradientDirection::LeftToRight => (Point::new(0.0, 0.5), Point::new(1.0, 0.5)),
            GradientDirection::TopLeftToBottomRight => {
                (Point::new(0.0, 0.0), Point::new(1.0, 1.0))
            }
            GradientDirection::TopRightToBottomLeft => {
                (Point::new(1.0, 0.0), Point::new(0.0, 1.0))
            }
        }
    }
}

/// Margin and corner rounding of the background
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BackdropConfig {
    /// Quiet zone in modules, on every side
    #[serde(default = "default_quiet_zone")]
    pub quiet_zone: u32,
    /// Background corner radius in modules
    #[serde(default)]
    pub corner_radius: f64,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            quiet_zone: default_quiet_zone(),
            corner_radius: 0.0,
        }
    }
}

fn default_quiet_zone() -> u32 {
    1
}

/// Logo placed over the modules
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LogoConfig {
    pub asset: String,
    #[serde(default)]
    pub position: LogoPosition,
    #[serde(default)]
    pub style: LogoShape,
    /// Logo width relative to the canvas width
    #[serde(default = "default_logo_size")]
    pub size: f64,
    /// Margin around the logo relative to the canvas width
    #[serde(default = "default_logo_margin")]
    pub margin: f64,
}

fn default_logo_size() -> f64 {
    0.2
}

fn default_logo_margin() -> f64 {
    0.02
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoPosition {
    #[default]
    Center,
    BottomRight,
}

/// Outline of the logo and the area cleared behind it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoShape {
    #[default]
    Rect,
    Round,
    RoundedRect,
    /// Square holder framed by L-shaped corner marks
    ScanAssistRect,
    /// Rounded holder framed by rounded corner marks
    ScanAssistRoundedRect,
}

impl LogoShape {
    pub fn is_scan_assist(&self) -> bool {
        matches!(self, LogoShape::ScanAssistRect | LogoShape::ScanAssistRoundedRect)
    }
}

// =============================================================================
// Validated style
// =============================================================================

/// A validated style
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub dots: DotStyle,
    pub eye: EyeStyle,
    pub foreground: Fill,
    pub background: Fill,
    pub backdrop: Backdrop,
    pub logo: Option<LogoAdjustment>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            dots: DotStyle::Square { max_group: 3 },
            eye: EyeStyle::Squares,
            foreground: Fill::Solid(Color::BLACK),
            background: Fill::Solid(Color::WHITE),
            backdrop: Backdrop::default(),
            logo: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DotStyle {
    Square {
        max_group: usize,
    },
    Fragment {
        shape: ExtractedShape,
        grouping: FragmentGrouping,
    },
    Lines {
        direction: LineDirection,
        cap: LineCapStyle,
        thickness: f64,
    },
    /// Tile sizes, largest first
    Tiles(Vec<TileSize>),
}

/// One tile size and the assets that can fill it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileSize {
    pub width: usize,
    pub height: usize,
    pub assets: Vec<String>,
}

impl TileSize {
    /// Parse a `WxH` tag such as `2x2` or `1X3`
    pub fn parse_tag(tag: &str) -> Option<(usize, usize)> {
        let (w, h) = tag.trim().split_once(['x', 'X'])?;
        let width = w.trim().parse::<usize>().ok()?;
        let height = h.trim().parse::<usize>().ok()?;
        (width > 0 && height > 0).then_some((width, height))
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum EyeStyle {
    #[default]
    Squares,
    Modules,
    Asset {
        name: String,
    },
    Fragment {
        shape: ExtractedShape,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Fill {
    Solid(Color),
    LinearGradient {
        start: Color,
        end: Color,
        direction: GradientDirection,
    },
    Image {
        asset: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Backdrop {
    pub quiet_zone: u32,
    pub corner_radius: f64,
}

impl Default for Backdrop {
    fn default() -> Self {
        Self {
            quiet_zone: 1,
            corner_radius: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogoAdjustment {
    pub asset: String,
    pub position: LogoPosition,
    pub shape: LogoShape,
    pub size: f64,
    pub margin: f64,
}

impl Style {
    /// Validate a configuration
    pub fn from_config(config: &StyleConfig) -> Result<Self, StyleError> {
        let style = Self {
            dots: dot_style(&config.dots)?,
            eye: eye_style(&config.eye)?,
            foreground: fill(&config.foreground)?,
            background: fill(&config.background)?,
            backdrop: Backdrop {
                quiet_zone: config.backdrop.quiet_zone,
                corner_radius: config.backdrop.corner_radius.max(0.0),
            },
            logo: config.logo.as_ref().map(logo).transpose()?,
        };

        tracing::debug!(logo = style.logo.is_some(), "validated style");
        Ok(style)
    }
}

fn dot_style(config: &DotConfig) -> Result<DotStyle, StyleError> {
    match config {
        DotConfig::Square { max_group } => Ok(DotStyle::Square {
            max_group: group_size(*max_group)?,
        }),
        DotConfig::Fragment { svg, grouping } => {
            if let FragmentGrouping::Group(n) = grouping {
                group_size(*n)?;
            }
            let shape = extract_main_shape(svg).ok_or(StyleError::MissingPrimitive("dot"))?;
            ensure_drawable(&shape, "dot")?;
            Ok(DotStyle::Fragment {
                shape,
                grouping: *grouping,
            })
        }
        DotConfig::Lines {
            direction,
            cap,
            thickness,
        } => {
            if !(*thickness > 0.0 && *thickness <= 1.0) {
                return Err(StyleError::LineThickness(*thickness));
            }
            Ok(DotStyle::Lines {
                direction: *direction,
                cap: *cap,
                thickness: *thickness,
            })
        }
        DotConfig::Tiles { tiles } => {
            let mut sizes = tiles
                .iter()
                .map(|(tag, assets)| {
                    let (width, height) = TileSize::parse_tag(tag)
                        .ok_or_else(|| StyleError::InvalidTileSize(tag.clone()))?;
                    if assets.is_empty() {
                        return Err(StyleError::EmptyTilePool(tag.clone()));
                    }
                    if assets.iter().any(|a| a.trim().is_empty()) {
                        return Err(StyleError::EmptyAssetName);
                    }
                    Ok(TileSize {
                        width,
                        height,
                        assets: assets.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            if sizes.is_empty() {
                return Err(StyleError::NoTiles);
            }
            sizes.sort_by(|a, b| {
                b.area()
                    .cmp(&a.area())
                    .then(b.width.cmp(&a.width))
                    .then(b.height.cmp(&a.height))
            });
            Ok(DotStyle::Tiles(sizes))
        }
    }
}

fn group_size(n: usize) -> Result<usize, StyleError> {
    if (1..=5).contains(&n) {
        Ok(n)
    } else {
        Err(StyleError::GroupSize(n))
    }
}

fn eye_style(config: &EyeConfig) -> Result<EyeStyle, StyleError> {
    Ok(match config {
        EyeConfig::Squares => EyeStyle::Squares,
        EyeConfig::Modules => EyeStyle::Modules,
        EyeConfig::Asset { name } => {
            if name.trim().is_empty() {
                return Err(StyleError::EmptyAssetName);
            }
            EyeStyle::Asset { name: name.clone() }
        }
        EyeConfig::Fragment { svg } => {
            let shape = extract_main_shape(svg).ok_or(StyleError::MissingPrimitive("eye"))?;
            ensure_drawable(&shape, "eye")?;
            EyeStyle::Fragment { shape }
        }
    })
}

fn color(value: &str) -> Result<Color, StyleError> {
    Color::from_hex_str(value).ok_or_else(|| StyleError::InvalidColor(value.to_string()))
}

fn fill(config: &FillConfig) -> Result<Fill, StyleError> {
    Ok(match config {
        FillConfig::Solid { color: c } => Fill::Solid(color(c)?),
        FillConfig::LinearGradient {
            start,
            end,
            direction,
        } => Fill::LinearGradient {
            start: color(start)?,
            end: color(end)?,
            direction: *direction,
        },
        FillConfig::Image { asset } => {
            if asset.trim().is_empty() {
                return Err(StyleError::EmptyAssetName);
            }
            Fill::Image {
                asset: asset.clone(),
            }
        }
    })
}

fn logo(config: &LogoConfig) -> Result<LogoAdjustment, StyleError> {
    if config.asset.trim().is_empty() {
        return Err(StyleError::EmptyAssetName);
    }
    if !(config.size > 0.0 && config.size < 1.0) {
        return Err(StyleError::LogoSize(config.size));
    }
    if !(config.margin >= 0.0 && config.margin < 0.5) {
        return Err(StyleError::LogoMargin(config.margin));
    }
    Ok(LogoAdjustment {
        asset: config.asset.clone(),
        position: config.position,
        shape: config.style,
        size: config.size,
        margin: config.margin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let style = Style::from_config(&StyleConfig::default()).unwrap();
        assert_eq!(style, Style::default());
    }

    #[test]
    fn test_tile_sizes_ordered_largest_first() {
        let mut tiles = BTreeMap::new();
        tiles.insert("1x1".to_string(), vec!["dot".to_string()]);
        tiles.insert("1x3".to_string(), vec!["bar".to_string()]);
        tiles.insert("3x1".to_string(), vec!["wide".to_string()]);
        tiles.insert("2X2".to_string(), vec!["a".to_string(), "b".to_string()]);

        let style = dot_style(&DotConfig::Tiles { tiles }).unwrap();
        let DotStyle::Tiles(sizes) = style else {
            panic!("expected tiles");
        };
        let order: Vec<(usize, usize)> = sizes.iter().map(|t| (t.width, t.height)).collect();
        assert_eq!(order, vec![(2, 2), (3, 1), (1, 3), (1, 1)]);
    }

    #[test]
    fn test_tile_errors() {
        let mut tiles = BTreeMap::new();
        tiles.insert("2by2".to_string(), vec!["a".to_string()]);
        assert_eq!(
            dot_style(&DotConfig::Tiles { tiles }),
            Err(StyleError::InvalidTileSize("2by2".to_string()))
        );

        let mut tiles = BTreeMap::new();
        tiles.insert("2x2".to_string(), vec![]);
        assert_eq!(
            dot_style(&DotConfig::Tiles { tiles }),
            Err(StyleError::EmptyTilePool("2x2".to_string()))
        );

        assert_eq!(
            dot_style(&DotConfig::Tiles {
                tiles: BTreeMap::new()
            }),
            Err(StyleError::NoTiles)
        );
        assert_eq!(TileSize::parse_tag("0x2"), None);
    }

    #[test]
    fn test_invalid_values_fail_fast() {
        let config = StyleConfig {
            foreground: FillConfig::Solid {
                color: "#12345".to_string(),
            },
            ..StyleConfig::default()
        };
        assert_eq!(
            Style::from_config(&config),
            Err(StyleError::InvalidColor("#12345".to_string()))
        );

        let config = StyleConfig {
            dots: DotConfig::Fragment {
                svg: "<g/>".to_string(),
                grouping: FragmentGrouping::None,
            },
            ..StyleConfig::default()
        };
        assert_eq!(
            Style::from_config(&config),
            Err(StyleError::MissingPrimitive("dot"))
        );

        let config = StyleConfig {
            dots: DotConfig::Square { max_group: 9 },
            ..StyleConfig::default()
        };
        assert_eq!(Style::from_config(&config), Err(StyleError::GroupSize(9)));

        let config = StyleConfig {
            dots: DotConfig::Lines {
                direction: LineDirection::Vertical,
                cap: LineCapStyle::None,
                thickness: 0.0,
            },
            ..StyleConfig::default()
        };
        assert_eq!(
            Style::from_config(&config),
            Err(StyleError::LineThickness(0.0))
        );
    }

    #[test]
    fn test_undrawable_fragments_fail_fast() {
        for svg in [r#"<path d=""/>"#, r#"<polygon points="1"/>"#] {
            let config = StyleConfig {
                dots: DotConfig::Fragment {
                    svg: svg.to_string(),
                    grouping: FragmentGrouping::None,
                },
                ..StyleConfig::default()
            };
            assert_eq!(
                Style::from_config(&config),
                Err(StyleError::UndrawablePrimitive("dot"))
            );
        }

        let config = StyleConfig {
            eye: EyeConfig::Fragment {
                svg: r#"<path d="zz"/>"#.to_string(),
            },
            ..StyleConfig::default()
        };
        assert_eq!(
            Style::from_config(&config),
            Err(StyleError::UndrawablePrimitive("eye"))
        );

        let config = StyleConfig {
            eye: EyeConfig::Fragment {
                svg: r#"<circle r="3"/>"#.to_string(),
            },
            ..StyleConfig::default()
        };
        assert!(Style::from_config(&config).is_ok());
    }

    #[test]
    fn test_logo_validation() {
        let mut logo = LogoConfig {
            asset: "logo".to_string(),
            position: LogoPosition::Center,
            style: LogoShape::Round,
            size: 1.2,
            margin: 0.0,
        };
        let config = StyleConfig {
            logo: Some(logo.clone()),
            ..StyleConfig::default()
        };
        assert_eq!(Style::from_config(&config), Err(StyleError::LogoSize(1.2)));

        logo.size = 0.25;
        let config = StyleConfig {
            logo: Some(logo),
            ..StyleConfig::default()
        };
        let style = Style::from_config(&config).unwrap();
        assert_eq!(style.logo.unwrap().shape, LogoShape::Round);
    }

    #[test]
    fn test_gradient_unit_points() {
        let (start, end) = GradientDirection::TopRightToBottomLeft.unit_points();
        assert_eq!(start, Point::new(1.0, 0.0));
        assert_eq!(end, Point::new(0.0, 1.0));
        assert_eq!(LineDirection::DiagonalUp.step(), (-1, 1));
    }
}
