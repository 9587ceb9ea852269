//! Single-primitive SVG fragment extraction
//!
//! Dot and eye glyphs are supplied as small SVG snippets. The extractor finds
//! the first drawable primitive in the snippet, strips its paint attributes so
//! the renderer can apply its own fills, and exposes the remaining attributes
//! through a typed [`Attributes`] map.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::parser::Point64;

static PRIMITIVE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(path|rect|circle|ellipse|polygon|polyline|line)\b[^>]*>")
        .expect("valid primitive tag regex")
});

static PAINT_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+(fill|stroke|stroke-width)\s*=\s*"[^"]*""#)
        .expect("valid paint attribute regex")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\w:-]+)\s*=\s*"([^"]*)""#).expect("valid attribute regex")
});

static ROTATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rotate\(\s*(-?\d+(?:\.\d+)?)").expect("valid rotate regex")
});

static VIEW_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"viewBox\s*=\s*"([^"]*)""#).expect("valid viewBox regex")
});

static SVG_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<svg\b[^>]*>(.*)</svg\s*>").expect("valid svg body regex")
});

/// Primitive element kinds the extractor recognizes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeTag {
    Path,
    Rect,
    Circle,
    Ellipse,
    Polygon,
    Polyline,
    Line,
}

impl ShapeTag {
    pub fn from_name(name: &str) -> Option<Self> {
        let tag = match name.to_ascii_lowercase().as_str() {
            "path" => ShapeTag::Path,
            "rect" => ShapeTag::Rect,
            "circle" => ShapeTag::Circle,
            "ellipse" => ShapeTag::Ellipse,
            "polygon" => ShapeTag::Polygon,
            "polyline" => ShapeTag::Polyline,
            "line" => ShapeTag::Line,
            _ => return None,
        };
        Some(tag)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeTag::Path => "path",
            ShapeTag::Rect => "rect",
            ShapeTag::Circle => "circle",
            ShapeTag::Ellipse => "ellipse",
            ShapeTag::Polygon => "polygon",
            ShapeTag::Polyline => "polyline",
            ShapeTag::Line => "line",
        }
    }
}

/// Attribute map of one element, in source order; a repeated name keeps the
/// last value
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes {
    values: IndexMap<String, String>,
}

impl Attributes {
    /// Extract every `name="value"` pair from a tag
    pub fn parse(tag: &str) -> Self {
        let mut values = IndexMap::new();
        for caps in ATTRIBUTE.captures_iter(tag) {
            values.insert(caps[1].to_string(), caps[2].to_string());
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Numeric attribute; missing or unparseable values give `default`
    pub fn numeric(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    /// Rotation in degrees from a `rotate(θ)` inside the attribute, or 0
    pub fn rotation(&self, key: &str) -> f64 {
        self.get(key).map(extract_rotation).unwrap_or(0.0)
    }

    /// Point list attribute (`points` of polygons and polylines)
    pub fn points(&self, key: &str) -> Vec<Point64> {
        self.get(key).map(parse_points).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The first primitive of a fragment with its paint attributes removed
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedShape {
    pub tag: ShapeTag,
    /// Cleaned, self-closing element markup
    pub markup: String,
    pub attributes: Attributes,
}

impl ExtractedShape {
    /// Path data of a `path` element
    pub fn path_data(&self) -> Option<&str> {
        match self.tag {
            ShapeTag::Path => self.attributes.get("d"),
            _ => None,
        }
    }
}

/// Find the first `path|rect|circle|ellipse|polygon|polyline|line` element
///
/// Returns `None` when the fragment contains no recognized primitive.
pub fn extract_main_shape(fragment: &str) -> Option<ExtractedShape> {
    let found = PRIMITIVE_TAG.captures(fragment)?;
    let tag = ShapeTag::from_name(&found[1])?;

    let mut markup = PAINT_ATTRIBUTE.replace_all(&found[0], "").into_owned();
    if !markup.ends_with("/>") && !markup.contains("</") {
        let open = markup.trim_end_matches('>').trim_end();
        markup = format!("{open} />");
    }

    let attributes = Attributes::parse(&markup);
    tracing::trace!(tag = tag.as_str(), attributes = attributes.len(), "extracted shape");

    Some(ExtractedShape {
        tag,
        markup,
        attributes,
    })
}

/// Rotation angle of the first `rotate(θ)` in a transform list, or 0
pub fn extract_rotation(transform: &str) -> f64 {
    ROTATE
        .captures(transform)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Parse a `points` list; commas and whitespace both separate values,
/// unparseable values are dropped and a trailing unpaired value is ignored
pub fn parse_points(s: &str) -> Vec<Point64> {
    let values: Vec<f64> = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect();

    values
        .chunks_exact(2)
        .map(|pair| Point64::new(pair[0], pair[1]))
        .collect()
}

/// `min-x min-y width height` of a document's viewBox
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn center(&self) -> Point64 {
        Point64::new(
            self.min_x + self.width / 2.0,
            self.min_y + self.height / 2.0,
        )
    }
}

/// Raw `viewBox` attribute value of a document
pub fn extract_view_box(svg: &str) -> Option<&str> {
    VIEW_BOX
        .captures(svg)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse a `viewBox` value; exactly four numbers are required
pub fn parse_view_box(value: &str) -> Option<ViewBox> {
    let parts: Vec<f64> = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()?;

    match parts.as_slice() {
        [min_x, min_y, width, height] => Some(ViewBox {
            min_x: *min_x,
            min_y: *min_y,
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

/// Markup between the root `<svg>` element's tags
pub fn extract_inner_svg(svg: &str) -> Option<&str> {
    SVG_BODY
        .captures(svg)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
