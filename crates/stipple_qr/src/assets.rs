//! Asset resolution
//!
//! Dot tiles, eye glyphs, logos and image fills are referenced by name. An
//! [`AssetResolver`] maps names to SVG markup or encoded images; the
//! [`AssetCache`] validates each asset once per render and remembers
//! failures so a broken asset is reported a single time.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use image::GenericImageView;
use rustc_hash::FxHashMap;
use stipple_svg::{extract_inner_svg, extract_view_box, parse_view_box, SvgDocument, ViewBox};

/// Raw asset as handed over by a resolver
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Asset {
    /// Complete SVG document markup
    Svg(String),
    /// Bitmap image; `href` is a URL or data URI
    Image {
        href: String,
        width: u32,
        height: u32,
    },
}

impl Asset {
    /// Decode an encoded image and wrap it as a data URI
    ///
    /// Returns `None` when the bytes are not a decodable image.
    pub fn image_from_bytes(bytes: &[u8], mime: &str) -> Option<Asset> {
        let image = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(%err, "failed to decode image asset");
                return None;
            }
        };
        let (width, height) = image.dimensions();
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Some(Asset::Image {
            href: format!("data:{mime};base64,{encoded}"),
            width,
            height,
        })
    }
}

/// Maps asset names to assets
pub trait AssetResolver {
    fn resolve(&self, name: &str) -> Option<Asset>;
}

/// Resolver that never finds anything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAssets;

impl AssetResolver for NoAssets {
    fn resolve(&self, _name: &str) -> Option<Asset> {
        None
    }
}

/// Assets held in memory
#[derive(Clone, Debug, Default)]
pub struct MemoryAssets {
    assets: FxHashMap<String, Asset>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, asset: Asset) {
        self.assets.insert(name.into(), asset);
    }

    /// Builder form of `insert` for SVG markup
    pub fn with_svg(mut self, name: impl Into<String>, svg: impl Into<String>) -> Self {
        self.insert(name, Asset::Svg(svg.into()));
        self
    }

    pub fn with_image(
        mut self,
        name: impl Into<String>,
        href: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        self.insert(
            name,
            Asset::Image {
                href: href.into(),
                width,
                height,
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetResolver for MemoryAssets {
    fn resolve(&self, name: &str) -> Option<Asset> {
        self.assets.get(name).cloned()
    }
}

/// Assets loaded from `<root>/<name>.svg` or `<root>/<name>.png`
#[derive(Clone, Debug)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetResolver for DirectoryAssets {
    fn resolve(&self, name: &str) -> Option<Asset> {
        // Names are plain file stems
        if name.contains(['/', '\\']) || name.starts_with('.') {
            tracing::warn!(name, "rejecting asset name with path components");
            return None;
        }

        let svg_path = self.root.join(format!("{name}.svg"));
        if svg_path.is_file() {
            return match fs::read_to_string(&svg_path) {
                Ok(svg) => Some(Asset::Svg(svg)),
                Err(err) => {
                    tracing::warn!(path = %svg_path.display(), %err, "failed to read SVG asset");
                    None
                }
            };
        }

        let png_path = self.root.join(format!("{name}.png"));
        match fs::read(&png_path) {
            Ok(bytes) => Asset::image_from_bytes(&bytes, "image/png"),
            Err(_) => {
                tracing::debug!(name, root = %self.root.display(), "asset not found");
                None
            }
        }
    }
}

/// A parsed SVG asset ready for placement
#[derive(Debug)]
pub struct DocumentAsset {
    pub document: SvgDocument,
    pub view_box: ViewBox,
    /// Markup between the root element's tags
    pub inner: String,
    /// The complete document markup
    pub source: String,
}

/// A validated asset
#[derive(Clone, Debug)]
pub enum ResolvedAsset {
    Document(Arc<DocumentAsset>),
    Image {
        href: String,
        width: u32,
        height: u32,
    },
}

impl ResolvedAsset {
    /// Natural size of the asset in its own units
    pub fn size(&self) -> (f64, f64) {
        match self {
            ResolvedAsset::Document(doc) => (doc.view_box.width, doc.view_box.height),
            ResolvedAsset::Image { width, height, .. } => (*width as f64, *height as f64),
        }
    }
}

/// Answers whether an asset can be drawn, before any module is committed
pub trait AssetGate {
    fn resolves(&mut self, name: &str) -> bool;
}

/// Per-render cache of validated assets
pub struct AssetCache<'r> {
    resolver: &'r dyn AssetResolver,
    entries: FxHashMap<String, Option<ResolvedAsset>>,
}

impl<'r> AssetCache<'r> {
    pub fn new(resolver: &'r dyn AssetResolver) -> Self {
        Self {
            resolver,
            entries: FxHashMap::default(),
        }
    }

    /// Resolve and validate an asset, caching the outcome
    pub fn get(&mut self, name: &str) -> Option<ResolvedAsset> {
        if let Some(entry) = self.entries.get(name) {
            return entry.clone();
        }

        let resolved = self.load(name);
        if resolved.is_none() {
            tracing::warn!(name, "asset failed to resolve");
        }
        self.entries.insert(name.to_string(), resolved.clone());
        resolved
    }

    /// Number of names looked up so far, including failures
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn load(&self, name: &str) -> Option<ResolvedAsset> {
        match self.resolver.resolve(name)? {
            Asset::Svg(source) => load_document(name, source),
            Asset::Image {
                href,
                width,
                height,
            } => {
                if width == 0 || height == 0 || href.is_empty() {
                    tracing::warn!(name, width, height, "image asset has no content");
                    return None;
                }
                Some(ResolvedAsset::Image {
                    href,
                    width,
                    height,
                })
            }
        }
    }
}

impl AssetGate for AssetCache<'_> {
    fn resolves(&mut self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

fn load_document(name: &str, source: String) -> Option<ResolvedAsset> {
    let document = match SvgDocument::from_str(&source) {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!(name, %err, "invalid SVG asset");
            return None;
        }
    };

    let view_box = extract_view_box(&source)
        .and_then(parse_view_box)
        .unwrap_or(ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width: document.width as f64,
            height: document.height as f64,
        });
    if view_box.width <= 0.0 || view_box.height <= 0.0 {
        tracing::warn!(name, "SVG asset has an empty viewBox");
        return None;
    }

    let inner = extract_inner_svg(&source)?.to_string();
    Some(ResolvedAsset::Document(Arc::new(DocumentAsset {
        document,
        view_box,
        inner,
        source,
    })))
}
