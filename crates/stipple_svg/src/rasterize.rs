//! SVG rasterization through resvg and tiny-skia

use tiny_skia::{Pixmap, Transform};
use usvg::Tree;

use crate::document::SvgDocument;
use crate::error::SvgError;

/// Rasterized RGBA image, straight (not premultiplied) alpha
#[derive(Clone, Debug)]
pub struct RasterizedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RasterizedImage {
    /// Rasterize an SVG string into a `width × height` image
    ///
    /// The document is scaled to fit while keeping its aspect ratio and
    /// centered within the bounds.
    pub fn from_str(svg: &str, width: u32, height: u32) -> Result<Self, SvgError> {
        check_dimensions(width, height)?;
        let document = SvgDocument::from_str(svg)?;
        Self::from_document(&document, width, height)
    }

    /// Rasterize an already parsed document
    pub fn from_document(
        document: &SvgDocument,
        width: u32,
        height: u32,
    ) -> Result<Self, SvgError> {
        check_dimensions(width, height)?;
        render_tree(document.tree(), width, height)
    }

    /// RGBA value of one pixel, `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.pixels
            .get(i..i + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), SvgError> {
    if width == 0 || height == 0 {
        return Err(SvgError::InvalidDimensions { width, height });
    }
    Ok(())
}

fn render_tree(tree: &Tree, width: u32, height: u32) -> Result<RasterizedImage, SvgError> {
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| SvgError::Raster(format!("cannot allocate {width}x{height} pixmap")))?;

    let size = tree.size();
    let scale = (width as f32 / size.width()).min(height as f32 / size.height());
    let offset_x = (width as f32 - size.width() * scale) / 2.0;
    let offset_y = (height as f32 - size.height() * scale) / 2.0;

    let transform = Transform::from_scale(scale, scale).post_translate(offset_x, offset_y);
    resvg::render(tree, transform, &mut pixmap.as_mut());

    tracing::debug!(width, height, scale, "rasterized SVG");

    Ok(RasterizedImage {
        pixels: unpremultiply(pixmap.data()),
        width,
        height,
    })
}

/// tiny-skia stores premultiplied alpha
fn unpremultiply(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(4)
        .flat_map(|px| {
            let a = px[3] as f32 / 255.0;
            if a > 0.0 {
                let channel = |v: u8| (v as f32 / a).min(255.0) as u8;
                [channel(px[0]), channel(px[1]), channel(px[2]), px[3]]
            } else {
                [0, 0, 0, 0]
            }
        })
        .collect()
}
