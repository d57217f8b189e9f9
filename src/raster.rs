//! # Rasterization
//!
//! Turns a preview [`Scene`] into one tall RGBA bitmap. The scene is
//! serialized to SVG and rendered with resvg into a tiny-skia pixmap that
//! is pre-filled with the page background, so anti-aliased edges blend
//! against the same color the PDF pages are padded with.

use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::color::Rgb;
use crate::error::ExportError;
use crate::preview::Scene;

/// Options for a single capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Device pixels per CSS pixel.
    pub scale: f32,
    /// Allow cross-origin images. Logos are inline data URLs, so nothing
    /// is ever fetched; the flag is carried for backends that load remote
    /// resources.
    pub use_cors: bool,
    /// Fill color behind the scene.
    pub background: Rgb,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            use_cors: true,
            background: Rgb::WHITE,
        }
    }
}

/// Captures a rendered preview as pixels.
pub trait Rasterizer {
    fn rasterize(&self, scene: &Scene, options: &RasterOptions) -> Result<RgbaImage, ExportError>;
}

/// resvg-backed rasterizer.
pub struct SvgRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SvgRasterizer {
    /// Create a rasterizer with the system fonts loaded.
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();

        if fontdb.is_empty() {
            warn!("no system fonts found; preview text will not be rasterized");
        } else {
            debug!(faces = fontdb.len(), "loaded system fonts");
        }

        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    /// The faces text is drawn with.
    pub fn fontdb(&self) -> &usvg::fontdb::Database {
        &self.fontdb
    }

    /// Create a rasterizer over a caller-supplied font database.
    pub fn with_fonts(fontdb: usvg::fontdb::Database) -> Self {
        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    fn render_svg(
        &self,
        svg: &str,
        width: f32,
        height: f32,
        options: &RasterOptions,
    ) -> Result<RgbaImage, ExportError> {
        let tree = {
            let mut opts = usvg::Options::default();
            opts.fontdb = Arc::clone(&self.fontdb);
            usvg::Tree::from_str(svg, &opts)
                .map_err(|e| ExportError::Rasterization(format!("SVG parsing failed: {}", e)))?
        };

        let target_width = (width * options.scale).ceil();
        let target_height = (height * options.scale).ceil();
        if !(target_width >= 1.0 && target_height >= 1.0) {
            return Err(ExportError::Rasterization(format!(
                "capture has no area ({}x{} at scale {})",
                width, height, options.scale
            )));
        }

        let mut pixmap = tiny_skia::Pixmap::new(target_width as u32, target_height as u32)
            .ok_or_else(|| {
                ExportError::Rasterization(format!(
                    "failed to create pixmap ({}x{})",
                    target_width, target_height
                ))
            })?;

        let bg = options.background;
        pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, 255));

        let transform = tiny_skia::Transform::from_scale(options.scale, options.scale);
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        Ok(pixmap_to_rgba(&pixmap))
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, scene: &Scene, options: &RasterOptions) -> Result<RgbaImage, ExportError> {
        let svg = scene.to_svg();
        let image = self.render_svg(&svg, scene.width, scene.height, options)?;
        debug!(
            width = image.width(),
            height = image.height(),
            scale = options.scale,
            "rasterized preview"
        );
        Ok(image)
    }
}

/// tiny-skia stores premultiplied alpha; `image` expects straight alpha.
fn pixmap_to_rgba(pixmap: &tiny_skia::Pixmap) -> RgbaImage {
    let mut raw = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::model::{Quotation, StyleOptions};
    use crate::preview::render_preview;
    use crate::totals::compute_totals;
    use chrono::NaiveDate;

    fn sample_scene(style: &StyleOptions) -> Scene {
        let q = Quotation::sample(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
        render_preview(&FontContext::new(), &q, &compute_totals(&q.line_items, q.tax_rate), style)
    }

    fn rasterizer() -> SvgRasterizer {
        SvgRasterizer::with_fonts(usvg::fontdb::Database::new())
    }

    #[test]
    fn test_dimensions_follow_scale() {
        let scene = sample_scene(&StyleOptions::default());
        let options = RasterOptions {
            scale: 2.0,
            ..RasterOptions::default()
        };
        let image = rasterizer().rasterize(&scene, &options).unwrap();
        assert_eq!(image.width(), (scene.width * 2.0).ceil() as u32);
        assert_eq!(image.height(), (scene.height * 2.0).ceil() as u32);
    }

    #[test]
    fn test_background_fills_corners() {
        let style = StyleOptions {
            background_color: "#102030".to_string(),
            ..StyleOptions::default()
        };
        let scene = sample_scene(&style);
        let options = RasterOptions {
            scale: 1.0,
            use_cors: true,
            background: scene.background,
        };
        let image = rasterizer().rasterize(&scene, &options).unwrap();
        let corner = image.get_pixel(0, image.height() - 1);
        assert_eq!(corner.0, [0x10, 0x20, 0x30, 255]);
    }

    #[test]
    fn test_accent_band_is_drawn() {
        let style = StyleOptions {
            accent_color: "#ff0000".to_string(),
            ..StyleOptions::default()
        };
        let scene = sample_scene(&style);
        let image = rasterizer()
            .rasterize(&scene, &RasterOptions { scale: 1.0, ..RasterOptions::default() })
            .unwrap();
        let red = image.pixels().filter(|p| p.0 == [255, 0, 0, 255]).count();
        assert!(red > 100, "expected accent pixels, found {}", red);
    }

    #[test]
    fn test_zero_scale_is_an_error() {
        let scene = sample_scene(&StyleOptions::default());
        let options = RasterOptions {
            scale: 0.0,
            ..RasterOptions::default()
        };
        let err = rasterizer().rasterize(&scene, &options).unwrap_err();
        assert!(matches!(err, ExportError::Rasterization(_)));
    }

    #[test]
    fn test_unparsable_svg_is_an_error() {
        let err = rasterizer()
            .render_svg("<not svg", 10.0, 10.0, &RasterOptions::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::Rasterization(_)));
    }
}
