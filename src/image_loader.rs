//! # Image Loading and Encoding
//!
//! Three jobs:
//! - turning an uploaded logo file into a self-contained data URL,
//! - reading a logo data URL back for preview sizing,
//! - encoding page canvases for PDF embedding.
//!
//! Lossless canvases become RGB pixels with a separate alpha channel for
//! SMask transparency; lossy ones are JPEG-encoded and embedded as-is with
//! DCTDecode.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::{ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::ImageError;

/// A fully decoded/loaded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw JPEG bytes, embedded directly with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes (grayscale alpha). None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// Image formats accepted for logo upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Webp => "image/webp",
        }
    }
}

/// How a page canvas is encoded before it is embedded in the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    /// Lossless: RGB pixels, Flate-compressed.
    #[default]
    Png,
    /// Lossy JPEG at the given quality (1-100), embedded as DCTDecode.
    Jpeg { quality: u8 },
}

/// Identify an image from its magic bytes.
pub fn sniff_format(data: &[u8]) -> Result<ImageKind, ImageError> {
    if is_jpeg(data) {
        Ok(ImageKind::Jpeg)
    } else if is_png(data) {
        Ok(ImageKind::Png)
    } else if is_webp(data) {
        Ok(ImageKind::Webp)
    } else {
        Err(ImageError::UnsupportedFormat)
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

/// Encode raw image bytes as a `data:<mime>;base64,...` URL.
pub fn to_data_url(data: &[u8]) -> Result<String, ImageError> {
    let kind = sniff_format(data)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(data);
    Ok(format!("data:{};base64,{}", kind.mime_type(), b64))
}

/// Read a user-selected image file into a data URL. Nothing is fetched
/// over the network and nothing is written to disk.
pub fn read_logo_file(path: &Path) -> Result<String, ImageError> {
    let data = std::fs::read(path).map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    to_data_url(&data)
}

/// Decode the payload of a `data:image/...;base64,...` URL.
pub fn data_url_bytes(src: &str) -> Result<Vec<u8>, ImageError> {
    let rest = src
        .strip_prefix("data:image/")
        .ok_or_else(|| ImageError::InvalidDataUrl("expected a data:image/ prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::InvalidDataUrl("missing comma".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(ImageError::InvalidDataUrl(
            "only base64 payloads are supported".to_string(),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageError::InvalidDataUrl(format!("base64 decode error: {}", e)))
}

/// Pixel dimensions of a data-URL image, without decoding the pixels.
pub fn data_url_dimensions(src: &str) -> Result<(u32, u32), ImageError> {
    let data = data_url_bytes(src)?;
    sniff_format(&data)?;
    image::io::Reader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ImageError::Decode(e.to_string()))
}

/// Split RGBA pixels into an RGB buffer and an alpha channel. The alpha
/// channel is dropped when every pixel is opaque.
fn split_rgba(rgba: &RgbaImage) -> LoadedImage {
    let pixel_count = (rgba.width() * rgba.height()) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
        if pixel[3] != 255 {
            has_transparency = true;
        }
    }

    LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: if has_transparency { Some(alpha) } else { None },
        },
        width_px: rgba.width(),
        height_px: rgba.height(),
    }
}

/// Encode a page canvas for embedding.
pub fn encode_canvas(canvas: &RgbaImage, encoding: ImageEncoding) -> Result<LoadedImage, ImageError> {
    match encoding {
        ImageEncoding::Png => Ok(split_rgba(canvas)),
        ImageEncoding::Jpeg { quality } => {
            let rgb = image::DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
            let mut buf = Vec::new();
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
            encoder
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)
                .map_err(|e| ImageError::Encode(e.to_string()))?;
            Ok(LoadedImage {
                pixel_data: ImagePixelData::Jpeg {
                    data: buf,
                    color_space: JpegColorSpace::DeviceRGB,
                },
                width_px: canvas.width(),
                height_px: canvas.height(),
            })
        }
    }
}
