//! # PDF Assembly
//!
//! A from-scratch PDF 1.7 writer for image-only documents. Every exported
//! page carries one full-bleed raster, so the subset of PDF needed here is
//! small: a page tree, one content stream per page, image XObjects, and an
//! Info dictionary.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- Catalog
//! 2 0 obj ... endobj  <- Pages (page tree root)
//! 3 0 obj ... endobj  <- image XObjects, content streams, pages, Info
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! ## Units
//!
//! Callers work in millimeters with the origin at the top-left corner of
//! the page, the way the preview is laid out. The writer converts to PDF
//! points (1/72 inch) and flips the y axis.
//!
//! ## Images
//!
//! Image XObjects are written as soon as they are added, so the pixel data
//! of earlier pages can be dropped while later pages are still being
//! rasterized. JPEG data passes through with DCTDecode; decoded pixels are
//! Flate-compressed, with an SMask when the image has transparency.

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use miniz_oxide::deflate::compress_to_vec_zlib;
use tracing::debug;

use crate::error::ExportError;
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::pagination::{Orientation, PageFormat, PageGeometry};

/// Points per millimeter.
const PT_PER_MM: f64 = 72.0 / 25.4;

/// zlib level for content streams and decoded images.
const COMPRESSION_LEVEL: u8 = 6;

/// Document-level metadata written to the Info dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// Creates PDF documents.
pub trait PdfBackend {
    type Document: PdfDocument;

    /// Start a document. It already has one empty page.
    fn create(
        &self,
        format: PageFormat,
        orientation: Orientation,
        metadata: &PdfMetadata,
    ) -> Self::Document;
}

/// A document under construction. All positions are millimeters from the
/// top-left corner of the current page.
pub trait PdfDocument {
    /// (width, height) of every page.
    fn page_size_mm(&self) -> (f64, f64);

    fn page_count(&self) -> usize;

    /// Append a page and make it current.
    fn add_page(&mut self);

    /// Draw `image` on the current page, scaled to `width` x `height`.
    fn add_image(
        &mut self,
        image: &LoadedImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ExportError>;

    /// Serialize the finished document.
    fn finish(self) -> Result<Vec<u8>, ExportError>;
}

/// The built-in PDF backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfWriter;

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for PdfWriter {
    type Document = PdfFile;

    fn create(
        &self,
        format: PageFormat,
        orientation: Orientation,
        metadata: &PdfMetadata,
    ) -> PdfFile {
        PdfFile::new(PageGeometry::new(format, orientation), metadata.clone())
    }
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// XObject obj IDs for images, indexed as /Im0, /Im1, ...
    image_objects: Vec<usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

/// Drawing commands and image references for one page.
#[derive(Default)]
struct PageContent {
    stream: String,
    /// Indices into `PdfBuilder::image_objects`.
    images: Vec<usize>,
}

/// A PDF document being assembled by [`PdfWriter`].
pub struct PdfFile {
    page: PageGeometry,
    metadata: PdfMetadata,
    builder: PdfBuilder,
    pages: Vec<PageContent>,
}

impl PdfFile {
    fn new(page: PageGeometry, metadata: PdfMetadata) -> Self {
        // Object IDs are 1-indexed. 0 is a placeholder, 1 is the Catalog,
        // 2 is the page tree root; both are filled in by `finish`.
        let objects = (0..3).map(|_| PdfObject { data: Vec::new() }).collect();
        Self {
            page,
            metadata,
            builder: PdfBuilder {
                objects,
                image_objects: Vec::new(),
            },
            pages: vec![PageContent::default()],
        }
    }

    fn page_size_pt(&self) -> (f64, f64) {
        (self.page.width_mm * PT_PER_MM, self.page.height_mm * PT_PER_MM)
    }

    fn push_object(&mut self, data: Vec<u8>) -> usize {
        let id = self.builder.objects.len();
        self.builder.objects.push(PdfObject { data });
        id
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(&mut self, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };

                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image \
                     /Width {} /Height {} \
                     /ColorSpace {} \
                     /BitsPerComponent 8 \
                     /Filter /DCTDecode \
                     /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space_str,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                self.push_object(obj_data)
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_id = alpha.as_ref().map(|alpha_data| {
                    let compressed_alpha = compress_to_vec_zlib(alpha_data, COMPRESSION_LEVEL);
                    let mut smask_data: Vec<u8> = Vec::new();
                    let _ = write!(
                        smask_data,
                        "<< /Type /XObject /Subtype /Image \
                         /Width {} /Height {} \
                         /ColorSpace /DeviceGray \
                         /BitsPerComponent 8 \
                         /Filter /FlateDecode \
                         /Length {} >>\nstream\n",
                        image.width_px,
                        image.height_px,
                        compressed_alpha.len()
                    );
                    smask_data.extend_from_slice(&compressed_alpha);
                    smask_data.extend_from_slice(b"\nendstream");
                    self.push_object(smask_data)
                });

                let compressed_rgb = compress_to_vec_zlib(rgb, COMPRESSION_LEVEL);
                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();

                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image \
                     /Width {} /Height {} \
                     /ColorSpace /DeviceRGB \
                     /BitsPerComponent 8 \
                     /Filter /FlateDecode \
                     /Length {}{} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed_rgb.len(),
                    smask_ref
                );
                obj_data.extend_from_slice(&compressed_rgb);
                obj_data.extend_from_slice(b"\nendstream");
                self.push_object(obj_data)
            }
        }
    }

    fn write_info(&mut self) -> usize {
        let mut info = String::from("<< ");
        if let Some(ref title) = self.metadata.title {
            let _ = write!(info, "/Title {} ", encode_text_string(title));
        }
        if let Some(ref author) = self.metadata.author {
            let _ = write!(info, "/Author {} ", encode_text_string(author));
        }
        if let Some(ref subject) = self.metadata.subject {
            let _ = write!(info, "/Subject {} ", encode_text_string(subject));
        }
        let _ = write!(
            info,
            "/Producer (quoteform {}) /Creator (quoteform) >>",
            env!("CARGO_PKG_VERSION")
        );
        self.push_object(info.into_bytes())
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, info_obj_id: usize) -> Vec<u8> {
        let objects = &self.builder.objects;
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let header = format!("{} 0 obj\n", i);
            output.extend_from_slice(header.as_bytes());
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

impl PdfDocument for PdfFile {
    fn page_size_mm(&self) -> (f64, f64) {
        (self.page.width_mm, self.page.height_mm)
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_page(&mut self) {
        self.pages.push(PageContent::default());
    }

    fn add_image(
        &mut self,
        image: &LoadedImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ExportError> {
        check_image(image)?;
        if ![x, y, width, height].iter().all(|v| v.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ExportError::Assembly(format!(
                "invalid image placement ({}, {}, {}x{} mm)",
                x, y, width, height
            )));
        }

        let obj_id = self.write_image_xobject(image);
        let img_idx = self.builder.image_objects.len();
        self.builder.image_objects.push(obj_id);

        let w = width * PT_PER_MM;
        let h = height * PT_PER_MM;
        let px = x * PT_PER_MM;
        let py = (self.page.height_mm - y - height) * PT_PER_MM;

        // `pages` is never empty: it starts with one page and only grows.
        let Some(page) = self.pages.last_mut() else {
            return Err(ExportError::Assembly("document has no pages".to_string()));
        };
        let _ = write!(
            page.stream,
            "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/Im{} Do\nQ\n",
            w, h, px, py, img_idx
        );
        page.images.push(img_idx);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        let (page_width_pt, page_height_pt) = self.page_size_pt();
        let pages = std::mem::take(&mut self.pages);
        let mut page_obj_ids: Vec<usize> = Vec::with_capacity(pages.len());

        for page in &pages {
            let compressed = compress_to_vec_zlib(page.stream.as_bytes(), COMPRESSION_LEVEL);
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            let content_obj_id = self.push_object(content_data);

            let xobjects = page
                .images
                .iter()
                .map(|&idx| format!("/Im{} {} 0 R", idx, self.builder.image_objects[idx]))
                .collect::<Vec<_>>()
                .join(" ");
            let resources = if xobjects.is_empty() {
                String::new()
            } else {
                format!("/XObject << {} >>", xobjects)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page_width_pt, page_height_pt, content_obj_id, resources
            );
            page_obj_ids.push(self.push_object(page_dict.into_bytes()));
        }

        self.builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        self.builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = self.write_info();
        let bytes = self.serialize(info_obj_id);
        debug!(
            pages = page_obj_ids.len(),
            images = self.builder.image_objects.len(),
            bytes = bytes.len(),
            "serialized PDF"
        );
        Ok(bytes)
    }
}

/// Reject images whose pixel buffers do not match their dimensions.
fn check_image(image: &LoadedImage) -> Result<(), ExportError> {
    if image.width_px == 0 || image.height_px == 0 {
        return Err(ExportError::Assembly("image has no pixels".to_string()));
    }
    let pixels = image.width_px as usize * image.height_px as usize;
    match &image.pixel_data {
        ImagePixelData::Jpeg { data, .. } if data.is_empty() => {
            Err(ExportError::Assembly("empty JPEG stream".to_string()))
        }
        ImagePixelData::Decoded { rgb, .. } if rgb.len() != pixels * 3 => Err(
            ExportError::Assembly(format!(
                "RGB buffer holds {} bytes, expected {}",
                rgb.len(),
                pixels * 3
            )),
        ),
        ImagePixelData::Decoded {
            alpha: Some(alpha), ..
        } if alpha.len() != pixels => Err(ExportError::Assembly(format!(
            "alpha buffer holds {} bytes, expected {}",
            alpha.len(),
            pixels
        ))),
        _ => Ok(()),
    }
}

/// Escape special characters in a PDF literal string.
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Encode a PDF text string: a literal for ASCII, UTF-16BE hex otherwise.
fn encode_text_string(s: &str) -> String {
    if s.is_ascii() {
        return format!("({})", escape_pdf_string(s));
    }
    let mut hex = String::from("<FEFF");
    for unit in s.encode_utf16() {
        let _ = write!(hex, "{:04X}", unit);
    }
    hex.push('>');
    hex
}
