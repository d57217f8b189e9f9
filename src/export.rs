//! # Export Pipeline
//!
//! Turns the mounted preview into `Quotation-<number>.pdf`:
//!
//! 1. rasterize the whole preview into one tall bitmap, over the page
//!    background, at the configured oversampling scale;
//! 2. work out how many raster rows make one page at the page's aspect
//!    ratio;
//! 3. cut the bitmap into page strips, in order;
//! 4. draw each strip at the top of a page-sized canvas and place that
//!    canvas full-bleed on its own PDF page;
//! 5. serialize the PDF and hand it to the save target.
//!
//! Every failure aborts the attempt and nothing is saved. The three
//! collaborators are traits so the pipeline can run against fakes.

use std::cell::Cell;
use std::path::PathBuf;

use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::color::Rgb;
use crate::download::SaveTarget;
use crate::error::ExportError;
use crate::image_loader::{encode_canvas, ImageEncoding};
use crate::model::quotation_file_name;
use crate::pagination::{page_slices, Orientation, PageFormat, PageGeometry, PageSlice};
use crate::pdf::{PdfBackend, PdfDocument, PdfMetadata};
use crate::preview::Scene;
use crate::raster::{RasterOptions, Rasterizer};

/// What to do with a final strip shorter than a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastPageFit {
    /// Draw the strip at natural scale; the rest of the page is background.
    #[default]
    Pad,
    /// Stretch the strip vertically to fill the page.
    Stretch,
}

/// Knobs for one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Oversampling multiplier for rasterization.
    pub scale: f32,
    pub use_cors: bool,
    pub page_format: PageFormat,
    pub orientation: Orientation,
    pub image_encoding: ImageEncoding,
    pub last_page: LastPageFit,
    /// Written to the PDF Info dictionary.
    pub author: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            use_cors: true,
            page_format: PageFormat::A4,
            orientation: Orientation::Portrait,
            image_encoding: ImageEncoding::Png,
            last_page: LastPageFit::Pad,
            author: None,
        }
    }
}

/// The outcome of a successful export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub page_count: usize,
    pub raster_width: u32,
    pub raster_height: u32,
}

/// At most one export in flight.
#[derive(Debug, Default)]
pub struct BusyFlag {
    busy: Cell<bool>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Set the flag, or return `None` if it is already set. The flag clears
    /// when the guard drops.
    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        if self.busy.replace(true) {
            return None;
        }
        Some(BusyGuard { flag: &self.busy })
    }
}

/// Clears its [`BusyFlag`] on drop.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// The export pipeline over its three collaborators.
pub struct Exporter<R, P, S> {
    rasterizer: R,
    backend: P,
    target: S,
    options: ExportOptions,
}

impl<R, P, S> Exporter<R, P, S>
where
    R: Rasterizer,
    P: PdfBackend,
    S: SaveTarget,
{
    pub fn new(rasterizer: R, backend: P, target: S, options: ExportOptions) -> Self {
        Self {
            rasterizer,
            backend,
            target,
            options,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn backend(&self) -> &P {
        &self.backend
    }

    pub fn target(&self) -> &S {
        &self.target
    }

    /// Export `preview` as `Quotation-<quotation_number>.pdf`.
    ///
    /// `preview` is `None` when there is no rendered preview to capture;
    /// that aborts before anything is rasterized.
    pub fn export(
        &self,
        preview: Option<&Scene>,
        quotation_number: &str,
        background: Rgb,
    ) -> Result<ExportReport, ExportError> {
        let result = self.run(preview, quotation_number, background);
        if let Err(ref e) = result {
            error!(error = %e, quotation = quotation_number, "export failed");
        }
        result
    }

    fn run(
        &self,
        preview: Option<&Scene>,
        quotation_number: &str,
        background: Rgb,
    ) -> Result<ExportReport, ExportError> {
        let scene = preview.ok_or(ExportError::MissingPreviewTarget)?;
        let options = &self.options;

        let raster = self.rasterizer.rasterize(
            scene,
            &RasterOptions {
                scale: options.scale,
                use_cors: options.use_cors,
                background,
            },
        )?;
        if raster.width() == 0 || raster.height() == 0 {
            return Err(ExportError::Rasterization(format!(
                "rasterizer returned an empty image ({}x{})",
                raster.width(),
                raster.height()
            )));
        }

        let geometry = PageGeometry::new(options.page_format, options.orientation);
        let page_rows = geometry.page_canvas_height(raster.width());
        let slices = page_slices(raster.height(), page_rows);
        debug!(
            raster_width = raster.width(),
            raster_height = raster.height(),
            page_rows,
            pages = slices.len(),
            "paginating"
        );

        let metadata = PdfMetadata {
            title: Some(format!("Quotation {}", quotation_number)),
            author: options.author.clone(),
            subject: Some("Quotation".to_string()),
        };
        let mut doc = self
            .backend
            .create(options.page_format, options.orientation, &metadata);
        let (page_width_mm, page_height_mm) = doc.page_size_mm();

        for slice in &slices {
            if slice.index > 0 {
                doc.add_page();
            }
            let stretch = options.last_page == LastPageFit::Stretch && slice.index + 1 == slices.len();
            let canvas_height = slice.canvas_rows(page_rows);
            let canvas = page_canvas(&raster, slice, canvas_height, background, stretch);
            let image = encode_canvas(&canvas, options.image_encoding)?;
            doc.add_image(&image, 0.0, 0.0, page_width_mm, page_height_mm)?;
            debug!(page = slice.index + 1, top = slice.top, rows = slice.height, "added page");
        }

        let page_count = doc.page_count();
        let bytes = doc.finish()?;
        let path = self
            .target
            .save(&quotation_file_name(quotation_number), &bytes)?;

        info!(
            path = %path.display(),
            pages = page_count,
            "exported quotation"
        );
        Ok(ExportReport {
            path,
            page_count,
            raster_width: raster.width(),
            raster_height: raster.height(),
        })
    }
}

/// Draw one strip of `raster` at the top-left of a full-width canvas of
/// `canvas_height` rows filled with `background`. With `stretch`, a short
/// strip is scaled vertically to the full canvas height.
pub fn page_canvas(
    raster: &RgbaImage,
    slice: &PageSlice,
    canvas_height: u32,
    background: Rgb,
    stretch: bool,
) -> RgbaImage {
    let width = raster.width();
    let mut strip = imageops::crop_imm(raster, 0, slice.top, width, slice.height).to_image();
    if stretch && strip.height() > 0 && strip.height() < canvas_height {
        strip = imageops::resize(&strip, width, canvas_height, imageops::FilterType::Triangle);
    }

    let mut canvas = RgbaImage::from_pixel(
        width,
        canvas_height,
        Rgba([background.r, background.g, background.b, 255]),
    );
    imageops::overlay(&mut canvas, &strip, 0, 0);
    canvas
}
