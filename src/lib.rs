//! # quoteform
//!
//! Build a quotation, preview it at A4 width, export it as a paginated PDF.
//!
//! The quotation is edited field by field. Every edit recomputes the totals
//! and re-renders a preview: one continuous, fixed-width document that
//! grows downward with its content. Export captures that preview as a
//! single tall raster and cuts it into page-sized strips, one full-bleed
//! image per PDF page, so the PDF looks exactly like the preview.
//!
//! ## Architecture
//!
//! ```text
//! FormEvent
//!       ↓
//!   [editor]        Mutates the quotation, recomputes [totals]
//!       ↓
//!   [preview]       Quotation + totals + style → Scene (→ SVG),
//!                   text measured by [font]
//!       ↓
//!   [session]       Holds the rendered scene in the preview pane
//!       ↓ download()
//!   [export]        Drives the three collaborators below
//!       ├─ [raster]      Scene → one tall RGBA bitmap
//!       ├─ [pagination]  Bitmap rows → page strips
//!       ├─ [pdf]         Strips → PDF bytes
//!       └─ [download]    PDF bytes → Quotation-<number>.pdf
//! ```

pub mod color;
pub mod config;
pub mod currency;
pub mod download;
pub mod editor;
pub mod error;
pub mod export;
pub mod font;
pub mod image_loader;
pub mod model;
pub mod pagination;
pub mod pdf;
pub mod preview;
pub mod raster;
pub mod session;
pub mod totals;

use std::path::Path;

use config::Config;
use download::DirectoryTarget;
use editor::Editor;
use error::EditError;
use export::Exporter;
use font::FontContext;
use pdf::PdfWriter;
use raster::SvgRasterizer;
use session::Session;

/// A session wired to the real rasterizer, PDF writer, and filesystem.
pub type DesktopSession = Session<SvgRasterizer, PdfWriter, DirectoryTarget>;

/// Start a session on the sample quotation with `config` applied.
///
/// Relative paths in `config` (the logo) resolve against `base_dir`.
pub fn open_session(config: &Config, base_dir: &Path) -> Result<DesktopSession, EditError> {
    let mut editor = Editor::with_sample();
    config.apply_to(&mut editor, base_dir)?;

    let rasterizer = SvgRasterizer::new();
    let fonts = FontContext::from_database(rasterizer.fontdb());
    let exporter = Exporter::new(
        rasterizer,
        PdfWriter::new(),
        DirectoryTarget::new(&config.output_dir),
        config.export.clone(),
    );
    Ok(Session::with_fonts(editor, exporter, fonts))
}
