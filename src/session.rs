//! # Session
//!
//! The application state: the editor, the preview pane that holds the
//! rendered preview, and the export pipeline. Every edit re-renders the
//! pane before returning, so the preview always shows the latest state and
//! an export always captures it.

use tracing::{debug, warn};

use crate::color::Rgb;
use crate::download::SaveTarget;
use crate::editor::{Editor, FormEvent};
use crate::error::{EditError, ExportError};
use crate::export::{BusyFlag, ExportReport, Exporter};
use crate::font::FontContext;
use crate::pdf::PdfBackend;
use crate::preview::{render_preview, Scene};
use crate::raster::Rasterizer;
use crate::totals::Totals;

/// The render target for the preview. Export captures whatever the pane
/// holds; an unmounted pane holds nothing.
#[derive(Debug, Clone, Default)]
pub struct PreviewPane {
    scene: Option<Scene>,
}

impl PreviewPane {
    pub fn is_mounted(&self) -> bool {
        self.scene.is_some()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }
}

pub struct Session<R, P, S> {
    editor: Editor,
    pane: PreviewPane,
    mounted: bool,
    exporter: Exporter<R, P, S>,
    busy: BusyFlag,
    fonts: FontContext,
}

impl<R, P, S> Session<R, P, S>
where
    R: Rasterizer,
    P: PdfBackend,
    S: SaveTarget,
{
    /// Start a session with the preview mounted and rendered. Text is
    /// measured with the standard width tables.
    pub fn new(editor: Editor, exporter: Exporter<R, P, S>) -> Self {
        Self::with_fonts(editor, exporter, FontContext::new())
    }

    /// Start a session that measures preview text with `fonts`.
    pub fn with_fonts(editor: Editor, exporter: Exporter<R, P, S>, fonts: FontContext) -> Self {
        let mut session = Self {
            editor,
            pane: PreviewPane::default(),
            mounted: true,
            exporter,
            busy: BusyFlag::new(),
            fonts,
        };
        session.refresh();
        session
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn totals(&self) -> Totals {
        self.editor.totals()
    }

    pub fn preview(&self) -> &PreviewPane {
        &self.pane
    }

    pub fn exporter(&self) -> &Exporter<R, P, S> {
        &self.exporter
    }

    /// Mutate the editor directly; the preview is re-rendered afterwards.
    pub fn edit<T>(&mut self, f: impl FnOnce(&mut Editor) -> T) -> T {
        let out = f(&mut self.editor);
        self.refresh();
        out
    }

    /// Apply one form event and re-render.
    pub fn apply(&mut self, event: FormEvent) -> Result<(), EditError> {
        let result = self.editor.apply(event);
        if let Err(ref e) = result {
            warn!(error = %e, "form input rejected");
        }
        self.refresh();
        result
    }

    pub fn mount_preview(&mut self) {
        self.mounted = true;
        self.refresh();
    }

    pub fn unmount_preview(&mut self) {
        self.mounted = false;
        self.refresh();
    }

    /// Export the current preview. Fails with [`ExportError::Busy`] while
    /// another export holds the busy flag; the flag is cleared again on
    /// every exit path.
    pub fn download(&self) -> Result<ExportReport, ExportError> {
        let Some(_guard) = self.busy.try_acquire() else {
            warn!("download ignored: an export is already in progress");
            return Err(ExportError::Busy);
        };

        let quotation = self.editor.quotation();
        let background = Rgb::from_hex_or(&self.editor.style().background_color, Rgb::WHITE);
        self.exporter
            .export(self.pane.scene(), &quotation.quotation_number, background)
    }

    /// True while an export is running.
    pub fn is_generating(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn busy(&self) -> &BusyFlag {
        &self.busy
    }

    fn refresh(&mut self) {
        self.pane.scene = if self.mounted {
            let scene = render_preview(
                &self.fonts,
                self.editor.quotation(),
                &self.editor.totals(),
                self.editor.style(),
            );
            debug!(height = scene.height, elements = scene.elements.len(), "rendered preview");
            Some(scene)
        } else {
            None
        };
    }
}
