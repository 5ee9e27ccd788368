use crate::compose::{composite_annotations, TextPainter};
use crate::source::{resolve_source_bytes, LoadError, PdfSource, SourceFetcher};
use annot_model::{annotations_for_page, Annotation};
use image::RgbaImage;
use pdf_raster::{DocHandle, OpenSource, PageSize, RasterEngine, RenderSpec};

/// Scale documents open at before the host asks for anything else.
pub const DEFAULT_SCALE: f32 = 1.5;
pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;
pub const SCALE_STEP: f32 = 0.25;

const PAGE_WINDOW_RADIUS: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no document is loaded")]
    NoDocument,
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("engine failed on page {page}")]
    Engine {
        page: u32,
        #[source]
        source: pdf_raster::RasterError,
    },
}

/// Claim on the outcome of one load. Only the most recently issued ticket
/// may install a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug)]
pub struct OpenedDocument {
    handle: DocHandle,
    page_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Installed { page_count: u32 },
    Superseded,
}

#[derive(Debug)]
pub struct RenderedPage {
    pub page: u32,
    pub surface: Option<RgbaImage>,
}

#[derive(Debug, Clone, Copy)]
struct OpenDoc {
    handle: DocHandle,
    page_count: u32,
}

pub struct DocumentRenderer<E: RasterEngine> {
    engine: E,
    doc: Option<OpenDoc>,
    current_page: u32,
    scale: f32,
    load_generation: u64,
    text_painter: TextPainter,
}

impl<E: RasterEngine> DocumentRenderer<E> {
    pub fn new(engine: E) -> Self {
        Self::with_text_painter(engine, TextPainter::from_system())
    }

    pub fn with_text_painter(engine: E, text_painter: TextPainter) -> Self {
        Self {
            engine,
            doc: None,
            current_page: 1,
            scale: DEFAULT_SCALE,
            load_generation: 0,
            text_painter,
        }
    }

    pub fn set_text_painter(&mut self, text_painter: TextPainter) {
        self.text_painter = text_painter;
    }

    /// Start a new load, invalidating every ticket issued before.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket(self.load_generation)
    }

    /// Resolve and decode a source without touching viewer state.
    pub fn open_source(
        &mut self,
        source: &PdfSource,
        fetcher: &mut dyn SourceFetcher,
    ) -> Result<OpenedDocument, LoadError> {
        let bytes = resolve_source_bytes(source, fetcher)?;
        let handle = self.engine.open(OpenSource::Bytes(bytes))?;
        let page_count = self.engine.page_count(handle)?;

        Ok(OpenedDocument { handle, page_count })
    }

    /// Install an opened document if its ticket is still current. A stale
    /// ticket closes the document instead, so an out-of-order resolution can
    /// never replace a newer one.
    pub fn install(&mut self, ticket: LoadTicket, opened: OpenedDocument) -> LoadOutcome {
        if ticket.0 != self.load_generation {
            log::debug!("discarding superseded load (ticket {})", ticket.0);
            self.close_handle(opened.handle);
            return LoadOutcome::Superseded;
        }

        if let Some(previous) = self.doc.take() {
            self.close_handle(previous.handle);
        }

        self.doc = Some(OpenDoc { handle: opened.handle, page_count: opened.page_count });
        self.current_page = 1;

        LoadOutcome::Installed { page_count: opened.page_count }
    }

    /// One-shot load for sequential hosts.
    pub fn load(
        &mut self,
        source: &PdfSource,
        fetcher: &mut dyn SourceFetcher,
    ) -> Result<u32, LoadError> {
        let ticket = self.begin_load();
        let opened = self.open_source(source, fetcher)?;

        match self.install(ticket, opened) {
            LoadOutcome::Installed { page_count } => Ok(page_count),
            LoadOutcome::Superseded => Err(LoadError::Superseded),
        }
    }

    fn close_handle(&mut self, handle: DocHandle) {
        if let Err(err) = self.engine.close(handle) {
            log::debug!("failed to close document handle: {err}");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.doc.is_some()
    }

    pub fn page_count(&self) -> u32 {
        self.doc.map(|doc| doc.page_count).unwrap_or(0)
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_current_page(&mut self, page: u32) {
        let page_count = self.page_count().max(1);
        self.current_page = page.max(1).min(page_count);
    }

    pub fn next_page(&mut self) {
        self.set_current_page(self.current_page.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.set_current_page(self.current_page.saturating_sub(1));
    }

    /// Any positive finite scale is accepted; step bounds apply only to the
    /// zoom helpers.
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.scale = (self.scale + SCALE_STEP).min(MAX_SCALE);
        self.scale
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.scale = (self.scale - SCALE_STEP).max(MIN_SCALE);
        self.scale
    }

    pub fn page_size(&self, page: u32) -> Result<PageSize, RenderError> {
        let doc = self.doc.as_ref().ok_or(RenderError::NoDocument)?;
        self.check_page(doc, page)?;

        self.engine
            .page_size(doc.handle, page - 1)
            .map_err(|source| RenderError::Engine { page, source })
    }

    /// Pages the viewer keeps rendered: the current page and its direct
    /// neighbors, clamped to the document bounds.
    pub fn window_pages(&self) -> Vec<u32> {
        let Some(doc) = &self.doc else {
            return Vec::new();
        };

        let first = self.current_page.saturating_sub(PAGE_WINDOW_RADIUS).max(1);
        let last = self.current_page.saturating_add(PAGE_WINDOW_RADIUS).min(doc.page_count);

        (first..=last).collect()
    }

    /// Render one page at the current scale and composite the annotations
    /// that belong to it. `page` is 1-based.
    pub fn render_page(
        &self,
        page: u32,
        annotations: &[Annotation],
    ) -> Result<RgbaImage, RenderError> {
        let doc = self.doc.as_ref().ok_or(RenderError::NoDocument)?;
        self.check_page(doc, page)?;

        let spec = RenderSpec { page_index: page - 1, scale: self.scale };
        let mut surface = self
            .engine
            .render_page(doc.handle, spec)
            .map_err(|source| RenderError::Engine { page, source })?;

        let page_annotations = annotations_for_page(annotations, page);
        composite_annotations(&mut surface, &page_annotations, &self.text_painter);

        Ok(surface)
    }

    /// Render the page window. A page that fails is logged and comes back
    /// without a surface; its neighbors are unaffected.
    pub fn render_window(&self, annotations: &[Annotation]) -> Vec<RenderedPage> {
        self.window_pages()
            .into_iter()
            .map(|page| match self.render_page(page, annotations) {
                Ok(surface) => RenderedPage { page, surface: Some(surface) },
                Err(err) => {
                    log::warn!("page {page} failed to render: {err}");
                    RenderedPage { page, surface: None }
                }
            })
            .collect()
    }

    fn check_page(&self, doc: &OpenDoc, page: u32) -> Result<(), RenderError> {
        if page == 0 || page > doc.page_count {
            return Err(RenderError::PageOutOfRange { page, page_count: doc.page_count });
        }

        Ok(())
    }
}
