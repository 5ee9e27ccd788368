//! Overmark viewer core
//!
//! Turns a persisted value into raster surfaces: resolves the document
//! source, renders pages through a pluggable engine, captures annotation
//! gestures, and composites the annotation list onto each rendered page.

pub mod compose;
pub mod overlay;
pub mod renderer;
pub mod source;

pub use compose::{composite_annotations, TextPainter, STROKE_WIDTH_PX, TEXT_SIZE_PX};
pub use overlay::{
    AnnotationMode, NoPrompt, OverlayEngine, TextPrompt, HIGHLIGHT_HEIGHT, HIGHLIGHT_WIDTH,
};
pub use renderer::{
    DocumentRenderer, LoadOutcome, LoadTicket, OpenedDocument, RenderError, RenderedPage,
    DEFAULT_SCALE, MAX_SCALE, MIN_SCALE, SCALE_STEP,
};
pub use source::{
    decode_inline_data, resolve_source_bytes, FetchError, LoadError, PdfSource, SourceFetcher,
};
