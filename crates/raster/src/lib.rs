use image::Rgba;
use lopdf::{Document, Object, ObjectId};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use image::RgbaImage;

const FALLBACK_PAGE_SIZE: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocHandle(u64);

impl DocHandle {
    /// Mint a handle value. Backends own the mapping from handles to
    /// documents; a handle is only meaningful to the engine that issued it.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    /// Pixel dimensions of a surface for this page at the given scale.
    pub fn surface_dimensions(self, scale: f32) -> (u32, u32) {
        let scale = sanitize_scale(scale);
        let width = (self.width_pt * scale).round().max(1.0) as u32;
        let height = (self.height_pt * scale).round().max(1.0) as u32;
        (width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSpec {
    pub page_index: u32,
    pub scale: f32,
}

impl Default for RenderSpec {
    fn default() -> Self {
        Self { page_index: 0, scale: 1.0 }
    }
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid document handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

pub trait RasterEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocHandle, RasterError>;
    fn page_count(&self, handle: DocHandle) -> Result<u32, RasterError>;
    fn page_size(&self, handle: DocHandle, page_index: u32) -> Result<PageSize, RasterError>;
    fn render_page(&self, handle: DocHandle, spec: RenderSpec) -> Result<RgbaImage, RasterError>;
    fn close(&mut self, handle: DocHandle) -> Result<(), RasterError>;
}

#[derive(Debug, Clone)]
struct DocRecord {
    page_sizes: Vec<PageSize>,
}

#[derive(Debug, Default)]
pub struct LopdfEngine {
    next_handle: u64,
    docs: HashMap<DocHandle, DocRecord>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_sizes(bytes: &[u8]) -> Result<Vec<PageSize>, RasterError> {
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(RasterError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let size = resolve_media_box(&doc, object_id)
                .map(|[x0, y0, x1, y1]| PageSize {
                    width_pt: (x1 - x0).abs(),
                    height_pt: (y1 - y0).abs(),
                })
                .unwrap_or(FALLBACK_PAGE_SIZE);

            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(RasterError::Backend("document has no pages".to_owned()));
        }

        Ok(sizes)
    }

    fn record(&self, handle: DocHandle) -> Result<&DocRecord, RasterError> {
        self.docs.get(&handle).ok_or(RasterError::InvalidHandle(handle.raw()))
    }
}

// MediaBox is inheritable; pages frequently leave it to an ancestor Pages node.
fn resolve_media_box(doc: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
    let mut current = page_id;

    for _ in 0..16 {
        let dict = doc.get_dictionary(current).ok()?;

        if let Some(values) = dict.get(b"MediaBox").ok().and_then(|obj| media_box_values(doc, obj))
        {
            return Some(values);
        }

        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }

    None
}

fn media_box_values(doc: &Document, object: &Object) -> Option<[f32; 4]> {
    let object = match object {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };

    let array = object.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }

    let mut values = [0.0_f32; 4];
    for (slot, entry) in values.iter_mut().zip(array) {
        *slot = entry.as_float().ok()?;
    }

    Some(values)
}

fn sanitize_scale(scale: f32) -> f32 {
    if !scale.is_finite() || scale <= 0.0 {
        1.0
    } else {
        scale
    }
}

impl RasterEngine for LopdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocHandle, RasterError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let page_sizes = Self::parse_sizes(&bytes)?;

        self.next_handle += 1;
        let handle = DocHandle(self.next_handle);
        self.docs.insert(handle, DocRecord { page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocHandle) -> Result<u32, RasterError> {
        Ok(self.record(handle)?.page_sizes.len() as u32)
    }

    fn page_size(&self, handle: DocHandle, page_index: u32) -> Result<PageSize, RasterError> {
        let record = self.record(handle)?;
        record.page_sizes.get(page_index as usize).copied().ok_or(RasterError::PageOutOfRange {
            page: page_index,
            page_count: record.page_sizes.len() as u32,
        })
    }

    fn render_page(&self, handle: DocHandle, spec: RenderSpec) -> Result<RgbaImage, RasterError> {
        let page_size = self.page_size(handle, spec.page_index)?;
        let (width, height) = page_size.surface_dimensions(spec.scale);

        // Placeholder raster: a blank sheet with a hairline edge. Real glyph
        // output stays behind the pdfium feature.
        let mut surface = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        paint_page_edge(&mut surface);

        Ok(surface)
    }

    fn close(&mut self, handle: DocHandle) -> Result<(), RasterError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(RasterError::InvalidHandle(handle.raw()))
    }
}

fn paint_page_edge(surface: &mut RgbaImage) {
    let (width, height) = surface.dimensions();
    if width < 4 || height < 4 {
        return;
    }

    let edge = Rgba([220, 220, 220, 255]);
    for x in 0..width {
        surface.put_pixel(x, 0, edge);
        surface.put_pixel(x, height - 1, edge);
    }
    for y in 0..height {
        surface.put_pixel(0, y, edge);
        surface.put_pixel(width - 1, y, edge);
    }
}

#[cfg(feature = "pdfium")]
pub mod pdfium_backend {
    use super::*;
    use pdfium_render::prelude::*;

    pub struct PdfiumEngine {
        inner: LopdfEngine,
    }

    impl PdfiumEngine {
        pub fn from_system_library() -> Result<Self, RasterError> {
            let _ = Pdfium::bind_to_system_library().map_err(|err| {
                RasterError::Backend(format!("failed to bind pdfium system library: {err}"))
            })?;

            Ok(Self { inner: LopdfEngine::default() })
        }
    }

    impl RasterEngine for PdfiumEngine {
        fn open(&mut self, source: OpenSource) -> Result<DocHandle, RasterError> {
            self.inner.open(source)
        }

        fn page_count(&self, handle: DocHandle) -> Result<u32, RasterError> {
            self.inner.page_count(handle)
        }

        fn page_size(&self, handle: DocHandle, page_index: u32) -> Result<PageSize, RasterError> {
            self.inner.page_size(handle, page_index)
        }

        fn render_page(
            &self,
            handle: DocHandle,
            spec: RenderSpec,
        ) -> Result<RgbaImage, RasterError> {
            self.inner.render_page(handle, spec)
        }

        fn close(&mut self, handle: DocHandle) -> Result<(), RasterError> {
            self.inner.close(handle)
        }
    }
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn pdf_with_media_boxes(page_boxes: &[Option<[f32; 4]>], pages_box: Option<[f32; 4]>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for page_box in page_boxes {
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
            };
            if let Some([x0, y0, x1, y1]) = page_box {
                page.set("MediaBox", vec![(*x0).into(), (*y0).into(), (*x1).into(), (*y1).into()]);
            }
            kids.push(doc.add_object(page).into());
        }

        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_boxes.len() as i64,
        };
        if let Some([x0, y0, x1, y1]) = pages_box {
            pages.set("MediaBox", vec![x0.into(), y0.into(), x1.into(), y1.into()]);
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("fixture PDF should serialize");
        bytes
    }

    fn a4_pdf(page_count: usize) -> Vec<u8> {
        let boxes: Vec<Option<[f32; 4]>> =
            (0..page_count).map(|_| Some([0.0, 0.0, 595.0, 842.0])).collect();
        pdf_with_media_boxes(&boxes, None)
    }

    #[test]
    fn opens_pdf_and_reads_page_count() {
        let mut engine = LopdfEngine::new();
        let handle = engine.open(OpenSource::Bytes(a4_pdf(3))).expect("open should succeed");

        assert_eq!(engine.page_count(handle).expect("count should succeed"), 3);
    }

    #[test]
    fn page_size_comes_from_media_box() {
        let mut engine = LopdfEngine::new();
        let handle = engine.open(OpenSource::Bytes(a4_pdf(1))).expect("open should succeed");

        let size = engine.page_size(handle, 0).expect("size should resolve");
        assert_eq!(size, PageSize { width_pt: 595.0, height_pt: 842.0 });
    }

    #[test]
    fn media_box_inherits_from_pages_node() {
        let bytes = pdf_with_media_boxes(&[None], Some([0.0, 0.0, 200.0, 400.0]));
        let mut engine = LopdfEngine::new();
        let handle = engine.open(OpenSource::Bytes(bytes)).expect("open should succeed");

        let size = engine.page_size(handle, 0).expect("size should resolve");
        assert_eq!(size, PageSize { width_pt: 200.0, height_pt: 400.0 });
    }

    #[test]
    fn missing_media_box_falls_back_to_letter() {
        let bytes = pdf_with_media_boxes(&[None], None);
        let mut engine = LopdfEngine::new();
        let handle = engine.open(OpenSource::Bytes(bytes)).expect("open should succeed");

        let size = engine.page_size(handle, 0).expect("size should resolve");
        assert_eq!(size, FALLBACK_PAGE_SIZE);
    }

    #[test]
    fn render_surface_matches_scaled_page_size() {
        let mut engine = LopdfEngine::new();
        let handle = engine.open(OpenSource::Bytes(a4_pdf(1))).expect("open should succeed");

        let surface = engine
            .render_page(handle, RenderSpec { page_index: 0, scale: 1.5 })
            .expect("render should succeed");

        assert_eq!(surface.dimensions(), (893, 1263));
    }

    #[test]
    fn non_finite_scale_renders_at_identity() {
        let mut engine = LopdfEngine::new();
        let handle = engine.open(OpenSource::Bytes(a4_pdf(1))).expect("open should succeed");

        let surface = engine
            .render_page(handle, RenderSpec { page_index: 0, scale: f32::NAN })
            .expect("render should succeed");

        assert_eq!(surface.dimensions(), (595, 842));
    }

    #[test]
    fn page_out_of_range_reports_page_count() {
        let mut engine = LopdfEngine::new();
        let handle = engine.open(OpenSource::Bytes(a4_pdf(2))).expect("open should succeed");

        let err = engine
            .render_page(handle, RenderSpec { page_index: 5, scale: 1.0 })
            .expect_err("render should fail");

        assert!(matches!(err, RasterError::PageOutOfRange { page: 5, page_count: 2 }));
    }

    #[test]
    fn invalid_handle_returns_error() {
        let engine = LopdfEngine::new();
        let err = engine.page_count(DocHandle(999)).expect_err("should fail for unknown handle");

        assert!(matches!(err, RasterError::InvalidHandle(999)));
    }

    #[test]
    fn close_releases_handle() {
        let mut engine = LopdfEngine::new();
        let handle = engine.open(OpenSource::Bytes(a4_pdf(1))).expect("open should succeed");

        engine.close(handle).expect("close should succeed");

        assert!(matches!(engine.page_count(handle), Err(RasterError::InvalidHandle(_))));
    }

    #[test]
    fn encrypted_marker_is_rejected() {
        let mut engine = LopdfEngine::new();
        let err = engine
            .open(OpenSource::Bytes(b"%PDF-1.5\n/Encrypt 1 0 R\n%%EOF".to_vec()))
            .expect_err("open should fail");

        assert!(matches!(err, RasterError::EncryptedUnsupported));
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let mut engine = LopdfEngine::new();
        let err = engine
            .open(OpenSource::Bytes(b"not a pdf at all".to_vec()))
            .expect_err("open should fail");

        assert!(matches!(err, RasterError::Parse(_)));
    }
}
