use annot_model::PdfValue;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("fetch failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("value names no document source")]
    SourceMissing,
    #[error("inline document data is not valid base64: {0}")]
    InlineData(#[from] base64::DecodeError),
    #[error("failed to fetch document from {url}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("engine rejected document: {0}")]
    Engine(#[from] pdf_raster::RasterError),
    #[error("load superseded by a newer request")]
    Superseded,
}

/// Resolves a URL to document bytes. Transport is host business; the viewer
/// only ever sees the result.
pub trait SourceFetcher {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfSource {
    Url(String),
    Inline(String),
}

impl PdfSource {
    /// Pick the document source out of a value. Inline data wins when both
    /// fields are present.
    pub fn from_value(value: &PdfValue) -> Result<Self, LoadError> {
        if let Some(data) = &value.pdf_data {
            return Ok(Self::Inline(data.clone()));
        }

        if let Some(url) = &value.pdf_url {
            return Ok(Self::Url(url.clone()));
        }

        Err(LoadError::SourceMissing)
    }
}

/// Decode inline document data, tolerating a `data:...;base64,` prefix.
pub fn decode_inline_data(data: &str) -> Result<Vec<u8>, LoadError> {
    let payload = match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    };

    Ok(STANDARD.decode(payload.trim())?)
}

pub fn resolve_source_bytes(
    source: &PdfSource,
    fetcher: &mut dyn SourceFetcher,
) -> Result<Vec<u8>, LoadError> {
    match source {
        PdfSource::Inline(data) => decode_inline_data(data),
        PdfSource::Url(url) => fetcher
            .fetch(url)
            .map_err(|source| LoadError::Fetch { url: url.clone(), source }),
    }
}
