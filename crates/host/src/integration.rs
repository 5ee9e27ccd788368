use annot_model::{parse_config, ElementConfig};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use overmark_viewer::SourceFetcher;

use crate::handshake::HostContext;
use crate::picker::{AssetPicker, PickerError};
use crate::store::ValueStore;

/// Outcome of a source-selection round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    /// A new source was persisted. `inline_data` tells whether the document
    /// bytes were captured alongside the URL.
    Stored { url: String, inline_data: bool },
    /// Nothing was chosen; the value is untouched.
    Cancelled,
    /// The picker is unavailable or failed; ask the user for a URL instead.
    ManualUrlRequired,
}

/// Parse the host-provided configuration, falling back to defaults when it
/// does not validate.
pub fn effective_config(raw: Option<&serde_json::Value>) -> ElementConfig {
    let Some(raw) = raw else {
        return ElementConfig::default();
    };

    match parse_config(raw) {
        Ok(config) => config,
        Err(error) => {
            log::warn!("invalid element configuration, using defaults: {error}");
            ElementConfig::default()
        }
    }
}

pub fn encode_data_uri(bytes: &[u8]) -> String {
    format!("data:application/pdf;base64,{}", STANDARD.encode(bytes))
}

/// The shell between the host's collaborators and the persisted value.
///
/// Owns the select-a-document flow: drive the picker, capture the document
/// bytes inline when they can be fetched, and persist the result. Every
/// collaborator failure has a fallback; none of them surface as an error to
/// the caller.
pub struct IntegrationController<S: ValueStore, P: AssetPicker, F: SourceFetcher> {
    store: S,
    picker: P,
    fetcher: F,
    config: ElementConfig,
    disabled: bool,
}

impl<S: ValueStore, P: AssetPicker, F: SourceFetcher> IntegrationController<S, P, F> {
    pub fn new(store: S, picker: P, fetcher: F) -> Self {
        Self { store, picker, fetcher, config: ElementConfig::default(), disabled: false }
    }

    /// Take over configuration and disabled state from a completed
    /// handshake.
    pub fn absorb_context(&mut self, context: &HostContext) {
        self.config = effective_config(context.config.as_ref());
        self.disabled = context.disabled;
    }

    pub fn config(&self) -> &ElementConfig {
        &self.config
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Drive the picker and persist the selection. A disabled shell does not
    /// open the picker.
    pub fn select_source(&mut self) -> SourceSelection {
        if self.disabled {
            log::debug!("source selection ignored while disabled");
            return SourceSelection::Cancelled;
        }

        if !self.picker.is_available() {
            return SourceSelection::ManualUrlRequired;
        }

        let picked = match self.picker.pick_pdf() {
            Ok(Some(asset)) => asset,
            Ok(None) => return SourceSelection::Cancelled,
            Err(error) => {
                log::warn!("asset picker failed: {error}");
                return SourceSelection::ManualUrlRequired;
            }
        };

        self.store_source(picked.url)
    }

    /// Fallback path for hosts without a picker: the user typed a URL.
    pub fn apply_manual_url(&mut self, url: &str) -> SourceSelection {
        if self.disabled {
            log::debug!("manual url ignored while disabled");
            return SourceSelection::Cancelled;
        }

        self.store_source(url.to_owned())
    }

    /// Persist a new source, keeping existing annotations. When the document
    /// bytes cannot be fetched the value holds the URL alone; stale inline
    /// data from a previous document is dropped either way.
    fn store_source(&mut self, url: String) -> SourceSelection {
        let inline = match self.fetcher.fetch(&url) {
            Ok(bytes) => Some(encode_data_uri(&bytes)),
            Err(error) => {
                log::warn!("could not capture document data for {url}: {error}");
                None
            }
        };
        let inline_data = inline.is_some();

        let mut value = self.store.read();
        value.pdf_url = Some(url.clone());
        value.pdf_data = inline;
        value.version += 1;
        self.store.write(&value);

        SourceSelection::Stored { url, inline_data }
    }
}
