use thiserror::Error;

#[derive(Debug, Error)]
pub enum PickerError {
    #[error("asset selection not available")]
    Unavailable,
    #[error("asset selection failed: {0}")]
    Failed(String),
}

/// Asset chosen through the host's selection dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedAsset {
    pub url: String,
    pub name: Option<String>,
}

/// Host-provided file selection.
///
/// `is_available` probes whether the host exposes the dialog at all; shells
/// check it before offering a pick action and fall back to manual URL entry
/// when it reports false.
pub trait AssetPicker {
    fn is_available(&self) -> bool;

    /// Open the dialog. `Ok(None)` means the user cancelled.
    fn pick_pdf(&mut self) -> Result<Option<PickedAsset>, PickerError>;
}
