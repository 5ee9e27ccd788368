//! Persisted element value
//!
//! The value is the single source of truth for a session: where the document
//! comes from, every committed annotation, and a version counter that moves
//! by exactly one per successful mutation.

use crate::annotation::Annotation;
use serde::{Deserialize, Serialize};

/// Persisted value as exchanged with the host.
///
/// `pdf_data` holds base64 document bytes, optionally carrying a
/// `data:...;base64,` prefix. When both source fields are present the inline
/// data wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_data: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub version: u64,
}

impl Default for PdfValue {
    fn default() -> Self {
        Self { pdf_url: None, pdf_data: None, annotations: Vec::new(), version: 1 }
    }
}

impl PdfValue {
    /// True when the value names a document source of either form.
    pub fn has_source(&self) -> bool {
        self.pdf_url.is_some() || self.pdf_data.is_some()
    }
}

/// Read a raw value string from the host.
///
/// Absent or unreadable input yields the empty value rather than an error; a
/// stored version of 0 normalizes to 1.
pub fn parse_value(raw: Option<&str>) -> PdfValue {
    let Some(raw) = raw else {
        return PdfValue::default();
    };

    let mut value: PdfValue = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => return PdfValue::default(),
    };

    if value.version == 0 {
        value.version = 1;
    }

    value
}

/// Serialize the value to compact JSON for the host.
pub fn serialize_value(value: &PdfValue) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| String::from(r#"{"annotations":[],"version":1}"#))
}
