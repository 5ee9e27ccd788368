//! Annotation records as they appear in the persisted value
//!
//! Annotations are stored in surface coordinates of the page they belong to,
//! captured at the scale they were created at. Geometry fields are optional on
//! the wire; a record missing the fields its kind needs is kept but skipped at
//! paint time.

use serde::{Deserialize, Serialize};

/// Annotation tool kinds.
///
/// `Stamp` is reserved in the wire format: records round-trip, but nothing
/// creates or paints them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Text,
    Highlight,
    Drawing,
    Stamp,
}

/// Single point on a freehand drawing path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
}

impl PathPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Stored annotation record.
///
/// `id` and `timestamp` are assigned when a draft is committed; records parsed
/// from older values may carry an empty id or a zero timestamp and are kept
/// as-is. `page` is 1-based and never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    #[serde(default)]
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<PathPoint>>,
    #[serde(default)]
    pub timestamp: i64,
}

/// Annotation captured by the overlay engine before it is committed.
///
/// Drafts carry no id and no timestamp; the mutation channel assigns both
/// when the draft is appended to the value.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
    pub kind: AnnotationKind,
    pub page: u32,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub content: Option<String>,
    pub color: Option<String>,
    pub paths: Option<Vec<PathPoint>>,
}

impl AnnotationDraft {
    pub fn text(page: u32, x: f32, y: f32, content: String, color: String) -> Self {
        Self {
            kind: AnnotationKind::Text,
            page,
            x: Some(x),
            y: Some(y),
            width: None,
            height: None,
            content: Some(content),
            color: Some(color),
            paths: None,
        }
    }

    pub fn highlight(page: u32, x: f32, y: f32, width: f32, height: f32, color: String) -> Self {
        Self {
            kind: AnnotationKind::Highlight,
            page,
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            content: None,
            color: Some(color),
            paths: None,
        }
    }

    pub fn drawing(page: u32, x: f32, y: f32, paths: Vec<PathPoint>, color: String) -> Self {
        Self {
            kind: AnnotationKind::Drawing,
            page,
            x: Some(x),
            y: Some(y),
            width: None,
            height: None,
            content: None,
            color: Some(color),
            paths: Some(paths),
        }
    }

    /// Promote the draft to a stored record with an assigned identity.
    pub fn into_annotation(self, id: String, timestamp: i64) -> Annotation {
        Annotation {
            id,
            kind: self.kind,
            page: self.page,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            content: self.content,
            color: self.color,
            paths: self.paths,
            timestamp,
        }
    }
}

/// Annotations belonging to one page, in list order.
pub fn annotations_for_page(annotations: &[Annotation], page: u32) -> Vec<&Annotation> {
    annotations.iter().filter(|annotation| annotation.page == page).collect()
}
