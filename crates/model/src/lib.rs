//! Annotation and persisted-value model for the Overmark viewer
//!
//! Defines the wire format of the persisted element value (document source,
//! annotation list, version counter), the annotation records themselves, and
//! the pure reducer every mutation goes through. Rendering and host glue live
//! in separate crates; everything here is plain data.

pub mod annotation;
pub mod color;
pub mod config;
pub mod reducer;
pub mod value;

pub use annotation::{
    annotations_for_page, Annotation, AnnotationDraft, AnnotationKind, PathPoint,
};
pub use color::Color;
pub use config::{parse_config, ConfigError, ElementConfig};
pub use reducer::{apply_value_action, AnnotationPatch, ValueAction};
pub use value::{parse_value, serialize_value, PdfValue};
