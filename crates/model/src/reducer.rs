use crate::annotation::{Annotation, PathPoint};
use crate::value::PdfValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub content: Option<String>,
    pub color: Option<String>,
    pub paths: Option<Vec<PathPoint>>,
}

impl AnnotationPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Self::default() }
    }

    pub fn position(x: f32, y: f32) -> Self {
        Self { x: Some(x), y: Some(y), ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueAction {
    Add { annotation: Annotation },
    Update { id: String, patch: AnnotationPatch },
    Delete { id: String },
}

pub fn apply_value_action(value: &mut PdfValue, action: ValueAction) {
    match action {
        ValueAction::Add { annotation } => {
            value.annotations.push(annotation);
            value.version += 1;
        }
        ValueAction::Update { id, patch } => {
            let Some(annotation) =
                value.annotations.iter_mut().find(|annotation| annotation.id == id)
            else {
                return;
            };

            merge_patch(annotation, patch);
            value.version += 1;
        }
        ValueAction::Delete { id } => {
            let before = value.annotations.len();
            value.annotations.retain(|annotation| annotation.id != id);

            if value.annotations.len() == before {
                return;
            }

            value.version += 1;
        }
    }
}

fn merge_patch(annotation: &mut Annotation, patch: AnnotationPatch) {
    if let Some(x) = patch.x {
        annotation.x = Some(x);
    }
    if let Some(y) = patch.y {
        annotation.y = Some(y);
    }
    if let Some(width) = patch.width {
        annotation.width = Some(width);
    }
    if let Some(height) = patch.height {
        annotation.height = Some(height);
    }
    if let Some(content) = patch.content {
        annotation.content = Some(content);
    }
    if let Some(color) = patch.color {
        annotation.color = Some(color);
    }
    if let Some(paths) = patch.paths {
        annotation.paths = Some(paths);
    }
}
