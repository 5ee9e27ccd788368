use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid element configuration: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Host-provided element configuration.
///
/// Validation is all-or-nothing: a wrong-typed or unrecognized field rejects
/// the whole object and callers fall back to `ElementConfig::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ElementConfig {
    #[serde(default = "default_true")]
    pub allow_annotations: bool,
    #[serde(default = "default_true")]
    pub allow_text_editing: bool,
    #[serde(default)]
    pub max_file_size: Option<f64>,
    #[serde(default)]
    pub allowed_file_types: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            allow_annotations: true,
            allow_text_editing: true,
            max_file_size: None,
            allowed_file_types: None,
        }
    }
}

pub fn parse_config(raw: &serde_json::Value) -> Result<ElementConfig, ConfigError> {
    Ok(ElementConfig::deserialize(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_yields_defaults() {
        let config = parse_config(&json!({})).expect("empty config is valid");
        assert_eq!(config, ElementConfig::default());
        assert!(config.allow_annotations);
    }

    #[test]
    fn fields_parse_from_camel_case_keys() {
        let config = parse_config(&json!({
            "allowAnnotations": false,
            "maxFileSize": 25.0,
            "allowedFileTypes": ["pdf"],
        }))
        .expect("config is valid");

        assert!(!config.allow_annotations);
        assert!(config.allow_text_editing);
        assert_eq!(config.max_file_size, Some(25.0));
        assert_eq!(config.allowed_file_types.as_deref(), Some(&["pdf".to_owned()][..]));
    }

    #[test]
    fn wrong_typed_field_rejects_whole_object() {
        let result = parse_config(&json!({"allowAnnotations": "yes"}));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_field_rejects_whole_object() {
        let result = parse_config(&json!({"allowAnnotations": true, "theme": "dark"}));
        assert!(result.is_err());
    }

    #[test]
    fn non_object_input_is_rejected() {
        assert!(parse_config(&json!(null)).is_err());
        assert!(parse_config(&json!([1, 2])).is_err());
    }
}
