//! Dynamic form fields rendered by the portal.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Number,
    Boolean,
    Choice,
    Multichoice,
    File,
    Multifile,
}

impl FieldType {
    pub fn needs_choices(&self) -> bool {
        matches!(self, FieldType::Choice | FieldType::Multichoice)
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, FieldType::File | FieldType::Multifile)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "validate_choices"))]
pub struct FieldProperties {
    pub display: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub description: String,
    pub required: bool,
    pub default_value: String,
    pub placeholder: String,
    pub choices: Vec<String>,
    /// Static suggestion values.
    pub balloon_values: Vec<String>,
    /// Environment variables whose values are appended to the suggestions.
    pub balloon_value_env_keys: Vec<String>,
    /// Environment variable shown read-only above the field.
    pub output_from_env_key: String,
    pub output_title: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Validate)]
pub struct Field {
    #[validate(length(min = 1, max = 64), custom(function = "validate_label"))]
    pub label: String,
    #[serde(default)]
    #[validate(nested)]
    pub properties: FieldProperties,
}

/// Ordered field list with unique labels.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Validate)]
pub struct Fields {
    #[serde(default)]
    #[validate(nested)]
    pub fields: Vec<Field>,
}

impl Fields {
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn get(&self, label: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.label == label)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum FieldsError {
    #[error("invalid fields document: {0}")]
    Syntax(#[from] serde_yaml::Error),
    #[error("invalid field definition: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("duplicate field label `{0}`")]
    DuplicateLabel(String),
}

fn validate_label(label: &str) -> Result<(), ValidationError> {
    if label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("label_charset"))
    }
}

fn validate_choices(properties: &FieldProperties) -> Result<(), ValidationError> {
    if properties.field_type.needs_choices() && properties.choices.is_empty() {
        return Err(ValidationError::new("choices_required"));
    }
    Ok(())
}

/// Parse and validate a serialized field list. Blank input yields no fields.
pub fn parse_fields(raw: &str) -> Result<Fields, FieldsError> {
    if raw.trim().is_empty() {
        return Ok(Fields::default());
    }

    let fields: Fields = serde_yaml::from_str(raw)?;
    fields.validate()?;

    let mut seen = HashSet::new();
    for field in fields.iter() {
        if !seen.insert(field.label.as_str()) {
            return Err(FieldsError::DuplicateLabel(field.label.clone()));
        }
    }

    Ok(fields)
}
