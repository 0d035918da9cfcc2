//! Schema definitions for multi-step form definitions

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::FormError;

/// The employment application shipped with the binary
const EMBEDDED_FORM: &str = include_str!("employment_application.toml");

/// A complete form: header copy plus its ordered steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSchema {
    /// Form title shown in the header
    pub title: String,
    /// Header description, replaced by `completion_message` after success
    #[serde(default)]
    pub description: String,
    /// Header text once the application has been accepted
    #[serde(default = "default_completion_message")]
    pub completion_message: String,
    /// Body of the success panel
    #[serde(default = "default_success_message")]
    pub success_message: String,
    /// Steps in display order
    pub steps: Vec<StepSchema>,
}

fn default_completion_message() -> String {
    "Process completed successfully.".to_string()
}

fn default_success_message() -> String {
    "Thank you! Your application has been received.".to_string()
}

/// One page of the wizard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSchema {
    /// Step heading, also used by the step indicators
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// Schema definition for a single input control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Submitted field name; shared by every option of a radio group
    pub name: String,
    /// Label shown next to the control
    #[serde(default)]
    pub label: Option<String>,
    /// Type of the field
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether this field must be filled
    #[serde(default)]
    pub required: bool,
    /// Initial value (text-like), initially selected option (select/radio)
    /// or "true" for a pre-checked checkbox
    #[serde(default)]
    pub default: Option<String>,
    /// Options for select and radio fields
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Whole-value regular expression for text-like fields
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Lower bound for number fields
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound for number fields
    #[serde(default)]
    pub max: Option<f64>,
    /// Submitted value of a checked checkbox
    #[serde(default)]
    pub value: Option<String>,
}

/// Types of controls supported in form definitions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Tel,
    Url,
    Number,
    /// Date field (YYYY-MM-DD format)
    Date,
    /// Multi-line text input
    Textarea,
    /// Selection from predefined options
    Select,
    Checkbox,
    /// Exclusive choice; expands into one field per option
    Radio,
    /// File selection, staged or posted on submit
    File,
}

impl FieldType {
    /// Whether the field holds free-form text
    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            FieldType::Text
                | FieldType::Email
                | FieldType::Tel
                | FieldType::Url
                | FieldType::Number
                | FieldType::Date
                | FieldType::Textarea
        )
    }
}

impl FormSchema {
    /// The built-in employment application
    pub fn embedded() -> Result<Self, FormError> {
        Self::from_toml(EMBEDDED_FORM)
    }

    pub fn from_toml(source: &str) -> Result<Self, FormError> {
        let schema: FormSchema = toml::from_str(source)?;
        schema.check()?;
        Ok(schema)
    }

    pub fn load(path: &Path) -> Result<Self, FormError> {
        let source = std::fs::read_to_string(path).map_err(|source| FormError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Load from an optional path, falling back to the embedded definition
    pub fn load_or_embedded(path: Option<&str>) -> Result<Self, FormError> {
        match path {
            Some(path) => Self::load(Path::new(path)),
            None => Self::embedded(),
        }
    }

    /// Structural checks serde cannot express
    fn check(&self) -> Result<(), FormError> {
        if self.steps.is_empty() {
            return Err(FormError::NoSteps);
        }
        for step in &self.steps {
            for field in &step.fields {
                let needs_options = matches!(field.field_type, FieldType::Radio | FieldType::Select);
                if needs_options && field.options.is_empty() {
                    return Err(FormError::MissingOptions(field.name.clone()));
                }
            }
        }
        Ok(())
    }
}
