//! Runtime form fields and their native validity constraints

use regex::Regex;
use std::fmt;

use super::schema::{FieldSchema, FieldType};
use super::FormError;
use crate::attachments::{Attachment, AttachmentError, AttachmentLimits, AttachmentSet};

/// Current value of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text-like inputs and selects
    Text(String),
    /// Checkboxes and radio members
    Checked(bool),
    /// File inputs
    Files(AttachmentSet),
}

/// First failing native constraint of a field
#[derive(Debug, Clone, PartialEq)]
pub enum ValidityIssue {
    /// A custom validity message is pending
    CustomError(String),
    ValueMissing(FieldType),
    TypeMismatch(FieldType),
    TooShort { min: usize, actual: usize },
    TooLong { max: usize, actual: usize },
    PatternMismatch,
    RangeUnderflow { min: f64 },
    RangeOverflow { max: f64 },
}

impl fmt::Display for ValidityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityIssue::CustomError(message) => write!(f, "{}", message),
            ValidityIssue::ValueMissing(field_type) => match field_type {
                FieldType::Checkbox => write!(f, "Please check this box if you want to proceed."),
                FieldType::Select => write!(f, "Please select an item in the list."),
                FieldType::Radio => write!(f, "Please select one of these options."),
                FieldType::File => write!(f, "Please select a file."),
                _ => write!(f, "Please fill out this field."),
            },
            ValidityIssue::TypeMismatch(field_type) => match field_type {
                FieldType::Email => write!(f, "Please enter an email address."),
                FieldType::Url => write!(f, "Please enter a URL."),
                FieldType::Number => write!(f, "Please enter a number."),
                FieldType::Date => write!(f, "Please enter a valid date (YYYY-MM-DD)."),
                _ => write!(f, "Please enter a valid value."),
            },
            ValidityIssue::TooShort { min, actual } => write!(
                f,
                "Please lengthen this text to {} characters or more (you are currently using {} characters).",
                min, actual
            ),
            ValidityIssue::TooLong { max, actual } => write!(
                f,
                "Please shorten this text to {} characters or less (you are currently using {} characters).",
                max, actual
            ),
            ValidityIssue::PatternMismatch => write!(f, "Please match the requested format."),
            ValidityIssue::RangeUnderflow { min } => {
                write!(f, "Value must be greater than or equal to {}.", min)
            }
            ValidityIssue::RangeOverflow { max } => {
                write!(f, "Value must be less than or equal to {}.", max)
            }
        }
    }
}

/// An input, select, textarea or single radio option within a step
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    label: String,
    field_type: FieldType,
    required: bool,
    placeholder: Option<String>,
    pattern: Option<Regex>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    /// Choices of a select
    options: Vec<String>,
    /// Submitted value of a checked checkbox or radio member
    submit_value: Option<String>,
    value: FieldValue,
    custom_validity: Option<String>,
    /// Clear `custom_validity` on the next interaction
    clear_custom_on_input: bool,
}

impl Field {
    /// Build the runtime fields for a schema entry.
    ///
    /// A radio schema yields one field per option, all named after the group.
    pub fn from_schema(schema: &FieldSchema) -> Result<Vec<Self>, FormError> {
        let pattern = schema
            .pattern
            .as_deref()
            .map(|p| {
                Regex::new(&format!("^(?:{})$", p)).map_err(|source| FormError::InvalidPattern {
                    name: schema.name.clone(),
                    source,
                })
            })
            .transpose()?;

        let base = Field {
            name: schema.name.clone(),
            label: schema.label.clone().unwrap_or_else(|| schema.name.clone()),
            field_type: schema.field_type,
            required: schema.required,
            placeholder: schema.placeholder.clone(),
            pattern,
            min_length: schema.min_length,
            max_length: schema.max_length,
            min: schema.min,
            max: schema.max,
            options: Vec::new(),
            submit_value: None,
            value: FieldValue::Text(String::new()),
            custom_validity: None,
            clear_custom_on_input: false,
        };

        let fields = match schema.field_type {
            FieldType::Radio => schema
                .options
                .iter()
                .map(|option| Field {
                    submit_value: Some(option.clone()),
                    value: FieldValue::Checked(schema.default.as_deref() == Some(option.as_str())),
                    ..base.clone()
                })
                .collect(),
            FieldType::Checkbox => {
                let checked = schema
                    .default
                    .as_deref()
                    .map(|d| matches!(d, "true" | "yes" | "on"))
                    .unwrap_or(false);
                vec![Field {
                    submit_value: Some(schema.value.clone().unwrap_or_else(|| "on".to_string())),
                    value: FieldValue::Checked(checked),
                    ..base
                }]
            }
            FieldType::Select => {
                let selected = schema
                    .default
                    .clone()
                    .filter(|d| schema.options.contains(d))
                    .unwrap_or_default();
                vec![Field {
                    options: schema.options.clone(),
                    value: FieldValue::Text(selected),
                    ..base
                }]
            }
            FieldType::File => vec![Field {
                value: FieldValue::Files(AttachmentSet::default()),
                ..base
            }],
            _ => vec![Field {
                value: FieldValue::Text(schema.default.clone().unwrap_or_default()),
                ..base
            }],
        };

        Ok(fields)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Value submitted for a checked checkbox or radio member
    pub fn submit_value(&self) -> Option<&str> {
        self.submit_value.as_deref()
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Text of a text-like field or select; empty for other kinds
    pub fn text(&self) -> &str {
        match &self.value {
            FieldValue::Text(text) => text,
            _ => "",
        }
    }

    pub fn is_checked(&self) -> bool {
        matches!(self.value, FieldValue::Checked(true))
    }

    pub fn attachments(&self) -> Option<&AttachmentSet> {
        match &self.value {
            FieldValue::Files(set) => Some(set),
            _ => None,
        }
    }

    /// Replace the text of a text-like field (user input)
    pub fn set_text(&mut self, text: impl Into<String>) {
        if let FieldValue::Text(value) = &mut self.value {
            *value = text.into();
        }
        self.notify_input();
    }

    /// Choose a select option by index; out-of-range indexes are ignored
    pub fn select_option(&mut self, index: usize) {
        if let Some(option) = self.options.get(index).cloned() {
            self.set_text(option);
        }
    }

    /// Index of the current select option
    pub fn selected_option(&self) -> Option<usize> {
        self.options.iter().position(|o| o == self.text())
    }

    /// Check or uncheck a checkbox or radio member (user input).
    ///
    /// Radio exclusivity is kept by [`super::Step::check_radio`].
    pub fn set_checked(&mut self, checked: bool) {
        if let FieldValue::Checked(value) = &mut self.value {
            *value = checked;
        }
        self.notify_input();
    }

    /// Replace the file selection of a file input, enforcing `limits`.
    ///
    /// On violation the selection is cleared and the error returned.
    pub fn select_files(
        &mut self,
        files: Vec<Attachment>,
        limits: &AttachmentLimits,
    ) -> Result<(), AttachmentError> {
        let result = match &mut self.value {
            FieldValue::Files(set) => set.select(files, limits),
            _ => Ok(()),
        };
        self.notify_input();
        result
    }

    /// Drop the current file selection
    pub fn clear_files(&mut self) {
        if let FieldValue::Files(set) = &mut self.value {
            set.clear();
        }
        self.notify_input();
    }

    /// Set a persistent custom validity message; an empty message clears it
    pub fn set_custom_validity(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.custom_validity = (!message.is_empty()).then_some(message);
        self.clear_custom_on_input = false;
    }

    /// Set a custom validity message that clears on the next interaction
    pub fn set_custom_validity_once(&mut self, message: impl Into<String>) {
        self.set_custom_validity(message);
        self.clear_custom_on_input = self.custom_validity.is_some();
    }

    pub fn custom_validity(&self) -> Option<&str> {
        self.custom_validity.as_deref()
    }

    fn notify_input(&mut self) {
        if self.clear_custom_on_input {
            self.custom_validity = None;
            self.clear_custom_on_input = false;
        }
    }

    pub fn check_validity(&self) -> bool {
        self.validity().is_none()
    }

    /// First failing native constraint, if any
    pub fn validity(&self) -> Option<ValidityIssue> {
        if let Some(message) = &self.custom_validity {
            return Some(ValidityIssue::CustomError(message.clone()));
        }

        match &self.value {
            // Group-level requiredness of radios is checked by the validator
            FieldValue::Checked(_) if self.field_type == FieldType::Radio => None,
            FieldValue::Checked(checked) => (self.required && !checked)
                .then_some(ValidityIssue::ValueMissing(self.field_type)),
            FieldValue::Files(set) => (self.required && set.is_empty())
                .then_some(ValidityIssue::ValueMissing(self.field_type)),
            FieldValue::Text(text) => self.text_validity(text),
        }
    }

    fn text_validity(&self, text: &str) -> Option<ValidityIssue> {
        if text.is_empty() {
            return self
                .required
                .then_some(ValidityIssue::ValueMissing(self.field_type));
        }

        if self.field_type == FieldType::Select {
            return None;
        }

        if !type_matches(self.field_type, text) {
            return Some(ValidityIssue::TypeMismatch(self.field_type));
        }

        let actual = text.chars().count();
        if let Some(min) = self.min_length {
            if actual < min {
                return Some(ValidityIssue::TooShort { min, actual });
            }
        }
        if let Some(max) = self.max_length {
            if actual > max {
                return Some(ValidityIssue::TooLong { max, actual });
            }
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(text) {
                return Some(ValidityIssue::PatternMismatch);
            }
        }

        if self.field_type == FieldType::Number {
            let number: f64 = text.trim().parse().ok()?;
            if let Some(min) = self.min {
                if number < min {
                    return Some(ValidityIssue::RangeUnderflow { min });
                }
            }
            if let Some(max) = self.max {
                if number > max {
                    return Some(ValidityIssue::RangeOverflow { max });
                }
            }
        }

        None
    }
}

fn type_matches(field_type: FieldType, text: &str) -> bool {
    match field_type {
        FieldType::Email => is_email(text),
        FieldType::Url => reqwest::Url::parse(text.trim()).is_ok(),
        FieldType::Number => text
            .trim()
            .parse::<f64>()
            .map(f64::is_finite)
            .unwrap_or(false),
        FieldType::Date => chrono::NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").is_ok(),
        _ => true,
    }
}

fn is_email(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
