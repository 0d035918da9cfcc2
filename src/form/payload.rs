//! Outgoing submission payload assembled from the form's fields

use super::field::FieldValue;
use super::registry::StepRegistry;
use super::schema::FieldType;
use crate::attachments::Attachment;

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Text(String),
    File(Attachment),
}

/// Ordered name/value entries, like a browser's form data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormPayload {
    entries: Vec<(String, PayloadValue)>,
}

impl FormPayload {
    /// Collect the submittable entries of every step in document order.
    ///
    /// Unchecked checkboxes and radios contribute nothing; each selected file
    /// becomes its own entry under the file input's name.
    pub fn from_registry(registry: &StepRegistry) -> Self {
        let mut payload = FormPayload::default();
        for field in registry.iter().flat_map(|step| step.fields()) {
            match field.value() {
                FieldValue::Text(text) => payload.push_text(field.name(), text.clone()),
                FieldValue::Checked(true) => {
                    let value = field.submit_value().unwrap_or("on");
                    payload.push_text(field.name(), value);
                }
                FieldValue::Checked(false) => {}
                FieldValue::Files(set) => {
                    debug_assert_eq!(field.field_type(), FieldType::File);
                    for file in set.files() {
                        payload.push_file(field.name(), file.clone());
                    }
                }
            }
        }
        payload
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .push((name.into(), PayloadValue::Text(value.into())));
    }

    pub fn push_file(&mut self, name: impl Into<String>, file: Attachment) {
        self.entries.push((name.into(), PayloadValue::File(file)));
    }

    /// Remove every entry with this name, returning how many were dropped
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        before - self.entries.len()
    }

    /// Files stored under this name, in order
    pub fn files(&self, name: &str) -> Vec<Attachment> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .filter_map(|(_, v)| match v {
                PayloadValue::File(file) => Some(file.clone()),
                PayloadValue::Text(_) => None,
            })
            .collect()
    }

    /// First text value stored under this name
    pub fn text(&self, name: &str) -> Option<&str> {
        self.entries.iter().find_map(|(n, v)| match v {
            PayloadValue::Text(text) if n == name => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn entries(&self) -> &[(String, PayloadValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
