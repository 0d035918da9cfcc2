//! Ordered, fixed set of wizard steps

use super::field::Field;
use super::schema::{FieldType, FormSchema, StepSchema};
use super::FormError;

/// One page of the wizard and the fields it contains
#[derive(Debug, Clone)]
pub struct Step {
    title: String,
    description: Option<String>,
    fields: Vec<Field>,
    /// Maintained by the wizard controller only
    active: bool,
}

impl Step {
    pub fn from_schema(schema: &StepSchema) -> Result<Self, FormError> {
        let mut fields = Vec::new();
        for field in &schema.fields {
            fields.extend(Field::from_schema(field)?);
        }
        Ok(Self {
            title: schema.title.clone(),
            description: schema.description.clone(),
            fields,
            active: false,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn field_mut(&mut self, index: usize) -> Option<&mut Field> {
        self.fields.get_mut(index)
    }

    /// Index of the first field (in document order) with the given name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Names of required radio groups, in document order, without duplicates
    pub fn required_radio_groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for field in &self.fields {
            if field.field_type() == FieldType::Radio
                && field.is_required()
                && !groups.contains(&field.name())
            {
                groups.push(field.name());
            }
        }
        groups
    }

    /// Indexes of the radio members of a group, in document order
    pub fn radio_members(&self, group: &str) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.field_type() == FieldType::Radio && f.name() == group)
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether exactly one member of a radio group is checked
    pub fn radio_group_satisfied(&self, group: &str) -> bool {
        self.radio_members(group)
            .into_iter()
            .filter(|&i| self.fields[i].is_checked())
            .count()
            == 1
    }

    /// Check one radio member and uncheck its siblings.
    ///
    /// The whole group counts as interacted with, which also drops any
    /// one-shot message parked on its representative.
    pub fn check_radio(&mut self, index: usize) {
        let Some(group) = self
            .fields
            .get(index)
            .filter(|f| f.field_type() == FieldType::Radio)
            .map(|f| f.name().to_string())
        else {
            return;
        };
        for member in self.radio_members(&group) {
            self.fields[member].set_checked(member == index);
        }
    }

    /// Index of the first field failing its native constraints
    pub fn first_invalid(&self) -> Option<usize> {
        self.fields.iter().position(|f| !f.check_validity())
    }
}

/// The ordered steps of one form
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<Step>,
}

impl StepRegistry {
    pub fn from_schema(schema: &FormSchema) -> Result<Self, FormError> {
        if schema.steps.is_empty() {
            return Err(FormError::NoSteps);
        }
        let steps = schema
            .steps
            .iter()
            .map(Step::from_schema)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Step> {
        self.steps.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Step> {
        self.steps.iter_mut()
    }

    /// Locate a field by name across all steps: `(step, field)` indexes
    pub fn find(&self, name: &str) -> Option<(usize, usize)> {
        self.steps
            .iter()
            .enumerate()
            .find_map(|(s, step)| step.position(name).map(|f| (s, f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
title = "Test"

[[steps]]
title = "Contact"

[[steps.fields]]
name = "email"
type = "email"
required = true

[[steps]]
title = "Shift"

[[steps.fields]]
name = "shift"
type = "radio"
required = true
options = ["Day", "Night"]

[[steps.fields]]
name = "remote"
type = "radio"
options = ["Yes", "No"]

[[steps.fields]]
name = "relocate"
type = "radio"
required = true
options = ["Yes", "No"]
"#;

    fn registry() -> StepRegistry {
        StepRegistry::from_schema(&FormSchema::from_toml(FORM).unwrap()).unwrap()
    }

    #[test]
    fn test_registry_counts_steps() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).unwrap().title(), "Shift");
        assert!(registry.get(2).is_none());
    }

    #[test]
    fn test_required_radio_groups_in_document_order() {
        let registry = registry();
        let step = registry.get(1).unwrap();
        assert_eq!(step.required_radio_groups(), vec!["shift", "relocate"]);
        assert_eq!(step.radio_members("shift"), vec![0, 1]);
        assert_eq!(step.radio_members("relocate"), vec![4, 5]);
    }

    #[test]
    fn test_check_radio_is_exclusive() {
        let mut registry = registry();
        let step = registry.get_mut(1).unwrap();
        step.check_radio(0);
        assert!(step.radio_group_satisfied("shift"));
        step.check_radio(1);
        assert!(!step.field(0).unwrap().is_checked());
        assert!(step.field(1).unwrap().is_checked());
        assert!(step.radio_group_satisfied("shift"));
        assert!(!step.radio_group_satisfied("relocate"));
    }

    #[test]
    fn test_check_radio_clears_one_shot_on_representative() {
        let mut registry = registry();
        let step = registry.get_mut(1).unwrap();
        step.field_mut(0)
            .unwrap()
            .set_custom_validity_once("Please select an option.");
        step.check_radio(1);
        assert!(step.field(0).unwrap().custom_validity().is_none());
    }

    #[test]
    fn test_find_across_steps() {
        let registry = registry();
        assert_eq!(registry.find("email"), Some((0, 0)));
        assert_eq!(registry.find("relocate"), Some((1, 4)));
        assert_eq!(registry.find("missing"), None);
    }
}
