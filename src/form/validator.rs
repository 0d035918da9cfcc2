//! Step validation gate
//!
//! Checks native constraints field by field and stops at the first problem,
//! then requires a checked member in every required radio group.

use super::registry::Step;

/// Message attached to an unanswered required radio group
pub const SELECT_OPTION_MESSAGE: &str = "Please select an option.";

/// Surface for validity messages: displays the message and focuses the field
pub trait ValidityReporter {
    fn report(&mut self, field_index: usize, field_name: &str, message: &str);
}

/// A message raised against one field of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityReport {
    pub field_index: usize,
    pub field_name: String,
    pub message: String,
}

impl ValidityReporter for Vec<ValidityReport> {
    fn report(&mut self, field_index: usize, field_name: &str, message: &str) {
        self.push(ValidityReport {
            field_index,
            field_name: field_name.to_string(),
            message: message.to_string(),
        });
    }
}

pub struct Validator;

impl Validator {
    /// Decide whether `step` may be left forwards.
    ///
    /// Reports at most one problem. An unanswered required radio group gets a
    /// one-shot custom message on its first member.
    pub fn validate(step: &mut Step, reporter: &mut dyn ValidityReporter) -> bool {
        for (index, field) in step.fields().iter().enumerate() {
            if let Some(issue) = field.validity() {
                tracing::debug!(field = field.name(), issue = %issue, "Field failed validation");
                reporter.report(index, field.name(), &issue.to_string());
                return false;
            }
        }

        let unanswered = step
            .required_radio_groups()
            .into_iter()
            .find(|group| !step.radio_group_satisfied(group))
            .map(str::to_string);

        if let Some(group) = unanswered {
            // Groups always have members here, they were found through them
            let Some(&representative) = step.radio_members(&group).first() else {
                return true;
            };
            if let Some(field) = step.field_mut(representative) {
                field.set_custom_validity_once(SELECT_OPTION_MESSAGE);
            }
            tracing::debug!(group = %group, "Required radio group unanswered");
            reporter.report(representative, &group, SELECT_OPTION_MESSAGE);
            return false;
        }

        true
    }
}
