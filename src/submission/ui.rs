//! View state touched by a submission: submit control, form chrome, success panel

use super::{SubmissionEvent, SubmissionResult, SubmitPhase};

/// The submit button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct SubmissionUi {
    pub submit: SubmitControl,
    idle_label: String,
    /// Steps, navigation buttons and field widgets
    pub form_visible: bool,
    /// Progress bar and step indicators
    pub progress_visible: bool,
    /// Description line under the form title
    pub header_text: String,
    completion_message: String,
    pub success_visible: bool,
    /// Pending alert, shown until dismissed
    pub alert: Option<String>,
}

impl SubmissionUi {
    pub fn new(
        idle_label: impl Into<String>,
        header_text: impl Into<String>,
        completion_message: impl Into<String>,
    ) -> Self {
        let idle_label = idle_label.into();
        Self {
            submit: SubmitControl {
                enabled: true,
                label: idle_label.clone(),
            },
            idle_label,
            form_visible: true,
            progress_visible: true,
            header_text: header_text.into(),
            completion_message: completion_message.into(),
            success_visible: false,
            alert: None,
        }
    }

    /// The application was accepted; nothing re-shows the form afterwards
    pub fn is_complete(&self) -> bool {
        self.success_visible
    }

    /// A submission is outstanding
    pub fn in_flight(&self) -> bool {
        !self.submit.enabled && !self.is_complete()
    }

    /// Lock the submit control for a new attempt.
    ///
    /// Returns false when an attempt is already running or the session is done.
    pub fn begin(&mut self, first_phase: SubmitPhase) -> bool {
        if !self.submit.enabled || self.is_complete() {
            return false;
        }
        self.submit.enabled = false;
        self.submit.label = first_phase.label().to_string();
        self.alert = None;
        true
    }

    pub fn apply(&mut self, event: &SubmissionEvent) {
        match event {
            SubmissionEvent::Phase(phase) => {
                self.submit.label = phase.label().to_string();
            }
            SubmissionEvent::Finished(SubmissionResult::Success) => {
                self.form_visible = false;
                self.progress_visible = false;
                self.header_text = self.completion_message.clone();
                self.success_visible = true;
            }
            SubmissionEvent::Finished(SubmissionResult::Failure(reason)) => {
                self.alert = Some(format!("Oops! {}", reason));
                self.submit.enabled = true;
                self.submit.label = self.idle_label.clone();
            }
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Show an alert that did not come from a submission (e.g. attachment limits)
    pub fn show_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }
}
