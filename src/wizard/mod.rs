//! Step wizard: position, guarded transitions and the view projection.
//!
//! Forward moves are gated on [`Validator`]; backward moves are not.
//! Every transition keeps exactly one step active, the one at the
//! current index, and returns the viewport to the top.

mod state;

pub use state::WizardState;

use crate::form::{Step, StepRegistry, ValidityReporter, Validator};

/// Label of the forward control, whatever the step
pub const NEXT_LABEL: &str = "Next";

/// Outcome of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced { from: usize, to: usize },
    Retreated { from: usize, to: usize },
    /// Validation failed; `focus` is the first invalid field of the step
    Blocked { focus: Option<usize> },
    /// Nothing to do at this end of the wizard
    Unchanged,
}

impl Transition {
    pub fn moved(&self) -> bool {
        matches!(
            self,
            Transition::Advanced { .. } | Transition::Retreated { .. }
        )
    }
}

/// Everything the screen needs to draw the wizard chrome
#[derive(Debug, Clone, PartialEq)]
pub struct WizardView {
    pub active_step: usize,
    /// Visibility per step; only `active_step` is true
    pub step_active: Vec<bool>,
    /// Fraction in `(0, 1]`
    pub progress: f64,
    pub indicators_reached: Vec<bool>,
    pub prev_disabled: bool,
    pub next_visible: bool,
    pub submit_visible: bool,
    pub next_label: &'static str,
    pub scroll_offset: u16,
}

pub struct WizardController {
    registry: StepRegistry,
    state: WizardState,
    scroll_offset: u16,
}

impl WizardController {
    /// Take ownership of the steps and activate the first one.
    ///
    /// An empty registry is rejected when the schema is checked, so there is
    /// always a step to activate here.
    pub fn new(registry: StepRegistry) -> Self {
        let state = WizardState::new(registry.len());
        let mut controller = Self {
            registry,
            state,
            scroll_offset: 0,
        };
        controller.sync_active();
        controller
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current()
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut StepRegistry {
        &mut self.registry
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.registry.get(self.state.current())
    }

    pub fn current_step_mut(&mut self) -> Option<&mut Step> {
        self.registry.get_mut(self.state.current())
    }

    /// Run the current step through the validator without moving
    pub fn validate_current(&mut self, reporter: &mut dyn ValidityReporter) -> bool {
        match self.registry.get_mut(self.state.current()) {
            Some(step) => Validator::validate(step, reporter),
            None => true,
        }
    }

    /// Move forward if the current step validates
    pub fn advance(&mut self, reporter: &mut dyn ValidityReporter) -> Transition {
        let from = self.state.current();
        let Some(step) = self.registry.get_mut(from) else {
            return Transition::Unchanged;
        };

        if !Validator::validate(step, reporter) {
            let focus = step.first_invalid();
            tracing::debug!(step = from, ?focus, "Advance blocked by validation");
            return Transition::Blocked { focus };
        }

        if !self.state.step_forward() {
            return Transition::Unchanged;
        }
        self.after_transition();
        tracing::debug!(from, to = self.state.current(), "Advanced");
        Transition::Advanced {
            from,
            to: self.state.current(),
        }
    }

    /// Move back one step, no validation
    pub fn retreat(&mut self) -> Transition {
        let from = self.state.current();
        if !self.state.step_back() {
            return Transition::Unchanged;
        }
        self.after_transition();
        tracing::debug!(from, to = self.state.current(), "Retreated");
        Transition::Retreated {
            from,
            to: self.state.current(),
        }
    }

    pub fn render(&self) -> WizardView {
        let current = self.state.current();
        let total = self.state.total();
        WizardView {
            active_step: current,
            step_active: (0..total).map(|i| i == current).collect(),
            progress: self.state.progress(),
            indicators_reached: (0..total).map(|i| i <= current).collect(),
            prev_disabled: self.state.is_first(),
            next_visible: !self.state.is_last(),
            submit_visible: self.state.is_last(),
            next_label: NEXT_LABEL,
            scroll_offset: self.scroll_offset,
        }
    }

    pub fn scroll_offset(&self) -> u16 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: u16) {
        self.scroll_offset = offset;
    }

    pub fn reset_viewport(&mut self) {
        self.scroll_offset = 0;
    }

    fn after_transition(&mut self) {
        self.sync_active();
        self.reset_viewport();
    }

    fn sync_active(&mut self) {
        let current = self.state.current();
        for (index, step) in self.registry.iter_mut().enumerate() {
            step.set_active(index == current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormSchema, ValidityReport, SELECT_OPTION_MESSAGE};

    const THREE_STEPS: &str = r#"
title = "Test"

[[steps]]
title = "Contact"

[[steps.fields]]
name = "name"
type = "text"
required = true

[[steps]]
title = "Availability"

[[steps.fields]]
name = "shift"
type = "radio"
required = true
options = ["Day", "Night"]

[[steps.fields]]
name = "notes"
type = "text"

[[steps]]
title = "Confirm"

[[steps.fields]]
name = "consent"
type = "checkbox"
"#;

    fn controller() -> WizardController {
        let schema = FormSchema::from_toml(THREE_STEPS).unwrap();
        WizardController::new(StepRegistry::from_schema(&schema).unwrap())
    }

    fn fill_contact(controller: &mut WizardController) {
        controller
            .current_step_mut()
            .unwrap()
            .field_mut(0)
            .unwrap()
            .set_text("Ada");
    }

    fn assert_single_active(controller: &WizardController) {
        let active: Vec<usize> = controller
            .registry()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_active())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(active, vec![controller.current_index()]);
    }

    #[test]
    fn test_starts_on_first_step() {
        let controller = controller();
        let view = controller.render();
        assert_eq!(view.active_step, 0);
        assert!(view.prev_disabled);
        assert!(view.next_visible);
        assert!(!view.submit_visible);
        assert_eq!(view.next_label, "Next");
        assert_single_active(&controller);
    }

    #[test]
    fn test_render_for_every_index() {
        let mut controller = controller();
        fill_contact(&mut controller);
        let mut reports = Vec::new();

        for i in 0..3 {
            let view = controller.render();
            assert_eq!(view.active_step, i);
            assert_eq!(view.step_active.iter().filter(|a| **a).count(), 1);
            assert!(view.step_active[i]);
            for (j, reached) in view.indicators_reached.iter().enumerate() {
                assert_eq!(*reached, j <= i);
            }
            assert!((view.progress - (i + 1) as f64 / 3.0).abs() < f64::EPSILON);
            assert_eq!(view.prev_disabled, i == 0);
            assert_eq!(view.submit_visible, i == 2);
            assert_eq!(view.next_visible, i != 2);
            assert_single_active(&controller);

            if i == 1 {
                controller.current_step_mut().unwrap().check_radio(0);
            }
            controller.advance(&mut reports);
        }
        assert!(reports.is_empty());
    }

    #[test]
    fn test_blocked_advance_leaves_state() {
        let mut controller = controller();
        let mut reports: Vec<ValidityReport> = Vec::new();

        let transition = controller.advance(&mut reports);
        assert_eq!(transition, Transition::Blocked { focus: Some(0) });
        assert_eq!(controller.current_index(), 0);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].field_name, "name");
    }

    #[test]
    fn test_retreat_from_first_is_noop() {
        let mut controller = controller();
        controller.set_scroll_offset(4);
        assert_eq!(controller.retreat(), Transition::Unchanged);
        assert_eq!(controller.current_index(), 0);
        assert_eq!(controller.scroll_offset(), 4);
    }

    #[test]
    fn test_retreat_skips_validation() {
        let mut controller = controller();
        fill_contact(&mut controller);
        controller.advance(&mut Vec::new());
        // Leave the required radio unanswered and go back
        controller.set_scroll_offset(7);
        assert_eq!(
            controller.retreat(),
            Transition::Retreated { from: 1, to: 0 }
        );
        assert_eq!(controller.scroll_offset(), 0);
        assert_single_active(&controller);
    }

    #[test]
    fn test_unanswered_radio_blocks_middle_step() {
        let mut controller = controller();
        fill_contact(&mut controller);
        assert!(controller.advance(&mut Vec::new()).moved());

        let mut reports = Vec::new();
        let transition = controller.advance(&mut reports);
        assert_eq!(transition, Transition::Blocked { focus: Some(0) });
        assert_eq!(controller.current_index(), 1);
        assert_eq!(reports[0].message, SELECT_OPTION_MESSAGE);
        let representative = controller.current_step().unwrap().field(0).unwrap();
        assert_eq!(representative.custom_validity(), Some(SELECT_OPTION_MESSAGE));

        // Answering clears the message and lets the wizard move on
        controller.current_step_mut().unwrap().check_radio(1);
        assert_eq!(
            controller.advance(&mut Vec::new()),
            Transition::Advanced { from: 1, to: 2 }
        );
    }

    #[test]
    fn test_advance_on_last_step_is_unchanged() {
        let mut controller = controller();
        fill_contact(&mut controller);
        controller.advance(&mut Vec::new());
        controller.current_step_mut().unwrap().check_radio(0);
        controller.advance(&mut Vec::new());
        assert_eq!(controller.advance(&mut Vec::new()), Transition::Unchanged);
        assert_eq!(controller.current_index(), 2);
    }
}
