//! Current position in the wizard

/// Index of the active step out of `total`. Always in `0..total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardState {
    current: usize,
    total: usize,
}

impl WizardState {
    /// Start at the first step. `total` must be at least 1.
    pub fn new(total: usize) -> Self {
        debug_assert!(total > 0, "a wizard needs at least one step");
        Self {
            current: 0,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.total
    }

    /// Completed fraction, counting the active step as reached
    pub fn progress(&self) -> f64 {
        (self.current + 1) as f64 / self.total as f64
    }

    /// Move one step forward; false at the last step
    pub(crate) fn step_forward(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Move one step back; false at the first step
    pub(crate) fn step_back(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current -= 1;
        true
    }
}
