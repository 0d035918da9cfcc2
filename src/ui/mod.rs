pub mod dialogs;
pub mod form_field;
pub mod keybindings;
pub mod terminal_guard;
pub mod wizard_screen;

pub use dialogs::{AlertDialog, HelpDialog};
pub use form_field::{EditOutcome, FieldEditor};
pub use keybindings::Action;
pub use terminal_guard::{install_panic_hook, TerminalGuard};
pub use wizard_screen::WizardScreen;
