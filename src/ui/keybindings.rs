//! Keyboard shortcuts of the wizard screen.
//!
//! Single source for both key dispatch and the help dialog. Shortcuts are
//! matched before the focused field editor, except Up and Down, which go to
//! the editor first and fall back to focus movement when it ignores them.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Something the screen does in response to a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NextStep,
    PreviousStep,
    Submit,
    NextField,
    PreviousField,
    ToggleHelp,
    Quit,
}

/// Categories for organizing shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutCategory {
    General,
    Navigation,
    Actions,
}

impl ShortcutCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ShortcutCategory::General => "General",
            ShortcutCategory::Navigation => "Navigation",
            ShortcutCategory::Actions => "Actions",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [ShortcutCategory] {
        &[
            ShortcutCategory::Navigation,
            ShortcutCategory::Actions,
            ShortcutCategory::General,
        ]
    }
}

/// A keyboard shortcut definition
#[derive(Debug, Clone)]
pub struct Shortcut {
    /// Accepted key combinations, primary first
    pub keys: &'static [(KeyCode, KeyModifiers)],
    pub description: &'static str,
    pub category: ShortcutCategory,
    pub action: Action,
}

impl Shortcut {
    /// Format keys for display (e.g., "PgDn/Ctrl+N")
    pub fn key_display(&self) -> String {
        self.keys
            .iter()
            .map(|(code, modifiers)| format_key(code, *modifiers))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Format keys for the help dialog (left-padded)
    pub fn key_display_padded(&self) -> String {
        format!("{:<16}", self.key_display())
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.keys.iter().any(|(code, modifiers)| {
            key.code == *code
                && key.modifiers.contains(*modifiers)
                && (modifiers.contains(KeyModifiers::CONTROL)
                    || !key.modifiers.contains(KeyModifiers::CONTROL))
        })
    }
}

fn format_key(key: &KeyCode, modifiers: KeyModifiers) -> String {
    let base = match key {
        KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => format!("{:?}", key),
    };
    if modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{}", base)
    } else {
        base
    }
}

const NONE: KeyModifiers = KeyModifiers::NONE;
const CTRL: KeyModifiers = KeyModifiers::CONTROL;

/// Static registry of all keyboard shortcuts
pub static SHORTCUTS: &[Shortcut] = &[
    // Navigation
    Shortcut {
        keys: &[(KeyCode::PageDown, NONE), (KeyCode::Char('n'), CTRL)],
        description: "Next step",
        category: ShortcutCategory::Navigation,
        action: Action::NextStep,
    },
    Shortcut {
        keys: &[(KeyCode::PageUp, NONE), (KeyCode::Char('p'), CTRL)],
        description: "Previous step",
        category: ShortcutCategory::Navigation,
        action: Action::PreviousStep,
    },
    Shortcut {
        keys: &[(KeyCode::Tab, NONE), (KeyCode::Down, NONE)],
        description: "Next field",
        category: ShortcutCategory::Navigation,
        action: Action::NextField,
    },
    Shortcut {
        keys: &[(KeyCode::BackTab, NONE), (KeyCode::Up, NONE)],
        description: "Previous field",
        category: ShortcutCategory::Navigation,
        action: Action::PreviousField,
    },
    // Actions
    Shortcut {
        keys: &[(KeyCode::Char('s'), CTRL)],
        description: "Submit application (last step)",
        category: ShortcutCategory::Actions,
        action: Action::Submit,
    },
    // General
    Shortcut {
        keys: &[(KeyCode::F(1), NONE)],
        description: "Toggle help",
        category: ShortcutCategory::General,
        action: Action::ToggleHelp,
    },
    Shortcut {
        keys: &[(KeyCode::Esc, NONE), (KeyCode::Char('c'), CTRL)],
        description: "Quit",
        category: ShortcutCategory::General,
        action: Action::Quit,
    },
];

/// Action bound to a key, if any
pub fn action_for(key: &KeyEvent) -> Option<Action> {
    SHORTCUTS.iter().find(|s| s.matches(key)).map(|s| s.action)
}

/// Shortcuts grouped by category, in display order
pub fn shortcuts_by_category() -> Vec<(ShortcutCategory, Vec<&'static Shortcut>)> {
    ShortcutCategory::all()
        .iter()
        .map(|category| {
            let shortcuts = SHORTCUTS
                .iter()
                .filter(|s| s.category == *category)
                .collect::<Vec<_>>();
            (*category, shortcuts)
        })
        .filter(|(_, shortcuts)| !shortcuts.is_empty())
        .collect()
}
