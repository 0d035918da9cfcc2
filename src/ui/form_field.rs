//! Editing widgets for form fields
//!
//! A [`FieldEditor`] holds only the widget state (cursor, text area, list
//! selection). The value itself lives in the [`Field`] it edits.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use crate::form::{Field, FieldType};

/// What a key press did to a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Not handled; the screen may use the key for navigation
    Ignored,
    Changed,
    /// A radio option asked to be checked; exclusivity is the step's job
    CheckRadio,
    /// Enter pressed in a file picker with this path list
    SelectFiles(String),
}

pub enum FieldEditor {
    /// Single-line text, email, phone, URL, number or date
    TextInput { cursor_pos: usize },
    /// Multi-line text using tui-textarea
    TextArea { textarea: Box<TextArea<'static>> },
    Select { list_state: ListState },
    Checkbox,
    RadioOption,
    /// Path list typed by the applicant, applied with Enter
    FilePicker { buffer: String, cursor_pos: usize },
}

/// Byte offset of the `char_pos`-th character
fn byte_index(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Line editing shared by text inputs and the file picker.
///
/// Returns None when the key is not an editing key.
fn edit_line(text: &mut String, cursor_pos: &mut usize, key: KeyEvent, max: Option<usize>) -> Option<bool> {
    let len = text.chars().count();
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if max.map(|m| len < m).unwrap_or(true) {
                text.insert(byte_index(text, *cursor_pos), c);
                *cursor_pos += 1;
                return Some(true);
            }
            Some(false)
        }
        KeyCode::Backspace => {
            if *cursor_pos > 0 {
                *cursor_pos -= 1;
                text.remove(byte_index(text, *cursor_pos));
                return Some(true);
            }
            Some(false)
        }
        KeyCode::Delete => {
            if *cursor_pos < len {
                text.remove(byte_index(text, *cursor_pos));
                return Some(true);
            }
            Some(false)
        }
        KeyCode::Left => {
            *cursor_pos = cursor_pos.saturating_sub(1);
            Some(false)
        }
        KeyCode::Right => {
            *cursor_pos = (*cursor_pos + 1).min(len);
            Some(false)
        }
        KeyCode::Home => {
            *cursor_pos = 0;
            Some(false)
        }
        KeyCode::End => {
            *cursor_pos = len;
            Some(false)
        }
        _ => None,
    }
}

fn with_cursor(text: &str, cursor_pos: usize) -> String {
    let mut shown = text.to_string();
    shown.insert(byte_index(text, cursor_pos), '|');
    shown
}

impl FieldEditor {
    pub fn for_field(field: &Field) -> Self {
        match field.field_type() {
            FieldType::Textarea => {
                let mut textarea = TextArea::default();
                textarea.insert_str(field.text());
                FieldEditor::TextArea {
                    textarea: Box::new(textarea),
                }
            }
            FieldType::Select => {
                let mut list_state = ListState::default();
                list_state.select(field.selected_option());
                FieldEditor::Select { list_state }
            }
            FieldType::Checkbox => FieldEditor::Checkbox,
            FieldType::Radio => FieldEditor::RadioOption,
            FieldType::File => FieldEditor::FilePicker {
                buffer: String::new(),
                cursor_pos: 0,
            },
            _ => FieldEditor::TextInput {
                cursor_pos: field.text().chars().count(),
            },
        }
    }

    pub fn handle_key(&mut self, field: &mut Field, key: KeyEvent) -> EditOutcome {
        match self {
            FieldEditor::TextInput { cursor_pos } => {
                let mut text = field.text().to_string();
                match edit_line(&mut text, cursor_pos, key, field.max_length()) {
                    Some(true) => {
                        field.set_text(text);
                        EditOutcome::Changed
                    }
                    Some(false) => EditOutcome::Changed,
                    None => EditOutcome::Ignored,
                }
            }
            FieldEditor::TextArea { textarea } => {
                if key.modifiers.contains(KeyModifiers::CONTROL) || key.code == KeyCode::Tab {
                    return EditOutcome::Ignored;
                }
                if textarea.input(key) {
                    field.set_text(textarea.lines().join("\n"));
                }
                EditOutcome::Changed
            }
            FieldEditor::Select { list_state } => {
                let count = field.options().len();
                let current = field.selected_option();
                let next = match key.code {
                    KeyCode::Up | KeyCode::Char('k') => {
                        current.map(|i| i.saturating_sub(1)).unwrap_or(0)
                    }
                    KeyCode::Down | KeyCode::Char('j') => current
                        .map(|i| (i + 1).min(count.saturating_sub(1)))
                        .unwrap_or(0),
                    _ => return EditOutcome::Ignored,
                };
                if count > 0 {
                    field.select_option(next);
                    list_state.select(Some(next));
                }
                EditOutcome::Changed
            }
            FieldEditor::Checkbox => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => {
                    field.set_checked(!field.is_checked());
                    EditOutcome::Changed
                }
                _ => EditOutcome::Ignored,
            },
            FieldEditor::RadioOption => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => EditOutcome::CheckRadio,
                _ => EditOutcome::Ignored,
            },
            FieldEditor::FilePicker { buffer, cursor_pos } => {
                if key.code == KeyCode::Enter {
                    return EditOutcome::SelectFiles(buffer.clone());
                }
                match edit_line(buffer, cursor_pos, key, None) {
                    Some(_) => EditOutcome::Changed,
                    None => EditOutcome::Ignored,
                }
            }
        }
    }

    /// Rows needed below the label
    pub fn render_height(&self, field: &Field) -> u16 {
        match self {
            FieldEditor::TextArea { .. } => 5,
            FieldEditor::Select { .. } => (field.options().len() as u16).clamp(1, 5),
            FieldEditor::FilePicker { .. } => {
                let files = field.attachments().map(|s| s.len()).unwrap_or(0);
                1 + (files as u16).min(4)
            }
            _ => 1,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, field: &Field, focused: bool) {
        let border_color = if focused { Color::Cyan } else { Color::Gray };
        let text_style = Style::default().fg(if focused { Color::White } else { Color::Gray });

        match self {
            FieldEditor::TextInput { cursor_pos } => {
                let value = field.text();
                let content = if value.is_empty() && !focused {
                    Line::from(Span::styled(
                        field.placeholder().unwrap_or_default().to_string(),
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    let shown = if focused {
                        with_cursor(value, *cursor_pos)
                    } else {
                        value.to_string()
                    };
                    let suffix = field
                        .max_length()
                        .map(|m| format!(" ({}/{})", value.chars().count(), m))
                        .unwrap_or_default();
                    Line::from(vec![
                        Span::raw(shown),
                        Span::styled(suffix, Style::default().fg(Color::DarkGray)),
                    ])
                };
                frame.render_widget(Paragraph::new(content).style(text_style), area);
            }
            FieldEditor::TextArea { textarea } => {
                textarea.set_cursor_line_style(Style::default());
                textarea.set_cursor_style(if focused {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                });
                textarea.set_block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(border_color)),
                );
                if let Some(placeholder) = field.placeholder() {
                    textarea.set_placeholder_text(placeholder.to_string());
                    textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));
                }
                frame.render_widget(&**textarea, area);
            }
            FieldEditor::Select { list_state } => {
                let selected = field.selected_option();
                let items: Vec<ListItem> = field
                    .options()
                    .iter()
                    .enumerate()
                    .map(|(i, opt)| {
                        let style = if Some(i) == selected {
                            Style::default().add_modifier(Modifier::BOLD)
                        } else {
                            Style::default().fg(Color::Gray)
                        };
                        ListItem::new(Span::styled(opt.clone(), style))
                    })
                    .collect();

                let list = List::new(items)
                    .highlight_style(Style::default().add_modifier(Modifier::REVERSED).fg(
                        if focused { Color::Cyan } else { Color::Gray },
                    ))
                    .highlight_symbol("> ");
                frame.render_stateful_widget(list, area, list_state);
            }
            FieldEditor::Checkbox | FieldEditor::RadioOption => {
                let checked = field.is_checked();
                let (marker, caption) = if field.field_type() == FieldType::Radio {
                    (
                        if checked { "(*)" } else { "( )" },
                        field.submit_value().unwrap_or_default(),
                    )
                } else {
                    (if checked { "[x]" } else { "[ ]" }, field.label())
                };
                let marker_style = if checked {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let line = Line::from(vec![
                    Span::styled(marker, marker_style),
                    Span::raw(" "),
                    Span::styled(caption.to_string(), text_style),
                ]);
                frame.render_widget(Paragraph::new(line), area);
            }
            FieldEditor::FilePicker { buffer, cursor_pos } => {
                let mut lines = vec![if buffer.is_empty() && !focused {
                    Line::from(Span::styled(
                        "Paths separated by commas, Enter to attach",
                        Style::default().fg(Color::DarkGray),
                    ))
                } else if focused {
                    Line::from(with_cursor(buffer, *cursor_pos))
                } else {
                    Line::from(buffer.clone())
                }];
                if let Some(set) = field.attachments() {
                    for file in set.files().iter().take(4) {
                        lines.push(Line::from(Span::styled(
                            format!("  {} ({} KB)", file.name, file.size.div_ceil(1024)),
                            Style::default().fg(Color::Green),
                        )));
                    }
                }
                frame.render_widget(Paragraph::new(lines).style(text_style), area);
            }
        }
    }
}
