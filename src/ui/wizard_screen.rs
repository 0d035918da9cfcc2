//! The application form screen: header, progress, active step, buttons

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use super::form_field::FieldEditor;
use crate::form::{Field, FormSchema, Step, ValidityReporter};
use crate::submission::SubmissionUi;
use crate::wizard::{WizardController, WizardView};

/// Widget state for every field of every step, plus focus and the
/// validity message currently on display
pub struct WizardScreen {
    title: String,
    step_titles: Vec<String>,
    success_message: String,
    editors: Vec<Vec<FieldEditor>>,
    /// Focused field within the active step
    pub focus: usize,
    /// Field index and message raised by the last validation
    validity: Option<(usize, String)>,
}

impl WizardScreen {
    pub fn new(schema: &FormSchema, controller: &WizardController) -> Self {
        let editors = controller
            .registry()
            .iter()
            .map(|step| step.fields().iter().map(FieldEditor::for_field).collect())
            .collect();

        Self {
            title: schema.title.clone(),
            step_titles: schema.steps.iter().map(|s| s.title.clone()).collect(),
            success_message: schema.success_message.clone(),
            editors,
            focus: 0,
            validity: None,
        }
    }

    pub fn editor_mut(&mut self, step: usize, field: usize) -> Option<&mut FieldEditor> {
        self.editors.get_mut(step).and_then(|e| e.get_mut(field))
    }

    pub fn validity_message(&self) -> Option<&str> {
        self.validity.as_ref().map(|(_, m)| m.as_str())
    }

    pub fn clear_validity(&mut self) {
        self.validity = None;
    }

    /// Focus the first field of a freshly shown step
    pub fn reset_focus(&mut self) {
        self.focus = 0;
        self.validity = None;
    }

    pub fn focus_next(&mut self, field_count: usize) {
        if self.focus + 1 < field_count {
            self.focus += 1;
        }
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.saturating_sub(1);
    }

    /// Reset the typed path list of a file picker
    pub fn clear_file_buffer(&mut self, step: usize, field: usize) {
        if let Some(FieldEditor::FilePicker { buffer, cursor_pos }) = self.editor_mut(step, field) {
            buffer.clear();
            *cursor_pos = 0;
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        controller: &mut WizardController,
        submission: &SubmissionUi,
    ) {
        let view = controller.render();
        let area = frame.area();

        let mut constraints = vec![Constraint::Length(4)]; // Header
        if submission.progress_visible {
            constraints.push(Constraint::Length(1)); // Progress bar
            constraints.push(Constraint::Length(1)); // Step indicators
        }
        constraints.push(Constraint::Min(5)); // Body
        if submission.form_visible {
            constraints.push(Constraint::Length(3)); // Buttons
        }
        constraints.push(Constraint::Length(1)); // Status line

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        let mut next_chunk = chunks.iter().copied();
        let mut take = || next_chunk.next().unwrap_or_default();

        self.render_header(frame, take(), submission);

        if submission.progress_visible {
            render_progress(frame, take(), &view);
            self.render_indicators(frame, take(), &view);
        }

        let body = take();
        if submission.form_visible {
            if let Some(offset) = self.render_step(frame, body, controller, &view) {
                controller.set_scroll_offset(offset);
            }
            render_buttons(frame, take(), &view, submission);
        } else if submission.success_visible {
            self.render_success(frame, body);
        }

        self.render_status(frame, take(), submission);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, submission: &SubmissionUi) {
        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                self.title.as_str(),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(submission.header_text.as_str()),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(header, area);
    }

    fn render_indicators(&self, frame: &mut Frame, area: Rect, view: &WizardView) {
        let mut spans = Vec::new();
        for (i, reached) in view.indicators_reached.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" ─ ", Style::default().fg(Color::DarkGray)));
            }
            let title = self.step_titles.get(i).map(String::as_str).unwrap_or("");
            let style = if i == view.active_step {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else if *reached {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let marker = if *reached { "●" } else { "○" };
            spans.push(Span::styled(format!("{} {}", marker, title), style));
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
            area,
        );
    }

    /// Draw the active step's fields, scrolled so the focused one is visible.
    ///
    /// Returns the scroll offset actually used.
    fn render_step(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        controller: &WizardController,
        view: &WizardView,
    ) -> Option<u16> {
        let step = controller.current_step()?;
        let editors = self.editors.get_mut(view.active_step)?;

        let block = Block::default()
            .title(format!(" {} ", step.title()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut rows: Vec<(u16, u16)> = Vec::with_capacity(editors.len());
        let mut y = if step.description().is_some() { 2 } else { 0 };
        for (index, (field, editor)) in step.fields().iter().zip(editors.iter()).enumerate() {
            let label_rows = u16::from(shows_label(step, index));
            let height = label_rows + editor.render_height(field);
            rows.push((y, height));
            y += height + 1;
        }

        let mut offset = view.scroll_offset;
        if let Some(&(top, height)) = rows.get(self.focus) {
            if top < offset {
                offset = top;
            } else if top + height > offset + inner.height {
                offset = (top + height).saturating_sub(inner.height);
            }
        }

        if let Some(description) = step.description() {
            if offset == 0 {
                let area = Rect::new(inner.x, inner.y, inner.width, 1);
                frame.render_widget(
                    Paragraph::new(description).style(Style::default().fg(Color::Gray)),
                    area,
                );
            }
        }

        for (index, (field, editor)) in step.fields().iter().zip(editors.iter_mut()).enumerate() {
            let (top, height) = rows[index];
            if top < offset || top + height > offset + inner.height {
                continue;
            }
            let mut y = inner.y + top - offset;
            let focused = index == self.focus;

            if shows_label(step, index) {
                frame.render_widget(
                    Paragraph::new(label_line(field, focused)),
                    Rect::new(inner.x, y, inner.width, 1),
                );
                y += 1;
            }
            let field_area = Rect::new(
                inner.x + 2,
                y,
                inner.width.saturating_sub(2),
                editor.render_height(field),
            );
            editor.render(frame, field_area, field, focused);
        }

        Some(offset)
    }

    fn render_success(&self, frame: &mut Frame, area: Rect) {
        let panel = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "✓ Application submitted",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(self.success_message.as_str()),
            Line::from(""),
            Line::from(Span::styled(
                "Press Esc to exit",
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        );
        frame.render_widget(panel, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, submission: &SubmissionUi) {
        let line = match (&self.validity, submission.form_visible) {
            (Some((_, message)), true) => Line::from(Span::styled(
                format!("⚠ {}", message),
                Style::default().fg(Color::Red),
            )),
            _ => Line::from(Span::styled(
                "Tab fields  PgDn next  PgUp back  Ctrl+S submit  F1 help  Esc quit",
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

impl ValidityReporter for WizardScreen {
    fn report(&mut self, field_index: usize, _field_name: &str, message: &str) {
        self.focus = field_index;
        self.validity = Some((field_index, message.to_string()));
    }
}

/// Radio options after the first of their group share its label
fn shows_label(step: &Step, index: usize) -> bool {
    let fields = step.fields();
    match (index.checked_sub(1).and_then(|i| fields.get(i)), fields.get(index)) {
        (Some(prev), Some(field)) => !(prev.name() == field.name()
            && field.field_type() == crate::form::FieldType::Radio),
        _ => true,
    }
}

fn label_line(field: &Field, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let mut spans = vec![Span::styled(field.label().to_string(), style)];
    if field.is_required() {
        spans.push(Span::styled(" *", Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}

fn render_progress(frame: &mut Frame, area: Rect, view: &WizardView) {
    let total = view.step_active.len();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(view.progress.clamp(0.0, 1.0))
        .label(format!("Step {} of {}", view.active_step + 1, total));
    frame.render_widget(gauge, area);
}

fn render_buttons(frame: &mut Frame, area: Rect, view: &WizardView, submission: &SubmissionUi) {
    let enabled = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let disabled = Style::default().fg(Color::DarkGray);

    let previous = Span::styled(
        "[ Previous ]",
        if view.prev_disabled { disabled } else { enabled },
    );
    let forward = if view.submit_visible {
        Span::styled(
            format!("[ {} ]", submission.submit.label),
            if submission.submit.enabled {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                disabled
            },
        )
    } else {
        Span::styled(format!("[ {} ]", view.next_label), enabled)
    };

    let buttons = Paragraph::new(Line::from(vec![previous, Span::raw("    "), forward]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(buttons, area);
}
