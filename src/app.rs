use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::attachments::Attachment;
use crate::config::Config;
use crate::form::{FormPayload, FormSchema, StepRegistry};
use crate::submission::{
    SubmissionEvent, SubmissionPipeline, SubmissionResult, SubmissionUi,
};
use crate::ui::keybindings::action_for;
use crate::ui::{
    install_panic_hook, Action, AlertDialog, EditOutcome, HelpDialog, TerminalGuard,
    WizardScreen,
};
use crate::wizard::{Transition, WizardController};

pub struct App {
    config: Config,
    controller: WizardController,
    screen: WizardScreen,
    submission: SubmissionUi,
    help_dialog: HelpDialog,
    pipeline: Arc<SubmissionPipeline>,
    events_tx: UnboundedSender<SubmissionEvent>,
    events_rx: UnboundedReceiver<SubmissionEvent>,
    /// Submission task still running, if any
    in_flight: Option<JoinHandle<SubmissionResult>>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, schema: &FormSchema, pipeline: SubmissionPipeline) -> Result<Self> {
        let registry = StepRegistry::from_schema(schema).context("Invalid form definition")?;
        let controller = WizardController::new(registry);
        let screen = WizardScreen::new(schema, &controller);
        let submission = SubmissionUi::new(
            config.ui.submit_label.clone(),
            schema.description.clone(),
            schema.completion_message.clone(),
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        tracing::info!(
            form = %schema.title,
            steps = controller.registry().len(),
            staging = pipeline.stages_uploads(),
            "Form loaded"
        );

        Ok(Self {
            config,
            controller,
            screen,
            submission,
            help_dialog: HelpDialog::new(),
            pipeline: Arc::new(pipeline),
            events_tx,
            events_rx,
            in_flight: None,
            should_quit: false,
        })
    }

    /// Load the configured form and wire the HTTP pipeline
    pub fn from_config(config: Config) -> Result<Self> {
        let schema = FormSchema::load_or_embedded(config.form.definition.as_deref())
            .context("Failed to load form definition")?;
        let pipeline =
            SubmissionPipeline::from_config(&config).context("Failed to set up submission")?;
        Self::new(config, &schema, pipeline)
    }

    pub async fn run(&mut self) -> Result<()> {
        install_panic_hook();
        let (_guard, mut terminal) = TerminalGuard::enter()?;

        let tick_rate = Duration::from_millis(self.config.ui.tick_rate_ms);

        while !self.should_quit {
            terminal.draw(|f| {
                self.screen.render(f, &mut self.controller, &self.submission);
                if let Some(message) = &self.submission.alert {
                    AlertDialog::new(message).render(f);
                }
                self.help_dialog.render(f);
            })?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            self.drain_events();
        }

        terminal.show_cursor()?;
        Ok(())
    }

    pub fn controller(&self) -> &WizardController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut WizardController {
        &mut self.controller
    }

    pub fn submission(&self) -> &SubmissionUi {
        &self.submission
    }

    pub fn screen(&self) -> &WizardScreen {
        &self.screen
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.submission.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.submission.dismiss_alert();
            }
            return;
        }

        if self.help_dialog.visible {
            self.help_dialog.toggle();
            return;
        }

        // Only quitting and help remain once the application is accepted
        if self.submission.is_complete() {
            if let Some(action @ (Action::Quit | Action::ToggleHelp)) = action_for(&key) {
                self.perform(action);
            }
            return;
        }

        // Up/Down belong to lists and text areas before focus movement
        let editor_first = matches!(key.code, KeyCode::Up | KeyCode::Down);
        if !editor_first {
            if let Some(action) = action_for(&key) {
                self.perform(action);
                return;
            }
        }

        match self.edit_focused(key) {
            EditOutcome::Ignored => {
                if let Some(action) = action_for(&key) {
                    self.perform(action);
                }
            }
            EditOutcome::Changed => self.screen.clear_validity(),
            EditOutcome::CheckRadio => {
                let focus = self.screen.focus;
                if let Some(step) = self.controller.current_step_mut() {
                    step.check_radio(focus);
                }
                self.screen.clear_validity();
            }
            EditOutcome::SelectFiles(list) => self.select_files(&list),
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::NextStep => self.next_step(),
            Action::PreviousStep => {
                if self.controller.retreat().moved() {
                    self.screen.reset_focus();
                }
            }
            Action::Submit => self.submit(),
            Action::NextField => {
                let count = self
                    .controller
                    .current_step()
                    .map(|s| s.fields().len())
                    .unwrap_or(0);
                self.screen.focus_next(count);
            }
            Action::PreviousField => self.screen.focus_prev(),
            Action::ToggleHelp => self.help_dialog.toggle(),
            Action::Quit => {
                // A started submission runs to its outcome
                if self.submission.in_flight() {
                    tracing::debug!("Quit ignored while a submission is in flight");
                } else {
                    self.should_quit = true;
                }
            }
        }
    }

    fn edit_focused(&mut self, key: KeyEvent) -> EditOutcome {
        let step_index = self.controller.current_index();
        let focus = self.screen.focus;
        let Some(field) = self
            .controller
            .current_step_mut()
            .and_then(|step| step.field_mut(focus))
        else {
            return EditOutcome::Ignored;
        };
        let Some(editor) = self.screen.editor_mut(step_index, focus) else {
            return EditOutcome::Ignored;
        };
        editor.handle_key(field, key)
    }

    fn next_step(&mut self) {
        match self.controller.advance(&mut self.screen) {
            Transition::Advanced { .. } => self.screen.reset_focus(),
            Transition::Blocked { focus: Some(focus) } => self.screen.focus = focus,
            _ => {}
        }
    }

    /// Apply a typed path list to the focused file input, enforcing limits
    fn select_files(&mut self, list: &str) {
        let step_index = self.controller.current_index();
        let focus = self.screen.focus;
        let limits = self.config.uploads.limits();

        let Some(field) = self
            .controller
            .current_step_mut()
            .and_then(|step| step.field_mut(focus))
        else {
            return;
        };
        // Each pick replaces the selection, an unreadable path leaves it empty
        let result = Attachment::from_path_list(list).and_then(|files| {
            let count = files.len();
            field.select_files(files, &limits).map(|()| count)
        });
        if result.is_err() {
            field.clear_files();
        }

        self.screen.clear_file_buffer(step_index, focus);
        self.screen.clear_validity();
        match result {
            Ok(count) => tracing::info!(count, "Attachments selected"),
            Err(err) => {
                tracing::warn!(error = %err, "Attachment selection rejected");
                self.submission.show_alert(err.to_string());
            }
        }
    }

    fn submit(&mut self) {
        if !self.controller.render().submit_visible {
            return;
        }
        // The reporter moves focus to the offending field
        if !self.controller.validate_current(&mut self.screen) {
            return;
        }
        if !self.submission.begin(self.pipeline.first_phase()) {
            return;
        }

        let payload = FormPayload::from_registry(self.controller.registry());
        tracing::info!(entries = payload.len(), "Submitting application");

        let pipeline = Arc::clone(&self.pipeline);
        let events = self.events_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            pipeline.run(payload, &events).await
        }));
    }

    /// Fold pending submission events into the view state
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            if event == SubmissionEvent::Finished(SubmissionResult::Success) {
                self.controller.reset_viewport();
            }
            if matches!(event, SubmissionEvent::Finished(_)) {
                self.in_flight = None;
            }
            self.submission.apply(&event);
        }
    }

    /// Wait for a running submission to finish, then apply its events
    pub async fn settle(&mut self) -> Option<SubmissionResult> {
        let handle = self.in_flight.take()?;
        let result = handle.await.ok();
        self.drain_events();
        result
    }
}
