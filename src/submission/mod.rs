//! Submission pipeline: stage attachments, rewrite the payload, post it.
//!
//! The pipeline reports progress as [`SubmissionEvent`]s so the caller can
//! keep redrawing while uploads run. [`SubmissionUi`] folds those events into
//! the visible state of the submit control, the form and the success panel.

mod backend;
mod ui;

pub use backend::{parse_backend_error, BackendClient, HttpBackend, MockBackend};
pub use ui::{SubmissionUi, SubmitControl};

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::error::{ApiError, GENERIC_SUBMISSION_MESSAGE};
use crate::config::Config;
use crate::form::FormPayload;
use crate::upload::{RemoteUploadService, UploadStager};

pub const UPLOADING_LABEL: &str = "Uploading files...";
pub const SUBMITTING_LABEL: &str = "Submitting form...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Uploading,
    Submitting,
}

impl SubmitPhase {
    /// Submit control label while this phase runs
    pub fn label(self) -> &'static str {
        match self {
            SubmitPhase::Uploading => UPLOADING_LABEL,
            SubmitPhase::Submitting => SUBMITTING_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Success,
    /// Reason shown to the applicant
    Failure(String),
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    Phase(SubmitPhase),
    Finished(SubmissionResult),
}

pub struct SubmissionPipeline {
    backend: Arc<dyn BackendClient>,
    /// None posts raw files to the backend
    stager: Option<UploadStager>,
    file_field: String,
    reference_field: String,
}

impl SubmissionPipeline {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        stager: Option<UploadStager>,
        file_field: impl Into<String>,
        reference_field: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            stager,
            file_field: file_field.into(),
            reference_field: reference_field.into(),
        }
    }

    /// HTTP backend plus, when enabled, the remote upload service
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let backend = Arc::new(HttpBackend::new(&config.backend)?);
        let stager = if config.uploads.enabled {
            let service = RemoteUploadService::from_config(&config.uploads)?;
            Some(UploadStager::new(Arc::new(service)))
        } else {
            None
        };
        Ok(Self::new(
            backend,
            stager,
            config.uploads.file_field.clone(),
            config.uploads.reference_field.clone(),
        ))
    }

    pub fn stages_uploads(&self) -> bool {
        self.stager.is_some()
    }

    pub fn first_phase(&self) -> SubmitPhase {
        if self.stages_uploads() {
            SubmitPhase::Uploading
        } else {
            SubmitPhase::Submitting
        }
    }

    /// Run one attempt. The final event sent is always `Finished`.
    pub async fn run(
        &self,
        payload: FormPayload,
        events: &UnboundedSender<SubmissionEvent>,
    ) -> SubmissionResult {
        let submission_id = Uuid::new_v4();
        let span = tracing::info_span!("submission", id = %submission_id);

        let result = async {
            match self.execute(payload, events).await {
                Ok(()) => {
                    tracing::info!("Application submitted");
                    SubmissionResult::Success
                }
                Err(err) => {
                    tracing::error!(error = %err, "Submission failed");
                    let reason = err.user_message().trim();
                    let reason = if reason.is_empty() {
                        GENERIC_SUBMISSION_MESSAGE
                    } else {
                        reason
                    };
                    SubmissionResult::Failure(reason.to_string())
                }
            }
        }
        .instrument(span)
        .await;

        // The receiver may be gone if the screen closed mid-flight
        let _ = events.send(SubmissionEvent::Finished(result.clone()));
        result
    }

    async fn execute(
        &self,
        mut payload: FormPayload,
        events: &UnboundedSender<SubmissionEvent>,
    ) -> Result<(), ApiError> {
        if let Some(stager) = &self.stager {
            let _ = events.send(SubmissionEvent::Phase(SubmitPhase::Uploading));
            let files = payload.files(&self.file_field);
            let references = stager.stage(&files).await?;

            payload.remove(&self.file_field);
            if !references.is_empty() {
                let joined = references
                    .iter()
                    .map(|r| r.url.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                payload.push_text(&self.reference_field, joined);
            }
        }

        let _ = events.send(SubmissionEvent::Phase(SubmitPhase::Submitting));
        tracing::debug!(entries = payload.len(), "Posting application");
        self.backend.submit(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::Attachment;
    use crate::upload::MockUploadService;
    use tokio::sync::mpsc;

    fn payload_with_files(names: &[&str]) -> FormPayload {
        let mut payload = FormPayload::default();
        payload.push_text("full_name", "Ada Lovelace");
        for name in names {
            payload.push_file("attachment[]", Attachment::new(format!("/tmp/{}", name), 100));
        }
        payload
    }

    fn pipeline(backend: &MockBackend, uploads: Option<&MockUploadService>) -> SubmissionPipeline {
        SubmissionPipeline::new(
            Arc::new(backend.clone()),
            uploads.map(|u| UploadStager::new(Arc::new(u.clone()))),
            "attachment[]",
            "Attached Documents",
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SubmissionEvent>) -> Vec<SubmissionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_no_attachments_posts_without_reference_field() {
        let backend = MockBackend::new();
        let uploads = MockUploadService::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = pipeline(&backend, Some(&uploads))
            .run(payload_with_files(&[]), &tx)
            .await;

        assert_eq!(result, SubmissionResult::Success);
        assert_eq!(uploads.call_count(), 0);
        let sent = backend.last_payload().unwrap();
        assert!(!sent.contains("Attached Documents"));
        assert!(!sent.contains("attachment[]"));
        assert_eq!(
            drain(&mut rx),
            vec![
                SubmissionEvent::Phase(SubmitPhase::Uploading),
                SubmissionEvent::Phase(SubmitPhase::Submitting),
                SubmissionEvent::Finished(SubmissionResult::Success),
            ]
        );
    }

    #[tokio::test]
    async fn test_staged_urls_replace_raw_files() {
        let backend = MockBackend::rejecting(500, r#"{"ok":false}"#);
        let uploads = MockUploadService::new();
        uploads.push_response(Ok("https://res.example.com/u1".to_string()));
        uploads.push_response(Ok("https://res.example.com/u2".to_string()));
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = pipeline(&backend, Some(&uploads))
            .run(payload_with_files(&["cv.pdf", "letter.pdf"]), &tx)
            .await;

        assert_eq!(
            result,
            SubmissionResult::Failure("Submission failed".to_string())
        );
        assert_eq!(uploads.call_count(), 2);
        let sent = backend.last_payload().unwrap();
        assert!(sent.files("attachment[]").is_empty());
        assert!(!sent.contains("attachment[]"));
        assert_eq!(
            sent.text("Attached Documents"),
            Some("https://res.example.com/u1\nhttps://res.example.com/u2")
        );
        assert_eq!(sent.text("full_name"), Some("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_upload_failure_skips_backend() {
        let backend = MockBackend::new();
        let uploads = MockUploadService::new();
        uploads.push_response(Err(ApiError::http(
            "upload",
            400,
            "File upload failed: Invalid image file",
        )));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = pipeline(&backend, Some(&uploads))
            .run(payload_with_files(&["a.pdf", "b.pdf", "c.pdf"]), &tx)
            .await;

        assert_eq!(
            result,
            SubmissionResult::Failure("File upload failed: Invalid image file".to_string())
        );
        assert_eq!(uploads.call_count(), 1);
        assert_eq!(backend.call_count(), 0);
        let events = drain(&mut rx);
        assert!(!events.contains(&SubmissionEvent::Phase(SubmitPhase::Submitting)));
    }

    #[tokio::test]
    async fn test_without_staging_raw_files_are_posted() {
        let backend = MockBackend::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pipeline = pipeline(&backend, None);
        assert_eq!(pipeline.first_phase(), SubmitPhase::Submitting);

        let result = pipeline.run(payload_with_files(&["cv.pdf"]), &tx).await;

        assert!(result.is_success());
        let sent = backend.last_payload().unwrap();
        assert_eq!(sent.files("attachment[]").len(), 1);
        assert!(!sent.contains("Attached Documents"));
        assert_eq!(
            drain(&mut rx),
            vec![
                SubmissionEvent::Phase(SubmitPhase::Submitting),
                SubmissionEvent::Finished(SubmissionResult::Success),
            ]
        );
    }

    #[tokio::test]
    async fn test_backend_message_becomes_reason() {
        let backend = MockBackend::rejecting(422, r#"{"message":"Email already applied"}"#);
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = pipeline(&backend, None).run(payload_with_files(&[]), &tx).await;
        assert_eq!(
            result,
            SubmissionResult::Failure("Email already applied".to_string())
        );
    }

    #[tokio::test]
    async fn test_events_drive_submission_ui() {
        let backend = MockBackend::rejecting(500, "oops");
        let uploads = MockUploadService::new();
        let pipeline = pipeline(&backend, Some(&uploads));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ui = SubmissionUi::new("Submit Application", "Apply", "Done.");

        assert!(ui.begin(pipeline.first_phase()));
        assert_eq!(ui.submit.label, "Uploading files...");
        pipeline.run(payload_with_files(&["cv.pdf"]), &tx).await;
        for event in drain(&mut rx) {
            ui.apply(&event);
        }

        assert!(ui.submit.enabled);
        assert_eq!(ui.submit.label, "Submit Application");
        assert_eq!(ui.alert.as_deref(), Some("Oops! Submission failed"));
        assert!(ui.form_visible);
    }

    #[test]
    fn test_from_config_rejects_staging_without_credentials() {
        let err = SubmissionPipeline::from_config(&Config::default())
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::NotConfigured { .. }));

        let mut config = Config::default();
        config.uploads.enabled = false;
        let pipeline = SubmissionPipeline::from_config(&config).unwrap();
        assert!(!pipeline.stages_uploads());
        assert_eq!(pipeline.first_phase(), SubmitPhase::Submitting);

        config.uploads.enabled = true;
        config.uploads.account_id = "acme".to_string();
        config.uploads.upload_preset = "unsigned".to_string();
        assert!(SubmissionPipeline::from_config(&config).unwrap().stages_uploads());
    }
}
