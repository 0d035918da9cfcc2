//! Non-interactive submission: fill the form from an answers file, walk the
//! wizard forwards through validation, then run the submission pipeline.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::attachments::{Attachment, AttachmentError, AttachmentLimits};
use crate::form::{FieldType, FormError, FormPayload, StepRegistry, ValidityReport};
use crate::submission::{SubmissionEvent, SubmissionPipeline, SubmissionResult, SubmitPhase};
use crate::wizard::{Transition, WizardController};

#[derive(Error, Debug)]
pub enum HeadlessError {
    #[error("Cannot read answers file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid answers file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown field '{0}' in answers")]
    UnknownField(String),

    #[error("Field '{name}' has no option '{value}'")]
    UnknownOption { name: String, value: String },

    #[error("Field '{name}' expects {expected}")]
    WrongType {
        name: String,
        expected: &'static str,
    },

    #[error("Step {step} ({title}) rejected: {field}: {message}")]
    Invalid {
        step: usize,
        title: String,
        field: String,
        message: String,
    },

    #[error("No file input named '{0}'")]
    NoFileInput(String),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Form(#[from] FormError),
}

/// Field values keyed by field name.
///
/// Strings fill text inputs, selects and radio groups (by option), booleans
/// set checkboxes, numbers fill text inputs.
#[derive(Debug, Clone, Default)]
pub struct Answers {
    values: toml::Table,
}

impl Answers {
    pub fn from_toml(source: &str) -> Result<Self, HeadlessError> {
        Ok(Self {
            values: toml::from_str(source)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self, HeadlessError> {
        let source = std::fs::read_to_string(path).map_err(|source| HeadlessError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn as_text(name: &str, value: &toml::Value) -> Result<String, HeadlessError> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Datetime(d) => Ok(d.to_string()),
        _ => Err(HeadlessError::WrongType {
            name: name.to_string(),
            expected: "a string",
        }),
    }
}

/// Write every answer into its field, as if typed by the applicant
pub fn fill(registry: &mut StepRegistry, answers: &Answers) -> Result<(), HeadlessError> {
    for (name, value) in &answers.values {
        let (step_index, field_index) = registry
            .find(name)
            .ok_or_else(|| HeadlessError::UnknownField(name.clone()))?;
        let Some(step) = registry.get_mut(step_index) else {
            return Err(HeadlessError::UnknownField(name.clone()));
        };
        let field_type = step
            .field(field_index)
            .map(|f| f.field_type())
            .ok_or_else(|| HeadlessError::UnknownField(name.clone()))?;

        match field_type {
            FieldType::Radio => {
                let choice = as_text(name, value)?;
                let member = step
                    .radio_members(name)
                    .into_iter()
                    .find(|&i| step.field(i).and_then(|f| f.submit_value()) == Some(choice.as_str()))
                    .ok_or_else(|| HeadlessError::UnknownOption {
                        name: name.clone(),
                        value: choice.clone(),
                    })?;
                step.check_radio(member);
            }
            FieldType::Checkbox => {
                let checked = value.as_bool().ok_or_else(|| HeadlessError::WrongType {
                    name: name.clone(),
                    expected: "true or false",
                })?;
                if let Some(field) = step.field_mut(field_index) {
                    field.set_checked(checked);
                }
            }
            FieldType::Select => {
                let choice = as_text(name, value)?;
                let Some(field) = step.field_mut(field_index) else {
                    continue;
                };
                let option = field
                    .options()
                    .iter()
                    .position(|o| *o == choice)
                    .ok_or_else(|| HeadlessError::UnknownOption {
                        name: name.clone(),
                        value: choice.clone(),
                    })?;
                field.select_option(option);
            }
            FieldType::File => {
                return Err(HeadlessError::WrongType {
                    name: name.clone(),
                    expected: "files passed with --attach",
                });
            }
            _ => {
                let text = as_text(name, value)?;
                if let Some(field) = step.field_mut(field_index) {
                    field.set_text(text);
                }
            }
        }
    }
    Ok(())
}

/// Select files on the named file input, enforcing `limits`.
///
/// Returns the number of files selected.
pub fn attach(
    registry: &mut StepRegistry,
    file_field: &str,
    paths: &[PathBuf],
    limits: &AttachmentLimits,
) -> Result<usize, HeadlessError> {
    let files = paths
        .iter()
        .map(|p| Attachment::from_path(p))
        .collect::<Result<Vec<_>, _>>()?;
    let count = files.len();

    let field = registry
        .find(file_field)
        .and_then(|(s, f)| registry.get_mut(s).and_then(|step| step.field_mut(f)))
        .filter(|field| field.field_type() == FieldType::File)
        .ok_or_else(|| HeadlessError::NoFileInput(file_field.to_string()))?;
    field.select_files(files, limits)?;
    Ok(count)
}

/// Advance through every step and validate the last one.
///
/// Stops at the first rejection, reporting the step and field.
pub fn walk(controller: &mut WizardController) -> Result<(), HeadlessError> {
    loop {
        let mut reports: Vec<ValidityReport> = Vec::new();
        let step = controller.current_index();
        let passed = match controller.advance(&mut reports) {
            Transition::Advanced { .. } => continue,
            Transition::Unchanged => controller.validate_current(&mut reports),
            _ => false,
        };
        if passed {
            return Ok(());
        }

        let title = controller
            .current_step()
            .map(|s| s.title().to_string())
            .unwrap_or_default();
        let report = reports.into_iter().next();
        return Err(HeadlessError::Invalid {
            step: step + 1,
            title,
            field: report.as_ref().map(|r| r.field_name.clone()).unwrap_or_default(),
            message: report.map(|r| r.message).unwrap_or_default(),
        });
    }
}

/// Validate the filled form and submit it, reporting each phase.
pub async fn submit(
    controller: &mut WizardController,
    pipeline: &SubmissionPipeline,
    mut on_phase: impl FnMut(SubmitPhase),
) -> Result<SubmissionResult, HeadlessError> {
    walk(controller)?;

    let payload = FormPayload::from_registry(controller.registry());
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Phases are reported as they start, while the pipeline is still running
    let report = async {
        while let Some(event) = rx.recv().await {
            match event {
                SubmissionEvent::Phase(phase) => on_phase(phase),
                SubmissionEvent::Finished(_) => break,
            }
        }
    };
    let (result, ()) = tokio::join!(pipeline.run(payload, &tx), report);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormSchema;
    use crate::submission::MockBackend;
    use crate::api::ApiError;
    use crate::upload::{MockUploadService, UploadService, UploadStager};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    const FORM: &str = r#"
title = "Test"

[[steps]]
title = "Contact"

[[steps.fields]]
name = "name"
type = "text"
required = true

[[steps.fields]]
name = "years"
type = "number"
min = 0

[[steps]]
title = "Role"

[[steps.fields]]
name = "position"
type = "select"
options = ["Cook", "Server"]
required = true

[[steps.fields]]
name = "shift"
type = "radio"
required = true
options = ["Day", "Night"]

[[steps]]
title = "Finish"

[[steps.fields]]
name = "attachment[]"
type = "file"

[[steps.fields]]
name = "consent"
type = "checkbox"
required = true
value = "Yes"
"#;

    fn controller() -> WizardController {
        let schema = FormSchema::from_toml(FORM).unwrap();
        WizardController::new(StepRegistry::from_schema(&schema).unwrap())
    }

    const COMPLETE: &str = r#"
name = "Ada"
years = 4
position = "Server"
shift = "Night"
consent = true
"#;

    #[test]
    fn test_fill_and_walk() {
        let mut controller = controller();
        fill(controller.registry_mut(), &Answers::from_toml(COMPLETE).unwrap()).unwrap();
        walk(&mut controller).unwrap();
        assert_eq!(controller.current_index(), 2);

        let payload = FormPayload::from_registry(controller.registry());
        assert_eq!(payload.text("years"), Some("4"));
        assert_eq!(payload.text("shift"), Some("Night"));
        assert_eq!(payload.text("consent"), Some("Yes"));
    }

    #[test]
    fn test_walk_reports_unanswered_radio() {
        let mut controller = controller();
        let answers = Answers::from_toml("name = \"Ada\"\nposition = \"Cook\"\n").unwrap();
        fill(controller.registry_mut(), &answers).unwrap();

        let err = walk(&mut controller).unwrap_err();
        match err {
            HeadlessError::Invalid {
                step,
                field,
                message,
                ..
            } => {
                assert_eq!(step, 2);
                assert_eq!(field, "shift");
                assert_eq!(message, "Please select an option.");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(controller.current_index(), 1);
    }

    #[test]
    fn test_walk_validates_last_step() {
        let mut controller = controller();
        let answers = Answers::from_toml(
            "name = \"Ada\"\nposition = \"Cook\"\nshift = \"Day\"\n",
        )
        .unwrap();
        fill(controller.registry_mut(), &answers).unwrap();
        let err = walk(&mut controller).unwrap_err();
        assert!(matches!(err, HeadlessError::Invalid { step: 3, .. }));
    }

    #[test]
    fn test_fill_rejects_bad_answers() {
        let mut controller = controller();
        let unknown = Answers::from_toml("nickname = \"A\"").unwrap();
        assert!(matches!(
            fill(controller.registry_mut(), &unknown),
            Err(HeadlessError::UnknownField(_))
        ));

        let bad_option = Answers::from_toml("shift = \"Evening\"").unwrap();
        assert!(matches!(
            fill(controller.registry_mut(), &bad_option),
            Err(HeadlessError::UnknownOption { .. })
        ));

        let bad_type = Answers::from_toml("consent = \"yes\"").unwrap();
        assert!(matches!(
            fill(controller.registry_mut(), &bad_type),
            Err(HeadlessError::WrongType { .. })
        ));
    }

    #[test]
    fn test_attach_enforces_limits() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..3)
            .map(|i| {
                let path = dir.path().join(format!("f{}.txt", i));
                std::fs::write(&path, b"data").unwrap();
                path
            })
            .collect();
        let mut controller = controller();
        let limits = AttachmentLimits {
            max_files: 2,
            max_total_bytes: None,
        };

        let err = attach(controller.registry_mut(), "attachment[]", &paths, &limits).unwrap_err();
        assert!(matches!(
            err,
            HeadlessError::Attachment(AttachmentError::TooManyFiles { max: 2 })
        ));
        assert_eq!(
            attach(controller.registry_mut(), "attachment[]", &paths[..2], &limits).unwrap(),
            2
        );
        assert!(matches!(
            attach(controller.registry_mut(), "name", &paths[..1], &limits),
            Err(HeadlessError::NoFileInput(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_reports_phases() {
        let backend = MockBackend::new();
        let pipeline = SubmissionPipeline::new(
            Arc::new(backend.clone()),
            Some(UploadStager::new(Arc::new(MockUploadService::new()))),
            "attachment[]",
            "Attached Documents",
        );
        let mut controller = controller();
        fill(controller.registry_mut(), &Answers::from_toml(COMPLETE).unwrap()).unwrap();

        let mut phases = Vec::new();
        let result = submit(&mut controller, &pipeline, |p| phases.push(p))
            .await
            .unwrap();

        assert_eq!(result, SubmissionResult::Success);
        assert_eq!(phases, vec![SubmitPhase::Uploading, SubmitPhase::Submitting]);
        assert_eq!(backend.last_payload().unwrap().text("name"), Some("Ada"));
    }

    /// Upload service that suspends once per file before finishing it
    struct YieldingUploads {
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl UploadService for YieldingUploads {
        fn name(&self) -> &str {
            "yielding-upload"
        }

        async fn upload(&self, file: &Attachment) -> Result<String, ApiError> {
            tokio::task::yield_now().await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://files.example.com/{}", file.name))
        }
    }

    #[tokio::test]
    async fn test_submit_reports_uploading_before_uploads_finish() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resume.pdf");
        std::fs::write(&path, b"pdf").unwrap();

        let finished = Arc::new(AtomicUsize::new(0));
        let pipeline = SubmissionPipeline::new(
            Arc::new(MockBackend::new()),
            Some(UploadStager::new(Arc::new(YieldingUploads {
                finished: Arc::clone(&finished),
            }))),
            "attachment[]",
            "Attached Documents",
        );
        let mut controller = controller();
        fill(controller.registry_mut(), &Answers::from_toml(COMPLETE).unwrap()).unwrap();
        attach(
            controller.registry_mut(),
            "attachment[]",
            &[path],
            &AttachmentLimits::default(),
        )
        .unwrap();

        let mut seen = Vec::new();
        let result = submit(&mut controller, &pipeline, |phase| {
            seen.push((phase, finished.load(Ordering::SeqCst)));
        })
        .await
        .unwrap();

        assert_eq!(result, SubmissionResult::Success);
        assert_eq!(
            seen,
            vec![(SubmitPhase::Uploading, 0), (SubmitPhase::Submitting, 1)]
        );
    }
}
