//! Attachment staging on the external upload service.
//!
//! Files are sent one at a time, in selection order. The first failure
//! abandons the remaining files; files already uploaded stay on the service.

mod remote;

pub use remote::{parse_upload_error, parse_upload_success, RemoteUploadService};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::api::error::ApiError;
use crate::attachments::Attachment;

/// A staged file: where it can be retrieved and where it sat in the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedReference {
    pub position: usize,
    pub url: String,
}

/// Something that turns one file into a retrievable URL
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Service name used in errors and logs
    fn name(&self) -> &str;

    async fn upload(&self, file: &Attachment) -> Result<String, ApiError>;
}

/// Sequentially stages a selection through an [`UploadService`]
#[derive(Clone)]
pub struct UploadStager {
    service: Arc<dyn UploadService>,
}

impl UploadStager {
    pub fn new(service: Arc<dyn UploadService>) -> Self {
        Self { service }
    }

    pub async fn stage(&self, files: &[Attachment]) -> Result<Vec<UploadedReference>, ApiError> {
        let mut references = Vec::with_capacity(files.len());
        for (position, file) in files.iter().enumerate() {
            let url = self.service.upload(file).await.inspect_err(|err| {
                tracing::warn!(
                    service = self.service.name(),
                    file = %file.name,
                    position,
                    error = %err,
                    "Upload failed, abandoning remaining files"
                );
            })?;
            tracing::info!(file = %file.name, position, "Attachment staged");
            references.push(UploadedReference { position, url });
        }
        Ok(references)
    }
}

/// Mock implementation for testing
#[derive(Default, Clone)]
pub struct MockUploadService {
    /// Scripted outcomes, consumed in order; an empty script succeeds
    responses: Arc<Mutex<VecDeque<Result<String, ApiError>>>>,
    /// Names of files the service was asked to upload, in call order
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockUploadService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next upload
    pub fn push_response(&self, response: Result<String, ApiError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl UploadService for MockUploadService {
    fn name(&self) -> &str {
        "mock-upload"
    }

    async fn upload(&self, file: &Attachment) -> Result<String, ApiError> {
        self.calls.lock().unwrap().push(file.name.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("https://files.example.com/{}", file.name)))
    }
}
