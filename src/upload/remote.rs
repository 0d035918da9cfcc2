//! Unsigned multipart uploads to a Cloudinary-style endpoint

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::UploadService;
use crate::api::error::ApiError;
use crate::attachments::Attachment;
use crate::config::UploadsConfig;

const SERVICE_NAME: &str = "upload";

/// Upload service reached over HTTP with a pre-shared upload preset
pub struct RemoteUploadService {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

#[derive(Deserialize)]
struct UploadSuccess {
    secure_url: Option<String>,
}

#[derive(Deserialize)]
struct UploadFailure {
    error: Option<UploadFailureDetail>,
}

#[derive(Deserialize)]
struct UploadFailureDetail {
    message: Option<String>,
}

impl RemoteUploadService {
    pub fn new(upload_url: impl Into<String>, upload_preset: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hireform/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::network(SERVICE_NAME, e.to_string()))?;

        Ok(Self {
            client,
            upload_url: upload_url.into(),
            upload_preset: upload_preset.into(),
        })
    }

    /// Build from config, refusing to start without an account and preset
    pub fn from_config(uploads: &UploadsConfig) -> Result<Self, ApiError> {
        let missing: Vec<&str> = [
            ("uploads.account_id", &uploads.account_id),
            ("uploads.upload_preset", &uploads.upload_preset),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect();
        if !missing.is_empty() {
            return Err(ApiError::not_configured(
                SERVICE_NAME,
                format!(
                    "set {} or disable staging with uploads.enabled = false",
                    missing.join(" and ")
                ),
            ));
        }
        Self::new(uploads.upload_url(), uploads.upload_preset.clone())
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }
}

/// Pull `secure_url` out of a success body
pub fn parse_upload_success(body: &str) -> Result<String, ApiError> {
    let parsed: UploadSuccess = serde_json::from_str(body)
        .map_err(|e| ApiError::invalid_response(SERVICE_NAME, e.to_string()))?;
    parsed
        .secure_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::invalid_response(SERVICE_NAME, "response has no secure_url"))
}

/// Build the error for a non-success response, preferring `error.message`
pub fn parse_upload_error(status: u16, body: &str) -> ApiError {
    let detail = serde_json::from_str::<UploadFailure>(body)
        .ok()
        .and_then(|f| f.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("HTTP {}", status));
    ApiError::http(SERVICE_NAME, status, format!("File upload failed: {}", detail))
}

#[async_trait]
impl UploadService for RemoteUploadService {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    async fn upload(&self, file: &Attachment) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(&file.path).await.map_err(|e| {
            ApiError::io(
                SERVICE_NAME,
                format!("File upload failed: cannot read {}: {}", file.name, e),
            )
        })?;

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file.name.clone()))
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::network(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(parse_upload_error(status.as_u16(), &body));
        }
        parse_upload_success(&body)
    }
}
