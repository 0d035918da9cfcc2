//! The form-receiving backend

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::api::error::{ApiError, GENERIC_SUBMISSION_MESSAGE};
use crate::config::BackendConfig;
use crate::form::{FormPayload, PayloadValue};

const SERVICE_NAME: &str = "backend";

/// Receiver of assembled applications
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn submit(&self, payload: &FormPayload) -> Result<(), ApiError>;
}

/// Posts the payload as `multipart/form-data`, asking for a JSON answer
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::network(SERVICE_NAME, e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn multipart(payload: &FormPayload) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for (name, value) in payload.entries() {
            form = match value {
                PayloadValue::Text(text) => form.text(name.clone(), text.clone()),
                PayloadValue::File(file) => {
                    let bytes = tokio::fs::read(&file.path).await.map_err(|e| {
                        ApiError::io(
                            SERVICE_NAME,
                            format!("Cannot read attachment {}: {}", file.name, e),
                        )
                    })?;
                    form.part(name.clone(), Part::bytes(bytes).file_name(file.name.clone()))
                }
            };
        }
        Ok(form)
    }
}

/// Message from a rejection body `{"message": "..."}`, or the generic fallback
pub fn parse_backend_error(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_SUBMISSION_MESSAGE.to_string())
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn submit(&self, payload: &FormPayload) -> Result<(), ApiError> {
        let form = Self::multipart(payload).await?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::network(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::http(
            SERVICE_NAME,
            status.as_u16(),
            parse_backend_error(&body),
        ))
    }
}

/// Mock implementation for testing
#[derive(Default, Clone)]
pub struct MockBackend {
    /// Scripted outcomes, consumed in order; an empty script accepts
    responses: Arc<Mutex<VecDeque<Result<(), ApiError>>>>,
    /// Every payload received, in call order
    pub received: Arc<Mutex<Vec<FormPayload>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend answering like a failing server: HTTP `status` with `body`
    pub fn rejecting(status: u16, body: &str) -> Self {
        let backend = Self::new();
        backend.push_response(Err(ApiError::http(
            SERVICE_NAME,
            status,
            parse_backend_error(body),
        )));
        backend
    }

    pub fn push_response(&self, response: Result<(), ApiError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn last_payload(&self) -> Option<FormPayload> {
        self.received.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn submit(&self, payload: &FormPayload) -> Result<(), ApiError> {
        self.received.lock().unwrap().push(payload.clone());
        self.responses.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
