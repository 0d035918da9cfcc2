//! Errors raised while talking to the upload service or the form backend

use std::fmt;

/// Fallback shown when the backend rejects a submission without a message
pub const GENERIC_SUBMISSION_MESSAGE: &str = "Submission failed";

/// Errors that can occur when interacting with external services
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request never produced a response (DNS, TLS, connection reset, ...)
    Network { service: String, message: String },
    /// Service answered with a non-success status
    Http {
        service: String,
        status: u16,
        message: String,
    },
    /// Service answered with success but the body was not what we expected
    InvalidResponse { service: String, message: String },
    /// A staged file could not be read from disk before sending
    Io { service: String, message: String },
    /// Required settings for the service are missing
    NotConfigured { service: String, message: String },
}

impl ApiError {
    /// Create a network error for a service
    pub fn network(service: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Network {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP error for a service
    pub fn http(service: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::Http {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    /// Create an invalid-response error for a service
    pub fn invalid_response(service: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::InvalidResponse {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error for a service
    pub fn io(service: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Io {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an error for a service whose settings are incomplete
    pub fn not_configured(service: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NotConfigured {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Get the service name for this error
    pub fn service_name(&self) -> &str {
        match self {
            ApiError::Network { service, .. } => service,
            ApiError::Http { service, .. } => service,
            ApiError::InvalidResponse { service, .. } => service,
            ApiError::Io { service, .. } => service,
            ApiError::NotConfigured { service, .. } => service,
        }
    }

    /// HTTP status, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The message meant for the applicant, without service or status prefixes
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::Network { message, .. } => message,
            ApiError::Http { message, .. } => message,
            ApiError::InvalidResponse { message, .. } => message,
            ApiError::Io { message, .. } => message,
            ApiError::NotConfigured { message, .. } => message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network { service, message } => {
                write!(f, "{}: Network error - {}", service, message)
            }
            ApiError::Http {
                service,
                status,
                message,
            } => {
                write!(f, "{}: HTTP {} - {}", service, status, message)
            }
            ApiError::InvalidResponse { service, message } => {
                write!(f, "{}: Invalid response - {}", service, message)
            }
            ApiError::Io { service, message } => {
                write!(f, "{}: {}", service, message)
            }
            ApiError::NotConfigured { service, message } => {
                write!(f, "{}: Not configured - {}", service, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name() {
        assert_eq!(ApiError::network("upload", "reset").service_name(), "upload");
        assert_eq!(ApiError::http("backend", 500, "x").service_name(), "backend");
        assert_eq!(
            ApiError::invalid_response("upload", "no url").service_name(),
            "upload"
        );
    }

    #[test]
    fn test_status_only_for_http() {
        assert_eq!(ApiError::http("backend", 422, "bad").status(), Some(422));
        assert_eq!(ApiError::network("backend", "down").status(), None);
    }

    #[test]
    fn test_user_message_strips_prefixes() {
        let err = ApiError::http("backend", 500, "Form is closed");
        assert_eq!(err.user_message(), "Form is closed");
        assert_eq!(err.to_string(), "backend: HTTP 500 - Form is closed");
    }

    #[test]
    fn test_display() {
        let err = ApiError::network("upload", "connection refused");
        assert_eq!(err.to_string(), "upload: Network error - connection refused");

        let err = ApiError::invalid_response("upload", "missing secure_url");
        assert_eq!(
            err.to_string(),
            "upload: Invalid response - missing secure_url"
        );
    }
}
