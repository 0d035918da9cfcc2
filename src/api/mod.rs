//! Shared types for the external services the form talks to

pub mod error;

pub use error::{ApiError, GENERIC_SUBMISSION_MESSAGE};
