//! Form model: definitions, runtime fields, steps, validation and payloads

use std::path::PathBuf;
use thiserror::Error;

pub mod field;
pub mod payload;
pub mod registry;
pub mod schema;
pub mod validator;

pub use field::{Field, FieldValue, ValidityIssue};
pub use payload::{FormPayload, PayloadValue};
pub use registry::{Step, StepRegistry};
pub use schema::{FieldSchema, FieldType, FormSchema, StepSchema};
pub use validator::{ValidityReport, ValidityReporter, Validator, SELECT_OPTION_MESSAGE};

/// Errors loading or building a form definition
#[derive(Error, Debug)]
pub enum FormError {
    #[error("failed to read form definition {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid form definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("form definition has no steps")]
    NoSteps,

    #[error("field '{0}' needs at least one option")]
    MissingOptions(String),

    #[error("field '{name}' has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}
