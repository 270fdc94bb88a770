//! Error types for header reading and writing

use thiserror::Error;

/// Result type for header operations
pub type Result<T> = std::result::Result<T, MetaError>;

/// Header engine errors
#[derive(Error, Debug)]
pub enum MetaError {
    #[error("Required field not defined: {name}")]
    MissingRequiredField { name: String },

    #[error("Invalid number in field {field}: '{token}'")]
    InvalidNumber { field: String, token: String },

    #[error("Field {field} expects {expected} values, got {actual}")]
    TokenCountMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Field {field} depends on {depends_on}, which is not defined")]
    UndefinedDependency { field: String, depends_on: String },

    #[error("Malformed header line: {0}")]
    MalformedLine(String),

    #[error("User field already exists: {0}")]
    DuplicateUserField(String),

    #[error("No file name given")]
    MissingFileName,

    #[error("Payload codec error: {0}")]
    Codec(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
