//! Error types shared by the RIR workspace

use thiserror::Error;

/// Result type alias for RIR operations
pub type Result<T> = std::result::Result<T, RirError>;

/// Main error type for parsing and validating registry data
#[derive(Error, Debug)]
pub enum RirError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid date '{value}': expected YYYYMMDD or YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Invalid {field} '{value}' in {registry} {line}")]
    InvalidField {
        registry: String,
        line: String,
        field: &'static str,
        value: String,
    },

    #[error("Missing {field} in {registry} {line}")]
    MissingField {
        registry: String,
        line: String,
        field: &'static str,
    },

    #[error("Unexpected field count in {registry} {line}: expected {expected}, got {actual}")]
    FieldCount {
        registry: String,
        line: String,
        expected: String,
        actual: usize,
    },

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl RirError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
