//! Error types for virtualview

use std::fmt;
use thiserror::Error;

/// View error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid view or column declaration (raised at construction)
    Config,
    /// Incomparable values at the same sort position
    Comparison,
    /// Engine bug: broken tree invariant, duplicate sentinel keys
    Invariant,
    /// A value-function column failed while evaluating a row
    ValueFunction,
    /// Provider handed over data the view cannot accept
    InvalidInput,
    /// Serialization/deserialization errors (YAML, JSON)
    Serialization,
    /// I/O errors
    IO,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Comparison => "comparison",
            ErrorKind::Invariant => "invariant",
            ErrorKind::ValueFunction => "value_function",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Serialization => "serialization",
            ErrorKind::IO => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// View error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct ViewError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl ViewError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn comparison(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Comparison, message)
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invariant, message)
    }

    pub fn value_function(column: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::ValueFunction,
            format!("Value function of column '{}' failed: {}", column, message.into()),
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }
}

// YAML error conversions
impl From<serde_yaml::Error> for ViewError {
    fn from(err: serde_yaml::Error) -> Self {
        ViewError::serialization(format!("YAML error: {}", err)).with_source(err)
    }
}

// JSON error conversions
impl From<serde_json::Error> for ViewError {
    fn from(err: serde_json::Error) -> Self {
        ViewError::serialization(format!("JSON error: {}", err)).with_source(err)
    }
}

impl From<std::io::Error> for ViewError {
    fn from(err: std::io::Error) -> Self {
        ViewError::new(ErrorKind::IO, format!("I/O error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ViewError>;
