//! Error types for the myrica library.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MyricaError>;

/// Which kind of name failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Index,
    Database,
}

impl std::fmt::Display for NameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameKind::Index => write!(f, "index"),
            NameKind::Database => write!(f, "database"),
        }
    }
}

/// Unified error type for all myrica operations.
#[derive(Debug, Error)]
pub enum MyricaError {
    /// An index or database name failed validation.
    #[error("invalid {kind} name: '{name}'")]
    InvalidName { kind: NameKind, name: String },

    /// Attempt to create an index that already exists.
    #[error("index '{0}' already exists")]
    IndexExists(String),

    /// Attempt to open or delete an index that does not exist.
    #[error("index '{0}' does not exist")]
    IndexNotFound(String),

    /// A JSON value does not match the field type declared in the metadata.
    #[error("field '{field}' does not match declared type '{expected}'")]
    SchemaMismatch { field: String, expected: String },

    /// JSON or date parsing failed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A stored posting list has a length that is not a multiple of 8.
    #[error("corrupt posting list: length {len} is not a multiple of 8")]
    CorruptPostingList { len: usize },

    /// An underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation was issued against a closed index or store.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl MyricaError {
    /// Create an invalid-name error.
    pub fn invalid_name(kind: NameKind, name: impl Into<String>) -> Self {
        MyricaError::InvalidName {
            kind,
            name: name.into(),
        }
    }

    /// Create a schema-mismatch error.
    pub fn schema_mismatch(field: impl Into<String>, expected: impl Into<String>) -> Self {
        MyricaError::SchemaMismatch {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        MyricaError::Parse(msg.into())
    }

    /// Create an invalid-state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        MyricaError::InvalidState(msg.into())
    }
}
