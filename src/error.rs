// ⚠️ Errors - library error type and form validation errors

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Import bytes were not well-formed JSON; storage left unchanged
    #[error("Invalid JSON: {0}")]
    ImportInvalid(#[source] serde_json::Error),

    /// Form input rejected before touching the document
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Backend-specific failure that has no better home
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Reasons a form submission is refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("category must not be empty")]
    EmptyCategory,

    #[error("amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    #[error("unknown student status '{0}' (expected lead, enrolled or paid)")]
    UnknownStatus(String),

    #[error("unknown payment method '{0}' (expected cash, card, bank, transfer or other)")]
    UnknownMethod(String),

    #[error("staff member '{0}' already exists")]
    DuplicateStaff(String),
}
