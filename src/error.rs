// WHY: one error type for the library surface so callers can match on the failure kind
// File-system plumbing and the binary wrap these in anyhow with context

use thiserror::Error;

/// Errors raised by extraction, fitting and model persistence
#[derive(Error, Debug)]
pub enum EndLinesError {
    /// Too few newline events to estimate two clusters
    #[error("insufficient data: found {found} newline events, at least {required} required")]
    InsufficientData { found: usize, required: usize },

    /// Stored model payload is malformed or has an incompatible schema
    #[error("model deserialization failed: {0}")]
    Deserialization(String),

    /// Document is empty or its newline offsets do not point at newline characters
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Configuration value out of range
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EndLinesError>;
