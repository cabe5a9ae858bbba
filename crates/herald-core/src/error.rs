//! Herald error type — one enum per concern, string payloads for diagnostics.

use thiserror::Error;

/// Errors produced anywhere in the Herald workspace.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Configuration file could not be read, parsed, or written.
    #[error("config error: {0}")]
    Config(String),

    /// Catalog persistence failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Transport failure (recipient enumeration or message delivery).
    #[error("transport error: {0}")]
    Transport(String),

    /// A trigger-time token did not match `HH:MM` with valid ranges.
    #[error("invalid trigger time: {0}")]
    InvalidTrigger(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HeraldError>;
