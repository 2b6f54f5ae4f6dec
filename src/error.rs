use std::time::Duration;

use thiserror::Error;

/// Bad input caught before any collaborator is called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("unsupported file type '{found}', only {expected} is accepted")]
    UnsupportedType { found: String, expected: &'static str },

    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("file is empty")]
    EmptyDocument,

    #[error("question is empty")]
    EmptyQuestion,
}

/// An external collaborator (extractor, summarizer, responder) failed or timed out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorFailure {
    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("{collaborator} timed out after {after:?}")]
    Timeout {
        collaborator: &'static str,
        after: Duration,
    },
}

/// Durable store read/write fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreFailure {
    #[error("failed to read history store: {0}")]
    Read(String),

    #[error("failed to write history store: {0}")]
    Write(String),

    #[error("history store is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorFailure),

    #[error(transparent)]
    Store(#[from] StoreFailure),

    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("a request is already in flight")]
    Busy,

    #[error("no document is bound to this chat")]
    NotBound,

    #[error("history item '{0}' already exists")]
    DuplicateId(String),

    #[error("history item '{0}' not found")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
