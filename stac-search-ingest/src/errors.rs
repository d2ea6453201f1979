//! Error types for the ingest path.

use thiserror::Error;

/// Failure converting one source record into a backend document.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransformError {
    /// The record carries no visibility metadata. Documents are never
    /// written with a guessed visibility.
    #[error("source record has no visibility metadata")]
    MissingVisibilityMetadata,

    /// The record is structurally invalid; the message names the field.
    #[error("invalid source record: {0}")]
    InvalidSourceRecord(String),
}

impl TransformError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidSourceRecord(msg.into())
    }
}

/// Failure affecting a whole ingest batch before any record is attempted.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IngestError {
    #[error("batch of {provided} records exceeds the configured maximum of {max}")]
    BatchSizeExceeded { provided: usize, max: usize },
}
