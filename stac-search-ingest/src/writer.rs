//! Ingest writer: batches of source records into the backend.
//!
//! The writer never aborts a batch on a single failure. Every record gets
//! an outcome, transform failures included, and the report enumerates them
//! in batch order. Writes go out one record at a time in batch order, so
//! when a batch carries the same subject twice the later record is the
//! one that ends up stored.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::errors::{IngestError, TransformError};
use crate::transformer::{IngestTransformer, SourceRecord};
use stac_search_repository::{SearchBackendProvider, WriteStatus};

/// Configuration for the ingest writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Largest batch accepted by [`IngestWriter::ingest_batch`].
    pub max_batch_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
        }
    }
}

/// Final status of one record in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordStatus {
    /// A new document was created.
    Written,
    /// An existing document with the same subject was replaced.
    Updated,
    /// The record failed in transform or write; the reason says which.
    Failed(String),
}

/// Outcome of one record, in batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    /// Subject of the document, when the record transformed far enough to
    /// have one.
    pub subject: Option<String>,
    pub status: RecordStatus,
}

/// Summary of one ingest batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Per-record outcomes in batch order.
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn any_succeeded(&self) -> bool {
        self.succeeded > 0
    }
}

/// Writes batches of source records through the backend provider.
pub struct IngestWriter {
    provider: Arc<dyn SearchBackendProvider>,
    transformer: IngestTransformer,
    config: WriterConfig,
}

impl IngestWriter {
    pub fn new(provider: Arc<dyn SearchBackendProvider>) -> Self {
        Self::with_config(provider, WriterConfig::default())
    }

    pub fn with_config(provider: Arc<dyn SearchBackendProvider>, config: WriterConfig) -> Self {
        Self {
            provider,
            transformer: IngestTransformer::new(),
            config,
        }
    }

    /// Ingest a batch of source records.
    ///
    /// # Arguments
    /// * `records` - source records in the order they should be written
    ///
    /// # Returns
    /// A [`BatchReport`] with one outcome per record, or
    /// [`IngestError::BatchSizeExceeded`] when the batch is too large to
    /// attempt at all.
    #[instrument(skip(self, records), fields(batch_size = records.len()))]
    pub async fn ingest_batch(
        &self,
        records: &[SourceRecord],
    ) -> Result<BatchReport, IngestError> {
        if records.len() > self.config.max_batch_size {
            return Err(IngestError::BatchSizeExceeded {
                provided: records.len(),
                max: self.config.max_batch_size,
            });
        }

        let mut outcomes = Vec::with_capacity(records.len());
        let mut succeeded = 0;
        let mut failed = 0;

        for record in records {
            let outcome = self.ingest_one(record).await;
            match outcome.status {
                RecordStatus::Failed(_) => failed += 1,
                _ => succeeded += 1,
            }
            outcomes.push(outcome);
        }

        info!(
            total = records.len(),
            succeeded, failed, "Ingest batch complete"
        );

        Ok(BatchReport {
            total: records.len(),
            succeeded,
            failed,
            outcomes,
        })
    }

    async fn ingest_one(&self, record: &SourceRecord) -> RecordOutcome {
        let document = match self.transformer.transform(record) {
            Ok(document) => document,
            Err(e @ TransformError::MissingVisibilityMetadata)
            | Err(e @ TransformError::InvalidSourceRecord(_)) => {
                warn!(error = %e, "Record rejected before write");
                return RecordOutcome {
                    subject: None,
                    status: RecordStatus::Failed(e.to_string()),
                };
            }
        };

        let subject = document.subject.clone();
        let status = match self.provider.write(std::slice::from_ref(&document)).await {
            Ok(report) => match report.outcomes.first().map(|o| &o.status) {
                Some(WriteStatus::Created) => RecordStatus::Written,
                Some(WriteStatus::Updated) => RecordStatus::Updated,
                Some(WriteStatus::Failed(reason)) => RecordStatus::Failed(reason.clone()),
                None => RecordStatus::Failed("backend reported no outcome".to_string()),
            },
            Err(e) => {
                warn!(%subject, error = %e, "Write failed");
                RecordStatus::Failed(e.to_string())
            }
        };

        RecordOutcome {
            subject: Some(subject),
            status,
        }
    }
}
