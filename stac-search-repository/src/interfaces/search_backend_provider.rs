//! Search backend provider trait definition.
//!
//! This module defines the abstract interface for backend operations,
//! allowing for different implementations (Globus Search, mock, etc.).

use async_trait::async_trait;

use crate::errors::BackendError;
use crate::types::{CompiledQuery, DeleteReport, ResultEntry, ResultPage, WriteReport};
use stac_search_shared::BackendDocument;

/// Abstracts the underlying search backend.
///
/// Implementations are injected into the search orchestrator and the
/// ingest writer, enabling dependency injection and testing with mocks.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`: multiple search requests
/// may execute concurrently against one provider. Connection pooling is
/// internal to the implementation, not exposed to callers.
///
/// # Retries
///
/// Transient failures (timeouts, 5xx, rate limits) are retried inside
/// the implementation with bounded exponential backoff. Queries are
/// read-only and writes are keyed by stable subject, so retries are
/// idempotent by construction.
#[async_trait]
pub trait SearchBackendProvider: Send + Sync {
    /// Execute a compiled query and return one page of raw results.
    ///
    /// # Returns
    ///
    /// * `Ok(ResultPage)` - Decoded entries plus a next-page cursor when
    ///   the backend signals more results exist
    /// * `Err(BackendError)` - Transient (post-exhaustion) or fatal failure
    async fn execute(&self, query: &CompiledQuery) -> Result<ResultPage, BackendError>;

    /// Fetch a single document by its stable subject.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(ResultEntry))` - The document exists
    /// * `Ok(None)` - No document with this subject
    /// * `Err(BackendError)` - Transient (post-exhaustion) or fatal failure
    async fn fetch(&self, subject: &str) -> Result<Option<ResultEntry>, BackendError>;

    /// Upsert documents, keyed by stable subject.
    ///
    /// A single document's failure does not abort the rest; per-document
    /// outcomes are reported in the [`WriteReport`].
    async fn write(&self, documents: &[BackendDocument]) -> Result<WriteReport, BackendError>;

    /// Delete documents by subject. Subjects that do not exist count as
    /// successful deletions.
    async fn delete(&self, subjects: &[String]) -> Result<DeleteReport, BackendError>;
}
