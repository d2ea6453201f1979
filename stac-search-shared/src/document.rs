//! Backend document schema.
//!
//! The search backend stores subject-keyed documents. The subject is a
//! stable, deterministic function of the catalog identifiers, so
//! re-ingesting a record updates the existing document instead of
//! duplicating it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version of the backend document schema attached to every ingested
/// document. Bump when the content layout changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

/// A document in the search backend's native schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendDocument {
    /// Stable document identifier.
    pub subject: String,
    /// Visibility tags controlling who can see the document.
    pub visible_to: Vec<String>,
    /// The STAC item content, with assets in the backend's list form.
    pub content: Value,
    /// When this document was produced by the ingest transformer.
    pub ingested_at: DateTime<Utc>,
    /// Schema version of the content layout.
    pub schema_version: u32,
}

impl BackendDocument {
    /// Compute the stable subject for a catalog record.
    pub fn subject_for(collection_id: &str, item_id: &str) -> String {
        format!("{}_{}", collection_id, item_id)
    }
}

/// Backend paging position carried between requests inside a continuation
/// token. Request-scoped on this system's side; the backend interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    pub offset: u64,
}
