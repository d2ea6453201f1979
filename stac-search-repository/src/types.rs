//! Request and response types for backend operations.

use serde_json::{json, Value};

use stac_search_shared::CursorState;

/// A compiled query in the backend's native representation.
///
/// Owned transiently per request; never persisted or shared across
/// requests.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Free-text query; `"*"` when the request carries only filters.
    pub q: String,
    /// Page size, already clamped.
    pub limit: usize,
    /// Paging offset merged from the continuation token, 0 otherwise.
    pub offset: u64,
    /// Backend filter clauses (implicit AND).
    pub filters: Vec<Value>,
    /// Backend sort clauses, in priority order.
    pub sort: Vec<Value>,
}

impl CompiledQuery {
    /// Render the POST body for the backend's search endpoint.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "q": self.q,
            "limit": self.limit,
            "offset": self.offset,
            "filters": self.filters,
        });
        if !self.sort.is_empty() {
            body["sort"] = json!(self.sort);
        }
        body
    }
}

/// One decoded document from a backend result page.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    /// The document's stable identifier.
    pub subject: String,
    /// The document content as stored in the backend.
    pub content: Value,
}

/// An ordered page of backend results.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    /// Decoded documents in backend order.
    pub entries: Vec<ResultEntry>,
    /// Approximate total match count, when the backend reports one.
    pub total: Option<u64>,
    /// Cursor for the next page; absent means end of results.
    pub next_cursor: Option<CursorState>,
}

impl ResultPage {
    /// An empty page with no further results.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            total: Some(0),
            next_cursor: None,
        }
    }
}

/// Outcome of writing a single document.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteStatus {
    /// The document did not exist and was created.
    Created,
    /// The document existed and was updated in place.
    Updated,
    /// The write failed with the given reason.
    Failed(String),
}

/// Per-document result of a write operation.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub subject: String,
    pub status: WriteStatus,
}

/// Summary of a write operation over one or more documents.
///
/// Individual failures are reported here so callers can handle partial
/// success; the operation as a whole only errors when nothing could be
/// attempted at all.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<WriteOutcome>,
}

/// Per-document result of a delete operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    pub subject: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Summary of a delete operation. Documents that did not exist count as
/// successful deletions.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<DeleteOutcome>,
}
