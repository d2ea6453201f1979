//! Query compilation error types.
//!
//! These errors surface before any backend call is made, with enough
//! context for the caller to fix the request.

use thiserror::Error;

use stac_search_shared::TokenError;

/// Errors that can occur while compiling a search request into the
/// backend's native query representation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    /// The spatial filter geometry is invalid (malformed bbox, open or
    /// self-intersecting polygon ring).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The filter expression uses an operator the backend cannot express.
    #[error("Unsupported filter operator '{0}'")]
    UnsupportedFilterOperator(String),

    /// The sort specification names a field outside the sortable whitelist.
    #[error("Field '{0}' is not sortable")]
    UnsortableField(String),

    /// The continuation token could not be decoded.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The continuation token was produced under a different filter/sort
    /// shape than the current request.
    #[error("Stale continuation token: the request's filters or sort changed mid-pagination")]
    StaleContinuationToken,
}

impl CompileError {
    /// Create an invalid geometry error.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create an unsupported operator error.
    pub fn operator(op: impl Into<String>) -> Self {
        Self::UnsupportedFilterOperator(op.into())
    }

    /// Create an unsortable field error.
    pub fn unsortable(field: impl Into<String>) -> Self {
        Self::UnsortableField(field.into())
    }
}
