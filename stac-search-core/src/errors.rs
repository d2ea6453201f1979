//! Error types for the search pipeline.

use thiserror::Error;

use stac_search_repository::{BackendError, CompileError};

/// The pipeline stage a search request failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Compile,
    Query,
    Map,
}

impl std::fmt::Display for SearchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Compile => "compile",
            Self::Query => "query",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

/// A search request failure carrying the first error encountered and the
/// stage it occurred in.
#[derive(Debug, Error)]
pub enum SearchPipelineError {
    /// Request compilation failed; the request itself is at fault.
    #[error("compile stage failed: {0}")]
    Compile(#[from] CompileError),

    /// The backend call failed (transient errors already exhausted their
    /// retries inside the client).
    #[error("query stage failed: {0}")]
    Query(#[from] BackendError),

    /// No document in a non-empty page could be converted to STAC.
    #[error("map stage failed: {0}")]
    Map(String),
}

impl SearchPipelineError {
    /// The stage this error occurred in.
    pub fn stage(&self) -> SearchStage {
        match self {
            Self::Compile(_) => SearchStage::Compile,
            Self::Query(_) => SearchStage::Query,
            Self::Map(_) => SearchStage::Map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_accessor() {
        let err = SearchPipelineError::Compile(CompileError::StaleContinuationToken);
        assert_eq!(err.stage(), SearchStage::Compile);

        let err = SearchPipelineError::Query(BackendError::fatal("boom"));
        assert_eq!(err.stage(), SearchStage::Query);

        let err = SearchPipelineError::Map("nothing converted".to_string());
        assert_eq!(err.stage(), SearchStage::Map);
        assert_eq!(err.stage().to_string(), "map");
    }
}
