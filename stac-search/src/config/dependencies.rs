//! Dependency initialization and wiring for the STAC search adapter.

use std::env;
use std::sync::Arc;
use tracing::info;

use crate::AdapterError;
use stac_search_core::{CollectionRegistry, SearchOrchestrator};
use stac_search_ingest::IngestWriter;
use stac_search_repository::{GlobusSearchClient, GlobusSearchConfig};

/// Default Globus Search service URL.
const DEFAULT_BASE_URL: &str = "https://search.api.globus.org";

/// Default directory holding the collection JSON files.
const DEFAULT_COLLECTIONS_DIR: &str = "schemas";

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured search orchestrator.
    pub orchestrator: SearchOrchestrator,
    /// The configured ingest writer.
    pub writer: IngestWriter,
    /// The collection registry.
    pub collections: CollectionRegistry,
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies").finish_non_exhaustive()
    }
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GLOBUS_SEARCH_BASE_URL`: search service URL (default: https://search.api.globus.org)
    /// - `GLOBUS_SEARCH_INDEX_ID`: the search index UUID (required)
    /// - `GLOBUS_SEARCH_BEARER_TOKEN`: bearer token for authenticated indexes (optional)
    /// - `STAC_COLLECTIONS_DIR`: directory of collection JSON files (default: schemas)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AdapterError)` - If initialization fails
    pub fn new() -> Result<Self, AdapterError> {
        let base_url =
            env::var("GLOBUS_SEARCH_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let index_id = env::var("GLOBUS_SEARCH_INDEX_ID")
            .map_err(|_| AdapterError::config("GLOBUS_SEARCH_INDEX_ID is not set"))?;
        let bearer_token = env::var("GLOBUS_SEARCH_BEARER_TOKEN").ok();
        let collections_dir = env::var("STAC_COLLECTIONS_DIR")
            .unwrap_or_else(|_| DEFAULT_COLLECTIONS_DIR.to_string());

        info!(
            base_url = %base_url,
            index_id = %index_id,
            authenticated = bearer_token.is_some(),
            collections_dir = %collections_dir,
            "Initializing dependencies"
        );

        let mut config = GlobusSearchConfig::new(&base_url, &index_id);
        if let Some(token) = bearer_token {
            config = config.with_bearer_token(token);
        }

        let client = GlobusSearchClient::new(config)
            .map_err(|e| AdapterError::config(format!("Failed to create search client: {}", e)))?;
        let provider = Arc::new(client);

        let orchestrator = SearchOrchestrator::new(provider.clone());
        let writer = IngestWriter::new(provider);
        let collections = CollectionRegistry::new(collections_dir);

        info!("Search adapter dependencies ready");

        Ok(Self {
            orchestrator,
            writer,
            collections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_index_id_is_a_config_error() {
        env::remove_var("GLOBUS_SEARCH_INDEX_ID");
        let err = Dependencies::new().unwrap_err();
        assert!(matches!(err, AdapterError::ConfigError(_)));
        assert!(err.to_string().contains("GLOBUS_SEARCH_INDEX_ID"));
    }
}
