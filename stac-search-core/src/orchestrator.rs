//! Search orchestrator.
//!
//! Sequences one search request through compile, query, and map, and
//! shapes the STAC FeatureCollection response. No retries happen here;
//! the backend client owns them. Each request is handled by one logical
//! task and owns its compiled query and result page; nothing is shared
//! between concurrent requests.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::errors::SearchPipelineError;
use crate::mapper::{entry_to_item, map_page};
use stac_search_repository::{globus::queries, SearchBackendProvider};
use stac_search_shared::{BackendDocument, ItemCollection, Link, SearchRequest, StacItem};

/// Default href prefix for pagination links when none is configured.
pub const DEFAULT_SEARCH_HREF: &str = "/search";

/// Orchestrates the search path against a backend provider.
///
/// Constructed once per configuration with all collaborators passed in
/// explicitly, so independently configured instances can coexist in one
/// process.
pub struct SearchOrchestrator {
    provider: Arc<dyn SearchBackendProvider>,
    search_href: String,
}

impl SearchOrchestrator {
    /// Create an orchestrator with the default search href.
    pub fn new(provider: Arc<dyn SearchBackendProvider>) -> Self {
        Self {
            provider,
            search_href: DEFAULT_SEARCH_HREF.to_string(),
        }
    }

    /// Create an orchestrator that builds pagination links against the
    /// given search endpoint href.
    pub fn with_search_href(
        provider: Arc<dyn SearchBackendProvider>,
        search_href: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            search_href: search_href.into(),
        }
    }

    /// Execute a search request and return a STAC FeatureCollection.
    ///
    /// Documents that fail STAC conversion are dropped from the page and
    /// counted in the response's `numSkipped`; a non-empty page where
    /// every document fails conversion is a Map-stage error instead,
    /// since that indicates a schema mismatch rather than stray bad
    /// documents.
    #[instrument(skip(self, request), fields(limit = request.limit))]
    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ItemCollection, SearchPipelineError> {
        let compiled = queries::compile(request)?;
        debug!(
            filters = compiled.filters.len(),
            offset = compiled.offset,
            "Compiled search request"
        );

        let page = self.provider.execute(&compiled).await?;

        let mapped = map_page(&page, request);
        if mapped.items.is_empty() && !page.entries.is_empty() {
            return Err(SearchPipelineError::Map(format!(
                "all {} documents in the page failed STAC conversion",
                page.entries.len()
            )));
        }

        let mut links = Vec::new();
        if let Some(next_token) = &mapped.next_token {
            links.push(Link {
                rel: "next".to_string(),
                href: format!("{}?token={}", self.search_href, next_token),
                type_: Some("application/geo+json".to_string()),
                title: None,
                method: Some("GET".to_string()),
            });
        }

        let num_returned = mapped.items.len();
        Ok(ItemCollection {
            type_: "FeatureCollection".to_string(),
            features: mapped.items,
            links,
            num_returned,
            num_matched: page.total,
            num_skipped: mapped.skipped,
        })
    }

    /// Fetch a single item by collection and item id.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(StacItem))` - The item exists
    /// * `Ok(None)` - No item with this id in this collection
    /// * `Err(SearchPipelineError)` - Backend failure, or the stored
    ///   document could not be converted to STAC
    pub async fn get_item(
        &self,
        collection_id: &str,
        item_id: &str,
    ) -> Result<Option<StacItem>, SearchPipelineError> {
        let subject = BackendDocument::subject_for(collection_id, item_id);
        let Some(entry) = self.provider.fetch(&subject).await? else {
            return Ok(None);
        };
        match entry_to_item(&entry) {
            Some(item) => Ok(Some(item)),
            None => Err(SearchPipelineError::Map(format!(
                "document '{}' failed STAC conversion",
                subject
            ))),
        }
    }

    /// List the items of a single collection: the `/collections/{id}/items`
    /// endpoint expressed as a restricted search.
    pub async fn item_collection(
        &self,
        collection_id: &str,
        limit: usize,
        token: Option<String>,
    ) -> Result<ItemCollection, SearchPipelineError> {
        let mut request = SearchRequest::new()
            .with_collections(vec![collection_id.to_string()])
            .with_limit(limit);
        request.token = token;
        self.search(&request).await
    }
}
