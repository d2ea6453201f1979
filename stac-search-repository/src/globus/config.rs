//! Configuration for the Globus Search client.

/// Retry policy for transient backend failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
        }
    }
}

/// Configuration for [`GlobusSearchClient`](crate::GlobusSearchClient).
///
/// Passed explicitly at construction so multiple independently configured
/// clients can coexist in one process.
#[derive(Debug, Clone)]
pub struct GlobusSearchConfig {
    /// Base URL of the search service, e.g. `https://search.api.globus.org`.
    pub base_url: String,
    /// The search index UUID.
    pub index_id: String,
    /// Optional bearer token for authenticated indexes.
    pub bearer_token: Option<String>,
    /// Retry policy for transient failures.
    pub retry: RetryConfig,
}

impl GlobusSearchConfig {
    pub fn new(base_url: impl Into<String>, index_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            index_id: index_id.into(),
            bearer_token: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
