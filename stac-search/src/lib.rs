//! # STAC Search
//!
//! Wiring crate for the STAC search adapter.
//!
//! This crate provides the entry point and configuration for constructing
//! the search orchestrator and ingest writer against a configured backend.

pub mod config;

pub use config::Dependencies;

use thiserror::Error;

/// Errors that can occur during adapter initialization or execution.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Search pipeline error.
    #[error("Search error: {0}")]
    Search(#[from] stac_search_core::SearchPipelineError),

    /// Backend error.
    #[error("Backend error: {0}")]
    Backend(#[from] stac_search_repository::BackendError),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    Ingest(#[from] stac_search_ingest::IngestError),

    /// Collection registry error.
    #[error("Collection registry error: {0}")]
    Collections(#[from] stac_search_core::CollectionRegistryError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AdapterError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Initialize the tracing subscriber, honoring `RUST_LOG` with an `info`
/// fallback.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
