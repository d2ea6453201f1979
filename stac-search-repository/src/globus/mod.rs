//! Globus Search backend implementation.
//!
//! Contains the query compiler producing the Globus Search filter DSL and
//! the HTTP client implementing [`SearchBackendProvider`](crate::SearchBackendProvider).

mod client;
mod config;
pub mod queries;

pub use client::GlobusSearchClient;
pub use config::{GlobusSearchConfig, RetryConfig};
