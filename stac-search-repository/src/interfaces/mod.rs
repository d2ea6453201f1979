//! Interface definitions for the search backend.
//!
//! This module defines the abstract `SearchBackendProvider` trait that
//! allows for dependency injection and swappable backend implementations.

mod search_backend_provider;

pub use search_backend_provider::SearchBackendProvider;
