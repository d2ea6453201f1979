//! # STAC Search Repository
//!
//! This crate provides the trait and implementation for interacting with
//! the search backend. It includes error definitions, the abstract
//! provider interface, the query compiler producing the backend's native
//! filter DSL, and a concrete client for Globus Search.

pub mod errors;
pub mod globus;
pub mod interfaces;
pub mod types;

pub use errors::{BackendError, CompileError};
pub use globus::{GlobusSearchClient, GlobusSearchConfig, RetryConfig};
pub use interfaces::SearchBackendProvider;
pub use types::{
    CompiledQuery, DeleteOutcome, DeleteReport, ResultEntry, ResultPage, WriteOutcome,
    WriteReport, WriteStatus,
};
