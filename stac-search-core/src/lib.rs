//! # STAC Search Core
//!
//! The search path of the adapter: converts backend result pages into
//! STAC responses and sequences the compile-query-map pipeline.
//!
//! ## Architecture
//!
//! One request flows through three stages:
//!
//! 1. **Compile**: the request becomes a backend query (repository crate)
//! 2. **Query**: the backend executes it and returns a raw page
//! 3. **Map**: raw documents become STAC items with pagination links

pub mod collections;
pub mod errors;
pub mod mapper;
pub mod orchestrator;

pub use collections::{CollectionRegistry, CollectionRegistryError};
pub use errors::{SearchPipelineError, SearchStage};
pub use mapper::{map_page, MappedPage};
pub use orchestrator::SearchOrchestrator;
