//! # STAC Search Shared
//!
//! Shared types and data structures for the STAC search adapter. This crate
//! holds the request model, the canonical STAC JSON structures, the backend
//! document schema, the continuation-token codec, and the request
//! fingerprint. Everything here is pure computation with no I/O.

pub mod document;
pub mod fingerprint;
pub mod request;
pub mod stac;
pub mod token;

pub use document::{BackendDocument, CursorState, SCHEMA_VERSION};
pub use request::{
    Bbox, ComparisonOp, FilterExpr, Geometry, GeometryError, Position, SearchRequest,
    SortDirection, SortSpec, TemporalFilter, TemporalParseError, DEFAULT_LIMIT, MAX_LIMIT,
};
pub use stac::{
    Asset, Extent, ItemCollection, Link, Provider, SpatialExtent, StacCollection, StacItem,
    TemporalExtent,
};
pub use token::TokenError;
