//! # STAC Search Ingest
//!
//! The write path of the adapter: converts catalog source records into
//! backend documents and writes them in batches with per-record outcomes.

pub mod errors;
pub mod transformer;
pub mod writer;

pub use errors::{IngestError, TransformError};
pub use transformer::{IngestTransformer, SourceRecord};
pub use writer::{BatchReport, IngestWriter, RecordOutcome, RecordStatus, WriterConfig};
