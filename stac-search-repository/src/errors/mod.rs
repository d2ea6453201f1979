//! Error types for the search repository.

mod backend_error;
mod compile_error;

pub use backend_error::BackendError;
pub use compile_error::CompileError;
