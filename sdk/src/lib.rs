//! CommitLens SDK
//!
//! Shared library providing the answer types, the `Answerer` seam and the
//! error taxonomy. This crate is used by both the engine and the api-server.

/// Answerer trait
pub mod answerer;

/// Error types and handling
pub mod errors;

/// Request and answer types
pub mod types;

// Re-export commonly used types
pub use answerer::Answerer;
pub use errors::{CommitLensErrorExt, EngineError};
pub use types::{AnswerEnvelope, Citation, QueryRequest, SourceType, MAX_CITATIONS};
