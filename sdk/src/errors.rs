//! Error types and handling
//!
//! This module provides the error types used throughout the CommitLens engine.
//! All errors implement the `CommitLensErrorExt` trait which provides
//! user-friendly hints.
//!
//! # Security
//!
//! Error messages never carry API keys or connection strings. Hints are
//! static strings that are safe to return over the HTTP surface.

use thiserror::Error;

/// Trait for CommitLens error extensions
pub trait CommitLensErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets or internal implementation details.
    fn user_hint(&self) -> &str;
}

/// Main engine error type
///
/// Raised where the engine is assembled and at the caller boundary. Failures
/// inside the question pipeline never surface as errors; they become answer
/// envelopes instead.
///
/// # Examples
///
/// ```
/// use sdk::errors::{CommitLensErrorExt, EngineError};
///
/// let error = EngineError::Embedding("relative URL without a base".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.to_string().starts_with("Embedding error"));
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Embedding service errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    // Caller input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CommitLensErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Database(_) => "Database operation failed. Check the database URL and pgvector",
            Self::LLMProvider(_) => "LLM provider unavailable. Check your API key and network",
            Self::Embedding(_) => "Embedding service unavailable. Check that it is running",
            Self::InvalidInput(_) => "The request was not valid. Provide a non-empty question",
        }
    }
}
