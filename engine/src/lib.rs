//! CommitLens Engine Library
//!
//! Question answering over a commit knowledge base: planning, SQL safety
//! screening, structured / vector / hybrid retrieval and answer synthesis.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Database access module
pub mod db;

/// Per-request LLM settings
pub mod settings;

/// LLM completion provider abstraction
pub mod llm;

/// Embedding service client
pub mod embedding;

/// Tool-call proxy client
pub mod mcp;

/// SQL safety gate
pub mod safety;

/// Query planner
pub mod planner;

/// Retrieval strategies
pub mod retrieval;

/// Answer synthesis
pub mod synthesizer;

/// Question-answering pipeline
pub mod orchestrator;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
