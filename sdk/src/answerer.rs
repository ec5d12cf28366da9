//! Answerer trait
//!
//! The seam between the question-answering engine and the surfaces that
//! expose it (HTTP server, CLI). Surfaces depend only on this trait.

use crate::types::AnswerEnvelope;
use async_trait::async_trait;

/// Anything that can turn a free-text question into an answer
///
/// Implementations must never fail: every internal fault is reported as an
/// [`AnswerEnvelope`] with `error` set.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Returns the name of the answerer, used in health responses
    fn name(&self) -> &str;

    /// Answer one question
    async fn answer(&self, question: &str) -> AnswerEnvelope;
}
