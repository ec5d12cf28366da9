//! Answer synthesis
//!
//! Renders evidence into a grounded answer with a second completion call.
//! This is where the pipeline absorbs its last failures: if the model cannot
//! answer, the evidence itself becomes the answer.

use sdk::{AnswerEnvelope, Citation, SourceType};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::RetrievedCommit;
use crate::llm::{CompletionProvider, CompletionRequest};
use crate::settings::LlmSettings;

pub const ANSWER_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant that provides clear, concise answers based on database results.";

/// Build the user prompt for a source type
///
/// `None` selects the generic template.
pub fn build_answer_prompt(question: &str, evidence: &str, source: Option<SourceType>) -> String {
    match source {
        Some(SourceType::Sql) => format!(
            "You are analyzing database query results to answer a user's question.\n\n\
             User Question: {question}\n\n\
             Database Results:\n{evidence}\n\n\
             Task: Provide a clear, concise answer (2-4 sentences) based only on the data above.\n\
             If the data shows statistics or counts, present them clearly.\n\
             If no relevant data is found, say so directly.\n"
        ),
        Some(SourceType::Semantic) | Some(SourceType::Hybrid) => format!(
            "You are analyzing Git commit history to answer a user's question.\n\n\
             User Question: {question}\n\n\
             Relevant Commits Found:\n{evidence}\n\n\
             Task:\n\
             1. Provide a clear answer (2-4 sentences) summarizing the relevant commits\n\
             2. Highlight the commit(s) that best answer the question\n\
             3. Mention authors, dates or changes when relevant\n\
             4. Reference commit hashes when discussing specific changes\n\
             Use only the commits listed above.\n"
        ),
        Some(SourceType::Commit) => format!(
            "You are explaining a specific Git commit to a user.\n\n\
             User Question: {question}\n\n\
             Commit Details:\n{evidence}\n\n\
             Task: Explain this commit using only the details above:\n\
             - What changes were made\n\
             - Why they might have been made, if the summary or feedback says\n\
             - Any code quality feedback or concerns\n\
             Keep the explanation clear and developer-friendly, under 200 words.\n"
        ),
        None => format!(
            "Question: {question}\n\
             Data: {evidence}\n\n\
             Provide a clear, helpful answer (at most 4 sentences) based only on the information above.\n"
        ),
    }
}

/// Citations from the first rows, in input order
pub fn citations(rows: &[RetrievedCommit]) -> Vec<Citation> {
    rows.iter()
        .take(sdk::MAX_CITATIONS)
        .map(|row| Citation {
            commit_hash: row.commit_hash.clone(),
            author: row.author.clone(),
            score: row.score,
        })
        .collect()
}

/// Turns evidence into an [`AnswerEnvelope`]
pub struct AnswerSynthesizer {
    llm: Arc<dyn CompletionProvider>,
    temperature: f64,
    max_tokens: u32,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn CompletionProvider>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            llm,
            temperature,
            max_tokens,
        }
    }

    /// Synthesize an answer; never fails
    ///
    /// On any completion failure, or a blank completion, the answer is the
    /// evidence text verbatim under the same source type.
    pub async fn synthesize(
        &self,
        settings: &LlmSettings,
        question: &str,
        evidence: &str,
        source: Option<SourceType>,
        rows: Option<&[RetrievedCommit]>,
    ) -> AnswerEnvelope {
        let request = CompletionRequest::new(
            ANSWER_SYSTEM_PROMPT,
            build_answer_prompt(question, evidence, source),
            self.temperature,
            self.max_tokens,
        );

        let answer = match self.llm.complete(settings, &request).await {
            Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
            Ok(_) => {
                warn!("Answer generation returned blank content, returning raw evidence");
                return AnswerEnvelope::answered(evidence, source);
            }
            Err(e) => {
                warn!("Answer generation failed, returning raw evidence: {}", e);
                return AnswerEnvelope::answered(evidence, source);
            }
        };

        debug!("Synthesized answer of {} chars", answer.len());

        let envelope = AnswerEnvelope::answered(answer, source);
        match rows {
            Some(rows) if !rows.is_empty() => envelope.with_sources(citations(rows)),
            _ => envelope,
        }
    }
}
