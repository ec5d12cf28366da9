//! Request and answer types shared between the engine and the HTTP surface

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of citations attached to an answer
pub const MAX_CITATIONS: usize = 5;

/// Where the evidence behind an answer came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Rows returned by a structured (SQL) query
    Sql,

    /// Commits ranked by vector similarity
    Semantic,

    /// Commits filtered by a SQL predicate and ranked by vector similarity
    Hybrid,

    /// A single commit looked up by hash prefix
    Commit,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Sql => "sql",
            SourceType::Semantic => "semantic",
            SourceType::Hybrid => "hybrid",
            SourceType::Commit => "commit",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit cited as a source for an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub commit_hash: String,
    pub author: String,

    /// Similarity score, present only for vector-ranked commits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// The answer returned for one question
///
/// Error envelopes are still well-formed answers: `error` is set and
/// `answer` carries a message that is safe to show to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerEnvelope {
    pub answer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,

    #[serde(default)]
    pub error: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Citation>>,
}

impl AnswerEnvelope {
    /// Create a successful answer for the given source type
    pub fn answered(answer: impl Into<String>, source_type: impl Into<Option<SourceType>>) -> Self {
        Self {
            answer: answer.into(),
            source_type: source_type.into(),
            error: false,
            sources: None,
        }
    }

    /// Create an error envelope carrying a user-visible message
    pub fn failure(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            source_type: None,
            error: true,
            sources: None,
        }
    }

    /// Attach citations, keeping at most [`MAX_CITATIONS`] in input order
    pub fn with_sources(mut self, sources: Vec<Citation>) -> Self {
        self.sources = Some(sources.into_iter().take(MAX_CITATIONS).collect());
        self
    }
}

/// Body accepted by the caller-facing query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub message: Option<String>,
}

impl QueryRequest {
    /// The question, if it is present and not blank
    pub fn question(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn citation(i: usize) -> Citation {
        Citation {
            commit_hash: format!("hash{}", i),
            author: "alice".to_string(),
            score: Some(1.0 - i as f64 / 10.0),
        }
    }

    #[test]
    fn test_source_type_serializes_lowercase() {
        let json = serde_json::to_value(SourceType::Hybrid).unwrap();
        assert_eq!(json, json!("hybrid"));
        assert_eq!(SourceType::Commit.to_string(), "commit");
    }

    #[test]
    fn test_with_sources_truncates_to_five_in_order() {
        let sources: Vec<Citation> = (0..8).map(citation).collect();
        let envelope = AnswerEnvelope::answered("ok", SourceType::Semantic).with_sources(sources);

        let kept = envelope.sources.unwrap();
        assert_eq!(kept.len(), MAX_CITATIONS);
        let hashes: Vec<&str> = kept.iter().map(|c| c.commit_hash.as_str()).collect();
        assert_eq!(hashes, vec!["hash0", "hash1", "hash2", "hash3", "hash4"]);
    }

    #[test]
    fn test_failure_envelope_shape() {
        let envelope = AnswerEnvelope::failure("Unsupported action: explode");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            json!({"answer": "Unsupported action: explode", "error": true})
        );
    }

    #[test]
    fn test_answered_envelope_shape() {
        let envelope = AnswerEnvelope::answered("3 commits", SourceType::Sql);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            json!({"answer": "3 commits", "source_type": "sql", "error": false})
        );
    }

    #[test]
    fn test_query_request_blank_message() {
        let blank: QueryRequest = serde_json::from_value(json!({"message": "   "})).unwrap();
        assert!(blank.question().is_none());

        let missing: QueryRequest = serde_json::from_value(json!({})).unwrap();
        assert!(missing.question().is_none());

        let ok: QueryRequest =
            serde_json::from_value(json!({"message": " who fixed login? "})).unwrap();
        assert_eq!(ok.question(), Some("who fixed login?"));
    }
}
