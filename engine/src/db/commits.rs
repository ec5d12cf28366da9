//! Commit rows returned by vector search

use chrono::NaiveDateTime;

/// A commit returned by a vector-ranked query
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedCommit {
    pub commit_hash: String,
    pub author: String,
    pub committed_date: Option<NaiveDateTime>,
    pub message: String,
    pub summary_text: Option<String>,
    pub feedback: Option<String>,

    /// `1 - cosine distance`; present only for vector-ranked rows
    pub score: Option<f64>,
}

/// Parameters of one nearest-neighbour query
#[derive(Debug, Clone)]
pub struct NearestQuery<'a> {
    pub embedding: &'a [f32],

    /// Extra SQL predicate conjoined to the filter (hybrid search)
    pub predicate: Option<&'a str>,

    pub limit: i64,
}

/// Render an embedding as a pgvector text literal, e.g. `[0.1,0.2]`
pub fn vector_literal(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

/// Build the nearest-neighbour statement
///
/// `$1` is the query vector as text, `$2` the limit. Rows without an
/// embedding never match.
pub fn nearest_commits_sql(predicate: Option<&str>) -> String {
    let filter = match predicate {
        Some(p) => format!("embedding_vector IS NOT NULL AND ({})", p),
        None => "embedding_vector IS NOT NULL".to_string(),
    };

    format!(
        "SELECT commit_hash, author, committed_date, message, summary_text, feedback, \
         1 - (embedding_vector <=> $1::vector) AS score \
         FROM commit \
         WHERE {} \
         ORDER BY embedding_vector <=> $1::vector \
         LIMIT $2",
        filter
    )
}
