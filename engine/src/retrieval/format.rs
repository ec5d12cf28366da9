//! Evidence rendering
//!
//! Retrieved data reaches the synthesizer as text, never as structured rows.

use crate::db::{RetrievedCommit, SqlRow};

/// Sentinel shared by every strategy when nothing matched
pub const NO_RESULTS: &str = "No results found.";

/// Maximum number of tabular rows shown to the model
pub const MAX_DISPLAY_ROWS: usize = 50;

/// Render tabular rows, one `Row i: k=v, ...` line each
pub fn render_rows(rows: &[SqlRow]) -> String {
    if rows.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut out = String::new();
    for (i, row) in rows.iter().take(MAX_DISPLAY_ROWS).enumerate() {
        out.push_str(&format!("Row {}: {}\n", i + 1, row.render()));
    }

    if rows.len() > MAX_DISPLAY_ROWS {
        out.push_str(&format!("... ({} more rows)\n", rows.len() - MAX_DISPLAY_ROWS));
    }

    out
}

/// Render vector-ranked commits as a numbered block
pub fn format_commits(commits: &[RetrievedCommit]) -> String {
    if commits.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut out = format!("Found {} relevant commits:\n\n", commits.len());

    for (i, commit) in commits.iter().enumerate() {
        let date = commit
            .committed_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let score = commit
            .score
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "n/a".to_string());

        out.push_str(&format!("[{}] Commit: {}\n", i + 1, commit.commit_hash));
        out.push_str(&format!("    Author: {}\n", commit.author));
        out.push_str(&format!("    Date: {}\n", date));
        out.push_str(&format!("    Message: {}\n", commit.message));
        out.push_str(&format!(
            "    Summary: {}\n",
            commit.summary_text.as_deref().unwrap_or("n/a")
        ));

        if let Some(feedback) = commit.feedback.as_deref().filter(|f| !f.is_empty()) {
            out.push_str(&format!("    Feedback: {}\n", feedback));
        }

        out.push_str(&format!("    Relevance Score: {}\n\n", score));
    }

    out
}
