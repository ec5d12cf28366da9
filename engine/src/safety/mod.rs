//! Lexical screening for model-generated SQL
//!
//! Every SQL string that originates from the planner passes through
//! [`SqlSafetyGate`] before it reaches the tool-call proxy or the database.
//! The check is purely lexical and never parses the statement:
//! - the uppercased text must not contain any forbidden keyword as a substring
//! - the trimmed uppercased text must start with `SELECT` or `WITH`
//!
//! Substring matching rejects identifiers such as `update_count`, and it does
//! not see statement chaining or comments. The database layer runs every
//! statement in a read-only transaction, which is the backstop for both.
//!
//! # Example
//!
//! ```
//! use commitlens_engine::safety::SqlSafetyGate;
//!
//! let gate = SqlSafetyGate::new();
//! assert!(gate.is_safe("SELECT * FROM commit"));
//! assert!(!gate.is_safe("DROP TABLE commit"));
//! ```

/// Keywords that may not appear anywhere in the statement
pub const FORBIDDEN_KEYWORDS: [&str; 7] = [
    "DROP", "DELETE", "TRUNCATE", "ALTER", "CREATE", "INSERT", "UPDATE",
];

/// Statement prefixes accepted as read queries
pub const ALLOWED_PREFIXES: [&str; 2] = ["SELECT", "WITH"];

/// Why a statement was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyViolation {
    /// A forbidden keyword was found at this byte offset of the uppercased text
    ForbiddenKeyword { keyword: &'static str, position: usize },

    /// The statement does not start with an allowed prefix
    NotAReadQuery,
}

impl std::fmt::Display for SafetyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyViolation::ForbiddenKeyword { keyword, position } => {
                write!(f, "forbidden keyword {} at position {}", keyword, position)
            }
            SafetyViolation::NotAReadQuery => write!(f, "statement is not a SELECT or WITH query"),
        }
    }
}

/// Allow/deny check for planner-supplied SQL
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlSafetyGate;

impl SqlSafetyGate {
    pub fn new() -> Self {
        Self
    }

    /// Inspect a statement and report the first violation found
    pub fn check(&self, sql: &str) -> Option<SafetyViolation> {
        let upper = sql.to_ascii_uppercase();

        for keyword in FORBIDDEN_KEYWORDS {
            if let Some(position) = upper.find(keyword) {
                return Some(SafetyViolation::ForbiddenKeyword { keyword, position });
            }
        }

        let trimmed = upper.trim();
        if !ALLOWED_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            return Some(SafetyViolation::NotAReadQuery);
        }

        None
    }

    /// Whether the statement may be executed
    pub fn is_safe(&self, sql: &str) -> bool {
        match self.check(sql) {
            None => true,
            Some(violation) => {
                tracing::warn!("Rejected SQL: {}", violation);
                false
            }
        }
    }
}
