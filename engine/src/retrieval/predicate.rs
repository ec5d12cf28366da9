//! WHERE-predicate extraction for hybrid search

/// Predicate used when the statement has no usable filter
pub const TAUTOLOGY: &str = "1=1";

/// Pull the filter out of a SELECT so it can be conjoined to a vector query
///
/// Locates `WHERE` case-insensitively and keeps the text after it, cut at the
/// first following `ORDER BY` or `LIMIT`. A statement without `WHERE`, or
/// with nothing after it, yields `1=1`.
pub fn extract_where_clause(sql: &str) -> String {
    // ASCII uppercasing keeps byte offsets aligned with `sql`
    let upper = sql.to_ascii_uppercase();

    let Some(start) = upper.find("WHERE") else {
        return TAUTOLOGY.to_string();
    };

    let rest = &sql[start + "WHERE".len()..];
    let rest_upper = &upper[start + "WHERE".len()..];

    let end = ["ORDER BY", "LIMIT"]
        .iter()
        .filter_map(|marker| rest_upper.find(marker))
        .min()
        .unwrap_or(rest.len());

    let predicate = rest[..end].trim();
    if predicate.is_empty() {
        TAUTOLOGY.to_string()
    } else {
        predicate.to_string()
    }
}
