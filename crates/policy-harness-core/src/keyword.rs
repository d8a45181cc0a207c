//! Bag-of-words keyword scoring.
//!
//! The query is lower-cased, stripped of everything except ASCII letters,
//! digits and whitespace, and split on whitespace. A chunk's score is the
//! fraction of query tokens that occur (case-insensitively, as substrings)
//! in its content. Tokens no longer than `min_token_len - 1` characters
//! never match but still count in the denominator.
//!
//! Occurrence counts and token positions do not influence the score.

/// Tokens must be at least this long to count as a match.
pub const DEFAULT_MIN_TOKEN_LEN: usize = 3;

/// Normalize and split a query into keyword tokens.
///
/// ```rust
/// use policy_harness_core::keyword::tokenize_query;
///
/// assert_eq!(tokenize_query("What's the PTO policy?"), vec!["whats", "the", "pto", "policy"]);
/// ```
pub fn tokenize_query(query: &str) -> Vec<String> {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Score `content` against pre-tokenized query terms, in `[0.0, 1.0]`.
pub fn keyword_score(content: &str, tokens: &[String], min_token_len: usize) -> f64 {
    if tokens.is_empty() || content.is_empty() {
        return 0.0;
    }

    let lower = content.to_lowercase();
    let matches = tokens
        .iter()
        .filter(|t| t.chars().count() >= min_token_len && lower.contains(t.as_str()))
        .count();

    matches as f64 / tokens.len() as f64
}
