/// Fuzzy/subsequence match: return the character positions in `title`
/// that match `query`, or `None` if not matched.
pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
    subsequence(title, query, |t, q| t.eq_ignore_ascii_case(&q))
}

/// Same as `fuzzy_match_positions` with both sides already lowercased.
pub(super) fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
    subsequence(title_lower, query_lower, |t, q| t == q)
}

/// Greedy left-to-right scan; each query char takes the first match after
/// the previous one.
fn subsequence(title: &str, query: &str, eq: impl Fn(char, char) -> bool) -> Option<Vec<usize>> {
    let mut chars = title.chars().enumerate();
    query
        .chars()
        .map(|q| chars.find(|&(_, t)| eq(t, q)).map(|(i, _)| i))
        .collect()
}
