//! Fuzzy name matching for contact search.

use strsim::normalized_levenshtein;

/// Similarity in `[0, 1]` between a search query and a contact name.
///
/// Both sides are compared case-insensitively. The query is scored against
/// the whole name and against each word of it, and the best score wins, so
/// "jon" finds "John Smith" as readily as "jon smith" does.
#[must_use]
pub fn name_similarity(query: &str, name: &str) -> f64 {
    let query = query.trim().to_lowercase();
    let name = name.trim().to_lowercase();

    if query.is_empty() || name.is_empty() {
        return 0.0;
    }

    let whole = normalized_levenshtein(&query, &name);

    name.split_whitespace()
        .map(|word| normalized_levenshtein(&query, word))
        .fold(whole, f64::max)
}

/// Keeps the candidates scoring at least `threshold`, best first.
/// Ties keep their input order.
pub fn rank_by_name<T>(
    query: &str,
    candidates: impl IntoIterator<Item = T>,
    name_of: impl Fn(&T) -> Option<&str>,
    threshold: f64,
) -> Vec<(T, f64)> {
    let mut ranked: Vec<(T, f64)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let score = name_of(&candidate).map(|name| name_similarity(query, name))?;
            (score >= threshold).then_some((candidate, score))
        })
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
