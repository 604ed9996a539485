//! Deduplication of aggregated candidates by release identity.

use std::collections::HashSet;

use super::CandidateResult;

/// Drop repeated releases, keeping the first occurrence of each identity.
///
/// Identity is the source plus the source's unique token (see
/// [`CandidateResult::identity`]). Order of surviving candidates is preserved.
pub fn deduplicate_candidates(raw: Vec<CandidateResult>) -> Vec<CandidateResult> {
    let mut seen: HashSet<(u32, String)> = HashSet::new();
    raw.into_iter()
        .filter(|c| {
            let (indexer, token) = c.identity();
            seen.insert((indexer, token.to_string()))
        })
        .collect()
}
