//! Reciprocal Rank Fusion (RRF) for combining search results.
//!
//! The vector and lexical retrievers score on incomparable scales (cosine
//! similarity vs. term-frequency score), so only their orderings are
//! trusted: each list contributes `1 / (k + rank + 1)` per chunk, with no
//! penalty for appearing in a single list and no renormalization.

use std::collections::HashMap;

use manual_core::SearchHit;

/// Fuse two ranked hit lists into `(chunk_id, fused_score)` pairs, sorted
/// by fused score descending.
///
/// Equal scores fall back to the chunk id's first-seen position across the
/// two input lists, so repeated calls over the same indices are
/// byte-identical.
pub fn reciprocal_rank_fusion(
    vector_hits: &[SearchHit],
    lexical_hits: &[SearchHit],
    k: f32,
) -> Vec<(String, f32)> {
    // chunk_id -> (accumulated score, first-seen order)
    let mut scores: HashMap<&str, (f32, usize)> = HashMap::new();
    let mut seen = 0usize;

    for hit in vector_hits.iter().chain(lexical_hits) {
        let contribution = 1.0 / (k + hit.rank as f32 + 1.0);
        let entry = scores.entry(hit.chunk_id.as_str()).or_insert_with(|| {
            let order = seen;
            seen += 1;
            (0.0, order)
        });
        entry.0 += contribution;
    }

    let mut fused: Vec<(&str, f32, usize)> = scores
        .into_iter()
        .map(|(id, (score, order))| (id, score, order))
        .collect();

    fused.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.2.cmp(&b.2))
    });

    fused
        .into_iter()
        .map(|(id, score, _)| (id.to_string(), score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const K: f32 = 60.0;

    fn hits(ids: &[&str]) -> Vec<SearchHit> {
        ids.iter()
            .enumerate()
            .map(|(rank, id)| SearchHit::new(*id, rank))
            .collect()
    }

    #[test]
    fn test_top_of_both_lists_scores_two_over_k_plus_one() {
        let vector = hits(&["a", "b"]);
        let lexical = hits(&["a", "c"]);

        let fused = reciprocal_rank_fusion(&vector, &lexical, K);

        assert_eq!(fused[0].0, "a");
        assert!((fused[0].1 - 2.0 / (K + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_single_list_rank_zero_scores_one_over_k_plus_one() {
        let vector = hits(&["only_vector"]);
        let lexical: Vec<SearchHit> = Vec::new();

        let fused = reciprocal_rank_fusion(&vector, &lexical, K);

        assert_eq!(fused.len(), 1);
        assert!((fused[0].1 - 1.0 / (K + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_scores_are_insensitive_to_list_order() {
        let vector = hits(&["a", "b", "c"]);
        let lexical = hits(&["c", "d"]);

        let forward = reciprocal_rank_fusion(&vector, &lexical, K);
        let swapped = reciprocal_rank_fusion(&lexical, &vector, K);

        let forward_scores: HashMap<_, _> = forward.into_iter().collect();
        let swapped_scores: HashMap<_, _> = swapped.into_iter().collect();
        assert_eq!(forward_scores, swapped_scores);
    }

    #[test]
    fn test_deterministic_given_fixed_inputs() {
        let vector = hits(&["a", "b", "c", "d"]);
        let lexical = hits(&["c", "a", "e"]);

        let first = reciprocal_rank_fusion(&vector, &lexical, K);
        let second = reciprocal_rank_fusion(&vector, &lexical, K);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tie_breaks_by_first_seen_order() {
        // b and c never co-occur and sit at the same rank, so their fused
        // scores tie exactly; b was seen first (vector list).
        let vector = hits(&["a", "b"]);
        let lexical = hits(&["a", "c"]);

        let fused = reciprocal_rank_fusion(&vector, &lexical, K);

        assert_eq!(fused[1].0, "b");
        assert_eq!(fused[2].0, "c");
        assert_eq!(fused[1].1, fused[2].1);
    }

    #[test]
    fn test_chunk_in_both_lists_outranks_single_list_chunk() {
        let vector = hits(&["solo", "both"]);
        let lexical = hits(&["other", "both"]);

        let fused = reciprocal_rank_fusion(&vector, &lexical, K);

        // both: 2/(k+2) ≈ 0.0323 beats solo/other: 1/(k+1) ≈ 0.0164
        assert_eq!(fused[0].0, "both");
    }
}
