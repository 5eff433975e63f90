//! Page aggregation.
//!
//! Collapses a ranked chunk list into a deduplicated, score-ordered list
//! of page numbers. Chunks from the same page may appear several times
//! after reranking; only the best representative counts.

use std::collections::HashMap;

use tracing::{info, warn};

use manual_core::{FusedResult, RerankedResult};

/// One scored chunk result, reduced to what aggregation needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageHit {
    pub page_number: u32,
    pub score: f32,
}

impl From<&RerankedResult> for PageHit {
    fn from(result: &RerankedResult) -> Self {
        Self {
            page_number: result.page_number,
            score: result.rerank_score,
        }
    }
}

impl From<&FusedResult> for PageHit {
    fn from(result: &FusedResult) -> Self {
        Self {
            page_number: result.page_number,
            score: result.rrf_score,
        }
    }
}

/// Distinct page numbers ordered by each page's best observed score,
/// descending; ties broken by the page's first appearance in `results`.
pub fn extract_pages(results: &[PageHit], max_pages: usize) -> Vec<u32> {
    if results.is_empty() {
        return Vec::new();
    }

    // page -> (best score, first appearance)
    let mut page_scores: HashMap<u32, (f32, usize)> = HashMap::new();
    for (idx, hit) in results.iter().enumerate() {
        match page_scores.get_mut(&hit.page_number) {
            Some(entry) => {
                if hit.score > entry.0 {
                    entry.0 = hit.score;
                }
            }
            None => {
                page_scores.insert(hit.page_number, (hit.score, idx));
            }
        }
    }

    let mut pages: Vec<(u32, f32, usize)> = page_scores
        .into_iter()
        .map(|(page, (score, first))| (page, score, first))
        .collect();

    pages.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.2.cmp(&b.2))
    });
    pages.truncate(max_pages);

    let pages: Vec<u32> = pages.into_iter().map(|(page, _, _)| page).collect();
    info!(
        "Extracted {} unique pages from {} results",
        pages.len(),
        results.len()
    );
    pages
}

/// Confidence-threshold variant: aggregate only results at or above
/// `threshold`. If nothing clears the threshold, fall back to the
/// unfiltered algorithm rather than returning no pages at all.
pub fn extract_pages_with_confidence(
    results: &[PageHit],
    threshold: f32,
    max_pages: usize,
) -> Vec<u32> {
    if results.is_empty() {
        return Vec::new();
    }

    let confident: Vec<PageHit> = results
        .iter()
        .copied()
        .filter(|hit| hit.score >= threshold)
        .collect();

    if confident.is_empty() {
        warn!(
            "No results above threshold {}, falling back to top {}",
            threshold, max_pages
        );
        return extract_pages(results, max_pages);
    }

    extract_pages(&confident, max_pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(page: u32, score: f32) -> PageHit {
        PageHit {
            page_number: page,
            score,
        }
    }

    #[test]
    fn test_page_keeps_its_best_score() {
        let results = vec![hit(5, 0.9), hit(5, 0.3), hit(2, 0.5)];
        assert_eq!(extract_pages(&results, 2), vec![5, 2]);
    }

    #[test]
    fn test_truncates_to_max_pages() {
        let results = vec![hit(1, 0.9), hit(2, 0.8), hit(3, 0.7), hit(4, 0.6)];
        assert_eq!(extract_pages(&results, 2), vec![1, 2]);
    }

    #[test]
    fn test_ties_break_by_first_appearance() {
        let results = vec![hit(7, 0.5), hit(3, 0.5), hit(9, 0.5)];
        assert_eq!(extract_pages(&results, 3), vec![7, 3, 9]);
    }

    #[test]
    fn test_empty_results_yield_no_pages() {
        assert!(extract_pages(&[], 5).is_empty());
        assert!(extract_pages_with_confidence(&[], 0.5, 5).is_empty());
    }

    #[test]
    fn test_confidence_filter_applies() {
        let results = vec![hit(1, 0.9), hit(2, 0.4), hit(3, 0.8)];
        assert_eq!(extract_pages_with_confidence(&results, 0.6, 5), vec![1, 3]);
    }

    #[test]
    fn test_all_below_threshold_falls_back_to_unfiltered() {
        let results = vec![hit(4, 0.2), hit(8, 0.3)];
        let pages = extract_pages_with_confidence(&results, 0.9, 5);
        assert_eq!(pages, vec![8, 4]);
        assert!(!pages.is_empty());
    }

    #[test]
    fn test_later_chunk_can_raise_a_page_above_an_earlier_one() {
        let results = vec![hit(2, 0.5), hit(5, 0.3), hit(5, 0.9)];
        assert_eq!(extract_pages(&results, 2), vec![5, 2]);
    }
}
