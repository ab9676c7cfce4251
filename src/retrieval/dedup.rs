//! Candidate deduplication and cross-set merging

use ahash::AHashSet;

use crate::retrieval::Candidate;

/// Deduplicate candidates by id, keeping the highest-scored instance
///
/// Output is sorted non-increasing by `raw_score`; the sort is stable so
/// equal scores keep their first-seen order. Idempotent.
pub fn dedup_candidates(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.raw_score
            .partial_cmp(&a.raw_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut seen: AHashSet<String> = AHashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect()
}

/// Merge several candidate sets into one deduplicated, score-sorted set
///
/// An id appearing in multiple sets survives once, with the
/// highest-scoring occurrence.
pub fn merge_candidate_sets(sets: Vec<Vec<Candidate>>) -> Vec<Candidate> {
    let all: Vec<Candidate> = sets.into_iter().flatten().collect();
    dedup_candidates(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, score: f32) -> Candidate {
        Candidate {
            id: id.to_string(),
            text: format!("text for {id}"),
            raw_score: score,
            source_tag: "test".to_string(),
            origin_query: "q".to_string(),
        }
    }

    #[test]
    fn test_dedup_keeps_highest_score() {
        let candidates = vec![
            candidate("a", 0.7),
            candidate("b", 0.8),
            candidate("a", 0.9),
        ];

        let deduped = dedup_candidates(candidates);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "a");
        assert_eq!(deduped[0].raw_score, 0.9);
        assert_eq!(deduped[1].id, "b");
    }

    #[test]
    fn test_dedup_sorts_descending() {
        let candidates = vec![
            candidate("a", 0.2),
            candidate("b", 0.9),
            candidate("c", 0.5),
        ];

        let deduped = dedup_candidates(candidates);
        let scores: Vec<f32> = deduped.iter().map(|c| c.raw_score).collect();
        assert_eq!(scores, vec![0.9, 0.5, 0.2]);
    }

    #[test]
    fn test_dedup_stable_on_ties() {
        let candidates = vec![
            candidate("first", 0.5),
            candidate("second", 0.5),
            candidate("third", 0.5),
        ];

        let deduped = dedup_candidates(candidates);
        let ids: Vec<&str> = deduped.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dedup_idempotent() {
        let candidates = vec![
            candidate("a", 0.9),
            candidate("b", 0.8),
            candidate("a", 0.7),
        ];

        let once = dedup_candidates(candidates);
        let twice = dedup_candidates(once.clone());

        assert_eq!(once.len(), twice.len());
        for (x, y) in once.iter().zip(twice.iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.raw_score, y.raw_score);
        }
    }

    #[test]
    fn test_merge_keeps_highest_across_sets() {
        let set1 = vec![candidate("A", 0.9), candidate("b", 0.4)];
        let set2 = vec![candidate("A", 0.7), candidate("c", 0.6)];

        let merged = merge_candidate_sets(vec![set1, set2]);

        assert_eq!(merged.len(), 3);
        let a = merged.iter().find(|c| c.id == "A").unwrap();
        assert_eq!(a.raw_score, 0.9);
    }

    #[test]
    fn test_merge_empty_sets() {
        let merged = merge_candidate_sets(vec![Vec::new(), Vec::new()]);
        assert!(merged.is_empty());
    }
}
