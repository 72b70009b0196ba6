use crate::cell::{Cell, MatchReason, MetadataCandidate};

/// Pick the matched candidate of a cell by score.
///
/// The highest-scoring candidate is matched when its score reaches
/// `threshold`; every other candidate is unmatched. Ties go to the earliest
/// candidate. When nothing reaches the threshold, all flags are cleared.
pub fn compute_match(candidates: &[MetadataCandidate], threshold: f64) -> Vec<MetadataCandidate> {
    let best = best_candidate(candidates).filter(|&i| candidates[i].score >= threshold);

    candidates
        .iter()
        .enumerate()
        .map(|(i, m)| MetadataCandidate {
            matched: Some(i) == best,
            ..m.clone()
        })
        .collect()
}

/// Apply `compute_match` to a cell in place and refresh its annotation.
pub fn set_matching_metadata(cell: &mut Cell, threshold: f64) {
    cell.metadata.values = compute_match(&cell.metadata.values, threshold);
    cell.refresh_annotation(MatchReason::Threshold);
}

/// Index of the first candidate with the maximum score.
fn best_candidate(candidates: &[MetadataCandidate]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, m) in candidates.iter().enumerate() {
        if m.score.is_nan() {
            continue;
        }
        match best {
            Some(b) if candidates[b].score >= m.score => {}
            _ => best = Some(i),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(id: &str, score: f64) -> MetadataCandidate {
        MetadataCandidate::new(id, id, score)
    }

    fn matched_ids(values: &[MetadataCandidate]) -> Vec<&str> {
        values.iter().filter(|m| m.matched).map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn highest_above_threshold_wins() {
        let out = compute_match(&[cand("Q1", 0.9), cand("Q2", 0.4)], 0.5);
        assert_eq!(matched_ids(&out), vec!["Q1"]);
    }

    #[test]
    fn nothing_reaches_threshold_clears_all() {
        let mut prev = cand("Q1", 0.3);
        prev.matched = true;
        let out = compute_match(&[prev, cand("Q2", 0.2)], 0.5);
        assert!(matched_ids(&out).is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        let out = compute_match(&[cand("Q1", 0.5)], 0.5);
        assert_eq!(matched_ids(&out), vec!["Q1"]);
    }

    #[test]
    fn ties_go_to_first() {
        let out = compute_match(&[cand("Q1", 0.4), cand("Q2", 0.8), cand("Q3", 0.8)], 0.5);
        assert_eq!(matched_ids(&out), vec!["Q2"]);
    }

    #[test]
    fn previous_match_is_replaced() {
        let mut old = cand("Q2", 0.6);
        old.matched = true;
        let out = compute_match(&[cand("Q1", 0.9), old], 0.5);
        assert_eq!(matched_ids(&out), vec!["Q1"]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(compute_match(&[], 0.0).is_empty());
    }

    #[test]
    fn order_and_fields_preserved() {
        let mut a = cand("Q1", 0.2);
        a.url = "https://example.org/Q1".into();
        let out = compute_match(&[a.clone(), cand("Q2", 0.1)], 0.0);
        assert_eq!(out[0].id, "Q1");
        assert_eq!(out[0].url, a.url);
        assert_eq!(out[1].id, "Q2");
    }
}
