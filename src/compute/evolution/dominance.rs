//! Pareto dominance over minimized objective scores.

use crate::schema::Score;

/// True if `p` dominates `q`: no worse on every objective and strictly
/// better on at least one. All objectives are minimized.
///
/// Scores over different objective lists are incomparable and never
/// dominate one another.
pub fn dominates(p: &Score, q: &Score) -> bool {
    if !p.same_objectives(q) {
        return false;
    }
    let mut strictly_better = false;
    for (pv, qv) in p.values().zip(q.values()) {
        let diff = qv - pv;
        if diff < 0.0 {
            return false;
        }
        if diff > 0.0 {
            strictly_better = true;
        }
    }
    strictly_better
}

/// For each score, whether it survives non-dominated filtering.
///
/// Every score removes all others it dominates from the working set; the
/// survivors form a set with no internal dominance. O(n^2).
pub fn non_dominated_mask(scores: &[&Score]) -> Vec<bool> {
    let mut keep = vec![true; scores.len()];
    for p in scores {
        for (j, q) in scores.iter().enumerate() {
            if keep[j] && dominates(p, q) {
                keep[j] = false;
            }
        }
    }
    keep
}

/// The non-dominated subset of `scores`, in input order.
pub fn non_dominated<'a>(scores: &[&'a Score]) -> Vec<&'a Score> {
    scores
        .iter()
        .zip(non_dominated_mask(scores))
        .filter_map(|(s, k)| k.then_some(*s))
        .collect()
}
