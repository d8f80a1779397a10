//! Selector policies: turn a competence vector into a selection outcome.
//!
//! Every policy works over a candidate mask (all classifiers unless the
//! frienemy gate pruned some) and never returns an empty selection.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Scores closer than this are treated as tied.
const TIE_TOLERANCE: f64 = 1e-12;

/// How a dynamic classifier selection technique picks its winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DcsSelection {
    /// Highest competence, lowest pool index on ties.
    Best,
    /// Every classifier tied at the highest competence, combined by vote.
    All,
    /// Random choice among the classifiers tied at the highest competence.
    Random,
    /// Random choice among classifiers within `diff_thresh` of the best.
    Diff,
}

/// How a dynamic ensemble selection technique turns competences into an
/// ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesMode {
    /// Threshold the competences, majority vote of the selected.
    Selection,
    /// Weight every candidate by its (non-negative) competence.
    Weighting,
    /// Threshold first, then weight the selected by competence.
    Hybrid,
}

/// Per-query selection outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Single(usize),
    Subset(Vec<usize>),
    /// `(classifier, weight)` pairs, every weight strictly positive.
    Weighted(Vec<(usize, f64)>),
}

impl Selection {
    /// Pool indices taking part in the aggregation.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Selection::Single(idx) => vec![*idx],
            Selection::Subset(indices) => indices.clone(),
            Selection::Weighted(weights) => weights.iter().map(|(idx, _)| *idx).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Selection::Single(_) => 1,
            Selection::Subset(indices) => indices.len(),
            Selection::Weighted(weights) => weights.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sanitize(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

fn is_tied(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= TIE_TOLERANCE
}

/// Indices of the candidate classifiers; all of them if the mask is empty.
pub fn candidate_indices(candidates: &[bool]) -> Vec<usize> {
    let indices: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter_map(|(idx, &keep)| keep.then_some(idx))
        .collect();
    if indices.is_empty() {
        (0..candidates.len()).collect()
    } else {
        indices
    }
}

/// Candidate with the highest score; lowest index wins ties.
pub fn best_index(scores: &[f64], candidates: &[bool]) -> usize {
    let mut best: Option<(usize, f64)> = None;
    for idx in candidate_indices(candidates) {
        let score = sanitize(scores[idx]);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx).unwrap_or(0)
}

/// Candidates whose score ties the best candidate score.
pub fn tied_at_best(scores: &[f64], candidates: &[bool]) -> Vec<usize> {
    let top = sanitize(scores[best_index(scores, candidates)]);
    candidate_indices(candidates)
        .into_iter()
        .filter(|&idx| is_tied(sanitize(scores[idx]), top))
        .collect()
}

/// Single-winner selection of the DCS family.
pub fn select_dcs(
    method: DcsSelection,
    diff_thresh: f64,
    scores: &[f64],
    candidates: &[bool],
    rng: &mut StdRng,
) -> Selection {
    match method {
        DcsSelection::Best => Selection::Single(best_index(scores, candidates)),
        DcsSelection::All => {
            let tied = tied_at_best(scores, candidates);
            if tied.len() == 1 {
                Selection::Single(tied[0])
            } else {
                Selection::Subset(tied)
            }
        }
        DcsSelection::Random => {
            let tied = tied_at_best(scores, candidates);
            Selection::Single(*tied.choose(rng).unwrap_or(&tied[0]))
        }
        DcsSelection::Diff => {
            let best = best_index(scores, candidates);
            let top = sanitize(scores[best]);
            let close: Vec<usize> = candidate_indices(candidates)
                .into_iter()
                .filter(|&idx| {
                    let score = sanitize(scores[idx]);
                    top - score < diff_thresh || is_tied(score, top)
                })
                .collect();
            Selection::Single(*close.choose(rng).unwrap_or(&best))
        }
    }
}

/// Candidates whose score is strictly above `threshold`; the single best
/// candidate when none clears it.
pub fn select_above(scores: &[f64], threshold: f64, candidates: &[bool]) -> Vec<usize> {
    let all = candidate_indices(candidates);
    let selected: Vec<usize> = all
        .iter()
        .copied()
        .filter(|&idx| sanitize(scores[idx]) > threshold)
        .collect();
    if selected.is_empty() {
        vec![best_index(scores, candidates)]
    } else {
        selected
    }
}

/// Positive-competence weights over `members`, or `None` if all are zero.
fn positive_weights(scores: &[f64], members: &[usize]) -> Option<Vec<(usize, f64)>> {
    let weights: Vec<(usize, f64)> = members
        .iter()
        .map(|&idx| (idx, sanitize(scores[idx])))
        .filter(|(_, w)| w.is_finite() && *w > 0.0)
        .collect();
    if weights.is_empty() {
        None
    } else {
        Some(weights)
    }
}

/// Ensemble selection of the DES family.
///
/// An all-zero competence vector falls back to an unweighted vote of the
/// candidates.
pub fn select_des(mode: DesMode, scores: &[f64], threshold: f64, candidates: &[bool]) -> Selection {
    match mode {
        DesMode::Selection => Selection::Subset(select_above(scores, threshold, candidates)),
        DesMode::Weighting => {
            let members = candidate_indices(candidates);
            match positive_weights(scores, &members) {
                Some(weights) => Selection::Weighted(weights),
                None => Selection::Subset(members),
            }
        }
        DesMode::Hybrid => {
            let members = select_above(scores, threshold, candidates);
            match positive_weights(scores, &members) {
                Some(weights) => Selection::Weighted(weights),
                None => Selection::Subset(members),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn best_prefers_lowest_index_on_ties() {
        let scores = [0.2, 0.8, 0.8, 0.1];
        assert_eq!(best_index(&scores, &[true; 4]), 1);
        assert_eq!(best_index(&scores, &[true, false, true, true]), 2);
        assert_eq!(tied_at_best(&scores, &[true; 4]), vec![1, 2]);
    }

    #[test]
    fn nan_scores_never_win() {
        let scores = [f64::NAN, 0.0, -1.0];
        assert_eq!(best_index(&scores, &[true; 3]), 1);
    }

    #[test]
    fn diff_picks_within_threshold() {
        let scores = [0.50, 0.95, 0.90, 0.70];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            match select_dcs(DcsSelection::Diff, 0.1, &scores, &[true; 4], &mut rng) {
                Selection::Single(idx) => assert!(idx == 1 || idx == 2),
                other => panic!("unexpected selection {:?}", other),
            }
        }
    }

    #[test]
    fn all_returns_every_tied_classifier() {
        let scores = [1.0, 0.5, 1.0];
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            select_dcs(DcsSelection::All, 0.1, &scores, &[true; 3], &mut rng),
            Selection::Subset(vec![0, 2])
        );
    }

    #[test]
    fn threshold_falls_back_to_single_best() {
        let scores = [0.0, 0.0, 0.0];
        assert_eq!(select_above(&scores, 0.0, &[true, false, true]), vec![0]);
        assert_eq!(select_above(&[-0.2, -0.1, -0.3], 0.0, &[true; 3]), vec![1]);
        assert_eq!(select_above(&[0.4, 0.1, 0.3], 0.5, &[false, true, true]), vec![2]);
        assert_eq!(select_above(&[0.1, 0.6, 0.9], 0.5, &[true; 3]), vec![1, 2]);
    }

    #[test]
    fn weighting_drops_non_positive_weights() {
        let scores = [3.0, 0.0, 1.0];
        assert_eq!(
            select_des(DesMode::Weighting, &scores, 0.0, &[true; 3]),
            Selection::Weighted(vec![(0, 3.0), (2, 1.0)])
        );
        assert_eq!(
            select_des(DesMode::Weighting, &[0.0, 0.0], 0.0, &[true; 2]),
            Selection::Subset(vec![0, 1])
        );
        assert_eq!(
            select_des(DesMode::Hybrid, &[0.4, 0.6, 0.9], 0.5, &[true; 3]),
            Selection::Weighted(vec![(1, 0.6), (2, 0.9)])
        );
    }
}
