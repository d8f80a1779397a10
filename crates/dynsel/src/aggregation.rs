//! Aggregator: combine the selected classifiers into one prediction.
use ndarray::{ArrayView1, ArrayView2};

use crate::selection::Selection;

/// Final decision for one query: a class index and a probability vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub label: usize,
    pub probabilities: Vec<f64>,
}

/// Index of the largest value; lowest index on ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate() {
        if value > values[best] {
            best = idx;
        }
    }
    best
}

/// Mean probability vector of `members`.
pub fn mean_probabilities(probabilities: ArrayView2<'_, f64>, members: &[usize]) -> Vec<f64> {
    let mut out = vec![0.0; probabilities.ncols()];
    if members.is_empty() {
        return out;
    }
    for &clf in members {
        for (acc, &p) in out.iter_mut().zip(probabilities.row(clf).iter()) {
            *acc += p;
        }
    }
    let n = members.len() as f64;
    out.iter_mut().for_each(|p| *p /= n);
    out
}

/// Weighted mean probability vector, weights renormalized over the
/// selected classifiers.
pub fn weighted_probabilities(probabilities: ArrayView2<'_, f64>, weights: &[(usize, f64)]) -> Vec<f64> {
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 || !total.is_finite() {
        let members: Vec<usize> = weights.iter().map(|(idx, _)| *idx).collect();
        return mean_probabilities(probabilities, &members);
    }
    let mut out = vec![0.0; probabilities.ncols()];
    for &(clf, weight) in weights {
        let w = weight / total;
        for (acc, &p) in out.iter_mut().zip(probabilities.row(clf).iter()) {
            *acc += w * p;
        }
    }
    out
}

/// Hard majority vote of `members`.
///
/// Ties go to the class with the largest summed probability when
/// `proba_tie_break` is set, otherwise (and on a further tie) to the lowest
/// class index.
pub fn majority_vote(
    predictions: ArrayView1<'_, usize>,
    probabilities: ArrayView2<'_, f64>,
    members: &[usize],
    proba_tie_break: bool,
) -> usize {
    let n_classes = probabilities.ncols();
    let mut counts = vec![0usize; n_classes];
    for &clf in members {
        counts[predictions[clf]] += 1;
    }
    let top = counts.iter().copied().max().unwrap_or(0);
    let tied: Vec<usize> = (0..n_classes).filter(|&c| counts[c] == top).collect();
    if tied.len() == 1 || !proba_tie_break {
        return tied[0];
    }

    let summed = mean_probabilities(probabilities, members);
    let mut best = tied[0];
    for &class in &tied[1..] {
        if summed[class] > summed[best] {
            best = class;
        }
    }
    best
}

/// Combine a selection into a vote.
pub fn aggregate(
    selection: &Selection,
    predictions: ArrayView1<'_, usize>,
    probabilities: ArrayView2<'_, f64>,
    proba_tie_break: bool,
) -> Vote {
    match selection {
        Selection::Single(clf) => Vote {
            label: predictions[*clf],
            probabilities: probabilities.row(*clf).to_vec(),
        },
        Selection::Subset(members) => Vote {
            label: majority_vote(predictions, probabilities, members, proba_tie_break),
            probabilities: mean_probabilities(probabilities, members),
        },
        Selection::Weighted(weights) => {
            let proba = weighted_probabilities(probabilities, weights);
            Vote {
                label: argmax(&proba),
                probabilities: proba,
            }
        }
    }
}

/// Plain k-NN vote over neighbor labels; probabilities are label frequencies.
pub fn knn_vote<I>(labels: I, n_classes: usize) -> Vote
where
    I: IntoIterator<Item = usize>,
{
    let mut freq = vec![0.0; n_classes];
    let mut n = 0usize;
    for label in labels {
        freq[label] += 1.0;
        n += 1;
    }
    if n > 0 {
        freq.iter_mut().for_each(|f| *f /= n as f64);
    }
    Vote {
        label: argmax(&freq),
        probabilities: freq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn majority_vote_breaks_ties_on_lowest_class() {
        let preds = array![1usize, 0, 1, 0];
        let proba = array![[0.4, 0.6], [0.9, 0.1], [0.3, 0.7], [0.6, 0.4]];
        assert_eq!(majority_vote(preds.view(), proba.view(), &[0, 1, 2, 3], false), 0);
        // summed probability favours class 0 (2.2 vs 1.8)
        assert_eq!(majority_vote(preds.view(), proba.view(), &[0, 1, 2, 3], true), 0);
        // members 0 and 3: class 1 has 0.6 + 0.4 = 1.0 against 0.4 + 0.6 = 1.0
        assert_eq!(majority_vote(preds.view(), proba.view(), &[0, 3], true), 0);
        assert_eq!(majority_vote(preds.view(), proba.view(), &[0, 2, 3], false), 1);
    }

    #[test]
    fn probability_tie_break_can_pick_higher_class() {
        let preds = array![0usize, 1];
        let proba = array![[0.55, 0.45], [0.05, 0.95]];
        assert_eq!(majority_vote(preds.view(), proba.view(), &[0, 1], true), 1);
        assert_eq!(majority_vote(preds.view(), proba.view(), &[0, 1], false), 0);
    }

    #[test]
    fn weighted_average_is_renormalized() {
        let proba = array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]];
        let p = weighted_probabilities(proba.view(), &[(0, 1.0), (1, 3.0)]);
        assert!((p[0] - 0.25).abs() < 1e-12);
        assert!((p[1] - 0.75).abs() < 1e-12);
        let preds = array![0usize, 1, 0];
        let vote = aggregate(
            &Selection::Weighted(vec![(0, 1.0), (1, 3.0)]),
            preds.view(),
            proba.view(),
            false,
        );
        assert_eq!(vote.label, 1);
    }

    #[test]
    fn knn_vote_frequencies() {
        let vote = knn_vote(vec![2, 2, 0], 3);
        assert_eq!(vote.label, 2);
        assert!((vote.probabilities[2] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(vote.probabilities[1], 0.0);
    }
}
