//! Pairwise diversity measures between base classifiers.
//!
//! Every measure is oriented so that larger values mean a more diverse
//! pair, which lets DES-KNN rank classifiers with one comparator.
use serde::{Deserialize, Serialize};

/// Ratio reported when two classifiers disagree but never fail together.
const RATIO_NO_COMMON_ERRORS: f64 = 1.0e10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversityMetric {
    /// Negated fraction of samples both classifiers get wrong.
    DoubleFault,
    /// Negated Yule's Q statistic.
    QStatistic,
    /// Different errors over common errors.
    RatioErrors,
}

impl Default for DiversityMetric {
    fn default() -> Self {
        Self::DoubleFault
    }
}

/// Contingency counts of two classifiers over the same targets:
/// `n11` both correct, `n00` both wrong, `n10` only the first correct,
/// `n01` only the second correct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Agreement {
    n11: usize,
    n10: usize,
    n01: usize,
    n00: usize,
}

impl Agreement {
    fn count(targets: &[usize], first: &[usize], second: &[usize]) -> Self {
        let mut agreement = Agreement::default();
        for ((&y, &a), &b) in targets.iter().zip(first).zip(second) {
            match (a == y, b == y) {
                (true, true) => agreement.n11 += 1,
                (true, false) => agreement.n10 += 1,
                (false, true) => agreement.n01 += 1,
                (false, false) => agreement.n00 += 1,
            }
        }
        agreement
    }

    fn total(&self) -> usize {
        self.n11 + self.n10 + self.n01 + self.n00
    }
}

impl DiversityMetric {
    /// Diversity between two prediction vectors over `targets`.
    pub fn measure(&self, targets: &[usize], first: &[usize], second: &[usize]) -> f64 {
        let a = Agreement::count(targets, first, second);
        match self {
            DiversityMetric::DoubleFault => {
                if a.total() == 0 {
                    0.0
                } else {
                    -(a.n00 as f64) / a.total() as f64
                }
            }
            DiversityMetric::QStatistic => {
                let same = (a.n11 * a.n00) as f64;
                let different = (a.n01 * a.n10) as f64;
                let denom = same + different;
                if denom == 0.0 {
                    0.0
                } else {
                    -(same - different) / denom
                }
            }
            DiversityMetric::RatioErrors => {
                let different = (a.n01 + a.n10) as f64;
                if a.n00 == 0 {
                    if different == 0.0 {
                        0.0
                    } else {
                        RATIO_NO_COMMON_ERRORS
                    }
                } else {
                    different / a.n00 as f64
                }
            }
        }
    }
}

/// Summed diversity of each classifier against every other one.
///
/// `predictions[i]` holds classifier `i`'s predictions aligned with
/// `targets`.
pub fn pairwise_diversity(
    metric: DiversityMetric,
    targets: &[usize],
    predictions: &[Vec<usize>],
) -> Vec<f64> {
    let n = predictions.len();
    let mut diversity = vec![0.0; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let value = metric.measure(targets, &predictions[i], &predictions[j]);
            diversity[i] += value;
            diversity[j] += value;
        }
    }
    diversity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_fault_penalises_common_errors() {
        let y = [0, 0, 1, 1];
        let a = [1, 0, 1, 0];
        let b = [1, 0, 0, 1];
        // both wrong on row 0 only
        assert_eq!(DiversityMetric::DoubleFault.measure(&y, &a, &b), -0.25);
        assert_eq!(DiversityMetric::DoubleFault.measure(&y, &y, &y), 0.0);
    }

    #[test]
    fn q_statistic_is_negated() {
        let y = [0, 0, 0, 0];
        let a = [0, 0, 1, 1];
        // identical classifiers: Q = 1
        assert_eq!(DiversityMetric::QStatistic.measure(&y, &a, &a), -1.0);
        let b = [1, 1, 0, 0];
        // never correct together and never wrong together: Q = -1
        assert_eq!(DiversityMetric::QStatistic.measure(&y, &a, &b), 1.0);
    }

    #[test]
    fn ratio_errors_handles_no_common_errors() {
        let y = [0, 0, 0];
        assert_eq!(DiversityMetric::RatioErrors.measure(&y, &y, &y), 0.0);
        let a = [1, 0, 0];
        assert_eq!(
            DiversityMetric::RatioErrors.measure(&y, &a, &y),
            RATIO_NO_COMMON_ERRORS
        );
        let b = [1, 1, 0];
        // one common error, one different error
        assert_eq!(DiversityMetric::RatioErrors.measure(&y, &a, &b), 1.0);
    }

    #[test]
    fn pairwise_sums_are_symmetric() {
        let y = vec![0, 1, 0, 1];
        let preds = vec![vec![0, 1, 0, 1], vec![1, 1, 0, 0], vec![1, 0, 0, 1]];
        let div = pairwise_diversity(DiversityMetric::DoubleFault, &y, &preds);
        assert_eq!(div.len(), 3);
        // classifier 0 is never wrong, so it never shares an error
        assert_eq!(div[0], 0.0);
        // classifiers 1 and 2 are both wrong on row 0
        assert_eq!(div[1], -0.25);
        assert_eq!(div[2], -0.25);
    }
}
