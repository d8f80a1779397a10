//! Meta-classifiers used by META-DES to turn meta-features into a
//! competence estimate.
use itertools_num::linspace;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{DsError, Result};

/// A trainable model predicting whether a base classifier is competent for
/// an instance, given the meta-features describing the pair.
pub trait MetaClassifier: Send + Sync {
    /// Fit on meta-feature rows; `y[i]` tells whether the base classifier
    /// was correct on the instance described by row `i`.
    fn fit(&mut self, x: &Array2<f64>, y: &[bool]) -> Result<()>;

    /// Probability that the described base classifier is competent.
    fn predict_competence(&self, features: &[f64]) -> Result<f64>;

    fn name(&self) -> &str {
        "meta-classifier"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NbParams {
    n_features: usize,
    // index 0: incompetent, 1: competent
    class_log_prior: [f64; 2],
    feature_log_prob: [Vec<f64>; 2],
}

/// Multinomial naive Bayes over meta-features digitised into the bins
/// `[0.1, 0.2, ..., 1.0]`, so each feature becomes a count in `0..=10`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNb {
    alpha: f64,
    bins: Vec<f64>,
    params: Option<NbParams>,
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl MultinomialNb {
    /// `alpha` is the additive (Laplace) smoothing parameter.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            bins: linspace(0.1, 1.0, 10).collect(),
            params: None,
        }
    }

    /// Bin index of `value`: the number of bin edges not above it.
    pub fn digitize(&self, value: f64) -> f64 {
        self.bins.iter().filter(|&&edge| edge <= value).count() as f64
    }

    fn joint_log_likelihood(&self, params: &NbParams, features: &[f64]) -> [f64; 2] {
        let mut jll = params.class_log_prior;
        for (j, &value) in features.iter().enumerate() {
            let count = self.digitize(value);
            jll[0] += count * params.feature_log_prob[0][j];
            jll[1] += count * params.feature_log_prob[1][j];
        }
        jll
    }
}

impl MetaClassifier for MultinomialNb {
    fn fit(&mut self, x: &Array2<f64>, y: &[bool]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(DsError::DimensionMismatch {
                what: "meta-training targets",
                expected: x.nrows(),
                actual: y.len(),
            });
        }
        if self.alpha <= 0.0 {
            return Err(DsError::config("naive Bayes smoothing alpha must be positive"));
        }

        let n_features = x.ncols();
        let mut class_count = [0usize; 2];
        let mut feature_count = [vec![0.0; n_features], vec![0.0; n_features]];
        for (row, &competent) in x.rows().into_iter().zip(y) {
            let class = competent as usize;
            class_count[class] += 1;
            for (acc, &value) in feature_count[class].iter_mut().zip(row.iter()) {
                *acc += self.digitize(value);
            }
        }
        if class_count.iter().any(|&c| c == 0) {
            return Err(DsError::config(
                "meta-training set contains a single class, cannot train the meta-classifier",
            ));
        }

        let n = y.len() as f64;
        let class_log_prior = [
            (class_count[0] as f64 / n).ln(),
            (class_count[1] as f64 / n).ln(),
        ];
        let alpha = self.alpha;
        let feature_log_prob = feature_count.map(|counts| {
            let total: f64 = counts.iter().sum::<f64>() + alpha * n_features as f64;
            counts.iter().map(|&c| ((c + alpha) / total).ln()).collect::<Vec<f64>>()
        });

        log::debug!(
            "Naive Bayes meta-classifier fitted on {} rows ({} competent, {} incompetent)",
            y.len(),
            class_count[1],
            class_count[0]
        );

        self.params = Some(NbParams {
            n_features,
            class_log_prior,
            feature_log_prob,
        });
        Ok(())
    }

    fn predict_competence(&self, features: &[f64]) -> Result<f64> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| DsError::NotFitted("MultinomialNb".to_string()))?;
        if features.len() != params.n_features {
            return Err(DsError::DimensionMismatch {
                what: "meta-features",
                expected: params.n_features,
                actual: features.len(),
            });
        }
        let jll = self.joint_log_likelihood(params, features);
        // P(competent) = 1 / (1 + exp(jll0 - jll1))
        Ok(1.0 / (1.0 + (jll[0] - jll[1]).exp()))
    }

    fn name(&self) -> &str {
        "MultinomialNB"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn digitize_matches_bin_edges() {
        let nb = MultinomialNb::default();
        assert_eq!(nb.digitize(0.0), 0.0);
        assert_eq!(nb.digitize(0.05), 0.0);
        assert_eq!(nb.digitize(0.15), 1.0);
        assert_eq!(nb.digitize(0.55), 5.0);
        assert_eq!(nb.digitize(1.0), 10.0);
    }

    #[test]
    fn learns_which_feature_signals_competence() {
        // feature 0 high => competent, feature 1 high => incompetent
        let x = array![
            [1.0, 0.0],
            [0.9, 0.1],
            [0.8, 0.0],
            [0.0, 1.0],
            [0.1, 0.9],
            [0.0, 0.8],
        ];
        let y = [true, true, true, false, false, false];
        let mut nb = MultinomialNb::default();
        nb.fit(&x, &y).unwrap();
        let competent = nb.predict_competence(&[1.0, 0.0]).unwrap();
        let incompetent = nb.predict_competence(&[0.0, 1.0]).unwrap();
        assert!(competent > 0.5, "got {}", competent);
        assert!(incompetent < 0.5, "got {}", incompetent);
    }

    #[test]
    fn single_class_targets_are_rejected() {
        let x = array![[1.0], [0.5]];
        let mut nb = MultinomialNb::default();
        assert!(matches!(nb.fit(&x, &[true, true]), Err(DsError::Configuration(_))));
    }

    #[test]
    fn unfitted_and_wrong_width_errors() {
        let nb = MultinomialNb::default();
        assert!(matches!(nb.predict_competence(&[0.1]), Err(DsError::NotFitted(_))));
        let mut nb = MultinomialNb::default();
        nb.fit(&array![[1.0, 0.0], [0.0, 1.0]], &[true, false]).unwrap();
        assert!(matches!(
            nb.predict_competence(&[0.1]),
            Err(DsError::DimensionMismatch { .. })
        ));
    }
}
