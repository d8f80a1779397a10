use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{DsError, Result};
use crate::pool::BaseClassifier;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GbdtParams {
    pub learning_rate: f32,
    pub max_depth: u32,
    pub num_boost_round: u32,
    pub debug: bool,
    pub training_optimization_level: u8,
    pub loss_type: String,
}

impl Default for GbdtParams {
    fn default() -> Self {
        GbdtParams {
            learning_rate: 0.1,
            max_depth: 6,
            num_boost_round: 3,
            debug: false,
            training_optimization_level: 2,
            loss_type: "LogLikelyhood".to_string(),
        }
    }
}

/// Binary gradient boosted trees usable as a pool member.
pub struct GbdtClassifier {
    model: GBDT,
    // [negative, positive]
    classes: [i64; 2],
}

impl GbdtClassifier {
    /// Train on `x` / `y`; `y` must contain exactly two distinct labels.
    pub fn fit(params: &GbdtParams, x: ArrayView2<'_, f64>, y: &[i64]) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(DsError::DimensionMismatch {
                what: "training labels",
                expected: x.nrows(),
                actual: y.len(),
            });
        }
        let mut labels = y.to_vec();
        labels.sort_unstable();
        labels.dedup();
        if labels.len() != 2 {
            return Err(DsError::config(format!(
                "GBDT classifier is binary, got classes {:?}",
                labels
            )));
        }
        let classes = [labels[0], labels[1]];

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_shrinkage(params.learning_rate);
        config.set_max_depth(params.max_depth);
        config.set_iterations(params.num_boost_round as usize);
        config.set_debug(params.debug);
        config.set_training_optimization_level(params.training_optimization_level);
        config.set_loss(&params.loss_type);

        let mut gbdt = GBDT::new(&config);
        let mut train_x = DataVec::new();
        for (row, &label) in x.rows().into_iter().zip(y) {
            let target = if label == classes[1] { 1.0 } else { -1.0 };
            train_x.push(Data::new_training_data(to_f32(row.iter()), 1.0, target, None));
        }
        gbdt.fit(&mut train_x);

        Ok(GbdtClassifier {
            model: gbdt,
            classes,
        })
    }

    /// Probability of the positive class for every row.
    fn positive_proba(&self, x: ArrayView2<'_, f64>) -> Vec<f64> {
        let mut test_x = DataVec::new();
        for row in x.rows() {
            test_x.push(Data::new_training_data(to_f32(row.iter()), 1.0, 0.0, None));
        }
        self.model
            .decision_function(&test_x)
            .into_iter()
            .map(|margin| 1.0 / (1.0 + (-2.0 * margin as f64).exp()))
            .collect()
    }
}

fn to_f32<'a, I: Iterator<Item = &'a f64>>(values: I) -> Vec<f32> {
    values.map(|&v| v as f32).collect()
}

impl BaseClassifier for GbdtClassifier {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<i64> {
        self.positive_proba(x)
            .into_iter()
            .map(|p| if p > 0.5 { self.classes[1] } else { self.classes[0] })
            .collect()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let positive = self.positive_proba(x);
        Array2::from_shape_fn((positive.len(), 2), |(row, col)| {
            if col == 1 {
                positive[row]
            } else {
                1.0 - positive[row]
            }
        })
    }

    fn name(&self) -> &str {
        "GBDT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_gbdt_classifier() {
        let x = array![
            [0.1, 1.0],
            [0.4, -1.0],
            [0.6, 1.0],
            [0.9, -1.0],
            [1.2, 1.0],
            [1.5, -1.0],
            [1.8, 1.0],
            [2.1, -1.0],
        ];
        let y = [1, 0, 1, 0, 1, 0, 1, 0];
        let params = GbdtParams {
            num_boost_round: 5,
            ..GbdtParams::default()
        };
        let clf = GbdtClassifier::fit(&params, x.view(), &y).unwrap();

        let proba = clf.predict_proba(x.view());
        assert_eq!(proba.dim(), (8, 2));
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        let predicted = clf.predict(x.view());
        assert!(predicted.iter().all(|p| *p == 0 || *p == 1));
        assert!(GbdtClassifier::fit(&params, x.view(), &[1; 8]).is_err());
    }
}
