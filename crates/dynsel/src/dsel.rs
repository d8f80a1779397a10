//! The competence set (DSEL): held-out labeled data, the pool's cached
//! outputs on it and the neighbor index built over its features.
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::config::DsConfig;
use crate::error::{DsError, Result};
use crate::neighbors::{NeighborIndex, Region};
use crate::pool::Pool;

/// Fitted DSEL cache. Rows of every cached array align with DSEL rows and
/// the whole structure is rebuilt on each `fit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetenceSet {
    y: Vec<usize>,
    predictions: Array2<usize>,
    correct: Array2<bool>,
    probabilities: Array3<f64>,
    index: NeighborIndex,
    n_classes: usize,
}

impl CompetenceSet {
    pub fn build(pool: &Pool, x: &Array2<f64>, y: &[i64], config: &DsConfig) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(DsError::DimensionMismatch {
                what: "DSEL labels",
                expected: x.nrows(),
                actual: y.len(),
            });
        }
        if x.nrows() < config.max_k() {
            return Err(DsError::config(format!(
                "DSEL has {} samples, fewer than the neighborhood size {}",
                x.nrows(),
                config.max_k()
            )));
        }

        let y = pool.encode_labels(y)?;
        let predictions = pool.predict_all(x.view())?;
        let probabilities = pool.predict_proba_all(x.view())?;
        let correct = Array2::from_shape_fn(predictions.dim(), |(row, clf)| {
            predictions[[row, clf]] == y[row]
        });

        log::debug!(
            "DSEL cache built: {} samples, {} features, {} classifiers, {} classes",
            x.nrows(),
            x.ncols(),
            pool.len(),
            pool.n_classes()
        );

        Ok(Self {
            y,
            predictions,
            correct,
            probabilities,
            index: NeighborIndex::new(x.to_owned(), config.metric),
            n_classes: pool.n_classes(),
        })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn n_classifiers(&self) -> usize {
        self.predictions.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Feature width of DSEL.
    pub fn dim(&self) -> usize {
        self.index.dim()
    }

    /// True class index of every DSEL row.
    pub fn labels(&self) -> &[usize] {
        &self.y
    }

    pub fn label(&self, row: usize) -> usize {
        self.y[row]
    }

    /// Predicted class index per (row, classifier).
    pub fn predictions(&self) -> &Array2<usize> {
        &self.predictions
    }

    pub fn is_correct(&self, row: usize, clf: usize) -> bool {
        self.correct[[row, clf]]
    }

    pub fn correct(&self) -> &Array2<bool> {
        &self.correct
    }

    /// Probabilities per (row, classifier, class).
    pub fn probabilities(&self) -> &Array3<f64> {
        &self.probabilities
    }

    /// Probability classifier `clf` gave to the true class of `row`.
    pub fn true_class_proba(&self, row: usize, clf: usize) -> f64 {
        self.probabilities[[row, clf, self.y[row]]]
    }

    /// DSEL feature matrix.
    pub fn features(&self) -> &Array2<f64> {
        self.index.points()
    }

    pub fn index(&self) -> &NeighborIndex {
        &self.index
    }

    pub fn region(&self, point: ArrayView1<'_, f64>, k: usize) -> Region {
        self.index.query(point, k)
    }

    /// Leave-one-out region of a DSEL row.
    pub fn region_of_row(&self, row: usize, point: ArrayView1<'_, f64>, k: usize) -> Region {
        self.index.query_excluding(point, k, row)
    }

    /// Accuracy of every classifier over the whole DSEL.
    pub fn accuracy(&self) -> Vec<f64> {
        let n = self.len().max(1) as f64;
        self.correct
            .columns()
            .into_iter()
            .map(|col| col.iter().filter(|&&c| c).count() as f64 / n)
            .collect()
    }

    /// Output profiles: each row is the concatenation of every classifier's
    /// probability vector for that DSEL sample.
    pub fn output_profiles(&self) -> Array2<f64> {
        let (n, m, c) = self.probabilities.dim();
        Array2::from_shape_fn((n, m * c), |(row, col)| {
            self.probabilities[[row, col / c, col % c]]
        })
    }
}

/// Flatten a `(n_classifiers, n_classes)` probability block into an output
/// profile comparable with [`CompetenceSet::output_profiles`].
pub fn output_profile(probabilities: ArrayView2<'_, f64>) -> Array1<f64> {
    probabilities.iter().copied().collect()
}
