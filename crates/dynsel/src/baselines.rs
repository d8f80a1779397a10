//! Static baselines: selections that do not depend on the query.
use ndarray::{s, Array2};

use crate::aggregation::{aggregate, mean_probabilities};
use crate::ensemble::{accuracy, EnsembleClassifier};
use crate::error::{DsError, Result};
use crate::pool::Pool;
use crate::selection::{best_index, Selection};

/// Accuracy of every pool member on labelled data.
fn pool_accuracy(pool: &Pool, x: &Array2<f64>, y: &[i64]) -> Result<Vec<f64>> {
    if x.nrows() != y.len() {
        return Err(DsError::DimensionMismatch {
            what: "DSEL labels",
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    if y.is_empty() {
        return Err(DsError::config("cannot rank classifiers on an empty DSEL"));
    }
    let y = pool.encode_labels(y)?;
    let predictions = pool.predict_all(x.view())?;
    let n = y.len() as f64;
    Ok(predictions
        .columns()
        .into_iter()
        .map(|col| col.iter().zip(&y).filter(|(p, t)| p == t).count() as f64 / n)
        .collect())
}

/// Rejects queries whose width differs from the one seen at fit time.
fn check_width(n_features: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != n_features {
        return Err(DsError::DimensionMismatch {
            what: "query features",
            expected: n_features,
            actual: x.ncols(),
        });
    }
    Ok(())
}

fn decode(pool: &Pool, labels: Vec<usize>) -> Vec<i64> {
    labels.into_iter().map(|idx| pool.label(idx)).collect()
}

/// The pool member with the best DSEL accuracy, chosen once at fit time.
#[derive(Debug, Clone)]
pub struct SingleBest {
    pool: Pool,
    best: Option<(usize, usize)>,
}

impl SingleBest {
    pub fn new(pool: Pool) -> Self {
        Self { pool, best: None }
    }

    pub fn best(&self) -> Option<usize> {
        self.best.map(|(best, _)| best)
    }

    /// The chosen classifier, once `x` has the width seen at fit time.
    fn fitted(&self, x: &Array2<f64>) -> Result<usize> {
        let (best, n_features) = self
            .best
            .ok_or_else(|| DsError::NotFitted("SingleBest".to_string()))?;
        check_width(n_features, x)?;
        Ok(best)
    }
}

impl EnsembleClassifier for SingleBest {
    fn name(&self) -> &str {
        "SingleBest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> Result<()> {
        self.best = None;
        let scores = pool_accuracy(&self.pool, x, y)?;
        let best = best_index(&scores, &vec![true; scores.len()]);
        log::debug!("SingleBest picked classifier {} (accuracy {:.4})", best, scores[best]);
        self.best = Some((best, x.ncols()));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<i64>> {
        let best = self.fitted(x)?;
        Ok(decode(&self.pool, self.pool.predict_one(best, x.view())?))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let best = self.fitted(x)?;
        self.pool.predict_proba_one(best, x.view())
    }

    fn classes(&self) -> &[i64] {
        self.pool.classes()
    }
}

/// A fixed top fraction of the pool ranked by DSEL accuracy, combined by
/// majority vote.
#[derive(Debug, Clone)]
pub struct StaticSelection {
    pool: Pool,
    pct_classifiers: f64,
    selected: Option<Vec<usize>>,
    n_features: usize,
}

impl StaticSelection {
    pub fn new(pool: Pool, pct_classifiers: f64) -> Result<Self> {
        if !(pct_classifiers > 0.0 && pct_classifiers <= 1.0) {
            return Err(DsError::config(format!(
                "pct_classifiers must lie in (0, 1], got {}",
                pct_classifiers
            )));
        }
        Ok(Self {
            pool,
            pct_classifiers,
            selected: None,
            n_features: 0,
        })
    }

    /// Selected pool indices, best first.
    pub fn selected(&self) -> Option<&[usize]> {
        self.selected.as_deref()
    }

    fn fitted(&self, x: &Array2<f64>) -> Result<&[usize]> {
        let selected = self
            .selected
            .as_deref()
            .ok_or_else(|| DsError::NotFitted("StaticSelection".to_string()))?;
        check_width(self.n_features, x)?;
        Ok(selected)
    }
}

impl EnsembleClassifier for StaticSelection {
    fn name(&self) -> &str {
        "StaticSelection"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> Result<()> {
        self.selected = None;
        let scores = pool_accuracy(&self.pool, x, y)?;
        let n_selected = ((scores.len() as f64 * self.pct_classifiers) as usize).max(1);
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(n_selected);
        log::debug!("StaticSelection kept {} of {} classifiers: {:?}", order.len(), scores.len(), order);
        self.selected = Some(order);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<i64>> {
        let selected = Selection::Subset(self.fitted(x)?.to_vec());
        let predictions = self.pool.predict_all(x.view())?;
        let probabilities = self.pool.predict_proba_all(x.view())?;
        let labels = (0..x.nrows())
            .map(|row| {
                aggregate(
                    &selected,
                    predictions.row(row),
                    probabilities.slice(s![row, .., ..]),
                    false,
                )
                .label
            })
            .collect();
        Ok(decode(&self.pool, labels))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let selected = self.fitted(x)?;
        let probabilities = self.pool.predict_proba_all(x.view())?;
        let mut out = Array2::zeros((x.nrows(), self.pool.n_classes()));
        for (row, mut dst) in out.rows_mut().into_iter().enumerate() {
            let mean = mean_probabilities(probabilities.slice(s![row, .., ..]), selected);
            for (d, p) in dst.iter_mut().zip(mean) {
                *d = p;
            }
        }
        Ok(out)
    }

    fn classes(&self) -> &[i64] {
        self.pool.classes()
    }
}

/// Upper-bound reference: a query counts as solved whenever any pool member
/// gets it right. Needs the true labels, so it is not an
/// [`EnsembleClassifier`].
///
/// Fitting is optional and only pins the feature width later queries must
/// match.
#[derive(Debug, Clone)]
pub struct Oracle {
    pool: Pool,
    n_features: Option<usize>,
}

impl Oracle {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            n_features: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> Result<()> {
        self.n_features = None;
        pool_accuracy(&self.pool, x, y)?;
        self.n_features = Some(x.ncols());
        Ok(())
    }

    /// Index of the first classifier correct on each row, or the last
    /// classifier when none is.
    fn chosen(&self, x: &Array2<f64>, y: &[i64]) -> Result<Vec<usize>> {
        if x.nrows() != y.len() {
            return Err(DsError::DimensionMismatch {
                what: "labels",
                expected: x.nrows(),
                actual: y.len(),
            });
        }
        if let Some(n_features) = self.n_features {
            check_width(n_features, x)?;
        }
        let y = self.pool.encode_labels(y)?;
        let predictions = self.pool.predict_all(x.view())?;
        let last = self.pool.len() - 1;
        Ok(predictions
            .rows()
            .into_iter()
            .zip(&y)
            .map(|(row, &target)| row.iter().position(|&p| p == target).unwrap_or(last))
            .collect())
    }

    pub fn predict(&self, x: &Array2<f64>, y: &[i64]) -> Result<Vec<i64>> {
        let chosen = self.chosen(x, y)?;
        let predictions = self.pool.predict_all(x.view())?;
        Ok(chosen
            .into_iter()
            .enumerate()
            .map(|(row, clf)| self.pool.label(predictions[[row, clf]]))
            .collect())
    }

    pub fn predict_proba(&self, x: &Array2<f64>, y: &[i64]) -> Result<Array2<f64>> {
        let chosen = self.chosen(x, y)?;
        let probabilities = self.pool.predict_proba_all(x.view())?;
        Ok(Array2::from_shape_fn((x.nrows(), self.pool.n_classes()), |(row, class)| {
            probabilities[[row, chosen[row], class]]
        }))
    }

    pub fn score(&self, x: &Array2<f64>, y: &[i64]) -> Result<f64> {
        let predicted = self.predict(x, y)?;
        accuracy(&predicted, y)
    }
}
