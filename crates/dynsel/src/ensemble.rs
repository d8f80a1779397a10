//! The fit/predict/score interface shared by every ensemble.
use ndarray::Array2;

use crate::error::{DsError, Result};

/// Common contract of the dynamic selector and the static baselines.
pub trait EnsembleClassifier {
    fn name(&self) -> &str;

    /// Fit on the competence set (DSEL). The pool itself is never retrained.
    fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<i64>>;

    /// `(n_samples, n_classes)` probabilities, columns ordered like
    /// [`EnsembleClassifier::classes`].
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    fn classes(&self) -> &[i64];

    /// Fraction of `predict(x)` matching `y`.
    fn score(&self, x: &Array2<f64>, y: &[i64]) -> Result<f64> {
        let predicted = self.predict(x)?;
        accuracy(&predicted, y)
    }
}

pub fn accuracy(predicted: &[i64], y: &[i64]) -> Result<f64> {
    if predicted.len() != y.len() {
        return Err(DsError::DimensionMismatch {
            what: "labels",
            expected: predicted.len(),
            actual: y.len(),
        });
    }
    if y.is_empty() {
        return Ok(0.0);
    }
    let hits = predicted.iter().zip(y).filter(|(p, t)| p == t).count();
    Ok(hits as f64 / y.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_matches() {
        assert_eq!(accuracy(&[1, 0, 1, 1], &[1, 1, 1, 0]).unwrap(), 0.5);
        assert_eq!(accuracy(&[], &[]).unwrap(), 0.0);
        assert!(matches!(
            accuracy(&[1], &[1, 0]),
            Err(DsError::DimensionMismatch { .. })
        ));
    }
}
