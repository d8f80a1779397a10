//! Pool adapter over pre-trained base classifiers.
//!
//! The pool never trains anything: it only batches `predict` and
//! `predict_proba` calls over the fitted classifiers and converts labels to
//! dense class indices shared by the rest of the crate.
use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;

use crate::error::{DsError, Result};

/// Contract every base classifier of the pool has to fulfil.
pub trait BaseClassifier: Send + Sync {
    /// Class labels known to the classifier, in the column order used by
    /// `predict_proba`.
    fn classes(&self) -> &[i64];

    /// Predict one label per row of `x`.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<i64>;

    /// Predict class probabilities, shape `(x.nrows(), classes().len())`.
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array2<f64>;

    /// Optional human readable name for the classifier
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Ordered, immutable collection of fitted classifiers sharing one class set.
#[derive(Clone)]
pub struct Pool {
    classifiers: Vec<Arc<dyn BaseClassifier>>,
    classes: Vec<i64>,
    // Per classifier: pool class index of each `predict_proba` column.
    column_map: Vec<Vec<usize>>,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("size", &self.classifiers.len())
            .field("classes", &self.classes)
            .finish()
    }
}

impl Pool {
    pub fn new(classifiers: Vec<Arc<dyn BaseClassifier>>) -> Result<Self> {
        let first = classifiers
            .first()
            .ok_or_else(|| DsError::config("the pool of classifiers is empty"))?;

        let mut classes = first.classes().to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.is_empty() {
            return Err(DsError::config(format!(
                "classifier '{}' reports no classes",
                first.name()
            )));
        }

        let mut column_map = Vec::with_capacity(classifiers.len());
        for (idx, clf) in classifiers.iter().enumerate() {
            let mut own = clf.classes().to_vec();
            own.sort_unstable();
            if own != classes {
                return Err(DsError::config(format!(
                    "classifier {} ('{}') has classes {:?}, expected {:?}",
                    idx,
                    clf.name(),
                    clf.classes(),
                    classes
                )));
            }
            column_map.push(
                clf.classes()
                    .iter()
                    .map(|label| classes.binary_search(label).unwrap_or_default())
                    .collect(),
            );
        }

        log::debug!(
            "Pool created with {} classifiers over classes {:?}",
            classifiers.len(),
            classes
        );

        Ok(Self {
            classifiers,
            classes,
            column_map,
        })
    }

    pub fn from_boxed(classifiers: Vec<Box<dyn BaseClassifier>>) -> Result<Self> {
        Self::new(classifiers.into_iter().map(Arc::from).collect())
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Sorted class labels shared by every classifier.
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn get(&self, idx: usize) -> Option<&Arc<dyn BaseClassifier>> {
        self.classifiers.get(idx)
    }

    pub fn class_index(&self, label: i64) -> Option<usize> {
        self.classes.binary_search(&label).ok()
    }

    pub fn label(&self, class_idx: usize) -> i64 {
        self.classes[class_idx]
    }

    /// Map labels to class indices, failing on labels the pool cannot predict.
    pub fn encode_labels(&self, y: &[i64]) -> Result<Vec<usize>> {
        y.iter()
            .map(|&label| {
                self.class_index(label).ok_or_else(|| {
                    DsError::config(format!(
                        "label {} is not among the pool classes {:?}",
                        label, self.classes
                    ))
                })
            })
            .collect()
    }

    /// Class-index predictions of classifier `idx` for every row of `x`.
    pub fn predict_one(&self, idx: usize, x: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        let clf = self.classifier(idx)?;
        let labels = clf.predict(x);
        if labels.len() != x.nrows() {
            return Err(DsError::config(format!(
                "classifier {} returned {} predictions for {} rows",
                idx,
                labels.len(),
                x.nrows()
            )));
        }
        labels
            .into_iter()
            .map(|label| {
                self.class_index(label).ok_or_else(|| {
                    DsError::config(format!("classifier {} predicted unknown label {}", idx, label))
                })
            })
            .collect()
    }

    /// Probabilities of classifier `idx`, columns in pool class order.
    pub fn predict_proba_one(&self, idx: usize, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let clf = self.classifier(idx)?;
        let expected = (x.nrows(), self.n_classes());
        let proba = clf.predict_proba(x);
        if proba.dim() != expected {
            return Err(DsError::config(format!(
                "classifier {} returned probabilities of shape {:?}, expected {:?}",
                idx,
                proba.dim(),
                expected
            )));
        }
        let mut out = Array2::zeros(expected);
        for (col, &class_idx) in self.column_map[idx].iter().enumerate() {
            out.column_mut(class_idx).assign(&proba.column(col));
        }
        Ok(out)
    }

    /// Class-index predictions of every classifier, shape `(n_rows, n_classifiers)`.
    pub fn predict_all(&self, x: ArrayView2<'_, f64>) -> Result<Array2<usize>> {
        let per_clf: Vec<Vec<usize>> = (0..self.len())
            .into_par_iter()
            .map(|idx| self.predict_one(idx, x))
            .collect::<Result<_>>()?;

        let mut out = Array2::zeros((x.nrows(), self.len()));
        for (clf_idx, labels) in per_clf.iter().enumerate() {
            for (row, &label) in labels.iter().enumerate() {
                out[[row, clf_idx]] = label;
            }
        }
        Ok(out)
    }

    /// Class probabilities of every classifier, shape
    /// `(n_rows, n_classifiers, n_classes)`.
    pub fn predict_proba_all(&self, x: ArrayView2<'_, f64>) -> Result<Array3<f64>> {
        let per_clf: Vec<Array2<f64>> = (0..self.len())
            .into_par_iter()
            .map(|idx| self.predict_proba_one(idx, x))
            .collect::<Result<_>>()?;

        let mut out = Array3::zeros((x.nrows(), self.len(), self.n_classes()));
        for (clf_idx, proba) in per_clf.iter().enumerate() {
            out.index_axis_mut(Axis(1), clf_idx).assign(proba);
        }
        Ok(out)
    }

    fn classifier(&self, idx: usize) -> Result<&Arc<dyn BaseClassifier>> {
        self.classifiers.get(idx).ok_or_else(|| {
            DsError::config(format!(
                "classifier index {} out of range for a pool of {}",
                idx,
                self.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct Constant {
        classes: Vec<i64>,
        label: i64,
    }

    impl BaseClassifier for Constant {
        fn classes(&self) -> &[i64] {
            &self.classes
        }

        fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<i64> {
            vec![self.label; x.nrows()]
        }

        fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
            let mut p = Array2::zeros((x.nrows(), self.classes.len()));
            let col = self.classes.iter().position(|&c| c == self.label).unwrap();
            p.column_mut(col).fill(1.0);
            p
        }
    }

    fn constant(classes: Vec<i64>, label: i64) -> Arc<dyn BaseClassifier> {
        Arc::new(Constant { classes, label })
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(matches!(Pool::new(vec![]), Err(DsError::Configuration(_))));
    }

    #[test]
    fn mismatched_class_sets_are_rejected() {
        let pool = Pool::new(vec![constant(vec![0, 1], 0), constant(vec![0, 2], 0)]);
        assert!(matches!(pool, Err(DsError::Configuration(_))));
    }

    #[test]
    fn probabilities_follow_pool_class_order() {
        let pool = Pool::new(vec![constant(vec![0, 1], 1), constant(vec![1, 0], 1)]).unwrap();
        let x = array![[0.0], [1.0]];
        let proba = pool.predict_proba_all(x.view()).unwrap();
        assert_eq!(proba.dim(), (2, 2, 2));
        for clf in 0..2 {
            assert_eq!(proba[[0, clf, 1]], 1.0);
            assert_eq!(proba[[0, clf, 0]], 0.0);
        }
        let labels = pool.predict_all(x.view()).unwrap();
        assert!(labels.iter().all(|&c| c == 1));
    }

    #[test]
    fn unknown_labels_fail_encoding() {
        let pool = Pool::new(vec![constant(vec![3, 7], 3)]).unwrap();
        assert_eq!(pool.encode_labels(&[7, 3]).unwrap(), vec![1, 0]);
        assert!(pool.encode_labels(&[5]).is_err());
    }
}
