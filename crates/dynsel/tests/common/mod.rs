//! Shared fixtures: threshold stumps as base classifiers and seeded
//! synthetic data.
#![allow(dead_code)]

use std::sync::Arc;

use dynsel::{BaseClassifier, Pool};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One-feature threshold rule: `above` when `x[feature] >= threshold`,
/// `below` otherwise. Confidence grows with the distance to the threshold
/// and always stays above one half for the predicted class.
#[derive(Debug, Clone)]
pub struct Stump {
    pub feature: usize,
    pub threshold: f64,
    pub below: i64,
    pub above: i64,
    pub classes: Vec<i64>,
}

impl Stump {
    pub fn new(feature: usize, threshold: f64, below: i64, above: i64) -> Self {
        Stump {
            feature,
            threshold,
            below,
            above,
            classes: vec![0, 1],
        }
    }

    pub fn with_classes(mut self, classes: Vec<i64>) -> Self {
        self.classes = classes;
        self
    }

    fn label(&self, value: f64) -> i64 {
        if value >= self.threshold {
            self.above
        } else {
            self.below
        }
    }

    fn confidence(&self, value: f64) -> f64 {
        0.55 + 0.4 * (1.0 - (-(value - self.threshold).abs()).exp())
    }
}

impl BaseClassifier for Stump {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<i64> {
        x.rows().into_iter().map(|row| self.label(row[self.feature])).collect()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let n_classes = self.classes.len();
        let mut proba = Array2::zeros((x.nrows(), n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            let value = row[self.feature];
            let label = self.label(value);
            let confidence = self.confidence(value);
            let rest = (1.0 - confidence) / (n_classes - 1) as f64;
            for (col, &class) in self.classes.iter().enumerate() {
                proba[[i, col]] = if class == label { confidence } else { rest };
            }
        }
        proba
    }

    fn name(&self) -> &str {
        "stump"
    }
}

pub fn pool_of(stumps: Vec<Stump>) -> Pool {
    let classifiers: Vec<Arc<dyn BaseClassifier>> = stumps
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn BaseClassifier>)
        .collect();
    Pool::new(classifiers).expect("valid pool")
}

/// Ten stumps on the two features of [`binary_data`], some of them with
/// inverted output.
pub fn binary_pool() -> Pool {
    let mut stumps = Vec::new();
    for feature in 0..2 {
        for &threshold in &[0.2, 0.35, 0.5, 0.65, 0.8] {
            stumps.push(Stump::new(feature, threshold, 0, 1));
        }
    }
    stumps[3] = Stump::new(0, 0.65, 1, 0);
    stumps[7] = Stump::new(1, 0.5, 1, 0);
    pool_of(stumps)
}

/// Points in the unit square labelled by `x0 + x1 > 1`, with a tenth of the
/// labels flipped.
pub fn binary_data(n: usize, seed: u64) -> (Array2<f64>, Vec<i64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Array2::zeros((n, 2));
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let a: f64 = rng.gen();
        let b: f64 = rng.gen();
        x[[i, 0]] = a;
        x[[i, 1]] = b;
        let mut label = if a + b > 1.0 { 1 } else { 0 };
        if rng.gen_bool(0.1) {
            label = 1 - label;
        }
        y.push(label);
    }
    (x, y)
}

/// Three classes split along the first feature, stumps voting between
/// neighboring classes.
pub fn multiclass_pool() -> Pool {
    let classes = vec![0, 1, 2];
    let stumps = vec![
        Stump::new(0, 0.33, 0, 1).with_classes(classes.clone()),
        Stump::new(0, 0.66, 1, 2).with_classes(classes.clone()),
        Stump::new(0, 0.4, 0, 2).with_classes(classes.clone()),
        Stump::new(1, 0.5, 0, 1).with_classes(classes.clone()),
        Stump::new(0, 0.5, 1, 2).with_classes(classes.clone()),
        Stump::new(1, 0.3, 2, 0).with_classes(classes),
    ];
    pool_of(stumps)
}

pub fn multiclass_data(n: usize, seed: u64) -> (Array2<f64>, Vec<i64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Array2::zeros((n, 2));
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let a: f64 = rng.gen();
        let b: f64 = rng.gen();
        x[[i, 0]] = a;
        x[[i, 1]] = b;
        let label = if a < 0.33 {
            0
        } else if a < 0.66 {
            1
        } else {
            2
        };
        y.push(if rng.gen_bool(0.1) { (label + 1) % 3 } else { label });
    }
    (x, y)
}

/// Four one-dimensional DSEL points `[0, 1, 2, 3]` labelled `[0, 0, 1, 1]`
/// and three stumps:
/// * stump 0 (threshold 1.5) is right everywhere,
/// * stump 1 (threshold 0.5) misses row 1,
/// * stump 2 (threshold 2.5) misses row 2.
pub fn line_fixture() -> (Pool, Array2<f64>, Vec<i64>) {
    let pool = pool_of(vec![
        Stump::new(0, 1.5, 0, 1),
        Stump::new(0, 0.5, 0, 1),
        Stump::new(0, 2.5, 0, 1),
    ]);
    let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).expect("shape");
    (pool, x, vec![0, 0, 1, 1])
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
