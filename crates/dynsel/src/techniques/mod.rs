//! Competence estimators, one strategy per technique.
//!
//! Every technique plugs into the shared pipeline of
//! [`DynamicSelector`](crate::engine::DynamicSelector) through the
//! [`Technique`] trait: the pipeline hands it the query's region of
//! competence and the pool's outputs on the query, the technique scores
//! each classifier and turns the scores into a [`Selection`].
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;

use crate::config::DsConfig;
use crate::dsel::CompetenceSet;
use crate::error::Result;
use crate::neighbors::Region;
use crate::selection::Selection;

pub mod dcs;
pub mod des;
pub mod knora;
pub mod meta_des;
pub mod probabilistic;

pub use dcs::{APosteriori, APriori, Lca, Mcb, Mla, Ola, Rank};
pub use des::{DesKnn, DesP, Knop};
pub use knora::{KnoraE, KnoraU};
pub use meta_des::MetaDes;
pub use probabilistic::DesKl;

/// Distance used in place of zero before inverting distances.
pub(crate) const MIN_DISTANCE: f64 = 1e-10;

/// Everything a technique may look at for one query.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    pub features: ArrayView1<'a, f64>,
    /// Region of competence, `k` nearest DSEL rows.
    pub region: &'a Region,
    /// Predicted class index of every pool member on the query.
    pub predictions: ArrayView1<'a, usize>,
    /// `(n_classifiers, n_classes)` probabilities on the query.
    pub probabilities: ArrayView2<'a, f64>,
}

/// Competence of every pool member for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Competence {
    pub scores: Vec<f64>,
    /// Second signal some selectors need (local accuracy for KNORA-E,
    /// diversity for DES-KNN).
    pub secondary: Option<Vec<f64>>,
}

impl Competence {
    pub fn new(scores: Vec<f64>) -> Self {
        Self {
            scores,
            secondary: None,
        }
    }

    pub fn with_secondary(scores: Vec<f64>, secondary: Vec<f64>) -> Self {
        Self {
            scores,
            secondary: Some(secondary),
        }
    }
}

/// A dynamic selection technique.
pub trait Technique: Send + Sync {
    fn name(&self) -> &str;

    /// Prepare technique state from a freshly built DSEL cache. Called on
    /// every `fit` and must fully replace earlier state.
    fn fit(&mut self, _dsel: &CompetenceSet, _config: &DsConfig) -> Result<()> {
        Ok(())
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence>;

    /// Turn competences into a non-empty selection restricted to
    /// `candidates`.
    fn select(&self, competence: &Competence, candidates: &[bool], rng: &mut StdRng) -> Selection;

    /// Whether vote ties should be broken by summed probabilities.
    fn uses_probabilities(&self) -> bool {
        false
    }
}

/// Fraction of region neighbors each classifier classifies correctly.
pub fn local_accuracy(dsel: &CompetenceSet, region: &Region) -> Vec<f64> {
    correct_counts(dsel, region)
        .into_iter()
        .map(|count| {
            if region.is_empty() {
                0.0
            } else {
                count / region.len() as f64
            }
        })
        .collect()
}

/// Number of region neighbors each classifier classifies correctly.
pub fn correct_counts(dsel: &CompetenceSet, region: &Region) -> Vec<f64> {
    let mut counts = vec![0.0; dsel.n_classifiers()];
    for &row in region.indices() {
        for (clf, count) in counts.iter_mut().enumerate() {
            if dsel.is_correct(row, clf) {
                *count += 1.0;
            }
        }
    }
    counts
}

/// `1 / d` for every neighbor, zero distances clamped to [`MIN_DISTANCE`].
pub(crate) fn inverse_distances(region: &Region) -> Vec<f64> {
    region
        .distances()
        .iter()
        .map(|&d| 1.0 / d.max(MIN_DISTANCE))
        .collect()
}
