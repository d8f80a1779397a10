//! The shared dynamic selection pipeline.
//!
//! Per query: unanimous pool shortcut, region of competence, optional
//! instance-hardness routing, optional frienemy gate, then the technique's
//! competence estimate, its selection and the aggregation.
use std::fmt;

use ndarray::{s, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::aggregation::{aggregate, knn_vote, mean_probabilities, Vote};
use crate::config::{DsConfig, SelectorConfig};
use crate::dfp;
use crate::dsel::CompetenceSet;
use crate::ensemble::EnsembleClassifier;
use crate::error::{DsError, Result};
use crate::factory::build_technique;
use crate::pool::Pool;
use crate::selection::Selection;
use crate::techniques::{Query, Technique};

const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// How a query got its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Every pool member predicted the same label.
    Unanimous,
    /// Low instance hardness: k-NN vote over DSEL labels.
    EasyInstance,
    /// DFP found a single-label region: the whole pool votes.
    SafeRegion,
    /// Competence-based selection ran.
    Dynamic,
}

/// Decision trace of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub route: Route,
    /// Classifiers (and weights) that produced the label; `None` when the
    /// label came from DSEL neighbors.
    pub selection: Option<Selection>,
    pub label: i64,
    pub probabilities: Vec<f64>,
}

/// A pool of classifiers, a DSEL cache and a technique composed into one
/// dynamic selection classifier.
pub struct DynamicSelector {
    pool: Pool,
    config: DsConfig,
    technique: Box<dyn Technique>,
    dsel: Option<CompetenceSet>,
}

impl fmt::Debug for DynamicSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicSelector")
            .field("technique", &self.technique.name())
            .field("pool", &self.pool)
            .field("config", &self.config)
            .field("fitted", &self.dsel.is_some())
            .finish()
    }
}

impl DynamicSelector {
    pub fn new(pool: Pool, config: DsConfig, technique: Box<dyn Technique>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            config,
            technique,
            dsel: None,
        })
    }

    pub fn from_config(pool: Pool, config: &SelectorConfig) -> Result<Self> {
        Self::new(pool, config.ds.clone(), build_technique(&config.technique))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn config(&self) -> &DsConfig {
        &self.config
    }

    pub fn technique(&self) -> &dyn Technique {
        self.technique.as_ref()
    }

    /// Fitted DSEL cache, if any.
    pub fn competence_set(&self) -> Option<&CompetenceSet> {
        self.dsel.as_ref()
    }

    fn fitted(&self) -> Result<&CompetenceSet> {
        self.dsel
            .as_ref()
            .ok_or_else(|| DsError::NotFitted(self.technique.name().to_string()))
    }

    /// Run the pipeline over every row of `x` and report how each label
    /// was reached.
    pub fn explain(&self, x: &Array2<f64>) -> Result<Vec<Decision>> {
        let dsel = self.fitted()?;
        if x.ncols() != dsel.dim() {
            return Err(DsError::DimensionMismatch {
                what: "query features",
                expected: dsel.dim(),
                actual: x.ncols(),
            });
        }

        let predictions = self.pool.predict_all(x.view())?;
        let probabilities = self.pool.predict_proba_all(x.view())?;

        (0..x.nrows())
            .into_par_iter()
            .map(|row| {
                self.decide(
                    dsel,
                    row,
                    x.row(row),
                    predictions.row(row),
                    probabilities.slice(s![row, .., ..]),
                )
            })
            .collect()
    }

    fn decide(
        &self,
        dsel: &CompetenceSet,
        row: usize,
        features: ArrayView1<'_, f64>,
        predictions: ArrayView1<'_, usize>,
        probabilities: ArrayView2<'_, f64>,
    ) -> Result<Decision> {
        let n_clf = self.pool.len();
        let everyone: Vec<usize> = (0..n_clf).collect();

        let first = predictions[0];
        if predictions.iter().all(|&label| label == first) {
            log::trace!("query {}: unanimous pool", row);
            return Ok(self.decision(
                Route::Unanimous,
                Some(Selection::Subset(everyone.clone())),
                Vote {
                    label: first,
                    probabilities: mean_probabilities(probabilities, &everyone),
                },
            ));
        }

        let neighborhood = dsel.region(features, self.config.max_k());
        let region = neighborhood.truncated(self.config.k);
        let safe_region = neighborhood.truncated(self.config.safe_k());

        if self.config.with_ih {
            let hardness = dfp::hardness(dsel, &safe_region);
            if hardness < self.config.ih_rate {
                log::trace!("query {}: easy instance (hardness {:.3})", row, hardness);
                let labels = region.indices().iter().map(|&r| dsel.label(r));
                return Ok(self.decision(
                    Route::EasyInstance,
                    None,
                    knn_vote(labels, dsel.n_classes()),
                ));
            }
        }

        let candidates = if self.config.dfp {
            if dfp::is_safe(dsel, &safe_region) {
                log::trace!("query {}: safe region, whole pool votes", row);
                let selection = Selection::Subset(everyone);
                let vote = aggregate(
                    &selection,
                    predictions,
                    probabilities,
                    self.technique.uses_probabilities(),
                );
                return Ok(self.decision(Route::SafeRegion, Some(selection), vote));
            }
            dfp::frienemy_mask(dsel, &safe_region)
        } else {
            vec![true; n_clf]
        };

        let query = Query {
            features: features.reborrow(),
            region: &region,
            predictions: predictions.reborrow(),
            probabilities: probabilities.reborrow(),
        };
        let competence = self.technique.estimate_competence(dsel, &query)?;
        let mut rng = StdRng::seed_from_u64(self.config.random_state ^ (row as u64).wrapping_mul(SEED_MIX));
        let selection = self.technique.select(&competence, &candidates, &mut rng);
        log::trace!("query {}: {} selected {:?}", row, self.technique.name(), selection);

        let vote = aggregate(
            &selection,
            predictions,
            probabilities,
            self.technique.uses_probabilities(),
        );
        Ok(self.decision(Route::Dynamic, Some(selection), vote))
    }

    fn decision(&self, route: Route, selection: Option<Selection>, vote: Vote) -> Decision {
        Decision {
            route,
            selection,
            label: self.pool.label(vote.label),
            probabilities: vote.probabilities,
        }
    }
}

impl EnsembleClassifier for DynamicSelector {
    fn name(&self) -> &str {
        self.technique.name()
    }

    /// Replaces all fitted state; a failed fit leaves the selector unfitted.
    fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> Result<()> {
        self.dsel = None;
        let dsel = CompetenceSet::build(&self.pool, x, y, &self.config)?;
        self.technique.fit(&dsel, &self.config)?;
        log::debug!(
            "{} fitted: {} DSEL samples, pool of {}, k = {}, dfp = {}, with_ih = {}",
            self.technique.name(),
            dsel.len(),
            self.pool.len(),
            self.config.k,
            self.config.dfp,
            self.config.with_ih
        );
        self.dsel = Some(dsel);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<i64>> {
        Ok(self.explain(x)?.into_iter().map(|d| d.label).collect())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let decisions = self.explain(x)?;
        let mut out = Array2::zeros((decisions.len(), self.pool.n_classes()));
        for (mut row, decision) in out.rows_mut().into_iter().zip(&decisions) {
            for (dst, &p) in row.iter_mut().zip(&decision.probabilities) {
                *dst = p;
            }
        }
        Ok(out)
    }

    fn classes(&self) -> &[i64] {
        self.pool.classes()
    }
}
