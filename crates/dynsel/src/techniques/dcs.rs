//! Dynamic classifier selection: one winner per query.
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{inverse_distances, local_accuracy, Competence, Query, Technique};
use crate::dsel::CompetenceSet;
use crate::error::Result;
use crate::selection::{select_dcs, DcsSelection, Selection};

/// Winner-picking knobs shared by the DCS family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcsParams {
    pub selection: DcsSelection,
    pub diff_thresh: f64,
}

impl DcsParams {
    pub fn new(selection: DcsSelection, diff_thresh: f64) -> Self {
        Self {
            selection,
            diff_thresh,
        }
    }

    fn select(&self, competence: &Competence, candidates: &[bool], rng: &mut StdRng) -> Selection {
        select_dcs(
            self.selection,
            self.diff_thresh,
            &competence.scores,
            candidates,
            rng,
        )
    }
}

impl Default for DcsParams {
    fn default() -> Self {
        Self::new(DcsSelection::Best, 0.1)
    }
}

/// Overall local accuracy.
#[derive(Debug, Clone, Default)]
pub struct Ola {
    params: DcsParams,
}

impl Ola {
    pub fn new(params: DcsParams) -> Self {
        Self { params }
    }
}

impl Technique for Ola {
    fn name(&self) -> &str {
        "OLA"
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        Ok(Competence::new(local_accuracy(dsel, query.region)))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], rng: &mut StdRng) -> Selection {
        self.params.select(competence, candidates, rng)
    }
}

/// Accuracy restricted to the neighbors whose label is the class the
/// classifier predicts for the query, optionally distance weighted.
fn class_restricted_accuracy(dsel: &CompetenceSet, query: &Query<'_>, weighted: bool) -> Vec<f64> {
    let weights = if weighted {
        inverse_distances(query.region)
    } else {
        vec![1.0; query.region.len()]
    };

    (0..dsel.n_classifiers())
        .map(|clf| {
            let predicted = query.predictions[clf];
            let mut hits = 0.0;
            let mut total = 0.0;
            for (&row, &w) in query.region.indices().iter().zip(&weights) {
                if dsel.label(row) != predicted {
                    continue;
                }
                total += w;
                if dsel.is_correct(row, clf) {
                    hits += w;
                }
            }
            if total > 0.0 {
                hits / total
            } else {
                0.0
            }
        })
        .collect()
}

/// Local class accuracy.
#[derive(Debug, Clone, Default)]
pub struct Lca {
    params: DcsParams,
}

impl Lca {
    pub fn new(params: DcsParams) -> Self {
        Self { params }
    }
}

impl Technique for Lca {
    fn name(&self) -> &str {
        "LCA"
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        Ok(Competence::new(class_restricted_accuracy(dsel, query, false)))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], rng: &mut StdRng) -> Selection {
        self.params.select(competence, candidates, rng)
    }
}

/// Modified local accuracy: LCA with neighbors weighted by `1 / d`.
#[derive(Debug, Clone, Default)]
pub struct Mla {
    params: DcsParams,
}

impl Mla {
    pub fn new(params: DcsParams) -> Self {
        Self { params }
    }
}

impl Technique for Mla {
    fn name(&self) -> &str {
        "MLA"
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        Ok(Competence::new(class_restricted_accuracy(dsel, query, true)))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], rng: &mut StdRng) -> Selection {
        self.params.select(competence, candidates, rng)
    }
}

/// Modified classifier rank: length of the run of correctly classified
/// neighbors, nearest first.
#[derive(Debug, Clone, Default)]
pub struct Rank {
    params: DcsParams,
}

impl Rank {
    pub fn new(params: DcsParams) -> Self {
        Self { params }
    }
}

impl Technique for Rank {
    fn name(&self) -> &str {
        "Rank"
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        let scores = (0..dsel.n_classifiers())
            .map(|clf| {
                query
                    .region
                    .indices()
                    .iter()
                    .take_while(|&&row| dsel.is_correct(row, clf))
                    .count() as f64
            })
            .collect();
        Ok(Competence::new(scores))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], rng: &mut StdRng) -> Selection {
        self.params.select(competence, candidates, rng)
    }
}

/// Multiple classifier behaviour: local accuracy over the neighbors whose
/// behaviour knowledge space (the pool's label vector) resembles the
/// query's.
#[derive(Debug, Clone)]
pub struct Mcb {
    params: DcsParams,
    similarity_threshold: f64,
}

impl Default for Mcb {
    fn default() -> Self {
        Self::new(DcsParams::new(DcsSelection::Diff, 0.1), 0.7)
    }
}

impl Mcb {
    pub fn new(params: DcsParams, similarity_threshold: f64) -> Self {
        Self {
            params,
            similarity_threshold,
        }
    }
}

impl Technique for Mcb {
    fn name(&self) -> &str {
        "MCB"
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        let n_clf = dsel.n_classifiers() as f64;
        let similar: Vec<usize> = query
            .region
            .indices()
            .iter()
            .copied()
            .filter(|&row| {
                let matching = dsel
                    .predictions()
                    .row(row)
                    .iter()
                    .zip(query.predictions.iter())
                    .filter(|(a, b)| a == b)
                    .count() as f64;
                matching / n_clf > self.similarity_threshold
            })
            .collect();

        let scores = if similar.is_empty() {
            local_accuracy(dsel, query.region)
        } else {
            (0..dsel.n_classifiers())
                .map(|clf| {
                    let hits = similar.iter().filter(|&&row| dsel.is_correct(row, clf)).count();
                    hits as f64 / similar.len() as f64
                })
                .collect()
        };
        Ok(Competence::new(scores))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], rng: &mut StdRng) -> Selection {
        self.params.select(competence, candidates, rng)
    }
}

/// Distance-weighted mean probability of the true class, optionally
/// restricted to neighbors labelled with the class predicted for the query.
fn weighted_true_class_proba(dsel: &CompetenceSet, query: &Query<'_>, restricted: bool) -> Vec<f64> {
    let weights = inverse_distances(query.region);

    (0..dsel.n_classifiers())
        .map(|clf| {
            let predicted = query.predictions[clf];
            let mut num = 0.0;
            let mut den = 0.0;
            for (&row, &w) in query.region.indices().iter().zip(&weights) {
                if restricted && dsel.label(row) != predicted {
                    continue;
                }
                num += w * dsel.true_class_proba(row, clf);
                den += w;
            }
            if den > 0.0 {
                num / den
            } else {
                0.0
            }
        })
        .collect()
}

/// Probabilistic local accuracy over the whole region.
#[derive(Debug, Clone)]
pub struct APriori {
    params: DcsParams,
}

impl Default for APriori {
    fn default() -> Self {
        Self::new(DcsParams::new(DcsSelection::Diff, 0.1))
    }
}

impl APriori {
    pub fn new(params: DcsParams) -> Self {
        Self { params }
    }
}

impl Technique for APriori {
    fn name(&self) -> &str {
        "A Priori"
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        Ok(Competence::new(weighted_true_class_proba(dsel, query, false)))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], rng: &mut StdRng) -> Selection {
        self.params.select(competence, candidates, rng)
    }

    fn uses_probabilities(&self) -> bool {
        true
    }
}

/// Probabilistic local accuracy given the class predicted for the query.
#[derive(Debug, Clone)]
pub struct APosteriori {
    params: DcsParams,
}

impl Default for APosteriori {
    fn default() -> Self {
        Self::new(DcsParams::new(DcsSelection::Diff, 0.1))
    }
}

impl APosteriori {
    pub fn new(params: DcsParams) -> Self {
        Self { params }
    }
}

impl Technique for APosteriori {
    fn name(&self) -> &str {
        "A Posteriori"
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        Ok(Competence::new(weighted_true_class_proba(dsel, query, true)))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], rng: &mut StdRng) -> Selection {
        self.params.select(competence, candidates, rng)
    }

    fn uses_probabilities(&self) -> bool {
        true
    }
}
