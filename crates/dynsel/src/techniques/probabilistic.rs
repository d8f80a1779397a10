//! Probabilistic competence: DES-KL.
//!
//! Every DSEL sample carries a source competence per classifier, the
//! normalised KL divergence between the classifier's probability vector
//! and the uniform distribution, signed by whether the classifier got the
//! sample right. A query's competence is the Gaussian-potential weighted
//! mean of the source competences of its region.
use ndarray::{s, Array2, ArrayView1};
use rand::rngs::StdRng;

use super::{Competence, Query, Technique};
use crate::config::DsConfig;
use crate::dsel::CompetenceSet;
use crate::error::{DsError, Result};
use crate::selection::{select_des, DesMode, Selection};

/// `1 - H(p) / ln(C)`: 0 for a uniform vector, 1 for a one-hot one.
pub fn normalized_kl_from_uniform(probabilities: ArrayView1<'_, f64>) -> f64 {
    let n_classes = probabilities.len();
    if n_classes < 2 {
        return 0.0;
    }
    let entropy: f64 = probabilities
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.ln())
        .sum();
    (1.0 - entropy / (n_classes as f64).ln()).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct DesKl {
    selection_threshold: f64,
    mode: DesMode,
    source: Option<Array2<f64>>,
}

impl Default for DesKl {
    fn default() -> Self {
        Self::new(0.0, DesMode::Selection)
    }
}

impl DesKl {
    pub fn new(selection_threshold: f64, mode: DesMode) -> Self {
        Self {
            selection_threshold,
            mode,
            source: None,
        }
    }

    /// Source competence of every (DSEL row, classifier) pair.
    pub fn source_competence(&self) -> Option<&Array2<f64>> {
        self.source.as_ref()
    }
}

impl Technique for DesKl {
    fn name(&self) -> &str {
        "DES-KL"
    }

    fn fit(&mut self, dsel: &CompetenceSet, _config: &DsConfig) -> Result<()> {
        self.source = None;
        if dsel.n_classes() < 2 {
            return Err(DsError::config("DES-KL needs at least two classes"));
        }
        let probabilities = dsel.probabilities();
        let source = Array2::from_shape_fn((dsel.len(), dsel.n_classifiers()), |(row, clf)| {
            let magnitude = normalized_kl_from_uniform(probabilities.slice(s![row, clf, ..]));
            if dsel.is_correct(row, clf) {
                magnitude
            } else {
                -magnitude
            }
        });
        self.source = Some(source);
        Ok(())
    }

    fn estimate_competence(&self, _dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| DsError::NotFitted("DES-KL".to_string()))?;

        let mut potentials: Vec<f64> = query.region.distances().iter().map(|&d| (-d * d).exp()).collect();
        let mut total: f64 = potentials.iter().sum();
        if total <= 0.0 {
            // every neighbor too far for the potential to register
            potentials.iter_mut().for_each(|w| *w = 1.0);
            total = potentials.len() as f64;
        }

        let mut scores = vec![0.0; source.ncols()];
        if total > 0.0 {
            for (&row, &w) in query.region.indices().iter().zip(&potentials) {
                for (score, &value) in scores.iter_mut().zip(source.row(row).iter()) {
                    *score += w * value / total;
                }
            }
        }
        Ok(Competence::new(scores))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], _rng: &mut StdRng) -> Selection {
        select_des(self.mode, &competence.scores, self.selection_threshold, candidates)
    }

    fn uses_probabilities(&self) -> bool {
        true
    }
}
