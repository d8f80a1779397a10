//! META-DES: competence predicted by a meta-classifier trained on DSEL.
//!
//! Each (instance, classifier) pair is described by five meta-feature
//! groups:
//!
//! * `f1` correctness on the `k` nearest neighbors,
//! * `f2` probability given to the true class of those neighbors,
//! * `f3` local accuracy over them,
//! * `f4` correctness on the `kp` nearest output profiles,
//! * `f5` confidence, the largest class probability on the instance.
//!
//! The meta-classifier learns to map these to "the classifier is correct".
use ndarray::{s, Array2, ArrayView2};
use rand::rngs::StdRng;
use rayon::prelude::*;

use super::{Competence, Query, Technique};
use crate::config::DsConfig;
use crate::dsel::{output_profile, CompetenceSet};
use crate::error::{DsError, Result};
use crate::meta::{MetaClassifier, MultinomialNb};
use crate::neighbors::{NeighborIndex, Region};
use crate::selection::{select_des, DesMode, Selection};

pub struct MetaDes {
    kp: usize,
    hc: f64,
    selection_threshold: f64,
    mode: DesMode,
    meta: Box<dyn MetaClassifier>,
    k: usize,
    profiles: Option<NeighborIndex>,
}

impl std::fmt::Debug for MetaDes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaDes")
            .field("kp", &self.kp)
            .field("hc", &self.hc)
            .field("selection_threshold", &self.selection_threshold)
            .field("mode", &self.mode)
            .field("meta", &self.meta.name())
            .field("fitted", &self.profiles.is_some())
            .finish()
    }
}

impl Default for MetaDes {
    fn default() -> Self {
        Self::new(5, 1.0, 0.5, DesMode::Selection)
    }
}

impl MetaDes {
    pub fn new(kp: usize, hc: f64, selection_threshold: f64, mode: DesMode) -> Self {
        Self {
            kp,
            hc,
            selection_threshold,
            mode,
            meta: Box::new(MultinomialNb::default()),
            k: 0,
            profiles: None,
        }
    }

    /// Replace the default naive Bayes meta-classifier.
    pub fn with_meta_classifier(mut self, meta: Box<dyn MetaClassifier>) -> Self {
        self.meta = meta;
        self
    }

    /// Width of a meta-feature vector.
    pub fn n_meta_features(&self) -> usize {
        2 * self.k + 1 + self.kp + 1
    }

    /// Fraction of the pool voting for the most popular label.
    fn agreement(predictions: &[usize], n_classes: usize) -> f64 {
        let mut counts = vec![0usize; n_classes];
        for &label in predictions {
            counts[label] += 1;
        }
        let top = counts.into_iter().max().unwrap_or(0);
        top as f64 / predictions.len().max(1) as f64
    }

    fn meta_features(
        dsel: &CompetenceSet,
        region: &Region,
        profile_region: &Region,
        probabilities: ArrayView2<'_, f64>,
        clf: usize,
    ) -> Vec<f64> {
        let mut features = Vec::with_capacity(2 * region.len() + profile_region.len() + 2);
        let mut hits = 0.0;
        for &row in region.indices() {
            let correct = dsel.is_correct(row, clf) as u8 as f64;
            hits += correct;
            features.push(correct);
        }
        features.extend(region.indices().iter().map(|&row| dsel.true_class_proba(row, clf)));
        features.push(if region.is_empty() { 0.0 } else { hits / region.len() as f64 });
        features.extend(
            profile_region
                .indices()
                .iter()
                .map(|&row| dsel.is_correct(row, clf) as u8 as f64),
        );
        let confidence = probabilities.row(clf).iter().copied().fold(0.0, f64::max);
        features.push(confidence);
        features
    }

    /// Leave-one-out meta-training set over the DSEL rows whose pool
    /// agreement does not exceed `hc`.
    fn meta_training_set(&self, dsel: &CompetenceSet, profiles: &NeighborIndex) -> Result<(Array2<f64>, Vec<bool>)> {
        let n_clf = dsel.n_classifiers();
        let features = dsel.features();

        let samples: Vec<Vec<(Vec<f64>, bool)>> = (0..dsel.len())
            .into_par_iter()
            .filter(|&row| {
                let predictions: Vec<usize> = dsel.predictions().row(row).to_vec();
                Self::agreement(&predictions, dsel.n_classes()) <= self.hc
            })
            .map(|row| {
                let region = dsel.region_of_row(row, features.row(row), self.k);
                let probabilities = dsel.probabilities().slice(s![row, .., ..]);
                let profile = output_profile(probabilities);
                let profile_region = profiles.query_excluding(profile.view(), self.kp, row);
                (0..n_clf)
                    .map(|clf| {
                        (
                            Self::meta_features(dsel, &region, &profile_region, probabilities, clf),
                            dsel.is_correct(row, clf),
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        let width = self.n_meta_features();
        let rows: Vec<(Vec<f64>, bool)> = samples.into_iter().flatten().collect();
        if rows.is_empty() {
            return Err(DsError::config(format!(
                "no DSEL sample has pool agreement <= {}, META-DES has nothing to train on",
                self.hc
            )));
        }
        let mut x = Array2::zeros((rows.len(), width));
        let mut y = Vec::with_capacity(rows.len());
        for (i, (meta, target)) in rows.into_iter().enumerate() {
            if meta.len() != width {
                return Err(DsError::DimensionMismatch {
                    what: "meta-features",
                    expected: width,
                    actual: meta.len(),
                });
            }
            for (dst, value) in x.row_mut(i).iter_mut().zip(meta) {
                *dst = value;
            }
            y.push(target);
        }
        Ok((x, y))
    }
}

impl Technique for MetaDes {
    fn name(&self) -> &str {
        "META-DES"
    }

    fn fit(&mut self, dsel: &CompetenceSet, config: &DsConfig) -> Result<()> {
        self.profiles = None;
        if self.kp == 0 {
            return Err(DsError::config("META-DES kp must be at least 1"));
        }
        let needed = config.k.max(self.kp) + 1;
        if dsel.len() < needed {
            return Err(DsError::config(format!(
                "META-DES needs at least {} DSEL samples for leave-one-out meta-features, got {}",
                needed,
                dsel.len()
            )));
        }
        self.k = config.k;

        let profiles = NeighborIndex::new(dsel.output_profiles(), config.metric);
        let (x, y) = self.meta_training_set(dsel, &profiles)?;
        log::debug!(
            "META-DES meta-training set: {} rows x {} meta-features ({} competent)",
            x.nrows(),
            x.ncols(),
            y.iter().filter(|&&c| c).count()
        );
        self.meta.fit(&x, &y)?;
        self.profiles = Some(profiles);
        Ok(())
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        let profiles = self
            .profiles
            .as_ref()
            .ok_or_else(|| DsError::NotFitted("META-DES".to_string()))?;
        let profile = output_profile(query.probabilities);
        let profile_region = profiles.query(profile.view(), self.kp);

        let scores = (0..dsel.n_classifiers())
            .map(|clf| -> Result<f64> {
                let meta = Self::meta_features(dsel, query.region, &profile_region, query.probabilities, clf);
                let competence = self.meta.predict_competence(&meta)?;
                if competence.is_finite() {
                    Ok(competence)
                } else {
                    log::warn!(
                        "{} returned a non-finite competence for classifier {}, using 0",
                        self.meta.name(),
                        clf
                    );
                    Ok(0.0)
                }
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(Competence::new(scores))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], _rng: &mut StdRng) -> Selection {
        select_des(self.mode, &competence.scores, self.selection_threshold, candidates)
    }

    fn uses_probabilities(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agreement_is_share_of_majority_label() {
        assert_eq!(MetaDes::agreement(&[0, 0, 1, 0], 2), 0.75);
        assert_eq!(MetaDes::agreement(&[2, 2, 2], 3), 1.0);
    }
}
