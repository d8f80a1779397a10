//! Accuracy and diversity based dynamic ensemble selection.
use rand::rngs::StdRng;

use super::{correct_counts, local_accuracy, Competence, Query, Technique};
use crate::config::DsConfig;
use crate::diversity::{pairwise_diversity, DiversityMetric};
use crate::dsel::{output_profile, CompetenceSet};
use crate::error::{DsError, Result};
use crate::neighbors::NeighborIndex;
use crate::selection::{candidate_indices, select_des, DesMode, Selection};

/// DES-Performance: local accuracy measured against a random classifier.
#[derive(Debug, Clone)]
pub struct DesP {
    mode: DesMode,
}

impl Default for DesP {
    fn default() -> Self {
        Self::new(DesMode::Selection)
    }
}

impl DesP {
    pub fn new(mode: DesMode) -> Self {
        Self { mode }
    }
}

impl Technique for DesP {
    fn name(&self) -> &str {
        "DES-P"
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        let random_accuracy = 1.0 / dsel.n_classes() as f64;
        let scores = local_accuracy(dsel, query.region)
            .into_iter()
            .map(|acc| acc - random_accuracy)
            .collect();
        Ok(Competence::new(scores))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], _rng: &mut StdRng) -> Selection {
        select_des(self.mode, &competence.scores, 0.0, candidates)
    }
}

/// DES-KNN: the most accurate classifiers of the region, narrowed down to
/// the most (or least) diverse among them.
#[derive(Debug, Clone)]
pub struct DesKnn {
    pct_accuracy: f64,
    pct_diversity: f64,
    more_diverse: bool,
    metric: DiversityMetric,
    n_accuracy: usize,
    n_diversity: usize,
}

impl Default for DesKnn {
    fn default() -> Self {
        Self::new(0.5, 0.3, true, DiversityMetric::DoubleFault)
    }
}

impl DesKnn {
    pub fn new(pct_accuracy: f64, pct_diversity: f64, more_diverse: bool, metric: DiversityMetric) -> Self {
        Self {
            pct_accuracy,
            pct_diversity,
            more_diverse,
            metric,
            n_accuracy: 0,
            n_diversity: 0,
        }
    }

    /// Classifiers kept after the accuracy and the diversity cut.
    pub fn sizes(&self) -> (usize, usize) {
        (self.n_accuracy, self.n_diversity)
    }
}

impl Technique for DesKnn {
    fn name(&self) -> &str {
        "DES-KNN"
    }

    fn fit(&mut self, dsel: &CompetenceSet, _config: &DsConfig) -> Result<()> {
        let n_clf = dsel.n_classifiers() as f64;
        let n_accuracy = (n_clf * self.pct_accuracy).floor() as usize;
        let n_diversity = (n_clf * self.pct_diversity).ceil() as usize;
        if n_accuracy == 0 || n_diversity == 0 {
            return Err(DsError::config(format!(
                "DES-KNN keeps {} classifiers by accuracy and {} by diversity, both must be positive",
                n_accuracy, n_diversity
            )));
        }
        if n_diversity > n_accuracy {
            return Err(DsError::config(format!(
                "DES-KNN diversity cut ({}) larger than the accuracy cut ({})",
                n_diversity, n_accuracy
            )));
        }
        self.n_accuracy = n_accuracy;
        self.n_diversity = n_diversity;
        Ok(())
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        let targets: Vec<usize> = query.region.indices().iter().map(|&row| dsel.label(row)).collect();
        let per_classifier: Vec<Vec<usize>> = (0..dsel.n_classifiers())
            .map(|clf| {
                query
                    .region
                    .indices()
                    .iter()
                    .map(|&row| dsel.predictions()[[row, clf]])
                    .collect()
            })
            .collect();
        let diversity = pairwise_diversity(self.metric, &targets, &per_classifier);
        Ok(Competence::with_secondary(
            local_accuracy(dsel, query.region),
            diversity,
        ))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], _rng: &mut StdRng) -> Selection {
        let accuracy = &competence.scores;
        let mut members = candidate_indices(candidates);
        // stable: equal accuracy keeps pool order
        members.sort_by(|&a, &b| accuracy[b].total_cmp(&accuracy[a]));
        members.truncate(self.n_accuracy.max(1));

        if let Some(diversity) = &competence.secondary {
            if self.more_diverse {
                members.sort_by(|&a, &b| diversity[b].total_cmp(&diversity[a]));
            } else {
                members.sort_by(|&a, &b| diversity[a].total_cmp(&diversity[b]));
            }
            members.truncate(self.n_diversity.max(1));
        }
        members.sort_unstable();
        Selection::Subset(members)
    }
}

/// K-nearest output profiles: KNORA-U where the region is searched in the
/// space of the pool's probability outputs instead of the feature space.
#[derive(Debug, Clone)]
pub struct Knop {
    mode: DesMode,
    k: usize,
    profiles: Option<NeighborIndex>,
}

impl Default for Knop {
    fn default() -> Self {
        Self::new(DesMode::Weighting)
    }
}

impl Knop {
    pub fn new(mode: DesMode) -> Self {
        Self {
            mode,
            k: 0,
            profiles: None,
        }
    }
}

impl Technique for Knop {
    fn name(&self) -> &str {
        "KNOP"
    }

    fn fit(&mut self, dsel: &CompetenceSet, config: &DsConfig) -> Result<()> {
        self.k = config.k;
        self.profiles = Some(NeighborIndex::new(dsel.output_profiles(), config.metric));
        Ok(())
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        let profiles = self
            .profiles
            .as_ref()
            .ok_or_else(|| DsError::NotFitted("KNOP".to_string()))?;
        let profile = output_profile(query.probabilities);
        let region = profiles.query(profile.view(), self.k);
        Ok(Competence::new(correct_counts(dsel, &region)))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], _rng: &mut StdRng) -> Selection {
        select_des(self.mode, &competence.scores, 0.0, candidates)
    }

    fn uses_probabilities(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn des_knn(more_diverse: bool) -> DesKnn {
        let mut knn = DesKnn::new(0.5, 0.25, more_diverse, DiversityMetric::DoubleFault);
        knn.n_accuracy = 4;
        knn.n_diversity = 2;
        knn
    }

    #[test]
    fn des_knn_cuts_by_accuracy_then_diversity() {
        let mut rng = StdRng::seed_from_u64(0);
        let competence = Competence::with_secondary(
            vec![0.9, 0.1, 0.8, 0.8, 0.2, 0.7, 0.3, 0.1],
            vec![-0.5, 0.0, -0.1, -0.4, 0.0, -0.2, 0.0, 0.0],
        );
        // top four by accuracy: 0, 2, 3, 5
        assert_eq!(
            des_knn(true).select(&competence, &[true; 8], &mut rng),
            Selection::Subset(vec![2, 5])
        );
        assert_eq!(
            des_knn(false).select(&competence, &[true; 8], &mut rng),
            Selection::Subset(vec![0, 3])
        );
    }
}
