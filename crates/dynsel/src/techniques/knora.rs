//! K-nearest oracles.
use rand::rngs::StdRng;

use super::{correct_counts, local_accuracy, Competence, Query, Technique};
use crate::dsel::CompetenceSet;
use crate::error::Result;
use crate::selection::{candidate_indices, select_des, tied_at_best, DesMode, Selection};

/// KNORA-Eliminate: keep the classifiers that are correct on every
/// neighbor, shrinking the region from the farthest neighbor until some
/// classifier qualifies.
///
/// A classifier survives a region of size `j` exactly when its run of
/// correct answers from the nearest neighbor is at least `j`, so the
/// shrinking loop reduces to picking the longest runs.
#[derive(Debug, Clone, Default)]
pub struct KnoraE;

impl KnoraE {
    pub fn new() -> Self {
        Self
    }
}

impl Technique for KnoraE {
    fn name(&self) -> &str {
        "KNORA-E"
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        let runs = (0..dsel.n_classifiers())
            .map(|clf| {
                query
                    .region
                    .indices()
                    .iter()
                    .take_while(|&&row| dsel.is_correct(row, clf))
                    .count() as f64
            })
            .collect();
        Ok(Competence::with_secondary(runs, local_accuracy(dsel, query.region)))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], _rng: &mut StdRng) -> Selection {
        let members = candidate_indices(candidates);
        let longest = members
            .iter()
            .map(|&idx| competence.scores[idx])
            .fold(0.0, f64::max);
        if longest > 0.0 {
            return Selection::Subset(tied_at_best(&competence.scores, candidates));
        }

        // Nobody is correct even on the nearest neighbor: fall back to the
        // locally most accurate classifiers, then to every candidate.
        if let Some(accuracy) = &competence.secondary {
            let best = members.iter().map(|&idx| accuracy[idx]).fold(0.0, f64::max);
            if best > 0.0 {
                return Selection::Subset(tied_at_best(accuracy, candidates));
            }
        }
        log::trace!("KNORA-E: no locally accurate classifier, using all candidates");
        Selection::Subset(members)
    }
}

/// KNORA-Union: every classifier votes once per neighbor it gets right.
#[derive(Debug, Clone)]
pub struct KnoraU {
    mode: DesMode,
}

impl Default for KnoraU {
    fn default() -> Self {
        Self::new(DesMode::Weighting)
    }
}

impl KnoraU {
    pub fn new(mode: DesMode) -> Self {
        Self { mode }
    }
}

impl Technique for KnoraU {
    fn name(&self) -> &str {
        "KNORA-U"
    }

    fn estimate_competence(&self, dsel: &CompetenceSet, query: &Query<'_>) -> Result<Competence> {
        Ok(Competence::new(correct_counts(dsel, query.region)))
    }

    fn select(&self, competence: &Competence, candidates: &[bool], _rng: &mut StdRng) -> Selection {
        select_des(self.mode, &competence.scores, 0.0, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn knora_e_falls_back_to_local_accuracy() {
        let knora = KnoraE::new();
        let mut rng = StdRng::seed_from_u64(0);
        // nobody right on the nearest neighbor
        let competence = Competence::with_secondary(vec![0.0, 0.0, 0.0], vec![0.4, 0.6, 0.6]);
        assert_eq!(
            knora.select(&competence, &[true; 3], &mut rng),
            Selection::Subset(vec![1, 2])
        );
        let hopeless = Competence::with_secondary(vec![0.0; 3], vec![0.0; 3]);
        assert_eq!(
            knora.select(&hopeless, &[true, false, true], &mut rng),
            Selection::Subset(vec![0, 2])
        );
    }
}
