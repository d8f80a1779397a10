//! Dynamic frienemy pruning (DFP) gate and the instance-hardness measure.
//!
//! A region is *safe* when every neighbor shares one label; dynamic
//! selection only runs on unsafe regions, where the pool is additionally
//! pruned to the classifiers that cross the local decision border.
use crate::dsel::CompetenceSet;
use crate::neighbors::Region;

/// True when all neighbors of the region carry the same label.
pub fn is_safe(dsel: &CompetenceSet, region: &Region) -> bool {
    let mut labels = region.indices().iter().map(|&row| dsel.label(row));
    match labels.next() {
        Some(first) => labels.all(|label| label == first),
        None => true,
    }
}

/// Candidate mask for an unsafe region: classifiers that correctly classify
/// neighbors of at least two different classes. Every classifier stays a
/// candidate when none qualifies.
pub fn frienemy_mask(dsel: &CompetenceSet, region: &Region) -> Vec<bool> {
    let n_clf = dsel.n_classifiers();
    let mut mask = vec![false; n_clf];

    for (clf, keep) in mask.iter_mut().enumerate() {
        let mut first_class = None;
        for &row in region.indices() {
            if !dsel.is_correct(row, clf) {
                continue;
            }
            let label = dsel.label(row);
            match first_class {
                None => first_class = Some(label),
                Some(seen) if seen != label => {
                    *keep = true;
                    break;
                }
                Some(_) => {}
            }
        }
    }

    if !mask.iter().any(|&keep| keep) {
        mask.iter_mut().for_each(|keep| *keep = true);
    }
    mask
}

/// Fraction of the region not belonging to its majority label (kDN).
pub fn hardness(dsel: &CompetenceSet, region: &Region) -> f64 {
    if region.is_empty() {
        return 0.0;
    }
    let mut counts = vec![0usize; dsel.n_classes()];
    for &row in region.indices() {
        counts[dsel.label(row)] += 1;
    }
    let majority = counts.iter().copied().max().unwrap_or(0);
    (region.len() - majority) as f64 / region.len() as f64
}
