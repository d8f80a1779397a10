//! Builds a boxed technique from its configuration.
use crate::config::TechniqueKind;
use crate::techniques::dcs::DcsParams;
use crate::techniques::{
    APosteriori, APriori, DesKl, DesKnn, DesP, KnoraE, KnoraU, Knop, Lca, Mcb, Mla, MetaDes, Ola,
    Rank, Technique,
};

/// Build a boxed technique from its configuration.
pub fn build_technique(kind: &TechniqueKind) -> Box<dyn Technique> {
    match kind.clone() {
        TechniqueKind::Ola {
            selection,
            diff_thresh,
        } => Box::new(Ola::new(DcsParams::new(selection, diff_thresh))),
        TechniqueKind::Lca {
            selection,
            diff_thresh,
        } => Box::new(Lca::new(DcsParams::new(selection, diff_thresh))),
        TechniqueKind::Mla {
            selection,
            diff_thresh,
        } => Box::new(Mla::new(DcsParams::new(selection, diff_thresh))),
        TechniqueKind::Rank {
            selection,
            diff_thresh,
        } => Box::new(Rank::new(DcsParams::new(selection, diff_thresh))),
        TechniqueKind::Mcb {
            selection,
            diff_thresh,
            similarity_threshold,
        } => Box::new(Mcb::new(
            DcsParams::new(selection, diff_thresh),
            similarity_threshold,
        )),
        TechniqueKind::APriori {
            selection,
            diff_thresh,
        } => Box::new(APriori::new(DcsParams::new(selection, diff_thresh))),
        TechniqueKind::APosteriori {
            selection,
            diff_thresh,
        } => Box::new(APosteriori::new(DcsParams::new(selection, diff_thresh))),
        TechniqueKind::KnoraE {} => Box::new(KnoraE::new()),
        TechniqueKind::KnoraU { mode } => Box::new(KnoraU::new(mode)),
        TechniqueKind::DesP { mode } => Box::new(DesP::new(mode)),
        TechniqueKind::DesKnn {
            pct_accuracy,
            pct_diversity,
            more_diverse,
            metric,
        } => Box::new(DesKnn::new(pct_accuracy, pct_diversity, more_diverse, metric)),
        TechniqueKind::Knop { mode } => Box::new(Knop::new(mode)),
        TechniqueKind::MetaDes {
            kp,
            hc,
            selection_threshold,
            mode,
        } => Box::new(MetaDes::new(kp, hc, selection_threshold, mode)),
        TechniqueKind::DesKl {
            selection_threshold,
            mode,
        } => Box::new(DesKl::new(selection_threshold, mode)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_techniques_carry_the_configured_name() {
        for kind in TechniqueKind::all() {
            assert_eq!(build_technique(&kind).name(), kind.name());
        }
    }
}
