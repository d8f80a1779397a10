use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::diversity::DiversityMetric;
use crate::error::{DsError, Result};
use crate::neighbors::DistanceMetric;
use crate::selection::{DcsSelection, DesMode};

/// Region-of-competence settings shared by every dynamic technique.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DsConfig {
    /// Size of the region of competence.
    pub k: usize,
    /// Enable dynamic frienemy pruning.
    pub dfp: bool,
    /// Neighborhood size inspected by the DFP gate and the hardness
    /// measure. Falls back to `k` when unset.
    pub safe_k: Option<usize>,
    /// Route easy instances (low hardness) to a plain k-NN vote.
    pub with_ih: bool,
    pub ih_rate: f64,
    /// Seed for randomized tie-breaking.
    pub random_state: u64,
    pub metric: DistanceMetric,
}

impl Default for DsConfig {
    fn default() -> Self {
        Self {
            k: 7,
            dfp: false,
            safe_k: None,
            with_ih: false,
            ih_rate: 0.30,
            random_state: 0,
            metric: DistanceMetric::Euclidean,
        }
    }
}

impl DsConfig {
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    pub fn safe_k(&self) -> usize {
        self.safe_k.unwrap_or(self.k)
    }

    /// Largest neighborhood the pipeline asks the index for.
    pub(crate) fn max_k(&self) -> usize {
        self.k.max(self.safe_k())
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(DsError::config("k must be at least 1"));
        }
        if self.safe_k() == 0 {
            return Err(DsError::config("safe_k must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.ih_rate) {
            return Err(DsError::config(format!(
                "ih_rate must lie in [0, 1], got {}",
                self.ih_rate
            )));
        }
        Ok(())
    }
}

/// Supported techniques and their knobs.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TechniqueKind {
    Ola {
        selection: DcsSelection,
        diff_thresh: f64,
    },
    Lca {
        selection: DcsSelection,
        diff_thresh: f64,
    },
    Mla {
        selection: DcsSelection,
        diff_thresh: f64,
    },
    Rank {
        selection: DcsSelection,
        diff_thresh: f64,
    },
    Mcb {
        selection: DcsSelection,
        diff_thresh: f64,
        similarity_threshold: f64,
    },
    APriori {
        selection: DcsSelection,
        diff_thresh: f64,
    },
    APosteriori {
        selection: DcsSelection,
        diff_thresh: f64,
    },
    KnoraE {},
    KnoraU {
        mode: DesMode,
    },
    DesP {
        mode: DesMode,
    },
    DesKnn {
        pct_accuracy: f64,
        pct_diversity: f64,
        more_diverse: bool,
        metric: DiversityMetric,
    },
    Knop {
        mode: DesMode,
    },
    MetaDes {
        kp: usize,
        hc: f64,
        selection_threshold: f64,
        mode: DesMode,
    },
    DesKl {
        selection_threshold: f64,
        mode: DesMode,
    },
}

impl Default for TechniqueKind {
    fn default() -> Self {
        TechniqueKind::KnoraU {
            mode: DesMode::Weighting,
        }
    }
}

impl TechniqueKind {
    /// Display name of the technique.
    pub fn name(&self) -> &'static str {
        match self {
            TechniqueKind::Ola { .. } => "OLA",
            TechniqueKind::Lca { .. } => "LCA",
            TechniqueKind::Mla { .. } => "MLA",
            TechniqueKind::Rank { .. } => "Rank",
            TechniqueKind::Mcb { .. } => "MCB",
            TechniqueKind::APriori { .. } => "A Priori",
            TechniqueKind::APosteriori { .. } => "A Posteriori",
            TechniqueKind::KnoraE { .. } => "KNORA-E",
            TechniqueKind::KnoraU { .. } => "KNORA-U",
            TechniqueKind::DesP { .. } => "DES-P",
            TechniqueKind::DesKnn { .. } => "DES-KNN",
            TechniqueKind::Knop { .. } => "KNOP",
            TechniqueKind::MetaDes { .. } => "META-DES",
            TechniqueKind::DesKl { .. } => "DES-KL",
        }
    }

    /// Every technique with its default knobs.
    pub fn all() -> Vec<TechniqueKind> {
        [
            "ola",
            "lca",
            "mla",
            "rank",
            "mcb",
            "apriori",
            "aposteriori",
            "knorae",
            "knorau",
            "desp",
            "desknn",
            "knop",
            "metades",
            "deskl",
        ]
        .iter()
        .filter_map(|name| name.parse().ok())
        .collect()
    }
}

impl FromStr for TechniqueKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_' && *c != ' ')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "ola" => Ok(TechniqueKind::Ola {
                selection: DcsSelection::Best,
                diff_thresh: 0.1,
            }),
            "lca" => Ok(TechniqueKind::Lca {
                selection: DcsSelection::Best,
                diff_thresh: 0.1,
            }),
            "mla" => Ok(TechniqueKind::Mla {
                selection: DcsSelection::Best,
                diff_thresh: 0.1,
            }),
            "rank" => Ok(TechniqueKind::Rank {
                selection: DcsSelection::Best,
                diff_thresh: 0.1,
            }),
            "mcb" => Ok(TechniqueKind::Mcb {
                selection: DcsSelection::Diff,
                diff_thresh: 0.1,
                similarity_threshold: 0.7,
            }),
            "apriori" => Ok(TechniqueKind::APriori {
                selection: DcsSelection::Diff,
                diff_thresh: 0.1,
            }),
            "aposteriori" => Ok(TechniqueKind::APosteriori {
                selection: DcsSelection::Diff,
                diff_thresh: 0.1,
            }),
            "knorae" => Ok(TechniqueKind::KnoraE {}),
            "knorau" => Ok(TechniqueKind::KnoraU {
                mode: DesMode::Weighting,
            }),
            "desp" => Ok(TechniqueKind::DesP {
                mode: DesMode::Selection,
            }),
            "desknn" => Ok(TechniqueKind::DesKnn {
                pct_accuracy: 0.5,
                pct_diversity: 0.3,
                more_diverse: true,
                metric: DiversityMetric::DoubleFault,
            }),
            "knop" => Ok(TechniqueKind::Knop {
                mode: DesMode::Weighting,
            }),
            "metades" => Ok(TechniqueKind::MetaDes {
                kp: 5,
                hc: 1.0,
                selection_threshold: 0.5,
                mode: DesMode::Selection,
            }),
            "deskl" => Ok(TechniqueKind::DesKl {
                selection_threshold: 0.0,
                mode: DesMode::Selection,
            }),
            _ => Err(format!("Unknown technique: {}", s)),
        }
    }
}

/// Serializable description of a complete dynamic selector.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SelectorConfig {
    pub ds: DsConfig,
    pub technique: TechniqueKind,
}

impl SelectorConfig {
    pub fn new(ds: DsConfig, technique: TechniqueKind) -> Self {
        Self { ds, technique }
    }
}

/// Load a selector configuration from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<SelectorConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: SelectorConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    config
        .ds
        .validate()
        .with_context(|| format!("Invalid config: {}", path.as_ref().display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_k_defaults_to_k() {
        let cfg = DsConfig::with_k(5);
        assert_eq!(cfg.safe_k(), 5);
        let cfg = DsConfig {
            safe_k: Some(9),
            ..DsConfig::with_k(5)
        };
        assert_eq!(cfg.safe_k(), 9);
        assert_eq!(cfg.max_k(), 9);
    }

    #[test]
    fn validate_rejects_zero_k_and_bad_rate() {
        assert!(DsConfig::with_k(0).validate().is_err());
        let cfg = DsConfig {
            ih_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(DsError::Configuration(_))));
        assert!(DsConfig::default().validate().is_ok());
    }

    #[test]
    fn technique_names_parse_loosely() {
        let kind: TechniqueKind = "KNORA-E".parse().unwrap();
        assert_eq!(kind, TechniqueKind::KnoraE {});
        let kind: TechniqueKind = "meta_des".parse().unwrap();
        assert_eq!(kind.name(), "META-DES");
        assert!("random_forest".parse::<TechniqueKind>().is_err());
        assert_eq!(TechniqueKind::all().len(), 14);
    }
}
