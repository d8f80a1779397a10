//! dynsel: dynamic selection of classifiers and ensembles.
//!
//! Given a pool of already trained classifiers and a held-out competence
//! set (DSEL), a [`DynamicSelector`] decides per query which pool members
//! vote, based on how they behave in the query's neighborhood of DSEL.
//! The techniques (OLA, LCA, MLA, Rank, MCB, A Priori, A Posteriori,
//! KNORA-E, KNORA-U, DES-P, DES-KNN, KNOP, META-DES and DES-KL) are
//! strategies plugged into one shared pipeline; the static baselines live in
//! [`baselines`].
//!
//! The GBDT base classifier in [`models`] sits behind the `gbdt` feature.
pub mod aggregation;
pub mod baselines;
pub mod config;
pub mod dfp;
pub mod diversity;
pub mod dsel;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod factory;
pub mod meta;
pub mod models;
pub mod neighbors;
pub mod pool;
pub mod selection;
pub mod techniques;

pub use baselines::{Oracle, SingleBest, StaticSelection};
pub use config::{load_config, DsConfig, SelectorConfig, TechniqueKind};
pub use engine::{Decision, DynamicSelector, Route};
pub use ensemble::EnsembleClassifier;
pub use error::{DsError, Result};
pub use pool::{BaseClassifier, Pool};
