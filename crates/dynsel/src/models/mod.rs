//! Ready-made base classifiers for building pools.
#[cfg(feature = "gbdt")]
pub mod gbdt;
