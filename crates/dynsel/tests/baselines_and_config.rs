//! Integration tests for the static baselines and configuration handling.

mod common;

use common::{binary_data, binary_pool, line_fixture};
use dynsel::config::load_config;
use dynsel::selection::{DcsSelection, DesMode};
use dynsel::{
    DsConfig, DsError, EnsembleClassifier, Oracle, SelectorConfig, SingleBest, StaticSelection,
    TechniqueKind,
};
use ndarray::Array2;

// ---------------------------------------------------------------------------
// Static baselines
// ---------------------------------------------------------------------------

#[test]
fn single_best_uses_the_most_accurate_member() {
    let (pool, x, y) = line_fixture();
    let mut single = SingleBest::new(pool.clone());
    assert!(matches!(single.predict(&x), Err(DsError::NotFitted(_))));

    single.fit(&x, &y).unwrap();
    assert_eq!(single.best(), Some(0));
    assert_eq!(single.predict(&x).unwrap(), y);
    assert_eq!(single.score(&x, &y).unwrap(), 1.0);
    assert_eq!(
        single.predict_proba(&x).unwrap(),
        pool.predict_proba_one(0, x.view()).unwrap()
    );
}

#[test]
fn static_selection_keeps_the_top_fraction() {
    let (pool, x, y) = line_fixture();
    let mut half = StaticSelection::new(pool.clone(), 0.5).unwrap();
    half.fit(&x, &y).unwrap();
    // 3 * 0.5 truncates to one classifier
    assert_eq!(half.selected(), Some(&[0][..]));

    let mut all = StaticSelection::new(pool, 1.0).unwrap();
    all.fit(&x, &y).unwrap();
    // stumps 1 and 2 tie at 0.75 and keep pool order
    assert_eq!(all.selected(), Some(&[0, 1, 2][..]));
    assert_eq!(all.predict(&x).unwrap(), y);

    let proba = all.predict_proba(&x).unwrap();
    for row in proba.rows() {
        assert!((row.sum() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn static_selection_rejects_bad_fractions() {
    let (pool, _, _) = line_fixture();
    assert!(StaticSelection::new(pool.clone(), 0.0).is_err());
    assert!(StaticSelection::new(pool, 1.5).is_err());
}

#[test]
fn oracle_is_right_whenever_anyone_is() {
    let (x, y) = binary_data(100, 61);
    let pool = binary_pool();
    let oracle = Oracle::new(pool.clone());
    let predicted = oracle.predict(&x, &y).unwrap();
    let predictions = pool.predict_all(x.view()).unwrap();
    for (row, &label) in predicted.iter().enumerate() {
        let target = pool.class_index(y[row]).unwrap();
        let anyone = predictions.row(row).iter().any(|&p| p == target);
        assert_eq!(label == y[row], anyone);
    }

    let mut single = SingleBest::new(pool);
    single.fit(&x, &y).unwrap();
    assert!(oracle.score(&x, &y).unwrap() >= single.score(&x, &y).unwrap());
    assert_eq!(oracle.predict_proba(&x, &y).unwrap().dim(), (100, 2));
}

#[test]
fn baselines_reject_queries_of_another_width() {
    let (x, y) = binary_data(60, 62);
    let narrow = Array2::<f64>::zeros((4, 1));

    let mut single = SingleBest::new(binary_pool());
    single.fit(&x, &y).unwrap();
    assert!(matches!(
        single.predict(&narrow),
        Err(DsError::DimensionMismatch { expected: 2, actual: 1, .. })
    ));
    assert!(matches!(
        single.predict_proba(&narrow),
        Err(DsError::DimensionMismatch { .. })
    ));

    let (pool, x_line, y_line) = line_fixture();
    let wide = Array2::<f64>::zeros((3, 5));
    let mut all = StaticSelection::new(pool, 1.0).unwrap();
    all.fit(&x_line, &y_line).unwrap();
    assert!(matches!(
        all.predict(&wide),
        Err(DsError::DimensionMismatch { expected: 1, actual: 5, .. })
    ));
    assert!(matches!(
        all.predict_proba(&wide),
        Err(DsError::DimensionMismatch { .. })
    ));

    let mut oracle = Oracle::new(binary_pool());
    oracle.fit(&x, &y).unwrap();
    assert!(matches!(
        oracle.predict(&narrow, &[0, 1, 0, 1]),
        Err(DsError::DimensionMismatch { expected: 2, actual: 1, .. })
    ));
    assert!(oracle.score(&x, &y).unwrap() > 0.0);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn selector_config_round_trips_through_json() {
    let config = SelectorConfig::new(
        DsConfig {
            dfp: true,
            safe_k: Some(5),
            ..DsConfig::with_k(9)
        },
        TechniqueKind::MetaDes {
            kp: 3,
            hc: 0.8,
            selection_threshold: 0.4,
            mode: DesMode::Hybrid,
        },
    );
    let json = serde_json::to_string(&config).unwrap();
    let back: SelectorConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, back);
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let json = r#"{ "ds": { "k": 3 }, "technique": { "ola": { "selection": "random", "diff_thresh": 0.2 } } }"#;
    let config: SelectorConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.ds.k, 3);
    assert_eq!(config.ds.safe_k(), 3);
    assert!(!config.ds.dfp);
    assert_eq!(
        config.technique,
        TechniqueKind::Ola {
            selection: DcsSelection::Random,
            diff_thresh: 0.2
        }
    );
}

#[test]
fn load_config_reads_and_validates_files() {
    let dir = std::env::temp_dir();
    let good = dir.join(format!("dynsel-config-{}.json", std::process::id()));
    std::fs::write(&good, r#"{ "ds": { "k": 5, "dfp": true }, "technique": { "knora_e": {} } }"#).unwrap();
    let config = load_config(&good).unwrap();
    assert_eq!(config.ds.k, 5);
    assert_eq!(config.technique, TechniqueKind::KnoraE {});

    let bad = dir.join(format!("dynsel-bad-config-{}.json", std::process::id()));
    std::fs::write(&bad, r#"{ "ds": { "k": 0 } }"#).unwrap();
    let err = load_config(&bad).unwrap_err();
    assert!(err.to_string().contains("Invalid config"));

    assert!(load_config(dir.join("dynsel-missing-config.json")).is_err());
    let _ = std::fs::remove_file(good);
    let _ = std::fs::remove_file(bad);
}
