//! Dynamic selection over a pool of gradient boosted trees, each trained on
//! a bootstrap sample of the training split.
//!
//! `cargo run --example gbdt_pool --features gbdt`
use std::sync::Arc;

use anyhow::Result;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dynsel::models::gbdt::{GbdtClassifier, GbdtParams};
use dynsel::{
    BaseClassifier, DsConfig, DynamicSelector, EnsembleClassifier, Oracle, Pool, SelectorConfig,
    TechniqueKind,
};

fn make_data(n: usize, rng: &mut StdRng) -> (Array2<f64>, Vec<i64>) {
    let mut x = Array2::zeros((n, 4));
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        for j in 0..4 {
            x[[i, j]] = rng.gen_range(-1.0..1.0);
        }
        let signal = x[[i, 0]] * x[[i, 1]] + 0.5 * x[[i, 2]];
        y.push(if signal + rng.gen_range(-0.2..0.2) > 0.0 { 1 } else { 0 });
    }
    (x, y)
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(7);
    let (x_train, y_train) = make_data(600, &mut rng);
    let (x_dsel, y_dsel) = make_data(300, &mut rng);
    let (x_test, y_test) = make_data(300, &mut rng);

    let params = GbdtParams {
        max_depth: 3,
        num_boost_round: 10,
        ..GbdtParams::default()
    };

    let mut classifiers: Vec<Arc<dyn BaseClassifier>> = Vec::new();
    for _ in 0..10 {
        let rows: Vec<usize> = (0..x_train.nrows()).map(|_| rng.gen_range(0..x_train.nrows())).collect();
        let x_boot = x_train.select(Axis(0), &rows);
        let y_boot: Vec<i64> = rows.iter().map(|&r| y_train[r]).collect();
        classifiers.push(Arc::new(GbdtClassifier::fit(&params, x_boot.view(), &y_boot)?));
    }
    let pool = Pool::new(classifiers)?;

    for name in ["knora-u", "knora-e", "ola", "meta-des", "des-kl"] {
        let technique: TechniqueKind = name.parse().map_err(anyhow::Error::msg)?;
        let config = SelectorConfig::new(
            DsConfig {
                dfp: true,
                ..DsConfig::default()
            },
            technique,
        );
        let mut selector = DynamicSelector::from_config(pool.clone(), &config)?;
        selector.fit(&x_dsel, &y_dsel)?;
        println!("{:<10} {:.4}", selector.name(), selector.score(&x_test, &y_test)?);
    }

    println!("{:<10} {:.4}", "Oracle", Oracle::new(pool).score(&x_test, &y_test)?);
    Ok(())
}
