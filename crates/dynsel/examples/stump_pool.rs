//! Compare every technique on a pool of decision stumps over a noisy
//! two-class problem.
//!
//! Run with `RUST_LOG=debug cargo run --example stump_pool [config.json]`;
//! when a config file is given only that selector is evaluated.
use std::sync::Arc;

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dynsel::{
    load_config, BaseClassifier, DsConfig, DynamicSelector, EnsembleClassifier, Oracle, Pool,
    SelectorConfig, SingleBest, StaticSelection, TechniqueKind,
};

struct Stump {
    feature: usize,
    threshold: f64,
    classes: Vec<i64>,
}

impl BaseClassifier for Stump {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<i64> {
        x.column(self.feature)
            .iter()
            .map(|&v| if v >= self.threshold { 1 } else { 0 })
            .collect()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut proba = Array2::zeros((x.nrows(), 2));
        for (i, &v) in x.column(self.feature).iter().enumerate() {
            let positive = 1.0 / (1.0 + (-8.0 * (v - self.threshold)).exp());
            proba[[i, 0]] = 1.0 - positive;
            proba[[i, 1]] = positive;
        }
        proba
    }
}

/// Skewed two-class data: class 1 lives in a corner of the unit square.
fn make_data(n: usize, rng: &mut StdRng) -> (Array2<f64>, Vec<i64>) {
    let mut x = Array2::zeros((n, 2));
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let (a, b): (f64, f64) = (rng.gen(), rng.gen());
        x[[i, 0]] = a;
        x[[i, 1]] = b;
        let label = if a > 0.6 && b > 0.4 { 1 } else { 0 };
        y.push(if rng.gen_bool(0.08) { 1 - label } else { label });
    }
    (x, y)
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(42);
    let (x_dsel, y_dsel) = make_data(400, &mut rng);
    let (x_test, y_test) = make_data(400, &mut rng);

    let classifiers: Vec<Arc<dyn BaseClassifier>> = (0..10)
        .map(|i| {
            Arc::new(Stump {
                feature: i % 2,
                threshold: rng.gen_range(0.2..0.8),
                classes: vec![0, 1],
            }) as Arc<dyn BaseClassifier>
        })
        .collect();
    let pool = Pool::new(classifiers)?;

    let configs: Vec<SelectorConfig> = match std::env::args().nth(1) {
        Some(path) => vec![load_config(&path)?],
        None => TechniqueKind::all()
            .into_iter()
            .map(|technique| {
                SelectorConfig::new(
                    DsConfig {
                        dfp: true,
                        ..DsConfig::default()
                    },
                    technique,
                )
            })
            .collect(),
    };

    for config in &configs {
        let mut selector = DynamicSelector::from_config(pool.clone(), config)?;
        selector
            .fit(&x_dsel, &y_dsel)
            .with_context(|| format!("Failed to fit {}", config.technique.name()))?;
        println!("{:<14} {:.4}", selector.name(), selector.score(&x_test, &y_test)?);
    }

    let mut single = SingleBest::new(pool.clone());
    single.fit(&x_dsel, &y_dsel)?;
    println!("{:<14} {:.4}", single.name(), single.score(&x_test, &y_test)?);

    let mut static_selection = StaticSelection::new(pool.clone(), 0.5)?;
    static_selection.fit(&x_dsel, &y_dsel)?;
    println!(
        "{:<14} {:.4}",
        static_selection.name(),
        static_selection.score(&x_test, &y_test)?
    );

    let mut oracle = Oracle::new(pool);
    oracle.fit(&x_dsel, &y_dsel)?;
    println!("{:<14} {:.4}", "Oracle", oracle.score(&x_test, &y_test)?);

    Ok(())
}
