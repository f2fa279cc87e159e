//! Integration tests for the optimizer.
//!
//! Runs seeded searches over synthetic drifting candles.
//! Tests: zero budget, determinism across thread counts, cancellation,
//! baseline scoring, progress reporting, store persistence.

use std::cell::Cell;
use std::sync::atomic::AtomicBool;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use entrylab_core::config::ParameterStore;
use entrylab_core::sampler::default_space;
use entrylab_core::{Candle, ParameterSet, Pipeline};
use entrylab_runner::evaluator::{evaluate, NO_ENTRIES_SCORE};
use entrylab_runner::optimizer::{
    optimize, optimize_default, tune_store, OptimizerConfig, OptimizerProgress,
};

/// close = 100 + 0.15 * i + a slow wave + noise.
fn drifting(n: usize, seed: u64) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            100.0 + 0.15 * i as f64 + 3.0 * (i as f64 * 0.12).sin() + rng.gen_range(-0.6..0.6)
        })
        .collect();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle::new(
                base + chrono::Duration::hours(i as i64),
                open,
                open.max(close) + 0.5,
                open.min(close) - 0.5,
                close,
                900.0 + (i % 7) as f64 * 50.0,
            )
        })
        .collect()
}

fn seeded(seed: u64, trials: usize, parallelism: usize) -> OptimizerConfig {
    OptimizerConfig {
        budget_ms: 120_000,
        seed: Some(seed),
        max_trials: Some(trials),
        parallelism,
        evaluate_baseline: false,
    }
}

#[test]
fn zero_budget_returns_base_unchanged() {
    let candles = drifting(200, 1);
    let base = ParameterSet {
        ema_fast: 12,
        min_confidence: 0.6,
        ..ParameterSet::default()
    };
    let config = OptimizerConfig {
        budget_ms: 0,
        ..seeded(3, 50, 1)
    };
    let result = optimize_default(&candles, &base, &config);

    assert_eq!(result.best, base);
    assert_eq!(result.trials, 0);
    assert!(result.best_score.is_none());
}

#[test]
fn seeded_search_is_deterministic() {
    let candles = drifting(240, 2);
    let base = ParameterSet::default();

    let a = optimize_default(&candles, &base, &seeded(42, 6, 1));
    let b = optimize_default(&candles, &base, &seeded(42, 6, 1));

    assert_eq!(a.trials, 6);
    assert_eq!(a.seed, 42);
    assert_eq!(a.best, b.best);
    assert_eq!(a.best_score, b.best_score);
    // any scored trial beats the unscored base
    assert!(a.best_score.is_some());
    assert!(a.best.validate().is_ok());
}

#[test]
fn parallel_matches_sequential() {
    let candles = drifting(240, 3);
    let base = ParameterSet::default();

    let seq = optimize_default(&candles, &base, &seeded(7, 8, 1));
    let par = optimize_default(&candles, &base, &seeded(7, 8, 4));

    assert_eq!(seq.trials, par.trials);
    assert_eq!(seq.best, par.best);
    assert_eq!(seq.best_score, par.best_score);
}

#[test]
fn trial_cap_is_exact_with_uneven_batches() {
    let candles = drifting(120, 4);
    let result = optimize_default(&candles, &ParameterSet::default(), &seeded(5, 5, 3));
    assert_eq!(result.trials, 5);
}

#[test]
fn cancel_flag_stops_before_first_batch() {
    let candles = drifting(200, 5);
    let base = ParameterSet::default();
    let cancel = AtomicBool::new(true);

    let result = optimize(
        &candles,
        &base,
        &default_space(),
        &Pipeline::default(),
        &seeded(9, 100, 1),
        None,
        Some(&cancel),
    );

    assert!(result.cancelled);
    assert_eq!(result.trials, 0);
    assert_eq!(result.best, base);
}

#[test]
fn baseline_score_is_opt_in() {
    let candles = drifting(200, 6);
    let base = ParameterSet::default();
    let config = OptimizerConfig {
        evaluate_baseline: true,
        ..seeded(11, 0, 1)
    };

    let result = optimize_default(&candles, &base, &config);
    let out = Pipeline::default().run(&candles, &base);
    let expected = evaluate(&out.entries, &candles, &base).score;

    assert_eq!(result.trials, 0);
    assert_eq!(result.best, base);
    assert_eq!(result.best_score, Some(expected));
}

#[test]
fn progress_reports_first_batch() {
    let candles = drifting(150, 7);
    let calls = Cell::new(0usize);
    let last_trials = Cell::new(0usize);
    let cb: &dyn Fn(&OptimizerProgress) = &|p| {
        calls.set(calls.get() + 1);
        last_trials.set(p.trials);
        assert!(p.trials_per_sec >= 0.0);
    };

    let result = optimize(
        &candles,
        &ParameterSet::default(),
        &default_space(),
        &Pipeline::default(),
        &seeded(13, 4, 2),
        Some(cb),
        None,
    );

    assert_eq!(result.trials, 4);
    assert!(calls.get() >= 1);
    assert!(last_trials.get() >= 2);
}

#[test]
fn empty_candles_still_score_every_trial() {
    let result = optimize_default(&[], &ParameterSet::default(), &seeded(17, 3, 1));
    assert_eq!(result.trials, 3);
    assert_eq!(result.best_score, Some(NO_ENTRIES_SCORE));
}

#[test]
fn tune_store_records_and_persists() -> anyhow::Result<()> {
    let candles = drifting(220, 8);
    let mut store = ParameterStore::new(ParameterSet::default());

    let result = tune_store(
        &candles,
        &mut store,
        &default_space(),
        &Pipeline::default(),
        &seeded(21, 4, 1),
        true,
    );

    assert_eq!(store.optimization_results.len(), 1);
    assert_eq!(store.parameters, result.best);

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("params.toml");
    store.save(&path)?;

    let loaded = ParameterStore::load(&path)?;
    let record = &loaded.optimization_results[0];
    assert_eq!(loaded.parameters, result.best);
    assert_eq!(record.seed, 21);
    assert_eq!(record.trials, 4);
    match (record.score, result.best_score) {
        (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9),
        other => panic!("score lost in round-trip: {other:?}"),
    }
    Ok(())
}
