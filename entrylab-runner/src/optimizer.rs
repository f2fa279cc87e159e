//! Time-boxed random search over the parameter space.
//!
//! Trials run in batches of `parallelism`. Between batches the loop checks the
//! wall-clock budget, the trial cap, and the cancel flag; a batch that has
//! started always finishes. Each trial draws its parameters from an RNG derived
//! from `(master seed, trial number)`, and batch results are reduced in trial
//! order with first-max-wins, so a seeded run picks the same winner at any
//! thread count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use entrylab_core::config::{OptimizationRecord, ParameterStore};
use entrylab_core::rng::{RngHierarchy, SAMPLE_STREAM};
use entrylab_core::sampler::{default_space, ParameterSpace};
use entrylab_core::{Candle, ParameterSet, Pipeline};

use crate::evaluator::{evaluate, Evaluation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Wall-clock budget. Zero returns the base set without running a trial.
    pub budget_ms: u64,
    /// Master seed; `None` draws one from entropy and reports it in the result.
    pub seed: Option<u64>,
    pub max_trials: Option<usize>,
    /// Trials per batch; above 1 the batch runs on a rayon pool of this size.
    pub parallelism: usize,
    /// Score the base set before searching so trials must beat it.
    /// Off by default: the base starts unscored and any trial replaces it.
    pub evaluate_baseline: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            budget_ms: 2_000,
            seed: None,
            max_trials: None,
            parallelism: 1,
            evaluate_baseline: false,
        }
    }
}

// ─── Progress & result types ─────────────────────────────────────────

/// Progress update sent between batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerProgress {
    pub trials: usize,
    pub best_score: Option<f64>,
    pub elapsed_ms: u64,
    pub trials_per_sec: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best parameters found; the base set if nothing beat it.
    pub best: ParameterSet,
    /// `None` while the base set is still the unscored winner.
    pub best_score: Option<f64>,
    pub best_evaluation: Option<Evaluation>,
    pub trials: usize,
    /// Master seed actually used.
    pub seed: u64,
    pub elapsed_ms: u64,
    pub cancelled: bool,
}

impl OptimizationResult {
    pub fn to_record(&self) -> OptimizationRecord {
        OptimizationRecord {
            seed: self.seed,
            trials: self.trials,
            score: self.best_score,
            timestamp: chrono::Utc::now(),
            parameters: self.best.clone(),
        }
    }
}

/// Strict `>`: on ties the earlier trial keeps the lead.
fn is_better(score: f64, best: Option<f64>) -> bool {
    score > best.unwrap_or(f64::NEG_INFINITY)
}

// ─── Search loop ─────────────────────────────────────────────────────

/// Search `space` around `base`, scoring each trial with a full pipeline pass.
///
/// # Arguments
/// - `candles`: the window every trial is run and scored on.
/// - `progress_cb`: optional callback, throttled to ~500ms.
/// - `cancel`: optional flag; checked between batches.
pub fn optimize(
    candles: &[Candle],
    base: &ParameterSet,
    space: &ParameterSpace,
    pipeline: &Pipeline,
    config: &OptimizerConfig,
    progress_cb: Option<&dyn Fn(&OptimizerProgress)>,
    cancel: Option<&AtomicBool>,
) -> OptimizationResult {
    let start = Instant::now();
    let budget = Duration::from_millis(config.budget_ms);
    let hierarchy = config
        .seed
        .map(RngHierarchy::new)
        .unwrap_or_else(RngHierarchy::from_entropy);
    let batch = config.parallelism.max(1);

    let mut result = OptimizationResult {
        best: base.clone(),
        best_score: None,
        best_evaluation: None,
        trials: 0,
        seed: hierarchy.master_seed(),
        elapsed_ms: 0,
        cancelled: false,
    };

    if config.budget_ms == 0 {
        debug!(seed = result.seed, "zero budget, returning base set");
        return result;
    }

    info!(
        seed = result.seed,
        budget_ms = config.budget_ms,
        parallelism = batch,
        fields = space.len(),
        bars = candles.len(),
        "optimizer start"
    );

    if config.evaluate_baseline {
        let out = pipeline.run(candles, base);
        let eval = evaluate(&out.entries, candles, base);
        debug!(score = eval.score, "baseline scored");
        result.best_score = Some(eval.score);
        result.best_evaluation = Some(eval);
    }

    let pool = if batch > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(batch).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(error = %e, "thread pool unavailable, running trials sequentially");
                None
            }
        }
    } else {
        None
    };

    let run_trial = |trial: u64| -> Option<(u64, ParameterSet, Evaluation)> {
        let mut rng = hierarchy.rng_for(SAMPLE_STREAM, trial);
        let params = match space.sample(base, &mut rng) {
            Ok(p) => p,
            Err(e) => {
                warn!(trial, error = %e, "sampled parameters rejected");
                return None;
            }
        };
        let out = pipeline.run(candles, &params);
        let eval = evaluate(&out.entries, candles, &params);
        Some((trial, params, eval))
    };

    let mut last_progress = Instant::now();

    loop {
        if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            warn!(trials = result.trials, "optimizer cancelled");
            result.cancelled = true;
            break;
        }
        if start.elapsed() >= budget {
            break;
        }
        let n = match config.max_trials {
            Some(max) => batch.min(max.saturating_sub(result.trials)),
            None => batch,
        };
        if n == 0 {
            break;
        }

        let first = result.trials as u64;
        let ids: Vec<u64> = (first..first + n as u64).collect();
        let outcomes: Vec<Option<(u64, ParameterSet, Evaluation)>> = match &pool {
            Some(pool) => pool.install(|| ids.par_iter().map(|&t| run_trial(t)).collect()),
            None => ids.iter().map(|&t| run_trial(t)).collect(),
        };

        // collect() keeps input order, so this scan is in trial order
        for (trial, params, eval) in outcomes.into_iter().flatten() {
            if is_better(eval.score, result.best_score) {
                debug!(trial, score = eval.score, trades = eval.trades, "new best");
                result.best = params;
                result.best_score = Some(eval.score);
                result.best_evaluation = Some(eval);
            }
        }
        result.trials += n;

        if let Some(cb) = progress_cb {
            if last_progress.elapsed().as_millis() >= 500 || result.trials == n {
                let elapsed = start.elapsed();
                let secs = elapsed.as_secs_f64();
                cb(&OptimizerProgress {
                    trials: result.trials,
                    best_score: result.best_score,
                    elapsed_ms: elapsed.as_millis() as u64,
                    trials_per_sec: if secs > 0.0 {
                        result.trials as f64 / secs
                    } else {
                        0.0
                    },
                });
                last_progress = Instant::now();
            }
        }
    }

    result.elapsed_ms = start.elapsed().as_millis() as u64;
    info!(
        trials = result.trials,
        best_score = ?result.best_score,
        elapsed_ms = result.elapsed_ms,
        cancelled = result.cancelled,
        "optimizer finished"
    );
    result
}

/// [`optimize`] over [`default_space`] with the default pipeline.
pub fn optimize_default(
    candles: &[Candle],
    base: &ParameterSet,
    config: &OptimizerConfig,
) -> OptimizationResult {
    optimize(
        candles,
        base,
        &default_space(),
        &Pipeline::default(),
        config,
        None,
        None,
    )
}

/// Tune from the store's current parameters and append the outcome to its
/// history. With `adopt`, a scored winner replaces `store.parameters`.
pub fn tune_store(
    candles: &[Candle],
    store: &mut ParameterStore,
    space: &ParameterSpace,
    pipeline: &Pipeline,
    config: &OptimizerConfig,
    adopt: bool,
) -> OptimizationResult {
    let result = optimize(candles, &store.parameters, space, pipeline, config, None, None);
    store.record(result.to_record(), adopt && result.best_score.is_some());
    result
}
