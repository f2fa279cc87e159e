//! EntryLab Runner: scoring and parameter search on top of `entrylab-core`.
//!
//! - [`evaluator`]: backtest-lite objective over one pass's entries
//! - [`optimizer`]: time-boxed random search with optional parallel batches

pub mod evaluator;
pub mod optimizer;

pub use evaluator::{evaluate, Evaluation, Outcome};
pub use optimizer::{
    optimize, optimize_default, tune_store, OptimizationResult, OptimizerConfig,
    OptimizerProgress,
};
