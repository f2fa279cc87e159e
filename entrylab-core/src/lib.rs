//! EntryLab Core: indicators, regime classification, entry scoring, postprocessing.
//!
//! This crate is a pure function of `(candles, parameters)`:
//! - Domain types (candles, regime tags, entry events)
//! - Indicator library with warm-up-free series
//! - Static and rule-driven regime classifiers
//! - Per-regime entry strategies behind an explicit registry
//! - Cluster/cooldown postprocessor
//! - Parameter set, parameter space, and seed hierarchy for search
//!
//! Nothing here does I/O except [`config::ParameterStore`] load/save.

pub mod config;
pub mod domain;
pub mod entries;
pub mod features;
pub mod indicators;
pub mod params;
pub mod pipeline;
pub mod postprocess;
pub mod regime;
pub mod rng;
pub mod sampler;

pub use domain::{Candle, EntryEvent, RegimeTag, Side};
pub use features::{Feature, FeatureSet, FeatureSnapshot};
pub use params::{ParamError, ParameterSet};
pub use pipeline::{generate_entries, Pipeline, PipelineOutput};
