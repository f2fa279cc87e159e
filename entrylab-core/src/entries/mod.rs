//! Entry strategies and regime dispatch.
//!
//! Each regime maps to one [`EntryStrategy`] through a [`StrategyRegistry`].
//! Strategies scan every bar from the warm-up offset, score candidates in
//! 0.0..=1.0, and emit only when the score clears `min_confidence`.
//!
//! Strategies never look at bars after the one they are scoring. Pivot flags,
//! which need `pivot_lookback` bars of hindsight, are read at
//! `i - pivot_lookback`.

pub mod mean_reversion;
pub mod squeeze;
pub mod trend;

pub use mean_reversion::MeanReversion;
pub use squeeze::SqueezeBreakout;
pub use trend::TrendPullback;

use std::collections::HashMap;

use crate::domain::{Candle, EntryEvent, RegimeTag, Side};
use crate::features::{Feature, FeatureSet};
use crate::params::ParameterSet;

/// Everything a strategy may read for one pass.
#[derive(Debug, Clone, Copy)]
pub struct EntryContext<'a> {
    pub candles: &'a [Candle],
    pub features: &'a FeatureSet,
    pub params: &'a ParameterSet,
    pub regime: RegimeTag,
}

impl<'a> EntryContext<'a> {
    pub fn new(
        candles: &'a [Candle],
        features: &'a FeatureSet,
        params: &'a ParameterSet,
        regime: RegimeTag,
    ) -> Self {
        Self {
            candles,
            features,
            params,
            regime,
        }
    }

    /// Bars available to scan (the shorter of candles and features).
    pub fn len(&self) -> usize {
        self.candles.len().min(self.features.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First bar a strategy may emit on.
    pub fn warmup(&self) -> usize {
        self.params.warmup_bars(self.len())
    }

    #[inline]
    pub fn at(&self, feature: Feature, i: usize) -> f64 {
        self.features.get(feature, i)
    }

    /// Build an event for bar `i` if `score` is finite and clears the
    /// confidence floor. The stored confidence is clamped to 0..=1.
    pub fn emit(
        &self,
        i: usize,
        side: Side,
        score: f64,
        reasons: Vec<String>,
    ) -> Option<EntryEvent> {
        if !score.is_finite() || score < self.params.min_confidence {
            return None;
        }
        let candle = self.candles.get(i)?;
        Some(EntryEvent {
            ts: candle.ts,
            bar_index: i,
            side,
            confidence: score.clamp(0.0, 1.0),
            price: self.at(Feature::Close, i),
            reasons,
            regime: self.regime,
        })
    }

    /// Reversal evidence in the trade's favour at bar `i`: a rejection wick on
    /// the adverse side, else a pivot confirmed by bar `i`.
    pub fn reversal_evidence(&self, i: usize, side: Side) -> Option<&'static str> {
        let (wick, pivot, pivot_tag) = match side {
            Side::Long => (Feature::LowerWick, Feature::PivotLow, "pivot_low"),
            Side::Short => (Feature::UpperWick, Feature::PivotHigh, "pivot_high"),
        };
        if self.at(wick, i) >= self.params.wick_ratio_min {
            return Some("rejection_wick");
        }
        let lb = self.params.pivot_lookback.max(1);
        match i.checked_sub(lb) {
            Some(j) if self.at(pivot, j) > 0.5 => Some(pivot_tag),
            _ => None,
        }
    }
}

/// Per-regime entry generator.
pub trait EntryStrategy: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &str;

    /// Scored entries for the whole window, in bar order.
    fn generate(&self, ctx: &EntryContext<'_>) -> Vec<EntryEvent>;
}

/// Regime to strategy table, built by the caller and passed by reference.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<RegimeTag, Box<dyn EntryStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock table: trend pullback for both trend regimes, mean reversion
    /// for range, squeeze breakout, and tightened reversion for high volatility.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.register(RegimeTag::TrendUp, Box::new(TrendPullback));
        reg.register(RegimeTag::TrendDown, Box::new(TrendPullback));
        reg.register(RegimeTag::Range, Box::new(MeanReversion::range()));
        reg.register(RegimeTag::Squeeze, Box::new(SqueezeBreakout));
        reg.register(
            RegimeTag::HighVolatility,
            Box::new(MeanReversion::high_volatility()),
        );
        reg
    }

    /// Set the strategy for `regime`, returning the one it replaces.
    pub fn register(
        &mut self,
        regime: RegimeTag,
        strategy: Box<dyn EntryStrategy>,
    ) -> Option<Box<dyn EntryStrategy>> {
        self.strategies.insert(regime, strategy)
    }

    pub fn get(&self, regime: RegimeTag) -> Option<&dyn EntryStrategy> {
        self.strategies.get(&regime).map(|s| s.as_ref())
    }

    /// Run the strategy registered for `ctx.regime`. NO_DATA and unregistered
    /// regimes produce nothing.
    pub fn dispatch(&self, ctx: &EntryContext<'_>) -> Vec<EntryEvent> {
        if ctx.regime == RegimeTag::NoData {
            return Vec::new();
        }
        match self.get(ctx.regime) {
            Some(strategy) => strategy.generate(ctx),
            None => Vec::new(),
        }
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<(RegimeTag, &str)> = self
            .strategies
            .iter()
            .map(|(tag, s)| (*tag, s.name()))
            .collect();
        names.sort();
        f.debug_struct("StrategyRegistry")
            .field("strategies", &names)
            .finish()
    }
}
