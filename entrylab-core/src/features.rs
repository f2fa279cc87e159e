//! Feature set: every indicator series for one candle window.
//!
//! Built once per pipeline pass by [`FeatureSet::compute`], then read by the
//! regime classifiers and the entry strategies. Every series has exactly one
//! value per candle.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::Candle;
use crate::indicators::{self, Ohlcv, EPS};
use crate::params::ParameterSet;

/// Name of a per-bar feature series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Open,
    High,
    Low,
    Close,
    Volume,
    EmaFast,
    EmaSlow,
    Rsi,
    /// Trailing mean of RSI over `rsi_period` bars.
    RsiMean,
    Atr,
    /// ATR as a percent of close.
    AtrPct,
    BbMid,
    BbUpper,
    BbLower,
    BbWidth,
    BbPct,
    PlusDi,
    MinusDi,
    /// DI+ minus DI-.
    DiDiff,
    Adx,
    VolumeAvg,
    VolumeRatio,
    UpperWick,
    LowerWick,
    PivotHigh,
    PivotLow,
    /// (close - slow EMA) / ATR.
    TrendDist,
}

impl Feature {
    pub const ALL: [Feature; 27] = [
        Feature::Open,
        Feature::High,
        Feature::Low,
        Feature::Close,
        Feature::Volume,
        Feature::EmaFast,
        Feature::EmaSlow,
        Feature::Rsi,
        Feature::RsiMean,
        Feature::Atr,
        Feature::AtrPct,
        Feature::BbMid,
        Feature::BbUpper,
        Feature::BbLower,
        Feature::BbWidth,
        Feature::BbPct,
        Feature::PlusDi,
        Feature::MinusDi,
        Feature::DiDiff,
        Feature::Adx,
        Feature::VolumeAvg,
        Feature::VolumeRatio,
        Feature::UpperWick,
        Feature::LowerWick,
        Feature::PivotHigh,
        Feature::PivotLow,
        Feature::TrendDist,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
            Self::EmaFast => "ema_fast",
            Self::EmaSlow => "ema_slow",
            Self::Rsi => "rsi",
            Self::RsiMean => "rsi_mean",
            Self::Atr => "atr",
            Self::AtrPct => "atr_pct",
            Self::BbMid => "bb_mid",
            Self::BbUpper => "bb_upper",
            Self::BbLower => "bb_lower",
            Self::BbWidth => "bb_width",
            Self::BbPct => "bb_pct",
            Self::PlusDi => "plus_di",
            Self::MinusDi => "minus_di",
            Self::DiDiff => "di_diff",
            Self::Adx => "adx",
            Self::VolumeAvg => "volume_avg",
            Self::VolumeRatio => "volume_ratio",
            Self::UpperWick => "upper_wick",
            Self::LowerWick => "lower_wick",
            Self::PivotHigh => "pivot_high",
            Self::PivotLow => "pivot_low",
            Self::TrendDist => "trend_dist",
        }
    }

    /// Value used for missing bars and non-finite readings.
    pub fn neutral(&self) -> f64 {
        match self {
            Self::Rsi | Self::RsiMean => indicators::rsi::RSI_NEUTRAL,
            Self::BbPct => indicators::bollinger::PCT_NEUTRAL,
            _ => 0.0,
        }
    }
}

/// Index-aligned feature series for one candle window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    series: HashMap<Feature, Vec<f64>>,
    len: usize,
}

impl FeatureSet {
    /// An empty container sized for `len` bars.
    pub fn with_len(len: usize) -> Self {
        Self {
            series: HashMap::new(),
            len,
        }
    }

    /// Run the whole indicator library over `candles`.
    pub fn compute(candles: &[Candle], params: &ParameterSet) -> Self {
        let cols = Ohlcv::from_candles(candles);
        let n = cols.len();
        let mut fs = Self::with_len(n);

        let ema_fast = indicators::ema(&cols.close, params.ema_fast);
        let ema_slow = indicators::ema(&cols.close, params.ema_slow);
        let rsi = indicators::rsi(&cols.close, params.rsi_period);
        let rsi_mean = indicators::sma(&rsi, params.rsi_period);
        let atr = indicators::atr(&cols.high, &cols.low, &cols.close, params.atr_period);
        let bands = indicators::bollinger(&cols.close, params.bb_period, params.bb_std);
        let dir = indicators::directional(&cols.high, &cols.low, &cols.close, params.adx_period);
        let volume_avg = indicators::sma(&cols.volume, params.volume_period);
        let wicks = indicators::wick_ratios(&cols.open, &cols.high, &cols.low, &cols.close);
        let piv = indicators::pivots(&cols.high, &cols.low, params.pivot_lookback);

        let atr_pct: Vec<f64> = atr
            .iter()
            .zip(&cols.close)
            .map(|(a, c)| 100.0 * a / c.abs().max(EPS))
            .collect();
        let trend_dist: Vec<f64> = cols
            .close
            .iter()
            .zip(&ema_slow)
            .zip(&atr)
            .map(|((c, e), a)| (c - e) / a.max(EPS))
            .collect();
        let di_diff: Vec<f64> = dir
            .plus_di
            .iter()
            .zip(&dir.minus_di)
            .map(|(p, m)| p - m)
            .collect();
        let volume_ratio: Vec<f64> = cols
            .volume
            .iter()
            .zip(&volume_avg)
            .map(|(v, avg)| v / avg.max(EPS))
            .collect();

        fs.insert(Feature::EmaFast, ema_fast);
        fs.insert(Feature::EmaSlow, ema_slow);
        fs.insert(Feature::Rsi, rsi);
        fs.insert(Feature::RsiMean, rsi_mean);
        fs.insert(Feature::Atr, atr);
        fs.insert(Feature::AtrPct, atr_pct);
        fs.insert(Feature::BbMid, bands.mid);
        fs.insert(Feature::BbUpper, bands.upper);
        fs.insert(Feature::BbLower, bands.lower);
        fs.insert(Feature::BbWidth, bands.width);
        fs.insert(Feature::BbPct, bands.pct);
        fs.insert(Feature::PlusDi, dir.plus_di);
        fs.insert(Feature::MinusDi, dir.minus_di);
        fs.insert(Feature::DiDiff, di_diff);
        fs.insert(Feature::Adx, dir.adx);
        fs.insert(Feature::VolumeAvg, volume_avg);
        fs.insert(Feature::VolumeRatio, volume_ratio);
        fs.insert(Feature::UpperWick, wicks.upper);
        fs.insert(Feature::LowerWick, wicks.lower);
        fs.insert(Feature::PivotHigh, piv.high);
        fs.insert(Feature::PivotLow, piv.low);
        fs.insert(Feature::TrendDist, trend_dist);
        fs.insert(Feature::Open, cols.open);
        fs.insert(Feature::High, cols.high);
        fs.insert(Feature::Low, cols.low);
        fs.insert(Feature::Close, cols.close);
        fs.insert(Feature::Volume, cols.volume);

        fs
    }

    /// Insert a series, padding with the feature's neutral value or truncating
    /// so the series always has exactly `len()` entries.
    pub fn insert(&mut self, feature: Feature, mut values: Vec<f64>) {
        values.resize(self.len, feature.neutral());
        self.series.insert(feature, values);
    }

    /// Value at `index`; the neutral value if missing, out of range, or non-finite.
    pub fn get(&self, feature: Feature, index: usize) -> f64 {
        self.series
            .get(&feature)
            .and_then(|s| s.get(index).copied())
            .map(|v| indicators::finite_or(v, feature.neutral()))
            .unwrap_or_else(|| feature.neutral())
    }

    /// Value at the last bar.
    pub fn last(&self, feature: Feature) -> f64 {
        match self.len.checked_sub(1) {
            Some(i) => self.get(feature, i),
            None => feature.neutral(),
        }
    }

    /// Full series for a feature (empty if never inserted).
    pub fn series(&self, feature: Feature) -> &[f64] {
        self.series.get(&feature).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.series.contains_key(&feature)
    }

    /// Number of bars (not number of series).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Last-bar diagnostic snapshot; `None` for an empty window.
    pub fn snapshot(&self) -> Option<FeatureSnapshot> {
        if self.is_empty() {
            return None;
        }
        Some(FeatureSnapshot {
            bars: self.len,
            close: self.last(Feature::Close),
            atr: self.last(Feature::Atr),
            atr_pct: self.last(Feature::AtrPct),
            rsi: self.last(Feature::Rsi),
            adx: self.last(Feature::Adx),
            plus_di: self.last(Feature::PlusDi),
            minus_di: self.last(Feature::MinusDi),
            bb_width: self.last(Feature::BbWidth),
            bb_pct: self.last(Feature::BbPct),
            trend_dist: self.last(Feature::TrendDist),
        })
    }
}

/// Read-only view of last-bar feature values, for diagnosing empty passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub bars: usize,
    pub close: f64,
    pub atr: f64,
    pub atr_pct: f64,
    pub rsi: f64,
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub bb_width: f64,
    pub bb_pct: f64,
    pub trend_dist: f64,
}
