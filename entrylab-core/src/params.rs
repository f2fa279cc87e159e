//! ParameterSet: every tunable threshold of the pipeline in one flat record.
//!
//! Fields are grouped by the stage that reads them. Each field is also
//! addressable by name (`get` / `set`) so the parameter space can overwrite
//! fields without knowing the struct layout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from reading, writing, or validating parameters.
#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter: {0}")]
    UnknownField(String),
    #[error("invalid value {value} for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: f64,
        reason: String,
    },
}

/// Upper bound on every period and lookback field.
pub const MAX_PERIOD: usize = 100_000;

pub(crate) fn invalid(field: &str, value: f64, reason: &str) -> ParamError {
    ParamError::InvalidValue {
        field: field.to_string(),
        value,
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    // ── Indicator periods ──
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub bb_period: usize,
    pub bb_std: f64,
    pub adx_period: usize,
    pub volume_period: usize,
    pub pivot_lookback: usize,

    // ── Regime thresholds ──
    pub regime_adx_trend: f64,
    /// Relative band width at or below which the market counts as squeezed.
    pub regime_bb_width_squeeze: f64,
    /// ATR as a percent of close at or above which volatility is "high".
    pub regime_atr_pct_high: f64,

    // ── Entry thresholds ──
    /// Max distance from the slow EMA, in ATR units, that still counts as a pullback.
    pub trend_pullback_atr: f64,
    pub trend_rsi_long_max: f64,
    pub trend_rsi_short_min: f64,
    /// Fraction of `regime_adx_trend` below which a trend entry is penalized.
    pub trend_adx_weak_frac: f64,
    /// Band-percent distance from 0 / 1 that counts as an extreme.
    pub range_bb_extreme: f64,
    pub range_rsi_oversold: f64,
    pub range_rsi_overbought: f64,
    pub wick_ratio_min: f64,

    // ── Breakout confirmation ──
    pub breakout_atr_margin: f64,
    pub breakout_volume_spike: f64,

    // ── Postprocessing ──
    pub cooldown_bars: usize,
    pub cluster_window_bars: usize,
    pub min_confidence: f64,

    // ── Optimizer evaluation ──
    pub eval_horizon_bars: usize,
    pub eval_tp_atr: f64,
    pub eval_sl_atr: f64,
    pub min_trades_gate: usize,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            ema_fast: 12,
            ema_slow: 50,
            rsi_period: 14,
            atr_period: 14,
            bb_period: 20,
            bb_std: 2.0,
            adx_period: 14,
            volume_period: 20,
            pivot_lookback: 3,

            regime_adx_trend: 25.0,
            regime_bb_width_squeeze: 0.05,
            regime_atr_pct_high: 3.5,

            trend_pullback_atr: 1.5,
            trend_rsi_long_max: 50.0,
            trend_rsi_short_min: 50.0,
            trend_adx_weak_frac: 0.6,
            range_bb_extreme: 0.1,
            range_rsi_oversold: 32.0,
            range_rsi_overbought: 68.0,
            wick_ratio_min: 0.45,

            breakout_atr_margin: 0.1,
            breakout_volume_spike: 1.6,

            cooldown_bars: 5,
            cluster_window_bars: 3,
            min_confidence: 0.55,

            eval_horizon_bars: 20,
            eval_tp_atr: 2.0,
            eval_sl_atr: 1.0,
            min_trades_gate: 8,
        }
    }
}

impl ParameterSet {
    /// Every field name accepted by `get` / `set`, in declaration order.
    pub const FIELD_NAMES: [&'static str; 29] = [
        "ema_fast",
        "ema_slow",
        "rsi_period",
        "atr_period",
        "bb_period",
        "bb_std",
        "adx_period",
        "volume_period",
        "pivot_lookback",
        "regime_adx_trend",
        "regime_bb_width_squeeze",
        "regime_atr_pct_high",
        "trend_pullback_atr",
        "trend_rsi_long_max",
        "trend_rsi_short_min",
        "trend_adx_weak_frac",
        "range_bb_extreme",
        "range_rsi_oversold",
        "range_rsi_overbought",
        "wick_ratio_min",
        "breakout_atr_margin",
        "breakout_volume_spike",
        "cooldown_bars",
        "cluster_window_bars",
        "min_confidence",
        "eval_horizon_bars",
        "eval_tp_atr",
        "eval_sl_atr",
        "min_trades_gate",
    ];

    /// True if `name` is an integer-valued field.
    pub fn is_integer_field(name: &str) -> bool {
        matches!(
            name,
            "ema_fast"
                | "ema_slow"
                | "rsi_period"
                | "atr_period"
                | "bb_period"
                | "adx_period"
                | "volume_period"
                | "pivot_lookback"
                | "cooldown_bars"
                | "cluster_window_bars"
                | "eval_horizon_bars"
                | "min_trades_gate"
        )
    }

    /// Read a field by name. Integer fields are widened to f64.
    pub fn get(&self, name: &str) -> Result<f64, ParamError> {
        let v = match name {
            "ema_fast" => self.ema_fast as f64,
            "ema_slow" => self.ema_slow as f64,
            "rsi_period" => self.rsi_period as f64,
            "atr_period" => self.atr_period as f64,
            "bb_period" => self.bb_period as f64,
            "bb_std" => self.bb_std,
            "adx_period" => self.adx_period as f64,
            "volume_period" => self.volume_period as f64,
            "pivot_lookback" => self.pivot_lookback as f64,
            "regime_adx_trend" => self.regime_adx_trend,
            "regime_bb_width_squeeze" => self.regime_bb_width_squeeze,
            "regime_atr_pct_high" => self.regime_atr_pct_high,
            "trend_pullback_atr" => self.trend_pullback_atr,
            "trend_rsi_long_max" => self.trend_rsi_long_max,
            "trend_rsi_short_min" => self.trend_rsi_short_min,
            "trend_adx_weak_frac" => self.trend_adx_weak_frac,
            "range_bb_extreme" => self.range_bb_extreme,
            "range_rsi_oversold" => self.range_rsi_oversold,
            "range_rsi_overbought" => self.range_rsi_overbought,
            "wick_ratio_min" => self.wick_ratio_min,
            "breakout_atr_margin" => self.breakout_atr_margin,
            "breakout_volume_spike" => self.breakout_volume_spike,
            "cooldown_bars" => self.cooldown_bars as f64,
            "cluster_window_bars" => self.cluster_window_bars as f64,
            "min_confidence" => self.min_confidence,
            "eval_horizon_bars" => self.eval_horizon_bars as f64,
            "eval_tp_atr" => self.eval_tp_atr,
            "eval_sl_atr" => self.eval_sl_atr,
            "min_trades_gate" => self.min_trades_gate as f64,
            other => return Err(ParamError::UnknownField(other.to_string())),
        };
        Ok(v)
    }

    /// Write a field by name. Integer fields are rounded to the nearest
    /// non-negative integer; non-finite values are rejected.
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), ParamError> {
        if !value.is_finite() {
            return Err(invalid(name, value, "must be finite"));
        }
        if Self::is_integer_field(name) && value < 0.0 {
            return Err(invalid(name, value, "must be non-negative"));
        }
        let int = value.round() as usize;
        match name {
            "ema_fast" => self.ema_fast = int,
            "ema_slow" => self.ema_slow = int,
            "rsi_period" => self.rsi_period = int,
            "atr_period" => self.atr_period = int,
            "bb_period" => self.bb_period = int,
            "bb_std" => self.bb_std = value,
            "adx_period" => self.adx_period = int,
            "volume_period" => self.volume_period = int,
            "pivot_lookback" => self.pivot_lookback = int,
            "regime_adx_trend" => self.regime_adx_trend = value,
            "regime_bb_width_squeeze" => self.regime_bb_width_squeeze = value,
            "regime_atr_pct_high" => self.regime_atr_pct_high = value,
            "trend_pullback_atr" => self.trend_pullback_atr = value,
            "trend_rsi_long_max" => self.trend_rsi_long_max = value,
            "trend_rsi_short_min" => self.trend_rsi_short_min = value,
            "trend_adx_weak_frac" => self.trend_adx_weak_frac = value,
            "range_bb_extreme" => self.range_bb_extreme = value,
            "range_rsi_oversold" => self.range_rsi_oversold = value,
            "range_rsi_overbought" => self.range_rsi_overbought = value,
            "wick_ratio_min" => self.wick_ratio_min = value,
            "breakout_atr_margin" => self.breakout_atr_margin = value,
            "breakout_volume_spike" => self.breakout_volume_spike = value,
            "cooldown_bars" => self.cooldown_bars = int,
            "cluster_window_bars" => self.cluster_window_bars = int,
            "min_confidence" => self.min_confidence = value,
            "eval_horizon_bars" => self.eval_horizon_bars = int,
            "eval_tp_atr" => self.eval_tp_atr = value,
            "eval_sl_atr" => self.eval_sl_atr = value,
            "min_trades_gate" => self.min_trades_gate = int,
            other => return Err(ParamError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Reject parameter sets the pipeline cannot interpret meaningfully.
    ///
    /// The pipeline itself never fails on a bad set (periods are floored to 1,
    /// divisions are epsilon-guarded); this check is for sets arriving from
    /// an external store.
    pub fn validate(&self) -> Result<(), ParamError> {
        for name in Self::FIELD_NAMES {
            let v = self.get(name)?;
            if !v.is_finite() {
                return Err(invalid(name, v, "must be finite"));
            }
        }

        for name in [
            "ema_fast",
            "ema_slow",
            "rsi_period",
            "atr_period",
            "bb_period",
            "adx_period",
            "volume_period",
            "pivot_lookback",
            "eval_horizon_bars",
        ] {
            let v = self.get(name)?;
            if v < 1.0 {
                return Err(invalid(name, v, "period must be >= 1"));
            }
            if v > MAX_PERIOD as f64 {
                return Err(invalid(name, v, &format!("period must be <= {MAX_PERIOD}")));
            }
        }

        if self.ema_fast >= self.ema_slow {
            return Err(invalid(
                "ema_fast",
                self.ema_fast as f64,
                "must be below ema_slow",
            ));
        }
        if self.bb_std <= 0.0 {
            return Err(invalid("bb_std", self.bb_std, "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(invalid(
                "min_confidence",
                self.min_confidence,
                "must be within [0, 1]",
            ));
        }
        if !(0.0..=0.5).contains(&self.range_bb_extreme) {
            return Err(invalid(
                "range_bb_extreme",
                self.range_bb_extreme,
                "must be within [0, 0.5]",
            ));
        }
        for name in [
            "trend_rsi_long_max",
            "trend_rsi_short_min",
            "range_rsi_oversold",
            "range_rsi_overbought",
            "regime_adx_trend",
        ] {
            let v = self.get(name)?;
            if !(0.0..=100.0).contains(&v) {
                return Err(invalid(name, v, "must be within [0, 100]"));
            }
        }
        if self.range_rsi_oversold >= self.range_rsi_overbought {
            return Err(invalid(
                "range_rsi_oversold",
                self.range_rsi_oversold,
                "must be below range_rsi_overbought",
            ));
        }
        for name in ["eval_tp_atr", "eval_sl_atr", "trend_pullback_atr"] {
            let v = self.get(name)?;
            if v <= 0.0 {
                return Err(invalid(name, v, "must be > 0"));
            }
        }
        for name in [
            "regime_bb_width_squeeze",
            "regime_atr_pct_high",
            "trend_adx_weak_frac",
            "wick_ratio_min",
            "breakout_atr_margin",
            "breakout_volume_spike",
        ] {
            let v = self.get(name)?;
            if v < 0.0 {
                return Err(invalid(name, v, "must be >= 0"));
            }
        }
        Ok(())
    }

    /// First bar index at which entry strategies start scanning.
    ///
    /// The slow EMA is seeded from the first close, so half its period is
    /// enough; ADX needs two full periods. Bounded to the data length.
    pub fn warmup_bars(&self, n: usize) -> usize {
        let w = [
            self.ema_slow / 2,
            self.bb_period,
            self.adx_period.saturating_mul(2),
            self.rsi_period.saturating_add(1),
            self.atr_period.saturating_add(1),
            self.volume_period,
            1,
        ]
        .into_iter()
        .max()
        .unwrap_or(1);
        w.min(n)
    }
}
