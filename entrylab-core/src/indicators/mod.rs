//! Indicator library.
//!
//! Every indicator is a pure function from input series to an output series
//! of the same length. There are no `NaN` warm-up holes: bars without enough
//! history get a defensible default (expanding mean, neutral oscillator value,
//! or a backfilled first value) so downstream code can index any bar.
//!
//! Inputs are never trusted. [`Ohlcv::from_candles`] coerces non-finite prices
//! to the last valid value (or 0.0) and negative volume to 0.0 before any
//! indicator sees them.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod candle_shape;
pub mod ema;
pub mod pivots;
pub mod rsi;
pub mod sma;

pub use adx::{directional, Directional};
pub use atr::{atr, true_range, wilder_smooth};
pub use bollinger::{bollinger, Bands};
pub use candle_shape::{wick_ratios, WickRatios};
pub use ema::ema;
pub use pivots::{pivots, Pivots};
pub use rsi::rsi;
pub use sma::sma;

use crate::domain::Candle;

/// Floor for denominators that may legitimately be zero (flat bars, flat bands).
pub const EPS: f64 = 1e-12;

/// Return `value` if finite, otherwise `fallback`.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Replace non-finite values with the last finite value seen (0.0 before the first).
pub fn sanitize(values: &[f64]) -> Vec<f64> {
    let mut last = 0.0;
    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                last = v;
            }
            last
        })
        .collect()
}

/// Column view of a candle window with coerced values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ohlcv {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl Ohlcv {
    pub fn from_candles(candles: &[Candle]) -> Self {
        let col = |f: fn(&Candle) -> f64| sanitize(&candles.iter().map(f).collect::<Vec<_>>());
        let volume = candles
            .iter()
            .map(|c| finite_or(c.volume, 0.0).max(0.0))
            .collect();
        Self {
            open: col(|c| c.open),
            high: col(|c| c.high),
            low: col(|c| c.low),
            close: col(|c| c.close),
            volume,
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}

/// Create synthetic candles from close prices for testing.
///
/// open = prev_close (or close for the first candle),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle::new(
                base + chrono::Duration::hours(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
