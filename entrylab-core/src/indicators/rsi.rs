//! Relative Strength Index (RSI).
//!
//! Average gain and average loss are seeded from the first `period` close
//! deltas, then follow the Wilder recurrence
//! `avg = (avg * (period - 1) + delta) / period`.
//! RSI = 100 when the average loss is ~0, else `100 - 100 / (1 + gain / loss)`.
//! Bars before the seed read 50 (neutral).

use super::EPS;

/// Neutral oscillator value used for warm-up bars and missing data.
pub const RSI_NEUTRAL: f64 = 50.0;

pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let n = closes.len();
    let mut result = vec![RSI_NEUTRAL; n];

    if n <= period {
        return result;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            avg_gain += delta;
        } else {
            avg_loss -= delta;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_value(avg_gain, avg_loss);

    let p = period as f64;
    for i in (period + 1)..n {
        let delta = closes[i] - closes[i - 1];
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        result[i] = rsi_value(avg_gain, avg_loss);
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= EPS {
        100.0
    } else {
        (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)
    }
}
