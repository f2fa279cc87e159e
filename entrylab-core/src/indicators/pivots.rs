//! Pivot flags.
//!
//! A bar is a pivot high when its high is strictly above every other high in
//! the symmetric `±lookback` window (at least 3 bars), and a pivot low
//! likewise for lows. Bars without a complete window are never pivots, so a
//! pivot at bar `t` is only known once bar `t + lookback` has closed.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pivots {
    /// 1.0 at pivot highs, 0.0 elsewhere.
    pub high: Vec<f64>,
    /// 1.0 at pivot lows, 0.0 elsewhere.
    pub low: Vec<f64>,
}

pub fn pivots(high: &[f64], low: &[f64], lookback: usize) -> Pivots {
    let lb = lookback.max(1);
    let n = high.len().min(low.len());
    let mut out = Pivots {
        high: vec![0.0; n],
        low: vec![0.0; n],
    };

    if n < lb.saturating_mul(2).saturating_add(1) {
        return out;
    }

    for i in lb..(n - lb) {
        let window = || (i - lb)..=(i + lb);
        let is_high = window().all(|j| j == i || high[i] > high[j]);
        let is_low = window().all(|j| j == i || low[i] < low[j]);
        if is_high {
            out.high[i] = 1.0;
        }
        if is_low {
            out.low[i] = 1.0;
        }
    }

    out
}
