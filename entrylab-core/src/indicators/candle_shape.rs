//! Candle-shape ratios: upper and lower wick length as a fraction of the bar range.

use super::EPS;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WickRatios {
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Zero-range bars have no wicks.
pub fn wick_ratios(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> WickRatios {
    let n = open.len().min(high.len()).min(low.len()).min(close.len());
    let mut out = WickRatios {
        upper: Vec::with_capacity(n),
        lower: Vec::with_capacity(n),
    };

    for i in 0..n {
        let range = high[i] - low[i];
        if range <= EPS {
            out.upper.push(0.0);
            out.lower.push(0.0);
            continue;
        }
        let body_top = open[i].max(close[i]);
        let body_bottom = open[i].min(close[i]);
        out.upper
            .push(((high[i] - body_top) / range).clamp(0.0, 1.0));
        out.lower
            .push(((body_bottom - low[i]) / range).clamp(0.0, 1.0));
    }

    out
}
