//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR uses Wilder smoothing seeded with the mean of the first `period` true
//! ranges; earlier bars read the expanding mean.

/// Compute the True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    let mut tr = Vec::with_capacity(n);

    for i in 0..n {
        let hl = (high[i] - low[i]).max(0.0);
        if i == 0 {
            tr.push(hl);
            continue;
        }
        let pc = close[i - 1];
        tr.push(hl.max((high[i] - pc).abs()).max((low[i] - pc).abs()));
    }

    tr
}

/// Wilder smoothing: `s[t] = (s[t-1] * (period - 1) + x[t]) / period`.
///
/// Seed at index `period - 1` is the mean of the first `period` values.
/// Indices before the seed hold the expanding mean, which coincides with the
/// seed at `period - 1`.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let p = period as f64;
    let mut result = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    let mut prev = 0.0;

    for (i, &v) in values.iter().enumerate() {
        let s = if i < period {
            sum += v;
            sum / (i + 1) as f64
        } else {
            (prev * (p - 1.0) + v) / p
        };
        result.push(s);
        prev = s;
    }

    result
}

pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    wilder_smooth(&true_range(high, low, close), period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn columns(data: &[(f64, f64, f64)]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        (
            data.iter().map(|d| d.0).collect(),
            data.iter().map(|d| d.1).collect(),
            data.iter().map(|d| d.2).collect(),
        )
    }

    #[test]
    fn true_range_basic() {
        let (h, l, c) = columns(&[
            (105.0, 95.0, 102.0),  // TR = 10
            (108.0, 100.0, 106.0), // TR = max(8, 6, 2) = 8
            (107.0, 98.0, 99.0),   // TR = max(9, 1, 8) = 9
        ]);
        let tr = true_range(&h, &l, &c);
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let (h, l, c) = columns(&[(102.0, 97.0, 100.0), (115.0, 108.0, 112.0)]);
        let tr = true_range(&h, &l, &c);
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let (h, l, c) = columns(&[
            (105.0, 95.0, 102.0),  // TR = 10
            (108.0, 100.0, 106.0), // TR = 8
            (107.0, 98.0, 99.0),   // TR = 9
            (103.0, 97.0, 101.0),  // TR = 6
            (106.0, 100.0, 105.0), // TR = 6
        ]);
        let result = atr(&h, &l, &c, 3);
        // Warm-up: expanding mean
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 9.0, DEFAULT_EPSILON);
        // Seed: mean(10, 8, 9) = 9
        assert_approx(result[2], 9.0, DEFAULT_EPSILON);
        // (9*2 + 6)/3 = 8, then (8*2 + 6)/3 = 22/3
        assert_approx(result[3], 8.0, DEFAULT_EPSILON);
        assert_approx(result[4], 22.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_never_negative_on_inverted_bars() {
        let (h, l, c) = columns(&[(95.0, 105.0, 100.0), (99.0, 101.0, 100.0)]);
        assert!(atr(&h, &l, &c, 14).iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn wilder_smooth_empty_and_zero_period() {
        assert!(wilder_smooth(&[], 14).is_empty());
        assert_eq!(wilder_smooth(&[2.0, 4.0], 0), vec![2.0, 4.0]);
    }
}
