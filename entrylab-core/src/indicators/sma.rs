//! Simple Moving Average (SMA).
//!
//! Rolling mean over a sliding window, maintained with a running sum.
//! Bars before the window fills use the expanding mean of what is available.

/// Rolling mean of `values` over `period` (floored to 1).
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let mut result = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        let window = (i + 1).min(period);
        result.push(sum / window as f64);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let result = sma(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0], 5);
        assert_eq!(result.len(), 7);
        // SMA[4] = mean(10..=14) = 12.0
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_warmup_is_expanding_mean() {
        let result = sma(&[10.0, 20.0, 30.0, 40.0], 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 15.0, DEFAULT_EPSILON);
        assert_approx(result[2], 20.0, DEFAULT_EPSILON);
        assert_approx(result[3], 30.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_no_lookahead() {
        let full = sma(&[1.0, 5.0, 2.0, 8.0, 3.0, 9.0], 3);
        let truncated = sma(&[1.0, 5.0, 2.0, 8.0], 3);
        for i in 0..truncated.len() {
            assert_eq!(full[i], truncated[i]);
        }
    }

    #[test]
    fn sma_zero_period_and_empty() {
        assert_eq!(sma(&[3.0, 4.0], 0), vec![3.0, 4.0]);
        assert!(sma(&[], 5).is_empty());
    }
}
