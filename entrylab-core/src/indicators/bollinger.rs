//! Bollinger Bands: moving mean +/- k population standard deviations.
//!
//! The window expands until it reaches `period`, then rolls. Alongside the
//! three bands this computes the relative width `(upper - lower) / mean` and
//! the percent position of the close inside the band, clamped to [0, 1].
//! A zero-width band puts the close at 0.5.

use super::EPS;

/// Band-percent value for a collapsed band.
pub const PCT_NEUTRAL: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bands {
    pub mid: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub width: Vec<f64>,
    pub pct: Vec<f64>,
}

pub fn bollinger(closes: &[f64], period: usize, k: f64) -> Bands {
    let period = period.max(1);
    let n = closes.len();
    let mut bands = Bands {
        mid: Vec::with_capacity(n),
        upper: Vec::with_capacity(n),
        lower: Vec::with_capacity(n),
        width: Vec::with_capacity(n),
        pct: Vec::with_capacity(n),
    };

    for i in 0..n {
        let start = (i + 1).saturating_sub(period);
        let window = &closes[start..=i];
        let len = window.len() as f64;
        let mean = window.iter().sum::<f64>() / len;
        let variance = window
            .iter()
            .map(|&c| {
                let diff = c - mean;
                diff * diff
            })
            .sum::<f64>()
            / len;
        let stdev = variance.sqrt();

        let upper = mean + k * stdev;
        let lower = mean - k * stdev;
        let span = upper - lower;

        bands.mid.push(mean);
        bands.upper.push(upper);
        bands.lower.push(lower);
        bands.width.push(span / mean.abs().max(EPS));
        bands.pct.push(if span.abs() <= EPS {
            PCT_NEUTRAL
        } else {
            ((closes[i] - lower) / span).clamp(0.0, 1.0)
        });
    }

    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn bollinger_middle_is_rolling_mean() {
        let bands = bollinger(&[10.0, 11.0, 12.0, 13.0, 14.0], 3, 2.0);
        assert_approx(bands.mid[0], 10.0, DEFAULT_EPSILON);
        assert_approx(bands.mid[1], 10.5, DEFAULT_EPSILON);
        assert_approx(bands.mid[2], 11.0, DEFAULT_EPSILON);
        assert_approx(bands.mid[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_bands_symmetric() {
        let bands = bollinger(&[10.0, 11.0, 12.0, 13.0, 14.0], 3, 2.0);
        for i in 0..5 {
            let half = bands.upper[i] - bands.mid[i];
            assert_approx(bands.mid[i] - bands.lower[i], half, DEFAULT_EPSILON);
        }
        // stdev of (12, 13, 14) = sqrt(2/3)
        let sd = (2.0f64 / 3.0).sqrt();
        assert_approx(bands.upper[4], 13.0 + 2.0 * sd, DEFAULT_EPSILON);
        assert_approx(bands.width[4], 4.0 * sd / 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_constant_price_zero_width() {
        let bands = bollinger(&[100.0; 6], 3, 2.0);
        for i in 0..6 {
            assert_approx(bands.upper[i], 100.0, DEFAULT_EPSILON);
            assert_approx(bands.width[i], 0.0, DEFAULT_EPSILON);
            assert_eq!(bands.pct[i], PCT_NEUTRAL);
        }
    }

    #[test]
    fn bollinger_pct_is_clamped() {
        let bands = bollinger(&[10.0, 10.0, 10.0, 10.0, 30.0], 4, 0.5);
        assert!(bands.pct.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(bands.pct[4], 1.0);
    }

    #[test]
    fn bollinger_empty() {
        let bands = bollinger(&[], 20, 2.0);
        assert!(bands.mid.is_empty() && bands.pct.is_empty());
    }
}
