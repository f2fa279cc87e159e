//! ADX: Average Directional Index (Wilder), with its DI+ / DI- components.
//!
//! 1. +DM / -DM from consecutive highs and lows
//! 2. Wilder-smooth +DM, -DM and TR
//! 3. DI± = 100 * smoothed(±DM) / smoothed(TR)
//! 4. DX = 100 * |DI+ - DI-| / (DI+ + DI-)
//! 5. ADX = Wilder-smoothed DX, starting at bar `period`; its first full value
//!    lands at `2 * period - 1` and is backfilled over the earlier bars.
//!
//! All three outputs are clamped to [0, 100].

use super::atr::{true_range, wilder_smooth};
use super::EPS;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directional {
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
    pub adx: Vec<f64>,
}

pub fn directional(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Directional {
    let period = period.max(1);
    let n = high.len().min(low.len()).min(close.len());
    if n == 0 {
        return Directional::default();
    }

    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let up = high[i] - high[i - 1];
        let down = low[i - 1] - low[i];
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    let smooth_tr = wilder_smooth(&true_range(high, low, close), period);
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);

    let mut plus_di = Vec::with_capacity(n);
    let mut minus_di = Vec::with_capacity(n);
    let mut dx = Vec::with_capacity(n);
    for i in 0..n {
        let tr = smooth_tr[i].max(EPS);
        let p = (100.0 * smooth_plus[i] / tr).clamp(0.0, 100.0);
        let m = (100.0 * smooth_minus[i] / tr).clamp(0.0, 100.0);
        let sum = p + m;
        dx.push(if sum <= EPS {
            0.0
        } else {
            (100.0 * (p - m).abs() / sum).clamp(0.0, 100.0)
        });
        plus_di.push(p);
        minus_di.push(m);
    }

    let start = period.min(n);
    let mut adx = vec![0.0; n];
    if start == n {
        // Not enough bars to begin smoothing: fall back to the mean DX.
        let mean = dx.iter().sum::<f64>() / n as f64;
        adx.iter_mut().for_each(|a| *a = mean);
    } else {
        let smoothed = wilder_smooth(&dx[start..], period);
        adx[start..].copy_from_slice(&smoothed);
        let anchor = period.saturating_mul(2).saturating_sub(1).min(n - 1);
        let first = adx[anchor];
        adx[..anchor].iter_mut().for_each(|a| *a = first);
    }
    adx.iter_mut().for_each(|a| *a = a.clamp(0.0, 100.0));

    Directional {
        plus_di,
        minus_di,
        adx,
    }
}
