//! Trend pullback entries.
//!
//! In TREND_UP the strategy buys pullbacks toward the slow EMA; in TREND_DOWN
//! it sells rallies toward it. Stretch is the ATR-normalized distance from the
//! slow EMA, signed so that positive means "extended in the trend's direction".
//!
//! Score:
//! - base 0.35 + 0.30 x closeness, closeness = 1 - clamp(stretch / limit, 0, 1)
//! - +0.15 when RSI has pulled back: past the fixed level (long: rsi <= long
//!   max, short: rsi >= short min) or against the trend's own baseline, the
//!   trailing RSI mean as of the previous bar
//! - +0.10 rejection wick or confirmed pivot
//! - -0.20 when ADX has faded below `trend_adx_weak_frac * regime_adx_trend`

use super::{EntryContext, EntryStrategy};
use crate::domain::{EntryEvent, RegimeTag, Side};
use crate::features::Feature;
use crate::indicators::EPS;

const BASE_SCORE: f64 = 0.35;

#[derive(Debug, Clone, Copy, Default)]
pub struct TrendPullback;

impl TrendPullback {
    fn score_bar(ctx: &EntryContext<'_>, i: usize, side: Side) -> Option<(f64, Vec<String>)> {
        let p = ctx.params;
        let limit = p.trend_pullback_atr;
        let atr = ctx.at(Feature::Atr, i).max(EPS);
        let stretch = side.sign() * (ctx.at(Feature::Close, i) - ctx.at(Feature::EmaSlow, i)) / atr;

        if !(stretch > -limit && stretch < limit) {
            return None;
        }

        let closeness = 1.0 - (stretch / limit.max(EPS)).clamp(0.0, 1.0);
        let mut score = BASE_SCORE + 0.30 * closeness;
        let mut reasons = vec!["pullback_to_slow_ma".to_string()];

        let rsi = ctx.at(Feature::Rsi, i);
        let baseline = ctx.at(Feature::RsiMean, i.saturating_sub(1));
        let rsi_confirms = match side {
            Side::Long => rsi <= p.trend_rsi_long_max || rsi < baseline,
            Side::Short => rsi >= p.trend_rsi_short_min || rsi > baseline,
        };
        if rsi_confirms {
            score += 0.15;
            reasons.push("rsi_pullback".into());
        }

        if let Some(tag) = ctx.reversal_evidence(i, side) {
            score += 0.10;
            reasons.push(tag.into());
        }

        // anti-flip: a fading trend should not keep firing
        if ctx.at(Feature::Adx, i) < p.trend_adx_weak_frac * p.regime_adx_trend {
            score -= 0.20;
            reasons.push("adx_weak".into());
        }

        Some((score, reasons))
    }
}

impl EntryStrategy for TrendPullback {
    fn name(&self) -> &str {
        "trend_pullback"
    }

    fn generate(&self, ctx: &EntryContext<'_>) -> Vec<EntryEvent> {
        let side = match ctx.regime {
            RegimeTag::TrendUp => Side::Long,
            RegimeTag::TrendDown => Side::Short,
            _ => return Vec::new(),
        };

        (ctx.warmup()..ctx.len())
            .filter_map(|i| {
                let (score, reasons) = Self::score_bar(ctx, i, side)?;
                ctx.emit(i, side, score, reasons)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSet;
    use crate::indicators::make_candles;
    use crate::params::ParameterSet;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn drifting_closes(n: usize, drift: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| 100.0 + drift * i as f64 + rng.gen_range(-1.0..1.0))
            .collect()
    }

    fn run(closes: &[f64], regime: RegimeTag, params: &ParameterSet) -> Vec<EntryEvent> {
        let candles = make_candles(closes);
        let fs = FeatureSet::compute(&candles, params);
        TrendPullback.generate(&EntryContext::new(&candles, &fs, params, regime))
    }

    #[test]
    fn uptrend_pullbacks_clear_default_floor() {
        let params = ParameterSet::default();
        let entries = run(&drifting_closes(200, 0.1, 42), RegimeTag::TrendUp, &params);
        assert!(!entries.is_empty());
        assert!(entries.iter().all(|e| e.side == Side::Long));
        assert!(entries.iter().any(|e| e.has_reason("pullback")));
        assert!(entries.iter().all(|e| e.confidence >= params.min_confidence));
    }

    #[test]
    fn rsi_below_its_baseline_confirms() {
        // fixed level disabled: only the trailing baseline can confirm
        let params = ParameterSet {
            min_confidence: 0.0,
            trend_rsi_long_max: 0.0,
            ..ParameterSet::default()
        };
        let entries = run(&drifting_closes(200, 0.1, 42), RegimeTag::TrendUp, &params);
        assert!(entries.iter().any(|e| e.has_reason("rsi_pullback")));
        assert!(entries.iter().any(|e| !e.has_reason("rsi_pullback")));
    }

    #[test]
    fn downtrend_emits_shorts_only() {
        let params = ParameterSet {
            min_confidence: 0.35,
            trend_adx_weak_frac: 0.0,
            ..ParameterSet::default()
        };
        let entries = run(&drifting_closes(200, -0.05, 7), RegimeTag::TrendDown, &params);
        assert!(entries.iter().all(|e| e.side == Side::Short));
    }

    #[test]
    fn no_entries_before_warmup() {
        let params = ParameterSet {
            min_confidence: 0.0,
            ..ParameterSet::default()
        };
        let closes = drifting_closes(100, 0.05, 1);
        let warmup = params.warmup_bars(closes.len());
        let entries = run(&closes, RegimeTag::TrendUp, &params);
        assert!(entries.iter().all(|e| e.bar_index >= warmup));
    }

    #[test]
    fn non_trend_regime_is_ignored() {
        let params = ParameterSet::default();
        let entries = run(&drifting_closes(100, 0.05, 1), RegimeTag::Range, &params);
        assert!(entries.is_empty());
    }

    #[test]
    fn weak_adx_penalty_applies() {
        let params = ParameterSet {
            min_confidence: 0.0,
            trend_adx_weak_frac: 10.0,
            ..ParameterSet::default()
        };
        let entries = run(&drifting_closes(120, 0.05, 3), RegimeTag::TrendUp, &params);
        assert!(!entries.is_empty());
        assert!(entries.iter().all(|e| e.has_reason("adx_weak")));
    }
}
