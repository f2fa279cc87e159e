//! Band-extreme mean reversion for RANGE and HIGH_VOLATILITY.
//!
//! Long when price sits at the lower band with RSI oversold, short at the
//! upper band with RSI overbought. The high-volatility variant uses the same
//! logic with every threshold tightened by a quarter.

use super::{EntryContext, EntryStrategy};
use crate::domain::{EntryEvent, Side};
use crate::features::Feature;
use crate::indicators::EPS;

/// Threshold multiplier for the high-volatility variant.
pub const HIGH_VOL_TIGHTEN: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanReversion {
    /// 1.0 leaves thresholds as configured; smaller values demand deeper extremes.
    tighten: f64,
    name: &'static str,
}

impl MeanReversion {
    pub fn range() -> Self {
        Self {
            tighten: 1.0,
            name: "mean_reversion",
        }
    }

    pub fn high_volatility() -> Self {
        Self {
            tighten: HIGH_VOL_TIGHTEN,
            name: "high_volatility_reversion",
        }
    }

    pub fn tighten(&self) -> f64 {
        self.tighten
    }

    /// (band extreme, oversold, overbought) after tightening.
    pub fn thresholds(&self, ctx: &EntryContext<'_>) -> (f64, f64, f64) {
        let p = ctx.params;
        (
            p.range_bb_extreme * self.tighten,
            p.range_rsi_oversold * self.tighten,
            100.0 - (100.0 - p.range_rsi_overbought) * self.tighten,
        )
    }
}

impl EntryStrategy for MeanReversion {
    fn name(&self) -> &str {
        self.name
    }

    fn generate(&self, ctx: &EntryContext<'_>) -> Vec<EntryEvent> {
        let (extreme, oversold, overbought) = self.thresholds(ctx);
        let floor = extreme.max(EPS);
        let mut out = Vec::new();

        for i in ctx.warmup()..ctx.len() {
            let pct = ctx.at(Feature::BbPct, i);
            let rsi = ctx.at(Feature::Rsi, i);

            let (side, excess, mut reasons) = if pct <= extreme && rsi <= oversold {
                (
                    Side::Long,
                    (extreme - pct) / floor,
                    vec!["bb_lower_extreme".to_string(), "rsi_oversold".to_string()],
                )
            } else if pct >= 1.0 - extreme && rsi >= overbought {
                (
                    Side::Short,
                    (pct - (1.0 - extreme)) / floor,
                    vec!["bb_upper_extreme".to_string(), "rsi_overbought".to_string()],
                )
            } else {
                continue;
            };

            let mut score = 0.45 + 0.20 * excess.clamp(0.0, 1.0);
            if let Some(tag) = ctx.reversal_evidence(i, side) {
                score += 0.10;
                reasons.push(tag.into());
            }
            if let Some(event) = ctx.emit(i, side, score, reasons) {
                out.push(event);
            }
        }
        out
    }
}
