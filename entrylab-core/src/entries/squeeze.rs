//! Squeeze breakout entries.
//!
//! Fires when the previous bar's bands were compressed and the current close
//! escapes the previous band by an ATR margin on a volume spike.

use super::{EntryContext, EntryStrategy};
use crate::domain::{EntryEvent, Side};
use crate::features::Feature;
use crate::indicators::EPS;

/// How far above the squeeze threshold the prior width may sit and still count.
pub const SQUEEZE_WIDTH_SLACK: f64 = 1.4;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqueezeBreakout;

impl EntryStrategy for SqueezeBreakout {
    fn name(&self) -> &str {
        "squeeze_breakout"
    }

    fn generate(&self, ctx: &EntryContext<'_>) -> Vec<EntryEvent> {
        let p = ctx.params;
        let spike = p.breakout_volume_spike;
        let mut out = Vec::new();

        for i in ctx.warmup().max(1)..ctx.len() {
            let prev = i - 1;
            if ctx.at(Feature::BbWidth, prev) >= SQUEEZE_WIDTH_SLACK * p.regime_bb_width_squeeze {
                continue;
            }
            let ratio = ctx.at(Feature::VolumeRatio, i);
            if ratio < spike {
                continue;
            }

            let close = ctx.at(Feature::Close, i);
            let margin = p.breakout_atr_margin * ctx.at(Feature::Atr, i).max(0.0);
            let side = if close > ctx.at(Feature::BbUpper, prev) + margin {
                Side::Long
            } else if close < ctx.at(Feature::BbLower, prev) - margin {
                Side::Short
            } else {
                continue;
            };

            let mut reasons = vec![
                match side {
                    Side::Long => "squeeze_breakout_up".to_string(),
                    Side::Short => "squeeze_breakout_down".to_string(),
                },
                "volume_spike".to_string(),
            ];
            let surge = ((ratio - spike) / spike.max(EPS)).min(1.0);
            let mut score = 0.50 + 0.30 * surge;
            if side.sign() * ctx.at(Feature::DiDiff, i) > 0.0 {
                score += 0.10;
                reasons.push("di_confirms".into());
            }
            if let Some(event) = ctx.emit(i, side, score, reasons) {
                out.push(event);
            }
        }
        out
    }
}
