//! Evaluator: a backtest-lite objective for one pass's entries.
//!
//! Each entry is walked forward up to `eval_horizon_bars` against a take-profit
//! and a stop-loss set `eval_tp_atr` / `eval_sl_atr` ATRs from the entry price.
//! The first level touched resolves the trade; a bar touching both counts as a
//! stop-loss. Entries that touch neither stay unresolved.
//!
//! Score, higher is better:
//! - no entries: [`NO_ENTRIES_SCORE`]
//! - fewer than `0.6 x min_trades_gate` resolved trades: [`THIN_SAMPLE_SCORE`]
//! - otherwise `2 x hit_rate + 0.5 x mean_confidence - 0.7 x |trades - target| / target`,
//!   plus 0.05 when both sides traded, with `target = max(2 x min_trades_gate, 1)`

use serde::{Deserialize, Serialize};

use entrylab_core::indicators::{self, Ohlcv, EPS};
use entrylab_core::{Candle, EntryEvent, ParameterSet, Side};

pub const NO_ENTRIES_SCORE: f64 = -9999.0;
pub const THIN_SAMPLE_SCORE: f64 = -5000.0;
/// Share of `min_trades_gate` that must resolve before the score is trusted.
pub const RESOLVED_GATE_FRAC: f64 = 0.6;
pub const BOTH_SIDES_BONUS: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    TakeProfit,
    StopLoss,
    Unresolved,
}

/// Score plus the counts it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub hit_rate: f64,
    pub mean_confidence: f64,
    pub both_sides: bool,
}

impl Evaluation {
    pub fn resolved(&self) -> usize {
        self.wins + self.losses
    }

    fn penalty(score: f64, trades: usize) -> Self {
        Self {
            score,
            trades,
            wins: 0,
            losses: 0,
            hit_rate: 0.0,
            mean_confidence: 0.0,
            both_sides: false,
        }
    }
}

/// Walk one entry forward through `cols`.
pub fn simulate(entry: &EntryEvent, cols: &Ohlcv, atr: &[f64], params: &ParameterSet) -> Outcome {
    let i = entry.bar_index;
    let n = cols.len();
    if i >= n {
        return Outcome::Unresolved;
    }

    let risk = atr.get(i).copied().unwrap_or(0.0).max(EPS);
    let sign = entry.side.sign();
    let take_profit = entry.price + sign * params.eval_tp_atr * risk;
    let stop_loss = entry.price - sign * params.eval_sl_atr * risk;
    let last = i.saturating_add(params.eval_horizon_bars).min(n - 1);

    for j in (i + 1)..=last {
        let (hit_tp, hit_sl) = match entry.side {
            Side::Long => (cols.high[j] >= take_profit, cols.low[j] <= stop_loss),
            Side::Short => (cols.low[j] <= take_profit, cols.high[j] >= stop_loss),
        };
        if hit_sl {
            return Outcome::StopLoss;
        }
        if hit_tp {
            return Outcome::TakeProfit;
        }
    }
    Outcome::Unresolved
}

/// Score `entries` against the candles they were generated from.
pub fn evaluate(entries: &[EntryEvent], candles: &[Candle], params: &ParameterSet) -> Evaluation {
    let trades = entries.len();
    if trades == 0 {
        return Evaluation::penalty(NO_ENTRIES_SCORE, 0);
    }

    let cols = Ohlcv::from_candles(candles);
    let atr = indicators::atr(&cols.high, &cols.low, &cols.close, params.atr_period);

    let (mut wins, mut losses) = (0usize, 0usize);
    for entry in entries {
        match simulate(entry, &cols, &atr, params) {
            Outcome::TakeProfit => wins += 1,
            Outcome::StopLoss => losses += 1,
            Outcome::Unresolved => {}
        }
    }

    let resolved = wins + losses;
    if (resolved as f64) < RESOLVED_GATE_FRAC * params.min_trades_gate as f64 {
        return Evaluation {
            wins,
            losses,
            ..Evaluation::penalty(THIN_SAMPLE_SCORE, trades)
        };
    }

    let hit_rate = if resolved > 0 {
        wins as f64 / resolved as f64
    } else {
        0.0
    };
    let mean_confidence = entries.iter().map(|e| e.confidence).sum::<f64>() / trades as f64;
    let both_sides = entries.iter().any(|e| e.side == Side::Long)
        && entries.iter().any(|e| e.side == Side::Short);

    let target = params.min_trades_gate.saturating_mul(2).max(1) as f64;
    let mut score = 2.0 * hit_rate + 0.5 * mean_confidence
        - 0.7 * (trades as f64 - target).abs() / target;
    if both_sides {
        score += BOTH_SIDES_BONUS;
    }

    Evaluation {
        score,
        trades,
        wins,
        losses,
        hit_rate,
        mean_confidence,
        both_sides,
    }
}
