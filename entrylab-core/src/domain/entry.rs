//! Entry events: the engine's output.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::RegimeTag;

/// Trade direction of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1.0 for long, -1.0 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

/// A scored trade-entry event.
///
/// Immutable once emitted. The postprocessor never edits an event; it keeps,
/// drops, or swaps whole events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryEvent {
    pub ts: NaiveDateTime,
    /// Index of the candle that fired the entry.
    pub bar_index: usize,
    pub side: Side,
    /// Confidence in 0.0..=1.0.
    pub confidence: f64,
    /// Close of the firing candle.
    pub price: f64,
    /// Ordered, human-readable reason tags (e.g. "pullback_to_slow_ma").
    pub reasons: Vec<String>,
    /// Regime active when the entry fired.
    pub regime: RegimeTag,
}

impl EntryEvent {
    pub fn has_reason(&self, needle: &str) -> bool {
        self.reasons.iter().any(|r| r.contains(needle))
    }
}
