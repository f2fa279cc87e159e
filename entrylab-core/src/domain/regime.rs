//! Market regime tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete market state characterizing the last bar of a feature window.
///
/// Exactly one tag is produced per classification call. External vocabularies
/// (older configs, other tools) are mapped onto this set by [`RegimeTag::from_alias`]
/// when they cross into the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeTag {
    NoData,
    TrendUp,
    TrendDown,
    Range,
    Squeeze,
    HighVolatility,
}

impl RegimeTag {
    pub const ALL: [RegimeTag; 6] = [
        RegimeTag::NoData,
        RegimeTag::TrendUp,
        RegimeTag::TrendDown,
        RegimeTag::Range,
        RegimeTag::Squeeze,
        RegimeTag::HighVolatility,
    ];

    /// Canonical name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoData => "NO_DATA",
            Self::TrendUp => "TREND_UP",
            Self::TrendDown => "TREND_DOWN",
            Self::Range => "RANGE",
            Self::Squeeze => "SQUEEZE",
            Self::HighVolatility => "HIGH_VOLATILITY",
        }
    }

    /// Resolve a canonical name or a legacy alias (case-insensitive).
    pub fn from_alias(name: &str) -> Option<Self> {
        let key = name.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        let tag = match key.as_str() {
            "NO_DATA" | "NONE" | "UNKNOWN" => Self::NoData,
            "TREND_UP" | "TRENDING_UP" | "UPTREND" | "BULL_TREND" => Self::TrendUp,
            "TREND_DOWN" | "TRENDING_DOWN" | "DOWNTREND" | "BEAR_TREND" => Self::TrendDown,
            "RANGE" | "RANGING" | "SIDEWAYS" | "CHOP" => Self::Range,
            "SQUEEZE" | "LOW_VOLATILITY" | "COMPRESSION" => Self::Squeeze,
            "HIGH_VOLATILITY" | "HIGH_VOL" | "VOLATILE" => Self::HighVolatility,
            _ => return None,
        };
        Some(tag)
    }

    pub fn is_trend(&self) -> bool {
        matches!(self, Self::TrendUp | Self::TrendDown)
    }
}

impl fmt::Display for RegimeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
