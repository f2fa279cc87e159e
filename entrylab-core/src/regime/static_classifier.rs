//! Fixed-threshold classifier.

use super::RegimeClassifier;
use crate::domain::RegimeTag;
use crate::features::{Feature, FeatureSet};
use crate::params::ParameterSet;

/// Windows shorter than this classify as [`RegimeTag::NoData`].
pub const MIN_CLASSIFY_BARS: usize = 30;

/// Classifies the last bar in fixed precedence order:
/// high volatility, squeeze, trend (direction from the EMA spread), range.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticClassifier;

impl RegimeClassifier for StaticClassifier {
    fn classify(&self, features: &FeatureSet, params: &ParameterSet) -> RegimeTag {
        if features.len() < MIN_CLASSIFY_BARS {
            return RegimeTag::NoData;
        }

        let atr_pct = features.last(Feature::AtrPct);
        let width = features.last(Feature::BbWidth);
        let adx = features.last(Feature::Adx);

        if atr_pct >= params.regime_atr_pct_high {
            return RegimeTag::HighVolatility;
        }
        if width <= params.regime_bb_width_squeeze && adx < params.regime_adx_trend {
            return RegimeTag::Squeeze;
        }
        if adx >= params.regime_adx_trend {
            let spread = features.last(Feature::EmaFast) - features.last(Feature::EmaSlow);
            return if spread >= 0.0 {
                RegimeTag::TrendUp
            } else {
                RegimeTag::TrendDown
            };
        }
        RegimeTag::Range
    }

    fn name(&self) -> &str {
        "static"
    }
}
