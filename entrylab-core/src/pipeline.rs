//! One full pass: features, regime, entries, postprocessing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Candle, EntryEvent, RegimeTag};
use crate::entries::{EntryContext, StrategyRegistry};
use crate::features::{FeatureSet, FeatureSnapshot};
use crate::params::ParameterSet;
use crate::postprocess::postprocess;
use crate::regime::{RegimeClassifier, StaticClassifier};

/// Result of one pass over a candle window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub regime: RegimeTag,
    /// Final entries after clustering and cooldown, in bar order.
    pub entries: Vec<EntryEvent>,
    /// Strategy emissions before postprocessing.
    pub raw_count: usize,
    /// Last-bar feature values; `None` for an empty window.
    pub snapshot: Option<FeatureSnapshot>,
}

/// Classifier plus strategy table. Stateless between runs, so one pipeline
/// can be shared across threads.
pub struct Pipeline {
    classifier: Box<dyn RegimeClassifier>,
    registry: StrategyRegistry,
}

impl Pipeline {
    pub fn new(classifier: Box<dyn RegimeClassifier>, registry: StrategyRegistry) -> Self {
        Self {
            classifier,
            registry,
        }
    }

    pub fn classifier(&self) -> &dyn RegimeClassifier {
        self.classifier.as_ref()
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Classify the window, then generate and postprocess entries.
    pub fn run(&self, candles: &[Candle], params: &ParameterSet) -> PipelineOutput {
        let features = FeatureSet::compute(candles, params);
        let regime = self.classifier.classify(&features, params);
        self.run_with_features(candles, &features, params, regime)
    }

    /// Generate entries under a caller-chosen regime, skipping classification.
    pub fn run_in_regime(
        &self,
        candles: &[Candle],
        params: &ParameterSet,
        regime: RegimeTag,
    ) -> PipelineOutput {
        let features = FeatureSet::compute(candles, params);
        self.run_with_features(candles, &features, params, regime)
    }

    fn run_with_features(
        &self,
        candles: &[Candle],
        features: &FeatureSet,
        params: &ParameterSet,
        regime: RegimeTag,
    ) -> PipelineOutput {
        let ctx = EntryContext::new(candles, features, params, regime);
        let raw = self.registry.dispatch(&ctx);
        let entries = postprocess(&raw, params.cluster_window_bars, params.cooldown_bars);
        let snapshot = features.snapshot();

        if entries.is_empty() {
            debug!(
                classifier = self.classifier.name(),
                regime = %regime,
                bars = candles.len(),
                raw = raw.len(),
                snapshot = ?snapshot,
                "pass produced no entries"
            );
        }

        PipelineOutput {
            regime,
            entries,
            raw_count: raw.len(),
            snapshot,
        }
    }
}

impl Default for Pipeline {
    /// Static classifier with the stock strategy table.
    fn default() -> Self {
        Self::new(Box::new(StaticClassifier), StrategyRegistry::with_defaults())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("classifier", &self.classifier.name())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Run the default pipeline over `candles`.
pub fn generate_entries(candles: &[Candle], params: &ParameterSet) -> PipelineOutput {
    Pipeline::default().run(candles, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;
    use crate::regime::RuleClassifier;

    #[test]
    fn empty_window_is_no_data() {
        let out = generate_entries(&[], &ParameterSet::default());
        assert_eq!(out.regime, RegimeTag::NoData);
        assert!(out.entries.is_empty());
        assert!(out.snapshot.is_none());
    }

    #[test]
    fn short_window_never_emits() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let pipeline = Pipeline::default();
        for regime in RegimeTag::ALL {
            let out = pipeline.run_in_regime(&make_candles(&closes), &ParameterSet::default(), regime);
            assert!(out.entries.is_empty(), "{regime}");
        }
    }

    #[test]
    fn flat_window_is_quiet() {
        let out = generate_entries(&make_candles(&vec![100.0; 50]), &ParameterSet::default());
        assert!(matches!(out.regime, RegimeTag::Squeeze | RegimeTag::Range));
        assert!(out.entries.is_empty());
        assert_eq!(out.snapshot.map(|s| s.bars), Some(50));
    }

    #[test]
    fn huge_periods_do_not_panic() {
        let params = ParameterSet {
            adx_period: usize::MAX / 2 + 1,
            rsi_period: usize::MAX,
            atr_period: usize::MAX,
            bb_period: usize::MAX,
            pivot_lookback: usize::MAX,
            ..ParameterSet::default()
        };
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let candles = make_candles(&closes);
        for regime in RegimeTag::ALL {
            let out = Pipeline::default().run_in_regime(&candles, &params, regime);
            assert!(out.entries.is_empty(), "{regime}");
        }
        let out = generate_entries(&candles, &params);
        assert!(out.entries.is_empty());
    }

    #[test]
    fn rule_classifier_plugs_in() {
        let pipeline = Pipeline::new(
            Box::new(RuleClassifier::default()),
            StrategyRegistry::with_defaults(),
        );
        let out = pipeline.run(&make_candles(&vec![100.0; 50]), &ParameterSet::default());
        assert_ne!(out.regime, RegimeTag::NoData);
    }
}
