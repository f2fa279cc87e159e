//! Regime classification.
//!
//! A classifier reads the last bar of a [`FeatureSet`] and names the market
//! state. Two implementations ship: [`StaticClassifier`] with fixed
//! parameter-driven thresholds, and [`RuleClassifier`] driven by a prioritized
//! rule list loaded from configuration.

pub mod rules;
pub mod static_classifier;

pub use rules::{
    Bias, Comparator, RegimeRule, RuleClassifier, RuleError, RuleFeature, RuleSet,
    ThresholdCheck,
};
pub use static_classifier::StaticClassifier;

use crate::domain::RegimeTag;
use crate::features::FeatureSet;
use crate::params::ParameterSet;

/// Maps a feature window to exactly one regime tag.
///
/// Implementations must be pure: the same features and parameters always
/// yield the same tag.
pub trait RegimeClassifier: Send + Sync {
    fn classify(&self, features: &FeatureSet, params: &ParameterSet) -> RegimeTag;

    /// Classifier name for logging.
    fn name(&self) -> &str;
}
