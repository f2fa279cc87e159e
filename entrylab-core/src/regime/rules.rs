//! Rule-driven regime classification.
//!
//! Rules are typed and validated when a [`RuleSet`] is built, so classification
//! itself cannot fail. A rule file may mix two forms:
//!
//! ```toml
//! [[rules]]
//! id = "trend_up"
//! regime = "TREND_UP"
//! priority = 60
//! bias = "bullish"
//! checks = [{ feature = "adx", comparator = "at_least", value = 25.0 }]
//!
//! [[rules]]
//! id = "high_vol"
//! priority = 100
//! thresholds = { atr_pct_min = 3.5 }
//! ```
//!
//! The second (legacy) form names each threshold by feature prefix plus a
//! direction word and is translated into typed checks on load.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use super::RegimeClassifier;
use crate::domain::RegimeTag;
use crate::features::{Feature, FeatureSet};
use crate::params::ParameterSet;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule '{rule}': unknown threshold name '{name}'")]
    UnknownThreshold { rule: String, name: String },

    #[error("rule '{rule}': cannot resolve regime '{name}'")]
    UnknownRegime { rule: String, name: String },

    #[error("rule '{rule}': {feature} threshold {value} outside [{min}, {max}]")]
    ValueOutOfRange {
        rule: String,
        feature: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("rule id '{0}' declared more than once")]
    DuplicateId(String),

    #[error("rule with empty id")]
    EmptyId,

    #[error("rule #{index}: {reason}")]
    InvalidEntry { index: usize, reason: String },

    #[error("rule file parse error (TOML): {0}")]
    Toml(#[from] toml::de::Error),

    #[error("rule file parse error (JSON): {0}")]
    Json(#[from] serde_json::Error),
}

/// Features a rule may test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFeature {
    Adx,
    DiDiff,
    Rsi,
    BbWidth,
    AtrPct,
}

impl RuleFeature {
    /// Longest prefixes first so `di_diff_min` is not read as something shorter.
    const PREFIXES: [(&'static str, RuleFeature); 5] = [
        ("di_diff", RuleFeature::DiDiff),
        ("bb_width", RuleFeature::BbWidth),
        ("atr_pct", RuleFeature::AtrPct),
        ("adx", RuleFeature::Adx),
        ("rsi", RuleFeature::Rsi),
    ];

    pub fn feature(&self) -> Feature {
        match self {
            Self::Adx => Feature::Adx,
            Self::DiDiff => Feature::DiDiff,
            Self::Rsi => Feature::Rsi,
            Self::BbWidth => Feature::BbWidth,
            Self::AtrPct => Feature::AtrPct,
        }
    }

    /// Inclusive range a threshold on this feature may take.
    pub fn valid_range(&self) -> (f64, f64) {
        match self {
            Self::Adx | Self::Rsi => (0.0, 100.0),
            Self::DiDiff => (-100.0, 100.0),
            Self::BbWidth | Self::AtrPct => (0.0, f64::MAX),
        }
    }

    fn from_threshold_name(name: &str) -> Option<Self> {
        Self::PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|&(_, f)| f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// actual >= value
    AtLeast,
    /// actual <= value
    AtMost,
}

impl Comparator {
    pub fn passes(&self, actual: f64, value: f64) -> bool {
        match self {
            Self::AtLeast => actual >= value,
            Self::AtMost => actual <= value,
        }
    }

    fn from_threshold_name(name: &str) -> Option<Self> {
        match name {
            "rsi_bullish" | "rsi_overbought" => return Some(Self::AtLeast),
            "rsi_bearish" | "rsi_oversold" => return Some(Self::AtMost),
            _ => {}
        }
        if name.contains("min") {
            Some(Self::AtLeast)
        } else if name.contains("max") {
            Some(Self::AtMost)
        } else {
            None
        }
    }
}

/// Directional requirement on DI+ - DI-.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    /// DI+ strictly above DI-.
    Bullish,
    /// DI- strictly above DI+.
    Bearish,
}

impl Bias {
    pub fn passes(&self, di_diff: f64) -> bool {
        match self {
            Self::Bullish => di_diff > 0.0,
            Self::Bearish => di_diff < 0.0,
        }
    }

    /// Direction named by a whole token of the id, so `squeeze_setup` has none.
    fn from_rule_id(id: &str) -> Option<Self> {
        let id = id.to_ascii_lowercase();
        id.split(['_', '-', ' ']).find_map(|token| match token {
            "up" | "bull" | "bullish" => Some(Self::Bullish),
            "down" | "bear" | "bearish" => Some(Self::Bearish),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCheck {
    pub feature: RuleFeature,
    pub comparator: Comparator,
    pub value: f64,
}

impl ThresholdCheck {
    pub fn passes(&self, features: &FeatureSet) -> bool {
        self.comparator
            .passes(features.last(self.feature.feature()), self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeRule {
    pub id: String,
    pub regime: RegimeTag,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias: Option<Bias>,
    pub checks: Vec<ThresholdCheck>,
}

impl RegimeRule {
    /// True when every check passes and the bias (if any) agrees.
    pub fn matches(&self, features: &FeatureSet) -> bool {
        if let Some(bias) = self.bias {
            if !bias.passes(features.last(Feature::DiDiff)) {
                return false;
            }
        }
        self.checks.iter().all(|c| c.passes(features))
    }

    fn validate(&self) -> Result<(), RuleError> {
        if self.id.trim().is_empty() {
            return Err(RuleError::EmptyId);
        }
        for check in &self.checks {
            let (min, max) = check.feature.valid_range();
            if !check.value.is_finite() || check.value < min || check.value > max {
                return Err(RuleError::ValueOutOfRange {
                    rule: self.id.clone(),
                    feature: check.feature.feature().name(),
                    value: check.value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Untyped rule descriptor as found in older configuration files.
#[derive(Debug, Clone, Deserialize)]
struct LegacyRule {
    id: String,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    regime: Option<String>,
    thresholds: BTreeMap<String, f64>,
}

impl LegacyRule {
    fn translate(self) -> Result<RegimeRule, RuleError> {
        let regime = match &self.regime {
            Some(name) => RegimeTag::from_alias(name).ok_or_else(|| RuleError::UnknownRegime {
                rule: self.id.clone(),
                name: name.clone(),
            })?,
            None => regime_from_id(&self.id).ok_or_else(|| RuleError::UnknownRegime {
                rule: self.id.clone(),
                name: self.id.clone(),
            })?,
        };

        let mut checks = Vec::with_capacity(self.thresholds.len());
        for (name, value) in &self.thresholds {
            let key = name.to_ascii_lowercase();
            let unknown = || RuleError::UnknownThreshold {
                rule: self.id.clone(),
                name: name.clone(),
            };
            let feature = RuleFeature::from_threshold_name(&key).ok_or_else(unknown)?;
            let comparator = Comparator::from_threshold_name(&key).ok_or_else(unknown)?;
            checks.push(ThresholdCheck {
                feature,
                comparator,
                value: *value,
            });
        }

        Ok(RegimeRule {
            bias: Bias::from_rule_id(&self.id),
            id: self.id,
            regime,
            priority: self.priority,
            checks,
        })
    }
}

/// Resolve a regime from a rule id such as `trend_up_strong`: the whole id
/// first, then ever shorter `_`-separated prefixes.
fn regime_from_id(id: &str) -> Option<RegimeTag> {
    let parts: Vec<&str> = id.split(['_', '-', ' ']).collect();
    (1..=parts.len())
        .rev()
        .find_map(|k| RegimeTag::from_alias(&parts[..k].join("_")))
}

/// Entries stay raw until [`parse_entry`] picks a form, so a malformed typed
/// rule reports its own error instead of a failed legacy fallback.
#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: Vec<serde_json::Value>,
}

/// A `checks` key marks the typed form, `thresholds` the legacy one.
fn parse_entry(index: usize, entry: serde_json::Value) -> Result<RegimeRule, RuleError> {
    let invalid = |e: serde_json::Error| RuleError::InvalidEntry {
        index,
        reason: e.to_string(),
    };
    if entry.get("checks").is_some() {
        serde_json::from_value::<RegimeRule>(entry).map_err(invalid)
    } else if entry.get("thresholds").is_some() {
        serde_json::from_value::<LegacyRule>(entry)
            .map_err(invalid)?
            .translate()
    } else {
        Err(RuleError::InvalidEntry {
            index,
            reason: "expected `checks` or `thresholds`".into(),
        })
    }
}

/// Validated rules, ordered by descending priority.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSet {
    rules: Vec<RegimeRule>,
}

impl RuleSet {
    /// Validate and order `rules`. Equal priorities keep declaration order.
    pub fn new(mut rules: Vec<RegimeRule>) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.id.clone()) {
                return Err(RuleError::DuplicateId(rule.id.clone()));
            }
        }
        rules.sort_by_key(|r| std::cmp::Reverse(r.priority));
        Ok(Self { rules })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, RuleError> {
        let file: RuleFile = toml::from_str(text)?;
        Self::from_entries(file.rules)
    }

    pub fn from_json_str(text: &str) -> Result<Self, RuleError> {
        let file: RuleFile = serde_json::from_str(text)?;
        Self::from_entries(file.rules)
    }

    fn from_entries(entries: Vec<serde_json::Value>) -> Result<Self, RuleError> {
        let rules = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| parse_entry(i, entry))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rules)
    }

    /// Rules mirroring the static classifier at default parameters.
    ///
    /// Trend direction comes from DI+ - DI- rather than the EMA spread, and
    /// checks are inclusive: ADX exactly 25 with a narrow band is SQUEEZE here
    /// while the static classifier calls it a trend.
    pub fn default_rules() -> Self {
        let check = |feature, comparator, value| ThresholdCheck {
            feature,
            comparator,
            value,
        };
        let rules = vec![
            RegimeRule {
                id: "high_volatility".into(),
                regime: RegimeTag::HighVolatility,
                priority: 100,
                bias: None,
                checks: vec![check(RuleFeature::AtrPct, Comparator::AtLeast, 3.5)],
            },
            RegimeRule {
                id: "squeeze".into(),
                regime: RegimeTag::Squeeze,
                priority: 80,
                bias: None,
                checks: vec![
                    check(RuleFeature::BbWidth, Comparator::AtMost, 0.05),
                    check(RuleFeature::Adx, Comparator::AtMost, 25.0),
                ],
            },
            RegimeRule {
                id: "trend_up".into(),
                regime: RegimeTag::TrendUp,
                priority: 60,
                bias: Some(Bias::Bullish),
                checks: vec![check(RuleFeature::Adx, Comparator::AtLeast, 25.0)],
            },
            RegimeRule {
                id: "trend_down".into(),
                regime: RegimeTag::TrendDown,
                priority: 60,
                bias: Some(Bias::Bearish),
                checks: vec![check(RuleFeature::Adx, Comparator::AtLeast, 25.0)],
            },
        ];
        Self { rules }
    }

    pub fn rules(&self) -> &[RegimeRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First matching rule in priority order.
    pub fn first_match(&self, features: &FeatureSet) -> Option<&RegimeRule> {
        self.rules.iter().find(|r| r.matches(features))
    }
}

/// Classifier backed by a [`RuleSet`]. No matching rule means RANGE.
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    rules: RuleSet,
}

impl RuleClassifier {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::new(RuleSet::default_rules())
    }
}

impl RegimeClassifier for RuleClassifier {
    fn classify(&self, features: &FeatureSet, _params: &ParameterSet) -> RegimeTag {
        if features.is_empty() {
            return RegimeTag::NoData;
        }
        self.rules
            .first_match(features)
            .map(|r| r.regime)
            .unwrap_or(RegimeTag::Range)
    }

    fn name(&self) -> &str {
        "rules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(values: &[(Feature, f64)]) -> FeatureSet {
        let mut fs = FeatureSet::with_len(1);
        for &(feature, v) in values {
            fs.insert(feature, vec![v]);
        }
        fs
    }

    fn classify(rules: &RuleSet, fs: &FeatureSet) -> RegimeTag {
        RuleClassifier::new(rules.clone()).classify(fs, &ParameterSet::default())
    }

    #[test]
    fn empty_features_are_no_data() {
        let fs = FeatureSet::with_len(0);
        assert_eq!(classify(&RuleSet::default_rules(), &fs), RegimeTag::NoData);
    }

    #[test]
    fn no_match_falls_back_to_range() {
        let fs = bar(&[(Feature::Adx, 10.0), (Feature::BbWidth, 0.3)]);
        assert_eq!(classify(&RuleSet::default_rules(), &fs), RegimeTag::Range);
    }

    #[test]
    fn bias_picks_trend_direction() {
        let rules = RuleSet::default_rules();
        let up = bar(&[(Feature::Adx, 30.0), (Feature::BbWidth, 0.3), (Feature::DiDiff, 8.0)]);
        let down = bar(&[(Feature::Adx, 30.0), (Feature::BbWidth, 0.3), (Feature::DiDiff, -8.0)]);
        assert_eq!(classify(&rules, &up), RegimeTag::TrendUp);
        assert_eq!(classify(&rules, &down), RegimeTag::TrendDown);
    }

    #[test]
    fn higher_priority_wins_and_ties_keep_order() {
        let rule = |id: &str, regime, priority| RegimeRule {
            id: id.into(),
            regime,
            priority,
            bias: None,
            checks: vec![],
        };
        let rules = RuleSet::new(vec![
            rule("a", RegimeTag::Range, 1),
            rule("b", RegimeTag::Squeeze, 5),
            rule("c", RegimeTag::TrendUp, 5),
        ])
        .unwrap();
        assert_eq!(rules.rules()[0].id, "b");
        assert_eq!(rules.rules()[1].id, "c");
        assert_eq!(classify(&rules, &bar(&[])), RegimeTag::Squeeze);
    }

    #[test]
    fn typed_toml_loads() {
        let text = r#"
            [[rules]]
            id = "trend_up"
            regime = "TREND_UP"
            priority = 60
            bias = "bullish"
            checks = [{ feature = "adx", comparator = "at_least", value = 25.0 }]
        "#;
        let rules = RuleSet::from_toml_str(text).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.rules()[0].bias, Some(Bias::Bullish));
    }

    #[test]
    fn legacy_descriptor_translates() {
        let text = r#"
            [[rules]]
            id = "trend_up_strong"
            priority = 70
            thresholds = { adx_min = 30.0, rsi_bullish = 55.0 }

            [[rules]]
            id = "chop"
            thresholds = { bb_width_max = 0.04 }
        "#;
        let rules = RuleSet::from_toml_str(text).unwrap();
        let strong = &rules.rules()[0];
        assert_eq!(strong.regime, RegimeTag::TrendUp);
        assert_eq!(strong.bias, Some(Bias::Bullish));
        assert!(strong.checks.contains(&ThresholdCheck {
            feature: RuleFeature::Adx,
            comparator: Comparator::AtLeast,
            value: 30.0,
        }));
        assert!(strong.checks.contains(&ThresholdCheck {
            feature: RuleFeature::Rsi,
            comparator: Comparator::AtLeast,
            value: 55.0,
        }));

        let chop = &rules.rules()[1];
        assert_eq!(chop.regime, RegimeTag::Range);
        assert_eq!(chop.bias, None);
        assert_eq!(chop.checks[0].comparator, Comparator::AtMost);
    }

    #[test]
    fn legacy_oscillator_words_map_direction() {
        let json = r#"{"rules": [
            {"id": "bear_exhaustion", "regime": "downtrend", "thresholds": {"rsi_oversold": 25.0}}
        ]}"#;
        let rules = RuleSet::from_json_str(json).unwrap();
        let rule = &rules.rules()[0];
        assert_eq!(rule.regime, RegimeTag::TrendDown);
        assert_eq!(rule.bias, Some(Bias::Bearish));
        assert_eq!(rule.checks[0].comparator, Comparator::AtMost);
    }

    #[test]
    fn unknown_threshold_is_load_error() {
        let text = r#"
            [[rules]]
            id = "range"
            thresholds = { macd_min = 1.0 }
        "#;
        assert!(matches!(
            RuleSet::from_toml_str(text),
            Err(RuleError::UnknownThreshold { .. })
        ));
    }

    #[test]
    fn unknown_regime_is_load_error() {
        let text = r#"
            [[rules]]
            id = "mystery"
            thresholds = { adx_min = 20.0 }
        "#;
        assert!(matches!(
            RuleSet::from_toml_str(text),
            Err(RuleError::UnknownRegime { .. })
        ));
    }

    #[test]
    fn out_of_range_value_is_load_error() {
        let text = r#"
            [[rules]]
            id = "trend_up"
            thresholds = { adx_min = 140.0 }
        "#;
        assert!(matches!(
            RuleSet::from_toml_str(text),
            Err(RuleError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn bias_needs_a_whole_direction_token() {
        for id in ["squeeze_setup", "support_range", "bb_upper_fade", "breakdown_watch"] {
            assert_eq!(Bias::from_rule_id(id), None, "{id}");
        }
        assert_eq!(Bias::from_rule_id("trend_up"), Some(Bias::Bullish));
        assert_eq!(Bias::from_rule_id("Bull-Run"), Some(Bias::Bullish));
        assert_eq!(Bias::from_rule_id("bearish pressure"), Some(Bias::Bearish));
    }

    #[test]
    fn legacy_setup_id_has_no_bias() {
        let text = r#"
            [[rules]]
            id = "squeeze_setup"
            regime = "squeeze"
            thresholds = { bb_width_max = 0.04 }
        "#;
        let rules = RuleSet::from_toml_str(text).unwrap();
        assert_eq!(rules.rules()[0].regime, RegimeTag::Squeeze);
        assert_eq!(rules.rules()[0].bias, None);
    }

    #[test]
    fn typed_rule_typo_reports_its_own_error() {
        let text = r#"
            [[rules]]
            id = "trend_up"
            regime = "TREND_UP"
            checks = [{ feature = "adx", comparator = "atleast", value = 25.0 }]
        "#;
        match RuleSet::from_toml_str(text) {
            Err(RuleError::InvalidEntry { index, reason }) => {
                assert_eq!(index, 0);
                assert!(reason.contains("atleast"), "{reason}");
            }
            other => panic!("expected InvalidEntry, got {other:?}"),
        }
    }

    #[test]
    fn entry_without_checks_or_thresholds_rejected() {
        let json = r#"{"rules": [{"id": "range", "regime": "RANGE"}]}"#;
        assert!(matches!(
            RuleSet::from_json_str(json),
            Err(RuleError::InvalidEntry { index: 0, .. })
        ));
    }

    #[test]
    fn default_rules_inclusive_at_adx_boundary() {
        use crate::regime::StaticClassifier;

        let fs = bar(&[
            (Feature::Adx, 25.0),
            (Feature::BbWidth, 0.04),
            (Feature::DiDiff, 5.0),
        ]);
        assert_eq!(classify(&RuleSet::default_rules(), &fs), RegimeTag::Squeeze);

        let mut long = FeatureSet::with_len(40);
        for (feature, v) in [
            (Feature::Adx, 25.0),
            (Feature::BbWidth, 0.04),
            (Feature::EmaFast, 101.0),
            (Feature::EmaSlow, 100.0),
        ] {
            long.insert(feature, vec![v; 40]);
        }
        assert_eq!(
            StaticClassifier.classify(&long, &ParameterSet::default()),
            RegimeTag::TrendUp
        );
    }

    #[test]
    fn duplicate_ids_rejected() {
        let rule = RegimeRule {
            id: "x".into(),
            regime: RegimeTag::Range,
            priority: 0,
            bias: None,
            checks: vec![],
        };
        assert!(matches!(
            RuleSet::new(vec![rule.clone(), rule]),
            Err(RuleError::DuplicateId(_))
        ));
    }
}
