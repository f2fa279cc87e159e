//! Parameter space and random sampling.
//!
//! A [`ParameterSpace`] is an ordered list of `(field, range)` declarations.
//! Declarations are checked against [`ParameterSet`] when they are made, so a
//! sample can only fail if the parameter set itself rejects a value.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::params::{invalid, ParamError, ParameterSet};

/// Allowed values for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterRange {
    /// One of an explicit list.
    Choice { values: Vec<f64> },
    /// Continuous in `[min, max]`, or on the grid `min + k * step`.
    Float {
        min: f64,
        max: f64,
        #[serde(default)]
        step: Option<f64>,
    },
    /// Integers in `[min, max]`, on the grid `min + k * step` (step 1 by default).
    Int {
        min: i64,
        max: i64,
        #[serde(default)]
        step: Option<i64>,
    },
}

impl ParameterRange {
    pub fn int(min: i64, max: i64) -> Self {
        Self::Int {
            min,
            max,
            step: None,
        }
    }

    pub fn int_step(min: i64, max: i64, step: i64) -> Self {
        Self::Int {
            min,
            max,
            step: Some(step),
        }
    }

    pub fn float(min: f64, max: f64, step: f64) -> Self {
        Self::Float {
            min,
            max,
            step: Some(step),
        }
    }

    pub fn choice(values: &[f64]) -> Self {
        Self::Choice {
            values: values.to_vec(),
        }
    }

    /// Check the range itself and that it fits the field it is declared for.
    fn validate(&self, field: &str) -> Result<(), ParamError> {
        let integer_field = ParameterSet::is_integer_field(field);
        match self {
            Self::Choice { values } => {
                if values.is_empty() {
                    return Err(invalid(field, f64::NAN, "empty choice list"));
                }
                for &v in values {
                    if !v.is_finite() {
                        return Err(invalid(field, v, "choice must be finite"));
                    }
                    if integer_field && (v < 0.0 || v.fract() != 0.0) {
                        return Err(invalid(field, v, "choice must be a non-negative integer"));
                    }
                }
            }
            Self::Float { min, max, step } => {
                if integer_field {
                    return Err(invalid(field, *min, "integer field needs an Int range"));
                }
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(invalid(field, *min, "bounds must be finite with min <= max"));
                }
                if let Some(s) = step {
                    if !s.is_finite() || *s <= 0.0 {
                        return Err(invalid(field, *s, "step must be > 0"));
                    }
                }
            }
            Self::Int { min, max, step } => {
                if min > max {
                    return Err(invalid(field, *min as f64, "min must be <= max"));
                }
                if integer_field && *min < 0 {
                    return Err(invalid(field, *min as f64, "must be non-negative"));
                }
                if let Some(s) = step {
                    if *s <= 0 {
                        return Err(invalid(field, *s as f64, "step must be > 0"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Draw one value. Stepped ranges land on the grid and never exceed `max`.
    /// An empty choice list yields NaN, which [`ParameterSet::set`] rejects.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Choice { values } => {
                if values.is_empty() {
                    return f64::NAN;
                }
                values[rng.gen_range(0..values.len())]
            }
            Self::Float {
                min,
                max,
                step: None,
            } => {
                if min >= max {
                    *min
                } else {
                    rng.gen_range(*min..=*max)
                }
            }
            Self::Float {
                min,
                max,
                step: Some(step),
            } => {
                let slots = ((max - min) / step + 1e-9).floor() as u64;
                let k = rng.gen_range(0..=slots);
                (min + k as f64 * step).clamp(*min, *max)
            }
            Self::Int { min, max, step } => {
                let step = step.unwrap_or(1).max(1);
                let slots = ((max - min) / step).max(0);
                let k = rng.gen_range(0..=slots);
                (min + k * step) as f64
            }
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        match self {
            Self::Choice { values } => values.contains(&value),
            Self::Float { min, max, .. } => value >= *min && value <= *max,
            Self::Int { min, max, .. } => value >= *min as f64 && value <= *max as f64,
        }
    }
}

/// Ordered, validated parameter ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    ranges: Vec<(String, ParameterRange)>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) the range of one field.
    pub fn declare(&mut self, field: &str, range: ParameterRange) -> Result<(), ParamError> {
        ParameterSet::default().get(field)?;
        range.validate(field)?;
        match self.ranges.iter_mut().find(|(name, _)| name == field) {
            Some(slot) => slot.1 = range,
            None => self.ranges.push((field.to_string(), range)),
        }
        Ok(())
    }

    pub fn range(&self, field: &str) -> Option<&ParameterRange> {
        self.ranges
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterRange)> {
        self.ranges.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Clone `base` and overwrite every declared field with a fresh draw.
    /// Draws happen in declaration order, so a seeded RNG replays exactly.
    pub fn sample<R: Rng>(
        &self,
        base: &ParameterSet,
        rng: &mut R,
    ) -> Result<ParameterSet, ParamError> {
        let mut out = base.clone();
        for (field, range) in &self.ranges {
            out.set(field, range.sample(rng))?;
        }
        Ok(out)
    }
}

/// Search ranges for every pipeline-tunable field.
///
/// Evaluation settings (`eval_*`, `min_trades_gate`) are left out: they define
/// the score and are not searched. The fast EMA range sits entirely below the
/// slow one, so every sample passes [`ParameterSet::validate`].
pub fn default_space() -> ParameterSpace {
    use ParameterRange as R;

    let table: Vec<(&str, ParameterRange)> = vec![
        ("ema_fast", R::int(5, 25)),
        ("ema_slow", R::int_step(30, 120, 5)),
        ("rsi_period", R::int(7, 28)),
        ("atr_period", R::int(7, 28)),
        ("bb_period", R::int_step(10, 40, 2)),
        ("bb_std", R::float(1.5, 3.0, 0.25)),
        ("adx_period", R::int(7, 28)),
        ("volume_period", R::int_step(10, 40, 5)),
        ("pivot_lookback", R::int(2, 5)),
        ("regime_adx_trend", R::float(15.0, 35.0, 1.0)),
        ("regime_bb_width_squeeze", R::float(0.02, 0.10, 0.005)),
        ("regime_atr_pct_high", R::float(2.0, 6.0, 0.25)),
        ("trend_pullback_atr", R::float(0.5, 2.5, 0.1)),
        ("trend_rsi_long_max", R::float(40.0, 60.0, 1.0)),
        ("trend_rsi_short_min", R::float(40.0, 60.0, 1.0)),
        ("trend_adx_weak_frac", R::float(0.3, 0.9, 0.05)),
        ("range_bb_extreme", R::float(0.0, 0.25, 0.01)),
        ("range_rsi_oversold", R::float(20.0, 40.0, 1.0)),
        ("range_rsi_overbought", R::float(60.0, 80.0, 1.0)),
        ("wick_ratio_min", R::float(0.3, 0.7, 0.05)),
        ("breakout_atr_margin", R::float(0.0, 0.5, 0.05)),
        ("breakout_volume_spike", R::float(1.2, 2.5, 0.1)),
        ("cooldown_bars", R::int(0, 12)),
        ("cluster_window_bars", R::int(0, 6)),
        ("min_confidence", R::choice(&[0.45, 0.5, 0.55, 0.6, 0.65])),
    ];

    let mut space = ParameterSpace::new();
    for (field, range) in table {
        let declared = space.declare(field, range);
        debug_assert!(declared.is_ok(), "default space: {declared:?}");
    }
    space
}

// ─── Tests ───────────────────────────────────────────────────────────
