//! Parameter store: the persisted parameter set plus its optimization history.
//!
//! Round-trips through TOML and JSON. The format is picked from the file
//! extension on [`ParameterStore::load`] / [`ParameterStore::save`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::params::{ParamError, ParameterSet};
use crate::regime::RuleError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read/write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("serialize TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config extension: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// One completed optimizer run, kept for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecord {
    /// Master seed the trials were derived from.
    pub seed: u64,
    pub trials: usize,
    /// Best score, or `None` when no trial beat the unscored base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub parameters: ParameterSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterStore {
    #[serde(default)]
    pub parameters: ParameterSet,
    #[serde(default)]
    pub optimization_results: Vec<OptimizationRecord>,
}

impl ParameterStore {
    pub fn new(parameters: ParameterSet) -> Self {
        Self {
            parameters,
            optimization_results: Vec::new(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let store: Self = toml::from_str(content)?;
        store.parameters.validate()?;
        Ok(store)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let store: Self = serde_json::from_str(content)?;
        store.parameters.validate()?;
        Ok(store)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match extension(path)?.as_str() {
            "json" => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = match extension(path)?.as_str() {
            "json" => self.to_json()?,
            _ => self.to_toml()?,
        };
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Append an optimizer result; optionally adopt its parameters.
    pub fn record(&mut self, record: OptimizationRecord, adopt: bool) {
        if adopt {
            self.parameters = record.parameters.clone();
        }
        self.optimization_results.push(record);
    }

    /// Highest-scoring recorded run.
    pub fn best_record(&self) -> Option<&OptimizationRecord> {
        self.optimization_results
            .iter()
            .filter(|r| r.score.is_some_and(f64::is_finite))
            .max_by(|a, b| {
                let (a, b) = (a.score.unwrap_or(f64::NEG_INFINITY), b.score.unwrap_or(f64::NEG_INFINITY));
                a.total_cmp(&b)
            })
    }
}

fn extension(path: &Path) -> Result<String, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "toml" | "json" => Ok(ext),
        other => Err(ConfigError::UnknownFormat(other.to_string())),
    }
}
