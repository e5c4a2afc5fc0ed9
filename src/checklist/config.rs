//! Rule thresholds, similarity bands, and their environment overrides.

use std::collections::BTreeMap;
use std::env;

use crate::config::error::{ConfigError, ConfigResult};
use crate::constants::{DEFAULT_DRIFT_THRESHOLD, DEFAULT_H2_COUNT_MAX, DEFAULT_H2_COUNT_MIN};

use super::types::{Band, RuleCode};

/// Default band for the Title/H1 relation (CV-009).
pub const DEFAULT_TITLE_H1_BAND: Band = Band::new(0.75, 0.80, 0.90);

/// Default band for the Title/Meta relation (CV-020).
pub const DEFAULT_TITLE_META_BAND: Band = Band::new(0.50, 0.60, 0.80);

/// Default band for the H1/Meta relation (CV-021).
pub const DEFAULT_H1_META_BAND: Band = Band::new(0.65, 0.70, 0.85);

/// Every threshold the checklist consults. Nothing in the evaluator is
/// hard-coded; callers tune relations per site profile and the defaults
/// reflect the published guidance bands.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    /// Title/H1 similarity band (CV-009).
    pub title_h1_band: Band,
    /// Title/Meta similarity band (CV-020).
    pub title_meta_band: Band,
    /// H1/Meta similarity band (CV-021).
    pub h1_meta_band: Band,
    /// H2 scores below this value count as drifting (CV-012).
    pub drift_threshold: f32,
    /// Up to this many drifting H2 nodes is a warning; more is a failure.
    pub drift_warn_limit: usize,
    /// Inclusive H2 count band (CV-013).
    pub h2_count_min: usize,
    pub h2_count_max: usize,
    /// Minimum mean H3/parent similarity (CV-019).
    pub h3_parent_mean_min: f32,
    /// Minimum mean H2/core-topic similarity (CV-022).
    pub h2_core_mean_min: f32,
    /// Maximum spread between the best and worst H2/core score (CV-023).
    pub h2_core_spread_max: f32,
    /// Floor for the weakest H3/parent score (CV-035).
    pub h3_parent_floor: f32,
    /// Aggregate score at or above which CV-036 passes.
    pub aggregate_pass_at: f64,
    /// Aggregate score at or above which CV-036 warns instead of failing.
    pub aggregate_warn_at: f64,
    /// Per-rule band replacements, keyed by `CV-xxx` label. Only the three
    /// relation rules accept one; anything else is rejected by `validate`.
    pub band_overrides: BTreeMap<String, Band>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            title_h1_band: DEFAULT_TITLE_H1_BAND,
            title_meta_band: DEFAULT_TITLE_META_BAND,
            h1_meta_band: DEFAULT_H1_META_BAND,
            drift_threshold: DEFAULT_DRIFT_THRESHOLD,
            drift_warn_limit: 2,
            h2_count_min: DEFAULT_H2_COUNT_MIN,
            h2_count_max: DEFAULT_H2_COUNT_MAX,
            h3_parent_mean_min: 0.60,
            h2_core_mean_min: 0.60,
            h2_core_spread_max: 0.30,
            h3_parent_floor: 0.50,
            aggregate_pass_at: 80.0,
            aggregate_warn_at: 60.0,
            band_overrides: BTreeMap::new(),
        }
    }
}

impl RuleConfig {
    pub const ENV_DRIFT_THRESHOLD: &'static str = "CONTEXTVEC_DRIFT_THRESHOLD";
    pub const ENV_H2_COUNT_MIN: &'static str = "CONTEXTVEC_H2_COUNT_MIN";
    pub const ENV_H2_COUNT_MAX: &'static str = "CONTEXTVEC_H2_COUNT_MAX";

    /// Loads the tunable knobs from the environment, falling back to the
    /// defaults for anything unset or unparseable. Band overrides are
    /// programmatic only.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            drift_threshold: parse_f32_from_env(
                Self::ENV_DRIFT_THRESHOLD,
                defaults.drift_threshold,
            ),
            h2_count_min: parse_usize_from_env(Self::ENV_H2_COUNT_MIN, defaults.h2_count_min),
            h2_count_max: parse_usize_from_env(Self::ENV_H2_COUNT_MAX, defaults.h2_count_max),
            ..defaults
        }
    }

    /// Replaces the band of one relation rule. The label is validated later;
    /// `validate` rejects unknown codes and rules that take no band.
    pub fn with_band_override(mut self, code: impl Into<String>, band: Band) -> Self {
        self.band_overrides.insert(code.into(), band);
        self
    }

    pub fn with_drift_threshold(mut self, threshold: f32) -> Self {
        self.drift_threshold = threshold;
        self
    }

    pub fn with_h2_count(mut self, min: usize, max: usize) -> Self {
        self.h2_count_min = min;
        self.h2_count_max = max;
        self
    }

    /// Effective band for a relation rule, override first. `None` for rules
    /// that do not consume a band.
    pub fn band_for(&self, code: RuleCode) -> Option<Band> {
        if let Some(band) = self.band_overrides.get(code.as_str()) {
            return Some(*band);
        }
        match code {
            RuleCode::Cv009 => Some(self.title_h1_band),
            RuleCode::Cv020 => Some(self.title_meta_band),
            RuleCode::Cv021 => Some(self.h1_meta_band),
            _ => None,
        }
    }

    /// Checks every threshold for internal consistency. Called by the
    /// evaluator constructor; any error here is fatal.
    pub fn validate(&self) -> ConfigResult<()> {
        check_band("title_h1", &self.title_h1_band)?;
        check_band("title_meta", &self.title_meta_band)?;
        check_band("h1_meta", &self.h1_meta_band)?;

        for (label, band) in &self.band_overrides {
            let code = RuleCode::parse(label).ok_or_else(|| ConfigError::UnknownRuleCode {
                code: label.clone(),
            })?;
            if !matches!(code, RuleCode::Cv009 | RuleCode::Cv020 | RuleCode::Cv021) {
                return Err(ConfigError::RuleNotBanded {
                    code: label.clone(),
                });
            }
            check_band(label, band)?;
        }

        check_unit("drift_threshold", self.drift_threshold)?;
        check_unit("h3_parent_mean_min", self.h3_parent_mean_min)?;
        check_unit("h2_core_mean_min", self.h2_core_mean_min)?;
        check_unit("h2_core_spread_max", self.h2_core_spread_max)?;
        check_unit("h3_parent_floor", self.h3_parent_floor)?;

        if self.h2_count_min == 0 {
            return Err(ConfigError::InvalidValue {
                key: "h2_count_min",
                message: "must be at least 1".to_string(),
            });
        }
        if self.h2_count_min > self.h2_count_max {
            return Err(ConfigError::InvalidValue {
                key: "h2_count_max",
                message: format!(
                    "must be >= h2_count_min ({} > {})",
                    self.h2_count_min, self.h2_count_max
                ),
            });
        }

        if !(0.0..=100.0).contains(&self.aggregate_warn_at)
            || !(0.0..=100.0).contains(&self.aggregate_pass_at)
            || self.aggregate_warn_at > self.aggregate_pass_at
        {
            return Err(ConfigError::InvalidValue {
                key: "aggregate_warn_at",
                message: format!(
                    "aggregate thresholds must satisfy 0 <= warn ({}) <= pass ({}) <= 100",
                    self.aggregate_warn_at, self.aggregate_pass_at
                ),
            });
        }

        Ok(())
    }
}

fn check_band(name: &str, band: &Band) -> ConfigResult<()> {
    if band.is_ordered() {
        Ok(())
    } else {
        Err(ConfigError::InvalidBand {
            name: name.to_string(),
            min: band.min,
            target_min: band.target_min,
            target_max: band.target_max,
        })
    }
}

fn check_unit(key: &'static str, value: f32) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            message: format!("must be within [0, 1], got {value}"),
        })
    }
}

fn parse_f32_from_env(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(default)
}

fn parse_usize_from_env(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}
