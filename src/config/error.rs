use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures raised while reading settings from the environment or
/// validating an assembled [`EngineConfig`](crate::config::EngineConfig).
///
/// Every variant is fatal: the engine refuses to construct with a
/// configuration that does not validate.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An integer setting could not be parsed.
    #[error("failed to parse {key} from '{value}': {source}")]
    InvalidInteger {
        key: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A floating-point setting could not be parsed.
    #[error("failed to parse {key} from '{value}': {source}")]
    InvalidNumber {
        key: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// A setting parsed but falls outside its allowed range.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    /// A similarity band violates `0 <= min <= target_min <= target_max <= 1`.
    #[error("similarity band '{name}' is not ordered: min={min}, target_min={target_min}, target_max={target_max}")]
    InvalidBand {
        name: String,
        min: f32,
        target_min: f32,
        target_max: f32,
    },

    /// A band override references a rule code outside the catalogue.
    #[error("band override names unknown rule code '{code}'")]
    UnknownRuleCode { code: String },

    /// A band override references a rule that does not consume a band.
    #[error("rule {code} does not take a similarity band")]
    RuleNotBanded { code: String },

    /// The configured data dir exists but is not a directory.
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
