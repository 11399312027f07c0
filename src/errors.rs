//! # Error Types Module
//!
//! This module defines the error types used throughout the matching engines.
//! Configuration errors are fatal at construction time, feature errors are fatal
//! during extraction, and cancellation is a distinguished control-flow signal.

use thiserror::Error;

/// Errors raised while turning a configuration into engines
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A unit or feature pattern does not compile
    #[error("invalid pattern for '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    /// A relative weight cannot be read as a decimal
    #[error("invalid relative weight for unit '{unit}': {value}")]
    InvalidWeight { unit: String, value: String },

    /// A relative weight is zero or negative
    #[error("relative weight for unit '{unit}' must be positive, got {value}")]
    NonPositiveWeight { unit: String, value: String },

    /// A complex measure name matches no known complex feature
    #[error("unknown complex feature '{0}'")]
    UnknownComplexFeature(String),

    /// A measure requested by name is not loaded
    #[error("unknown measure '{0}'")]
    UnknownMeasure(String),

    /// Engine options out of range
    #[error("invalid option '{option}': {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },

    /// Malformed configuration document
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("configuration read error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid_pattern(name: &str, source: fancy_regex::Error) -> Self {
        ConfigError::InvalidPattern {
            name: name.to_string(),
            source: Box::new(source),
        }
    }
}

/// Errors raised while standardizing a matched span
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    /// A concentration feature received a sub-pattern it cannot standardize
    #[error("undetected unit type '{unit}' for feature '{feature}'")]
    UndetectedUnitType { feature: String, unit: String },
}

/// Errors surfaced by the batch entry points
#[derive(Debug, Error)]
pub enum MatchError {
    /// The stop flag was observed; partial results were discarded
    #[error("extraction was stopped")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// A composite regex failed to compile or run
    #[error("composite regex error: {0}")]
    Pattern(#[from] Box<fancy_regex::Error>),
}

impl MatchError {
    /// Whether this error is the cooperative-cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MatchError::Cancelled)
    }
}
