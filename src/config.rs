//! # Configuration Module
//!
//! This module defines the serde model of the measures configuration document,
//! its loading from JSON, and the engine options shared by both batch paths.
//!
//! The document groups measures by kind:
//!
//! ```json
//! {
//!   "numeric_measures": { "use_it": true, "measures": [ ... ] },
//!   "string_measures":  { "use_it": true, "measures": [ ... ] },
//!   "complex_measures": { "use_it": true, "measures": [ ... ] }
//! }
//! ```
//!
//! Unit-level `prefix`, `postfix` and `max_count` set to `"common"` inherit the
//! measure's `common_*` values.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ConfigError;
use crate::measure_patterns::DEFAULT_CHUNK_SIZE;
use crate::measure_types::{MergeMode, NotFoundMode, SearchMode, ValidationMode};

/// Keyword that makes a unit inherit the measure-level value
pub const COMMON: &str = "common";

/// Built-in measures catalog
const BUILTIN_CONFIG: &str = include_str!("../config/measures.json");

/// Root of the measures configuration document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasuresConfig {
    #[serde(default)]
    pub config_name: Option<String>,
    #[serde(default)]
    pub numeric_measures: MeasureGroup,
    #[serde(default)]
    pub string_measures: MeasureGroup,
    #[serde(default)]
    pub complex_measures: MeasureGroup,
}

/// One family of measures
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasureGroup {
    #[serde(default)]
    pub use_it: bool,
    #[serde(default)]
    pub measures: Vec<MeasureRecord>,
}

/// One measure and its settings for both engines
#[derive(Debug, Clone, Deserialize)]
pub struct MeasureRecord {
    pub measure_name: String,
    #[serde(default)]
    pub measure_data: MeasureData,
    #[serde(default, rename = "autosem", alias = "SemantiX")]
    pub autosem: AutosemConfig,
    #[serde(default, rename = "feature_flow", alias = "FeatureFlow")]
    pub feature_flow: FeatureFlowConfig,
}

/// Units of a measure plus the values they may inherit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasureData {
    #[serde(default)]
    pub units: Vec<UnitRecord>,
    #[serde(default)]
    pub common_prefix: String,
    #[serde(default)]
    pub common_postfix: String,
    #[serde(default)]
    pub common_max_count: Option<Value>,
    #[serde(default)]
    pub special_value_search: Option<String>,
}

impl MeasureData {
    /// Value search override, ignoring an empty string
    pub fn value_search_override(&self) -> Option<&str> {
        self.special_value_search
            .as_deref()
            .filter(|search| !search.is_empty())
    }
}

/// One unit as written in the configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UnitRecord {
    pub unit_name: String,
    pub symbol: String,
    pub relative_weight: Value,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub postfix: Option<String>,
    #[serde(default)]
    pub max_count: Option<Value>,
    #[serde(default)]
    pub search_mode: Option<String>,
    #[serde(default = "default_true")]
    pub use_it: bool,
}

/// Fully resolved unit settings, after inheritance and validation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUnit {
    pub name: String,
    pub symbol: String,
    pub weight: Decimal,
    pub prefix: String,
    pub postfix: String,
    pub max_count: Option<usize>,
    pub search_mode: SearchMode,
}

impl UnitRecord {
    /// Resolve `"common"` values against the measure and validate the weight
    pub fn resolve(&self, data: &MeasureData) -> Result<ResolvedUnit, ConfigError> {
        let weight = parse_weight(&self.unit_name, &self.relative_weight)?;

        Ok(ResolvedUnit {
            name: self.unit_name.clone(),
            symbol: self.symbol.clone(),
            weight,
            prefix: inherit(self.prefix.as_deref(), &data.common_prefix),
            postfix: inherit(self.postfix.as_deref(), &data.common_postfix),
            max_count: self.resolve_max_count(data.common_max_count.as_ref()),
            search_mode: self
                .search_mode
                .as_deref()
                .map(SearchMode::checkout)
                .unwrap_or_default(),
        })
    }

    fn resolve_max_count(&self, common: Option<&Value>) -> Option<usize> {
        match &self.max_count {
            Some(Value::String(raw)) if raw == COMMON => common.and_then(parse_count),
            Some(Value::Null) | None => common.and_then(parse_count),
            Some(value) => parse_count(value),
        }
    }
}

/// Occurrence limit from a number or a numeric string; anything else means no limit
fn parse_count(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number.as_u64().map(|count| count as usize),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

/// Measure-engine settings of a measure record
#[derive(Debug, Clone, Deserialize)]
pub struct AutosemConfig {
    #[serde(default = "default_merge_mode")]
    pub merge_mode: Value,
    #[serde(default)]
    pub exclude_rx: bool,
    #[serde(default)]
    pub use_it: bool,
}

impl Default for AutosemConfig {
    fn default() -> Self {
        Self {
            merge_mode: default_merge_mode(),
            exclude_rx: false,
            use_it: false,
        }
    }
}

impl AutosemConfig {
    pub fn merge_mode(&self) -> MergeMode {
        match &self.merge_mode {
            Value::String(raw) => MergeMode::checkout(raw),
            Value::Number(number) => MergeMode::checkout(&number.to_string()),
            other => {
                debug!("Unsupported merge mode value {}, using default", other);
                MergeMode::default()
            }
        }
    }
}

/// Feature-flow settings of a measure record
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlowConfig {
    #[serde(default)]
    pub use_it: bool,
    #[serde(default)]
    pub validation_mode: String,
    #[serde(default)]
    pub not_found_mode: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
}

impl Default for FeatureFlowConfig {
    fn default() -> Self {
        Self {
            use_it: false,
            validation_mode: String::new(),
            not_found_mode: String::new(),
            priority: default_priority(),
        }
    }
}

impl FeatureFlowConfig {
    pub fn validation_mode(&self) -> ValidationMode {
        ValidationMode::checkout(&self.validation_mode)
    }

    pub fn not_found_mode(&self) -> NotFoundMode {
        NotFoundMode::checkout(&self.not_found_mode)
    }
}

impl MeasuresConfig {
    /// Parse a configuration document from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: MeasuresConfig = serde_json::from_str(json)?;
        debug!(
            "Parsed measures config '{}': {} numeric, {} string, {} complex",
            config.config_name.as_deref().unwrap_or("unnamed"),
            config.numeric_measures.measures.len(),
            config.string_measures.measures.len(),
            config.complex_measures.measures.len()
        );
        Ok(config)
    }

    /// Read and parse a configuration document from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading measures config from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_CONFIG)
    }
}

/// Options shared by the measures engine and the feature validator
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Pad cells with spaces before measure extraction
    pub add_spaces: bool,
    /// Rows per offloaded chunk when a worker pool is supplied
    pub chunk_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            add_spaces: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl EngineOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidOption {
                option: "chunk_size",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse a relative weight given as a JSON number or string
pub fn parse_weight(unit: &str, raw: &Value) -> Result<Decimal, ConfigError> {
    let text = match raw {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    };

    let weight = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| ConfigError::InvalidWeight {
            unit: unit.to_string(),
            value: text.clone(),
        })?;

    if weight <= Decimal::ZERO {
        return Err(ConfigError::NonPositiveWeight {
            unit: unit.to_string(),
            value: text,
        });
    }

    Ok(weight.normalize())
}

fn inherit(value: Option<&str>, common: &str) -> String {
    match value {
        Some(value) if value != COMMON => value.to_string(),
        _ => common.to_string(),
    }
}

fn default_true() -> bool {
    true
}

fn default_merge_mode() -> Value {
    Value::String("overall".to_string())
}

fn default_priority() -> i64 {
    10
}
