//! # Feature Module
//!
//! A [`Feature`] is one comparable property of a product description: a numeric
//! measure, a string measure, or one of the complex variants. Features are
//! immutable values built once from the configuration by [`build_features`];
//! behaviour dispatches on [`FeatureVariant`].

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use fancy_regex::Regex;
use log::{debug, trace, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::complex_features::{
    percent_base_weight, ratio_base_weight, standardize_dimension, standardize_percent,
    standardize_ratio, DIMENSION_PATTERN, DIMENSION_UNIT, NUMERIC_CONCENTRATION_UNIT,
    PERCENT_CONCENTRATION_UNIT, PERCENT_PATTERN, RATIO_PATTERN,
};
use crate::config::{MeasureGroup, MeasureRecord, MeasuresConfig};
use crate::errors::{ConfigError, FeatureError};
use crate::measure_patterns::{FEATURE_NUMBER_REGEX, NUMERIC_VALUE_SEARCH, STRING_VALUE_SEARCH};
use crate::measure_types::{NotFoundMode, ValidationMode};
use crate::unit::{compile_insensitive, compose_pattern};

/// How a feature standardizes its matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatureVariant {
    Numeric,
    String,
    ComplexDimension,
    ComplexConcentration,
}

impl FeatureVariant {
    /// Complex variant named by a complex measure record
    ///
    /// Matching ignores case and an optional `complex` prefix, and accepts the
    /// historical `Concentation` spelling.
    pub fn complex(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        let key = lowered.strip_prefix("complex").unwrap_or(&lowered).trim();
        match key {
            "dimension" => Some(FeatureVariant::ComplexDimension),
            "concentration" | "concentation" => Some(FeatureVariant::ComplexConcentration),
            _ => None,
        }
    }
}

/// What a feature unit's matches represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitRole {
    Plain,
    Dimension,
    NumericConcentration,
    PercentConcentration,
}

/// One searchable pattern of a feature with its weight
#[derive(Debug, Clone)]
pub struct FeatureUnit {
    name: String,
    pattern: String,
    regex: Regex,
    weight: Decimal,
    role: UnitRole,
}

impl FeatureUnit {
    pub fn new(name: &str, pattern: &str, weight: Decimal, role: UnitRole) -> Result<Self, ConfigError> {
        let regex =
            compile_insensitive(pattern).map_err(|err| ConfigError::invalid_pattern(name, err))?;
        Ok(Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            regex,
            weight,
            role,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn weight(&self) -> Decimal {
        self.weight
    }

    pub fn role(&self) -> UnitRole {
        self.role
    }

    /// Byte ranges of every non-overlapping match in `text`
    pub fn find_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        for matched in self.regex.find_iter(text) {
            match matched {
                Ok(matched) if matched.start() < matched.end() => {
                    spans.push((matched.start(), matched.end()))
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("Search for feature unit '{}' aborted: {}", self.name, err);
                    break;
                }
            }
        }
        spans
    }
}

/// Canonical, unit-independent value of a match
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum StandardValue {
    Number(Decimal),
    Text(String),
    Dimensions(BTreeSet<Decimal>),
}

impl fmt::Display for StandardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StandardValue::Number(number) => write!(f, "{}", number.normalize()),
            StandardValue::Text(text) => write!(f, "{}", text),
            StandardValue::Dimensions(sides) => {
                let sides: Vec<String> = sides
                    .iter()
                    .map(|side| side.normalize().to_string())
                    .collect();
                write!(f, "{}", sides.join("x"))
            }
        }
    }
}

/// A matched span and its standard value; equality ignores the span
#[derive(Debug, Clone, Serialize)]
pub struct FeatureInstance {
    pub original: String,
    pub value: StandardValue,
}

impl PartialEq for FeatureInstance {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for FeatureInstance {}

impl Hash for FeatureInstance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for FeatureInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.original.trim(), self.value)
    }
}

/// One comparable property with its policies
#[derive(Debug, Clone)]
pub struct Feature {
    name: String,
    variant: FeatureVariant,
    priority: i64,
    validation_mode: ValidationMode,
    not_found_mode: NotFoundMode,
    units: Vec<FeatureUnit>,
}

impl Feature {
    pub fn new(
        name: &str,
        variant: FeatureVariant,
        priority: i64,
        validation_mode: ValidationMode,
        not_found_mode: NotFoundMode,
        units: Vec<FeatureUnit>,
    ) -> Self {
        Self {
            name: name.to_string(),
            variant,
            priority,
            validation_mode,
            not_found_mode,
            units,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variant(&self) -> FeatureVariant {
        self.variant
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn validation_mode(&self) -> ValidationMode {
        self.validation_mode
    }

    pub fn not_found_mode(&self) -> NotFoundMode {
        self.not_found_mode
    }

    pub fn units(&self) -> &[FeatureUnit] {
        &self.units
    }

    /// Standardize a span matched by `unit`
    ///
    /// Returns `Ok(None)` when the span carries no usable number. A
    /// concentration feature handed a unit that is neither the ratio nor the
    /// percent form fails with [`FeatureError::UndetectedUnitType`].
    pub fn instantiate(
        &self,
        unit: &FeatureUnit,
        matched: &str,
    ) -> Result<Option<FeatureInstance>, FeatureError> {
        let value = match self.variant {
            FeatureVariant::Numeric => {
                feature_number(matched).and_then(|number| scale_number(number, unit.weight, matched))
            }
            FeatureVariant::String => Some(StandardValue::Text(unit.name.clone())),
            FeatureVariant::ComplexDimension => {
                standardize_dimension(matched).map(StandardValue::Dimensions)
            }
            FeatureVariant::ComplexConcentration => {
                let standard = match unit.role {
                    UnitRole::NumericConcentration => standardize_ratio(matched),
                    UnitRole::PercentConcentration => standardize_percent(matched),
                    UnitRole::Plain | UnitRole::Dimension => {
                        return Err(FeatureError::UndetectedUnitType {
                            feature: self.name.clone(),
                            unit: unit.name.clone(),
                        })
                    }
                };
                standard.and_then(|number| scale_number(number, unit.weight, matched))
            }
        };

        Ok(value.map(|value| FeatureInstance {
            original: matched.to_string(),
            value,
        }))
    }
}

/// `number * weight` as a standard value, `None` on overflow
fn scale_number(number: Decimal, weight: Decimal, matched: &str) -> Option<StandardValue> {
    match number.checked_mul(weight) {
        Some(scaled) => Some(StandardValue::Number(scaled.normalize())),
        None => {
            trace!("Dropping '{}': value overflows when scaled", matched.trim());
            None
        }
    }
}

/// First `\d+[.,]?\d*` of a match, comma read as decimal point
fn feature_number(matched: &str) -> Option<Decimal> {
    let raw = FEATURE_NUMBER_REGEX.find(matched)?.as_str().replace(',', ".");
    Decimal::from_str(raw.trim_end_matches('.')).ok()
}

/// Build every enabled feature of a configuration, sorted by priority
///
/// Sorting is stable, so features of equal priority keep configuration order.
pub fn build_features(config: &MeasuresConfig) -> Result<Vec<Feature>, ConfigError> {
    let mut features = Vec::new();

    for record in enabled_records(&config.numeric_measures) {
        features.push(plain_feature(record, FeatureVariant::Numeric)?);
    }
    for record in enabled_records(&config.string_measures) {
        features.push(plain_feature(record, FeatureVariant::String)?);
    }
    for record in enabled_records(&config.complex_measures) {
        let variant = FeatureVariant::complex(&record.measure_name)
            .ok_or_else(|| ConfigError::UnknownComplexFeature(record.measure_name.clone()))?;
        features.push(Feature::new(
            &record.measure_name,
            variant,
            record.feature_flow.priority,
            record.feature_flow.validation_mode(),
            record.feature_flow.not_found_mode(),
            complex_units(variant)?,
        ));
    }

    features.sort_by_key(Feature::priority);
    debug!(
        "Built {} features: {:?}",
        features.len(),
        features.iter().map(Feature::name).collect::<Vec<_>>()
    );
    Ok(features)
}

fn enabled_records(group: &MeasureGroup) -> impl Iterator<Item = &MeasureRecord> {
    group
        .measures
        .iter()
        .filter(move |record| group.use_it && record.feature_flow.use_it)
}

fn plain_feature(record: &MeasureRecord, variant: FeatureVariant) -> Result<Feature, ConfigError> {
    let data = &record.measure_data;
    let value_search = match variant {
        FeatureVariant::String => data.value_search_override().unwrap_or(STRING_VALUE_SEARCH),
        _ => data.value_search_override().unwrap_or(NUMERIC_VALUE_SEARCH),
    };

    let units = data
        .units
        .iter()
        .filter(|unit| unit.use_it)
        .map(|unit| {
            let resolved = unit.resolve(data)?;
            let pattern = compose_pattern(
                &resolved.prefix,
                &resolved.symbol,
                &resolved.postfix,
                value_search,
                resolved.search_mode,
            );
            FeatureUnit::new(&resolved.name, &pattern, resolved.weight, UnitRole::Plain)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Feature::new(
        &record.measure_name,
        variant,
        record.feature_flow.priority,
        record.feature_flow.validation_mode(),
        record.feature_flow.not_found_mode(),
        units,
    ))
}

fn complex_units(variant: FeatureVariant) -> Result<Vec<FeatureUnit>, ConfigError> {
    match variant {
        FeatureVariant::ComplexDimension => Ok(vec![FeatureUnit::new(
            DIMENSION_UNIT,
            &DIMENSION_PATTERN,
            Decimal::ONE,
            UnitRole::Dimension,
        )?]),
        FeatureVariant::ComplexConcentration => Ok(vec![
            FeatureUnit::new(
                NUMERIC_CONCENTRATION_UNIT,
                &RATIO_PATTERN,
                ratio_base_weight(),
                UnitRole::NumericConcentration,
            )?,
            FeatureUnit::new(
                PERCENT_CONCENTRATION_UNIT,
                &PERCENT_PATTERN,
                percent_base_weight(),
                UnitRole::PercentConcentration,
            )?,
        ]),
        FeatureVariant::Numeric | FeatureVariant::String => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn concentration() -> Feature {
        let variant = FeatureVariant::ComplexConcentration;
        Feature::new(
            "concentration",
            variant,
            1,
            ValidationMode::Strict,
            NotFoundMode::Strict,
            complex_units(variant).unwrap(),
        )
    }

    #[test]
    fn test_complex_variant_names() {
        assert_eq!(
            FeatureVariant::complex("Complex Dimension"),
            Some(FeatureVariant::ComplexDimension)
        );
        assert_eq!(
            FeatureVariant::complex("complex concentation"),
            Some(FeatureVariant::ComplexConcentration)
        );
        assert_eq!(
            FeatureVariant::complex("Concentration"),
            Some(FeatureVariant::ComplexConcentration)
        );
        assert_eq!(FeatureVariant::complex("Complex Volume"), None);
    }

    #[test]
    fn test_numeric_instance_scales_by_weight() {
        let unit = FeatureUnit::new("kilogram", r"\d+\s*кг", Decimal::from(1000), UnitRole::Plain)
            .unwrap();
        let feature = Feature::new(
            "weight",
            FeatureVariant::Numeric,
            10,
            ValidationMode::Strict,
            NotFoundMode::Strict,
            vec![unit.clone()],
        );

        let instance = feature.instantiate(&unit, "2,5 кг").unwrap().unwrap();
        assert_eq!(instance.value, StandardValue::Number(Decimal::from(2500)));
        assert_eq!(instance.to_string(), "2,5 кг = 2500");
        assert!(feature.instantiate(&unit, "кг").unwrap().is_none());
    }

    #[test]
    fn test_percent_and_ratio_are_comparable() {
        let feature = concentration();
        let ratio = &feature.units()[0];
        let percent = &feature.units()[1];

        let from_ratio = feature.instantiate(ratio, "10мг/мл").unwrap().unwrap();
        let from_percent = feature.instantiate(percent, "1%").unwrap().unwrap();
        assert_eq!(from_ratio, from_percent);
    }

    #[test]
    fn test_concentration_rejects_foreign_unit() {
        let feature = concentration();
        let foreign = FeatureUnit::new("n-dimension", "x", Decimal::ONE, UnitRole::Dimension).unwrap();

        let result = feature.instantiate(&foreign, "10x10");
        assert!(matches!(result, Err(FeatureError::UndetectedUnitType { .. })));
    }

    #[test]
    fn test_instances_deduplicate_by_value() {
        let a = FeatureInstance {
            original: "10г".to_string(),
            value: StandardValue::Number(Decimal::from(10)),
        };
        let b = FeatureInstance {
            original: "10 грамм".to_string(),
            value: StandardValue::Number(Decimal::from_str("10.0").unwrap()),
        };
        let set: HashSet<FeatureInstance> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_dimension_display() {
        let value = StandardValue::Dimensions(
            ["0.1", "0.20"]
                .iter()
                .map(|side| Decimal::from_str(side).unwrap())
                .collect(),
        );
        assert_eq!(value.to_string(), "0.1x0.2");
    }

    #[test]
    fn test_find_spans() {
        let unit = FeatureUnit::new("gram", r"\d+\s*г(?!\w)", Decimal::ONE, UnitRole::Plain).unwrap();
        let text = "10 г и 20г";
        let spans = unit.find_spans(text);
        let found: Vec<&str> = spans.iter().map(|&(start, end)| &text[start..end]).collect();
        assert_eq!(found, vec!["10 г", "20г"]);
    }

    #[test]
    fn test_build_features_sorted_by_priority() {
        let config = MeasuresConfig::builtin().unwrap();
        let features = build_features(&config).unwrap();

        let priorities: Vec<i64> = features.iter().map(Feature::priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
        assert_eq!(features[0].variant(), FeatureVariant::ComplexConcentration);
    }
}
