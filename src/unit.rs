//! # Unit Module
//!
//! A [`Unit`] is one recognized symbol of a measure together with its conversion
//! weight. It builds the regex that finds its occurrences in a text, and turns the
//! occurrences of one cell into an equivalence regex fragment that accepts the same
//! magnitude written in any convertible sibling unit.
//!
//! ## Fragment shape
//!
//! For a cell mentioning `1g` and `5g` in a measure `{mg: 0.001, g: 1}`:
//!
//! ```text
//! (?=.*(1\s*(?:g)|1000\s*(?:mg)))(?=.*(5\s*(?:g)|5000\s*(?:mg)))
//! ```
//!
//! Every value gets its own lookahead, so a text must contain each magnitude in
//! some notation, in any order.

use std::str::FromStr;

use fancy_regex::Regex;
use log::{trace, warn};
use rust_decimal::Decimal;

use crate::config::ResolvedUnit;
use crate::errors::ConfigError;
use crate::measure_patterns::{
    DECIMAL_SEPARATOR_CLASS, FORMAT_PRECISION, LOOKAHEAD_CLOSE, LOOKAHEAD_OPEN,
    NUMERIC_VALUE_SEARCH, STRING_VALUE_SEARCH, UNIT_NUMBER_REGEX,
};
use crate::measure_types::{MeasureKind, SearchMode};

/// Compile a configuration-derived pattern, case-insensitively
pub fn compile_insensitive(pattern: &str) -> Result<Regex, fancy_regex::Error> {
    Regex::new(&format!("(?i){pattern}"))
}

/// One recognized unit symbol with its search regex
#[derive(Debug, Clone)]
pub struct Unit {
    name: String,
    symbol: String,
    weight: Decimal,
    prefix: String,
    postfix: String,
    max_count: Option<usize>,
    search_mode: SearchMode,
    kind: MeasureKind,
    search_pattern: String,
    search_regex: Regex,
}

impl Unit {
    /// Build a unit from resolved settings
    ///
    /// `value_search` replaces the default value pattern (`\d*[.,]?\d+` for numeric
    /// units, empty for string units) when the measure declares one.
    pub fn new(
        resolved: ResolvedUnit,
        kind: MeasureKind,
        value_search: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let default_search = match kind {
            MeasureKind::Numeric => NUMERIC_VALUE_SEARCH,
            MeasureKind::String => STRING_VALUE_SEARCH,
        };
        let value_search = value_search.unwrap_or(default_search);

        let search_pattern = compose_pattern(
            &resolved.prefix,
            &resolved.symbol,
            &resolved.postfix,
            value_search,
            resolved.search_mode,
        );
        let search_regex = compile_insensitive(&search_pattern)
            .map_err(|err| ConfigError::invalid_pattern(&resolved.name, err))?;

        Ok(Self {
            name: resolved.name,
            symbol: resolved.symbol,
            weight: resolved.weight,
            prefix: resolved.prefix,
            postfix: resolved.postfix,
            max_count: resolved.max_count,
            search_mode: resolved.search_mode,
            kind,
            search_pattern,
            search_regex,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn weight(&self) -> Decimal {
        self.weight
    }

    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    pub fn max_count(&self) -> Option<usize> {
        self.max_count
    }

    /// Pattern used to find occurrences of this unit
    pub fn search_pattern(&self) -> &str {
        &self.search_pattern
    }

    /// Every occurrence of this unit in `text`, truncated to `max_count`
    pub fn extract(&self, text: &str) -> Vec<String> {
        let limit = self.max_count.unwrap_or(usize::MAX);
        let mut found = Vec::new();

        for matched in self.search_regex.find_iter(text) {
            if found.len() >= limit {
                break;
            }
            match matched {
                Ok(matched) => found.push(matched.as_str().to_string()),
                Err(err) => {
                    warn!("Search for unit '{}' aborted: {}", self.name, err);
                    break;
                }
            }
        }

        trace!("Unit '{}' found {} occurrences", self.name, found.len());
        found
    }

    /// Regex fragment for one cell's occurrences
    ///
    /// Numeric units convert each distinct magnitude into every unit of
    /// `siblings`; string units emit their own search pattern. A cell without
    /// occurrences yields an empty fragment.
    pub fn transform(&self, occurrences: &[String], siblings: &[&Unit]) -> String {
        if occurrences.is_empty() {
            return String::new();
        }

        match self.kind {
            MeasureKind::String => wrap_lookahead(&self.search_pattern),
            MeasureKind::Numeric => {
                let mut values: Vec<Decimal> = Vec::new();
                for occurrence in occurrences {
                    match parse_magnitude(occurrence) {
                        Some(value) if !values.contains(&value) => values.push(value),
                        Some(_) => {}
                        None => trace!(
                            "Dropped occurrence '{}' of unit '{}': no number",
                            occurrence,
                            self.name
                        ),
                    }
                }

                values
                    .into_iter()
                    .map(|value| self.equivalence_pattern(value, siblings))
                    .filter(|pattern| !pattern.is_empty())
                    .map(|pattern| wrap_lookahead(&pattern))
                    .collect()
            }
        }
    }

    /// Alternation of `value` written in this unit and in every sibling
    pub fn equivalence_pattern(&self, value: Decimal, siblings: &[&Unit]) -> String {
        std::iter::once(self)
            .chain(siblings.iter().copied())
            .filter_map(|target| {
                let converted = self.convert_to(value, target)?;
                Some(target.literal_pattern(&format_magnitude(converted)))
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    /// `value` of this unit expressed in `target` units
    pub fn convert_to(&self, value: Decimal, target: &Unit) -> Option<Decimal> {
        let ratio = self.weight.checked_div(target.weight)?;
        value.checked_mul(ratio)
    }

    /// This unit's pattern with a fixed number in place of the value search
    fn literal_pattern(&self, number: &str) -> String {
        compose_pattern(
            &self.prefix,
            &self.symbol,
            &self.postfix,
            number,
            self.search_mode,
        )
    }
}

/// `prefix + value + symbol + postfix`, ordered by search mode
pub fn compose_pattern(
    prefix: &str,
    symbol: &str,
    postfix: &str,
    value: &str,
    mode: SearchMode,
) -> String {
    match mode {
        SearchMode::Behind => format!(r"{prefix}{value}\s*(?:{symbol}){postfix}"),
        SearchMode::Front => format!(r"{prefix}(?:{symbol})\s*{value}{postfix}"),
    }
}

/// Render a magnitude so that both decimal separators match
///
/// The value is rounded to 20 fractional digits and trailing zeros are removed,
/// so `2.50` becomes `2[.,]5` and `1000.000` becomes `1000`.
pub fn format_magnitude(value: Decimal) -> String {
    let rendered = value.round_dp(FORMAT_PRECISION).normalize().to_string();
    rendered.replace('.', DECIMAL_SEPARATOR_CLASS)
}

/// First number of an occurrence, comma read as decimal point
pub fn parse_magnitude(occurrence: &str) -> Option<Decimal> {
    let number = UNIT_NUMBER_REGEX.find(occurrence)?.as_str().replace(',', ".");
    Decimal::from_str(&number).ok()
}

fn wrap_lookahead(body: &str) -> String {
    format!("{LOOKAHEAD_OPEN}{body}{LOOKAHEAD_CLOSE}")
}
