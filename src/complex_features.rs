//! # Complex Features Module
//!
//! Multi-token measurements that are parsed with bespoke rules instead of a
//! unit table:
//!
//! - **Dimension**: sizes such as `10см х 20см` or `100 x 200 x 5 mm`. Every
//!   side is scaled to meters and the standard value is the set of sides.
//! - **Concentration**: ratios such as `5мг/мл` and percentages such as `1%`.
//!
//! The search patterns are exposed so the feature builder can compile them with
//! the rest of the feature units.

use std::collections::BTreeSet;
use std::str::FromStr;

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;
use rust_decimal::Decimal;

/// Feature name of the dimension variant
pub const DIMENSION_FEATURE: &str = "Complex Dimension";
/// Feature name of the concentration variant
pub const CONCENTRATION_FEATURE: &str = "Complex Concentration";

/// Unit name of the dimension search pattern
pub const DIMENSION_UNIT: &str = "n-dimension";
/// Unit name of the ratio concentration pattern
pub const NUMERIC_CONCENTRATION_UNIT: &str = "numeric concentration";
/// Unit name of the percent concentration pattern
pub const PERCENT_CONCENTRATION_UNIT: &str = "percent concentration";

const NUMBER: &str = r"\d*[.,]?\d+";
const OPTIONAL_NUMBER: &str = r"\d*[.,]?\d*";
const DIMENSION_SEPARATOR: &str = r"(?:[xх]|на)";
const DIMENSION_SIGN: &str = r"(?:см|cm|мм|mm|м|m)?";
const CONCENTRATION_TOP: &str = r"(?:мкг|mcg|µg|мг|mg|кг|kg|гр|г|gr|g)?";
const CONCENTRATION_BOTTOM: &str = r"(?:мл|ml|л|l)(?!\w)";

/// Base weight of a ratio concentration
pub fn ratio_base_weight() -> Decimal {
    Decimal::new(1, 1)
}

/// Base weight of a percent concentration
pub fn percent_base_weight() -> Decimal {
    Decimal::ONE
}

/// Default side scale when no side carries a suffix (centimeters)
fn default_dimension_weight() -> Decimal {
    Decimal::new(1, 2)
}

lazy_static! {
    /// Search pattern of an N-dimensional size
    pub static ref DIMENSION_PATTERN: String = format!(
        r"{n}\s*{s}\s*{x}\s*{n}\s*{s}(?:\s*{s}\s*{x}\s*{n}\s*{s})*(?:\b|$)",
        n = NUMBER,
        s = DIMENSION_SIGN,
        x = DIMENSION_SEPARATOR,
    );

    /// Search pattern of a ratio concentration
    pub static ref RATIO_PATTERN: String = format!(
        r"{NUMBER}\s*{CONCENTRATION_TOP}\s*[\\/]\s*{OPTIONAL_NUMBER}\s*{CONCENTRATION_BOTTOM}"
    );

    /// Search pattern of a percent concentration
    pub static ref PERCENT_PATTERN: String = format!(r"{NUMBER}\s*%");

    static ref NUMBER_REGEX: Regex = Regex::new(NUMBER).expect("Number pattern should be valid");

    static ref SIDE_SPLIT: Regex =
        Regex::new(&format!("(?i){DIMENSION_SEPARATOR}")).expect("Dimension separator should be valid");

    static ref RATIO_SPLIT: Regex =
        Regex::new(r"[\\/]").expect("Ratio separator should be valid");

    /// Side scales, checked in order
    static ref DIMENSION_SCALES: Vec<(Decimal, Regex)> = vec![
        scale(Decimal::new(1, 3), r"мм|mm"),
        scale(Decimal::new(1, 2), r"см|cm"),
        scale(Decimal::ONE, r"m(?:[^m]|\b)|м(?:[^м]|\b)"),
    ];

    /// Numerator scales in milligrams, longer symbols first
    static ref NUMERATOR_SCALES: Vec<(Decimal, Regex)> = vec![
        scale(Decimal::new(1, 3), r"мкг|mcg|µg"),
        scale(Decimal::ONE, r"мг|mg"),
        scale(Decimal::from(1_000_000), r"кг|kg"),
        scale(Decimal::from(1_000), r"гр|г|gr|g"),
    ];

    /// Denominator scales in milliliters
    static ref DENOMINATOR_SCALES: Vec<(Decimal, Regex)> = vec![
        scale(Decimal::ONE, r"мл|ml"),
        scale(Decimal::from(1_000), r"л|l"),
    ];
}

fn scale(weight: Decimal, pattern: &str) -> (Decimal, Regex) {
    let regex = Regex::new(&format!("(?i){pattern}")).expect("Scale pattern should be valid");
    (weight, regex)
}

fn first_number(text: &str) -> Option<Decimal> {
    let number = NUMBER_REGEX.find(text)?.as_str().replace(',', ".");
    Decimal::from_str(&number).ok()
}

fn detect_scale(text: &str, scales: &[(Decimal, Regex)]) -> Option<Decimal> {
    scales
        .iter()
        .find(|(_, regex)| regex.is_match(text))
        .map(|(weight, _)| *weight)
}

/// Standard value of a dimension match: the set of its sides in meters
///
/// A side without a suffix takes the scale of the last side that has one, or
/// centimeters when none does. Sides without a number are skipped, and `None`
/// is returned when no side has one.
///
/// # Examples
///
/// ```rust
/// use unitmatch::complex_features::standardize_dimension;
///
/// let cm = standardize_dimension("10см х 20см").unwrap();
/// let mm = standardize_dimension("100 x 200мм").unwrap();
/// assert_eq!(cm, mm);
/// ```
pub fn standardize_dimension(value: &str) -> Option<BTreeSet<Decimal>> {
    let sides: Vec<(Decimal, Option<Decimal>)> = SIDE_SPLIT
        .split(value)
        .filter_map(|side| match first_number(side) {
            Some(number) => Some((number, detect_scale(side, &DIMENSION_SCALES))),
            None => {
                trace!("Dimension side '{}' has no number", side);
                None
            }
        })
        .collect();

    if sides.is_empty() {
        return None;
    }

    let fallback = sides
        .iter()
        .rev()
        .find_map(|(_, weight)| *weight)
        .unwrap_or_else(default_dimension_weight);

    sides
        .into_iter()
        .map(|(number, weight)| {
            let side = number.checked_mul(weight.unwrap_or(fallback));
            if side.is_none() {
                trace!("Dimension side {} overflows when scaled", number);
            }
            side.map(|side| side.normalize())
        })
        .collect()
}

/// Ratio concentration in mg/ml, before the base weight is applied
///
/// A missing number reads as 1. A zero denominator or an amount too large to
/// scale yields `None`.
pub fn standardize_ratio(value: &str) -> Option<Decimal> {
    let mut parts = RATIO_SPLIT.splitn(value, 2);
    let top = parts.next()?;
    let bottom = parts.next()?;

    let numerator = scaled_amount(top, &NUMERATOR_SCALES)?;
    let denominator = scaled_amount(bottom, &DENOMINATOR_SCALES)?;

    numerator
        .checked_div(denominator)
        .map(|ratio| ratio.normalize())
}

/// Standard value of a percent concentration
pub fn standardize_percent(value: &str) -> Option<Decimal> {
    first_number(value).map(|number| number.normalize())
}

fn scaled_amount(part: &str, scales: &[(Decimal, Regex)]) -> Option<Decimal> {
    let number = first_number(part).unwrap_or(Decimal::ONE);
    let weight = detect_scale(part, scales).unwrap_or(Decimal::ONE);
    let amount = number.checked_mul(weight);
    if amount.is_none() {
        trace!("Amount '{}' overflows when scaled", part.trim());
    }
    amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use fancy_regex::Regex as FancyRegex;

    fn decimals(values: &[&str]) -> BTreeSet<Decimal> {
        values.iter().map(|value| Decimal::from_str(value).unwrap()).collect()
    }

    fn find(pattern: &str, text: &str) -> Option<String> {
        FancyRegex::new(&format!("(?i){pattern}"))
            .unwrap()
            .find(text)
            .unwrap()
            .map(|found| found.as_str().to_string())
    }

    #[test]
    fn test_dimension_pattern_finds_sizes() {
        assert_eq!(
            find(&DIMENSION_PATTERN, "  Плитка 10см х 10см  ").as_deref(),
            Some("10см х 10см")
        );
        assert_eq!(
            find(&DIMENSION_PATTERN, "box 10 x 20 x 5 cm").as_deref(),
            Some("10 x 20 x 5 cm")
        );
        assert_eq!(
            find(&DIMENSION_PATTERN, "ковер 2 на 3 м").as_deref(),
            Some("2 на 3 м")
        );
        assert!(find(&DIMENSION_PATTERN, "Вес 10 г").is_none());
    }

    #[test]
    fn test_dimension_scales_to_meters() {
        assert_eq!(standardize_dimension("10см х 10см"), Some(decimals(&["0.1"])));
        assert_eq!(standardize_dimension("100мм х 100мм"), Some(decimals(&["0.1"])));
        assert_eq!(standardize_dimension("2 на 3 м"), Some(decimals(&["2", "3"])));
    }

    #[test]
    fn test_dimension_defaults_to_centimeters() {
        assert_eq!(standardize_dimension("10 x 20"), Some(decimals(&["0.1", "0.2"])));
    }

    #[test]
    fn test_dimension_inherits_last_explicit_scale() {
        assert_eq!(
            standardize_dimension("10мм x 20 x 3см"),
            Some(decimals(&["0.01", "0.2", "0.03"]))
        );
    }

    #[test]
    fn test_dimension_collapses_duplicates() {
        let square = standardize_dimension("10 x 10").unwrap();
        assert_eq!(square.len(), 1);
        assert_eq!(standardize_dimension("x"), None);
    }

    #[test]
    fn test_ratio_pattern() {
        assert_eq!(
            find(&RATIO_PATTERN, "  Аспирин 10мкг\\1мл  ").as_deref(),
            Some("10мкг\\1мл")
        );
        assert_eq!(find(&RATIO_PATTERN, "5 mg / ml").as_deref(), Some("5 mg / ml"));
        assert!(find(&RATIO_PATTERN, "1г/10мин").is_none());
    }

    #[test]
    fn test_ratio_standardization() {
        assert_eq!(standardize_ratio("10мг/мл"), Decimal::from_str("10").ok());
        assert_eq!(standardize_ratio("1г/1л"), Decimal::from_str("1").ok());
        assert_eq!(standardize_ratio("1кг/1л"), Decimal::from_str("1000").ok());
        assert_eq!(standardize_ratio("10мкг\\1мл"), Decimal::from_str("0.01").ok());
        assert_eq!(standardize_ratio("5 mg / 0 ml"), None);
        assert_eq!(standardize_ratio("5 mg"), None);
    }

    #[test]
    fn test_huge_amounts_are_dropped() {
        assert_eq!(standardize_ratio("99999999999999999999999кг/мл"), None);
        assert_eq!(standardize_ratio("1мг/9999999999999999999999999999л"), None);
        assert!(standardize_dimension("9999999999999999999999999999 x 10см").is_some());
    }

    #[test]
    fn test_percent_standardization() {
        assert_eq!(standardize_percent("1%"), Decimal::from_str("1").ok());
        assert_eq!(standardize_percent("2,5 %"), Decimal::from_str("2.5").ok());
        assert_eq!(find(&PERCENT_PATTERN, "Аспирин 1%").as_deref(), Some("1%"));
    }
}
