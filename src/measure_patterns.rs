//! # Measure Patterns Module
//!
//! This module contains regex patterns and constants shared by the unit, measure
//! and feature engines.

use lazy_static::lazy_static;
use regex::Regex;

/// Default value search for numeric units
pub const NUMERIC_VALUE_SEARCH: &str = r"\d*[.,]?\d+";

/// Default value search for string units (the symbol alone is the value)
pub const STRING_VALUE_SEARCH: &str = "";

/// Character class substituted for the decimal point in synthesized numbers
pub const DECIMAL_SEPARATOR_CLASS: &str = "[.,]";

/// Fractional digits kept when rendering a converted magnitude
pub const FORMAT_PRECISION: u32 = 20;

/// Opening of a per-value lookahead assertion
pub const LOOKAHEAD_OPEN: &str = "(?=.*(";
/// Closing of a per-value lookahead assertion
pub const LOOKAHEAD_CLOSE: &str = "))";

/// Anchored opening of an exclusion guard
pub const EXCLUDE_OPEN_ANCHORED: &str = "^(?!.*(";
/// Closing of an exclusion guard
pub const EXCLUDE_CLOSE: &str = "))";

/// Naked number that may precede a symbol: two or more digits, or 2-9
pub const NAKED_NUMBER_BEHIND: &str = r"(?:[0-9][0-9]\d*|[2-9]\d*?)";
/// Naked number that may follow a symbol
pub const NAKED_NUMBER_FRONT: &str = r"(?:[0-9][0-9]\d*|[2-9]\d*)";

/// Column name prefix for a measure's exclusion guard
pub const EXCLUDE_COLUMN_PREFIX: &str = "exclude: ";

/// Padding added around cells before measure extraction
pub const MEASURE_PADDING: &str = "  ";
/// Padding added before the text in the feature flow
pub const FEATURE_LEFT_PADDING: &str = "  ";
/// Padding added after the text in the feature flow
pub const FEATURE_RIGHT_PADDING: &str = "   ";
/// Replacement for a consumed span in the feature flow
pub const CONSUMED_SPAN_FILLER: &str = "  ";

/// Default number of rows in one offloaded chunk
pub const DEFAULT_CHUNK_SIZE: usize = 500;

lazy_static! {
    /// First number inside a unit match, used when synthesizing equivalences
    pub static ref UNIT_NUMBER_REGEX: Regex =
        Regex::new(r"\d*[.,]?\d+").expect("Unit number pattern should be valid");

    /// First number inside a feature match, used for standardization
    pub static ref FEATURE_NUMBER_REGEX: Regex =
        Regex::new(r"\d+[.,]?\d*").expect("Feature number pattern should be valid");
}
