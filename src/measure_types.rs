//! # Measure Types Module
//!
//! This module defines the policy enums shared by the measure and feature engines.
//! Every enum parses permissively: an unknown configuration string falls back to
//! the documented default instead of failing.

use log::debug;
use serde::Serialize;

/// Position of the numeric value relative to the unit symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SearchMode {
    /// Symbol first, number after (e.g. "№10")
    Front,
    /// Number first, symbol after (e.g. "10г")
    #[default]
    Behind,
}

impl SearchMode {
    /// Parse a configuration value, falling back to `Behind`
    pub fn checkout(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "front" => SearchMode::Front,
            "behind" => SearchMode::Behind,
            other => {
                debug!("Unknown search mode '{}', using default", other);
                SearchMode::default()
            }
        }
    }
}

/// Which sibling units of a measure a unit may convert into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MergeMode {
    /// A mention must stay in its own unit
    None,
    /// Every other unit of the measure
    #[default]
    Overall,
    /// The n nearest units by rank on each side
    Window(usize),
}

impl MergeMode {
    /// Parse a configuration value: "none", "overall" or a non-negative integer.
    /// Anything else falls back to `Overall`.
    pub fn checkout(raw: &str) -> Self {
        let mode = raw.trim().to_lowercase();
        match mode.as_str() {
            "none" => MergeMode::None,
            "overall" => MergeMode::Overall,
            other => match other.parse::<usize>() {
                Ok(window) => MergeMode::Window(window),
                Err(_) => {
                    debug!("Unknown merge mode '{}', using default", other);
                    MergeMode::default()
                }
            },
        }
    }
}

/// How many extracted values of both sides must intersect for a feature to pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ValidationMode {
    /// Intersection must cover the larger side
    #[default]
    Strict,
    /// Intersection must cover the smaller side
    Modest,
    /// Intersection must cover the client side
    Client,
    /// Intersection must cover the source side
    Source,
}

impl ValidationMode {
    pub fn checkout(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "strict" => ValidationMode::Strict,
            "modest" => ValidationMode::Modest,
            "client" => ValidationMode::Client,
            "source" => ValidationMode::Source,
            other => {
                debug!("Unknown validation mode '{}', using default", other);
                ValidationMode::default()
            }
        }
    }

    /// Number of common values required for acceptance
    pub fn required_intersection(&self, client_len: usize, source_len: usize) -> usize {
        match self {
            ValidationMode::Strict => client_len.max(source_len),
            ValidationMode::Modest => client_len.min(source_len),
            ValidationMode::Client => client_len,
            ValidationMode::Source => source_len,
        }
    }
}

/// Decision policy when one side yields no values for a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum NotFoundMode {
    /// Reject when only one side is empty
    #[default]
    Strict,
    /// Accept when only one side is empty
    Modest,
}

impl NotFoundMode {
    pub fn checkout(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "strict" => NotFoundMode::Strict,
            "modest" => NotFoundMode::Modest,
            other => {
                debug!("Unknown not-found mode '{}', using default", other);
                NotFoundMode::default()
            }
        }
    }
}

/// Whether a measure's units carry numbers or only literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeasureKind {
    Numeric,
    String,
}
