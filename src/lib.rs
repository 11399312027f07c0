//! # Unitmatch
//!
//! Unit-aware comparison of product descriptions. A declarative unit catalog is
//! compiled into regular expressions that recognize every equivalent spelling
//! of a measurement (`1 кг`, `1000г`, `1000,0 g`), and two engines are built on
//! top of it:
//!
//! - [`measures_engine::MeasuresEngine`] turns each row of a text column into a
//!   composite regex holding all of its measurements.
//! - [`feature_flow::FeatureValidator`] extracts, standardizes and compares the
//!   measurements of client and source descriptions, feature by feature.

pub mod complex_features;
pub mod composite;
pub mod config;
pub mod errors;
pub mod feature;
pub mod feature_flow;
pub mod measure;
pub mod measure_patterns;
pub mod measure_types;
pub mod measures_engine;
pub mod progress;
pub mod unit;
pub mod workers;
