//! # Feature Flow Module
//!
//! This module compares client and source descriptions feature by feature.
//!
//! Features run in ascending priority. Every span a feature unit matches is
//! standardized and then blanked out of a working copy of both texts, so a span
//! claimed by one feature is never seen by a later one. Each feature yields a
//! decision per row and the row is validated only when every feature accepts.
//!
//! ## Decision rules
//!
//! - Both sides empty: accept.
//! - Exactly one side empty: accept only in the modest not-found mode.
//! - Otherwise: accept when the intersection size equals the amount required
//!   by the validation mode.

use std::collections::HashSet;

use log::{debug, info};
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use crate::config::{EngineOptions, MeasuresConfig};
use crate::errors::{ConfigError, FeatureError, MatchError};
use crate::feature::{build_features, Feature, FeatureInstance, FeatureUnit};
use crate::measure_patterns::{CONSUMED_SPAN_FILLER, FEATURE_LEFT_PADDING, FEATURE_RIGHT_PADDING};
use crate::measure_types::{NotFoundMode, ValidationMode};
use crate::progress::{Reporter, StopFlag};
use crate::workers::map_rows;

/// One client/source pair to compare
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPair {
    pub client: String,
    pub source: String,
}

impl RecordPair {
    pub fn new(client: &str, source: &str) -> Self {
        Self {
            client: client.to_string(),
            source: source.to_string(),
        }
    }
}

/// Outcome of one feature on one row
#[derive(Debug, Clone, Serialize)]
pub struct FeatureDecision {
    pub feature: String,
    pub decision: bool,
    /// Every client instance found, in match order
    pub client: Vec<FeatureInstance>,
    /// Every source instance found, in match order
    pub source: Vec<FeatureInstance>,
    /// Set when one or both sides had nothing for this feature
    pub note: Option<String>,
}

/// Outcome of every feature on one row
#[derive(Debug, Clone, Serialize)]
pub struct RowValidation {
    pub validated: bool,
    pub features: Vec<FeatureDecision>,
}

impl Default for RowValidation {
    fn default() -> Self {
        Self {
            validated: true,
            features: Vec::new(),
        }
    }
}

impl RowValidation {
    /// Record a feature decision; the row stays rejected once any feature rejects
    pub fn push(&mut self, decision: FeatureDecision) {
        self.validated = self.validated && decision.decision;
        self.features.push(decision);
    }

    pub fn decision(&self, feature: &str) -> Option<bool> {
        self.feature(feature).map(|found| found.decision)
    }

    pub fn feature(&self, feature: &str) -> Option<&FeatureDecision> {
        self.features.iter().find(|found| found.feature == feature)
    }
}

/// Degenerate-case resolution when one or both sides are empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFoundStatus {
    client_empty: bool,
    source_empty: bool,
    mode: NotFoundMode,
}

impl NotFoundStatus {
    pub fn new(client_len: usize, source_len: usize, mode: NotFoundMode) -> Self {
        Self {
            client_empty: client_len == 0,
            source_empty: source_len == 0,
            mode,
        }
    }

    /// `None` when both sides have values and the validation mode decides
    pub fn decision(&self) -> Option<bool> {
        match (self.client_empty, self.source_empty) {
            (true, true) => Some(true),
            (true, false) | (false, true) => Some(self.mode == NotFoundMode::Modest),
            (false, false) => None,
        }
    }

    /// Human-readable status for a degenerate case
    pub fn note(&self, feature: &str) -> Option<String> {
        match (self.client_empty, self.source_empty) {
            (true, true) => Some(format!("{feature}: not found on both sides")),
            (true, false) => Some(format!("{feature}: not found in client")),
            (false, true) => Some(format!("{feature}: not found in source")),
            (false, false) => None,
        }
    }
}

/// Feature decision over deduplicated client and source values
pub fn decide(
    client: &HashSet<FeatureInstance>,
    source: &HashSet<FeatureInstance>,
    validation_mode: ValidationMode,
    not_found_mode: NotFoundMode,
) -> bool {
    let status = NotFoundStatus::new(client.len(), source.len(), not_found_mode);
    if let Some(decision) = status.decision() {
        return decision;
    }

    let required = validation_mode.required_intersection(client.len(), source.len());
    client.intersection(source).count() == required
}

/// Working copy of both texts, blanked as features claim spans
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingPair {
    client: String,
    source: String,
}

impl WorkingPair {
    pub fn new(pair: &RecordPair) -> Self {
        Self {
            client: pad(&pair.client),
            source: pad(&pair.source),
        }
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run one feature over both texts, consuming every matched span
    pub fn apply(&mut self, feature: &Feature) -> Result<FeatureDecision, FeatureError> {
        let mut client = Vec::new();
        let mut source = Vec::new();

        for unit in feature.units() {
            for span in consume(&mut self.client, unit) {
                client.extend(feature.instantiate(unit, &span)?);
            }
            for span in consume(&mut self.source, unit) {
                source.extend(feature.instantiate(unit, &span)?);
            }
        }

        let client_set: HashSet<FeatureInstance> = client.iter().cloned().collect();
        let source_set: HashSet<FeatureInstance> = source.iter().cloned().collect();

        let decision = decide(
            &client_set,
            &source_set,
            feature.validation_mode(),
            feature.not_found_mode(),
        );
        let note = NotFoundStatus::new(client_set.len(), source_set.len(), feature.not_found_mode())
            .note(feature.name());

        Ok(FeatureDecision {
            feature: feature.name().to_string(),
            decision,
            client,
            source,
            note,
        })
    }
}

fn pad(text: &str) -> String {
    format!("{FEATURE_LEFT_PADDING}{text}{FEATURE_RIGHT_PADDING}")
}

/// Matched spans of `unit`, each replaced in `text` by a filler
fn consume(text: &mut String, unit: &FeatureUnit) -> Vec<String> {
    let spans = unit.find_spans(text);
    if spans.is_empty() {
        return Vec::new();
    }

    let mut rebuilt = String::with_capacity(text.len());
    let mut matched = Vec::with_capacity(spans.len());
    let mut last = 0;
    for (start, end) in spans {
        rebuilt.push_str(&text[last..start]);
        rebuilt.push_str(CONSUMED_SPAN_FILLER);
        matched.push(text[start..end].to_string());
        last = end;
    }
    rebuilt.push_str(&text[last..]);

    *text = rebuilt;
    matched
}

/// Feature-by-feature comparison of record pairs
#[derive(Debug)]
pub struct FeatureValidator {
    features: Vec<Feature>,
    options: EngineOptions,
    reporter: Reporter,
    stop: StopFlag,
}

impl FeatureValidator {
    /// Build the enabled features of a configuration
    pub fn from_config(config: &MeasuresConfig) -> Result<Self, ConfigError> {
        let features = build_features(config)?;
        info!("Feature validator ready with {} features", features.len());
        Ok(Self::new(features))
    }

    /// Wrap prebuilt features, ordering them by priority
    pub fn new(mut features: Vec<Feature>) -> Self {
        features.sort_by_key(Feature::priority);
        Self {
            features,
            options: EngineOptions::default(),
            reporter: Reporter::default(),
            stop: StopFlag::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Validate every row, one feature at a time
    ///
    /// The stop flag is polled before each feature. Once it is set the call
    /// fails with [`MatchError::Cancelled`] and partial results are dropped.
    pub fn validate(
        &self,
        rows: &[RecordPair],
        pool: Option<&ThreadPool>,
    ) -> Result<Vec<RowValidation>, MatchError> {
        info!(
            "Validating {} rows against {} features",
            rows.len(),
            self.features.len()
        );
        let chunk_size = self.options.chunk_size;

        self.reporter.status("Preparing rows");
        let mut working: Vec<WorkingPair> = map_rows(rows, pool, chunk_size, WorkingPair::new);
        let mut results: Vec<RowValidation> = vec![RowValidation::default(); rows.len()];

        self.reporter.progress(0, self.features.len());
        for (done, feature) in self.features.iter().enumerate() {
            self.stop.check()?;
            self.reporter
                .status(&format!("Extracting feature '{}'", feature.name()));

            let outcomes = map_rows(&working, pool, chunk_size, |pair| {
                let mut pair = pair.clone();
                pair.apply(feature).map(|decision| (pair, decision))
            });

            for (row, outcome) in outcomes.into_iter().enumerate() {
                let (pair, decision) = outcome?;
                working[row] = pair;
                results[row].push(decision);
            }

            debug!(
                "Feature '{}' accepted {} of {} rows",
                feature.name(),
                results.iter().filter(|row| row.decision(feature.name()) == Some(true)).count(),
                rows.len()
            );
            self.reporter.progress(done + 1, self.features.len());
        }

        self.reporter.status("Finished feature validation");
        Ok(results)
    }

    /// Validate a single pair on the calling thread
    pub fn validate_pair(&self, client: &str, source: &str) -> Result<RowValidation, MatchError> {
        let mut working = WorkingPair::new(&RecordPair::new(client, source));
        let mut row = RowValidation::default();

        for feature in &self.features {
            self.stop.check()?;
            row.push(working.apply(feature)?);
        }
        Ok(row)
    }
}
