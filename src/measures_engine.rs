//! # Measures Engine Module
//!
//! This module runs every configured measure over a text column and produces
//! one regex column per unit, an exclusion column per guarded measure, and the
//! per-row composite regex built by [`concat_regex`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use unitmatch::config::{EngineOptions, MeasuresConfig};
//! use unitmatch::measures_engine::{concat_regex, MeasuresEngine};
//!
//! let config = MeasuresConfig::builtin()?;
//! let engine = MeasuresEngine::from_config(&config, EngineOptions::default())?;
//! let texts = vec!["Сахар 1кг".to_string()];
//! let mut table = engine.extract_all(&texts, None)?;
//! let composites = concat_regex(&mut table, true);
//! assert_eq!(composites.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use log::{debug, info};
use rayon::ThreadPool;
use serde::Serialize;

use crate::config::{EngineOptions, MeasureGroup, MeasuresConfig};
use crate::errors::{ConfigError, MatchError};
use crate::measure::{Measure, MeasureCell};
use crate::measure_patterns::{EXCLUDE_COLUMN_PREFIX, MEASURE_PADDING};
use crate::measure_types::MeasureKind;
use crate::progress::{Reporter, StopFlag};
use crate::workers::map_rows;

/// One extracted column: a unit's fragments, or a measure's exclusion guards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitColumn {
    pub measure: String,
    /// `None` for the exclusion column of the measure
    pub unit: Option<String>,
    /// One value per row, `""` where nothing applies
    pub values: Vec<String>,
}

impl UnitColumn {
    pub fn is_exclusion(&self) -> bool {
        self.unit.is_none()
    }

    /// Display name of the column
    pub fn name(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{}: {}", self.measure, unit),
            None => format!("{EXCLUDE_COLUMN_PREFIX}{}", self.measure),
        }
    }
}

/// Extraction result over a text column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionTable {
    pub rows: usize,
    pub columns: Vec<UnitColumn>,
}

impl ExtractionTable {
    pub fn column(&self, name: &str) -> Option<&UnitColumn> {
        self.columns.iter().find(|column| column.name() == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(UnitColumn::name).collect()
    }

    fn push_measure(&mut self, measure: &Measure, cells: &[MeasureCell]) {
        for (index, unit) in measure.units().iter().enumerate() {
            self.columns.push(UnitColumn {
                measure: measure.name().to_string(),
                unit: Some(unit.name().to_string()),
                values: cells
                    .iter()
                    .map(|cell| cell.unit_fragments[index].clone())
                    .collect(),
            });
        }

        if measure.excludes_ambiguous() {
            self.columns.push(UnitColumn {
                measure: measure.name().to_string(),
                unit: None,
                values: cells
                    .iter()
                    .map(|cell| cell.exclusion.clone().unwrap_or_default())
                    .collect(),
            });
        }
    }
}

/// Concatenate every column into one composite regex per row
///
/// A row with at least one exclusion guard starts with `^`, followed by the
/// guards without their own anchor, followed by every unit fragment in column
/// order. With `drop_units` the consumed columns are removed from the table.
pub fn concat_regex(table: &mut ExtractionTable, drop_units: bool) -> Vec<String> {
    let composites = (0..table.rows)
        .map(|row| {
            let exclusions: Vec<&str> = table
                .columns
                .iter()
                .filter(|column| column.is_exclusion())
                .map(|column| column.values[row].as_str())
                .filter(|value| !value.is_empty())
                .collect();

            let mut composite = String::new();
            if !exclusions.is_empty() {
                composite.push('^');
                for exclusion in exclusions {
                    composite.push_str(exclusion.strip_prefix('^').unwrap_or(exclusion));
                }
            }
            for column in table.columns.iter().filter(|column| !column.is_exclusion()) {
                composite.push_str(&column.values[row]);
            }
            composite
        })
        .collect();

    if drop_units {
        table.columns.clear();
    }
    composites
}

/// Compiled measures plus batch controls
#[derive(Debug)]
pub struct MeasuresEngine {
    measures: Vec<Measure>,
    options: EngineOptions,
    reporter: Reporter,
    stop: StopFlag,
}

impl MeasuresEngine {
    /// Compile the enabled numeric and string measures of a configuration
    pub fn from_config(config: &MeasuresConfig, options: EngineOptions) -> Result<Self, ConfigError> {
        options.validate()?;

        let mut measures = Vec::new();
        collect_measures(&config.numeric_measures, MeasureKind::Numeric, &mut measures)?;
        collect_measures(&config.string_measures, MeasureKind::String, &mut measures)?;

        info!("Measures engine ready with {} measures", measures.len());
        Ok(Self::new(measures, options))
    }

    pub fn new(measures: Vec<Measure>, options: EngineOptions) -> Self {
        Self {
            measures,
            options,
            reporter: Reporter::default(),
            stop: StopFlag::default(),
        }
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Handle that cancels a running extraction from another thread
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    /// Extract every measure over `texts`
    ///
    /// The stop flag is polled before each measure; once set, the whole
    /// extraction fails with [`MatchError::Cancelled`] and nothing is returned.
    pub fn extract_all(
        &self,
        texts: &[String],
        pool: Option<&ThreadPool>,
    ) -> Result<ExtractionTable, MatchError> {
        info!(
            "Extracting {} measures over {} rows",
            self.measures.len(),
            texts.len()
        );
        let mut table = ExtractionTable {
            rows: texts.len(),
            columns: Vec::new(),
        };

        for (done, measure) in self.measures.iter().enumerate() {
            self.stop.check()?;
            self.reporter
                .status(&format!("Extracting measure '{}'", measure.name()));

            let cells = self.extract_cells(measure, texts, pool);
            table.push_measure(measure, &cells);

            self.reporter.progress(done + 1, self.measures.len());
        }

        debug!("Extraction produced {} columns", table.columns.len());
        Ok(table)
    }

    /// Composite fragment of one named measure per row
    pub fn extract_measure(
        &self,
        texts: &[String],
        name: &str,
        pool: Option<&ThreadPool>,
    ) -> Result<Vec<String>, MatchError> {
        let measure = self
            .measures
            .iter()
            .find(|measure| measure.name() == name)
            .ok_or_else(|| ConfigError::UnknownMeasure(name.to_string()))?;

        self.stop.check()?;
        self.reporter
            .status(&format!("Extracting measure '{}'", measure.name()));
        let cells = self.extract_cells(measure, texts, pool);
        self.reporter.progress(1, 1);

        Ok(cells.iter().map(MeasureCell::joined).collect())
    }

    /// Composite regex per row over every measure
    pub fn composite_regexes(
        &self,
        texts: &[String],
        pool: Option<&ThreadPool>,
    ) -> Result<Vec<String>, MatchError> {
        let mut table = self.extract_all(texts, pool)?;
        Ok(concat_regex(&mut table, true))
    }

    fn extract_cells(
        &self,
        measure: &Measure,
        texts: &[String],
        pool: Option<&ThreadPool>,
    ) -> Vec<MeasureCell> {
        let add_spaces = self.options.add_spaces;
        map_rows(texts, pool, self.options.chunk_size, |text| {
            if add_spaces {
                measure.extract_cell(&format!("{MEASURE_PADDING}{text}{MEASURE_PADDING}"))
            } else {
                measure.extract_cell(text)
            }
        })
    }
}

fn collect_measures(
    group: &MeasureGroup,
    kind: MeasureKind,
    measures: &mut Vec<Measure>,
) -> Result<(), ConfigError> {
    if !group.use_it {
        return Ok(());
    }
    for record in group.measures.iter().filter(|record| record.autosem.use_it) {
        measures.push(Measure::from_record(record, kind)?);
    }
    Ok(())
}
