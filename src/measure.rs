//! # Measure Module
//!
//! A [`Measure`] groups the units of one physical dimension. It orders them by
//! weight, decides which siblings each unit converts into according to its
//! [`MergeMode`], and builds the exclusion guard used to reject cells with a
//! naked number next to one of its symbols.

use log::debug;

use crate::config::{MeasureRecord, ResolvedUnit};
use crate::errors::ConfigError;
use crate::measure_patterns::{
    EXCLUDE_CLOSE, EXCLUDE_OPEN_ANCHORED, NAKED_NUMBER_BEHIND, NAKED_NUMBER_FRONT,
};
use crate::measure_types::{MeasureKind, MergeMode, SearchMode};
use crate::unit::Unit;

/// Regex fragments produced by one measure for one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureCell {
    /// One fragment per unit, in unit order; empty when the unit was not found
    pub unit_fragments: Vec<String>,
    /// Anchored exclusion guard, present only when no unit matched
    pub exclusion: Option<String>,
}

impl MeasureCell {
    /// Concatenation of every fragment, exclusion last
    pub fn joined(&self) -> String {
        let mut joined: String = self.unit_fragments.concat();
        if let Some(exclusion) = &self.exclusion {
            joined.push_str(exclusion);
        }
        joined
    }
}

/// Units of one dimension plus their conversion graph
#[derive(Debug, Clone)]
pub struct Measure {
    name: String,
    kind: MeasureKind,
    merge_mode: MergeMode,
    exclude_ambiguous: bool,
    units: Vec<Unit>,
    siblings: Vec<Vec<usize>>,
}

impl Measure {
    /// Build a measure, sorting units ascending by weight
    pub fn new(
        name: &str,
        kind: MeasureKind,
        merge_mode: MergeMode,
        exclude_ambiguous: bool,
        mut units: Vec<Unit>,
    ) -> Self {
        units.sort_by(|a, b| a.weight().cmp(&b.weight()));
        let siblings = allocate_siblings(units.len(), merge_mode);

        debug!(
            "Measure '{}' compiled with {} units, merge mode {:?}",
            name,
            units.len(),
            merge_mode
        );

        Self {
            name: name.to_string(),
            kind,
            merge_mode,
            exclude_ambiguous,
            units,
            siblings,
        }
    }

    /// Build a measure from its configuration record, skipping disabled units
    pub fn from_record(record: &MeasureRecord, kind: MeasureKind) -> Result<Self, ConfigError> {
        let data = &record.measure_data;
        let units = data
            .units
            .iter()
            .filter(|unit| unit.use_it)
            .map(|unit| {
                let resolved: ResolvedUnit = unit.resolve(data)?;
                Unit::new(resolved, kind, data.value_search_override())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(
            &record.measure_name,
            kind,
            record.autosem.merge_mode(),
            record.autosem.exclude_rx,
            units,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MeasureKind {
        self.kind
    }

    pub fn merge_mode(&self) -> MergeMode {
        self.merge_mode
    }

    pub fn excludes_ambiguous(&self) -> bool {
        self.exclude_ambiguous
    }

    /// Units in ascending weight order
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Units the unit at `index` may convert into, ascending by weight
    pub fn siblings_of(&self, index: usize) -> Vec<&Unit> {
        self.siblings
            .get(index)
            .map(|ranks| ranks.iter().map(|&rank| &self.units[rank]).collect())
            .unwrap_or_default()
    }

    /// Anchored guard that fails on a naked number adjacent to any symbol
    ///
    /// Returns `None` for a measure without units.
    pub fn exclusion_pattern(&self) -> Option<String> {
        let symbols_for = |mode: SearchMode| {
            self.units
                .iter()
                .filter(|unit| unit.search_mode() == mode)
                .map(|unit| unit.symbol())
                .collect::<Vec<_>>()
                .join("|")
        };
        let behind = symbols_for(SearchMode::Behind);
        let front = symbols_for(SearchMode::Front);

        if behind.is_empty() && front.is_empty() {
            return None;
        }

        let mut alternatives = Vec::new();
        if !behind.is_empty() {
            alternatives.push(format!(r"{NAKED_NUMBER_BEHIND}\s*(?:{behind})"));
        }
        if !front.is_empty() {
            alternatives.push(format!(r"(?:{front})\s*{NAKED_NUMBER_FRONT}"));
        }

        Some(format!(
            "{EXCLUDE_OPEN_ANCHORED}{}{EXCLUDE_CLOSE}",
            alternatives.join("|")
        ))
    }

    /// Fragments of every unit for one cell
    pub fn extract_cell(&self, text: &str) -> MeasureCell {
        let unit_fragments: Vec<String> = self
            .units
            .iter()
            .enumerate()
            .map(|(index, unit)| {
                let occurrences = unit.extract(text);
                unit.transform(&occurrences, &self.siblings_of(index))
            })
            .collect();

        let nothing_found = unit_fragments.iter().all(|fragment| fragment.trim().is_empty());
        let exclusion = if self.exclude_ambiguous && nothing_found {
            self.exclusion_pattern()
        } else {
            None
        };

        MeasureCell {
            unit_fragments,
            exclusion,
        }
    }
}

/// Sibling ranks per unit rank for a measure of `count` units
fn allocate_siblings(count: usize, merge_mode: MergeMode) -> Vec<Vec<usize>> {
    (0..count)
        .map(|index| match merge_mode {
            MergeMode::None => Vec::new(),
            MergeMode::Overall => (0..count).filter(|&other| other != index).collect(),
            MergeMode::Window(shift) => {
                let start = index.saturating_sub(shift);
                let end = (index + shift + 1).min(count);
                (start..end).filter(|&other| other != index).collect()
            }
        })
        .collect()
}
