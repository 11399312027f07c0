//! # Composite Regex Module
//!
//! Consumer-side helpers for the per-row composite regex produced by the
//! measures engine: compile and test it, list its lookahead bodies, and strip
//! the regions of a text those bodies match.

use fancy_regex::Regex;
use log::warn;

use crate::errors::MatchError;
use crate::measure_patterns::{LOOKAHEAD_CLOSE, LOOKAHEAD_OPEN};
use crate::unit::compile_insensitive;

/// A compiled composite regex
#[derive(Debug, Clone)]
pub struct CompositeRegex {
    pattern: String,
    regex: Regex,
}

impl CompositeRegex {
    /// Compile `pattern` case-insensitively
    pub fn new(pattern: &str) -> Result<Self, MatchError> {
        let regex = compile_insensitive(pattern).map_err(Box::new)?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether `text` satisfies every constraint; an empty composite accepts all
    pub fn is_match(&self, text: &str) -> Result<bool, MatchError> {
        if self.pattern.is_empty() {
            return Ok(true);
        }
        self.regex.is_match(text).map_err(|err| Box::new(err).into())
    }

    /// Bodies of every `(?=.*( … ))` assertion, in order
    pub fn fragments(&self) -> Vec<&str> {
        lookahead_bodies(&self.pattern)
    }

    /// Remove every region of `text` matched by a lookahead body
    ///
    /// Bodies are applied one after another, each on the result of the
    /// previous one.
    pub fn strip(&self, text: &str) -> Result<String, MatchError> {
        let mut stripped = text.to_string();
        for body in self.fragments() {
            let regex = compile_insensitive(body).map_err(Box::new)?;
            stripped = remove_matches(&regex, &stripped);
        }
        Ok(stripped)
    }
}

/// Scan `pattern` for lookahead assertions and return their inner groups
fn lookahead_bodies(pattern: &str) -> Vec<&str> {
    let mut bodies = Vec::new();
    let mut cursor = 0;

    while let Some(found) = pattern[cursor..].find(LOOKAHEAD_OPEN) {
        let start = cursor + found + LOOKAHEAD_OPEN.len();
        match closing_paren(&pattern[start..]) {
            Some(length) => {
                bodies.push(&pattern[start..start + length]);
                cursor = start + length;
                if pattern[cursor..].starts_with(LOOKAHEAD_CLOSE) {
                    cursor += LOOKAHEAD_CLOSE.len();
                }
            }
            None => break,
        }
    }
    bodies
}

/// Byte length up to the paren closing an already opened group
fn closing_paren(rest: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut escaped = false;
    let mut in_class = false;

    for (offset, ch) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn remove_matches(regex: &Regex, text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    let mut last = 0;

    for matched in regex.find_iter(text) {
        match matched {
            Ok(matched) => {
                kept.push_str(&text[last..matched.start()]);
                last = matched.end();
            }
            Err(err) => {
                warn!("Stripping aborted for pattern '{}': {}", regex.as_str(), err);
                break;
            }
        }
    }
    kept.push_str(&text[last..]);
    kept
}
