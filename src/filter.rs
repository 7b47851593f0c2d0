//! Compiled exclusion rules applied to each top-level entry before classification.

use crate::config::{ConfigError, FilterConfig};
use crate::history::HISTORY_FILE_NAME;
use glob::Pattern;
use regex::Regex;
use std::collections::HashSet;

/// Filter rules compiled once per run.
///
/// Matching is done on the bare file name: the scan is never recursive, so
/// there is no directory part to match against.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    include_hidden: bool,
    names: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl EntryFilter {
    /// Compiles the rules of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a glob or regex pattern is invalid.
    pub fn compile(config: &FilterConfig) -> Result<Self, ConfigError> {
        let rules = &config.filters;

        let patterns = rules
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
            .exclude_regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut names: HashSet<String> = rules.exclude_names.iter().cloned().collect();
        // The undo journal lives in the target directory and must never be sorted.
        names.insert(HISTORY_FILE_NAME.to_string());

        Ok(Self {
            include_hidden: rules.include_hidden,
            names,
            patterns,
            regexes,
        })
    }

    /// Returns true if the entry named `file_name` may be sorted.
    pub fn allows(&self, file_name: &str) -> bool {
        if self.names.contains(file_name) {
            return false;
        }

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.patterns.iter().any(|p| p.matches(file_name)) {
            return false;
        }

        !self.regexes.iter().any(|r| r.is_match(file_name))
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            include_hidden: false,
            names: HashSet::from([HISTORY_FILE_NAME.to_string()]),
            patterns: Vec::new(),
            regexes: Vec::new(),
        }
    }
}
