// src/dedup.rs
//
// =============================================================================
// RANKLOG: SINGLE-EMIT DEDUPLICATOR (v 0.1 )
// =============================================================================
//
// Counts how often a label has been offered for single-emit.
// Warning-like and other severities are counted separately, so an info
// message and a warning sharing a label do not shadow each other.

use crate::severity::Severity;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeverityClass {
    WarningLike,
    Other,
}

impl From<Severity> for SeverityClass {
    fn from(sev: Severity) -> Self {
        match sev {
            Severity::Warning | Severity::Error => SeverityClass::WarningLike,
            _ => SeverityClass::Other,
        }
    }
}

/// Insertion-ordered label counter.
#[derive(Debug, Default)]
struct Counter {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl Counter {
    fn bump(&mut self, label: &str) -> u64 {
        let slot = match self.index.get(label) {
            Some(&i) => i,
            None => {
                self.entries.push((label.to_string(), 0));
                self.index.insert(label.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[slot].1 += 1;
        self.entries[slot].1
    }

    fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }
}

#[derive(Debug, Default)]
pub struct MessageDeduplicator {
    warnings: Counter,
    others: Counter,
}

impl MessageDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more sighting of `label` and returns true if it was seen
    /// before under the same severity class.
    pub fn should_suppress(&mut self, label: &str, severity: Severity) -> bool {
        let counter = match SeverityClass::from(severity) {
            SeverityClass::WarningLike => &mut self.warnings,
            SeverityClass::Other => &mut self.others,
        };
        counter.bump(label) > 1
    }

    /// Forgets every label so previously seen messages surface again.
    pub fn reset(&mut self) {
        self.warnings.clear();
        self.others.clear();
    }

    /// `(count, label)` for warning-like labels, ascending by count.
    /// Ties keep first-seen order.
    pub fn summary(&self) -> Vec<(u64, String)> {
        let mut out: Vec<(u64, String)> = self
            .warnings
            .entries
            .iter()
            .map(|(label, count)| (*count, label.clone()))
            .collect();
        out.sort_by_key(|(count, _)| *count);
        out
    }
}
