//! Named profiling values.
//!
//! # Responsibilities
//! - Hold the last written value for every metric name
//! - Render a stable snapshot for sampling and crash reports
//!
//! # Design Decisions
//! - Values are stringified at write time; each entry is independently
//!   replaced, so no read-modify-write races exist
//! - Keys are never removed once added

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

pub mod sampler;

/// A concurrent last-write-wins mapping from metric name to its most
/// recent value. Cheap to clone; clones share the same store.
#[derive(Clone, Default)]
pub struct ProfilingStore {
    values: Arc<DashMap<String, String>>,
}

impl ProfilingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under `name`, replacing any previous value.
    pub fn add<V: fmt::Display>(&self, name: &str, value: V) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All entries sorted by name.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Render all entries as one "name: value" line each, sorted by name
    /// so the output is stable across runs.
    pub fn snapshot(&self) -> String {
        let mut out = String::new();
        for (name, value) in self.entries() {
            out.push_str(&name);
            out.push_str(": ");
            out.push_str(&value);
            out.push('\n');
        }
        out
    }
}
