//! Per-(sector, criterion) scratch space.

use crate::criteria::{Criterion, Sample};
use crate::types::{DataHandle, GeoPoint};
use std::collections::BTreeMap;

/// Accumulated state for one workspace variable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorkspaceEntry {
    /// Running value; `None` until the first update after a reset
    pub value: Option<f64>,
    /// Location of the sample that produced the current value (extrema only)
    pub location: Option<GeoPoint>,
    /// Handle of the sample that produced the current value (extrema only)
    pub handle: Option<DataHandle>,
    /// Number of samples folded into this entry
    pub count: usize,
}

/// Mapping from variable name to accumulated value, owned by one sector for
/// one criterion.
///
/// Each workspace remembers the id of the criterion it was allocated for so
/// a sector can detect a criteria list that changed underneath it. A slot
/// that was never allocated carries no id and matches no criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    criterion_id: Option<String>,
    entries: BTreeMap<String, WorkspaceEntry>,
}

impl Workspace {
    pub fn new<I, S>(criterion_id: impl Into<String>, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            criterion_id: Some(criterion_id.into()),
            entries: variables
                .into_iter()
                .map(|name| (name.into(), WorkspaceEntry::default()))
                .collect(),
        }
    }

    /// Allocates a fresh workspace labelled with `criterion`'s variables.
    pub fn for_criterion(criterion: &dyn Criterion) -> Self {
        Self::new(criterion.id(), criterion.required_variables())
    }

    /// Placeholder slot awaiting [`Workspace::for_criterion`].
    pub fn unallocated() -> Self {
        Self {
            criterion_id: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn criterion_id(&self) -> Option<&str> {
        self.criterion_id.as_deref()
    }

    /// Clears every entry while keeping the variable labels.
    pub fn reset(&mut self) {
        for entry in self.entries.values_mut() {
            *entry = WorkspaceEntry::default();
        }
    }

    /// Variable names, in sorted order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&WorkspaceEntry> {
        self.entries.get(name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.entries.get(name).and_then(|entry| entry.value)
    }

    pub fn count(&self, name: &str) -> usize {
        self.entries.get(name).map_or(0, |entry| entry.count)
    }

    /// Entry for `name`, created empty if the variable was not declared.
    pub fn entry_mut(&mut self, name: &str) -> &mut WorkspaceEntry {
        self.entries.entry(name.to_string()).or_default()
    }

    /// Keeps the largest value seen and where it was found. NaN is ignored.
    pub fn record_max(&mut self, name: &str, value: f64, sample: &Sample) {
        self.record_extremum(name, value, sample, |new, old| new > old);
    }

    /// Keeps the smallest value seen and where it was found. NaN is ignored.
    pub fn record_min(&mut self, name: &str, value: f64, sample: &Sample) {
        self.record_extremum(name, value, sample, |new, old| new < old);
    }

    /// Adds `value` to a running sum. NaN is ignored.
    pub fn add(&mut self, name: &str, value: f64) {
        if value.is_nan() {
            return;
        }
        let entry = self.entry_mut(name);
        entry.value = Some(entry.value.unwrap_or(0.0) + value);
        entry.count += 1;
    }

    /// Counts one occurrence.
    pub fn increment(&mut self, name: &str) {
        self.add(name, 1.0);
    }

    fn record_extremum(
        &mut self,
        name: &str,
        value: f64,
        sample: &Sample,
        replaces: impl Fn(f64, f64) -> bool,
    ) {
        if value.is_nan() {
            return;
        }
        let entry = self.entry_mut(name);
        entry.count += 1;
        let better = entry.value.map_or(true, |current| replaces(value, current));
        if better {
            entry.value = Some(value);
            entry.location = Some(sample.coord);
            entry.handle = Some(sample.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridIndex;

    fn sample(lat: f64, n: usize) -> Sample {
        Sample {
            coord: GeoPoint::new(lat, 0.0).unwrap(),
            handle: DataHandle::new(n, GridIndex::Unstructured(n)),
            time_index: 0,
        }
    }

    #[test]
    fn test_extrema_track_location() {
        let mut ws = Workspace::new("c", ["max", "min"]);
        for (n, value) in [3.0, 7.0, f64::NAN, -2.0].into_iter().enumerate() {
            let s = sample(n as f64, n);
            ws.record_max("max", value, &s);
            ws.record_min("min", value, &s);
        }

        let max = ws.get("max").unwrap();
        assert_eq!(max.value, Some(7.0));
        assert_eq!(max.handle.unwrap().arena_index, 1);
        assert_eq!(max.count, 3);

        let min = ws.get("min").unwrap();
        assert_eq!(min.value, Some(-2.0));
        assert_eq!(min.location.unwrap().lat(), 3.0);
    }

    #[test]
    fn test_reset_keeps_labels_and_clears_values() {
        let mut ws = Workspace::new("c", ["n"]);
        ws.increment("n");
        ws.add("sum", 2.5);
        assert_eq!(ws.value("n"), Some(1.0));

        ws.reset();
        assert_eq!(ws.value("n"), None);
        assert_eq!(ws.count("sum"), 0);
        assert_eq!(ws.variables().collect::<Vec<_>>(), vec!["n", "sum"]);
    }
}
