//! Threshold criteria configured from TOML.
//!
//! Both rules track one field's extremum over a sector and fire when it
//! crosses a fixed threshold, reporting where the extremum was found.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use stride_search_core::{CriteriaList, Criterion, Detection, FieldSource, Sample, Workspace};

/// One `[[criteria]]` entry of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CriterionSettings {
    /// Fires when the sector maximum of `variable` is at least `threshold`
    MaxThreshold {
        id: String,
        variable: String,
        threshold: f64,
    },
    /// Fires when the sector minimum of `variable` is at most `threshold`
    MinThreshold {
        id: String,
        variable: String,
        threshold: f64,
    },
}

impl CriterionSettings {
    pub fn id(&self) -> &str {
        match self {
            Self::MaxThreshold { id, .. } | Self::MinThreshold { id, .. } => id,
        }
    }

    pub fn variable(&self) -> &str {
        match self {
            Self::MaxThreshold { variable, .. } | Self::MinThreshold { variable, .. } => variable,
        }
    }

    /// Instantiates the rule against `source`.
    pub fn build(&self, source: Arc<dyn FieldSource>) -> Box<dyn Criterion> {
        match self {
            Self::MaxThreshold {
                id,
                variable,
                threshold,
            } => Box::new(MaxThreshold::new(id, variable, *threshold, source)),
            Self::MinThreshold {
                id,
                variable,
                threshold,
            } => Box::new(MinThreshold::new(id, variable, *threshold, source)),
        }
    }
}

/// Builds the criteria list in configuration order.
pub fn build_criteria(settings: &[CriterionSettings], source: Arc<dyn FieldSource>) -> CriteriaList {
    settings
        .iter()
        .map(|s| s.build(Arc::clone(&source)))
        .collect()
}

/// Sector maximum at or above a threshold.
pub struct MaxThreshold {
    id: String,
    variable: String,
    threshold: f64,
    source: Arc<dyn FieldSource>,
}

impl MaxThreshold {
    pub fn new(
        id: impl Into<String>,
        variable: impl Into<String>,
        threshold: f64,
        source: Arc<dyn FieldSource>,
    ) -> Self {
        Self {
            id: id.into(),
            variable: variable.into(),
            threshold,
            source,
        }
    }
}

impl fmt::Debug for MaxThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaxThreshold")
            .field("id", &self.id)
            .field("variable", &self.variable)
            .field("threshold", &self.threshold)
            .field("source", &self.source.name())
            .finish()
    }
}

impl Criterion for MaxThreshold {
    fn id(&self) -> &str {
        &self.id
    }

    fn required_variables(&self) -> Vec<String> {
        vec![self.variable.clone()]
    }

    fn accumulate(&self, sample: &Sample, workspace: &mut Workspace) {
        if let Some(value) = self.source.value(&self.variable, &sample.handle, sample.time_index) {
            workspace.record_max(&self.variable, value, sample);
        }
    }

    fn verdict(&self, workspace: &Workspace) -> Option<Detection> {
        let entry = workspace.get(&self.variable)?;
        let max = entry.value?;
        if max < self.threshold {
            return None;
        }
        let detection = Detection::new(max, format!("max {} >= {}", self.variable, self.threshold));
        Some(match entry.location {
            Some(location) => detection.at(location, entry.handle),
            None => detection,
        })
    }
}

/// Sector minimum at or below a threshold.
pub struct MinThreshold {
    id: String,
    variable: String,
    threshold: f64,
    source: Arc<dyn FieldSource>,
}

impl MinThreshold {
    pub fn new(
        id: impl Into<String>,
        variable: impl Into<String>,
        threshold: f64,
        source: Arc<dyn FieldSource>,
    ) -> Self {
        Self {
            id: id.into(),
            variable: variable.into(),
            threshold,
            source,
        }
    }
}

impl fmt::Debug for MinThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinThreshold")
            .field("id", &self.id)
            .field("variable", &self.variable)
            .field("threshold", &self.threshold)
            .field("source", &self.source.name())
            .finish()
    }
}

impl Criterion for MinThreshold {
    fn id(&self) -> &str {
        &self.id
    }

    fn required_variables(&self) -> Vec<String> {
        vec![self.variable.clone()]
    }

    fn accumulate(&self, sample: &Sample, workspace: &mut Workspace) {
        if let Some(value) = self.source.value(&self.variable, &sample.handle, sample.time_index) {
            workspace.record_min(&self.variable, value, sample);
        }
    }

    fn verdict(&self, workspace: &Workspace) -> Option<Detection> {
        let entry = workspace.get(&self.variable)?;
        let min = entry.value?;
        if min > self.threshold {
            return None;
        }
        let detection = Detection::new(min, format!("min {} <= {}", self.variable, self.threshold));
        Some(match entry.location {
            Some(location) => detection.at(location, entry.handle),
            None => detection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_search_core::{DataHandle, GeoPoint, GridIndex};

    /// Returns the arena index as the value of every variable except "missing".
    struct IndexValues;

    impl FieldSource for IndexValues {
        fn name(&self) -> &str {
            "index_values"
        }

        fn time_steps(&self) -> usize {
            1
        }

        fn value(&self, variable: &str, handle: &DataHandle, _time_index: usize) -> Option<f64> {
            (variable != "missing").then_some(handle.arena_index as f64)
        }
    }

    fn run(criterion: &dyn Criterion, n: usize) -> Option<Detection> {
        let mut workspace = Workspace::for_criterion(criterion);
        for i in 0..n {
            let sample = Sample {
                coord: GeoPoint::new(i as f64, 0.0).unwrap(),
                handle: DataHandle::new(i, GridIndex::Unstructured(i)),
                time_index: 0,
            };
            criterion.accumulate(&sample, &mut workspace);
        }
        criterion.verdict(&workspace)
    }

    #[test]
    fn test_max_threshold_reports_location() {
        let c = MaxThreshold::new("m", "v", 4.0, Arc::new(IndexValues));
        assert!(run(&c, 4).is_none());

        let detection = run(&c, 6).unwrap();
        assert_eq!(detection.intensity, 5.0);
        assert_eq!(detection.location.unwrap().lat(), 5.0);
        assert_eq!(detection.handle.unwrap().arena_index, 5);
    }

    #[test]
    fn test_min_threshold_inclusive() {
        let c = MinThreshold::new("m", "v", 0.0, Arc::new(IndexValues));
        let detection = run(&c, 3).unwrap();
        assert_eq!(detection.intensity, 0.0);
        assert!(detection.description.starts_with("min v"));
    }

    #[test]
    fn test_missing_variable_never_fires() {
        let c = MaxThreshold::new("m", "missing", f64::NEG_INFINITY, Arc::new(IndexValues));
        assert!(run(&c, 10).is_none());
    }

    #[test]
    fn test_settings_from_toml() {
        #[derive(Deserialize)]
        struct File {
            criteria: Vec<CriterionSettings>,
        }
        let file: File = toml::from_str(
            r#"
[[criteria]]
kind = "min_threshold"
id = "low"
variable = "pressure"
threshold = 985.0

[[criteria]]
kind = "max_threshold"
id = "spin"
variable = "vorticity"
threshold = 5.0
"#,
        )
        .unwrap();

        assert_eq!(file.criteria[0].id(), "low");
        assert_eq!(file.criteria[1].variable(), "vorticity");

        let built = build_criteria(&file.criteria, Arc::new(IndexValues));
        let ids: Vec<&str> = built.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["low", "spin"]);
    }
}
