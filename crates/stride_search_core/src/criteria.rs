//! # Identification Criteria
//!
//! The capability every detection rule provides to the core. A criterion is
//! evaluated per sector in three steps:
//!
//! 1. [`Criterion::required_variables`] labels the sector's workspace slot
//! 2. [`Criterion::accumulate`] is fed every point in the sector
//! 3. [`Criterion::verdict`] turns the final workspace into a detection
//!
//! The core never reads field values. Criteria that need them hold their own
//! reference to a [`crate::FieldSource`] and use the [`DataHandle`] and time
//! index carried by each [`Sample`].

use crate::sector::Workspace;
use crate::types::{DataHandle, GeoPoint};
use serde::Serialize;
use std::fmt::Debug;

/// One data point as handed to [`Criterion::accumulate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub coord: GeoPoint,
    pub handle: DataHandle,
    pub time_index: usize,
}

/// Payload a criterion attaches to a positive verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// Criterion-defined strength of the detection (e.g. the extremum found)
    pub intensity: f64,
    /// Where the detection is located, if the criterion tracks it
    pub location: Option<GeoPoint>,
    /// Data point the detection is attributed to, if any
    pub handle: Option<DataHandle>,
    /// Free-form label
    pub description: String,
}

impl Detection {
    pub fn new(intensity: f64, description: impl Into<String>) -> Self {
        Self {
            intensity,
            location: None,
            handle: None,
            description: description.into(),
        }
    }

    pub fn at(mut self, location: GeoPoint, handle: Option<DataHandle>) -> Self {
        self.location = Some(location);
        self.handle = handle;
        self
    }
}

/// A pluggable detection rule.
///
/// Implementations must be `Send + Sync`: one criteria list is shared by
/// every sector evaluated in parallel. All mutable state belongs in the
/// [`Workspace`] the core passes in.
pub trait Criterion: Send + Sync + Debug {
    /// Stable identifier, unique within a criteria list.
    fn id(&self) -> &str;

    /// Variables this criterion keeps in its workspace.
    fn required_variables(&self) -> Vec<String>;

    /// Folds one data point into the workspace.
    fn accumulate(&self, sample: &Sample, workspace: &mut Workspace);

    /// Final decision for the sector; `None` means no detection.
    fn verdict(&self, workspace: &Workspace) -> Option<Detection>;
}

/// An ordered criteria list as registered with sectors.
pub type CriteriaList = Vec<Box<dyn Criterion>>;
