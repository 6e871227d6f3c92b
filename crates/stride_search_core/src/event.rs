//! # Detected Events
//!
//! An [`Event`] records one positive criterion verdict at one sector for one
//! time step of one data source. Events are immutable once built; ownership
//! passes to whatever aggregates them across sectors and time steps.

use crate::criteria::Detection;
use crate::types::GeoPoint;
use chrono::NaiveDateTime;
use serde::Serialize;

/// One criterion's positive detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    timestamp: NaiveDateTime,
    source: String,
    time_index: usize,
    sector_center: GeoPoint,
    criterion_id: String,
    detection: Detection,
}

impl Event {
    pub fn new(
        timestamp: NaiveDateTime,
        source: impl Into<String>,
        time_index: usize,
        sector_center: GeoPoint,
        criterion_id: impl Into<String>,
        detection: Detection,
    ) -> Self {
        Self {
            timestamp,
            source: source.into(),
            time_index,
            sector_center,
            criterion_id: criterion_id.into(),
            detection,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Data source the event was found in
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Time step index within the data source
    pub fn time_index(&self) -> usize {
        self.time_index
    }

    pub fn sector_center(&self) -> GeoPoint {
        self.sector_center
    }

    pub fn criterion_id(&self) -> &str {
        &self.criterion_id
    }

    /// Criterion-supplied payload
    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    /// Key for a deterministic global order: timestamp, sector center, then
    /// criterion id.
    pub fn sort_key(&self) -> (NaiveDateTime, f64, f64, &str) {
        (
            self.timestamp,
            self.sector_center.lat(),
            self.sector_center.lon(),
            &self.criterion_id,
        )
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}#{}] {} at sector {}: {} = {:.4}",
            self.timestamp,
            self.source,
            self.time_index,
            self.criterion_id,
            self.sector_center,
            self.detection.description,
            self.detection.intensity
        )
    }
}

/// Sorts events into the deterministic global order of [`Event::sort_key`].
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| {
        let (ta, lat_a, lon_a, ca) = a.sort_key();
        let (tb, lat_b, lon_b, cb) = b.sort_key();
        ta.cmp(&tb)
            .then_with(|| lat_a.total_cmp(&lat_b))
            .then_with(|| lon_a.total_cmp(&lon_b))
            .then_with(|| ca.cmp(cb))
    });
}
