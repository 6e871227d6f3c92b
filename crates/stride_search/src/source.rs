//! Synthetic data source.
//!
//! [`AnalyticSource`] evaluates configured fields on a regular lat/lon grid:
//! a constant background plus Gaussian anomalies whose peaks drift at a fixed
//! rate per time step. It stands in for a file reader, handing its grid to
//! the core through a [`PointArena`] and its values to criteria through
//! [`FieldSource`].

use crate::config::{AnomalySettings, DatasetSettings};
use crate::error::Result;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashSet};
use stride_search_core::{DataHandle, FieldSource, GeoPoint, PointArena};

#[derive(Debug, Clone)]
struct Anomaly {
    lat: f64,
    lon: f64,
    lat_drift_deg: f64,
    lon_drift_deg: f64,
    amplitude: f64,
    width_km: f64,
}

impl Anomaly {
    fn from_settings(settings: &AnomalySettings) -> Self {
        Self {
            lat: settings.lat,
            lon: settings.lon,
            lat_drift_deg: settings.lat_drift_deg,
            lon_drift_deg: settings.lon_drift_deg,
            amplitude: settings.amplitude,
            width_km: settings.width_km,
        }
    }

    /// Peak position at `time_index`; latitude stops at the poles.
    fn center(&self, time_index: usize) -> Option<GeoPoint> {
        let t = time_index as f64;
        let lat = (self.lat + t * self.lat_drift_deg).clamp(-90.0, 90.0);
        GeoPoint::new(lat, self.lon + t * self.lon_drift_deg).ok()
    }

    fn value_at(&self, point: &GeoPoint, time_index: usize) -> f64 {
        match self.center(time_index) {
            Some(center) => {
                let d = point.distance_km(&center) / self.width_km;
                self.amplitude * (-0.5 * d * d).exp()
            }
            None => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Field {
    background: f64,
    anomalies: Vec<Anomaly>,
}

/// Moving-anomaly fields on a regular grid.
#[derive(Debug, Clone)]
pub struct AnalyticSource {
    name: String,
    arena: PointArena,
    timesteps: usize,
    time_axis: DatasetSettings,
    missing: HashSet<usize>,
    fields: BTreeMap<String, Field>,
}

impl AnalyticSource {
    pub fn new(settings: &DatasetSettings) -> Result<Self> {
        let arena = PointArena::rectilinear(&settings.latitudes(), &settings.longitudes())?;

        let mut fields: BTreeMap<String, Field> = settings
            .fields
            .iter()
            .map(|f| {
                (
                    f.name.clone(),
                    Field {
                        background: f.background,
                        anomalies: Vec::new(),
                    },
                )
            })
            .collect();
        for anomaly in &settings.anomalies {
            if let Some(field) = fields.get_mut(&anomaly.field) {
                field.anomalies.push(Anomaly::from_settings(anomaly));
            }
        }

        Ok(Self {
            name: settings.name.clone(),
            arena,
            timesteps: settings.timesteps,
            time_axis: settings.clone(),
            missing: settings.missing_timesteps.iter().copied().collect(),
            fields,
        })
    }

    /// Points with data at `time_index`; empty for missing time steps.
    pub fn arena(&self, time_index: usize) -> PointArena {
        if self.missing.contains(&time_index) || time_index >= self.timesteps {
            PointArena::default()
        } else {
            self.arena.clone()
        }
    }

    pub fn grid_len(&self) -> usize {
        self.arena.len()
    }

    pub fn timestamp(&self, time_index: usize) -> Option<NaiveDateTime> {
        self.time_axis.timestamp(time_index)
    }
}

impl FieldSource for AnalyticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn time_steps(&self) -> usize {
        self.timesteps
    }

    fn value(&self, variable: &str, handle: &DataHandle, time_index: usize) -> Option<f64> {
        if time_index >= self.timesteps || self.missing.contains(&time_index) {
            return None;
        }
        let field = self.fields.get(variable)?;
        let (point, _) = self.arena.get(handle.arena_index)?;
        Some(
            field.background
                + field
                    .anomalies
                    .iter()
                    .map(|a| a.value_at(&point, time_index))
                    .sum::<f64>(),
        )
    }
}
