//! Configuration management for the stride search driver.
//!
//! This module handles loading, validation, and defaulting of the driver
//! configuration from TOML files. Command-line overrides are applied by
//! [`crate::app::Application`].

use crate::criteria::CriterionSettings;
use crate::error::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use stride_search_core::SearchConfig;
use tracing::info;

/// Largest synthetic grid the driver will build.
pub const MAX_GRID_POINTS: usize = 10_000_000;

fn default_dataset_name() -> String {
    "analytic".to_string()
}
fn default_grid_spacing_deg() -> f64 { 2.5 }
fn default_timesteps() -> usize { 4 }
fn default_step_hours() -> i64 { 6 }
fn default_start_time() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2005, 8, 28)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Sector tiling and distance settings
    #[serde(default)]
    pub search: SearchConfig,
    /// Synthetic data source settings
    #[serde(default)]
    pub dataset: DatasetSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Detection rules, evaluated in this order
    #[serde(default)]
    pub criteria: Vec<CriterionSettings>,
}

/// Analytic dataset configuration.
///
/// Describes a regular lat/lon grid, the time axis, and the fields defined
/// on it. Each field is a constant background plus moving Gaussian
/// anomalies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSettings {
    /// Name reported on every event
    #[serde(default = "default_dataset_name")]
    pub name: String,
    /// Latitude spacing of the grid in degrees
    #[serde(default = "default_grid_spacing_deg")]
    pub lat_spacing_deg: f64,
    /// Longitude spacing of the grid in degrees
    #[serde(default = "default_grid_spacing_deg")]
    pub lon_spacing_deg: f64,
    /// Number of time steps available
    #[serde(default = "default_timesteps")]
    pub timesteps: usize,
    /// Timestamp of time step 0
    #[serde(default = "default_start_time")]
    pub start_time: NaiveDateTime,
    /// Hours between consecutive time steps
    #[serde(default = "default_step_hours")]
    pub step_hours: i64,
    /// Time steps for which the source has no data
    #[serde(default)]
    pub missing_timesteps: Vec<usize>,
    /// Fields defined on the grid
    #[serde(default)]
    pub fields: Vec<FieldSettings>,
    /// Anomalies superimposed on the fields
    #[serde(default)]
    pub anomalies: Vec<AnomalySettings>,
}

/// One named field and its background value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSettings {
    pub name: String,
    #[serde(default)]
    pub background: f64,
}

/// A Gaussian bump that drifts at a constant rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySettings {
    /// Field the anomaly is added to
    pub field: String,
    /// Latitude of the peak at time step 0
    pub lat: f64,
    /// Longitude of the peak at time step 0
    pub lon: f64,
    /// Degrees of latitude moved per time step
    #[serde(default)]
    pub lat_drift_deg: f64,
    /// Degrees of longitude moved per time step
    #[serde(default)]
    pub lon_drift_deg: f64,
    /// Peak value added to the background (negative for a trough)
    pub amplitude: f64,
    /// Gaussian e-folding half-width in kilometres
    pub width_km: f64,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            name: default_dataset_name(),
            lat_spacing_deg: default_grid_spacing_deg(),
            lon_spacing_deg: default_grid_spacing_deg(),
            timesteps: default_timesteps(),
            start_time: default_start_time(),
            step_hours: default_step_hours(),
            missing_timesteps: Vec::new(),
            fields: vec![
                FieldSettings {
                    name: "vorticity".to_string(),
                    background: 0.0,
                },
                FieldSettings {
                    name: "pressure".to_string(),
                    background: 1010.0,
                },
            ],
            anomalies: vec![
                AnomalySettings {
                    field: "vorticity".to_string(),
                    lat: 23.0,
                    lon: 285.0,
                    lat_drift_deg: 1.0,
                    lon_drift_deg: -1.5,
                    amplitude: 12.0,
                    width_km: 300.0,
                },
                AnomalySettings {
                    field: "pressure".to_string(),
                    lat: 23.0,
                    lon: 285.0,
                    lat_drift_deg: 1.0,
                    lon_drift_deg: -1.5,
                    amplitude: -70.0,
                    width_km: 400.0,
                },
            ],
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            dataset: DatasetSettings::default(),
            logging: LoggingSettings::default(),
            criteria: vec![
                CriterionSettings::MaxThreshold {
                    id: "vorticity_max".to_string(),
                    variable: "vorticity".to_string(),
                    threshold: 5.0,
                },
                CriterionSettings::MinThreshold {
                    id: "pressure_min".to_string(),
                    variable: "pressure".to_string(),
                    threshold: 990.0,
                },
            ],
        }
    }
}

impl DatasetSettings {
    /// Grid latitudes from the south pole to the north pole.
    pub fn latitudes(&self) -> Vec<f64> {
        let rows = (180.0 / self.lat_spacing_deg).floor() as usize + 1;
        (0..rows)
            .map(|i| (-90.0 + i as f64 * self.lat_spacing_deg).min(90.0))
            .collect()
    }

    /// Grid longitudes covering `[0, 360)` once.
    pub fn longitudes(&self) -> Vec<f64> {
        let cols = ((360.0 / self.lon_spacing_deg) - 1e-9).ceil().max(1.0) as usize;
        (0..cols).map(|j| j as f64 * self.lon_spacing_deg).collect()
    }

    /// Timestamp of `time_index`, or `None` past the representable range.
    pub fn timestamp(&self, time_index: usize) -> Option<NaiveDateTime> {
        let hours = i64::try_from(time_index).ok()?.checked_mul(self.step_hours)?;
        self.start_time
            .checked_add_signed(chrono::Duration::try_hours(hours)?)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            std::fs::write(path, toml_content)?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration settings.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.search.validate().map_err(|e| e.to_string())?;

        let dataset = &self.dataset;
        if !(dataset.lat_spacing_deg > 0.0 && dataset.lat_spacing_deg <= 180.0) {
            return Err(format!(
                "dataset.lat_spacing_deg must be in (0, 180], got {}",
                dataset.lat_spacing_deg
            ));
        }
        if !(dataset.lon_spacing_deg > 0.0 && dataset.lon_spacing_deg <= 360.0) {
            return Err(format!(
                "dataset.lon_spacing_deg must be in (0, 360], got {}",
                dataset.lon_spacing_deg
            ));
        }
        let rows = (180.0 / dataset.lat_spacing_deg).floor() + 1.0;
        let grid_points = rows * (360.0 / dataset.lon_spacing_deg).ceil();
        if grid_points > MAX_GRID_POINTS as f64 {
            return Err(format!(
                "dataset spacing {} x {} degrees exceeds {MAX_GRID_POINTS} grid points",
                dataset.lat_spacing_deg, dataset.lon_spacing_deg
            ));
        }
        if dataset.step_hours <= 0 {
            return Err("dataset.step_hours must be greater than 0".to_string());
        }
        if dataset.timesteps > 0 && dataset.timestamp(dataset.timesteps - 1).is_none() {
            return Err("dataset time axis overflows the calendar".to_string());
        }
        for anomaly in &dataset.anomalies {
            if !dataset.has_field(&anomaly.field) {
                return Err(format!("anomaly refers to unknown field '{}'", anomaly.field));
            }
            if !(anomaly.width_km.is_finite() && anomaly.width_km > 0.0) {
                return Err(format!(
                    "anomaly width_km must be positive, got {}",
                    anomaly.width_km
                ));
            }
            if !(anomaly.lat_drift_deg.is_finite() && anomaly.lon_drift_deg.is_finite()) {
                return Err("anomaly drift must be finite".to_string());
            }
            if !(-90.0..=90.0).contains(&anomaly.lat) {
                return Err(format!("anomaly latitude {} is out of range", anomaly.lat));
            }
        }

        let mut ids = HashSet::new();
        for criterion in &self.criteria {
            if criterion.id().is_empty() {
                return Err("criterion id must not be empty".to_string());
            }
            if !ids.insert(criterion.id()) {
                return Err(format!("duplicate criterion id '{}'", criterion.id()));
            }
            if !dataset.has_field(criterion.variable()) {
                return Err(format!(
                    "criterion '{}' reads unknown field '{}'",
                    criterion.id(),
                    criterion.variable()
                ));
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        assert_eq!(config.dataset.name, "analytic");
        assert_eq!(config.dataset.timesteps, 4);
        assert_eq!(config.dataset.fields.len(), 2);
        assert_eq!(config.criteria.len(), 2);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert_eq!(config.search.sector_radius_km, 500.0);
    }

    #[test]
    fn test_grid_axes() {
        let dataset = DatasetSettings {
            lat_spacing_deg: 30.0,
            lon_spacing_deg: 90.0,
            ..DatasetSettings::default()
        };
        assert_eq!(dataset.latitudes(), vec![-90.0, -60.0, -30.0, 0.0, 30.0, 60.0, 90.0]);
        assert_eq!(dataset.longitudes(), vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[test]
    fn test_timestamps_advance_by_step() {
        let dataset = DatasetSettings::default();
        assert_eq!(dataset.timestamp(0), Some(default_start_time()));
        assert_eq!(
            dataset.timestamp(3).map(|t| t.to_string()),
            Some("2005-08-28 18:00:00".to_string())
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.dataset.lat_spacing_deg = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.dataset.anomalies[0].field = "humidity".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        let duplicate = config.criteria[0].clone();
        config.criteria.push(duplicate);
        assert!(config.validate().unwrap_err().contains("duplicate"));

        let mut config = AppConfig::default();
        config.search.sector_radius_km = -5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let mut config = AppConfig::default();
        config.dataset.lat_spacing_deg = 1e-6;
        assert!(config.validate().unwrap_err().contains("grid points"));

        let mut config = AppConfig::default();
        config.dataset.lat_spacing_deg = 0.1;
        config.dataset.lon_spacing_deg = 0.1;
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.search.sector_radius_km = 1e-6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_criterion_id_is_rejected() {
        let mut config = AppConfig::default();
        config.criteria[0] = CriterionSettings::MaxThreshold {
            id: String::new(),
            variable: "vorticity".to_string(),
            threshold: 5.0,
        };
        assert!(config.validate().unwrap_err().contains("empty"));
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stride_search.toml");
        assert!(!path.exists());

        let created = AppConfig::load_from_file(&path).unwrap();
        assert!(path.exists());

        let reloaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(reloaded.criteria, created.criteria);
        assert_eq!(reloaded.dataset.anomalies, created.dataset.anomalies);
        assert_eq!(reloaded.dataset.start_time, created.dataset.start_time);
        assert_eq!(reloaded.search, created.search);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            r#"
[search]
sector_radius_km = 800.0

[logging]
level = "debug"

[[criteria]]
kind = "max_threshold"
id = "vort"
variable = "vorticity"
threshold = 3.0
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.search.sector_radius_km, 800.0);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.dataset.timesteps, 4);
        assert_eq!(config.criteria.len(), 1);
        assert_eq!(config.criteria[0].id(), "vort");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[search\nsector_radius_km = ").unwrap();
        assert!(AppConfig::load_from_file(&path).is_err());
    }
}
