//! Search configuration
//!
//! Settings that shape one stride search: where to look, how large each
//! sector is, and how distances are measured. Loaded from the `[search]`
//! table of the driver's TOML file.

use crate::error::{Result, StrideError};
use crate::sector::SearchRegion;
use crate::spatial::DistanceMetric;
use crate::sphere::EARTH_RADIUS_KM;
use serde::{Deserialize, Serialize};

fn default_sector_radius_km() -> f64 { 500.0 }
fn default_sphere_radius_km() -> f64 { EARTH_RADIUS_KM }
fn default_parallel() -> bool { true }

/// Complete stride search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Area tiled with sectors
    #[serde(default)]
    pub region: SearchRegion,
    /// Radius of every strided sector, in kilometres
    #[serde(default = "default_sector_radius_km")]
    pub sector_radius_km: f64,
    /// Radius of the sphere the data lives on, in kilometres
    #[serde(default = "default_sphere_radius_km")]
    pub sphere_radius_km: f64,
    /// Metric used for sector membership queries
    #[serde(default)]
    pub metric: DistanceMetric,
    /// Evaluate sectors on the rayon thread pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            region: SearchRegion::default(),
            sector_radius_km: default_sector_radius_km(),
            sphere_radius_km: default_sphere_radius_km(),
            metric: DistanceMetric::default(),
            parallel: default_parallel(),
        }
    }
}

impl SearchConfig {
    /// Checks every setting, returning [`StrideError::Config`] for the first
    /// invalid one.
    pub fn validate(&self) -> Result<()> {
        self.region.validate()?;

        if !(self.sector_radius_km.is_finite() && self.sector_radius_km > 0.0) {
            return Err(StrideError::Config(format!(
                "sector_radius_km must be positive, got {}",
                self.sector_radius_km
            )));
        }
        if !(self.sphere_radius_km.is_finite() && self.sphere_radius_km > 0.0) {
            return Err(StrideError::Config(format!(
                "sphere_radius_km must be positive, got {}",
                self.sphere_radius_km
            )));
        }
        if self.sector_radius_km > std::f64::consts::PI * self.sphere_radius_km {
            return Err(StrideError::Config(format!(
                "sector_radius_km ({}) exceeds half the sphere's circumference",
                self.sector_radius_km
            )));
        }
        self.region
            .check_tiling(self.sector_radius_km, self.sphere_radius_km)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_config_default() {
        let config = SearchConfig::default();
        assert_eq!(config.region, SearchRegion::global());
        assert_eq!(config.sector_radius_km, 500.0);
        assert_eq!(config.sphere_radius_km, EARTH_RADIUS_KM);
        assert_eq!(config.metric, DistanceMetric::GreatCircle);
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SearchConfig = toml::from_str(
            r#"
            sector_radius_km = 250.0
            metric = "chord"

            [region]
            south = -30.0
            north = 30.0
            west = 100.0
            east = 200.0
            "#,
        )
        .unwrap();
        assert_eq!(config.sector_radius_km, 250.0);
        assert_eq!(config.metric, DistanceMetric::Chord);
        assert_eq!(config.region.south, -30.0);
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_radii() {
        let mut config = SearchConfig::default();
        config.sector_radius_km = 0.0;
        assert!(matches!(config.validate(), Err(StrideError::Config(_))));

        config.sector_radius_km = 30_000.0;
        assert!(config.validate().is_err());

        config = SearchConfig::default();
        config.sphere_radius_km = f64::NAN;
        assert!(config.validate().is_err());

        config = SearchConfig::default();
        config.sector_radius_km = 1e-6;
        assert!(matches!(config.validate(), Err(StrideError::Config(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SearchConfig {
            parallel: false,
            ..SearchConfig::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let back: SearchConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, back);
    }
}
