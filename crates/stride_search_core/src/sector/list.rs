/// Sector tiling and bulk evaluation
use super::Sector;
use crate::arena::PointArena;
use crate::criteria::Criterion;
use crate::error::{Result, StrideError};
use crate::event::Event;
use crate::spatial::SpatialIndex;
use crate::types::GeoPoint;
use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const STRIDE_EPS: f64 = 1e-9;

/// Largest number of sectors a region may be tiled into.
pub const MAX_SECTORS: usize = 1_000_000;

/// Latitude/longitude box searched for events, in degrees.
///
/// `west` and `east` may be given in either `[-180, 180)` or `[0, 360)`. A box
/// with `east < west` wraps across the prime meridian (e.g. `west = 350`,
/// `east = 10`); a span of 360 degrees or more covers the whole globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchRegion {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl Default for SearchRegion {
    fn default() -> Self {
        Self::global()
    }
}

impl SearchRegion {
    pub fn new(south: f64, north: f64, west: f64, east: f64) -> Self {
        Self {
            south,
            north,
            west,
            east,
        }
    }

    /// The whole sphere.
    pub fn global() -> Self {
        Self::new(-90.0, 90.0, 0.0, 360.0)
    }

    pub fn validate(&self) -> Result<()> {
        let bounds = [self.south, self.north, self.west, self.east];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(StrideError::Config(format!(
                "search region bounds must be finite: {self:?}"
            )));
        }
        if !(-90.0..=90.0).contains(&self.south) || !(-90.0..=90.0).contains(&self.north) {
            return Err(StrideError::Config(format!(
                "search region latitudes must lie in [-90, 90], got south = {}, north = {}",
                self.south, self.north
            )));
        }
        if self.south >= self.north {
            return Err(StrideError::Config(format!(
                "search region south ({}) must be below north ({})",
                self.south, self.north
            )));
        }
        if self.lon_extent() == 0.0 {
            return Err(StrideError::Config(format!(
                "search region has zero longitudinal extent (west = east = {})",
                self.west
            )));
        }
        Ok(())
    }

    /// Longitudinal span in degrees, measured eastward from `west`.
    pub fn lon_extent(&self) -> f64 {
        if self.east - self.west >= 360.0 {
            360.0
        } else {
            (self.east - self.west).rem_euclid(360.0)
        }
    }

    pub fn is_global_in_longitude(&self) -> bool {
        self.lon_extent() >= 360.0
    }

    /// Checks that sectors of arc radius `radius` can tile this region and
    /// returns the latitude stride in degrees.
    ///
    /// Fails when the tiling would exceed [`MAX_SECTORS`] sectors.
    pub fn check_tiling(&self, radius: f64, sphere_radius: f64) -> Result<f64> {
        self.validate()?;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(StrideError::Config(format!(
                "sector radius must be positive, got {radius}"
            )));
        }
        if !(sphere_radius.is_finite() && sphere_radius > 0.0) {
            return Err(StrideError::Config(format!(
                "sphere radius must be positive, got {sphere_radius}"
            )));
        }

        let lat_stride = (radius / sphere_radius).to_degrees().min(180.0);
        let rows = ((self.north - self.south) / lat_stride).floor() + 1.0;
        // the equator has the most columns, so this bounds the real count
        let widest_row = (self.lon_extent() / lat_stride).ceil() + 1.0;
        if rows * widest_row > MAX_SECTORS as f64 {
            return Err(StrideError::Config(format!(
                "sector radius {radius} would tile the region into more than {MAX_SECTORS} sectors"
            )));
        }
        Ok(lat_stride)
    }

    /// Sector centers covering this region for sectors of arc radius
    /// `radius` on a sphere of radius `sphere_radius`.
    ///
    /// Rows are spaced by the radius expressed in degrees of latitude. Within
    /// a row the longitude stride is the latitude stride divided by
    /// `cos(lat)`, so neighbouring centers stay roughly one radius apart.
    pub fn sector_centers(&self, radius: f64, sphere_radius: f64) -> Result<Vec<GeoPoint>> {
        let lat_stride = self.check_tiling(radius, sphere_radius)?;
        // tolerate rounding in the stride so an exact multiple still reaches the far edge
        let n_rows = ((self.north - self.south) / lat_stride + STRIDE_EPS).floor() as usize + 1;
        let extent = self.lon_extent();

        let mut centers = Vec::new();
        for row in 0..n_rows {
            let lat = (self.south + row as f64 * lat_stride).min(self.north);
            let cos_lat = lat.to_radians().cos();
            let lon_stride = if cos_lat > 1e-12 {
                (lat_stride / cos_lat).min(360.0)
            } else {
                360.0
            };

            let n_cols = if self.is_global_in_longitude() {
                ((360.0 / lon_stride - STRIDE_EPS).ceil() as usize).max(1)
            } else {
                (extent / lon_stride + STRIDE_EPS).floor() as usize + 1
            };
            for col in 0..n_cols {
                centers.push(GeoPoint::new(lat, self.west + col as f64 * lon_stride)?);
            }
        }
        Ok(centers)
    }
}

/// All sectors of one search, evaluated together at each time step.
#[derive(Debug, Clone, Default)]
pub struct SectorList {
    sectors: Vec<Sector>,
}

impl SectorList {
    /// Tiles `region` with sectors of radius `radius`.
    pub fn strided(
        region: &SearchRegion,
        radius: f64,
        sphere_radius: f64,
        n_criteria: usize,
    ) -> Result<Self> {
        let centers = region.sector_centers(radius, sphere_radius)?;
        debug!(
            sectors = centers.len(),
            radius,
            "Tiled search region {:?}",
            region
        );
        Ok(Self::from_centers(
            centers.into_iter().map(|c| (c, radius)).collect(),
            n_criteria,
        ))
    }

    /// Builds sectors at explicit centers, each with its own radius.
    pub fn from_centers(centers: Vec<(GeoPoint, f64)>, n_criteria: usize) -> Self {
        Self {
            sectors: centers
                .into_iter()
                .map(|(center, radius)| Sector::new(center, radius, Vec::new(), n_criteria))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.iter()
    }

    pub fn get(&self, position: usize) -> Option<&Sector> {
        self.sectors.get(position)
    }

    /// Replaces every sector's membership with the arena points inside it.
    ///
    /// Returns the total number of assignments; a point near a sector edge
    /// can belong to several sectors.
    pub fn link_to_data(&mut self, index: &SpatialIndex, arena: &PointArena) -> usize {
        let mut total = 0;
        for sector in &mut self.sectors {
            sector.clear_members();
            total += sector.link(index, arena);
        }
        let empty = self.sectors.iter().filter(|s| s.is_empty()).count();
        debug!(
            sectors = self.sectors.len(),
            assignments = total,
            empty_sectors = empty,
            "Linked sectors to {} data points",
            arena.len()
        );
        total
    }

    pub fn alloc_workspaces(&mut self, criteria: &[Box<dyn Criterion>]) {
        for sector in &mut self.sectors {
            sector.alloc_workspace(criteria);
        }
    }

    /// Evaluates every sector at one time step.
    ///
    /// Events come back grouped by sector in list order, and by criteria order
    /// within a sector, whether or not `parallel` is set. The first workspace
    /// mismatch aborts the step.
    pub fn evaluate_at_timestep(
        &mut self,
        criteria: &[Box<dyn Criterion>],
        timestamp: NaiveDateTime,
        source: &str,
        time_index: usize,
        parallel: bool,
    ) -> Result<Vec<Event>> {
        let per_sector: Vec<Vec<Event>> = if parallel {
            self.sectors
                .par_iter_mut()
                .map(|sector| {
                    sector.evaluate_criteria_at_timestep(criteria, timestamp, source, time_index)
                })
                .collect::<Result<_>>()?
        } else {
            self.sectors
                .iter_mut()
                .map(|sector| {
                    sector.evaluate_criteria_at_timestep(criteria, timestamp, source, time_index)
                })
                .collect::<Result<_>>()?
        };

        let events: Vec<Event> = per_sector.into_iter().flatten().collect();
        info!(
            time_index,
            %timestamp,
            sectors = self.sectors.len(),
            events = events.len(),
            "Evaluated time step of {}",
            source
        );
        Ok(events)
    }
}
