//! # Point Arena
//!
//! Per-timestep storage of every grid point handed over by a data source.
//! Sectors and the spatial index refer to points by their position in the
//! arena, never by pointer, so a new timestep simply builds a new arena.

use crate::error::{Result, StrideError};
use crate::spatial::{DistanceMetric, SpatialIndex};
use crate::types::{DataHandle, GeoPoint, GridIndex};

/// Geographic coordinates and data handles for one timestep's grid.
#[derive(Debug, Clone, Default)]
pub struct PointArena {
    coords: Vec<GeoPoint>,
    handles: Vec<DataHandle>,
}

impl PointArena {
    /// Builds the arena for a logically rectangular grid.
    ///
    /// Points are laid out latitude-major: arena index `i * lons.len() + j`
    /// holds `(lats[i], lons[j])`.
    pub fn rectilinear(lats: &[f64], lons: &[f64]) -> Result<Self> {
        if lats.is_empty() != lons.is_empty() {
            return Err(StrideError::GridShape(format!(
                "rectilinear grid has {} latitudes but {} longitudes",
                lats.len(),
                lons.len()
            )));
        }

        let mut arena = Self::with_capacity(lats.len() * lons.len());
        for (i, &lat) in lats.iter().enumerate() {
            for (j, &lon) in lons.iter().enumerate() {
                arena.push(
                    GeoPoint::new(lat, lon)?,
                    GridIndex::Rectilinear { lat: i, lon: j },
                );
            }
        }
        Ok(arena)
    }

    /// Builds the arena for an unstructured grid where `lats[n]` and
    /// `lons[n]` describe column `n`.
    pub fn unstructured(lats: &[f64], lons: &[f64]) -> Result<Self> {
        if lats.len() != lons.len() {
            return Err(StrideError::GridShape(format!(
                "unstructured grid has {} latitudes but {} longitudes",
                lats.len(),
                lons.len()
            )));
        }

        let mut arena = Self::with_capacity(lats.len());
        for (n, (&lat, &lon)) in lats.iter().zip(lons).enumerate() {
            arena.push(GeoPoint::new(lat, lon)?, GridIndex::Unstructured(n));
        }
        Ok(arena)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            coords: Vec::with_capacity(capacity),
            handles: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, coord: GeoPoint, grid: GridIndex) {
        let handle = DataHandle::new(self.coords.len(), grid);
        self.coords.push(coord);
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// All coordinates, in arena order.
    pub fn coords(&self) -> &[GeoPoint] {
        &self.coords
    }

    /// All handles, in arena order.
    pub fn handles(&self) -> &[DataHandle] {
        &self.handles
    }

    /// Coordinate and handle at `index`.
    pub fn get(&self, index: usize) -> Option<(GeoPoint, DataHandle)> {
        Some((*self.coords.get(index)?, *self.handles.get(index)?))
    }

    /// Builds the spatial index over this arena.
    ///
    /// Neighbor indices returned by the index are arena indices.
    pub fn build_index(&self, metric: DistanceMetric, sphere_radius: f64) -> Result<SpatialIndex> {
        SpatialIndex::build_with(&self.coords, metric, sphere_radius)
    }
}
