//! # Stride Search Core
//!
//! Sector-based spatial search for identifying events (storms, vortices,
//! extrema) in gridded geophysical data on the surface of a sphere.
//!
//! ## Core Features
//!
//! - **Coordinate Transform**: Geographic ↔ unit-sphere conversion and
//!   haversine great-circle distance
//! - **Spatial Index**: R*-tree over embedded points with k-nearest and
//!   radius queries in great-circle or chord distance
//! - **Sectors**: Circular search regions that own their member points and a
//!   per-criterion workspace
//! - **Criteria**: Pluggable detection rules evaluated against every sector
//! - **Events**: Immutable records of positive detections
//!
//! ## Architecture Overview
//!
//! For each time step a data source hands its grid coordinates to a
//! [`PointArena`], which builds a [`SpatialIndex`]. A [`SectorList`] tiles the
//! search region, links each [`Sector`] to the points inside it, and evaluates
//! every [`Criterion`] per sector, yielding [`Event`]s.
//!
//! ## Quick Start Example
//!
//! ```rust
//! use stride_search_core::*;
//!
//! let lats: Vec<f64> = (-9..=9).map(|n| n as f64 * 10.0).collect();
//! let lons: Vec<f64> = (0..36).map(|n| n as f64 * 10.0).collect();
//! let arena = PointArena::rectilinear(&lats, &lons)?;
//! let index = arena.build_index(DistanceMetric::GreatCircle, EARTH_RADIUS_KM)?;
//!
//! let center = GeoPoint::new(0.0, 0.0)?;
//! let nearby = index.radius_search(&center, 1200.0);
//! assert_eq!(nearby.len(), 5);
//! # Ok::<(), StrideError>(())
//! ```

pub mod arena;
pub mod config;
pub mod criteria;
pub mod error;
pub mod event;
pub mod sector;
pub mod source;
pub mod spatial;
pub mod sphere;
pub mod types;

pub use arena::PointArena;
pub use config::SearchConfig;
pub use criteria::{CriteriaList, Criterion, Detection, Sample};
pub use error::{Result, StrideError};
pub use event::{sort_events, Event};
pub use sector::{
    SearchRegion, Sector, SectorList, SectorPoint, Workspace, WorkspaceEntry, MAX_SECTORS,
};
pub use source::FieldSource;
pub use spatial::{
    DistanceMetric, Neighbor, QueryFilters, SpatialIndex, SpatialIndexStats, SpatialQuery,
};
pub use sphere::{
    arc_to_chord, central_angle, chord_to_arc, km_to_degrees, sphere_distance, to_cartesian,
    to_geographic, EARTH_RADIUS_KM,
};
pub use types::{normalize_longitude, CartesianPoint, DataHandle, GeoPoint, GridIndex};

#[cfg(test)]
mod tests;
