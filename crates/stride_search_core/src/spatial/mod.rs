//! Spatial indexing and querying on the sphere
//!
//! This module provides the per-timestep spatial index used to assign grid
//! points to sectors, with k-nearest and radius queries in either chord or
//! great-circle distance.

mod index;
mod query;

// Re-export public types and functions
pub use index::{SpatialIndex, SpatialIndexStats};
pub use query::{DistanceMetric, Neighbor, QueryFilters, SpatialQuery};
