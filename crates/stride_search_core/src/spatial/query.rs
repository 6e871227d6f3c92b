/// Spatial query types and utilities
use crate::types::GeoPoint;
use serde::{Deserialize, Serialize};

/// Distance metric an index answers queries in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// True great-circle (haversine) distance along the sphere surface.
    #[default]
    GreatCircle,
    /// Straight-line distance through the sphere between the embedded points.
    Chord,
}

/// Radius query parameters
#[derive(Debug, Clone)]
pub struct SpatialQuery {
    /// Center of the query
    pub center: GeoPoint,
    /// Query radius, in the index's distance metric and length unit
    pub radius: f64,
    /// Optional shaping of the result set
    pub filters: QueryFilters,
}

impl SpatialQuery {
    pub fn new(center: GeoPoint, radius: f64) -> Self {
        Self {
            center,
            radius,
            filters: QueryFilters::default(),
        }
    }
}

/// Options that can be applied to radius queries
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    /// Sort matches by ascending distance (ties broken by index) instead of
    /// the default ascending-index order
    pub sorted: bool,
    /// Maximum number of results to return, applied after ordering
    pub max_results: Option<usize>,
    /// Minimum distance from query center
    pub min_distance: Option<f64>,
}

/// One match returned by a k-nearest or radius query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    /// Position of the point in the array the index was built from
    pub index: usize,
    /// Distance from the query center in the index's metric
    pub distance: f64,
}

/// Orders neighbors by ascending distance, ties broken by index.
pub(crate) fn sort_by_distance(results: &mut [Neighbor]) {
    results.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.index.cmp(&b.index))
    });
}
