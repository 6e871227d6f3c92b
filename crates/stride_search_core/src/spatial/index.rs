//! R*-tree based spatial indexing over the sphere
//!
//! This module provides the per-timestep spatial index backed by the `rstar`
//! crate. Points are stored at their unit-sphere embedding, where the tree
//! natively answers Euclidean (chord) queries. Great-circle queries are
//! answered by converting the arc radius into the equivalent chord radius for
//! the tree walk and then keeping exactly the candidates whose haversine
//! distance is within the requested radius.

use super::query::{sort_by_distance, DistanceMetric, Neighbor, SpatialQuery};
use crate::error::{Result, StrideError};
use crate::sphere::{arc_to_chord, central_angle, EARTH_RADIUS_KM};
use crate::types::GeoPoint;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Relative slack applied to the chord pre-filter so rounding in the
/// embedding can never drop a point sitting on the query boundary.
const CHORD_SLACK: f64 = 1e-9;

/// Entry stored inside the R-tree.
#[derive(Debug, Clone)]
struct IndexEntry {
    index: usize,
    point: [f64; 3],
}

impl IndexEntry {
    fn new(index: usize, geo: &GeoPoint) -> Self {
        Self {
            index,
            point: geo.to_cartesian().coords(),
        }
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexEntry {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }

    fn contains_point(&self, point: &[f64; 3]) -> bool {
        (self.point[0] - point[0]).abs() < f64::EPSILON
            && (self.point[1] - point[1]).abs() < f64::EPSILON
            && (self.point[2] - point[2]).abs() < f64::EPSILON
    }
}

/// Statistics for a built index
#[derive(Debug, Clone, Default)]
pub struct SpatialIndexStats {
    pub total_points: usize,
    pub total_queries: usize,
    pub last_query_result_count: usize,
}

/// Immutable spatial index over one timestep's grid.
///
/// Built once with [`SpatialIndex::build`] and read-only afterwards, so a
/// single index can serve concurrent queries from many sector tasks. A new
/// grid or timestep requires building a new index.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
    points: Vec<GeoPoint>,
    metric: DistanceMetric,
    sphere_radius: f64,
    total_queries: AtomicUsize,
    last_query_result_count: AtomicUsize,
}

impl SpatialIndex {
    /// Builds a great-circle index on the Earth over `points`.
    ///
    /// Bulk loads the R*-tree in O(N log N). Fails with
    /// [`StrideError::EmptyDataset`] when `points` is empty.
    pub fn build(points: &[GeoPoint]) -> Result<Self> {
        Self::build_with(points, DistanceMetric::GreatCircle, EARTH_RADIUS_KM)
    }

    /// Builds an index answering in `metric` on a sphere of `sphere_radius`.
    ///
    /// Query radii and reported distances use the same length unit as
    /// `sphere_radius`.
    pub fn build_with(
        points: &[GeoPoint],
        metric: DistanceMetric,
        sphere_radius: f64,
    ) -> Result<Self> {
        if points.is_empty() {
            return Err(StrideError::EmptyDataset);
        }
        if !(sphere_radius.is_finite() && sphere_radius > 0.0) {
            return Err(StrideError::Config(format!(
                "sphere radius must be positive, got {sphere_radius}"
            )));
        }

        let entries: Vec<IndexEntry> = points
            .iter()
            .enumerate()
            .map(|(index, geo)| IndexEntry::new(index, geo))
            .collect();
        let tree = RTree::bulk_load(entries);

        debug!(
            points = points.len(),
            ?metric,
            sphere_radius,
            "Built spatial index"
        );

        Ok(Self {
            tree,
            points: points.to_vec(),
            metric,
            sphere_radius,
            total_queries: AtomicUsize::new(0),
            last_query_result_count: AtomicUsize::new(0),
        })
    }

    /// Distance metric this index answers in
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Radius of the sphere the index measures on
    pub fn sphere_radius(&self) -> f64 {
        self.sphere_radius
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false` for a successfully built index
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Looks up an indexed point by its position in the build input
    pub fn point(&self, index: usize) -> Option<&GeoPoint> {
        self.points.get(index)
    }

    /// Distance between two points in this index's metric
    pub fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        match self.metric {
            DistanceMetric::GreatCircle => {
                self.sphere_radius * central_angle(a.lat(), a.lon(), b.lat(), b.lon())
            }
            DistanceMetric::Chord => {
                self.sphere_radius * a.to_cartesian().chord_distance(&b.to_cartesian())
            }
        }
    }

    /// Returns at most `k` points nearest to `query`, ascending by distance.
    ///
    /// Chord length grows monotonically with arc length over the whole
    /// sphere, so the `k` nearest points in either metric are the `k` nearest
    /// in the tree's Euclidean embedding. The search ball starts at the size
    /// expected to hold `k` points for a uniform cloud and doubles until it
    /// holds at least `k` candidates or covers the sphere. Fewer than `k`
    /// indexed points yields all of them.
    pub fn k_nearest(&self, query: &GeoPoint, k: usize) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let center = query.to_cartesian().coords();
        let mut unit_chord = (4.0 * k as f64 / self.points.len() as f64)
            .sqrt()
            .clamp(1e-6, 2.0);

        let mut results = loop {
            let reach = unit_chord * (1.0 + CHORD_SLACK) + CHORD_SLACK;
            let candidates: Vec<&IndexEntry> = self
                .tree
                .locate_within_distance(center, reach * reach)
                .collect();
            if candidates.len() >= k || unit_chord >= 2.0 {
                break candidates
                    .into_iter()
                    .map(|entry| Neighbor {
                        index: entry.index,
                        distance: self.distance(query, &self.points[entry.index]),
                    })
                    .collect::<Vec<_>>();
            }
            unit_chord = (2.0 * unit_chord).min(2.0);
        };

        sort_by_distance(&mut results);
        results.truncate(k);
        self.record_query(results.len());
        results
    }

    /// Returns every point within `radius` of `query` (inclusive), ordered by
    /// ascending index.
    ///
    /// Repeated calls with the same arguments return the identical sequence.
    /// A negative or NaN radius matches nothing.
    pub fn radius_search(&self, query: &GeoPoint, radius: f64) -> Vec<Neighbor> {
        self.query(&SpatialQuery::new(*query, radius))
    }

    /// Like [`SpatialIndex::radius_search`] but ordered by ascending distance.
    pub fn radius_search_sorted(&self, query: &GeoPoint, radius: f64) -> Vec<Neighbor> {
        let mut spatial_query = SpatialQuery::new(*query, radius);
        spatial_query.filters.sorted = true;
        self.query(&spatial_query)
    }

    /// Executes a radius query with optional filters
    pub fn query(&self, query: &SpatialQuery) -> Vec<Neighbor> {
        let radius = query.radius;
        if radius.is_nan() || radius < 0.0 {
            self.record_query(0);
            return Vec::new();
        }

        let unit_chord = match self.metric {
            DistanceMetric::GreatCircle => arc_to_chord(radius, self.sphere_radius),
            DistanceMetric::Chord => radius.min(2.0 * self.sphere_radius),
        } / self.sphere_radius;
        let search_radius = unit_chord * (1.0 + CHORD_SLACK) + CHORD_SLACK;

        let center = query.center.to_cartesian().coords();
        let mut results: Vec<Neighbor> = self
            .tree
            .locate_within_distance(center, search_radius * search_radius)
            .filter_map(|entry| {
                let distance = self.distance(&query.center, &self.points[entry.index]);
                if distance > radius {
                    return None;
                }
                if let Some(min_distance) = query.filters.min_distance {
                    if distance < min_distance {
                        return None;
                    }
                }
                Some(Neighbor {
                    index: entry.index,
                    distance,
                })
            })
            .collect();

        if query.filters.sorted {
            sort_by_distance(&mut results);
        } else {
            results.sort_by_key(|n| n.index);
        }

        if let Some(max_results) = query.filters.max_results {
            results.truncate(max_results);
        }

        self.record_query(results.len());
        results
    }

    /// Gets query statistics
    pub fn stats(&self) -> SpatialIndexStats {
        SpatialIndexStats {
            total_points: self.points.len(),
            total_queries: self.total_queries.load(Ordering::Relaxed),
            last_query_result_count: self.last_query_result_count.load(Ordering::Relaxed),
        }
    }

    fn record_query(&self, result_count: usize) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        self.last_query_result_count
            .store(result_count, Ordering::Relaxed);
    }
}
