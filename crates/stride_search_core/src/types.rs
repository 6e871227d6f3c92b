//! # Core Type Definitions
//!
//! This module contains the fundamental value types used throughout the
//! stride search core: geographic and embedded coordinates, and the opaque
//! handles that point back into a data source's grid.
//!
//! ## Key Types
//!
//! - [`GeoPoint`] - Validated latitude/longitude pair in degrees
//! - [`CartesianPoint`] - Unit-sphere embedding of a [`GeoPoint`]
//! - [`GridIndex`] - Location of a point in the data source's native grid
//! - [`DataHandle`] - Arena index plus grid location for one data point
//!
//! ## Conventions
//!
//! - Degrees at every public boundary; radians only inside the transforms
//! - Longitudes are normalized to `[0, 360)`
//! - A [`CartesianPoint`] can only be produced from a valid [`GeoPoint`], so
//!   `x² + y² + z² = 1` holds up to rounding

use crate::error::{Result, StrideError};
use serde::{Deserialize, Serialize};

/// Normalizes a longitude in degrees to `[0, 360)`.
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// A point on the sphere in geographic coordinates (degrees).
///
/// Latitude is in `[-90, 90]`; longitude is normalized to `[0, 360)` on
/// construction.
///
/// # Examples
///
/// ```rust
/// use stride_search_core::GeoPoint;
///
/// let p = GeoPoint::new(45.0, -90.0)?;
/// assert_eq!(p.lon(), 270.0);
/// assert!(GeoPoint::new(91.0, 0.0).is_err());
/// # Ok::<(), stride_search_core::StrideError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = StrideError;

    fn try_from(raw: RawGeoPoint) -> Result<Self> {
        GeoPoint::new(raw.lat, raw.lon)
    }
}

impl GeoPoint {
    /// Creates a validated geographic point.
    ///
    /// Fails with [`StrideError::Domain`] when the latitude lies outside
    /// `[-90, 90]` or either coordinate is not finite.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(StrideError::Domain { lat, lon });
        }
        Ok(Self {
            lat,
            lon: normalize_longitude(lon),
        })
    }

    /// Builds a point from components already known to be in range.
    pub(crate) fn from_normalized(lat: f64, lon: f64) -> Self {
        debug_assert!((-90.0..=90.0).contains(&lat) && (0.0..360.0).contains(&lon));
        Self { lat, lon }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees, in `[0, 360)`.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Embeds this point on the unit sphere.
    pub fn to_cartesian(&self) -> CartesianPoint {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();
        CartesianPoint {
            x: cos_lat * cos_lon,
            y: cos_lat * sin_lon,
            z: sin_lat,
        }
    }

    /// Great-circle distance to `other` on the Earth, in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        crate::sphere::sphere_distance(self.lat, self.lon, other.lat, other.lon)
    }

    /// Compares two points within `tol_deg` degrees.
    ///
    /// Longitudes are compared modulo 360, and ignored entirely when both
    /// points sit on the same pole, where longitude carries no information.
    pub fn approx_eq(&self, other: &GeoPoint, tol_deg: f64) -> bool {
        if (self.lat - other.lat).abs() > tol_deg {
            return false;
        }
        if 90.0 - self.lat.abs() <= tol_deg && 90.0 - other.lat.abs() <= tol_deg {
            return true;
        }
        let dlon = (self.lon - other.lon).rem_euclid(360.0);
        dlon.min(360.0 - dlon) <= tol_deg
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// A point on the unit sphere.
///
/// There is no public constructor taking raw components: instances come from
/// [`GeoPoint::to_cartesian`] or [`crate::sphere::to_cartesian`], which keeps
/// every value on the sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianPoint {
    x: f64,
    y: f64,
    z: f64,
}

impl CartesianPoint {
    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    /// Components as an array, the layout the R*-tree works with.
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Squared Euclidean (chord) distance on the unit sphere.
    pub fn chord_distance_2(&self, other: &CartesianPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean (chord) distance on the unit sphere.
    pub fn chord_distance(&self, other: &CartesianPoint) -> f64 {
        self.chord_distance_2(other).sqrt()
    }

    /// Squared norm; `1.0` up to rounding.
    pub fn norm_2(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
}

/// Location of a point in the data source's native grid layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridIndex {
    /// Logically rectangular lat/lon grid: row (latitude) and column
    /// (longitude) indices.
    Rectilinear { lat: usize, lon: usize },
    /// Unstructured grid: a single column index.
    Unstructured(usize),
}

/// Identifies one point's data in the external data source.
///
/// `arena_index` references the per-timestep [`crate::PointArena`]; `grid` is
/// what a criterion hands back to its data source to look up field values.
/// The core never interprets either beyond copying them around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataHandle {
    pub arena_index: usize,
    pub grid: GridIndex,
}

impl DataHandle {
    pub fn new(arena_index: usize, grid: GridIndex) -> Self {
        Self { arena_index, grid }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longitude_normalization() {
        assert_eq!(normalize_longitude(-180.0), 180.0);
        assert_eq!(normalize_longitude(360.0), 0.0);
        assert_eq!(normalize_longitude(725.0), 5.0);
        assert_eq!(normalize_longitude(-1e-20), 0.0);
    }

    #[test]
    fn test_geo_point_rejects_out_of_range_latitude() {
        assert_eq!(
            GeoPoint::new(90.5, 10.0),
            Err(StrideError::Domain { lat: 90.5, lon: 10.0 })
        );
        assert!(GeoPoint::new(-90.0001, 0.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
        assert!(GeoPoint::new(90.0, 0.0).is_ok());
        assert!(GeoPoint::new(-90.0, 0.0).is_ok());
    }

    #[test]
    fn test_cartesian_lies_on_unit_sphere() {
        for &(lat, lon) in &[(0.0, 0.0), (90.0, 0.0), (-45.0, 200.0), (12.5, 359.9)] {
            let p = GeoPoint::new(lat, lon).unwrap().to_cartesian();
            assert!((p.norm_2() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_approx_eq_handles_poles_and_antimeridian() {
        let a = GeoPoint::new(90.0, 10.0).unwrap();
        let b = GeoPoint::new(90.0, 250.0).unwrap();
        assert!(a.approx_eq(&b, 1e-6));

        let c = GeoPoint::new(10.0, 359.9999999).unwrap();
        let d = GeoPoint::new(10.0, 0.0).unwrap();
        assert!(c.approx_eq(&d, 1e-6));

        let e = GeoPoint::new(10.0, 1.0).unwrap();
        assert!(!d.approx_eq(&e, 1e-6));
    }

    #[test]
    fn test_geo_point_deserialization_validates() {
        let ok: GeoPoint = serde_json::from_str(r#"{"lat": 10.0, "lon": -10.0}"#).unwrap();
        assert_eq!(ok.lon(), 350.0);

        let bad: std::result::Result<GeoPoint, _> =
            serde_json::from_str(r#"{"lat": 100.0, "lon": 0.0}"#);
        assert!(bad.is_err());
    }
}
