//! # Coordinate Transform
//!
//! Pure functions converting between geographic coordinates and the
//! unit-sphere embedding, plus great-circle distance.
//!
//! Distances on the Earth use the haversine formulation, which stays accurate
//! for nearly identical points where the spherical law of cosines loses every
//! significant digit. Latitude is recovered with `atan2` rather than `asin`
//! for the same reason near the poles.

use crate::error::Result;
use crate::types::{normalize_longitude, CartesianPoint, GeoPoint};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.22;

/// Converts a latitude/longitude pair (degrees) to the unit-sphere embedding.
///
/// Fails with [`crate::StrideError::Domain`] when the latitude is outside
/// `[-90, 90]`.
pub fn to_cartesian(lat: f64, lon: f64) -> Result<CartesianPoint> {
    Ok(GeoPoint::new(lat, lon)?.to_cartesian())
}

/// Inverse of [`to_cartesian`].
///
/// At the poles the longitude is undefined and comes back as whatever
/// `atan2` yields for the (rounding-sized) horizontal components.
pub fn to_geographic(p: &CartesianPoint) -> GeoPoint {
    let horizontal = p.x().hypot(p.y());
    let lat = p.z().atan2(horizontal).to_degrees().clamp(-90.0, 90.0);
    let lon = normalize_longitude(p.y().atan2(p.x()).to_degrees());
    GeoPoint::from_normalized(lat, lon)
}

/// Central angle in radians between two geographic points (degrees).
///
/// The operands are put in a canonical order first so that swapping them
/// yields a bit-identical result.
pub fn central_angle(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let ((lat1, lon1), (lat2, lon2)) = if (lat_a, lon_a) <= (lat_b, lon_b) {
        ((lat_a, lon_a), (lat_b, lon_b))
    } else {
        ((lat_b, lon_b), (lat_a, lon_a))
    };

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let half_dlat = 0.5 * (phi2 - phi1);
    let half_dlon = 0.5 * (lon2 - lon1).to_radians();

    let a = half_dlat.sin().powi(2) + phi1.cos() * phi2.cos() * half_dlon.sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance in kilometres on the Earth between two geographic
/// points given in degrees.
///
/// Exactly `0.0` for identical inputs and symmetric in its arguments.
pub fn sphere_distance(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    EARTH_RADIUS_KM * central_angle(lat_a, lon_a, lat_b, lon_b)
}

/// Chord length on a sphere of radius `radius` subtending an arc of length `arc`.
///
/// Arcs of half the circumference or more map to the diameter.
pub fn arc_to_chord(arc: f64, radius: f64) -> f64 {
    let theta = (arc / radius).min(std::f64::consts::PI);
    2.0 * radius * (0.5 * theta).sin()
}

/// Arc length on a sphere of radius `radius` subtended by a chord of length `chord`.
pub fn chord_to_arc(chord: f64, radius: f64) -> f64 {
    let half = (0.5 * chord / radius).clamp(0.0, 1.0);
    2.0 * radius * half.asin()
}

/// Converts an arc length on the Earth (km) to degrees of central angle.
pub fn km_to_degrees(km: f64) -> f64 {
    (km / EARTH_RADIUS_KM).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_cartesian_known_points() {
        let p = to_cartesian(0.0, 0.0).unwrap();
        assert!((p.x() - 1.0).abs() < 1e-15);
        assert!(p.y().abs() < 1e-15 && p.z().abs() < 1e-15);

        let q = to_cartesian(0.0, 90.0).unwrap();
        assert!((q.y() - 1.0).abs() < 1e-15);

        let n = to_cartesian(90.0, 123.0).unwrap();
        assert!((n.z() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_to_cartesian_rejects_invalid_latitude() {
        assert!(to_cartesian(-91.0, 0.0).is_err());
        assert!(to_cartesian(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_round_trip_at_poles_and_antimeridian() {
        for &(lat, lon) in &[
            (90.0, 0.0),
            (-90.0, 45.0),
            (0.0, 180.0),
            (0.0, -180.0),
            (33.3, 179.9999999),
            (-12.0, 359.9999999),
            (89.9999, 10.0),
        ] {
            let original = GeoPoint::new(lat, lon).unwrap();
            let back = to_geographic(&original.to_cartesian());
            assert!(original.approx_eq(&back, 1e-6), "{original} vs {back}");
        }
    }

    #[test]
    fn test_distance_identity_and_symmetry() {
        assert_eq!(sphere_distance(12.3, 45.6, 12.3, 45.6), 0.0);
        assert_eq!(
            sphere_distance(10.0, 20.0, -35.0, 300.0),
            sphere_distance(-35.0, 300.0, 10.0, 20.0)
        );
    }

    #[test]
    fn test_distance_known_values() {
        // quarter of a great circle
        let quarter = sphere_distance(0.0, 0.0, 0.0, 90.0);
        assert!((quarter - EARTH_RADIUS_KM * std::f64::consts::FRAC_PI_2).abs() < 1e-9);

        // antipodes
        let half = sphere_distance(0.0, 0.0, 0.0, 180.0);
        assert!((half - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-9);

        // longitude wrap: 359 and 1 are two degrees apart
        let wrap = sphere_distance(0.0, 359.0, 0.0, 1.0);
        assert!((wrap - EARTH_RADIUS_KM * 2f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_distance_stable_for_tiny_separations() {
        // ~1 cm apart
        let d = sphere_distance(45.0, 10.0, 45.0 + 1e-7, 10.0);
        let expected = EARTH_RADIUS_KM * 1e-7f64.to_radians();
        assert!((d - expected).abs() / expected < 1e-6);
    }

    #[test]
    fn test_chord_arc_conversions() {
        let r = EARTH_RADIUS_KM;
        for &arc in &[0.0, 1.0, 500.0, 5000.0, 15000.0] {
            let chord = arc_to_chord(arc, r);
            assert!(chord <= arc + 1e-9);
            assert!((chord_to_arc(chord, r) - arc).abs() < 1e-6);
        }
        assert!((arc_to_chord(1e9, r) - 2.0 * r).abs() < 1e-9);
    }
}
