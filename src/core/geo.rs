//! Great-circle distance on a spherical Earth

use serde::{Deserialize, Serialize};

/// Earth radius used by the haversine formula, in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Haversine distance to another point in meters
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance(self, other)
    }
}

/// Haversine distance between two points in meters.
///
/// The haversine term is clamped to `[0, 1]` so rounding near antipodal
/// points never feeds `asin` a value above one.
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        for p in [pt(0.0, 0.0), pt(52.2855, -1.5373), pt(-89.9, 179.9), pt(90.0, 0.0)] {
            assert_eq!(distance(&p, &p), 0.0);
        }
    }

    #[test]
    fn test_distance_symmetry() {
        let a = pt(52.2855, -1.5373);
        let b = pt(48.2082, 16.3738);
        assert!((distance(&a, &b) - distance(&b, &a)).abs() < 1e-6);
    }

    #[test]
    fn test_distance_leamington_fixture() {
        let d = distance(&pt(52.2855, -1.5373), &pt(52.2800, -1.5400));
        assert!(d > 10.0 && d < 1000.0, "Expected a few hundred meters, got {d:.1} m");
        assert!((d - 638.5).abs() < 5.0, "Expected ~638 m, got {d:.1} m");
    }

    #[test]
    fn test_distance_one_degree_longitude_at_equator() {
        let d = distance(&pt(0.0, 0.0), &pt(0.0, 1.0));
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-3, "got {d}");
    }

    #[test]
    fn test_distance_antipodal() {
        let half_circumference = EARTH_RADIUS_M * std::f64::consts::PI;
        let d = distance(&pt(0.0, 0.0), &pt(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - half_circumference).abs() < 1.0, "got {d}");

        let d = distance(&pt(45.0, 30.0), &pt(-45.0, -150.0));
        assert!((d - half_circumference).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_distance_to_matches_free_function() {
        let a = pt(52.2855, -1.5373);
        let b = pt(52.2800, -1.5400);
        assert_eq!(a.distance_to(&b), distance(&a, &b));
    }
}
