//! Great-circle geometry on a spherical Earth.
//!
//! This module provides:
//! - Haversine distance in kilometres
//! - The unit-vector embedding used by the R-tree backend
//! - Conversion from great-circle distance to chord length
//! - Coordinate validation and an axis-aligned bounding box
//!
//! # Embedding
//!
//! Every `(lat, lng)` pair maps to a point on the unit sphere. Straight-line
//! (chord) distance between two embedded points is a strictly increasing
//! function of their great-circle distance, so a Euclidean radius search over
//! the embedding answers a great-circle radius query exactly once the radius
//! is converted to its chord length.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometres.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Embed a coordinate (degrees) as a point on the unit sphere.
#[inline]
pub fn to_unit_vector(lat: f64, lng: f64) -> [f64; 3] {
    let lat_rad = lat.to_radians();
    let lng_rad = lng.to_radians();
    let cos_lat = lat_rad.cos();
    [cos_lat * lng_rad.cos(), cos_lat * lng_rad.sin(), lat_rad.sin()]
}

/// Chord length on the unit sphere subtending a great-circle distance.
///
/// Distances beyond half the circumference clamp to the sphere diameter.
pub fn chord_for_km(distance_km: f64) -> f64 {
    let angle = (distance_km / EARTH_RADIUS_KM).min(std::f64::consts::PI);
    2.0 * (angle / 2.0).sin()
}

/// Convert a step in degrees of arc to kilometres along a great circle.
#[inline]
pub fn degrees_to_km(degrees: f64) -> f64 {
    degrees.to_radians() * EARTH_RADIUS_KM
}

/// Check that a coordinate is finite and inside the valid lat/lng range.
#[inline]
pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BBox {
    /// Create a new bounding box.
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Smallest box enclosing all points, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (lat, lng) = iter.next()?;
        let mut bbox = Self::new(lat, lat, lng, lng);
        for (lat, lng) in iter {
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
            bbox.min_lng = bbox.min_lng.min(lng);
            bbox.max_lng = bbox.max_lng.max(lng);
        }
        Some(bbox)
    }

    /// Latitude extent in degrees.
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Longitude extent in degrees.
    pub fn lng_span(&self) -> f64 {
        self.max_lng - self.min_lng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_paris_london() {
        let paris = (48.8566, 2.3522);
        let london = (51.5074, -0.1278);

        let distance = haversine_km(paris.0, paris.1, london.0, london.1);

        // ~343.5 km
        assert!((distance - 343.5).abs() < 5.0);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn test_unit_vector_is_unit_length() {
        for (lat, lng) in [(0.0, 0.0), (45.0, 90.0), (-89.9, -179.0), (7.87, 80.77)] {
            let v = to_unit_vector(lat, lng);
            let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_chord_matches_embedded_distance() {
        let (a, b) = ((10.0, 20.0), (10.5, 21.0));
        let va = to_unit_vector(a.0, a.1);
        let vb = to_unit_vector(b.0, b.1);
        let chord = ((va[0] - vb[0]).powi(2) + (va[1] - vb[1]).powi(2) + (va[2] - vb[2]).powi(2)).sqrt();

        let km = haversine_km(a.0, a.1, b.0, b.1);
        assert!((chord_for_km(km) - chord).abs() < 1e-9);
    }

    #[test]
    fn test_chord_clamps_past_antipode() {
        assert!((chord_for_km(1.0e9) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(is_valid_coordinate(90.0, -180.0));
        assert!(!is_valid_coordinate(90.5, 0.0));
        assert!(!is_valid_coordinate(0.0, 181.0));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
        assert!(!is_valid_coordinate(0.0, f64::INFINITY));
    }

    #[test]
    fn test_bbox_from_points() {
        let bbox = BBox::from_points([(1.0, 5.0), (-2.0, 7.0), (3.0, 6.0)]).unwrap();
        assert_eq!(bbox, BBox::new(-2.0, 3.0, 5.0, 7.0));
        assert_eq!(bbox.lat_span(), 5.0);
        assert_eq!(bbox.lng_span(), 2.0);
        assert!(BBox::from_points(std::iter::empty()).is_none());
    }
}
