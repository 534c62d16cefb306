//! Geographic points and great-circle distance.
//!
//! Distances are haversine distances over a spherical Earth, computed with the
//! `geo` crate. The R-tree index works in Euclidean space, so this module also
//! projects coordinates onto a sphere and converts great-circle radii into
//! chord lengths for candidate pre-filtering.

use crate::error::{GeoError, GeoResult};
use ::geo::{Distance, Haversine, Point};
use serde::Serialize;
use std::f64::consts::PI;

/// Mean Earth radius in meters, the same radius `geo`'s haversine uses.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A validated (longitude, latitude) pair in degrees.
///
/// Storage order is longitude first, matching GeoJSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    /// Builds a coordinate pair, rejecting non-finite or out-of-range values.
    pub fn new(longitude: f64, latitude: f64) -> GeoResult<Self> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(GeoError::InvalidArgument(format!(
                "coordinates must be finite, got ({longitude}, {latitude})"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidArgument(format!(
                "longitude {longitude} outside [-180, 180]"
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidArgument(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Re-checks the range invariant. Used where coordinates may have been
    /// built field by field.
    pub fn validate(&self) -> GeoResult<()> {
        Self::new(self.longitude, self.latitude).map(|_| ())
    }

    fn as_point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Returns a copy moved `meters` due north (negative moves south).
    ///
    /// Latitude is clamped to the poles.
    pub fn offset_north(&self, meters: f64) -> Self {
        let latitude = (self.latitude + latitude_offset_degrees(meters)).clamp(-90.0, 90.0);
        Self {
            longitude: self.longitude,
            latitude,
        }
    }

    /// Cartesian point on a sphere of Earth radius, used as the R-tree key.
    pub(crate) fn to_sphere_point(self) -> [f64; 3] {
        let lon = self.longitude.to_radians();
        let lat = self.latitude.to_radians();
        [
            EARTH_RADIUS_METERS * lat.cos() * lon.cos(),
            EARTH_RADIUS_METERS * lat.cos() * lon.sin(),
            EARTH_RADIUS_METERS * lat.sin(),
        ]
    }
}

/// Great-circle distance in meters.
pub fn distance_meters(a: &Coordinates, b: &Coordinates) -> f64 {
    Haversine::distance(a.as_point(), b.as_point())
}

/// True when `b` lies at most `radius_meters` from `a`.
pub fn within_radius(a: &Coordinates, b: &Coordinates, radius_meters: f64) -> bool {
    distance_meters(a, b) <= radius_meters
}

/// Validates a query radius.
pub fn validate_radius(radius_meters: f64) -> GeoResult<()> {
    if !radius_meters.is_finite() || radius_meters < 0.0 {
        return Err(GeoError::InvalidArgument(format!(
            "radius must be a finite, non-negative number of meters, got {radius_meters}"
        )));
    }
    Ok(())
}

/// Latitude delta (degrees) covering `meters` along a meridian.
pub fn latitude_offset_degrees(meters: f64) -> f64 {
    (meters / EARTH_RADIUS_METERS).to_degrees()
}

/// Straight-line distance through the sphere that corresponds to a
/// great-circle distance of `radius_meters`.
///
/// Padded slightly so the R-tree never drops a point the haversine check
/// would accept.
pub(crate) fn chord_radius(radius_meters: f64) -> f64 {
    if radius_meters >= PI * EARTH_RADIUS_METERS {
        return 2.0 * EARTH_RADIUS_METERS + 1.0;
    }
    let chord = 2.0 * EARTH_RADIUS_METERS * (radius_meters / (2.0 * EARTH_RADIUS_METERS)).sin();
    chord * (1.0 + 1e-9) + 1e-3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Coordinates::new(181.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, -90.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
        assert!(Coordinates::new(-180.0, 90.0).is_ok());
    }

    #[test]
    fn test_distance_is_zero_for_same_point() {
        let p = Coordinates::new(12.48, 55.77).unwrap();
        assert_eq!(distance_meters(&p, &p), 0.0);
        assert!(within_radius(&p, &p, 0.0));
    }

    #[test]
    fn test_offset_north_matches_haversine() {
        let origin = Coordinates::new(12.48, 55.77).unwrap();
        for meters in [1.0, 10.0, 99.0, 100.5, 2_500.0] {
            let moved = origin.offset_north(meters);
            let measured = distance_meters(&origin, &moved);
            assert!(
                (measured - meters).abs() < 1e-3,
                "expected {meters}m, measured {measured}m"
            );
        }
    }

    #[test]
    fn test_chord_never_shorter_than_needed() {
        let origin = Coordinates::new(12.48, 55.77).unwrap();
        let moved = origin.offset_north(100.0);

        let a = origin.to_sphere_point();
        let b = moved.to_sphere_point();
        let straight = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt();

        assert!(straight <= chord_radius(100.0));
        assert!(straight > chord_radius(99.0));
    }

    #[test]
    fn test_validate_radius() {
        assert!(validate_radius(0.0).is_ok());
        assert!(validate_radius(100.0).is_ok());
        assert!(validate_radius(-1.0).is_err());
        assert!(validate_radius(f64::NAN).is_err());
    }
}
