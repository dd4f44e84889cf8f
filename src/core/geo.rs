//! Geographic primitives and great-circle distance.

use serde::{Deserialize, Serialize};

use super::error::GeoError;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize, Deserialize)]
struct RawPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if lat_ok && lon_ok {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

/// Alert radius in meters. Fixed for the lifetime of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ProximityThreshold(f64);

impl ProximityThreshold {
    pub fn new(meters: f64) -> Result<Self, GeoError> {
        if meters.is_finite() && meters >= 0.0 {
            Ok(Self(meters))
        } else {
            Err(GeoError::InvalidThreshold(meters))
        }
    }

    pub fn meters(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for ProximityThreshold {
    type Error = GeoError;

    fn try_from(meters: f64) -> Result<Self, Self::Error> {
        Self::new(meters)
    }
}

impl From<ProximityThreshold> for f64 {
    fn from(threshold: ProximityThreshold) -> Self {
        threshold.0
    }
}

/// Great-circle distance between two points in meters (haversine).
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] near antipodes.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_identical_points_are_zero() {
        for p in [point(0.0, 0.0), point(12.9716, 77.5946), point(-89.9, 179.9)] {
            assert_eq!(distance_meters(&p, &p), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = point(19.0760, 72.8777);
        let b = point(28.7041, 77.1025);
        assert_eq!(distance_meters(&a, &b), distance_meters(&b, &a));
    }

    #[test]
    fn test_one_kilometer_along_meridian() {
        // 1 km of arc is 1000 / R radians of latitude.
        let delta_deg = (1000.0 / EARTH_RADIUS_METERS).to_degrees();
        let a = point(45.0, 10.0);
        let b = point(45.0 + delta_deg, 10.0);
        let d = distance_meters(&a, &b);
        assert!((d - 1000.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_antipodal_points() {
        let a = point(0.0, 0.0);
        let b = point(0.0, 180.0);
        let d = distance_meters(&a, &b);
        assert!((d - PI * EARTH_RADIUS_METERS).abs() < 1.0, "got {d}");
        assert!(!d.is_nan());

        let north = point(90.0, 0.0);
        let south = point(-90.0, 0.0);
        assert!((distance_meters(&north, &south) - PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        assert!(matches!(
            GeoPoint::new(90.5, 0.0),
            Err(GeoError::InvalidCoordinate { .. })
        ));
        assert!(GeoPoint::new(0.0, -180.1).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_threshold_validation() {
        assert!(ProximityThreshold::new(0.0).is_ok());
        assert_eq!(ProximityThreshold::new(300.0).unwrap().meters(), 300.0);
        assert_eq!(
            ProximityThreshold::new(-1.0),
            Err(GeoError::InvalidThreshold(-1.0))
        );
        assert!(ProximityThreshold::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_point_deserialization_validates() {
        let ok: GeoPoint = serde_json::from_str(r#"{"latitude":12.5,"longitude":77.1}"#).unwrap();
        assert_eq!(ok.latitude(), 12.5);
        let bad = serde_json::from_str::<GeoPoint>(r#"{"latitude":120.0,"longitude":0.0}"#);
        assert!(bad.is_err());
    }
}
