//! Geographic coordinates.

use serde::{Deserialize, Serialize};

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Build a point, rejecting coordinates that cannot be mapped.
    ///
    /// The polling backend stores `0.0` for unknown coordinates, so a zero
    /// latitude or longitude counts as "no location", as do non-finite or
    /// out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if lat == 0.0 || lon == 0.0 {
            return None;
        }
        if lat.abs() > 90.0 || lon.abs() > 180.0 {
            return None;
        }
        Some(Self { lat, lon })
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        let p = GeoPoint::new(34.05, -118.25).unwrap();
        assert_eq!(p.lat, 34.05);
        assert_eq!(p.lon, -118.25);
    }

    #[test]
    fn test_rejects_unmappable() {
        assert!(GeoPoint::new(0.0, -118.25).is_none());
        assert!(GeoPoint::new(34.05, 0.0).is_none());
        assert!(GeoPoint::new(91.0, 10.0).is_none());
        assert!(GeoPoint::new(10.0, -181.0).is_none());
        assert!(GeoPoint::new(f64::NAN, 10.0).is_none());
    }
}
