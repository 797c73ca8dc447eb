//! Great-circle distance on the sphere.
//!
//! The one geographic primitive route statistics and the map projector
//! need: the spherical law of cosines over WGS84-ish degrees.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres, as used by the statistics engine.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A geographic point in degrees.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "latitude")]
    pub lat: f64,
    #[serde(rename = "longitude")]
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other`, in metres, via the spherical law
    /// of cosines. Returns `0.0` for coincident points rather than `NaN`
    /// (the naive formula's `acos(1.0)` is exact but numerically fragile
    /// right at the boundary).
    pub fn great_circle_distance(&self, other: &Coordinate) -> f64 {
        if self.lat == other.lat && self.lon == other.lon {
            return 0.0;
        }
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let cos_angle = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * delta_lon.cos();
        // Clamp against rounding pushing the argument fractionally outside [-1, 1].
        cos_angle.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_METERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let a = Coordinate::new(55.611_087, 37.20829);
        assert_eq!(a.great_circle_distance(&a), 0.0);
    }

    #[test]
    fn moscow_to_spb_is_roughly_right() {
        let moscow = Coordinate::new(55.755_826, 37.617_300);
        let spb = Coordinate::new(59.934_280, 30.335_099);
        let d = moscow.great_circle_distance(&spb);
        // ~635 km great-circle distance between the two cities.
        assert!((600_000.0..=670_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn symmetric() {
        let a = Coordinate::new(10.0, 20.0);
        let b = Coordinate::new(-5.0, 40.0);
        assert!((a.great_circle_distance(&b) - b.great_circle_distance(&a)).abs() < 1e-6);
    }
}
