//! Coordinate types and great-circle distance.

use serde::{Deserialize, Serialize};

/// A WGS84 point in floating-point degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two points given in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(haversine_km(12.9716, 77.5946, 12.9716, 77.5946), 0.0);
    }

    #[test]
    fn known_city_pair_distance() {
        // Bengaluru -> Chennai, roughly 290 km
        let d = haversine_km(12.9716, 77.5946, 13.0827, 80.2707);
        assert!((d - 290.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn symmetric() {
        let ab = haversine_km(12.9716, 77.5946, 19.0760, 72.8777);
        let ba = haversine_km(19.0760, 72.8777, 12.9716, 77.5946);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn antimeridian_crossing_is_short() {
        // 2 degrees of longitude apart across the date line, on the equator
        let d = haversine_km(0.0, 179.0, 0.0, -179.0);
        assert!(d < 250.0, "got {}", d);
    }
}
