//! Great-circle geometry on the station/radar coordinate space.

/// Mean Earth radius, km.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Two points closer than this are treated as coincident, km (10 m).
pub const COINCIDENT_KM: f64 = 0.01;

/// Haversine distance between two (lat, lon) pairs in decimal degrees,
/// returned in km.
///
/// Keeps the `atan2(sqrt(a), sqrt(1 - a))` form, which stays stable for
/// near-antipodal points where the naive `asin` form loses precision.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_same_point() {
        assert!(haversine_km(39.47, -0.38, 39.47, -0.38).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance_valencia_castellon() {
        // Valencia (39.470, -0.377) to Castellon (39.986, -0.037),
        // roughly 64 km apart.
        let d = haversine_km(39.470, -0.377, 39.986, -0.037);
        assert!((d - 64.0).abs() < 2.0, "got {} km", d);
    }

    #[test]
    fn test_one_degree_latitude_is_about_111_km() {
        let d = haversine_km(40.0, -0.5, 41.0, -0.5);
        assert!((d - 111.2).abs() < 0.5, "got {} km", d);
    }

    #[test]
    fn test_symmetry() {
        let forward = haversine_km(39.5, -0.4, 40.1, -0.9);
        let backward = haversine_km(40.1, -0.9, 39.5, -0.4);
        assert!((forward - backward).abs() < 1e-12);
    }
}
