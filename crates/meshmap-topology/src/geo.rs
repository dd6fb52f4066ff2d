//! Great-circle distance and bearing between node coordinates.

use meshmap_model::{Edge, GeoPoint, MILES_PER_KM};

/// Mean Earth radius used by the polling backend.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the distance between two points using the haversine formula.
///
/// Returns kilometers.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Initial bearing from `from` towards `to`, in degrees clockwise from north
/// (0..360), rounded to one decimal place.
pub fn initial_bearing(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();
    let bearing = (y.atan2(x).to_degrees().rem_euclid(360.0) * 10.0).round() / 10.0;
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Fill in distance and bearing for an RF edge whose link record did not
/// carry them. Edges with a known distance, or without a located
/// destination, are left untouched.
///
/// Returns `true` if the edge was changed.
pub fn backfill_distance(edge: &mut Edge) -> bool {
    if !edge.link_type.is_rf() || edge.metrics.distance_km.is_some() {
        return false;
    }
    let Some(to) = edge.to else {
        return false;
    };
    let km = haversine_km(edge.from, to);
    edge.metrics.distance_km = Some(km);
    edge.metrics.distance_miles = Some(km * MILES_PER_KM);
    if edge.metrics.bearing.is_none() {
        edge.metrics.bearing = Some(initial_bearing(edge.from, to));
    }
    true
}
