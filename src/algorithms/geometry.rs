//! Geometry helpers
//!
//! Compass bearing from the depot (the sweep ordering key), great-circle
//! distance and the formatting of fractional hours for responses.

use serde::{Deserialize, Serialize};

/// A point on the map in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Key with 6 decimals in (lon, lat) order, the precision at which travel
    /// estimates are memoized.
    pub fn key(&self) -> String {
        format!("{:.6},{:.6}", self.longitude, self.latitude)
    }
}

/// Key of an ordered origin -> destination pair
pub fn pair_key(origin: Coordinate, destination: Coordinate) -> String {
    format!("{}:{}", origin.key(), destination.key())
}

/// Initial great-circle bearing (forward azimuth) from `depot` to `target`,
/// in degrees within [0, 360).
pub fn bearing(depot: Coordinate, target: Coordinate) -> f64 {
    let lat1 = depot.latitude.to_radians();
    let lat2 = target.latitude.to_radians();
    let delta_lon = (target.longitude - depot.longitude).to_radians();

    let x = delta_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    // Adding before the modulo keeps tiny negative angles from landing on 360.
    (x.atan2(y).to_degrees() + 360.0) % 360.0
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Render fractional hours as `"{h}h {m}m"`
pub fn format_hours(hours: f64) -> String {
    let total_minutes = (hours.max(0.0) * 60.0).round() as i64;
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}
