use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Conservative city driving speed used for every pickup leg.
pub const CITY_SPEED_KMH: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// A zero or non-finite component means the address was never geocoded.
    pub fn is_known(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && self.lat != 0.0 && self.lng != 0.0
    }
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Great-circle distance, or 0 when either side has no usable coordinates.
pub fn distance_km(a: Option<&GeoPoint>, b: Option<&GeoPoint>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a.is_known() && b.is_known() => haversine_km(a, b),
        _ => 0.0,
    }
}

pub fn drive_minutes(a: Option<&GeoPoint>, b: Option<&GeoPoint>) -> i64 {
    let km = distance_km(a, b);
    (km / CITY_SPEED_KMH * 60.0).ceil() as i64
}
