/// Scale used when comparing coordinates by value.
pub const MICRO_DEGREES_PER_DEGREE: f64 = 1_000_000.0;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Coordinates normalized to integer micro-degrees.
    pub fn fixed(&self) -> FixedGeoPoint {
        FixedGeoPoint {
            lat_ude: to_micro_degrees(self.lat),
            lng_ude: to_micro_degrees(self.lng),
        }
    }
}

/// Coordinates in integer micro-degrees, usable as an `Eq`/`Hash` key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedGeoPoint {
    pub lat_ude: i64,
    pub lng_ude: i64,
}

pub fn to_micro_degrees(deg: f64) -> i64 {
    if !deg.is_finite() {
        return 0;
    }
    (deg * MICRO_DEGREES_PER_DEGREE).round() as i64
}

/// Central angle between two points (radians), haversine form.
pub fn central_angle_rad(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng * 0.5).sin().powi(2);
    2.0 * h.sqrt().clamp(0.0, 1.0).asin()
}
