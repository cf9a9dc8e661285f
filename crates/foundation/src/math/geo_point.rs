use serde::{Deserialize, Serialize};

use super::Geodetic;

/// A geographic position: degrees latitude/longitude, meters altitude.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Ground-level point.
    pub fn lat_lng(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, 0.0)
    }

    pub fn with_altitude(self, altitude: f64) -> Self {
        Self { altitude, ..self }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Same horizontal position, altitude ignored.
    pub fn same_location(&self, other: &GeoPoint) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }

    pub fn to_geodetic(self) -> Geodetic {
        Geodetic::from_degrees(self.latitude, self.longitude, self.altitude)
    }
}

#[cfg(test)]
mod tests {
    use super::GeoPoint;

    #[test]
    fn altitude_defaults_to_ground_when_missing() {
        let p: GeoPoint = serde_json::from_str(r#"{"latitude": 22.3, "longitude": 114.1}"#).unwrap();
        assert_eq!(p, GeoPoint::lat_lng(22.3, 114.1));
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(GeoPoint::lat_lng(45.0, 200.0).is_valid());
        assert!(!GeoPoint::lat_lng(95.0, 0.0).is_valid());
        assert!(!GeoPoint::lat_lng(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn same_location_ignores_altitude() {
        let a = GeoPoint::new(1.0, 2.0, 0.0);
        assert!(a.same_location(&a.with_altitude(100.0)));
        assert!(!a.same_location(&GeoPoint::new(1.0, 2.5, 0.0)));
    }
}
