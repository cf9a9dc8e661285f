use super::{Ecef, Geodetic, geodetic_to_ecef};

/// Local East-North-Up coordinates (meters).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Enu {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl Enu {
    pub fn new(east: f64, north: f64, up: f64) -> Self {
        Self { east, north, up }
    }
}

/// A tangent-plane frame rooted at a geodetic origin.
///
/// The origin's ECEF position and the rotation terms are computed once, so
/// converting many points against the same origin stays cheap.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EnuFrame {
    origin: Geodetic,
    origin_ecef: Ecef,
    sin_lat: f64,
    cos_lat: f64,
    sin_lon: f64,
    cos_lon: f64,
}

impl EnuFrame {
    pub fn new(origin: Geodetic) -> Self {
        Self {
            origin,
            origin_ecef: geodetic_to_ecef(origin),
            sin_lat: origin.lat_rad.sin(),
            cos_lat: origin.lat_rad.cos(),
            sin_lon: origin.lon_rad.sin(),
            cos_lon: origin.lon_rad.cos(),
        }
    }

    pub fn origin(&self) -> Geodetic {
        self.origin
    }

    pub fn to_enu(&self, point: Ecef) -> Enu {
        let dx = point.x - self.origin_ecef.x;
        let dy = point.y - self.origin_ecef.y;
        let dz = point.z - self.origin_ecef.z;

        Enu::new(
            -self.sin_lon * dx + self.cos_lon * dy,
            -self.sin_lat * self.cos_lon * dx - self.sin_lat * self.sin_lon * dy + self.cos_lat * dz,
            self.cos_lat * self.cos_lon * dx + self.cos_lat * self.sin_lon * dy + self.sin_lat * dz,
        )
    }

    pub fn geodetic_to_enu(&self, point: Geodetic) -> Enu {
        self.to_enu(geodetic_to_ecef(point))
    }
}

#[cfg(test)]
mod tests {
    use super::EnuFrame;
    use crate::math::Geodetic;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_zero() {
        let origin = Geodetic::from_degrees(22.3035, 114.1599, 35.0);
        let enu = EnuFrame::new(origin).geodetic_to_enu(origin);
        assert_close(enu.east, 0.0, 1e-9);
        assert_close(enu.north, 0.0, 1e-9);
        assert_close(enu.up, 0.0, 1e-9);
    }

    #[test]
    fn axes_point_the_right_way() {
        let frame = EnuFrame::new(Geodetic::from_degrees(10.0, 20.0, 0.0));
        let north = frame.geodetic_to_enu(Geodetic::from_degrees(10.001, 20.0, 0.0));
        let east = frame.geodetic_to_enu(Geodetic::from_degrees(10.0, 20.001, 0.0));
        let up = frame.geodetic_to_enu(Geodetic::from_degrees(10.0, 20.0, 10.0));

        assert!(north.north > 100.0 && north.east.abs() < 1e-6);
        assert!(east.east > 100.0 && east.north.abs() < 0.01);
        assert_close(up.up, 10.0, 1e-6);
    }
}
