use foundation::GeoPoint;
use foundation::math::{EnuFrame, Vec3};
use gpu::CameraState;

use crate::host::CoordinateTransformer;

/// Origin of the overlay's local frame.
///
/// Local axes are Y-up: `x` east, `y` up, `z` south (negated north), in
/// meters on the WGS84 tangent plane at the anchor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Anchor {
    point: GeoPoint,
    frame: EnuFrame,
}

impl Anchor {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            point,
            frame: EnuFrame::new(point.to_geodetic()),
        }
    }

    pub fn point(&self) -> GeoPoint {
        self.point
    }

    pub fn project(&self, point: GeoPoint) -> Vec3 {
        let enu = self.frame.geodetic_to_enu(point.to_geodetic());
        Vec3::new(enu.east, enu.up, -enu.north)
    }
}

/// Local position of `point` relative to `anchor`. Pure and continuous in
/// `point`.
pub fn project_point(point: GeoPoint, anchor: &Anchor) -> Vec3 {
    anchor.project(point)
}

/// Camera for this frame, from the host transform evaluated at `center`
/// raised to `altitude`. `None` when the host has nothing for this frame; the
/// caller must then skip the frame rather than fall back to identity.
pub fn projection_matrix_for(
    transformer: &dyn CoordinateTransformer,
    center: GeoPoint,
    altitude: f64,
) -> Option<CameraState> {
    let matrix = transformer.from_lat_lng_altitude(center.with_altitude(altitude))?;
    CameraState::from_host_matrix(matrix)
}

#[cfg(test)]
mod tests {
    use super::{Anchor, project_point, projection_matrix_for};
    use crate::host::CoordinateTransformer;
    use foundation::GeoPoint;
    use foundation::math::{Mat4, Vec3};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn anchor_projects_to_origin() {
        let anchor = Anchor::new(GeoPoint::new(22.3035, 114.1599, 100.0));
        let p = project_point(anchor.point(), &anchor);
        assert!(p.length() < 1e-6);
    }

    #[test]
    fn axes_are_y_up_east_x_north_minus_z() {
        let anchor = Anchor::new(GeoPoint::lat_lng(22.3035, 114.1599));
        let north = project_point(GeoPoint::lat_lng(22.3045, 114.1599), &anchor);
        let east = project_point(GeoPoint::lat_lng(22.3035, 114.1609), &anchor);
        let up = project_point(GeoPoint::new(22.3035, 114.1599, 25.0), &anchor);

        // 0.001 deg of latitude is ~110.7 m here.
        assert_close(north.z, -110.7, 0.5);
        assert_close(north.x, 0.0, 1e-6);
        assert!(east.x > 100.0 && east.z.abs() < 0.01);
        assert_close(up.y, 25.0, 1e-6);
    }

    #[test]
    fn projection_is_continuous() {
        let anchor = Anchor::new(GeoPoint::lat_lng(22.3035, 114.1599));
        let base = GeoPoint::lat_lng(22.3050, 114.1620);
        let a = project_point(base, &anchor);
        for eps in [1e-4, 1e-6, 1e-8] {
            let b = project_point(GeoPoint::lat_lng(base.latitude + eps, base.longitude + eps), &anchor);
            // One degree is at most ~111.7 km on either axis.
            let bound = 2.0 * 111_700.0 * eps;
            assert!(a.distance(b) <= bound, "jump of {} for eps {eps}", a.distance(b));
        }
    }

    struct Fixed(Option<Mat4>);

    impl CoordinateTransformer for Fixed {
        fn from_lat_lng_altitude(&self, _point: GeoPoint) -> Option<Mat4> {
            self.0
        }
    }

    #[test]
    fn missing_or_broken_host_transform_yields_no_camera() {
        let center = GeoPoint::lat_lng(1.0, 2.0);
        assert!(projection_matrix_for(&Fixed(None), center, 100.0).is_none());

        let mut nan = Mat4::IDENTITY;
        nan.cols[3] = f64::NAN;
        assert!(projection_matrix_for(&Fixed(Some(nan)), center, 100.0).is_none());

        let m = Mat4::translation(Vec3::new(0.0, 0.0, -5.0));
        let camera = projection_matrix_for(&Fixed(Some(m)), center, 100.0).expect("camera");
        assert_eq!(camera.view_projection, m);
    }
}
