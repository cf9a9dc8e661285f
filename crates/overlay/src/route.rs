use foundation::GeoPoint;
use foundation::math::Vec3;
use scene::SceneObject;
use scene::components::{Animation, Color, Drawable3D, Material, Tag, Transform};
use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::transform::{Anchor, project_point};

pub const DEPARTURE_COLOR: Color = Color(0x00ff00);
pub const ARRIVAL_COLOR: Color = Color(0xff0000);
pub const ROUTE_LINE_COLOR: Color = Color(0x0088ff);

/// Height of the marker centers above the route line. Keeps the markers and
/// the line out of each other's depth range and clear of the host's ground.
pub const MARKER_LIFT_M: f64 = 50.0;
/// Marker box extents (width, height, depth).
pub const MARKER_SIZE_M: (f64, f64, f64) = (20.0, 40.0, 20.0);
pub const MARKER_OPACITY: f32 = 0.8;
pub const ROUTE_LINE_OPACITY: f32 = 0.8;

/// 0.01 rad per frame at 60 fps.
pub const MARKER_SPIN_RAD_PER_S: f64 = 0.6;
pub const MARKER_BOB_AMPLITUDE_M: f64 = 0.5;
/// One bob cycle every pi seconds.
pub const MARKER_BOB_FREQUENCY_HZ: f64 = 1.0 / std::f64::consts::PI;

pub const DEPARTURE_MARKER: &str = "departure-marker";
pub const ARRIVAL_MARKER: &str = "arrival-marker";
pub const ROUTE_LINE: &str = "route-line";

/// Ordered route points; index order is travel order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePath(Vec<GeoPoint>);

impl RoutePath {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<GeoPoint> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.0.last().copied()
    }

    /// Fewer than two points draw nothing.
    pub fn is_drawable(&self) -> bool {
        self.0.len() >= 2
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        match self.0.iter().position(|p| !p.is_valid()) {
            Some(index) => Err(RouteError::InvalidPoint { index }),
            None => Ok(()),
        }
    }
}

impl From<Vec<GeoPoint>> for RoutePath {
    fn from(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }
}

impl FromIterator<GeoPoint> for RoutePath {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn marker(name: &'static str, color: Color, position: Vec3) -> SceneObject {
    let (w, h, d) = MARKER_SIZE_M;
    let material = Material::opaque(color)
        .with_opacity(MARKER_OPACITY)
        .double_sided();
    SceneObject::new(
        name,
        Drawable3D::cuboid(w, h, d, material),
        Transform::translate(position),
    )
    .tagged(Tag::ROUTE)
    .with_animation(Animation::new(
        MARKER_SPIN_RAD_PER_S,
        MARKER_BOB_AMPLITUDE_M,
        MARKER_BOB_FREQUENCY_HZ,
    ))
}

/// Route-tagged objects for `path` in the frame of `anchor`: departure
/// marker, arrival marker, then the line through every point.
///
/// Paths with fewer than two points produce nothing.
pub fn build_route_objects(path: &RoutePath, anchor: &Anchor) -> Vec<SceneObject> {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return Vec::new();
    };
    if !path.is_drawable() {
        return Vec::new();
    }

    let lift = Vec3::new(0.0, MARKER_LIFT_M, 0.0);
    let departure = marker(
        DEPARTURE_MARKER,
        DEPARTURE_COLOR,
        project_point(first, anchor) + lift,
    );
    let arrival = marker(
        ARRIVAL_MARKER,
        ARRIVAL_COLOR,
        project_point(last, anchor) + lift,
    );

    let vertices: Vec<Vec3> = path
        .points()
        .iter()
        .map(|p| project_point(*p, anchor))
        .collect();
    let line = SceneObject::new(
        ROUTE_LINE,
        Drawable3D::line(
            vertices,
            Material::opaque(ROUTE_LINE_COLOR).with_opacity(ROUTE_LINE_OPACITY),
        ),
        Transform::identity(),
    )
    .tagged(Tag::ROUTE);

    vec![departure, arrival, line]
}

#[cfg(test)]
mod tests {
    use super::{
        ARRIVAL_COLOR, ARRIVAL_MARKER, DEPARTURE_COLOR, DEPARTURE_MARKER, MARKER_LIFT_M,
        ROUTE_LINE, RoutePath, build_route_objects,
    };
    use crate::error::RouteError;
    use crate::transform::{Anchor, project_point};
    use foundation::GeoPoint;
    use scene::components::{Drawable3D, Tag};

    fn hong_kong() -> RoutePath {
        RoutePath::new(vec![
            GeoPoint::lat_lng(22.3035, 114.1599),
            GeoPoint::lat_lng(22.3050, 114.1620),
        ])
    }

    #[test]
    fn short_paths_build_nothing() {
        let anchor = Anchor::new(GeoPoint::lat_lng(22.3035, 114.1599));
        assert!(build_route_objects(&RoutePath::default(), &anchor).is_empty());
        let single = RoutePath::new(vec![GeoPoint::lat_lng(22.3035, 114.1599)]);
        assert!(build_route_objects(&single, &anchor).is_empty());
    }

    #[test]
    fn two_markers_and_a_line() {
        let path = hong_kong();
        let anchor = Anchor::new(path.first().unwrap());
        let objects = build_route_objects(&path, &anchor);

        let names: Vec<_> = objects.iter().map(|o| o.name).collect();
        assert_eq!(names, vec![DEPARTURE_MARKER, ARRIVAL_MARKER, ROUTE_LINE]);
        assert!(objects.iter().all(|o| o.tag == Tag::ROUTE));

        let colors: Vec<_> = objects[..2]
            .iter()
            .map(|o| o.drawable.material().unwrap().color)
            .collect();
        assert_eq!(colors, vec![DEPARTURE_COLOR, ARRIVAL_COLOR]);
    }

    #[test]
    fn line_passes_through_every_point_in_order() {
        let path = RoutePath::new(vec![
            GeoPoint::lat_lng(22.3035, 114.1599),
            GeoPoint::lat_lng(22.3041, 114.1630),
            GeoPoint::lat_lng(22.3038, 114.1601),
            GeoPoint::lat_lng(22.3050, 114.1620),
        ]);
        let anchor = Anchor::new(GeoPoint::lat_lng(22.3, 114.16));
        let objects = build_route_objects(&path, &anchor);

        let Drawable3D::Line { vertices, .. } = &objects[2].drawable else {
            panic!("expected a line");
        };
        let expected: Vec<_> = path
            .points()
            .iter()
            .map(|p| project_point(*p, &anchor))
            .collect();
        assert_eq!(vertices, &expected);
    }

    #[test]
    fn markers_float_a_fixed_height_above_the_line_ends() {
        let path = hong_kong();
        let anchor = Anchor::new(path.first().unwrap());
        let objects = build_route_objects(&path, &anchor);
        let Drawable3D::Line { vertices, .. } = &objects[2].drawable else {
            panic!("expected a line");
        };

        let departure = objects[0].base_position();
        let arrival = objects[1].base_position();
        assert!((departure.y - vertices[0].y - MARKER_LIFT_M).abs() < 1e-9);
        assert!((arrival.y - vertices[1].y - MARKER_LIFT_M).abs() < 1e-9);
        assert_eq!((arrival.x, arrival.z), (vertices[1].x, vertices[1].z));
    }

    #[test]
    fn validation_reports_first_bad_point() {
        let path = RoutePath::new(vec![
            GeoPoint::lat_lng(22.3, 114.1),
            GeoPoint::lat_lng(f64::NAN, 114.1),
        ]);
        assert_eq!(path.validate(), Err(RouteError::InvalidPoint { index: 1 }));
        assert_eq!(hong_kong().validate(), Ok(()));
    }

    #[test]
    fn deserializes_from_a_plain_array() {
        let path: RoutePath = serde_json::from_str(
            r#"[{"latitude": 22.3035, "longitude": 114.1599}, {"latitude": 22.305, "longitude": 114.162, "altitude": 3.0}]"#,
        )
        .unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.last().unwrap().altitude, 3.0);
    }
}
