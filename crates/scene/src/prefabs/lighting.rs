use foundation::math::Vec3;

use crate::components::{Color, Drawable3D, Transform};
use crate::object::{ObjectId, SceneObject};
use crate::store::SceneGraph;

/// Light intensities for the base lighting rig.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightingRig {
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    pub directional_position: Vec3,
}

impl Default for LightingRig {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.75,
            directional_intensity: 0.25,
            directional_position: Vec3::new(0.0, 10.0, 50.0),
        }
    }
}

/// Adds an ambient fill light and one directional light as persistent objects.
pub fn spawn_lighting(scene: &mut SceneGraph, rig: &LightingRig) -> [ObjectId; 2] {
    let ambient = scene.add_persistent(SceneObject::new(
        "ambient-light",
        Drawable3D::AmbientLight {
            color: Color::WHITE,
            intensity: rig.ambient_intensity,
        },
        Transform::identity(),
    ));
    let directional = scene.add_persistent(SceneObject::new(
        "directional-light",
        Drawable3D::DirectionalLight {
            color: Color::WHITE,
            intensity: rig.directional_intensity,
            position: rig.directional_position,
        },
        Transform::translate(rig.directional_position),
    ));
    [ambient, directional]
}
