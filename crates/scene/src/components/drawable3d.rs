use foundation::math::Vec3;

use super::{Color, Material};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoxGeometry {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

/// What a scene object is. Lights have no GPU-side buffers; meshes and lines
/// own one geometry buffer and one material each.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable3D {
    AmbientLight {
        color: Color,
        intensity: f32,
    },
    DirectionalLight {
        color: Color,
        intensity: f32,
        position: Vec3,
    },
    Mesh {
        geometry: BoxGeometry,
        material: Material,
    },
    Line {
        vertices: Vec<Vec3>,
        material: Material,
    },
}

impl Drawable3D {
    pub fn cuboid(width: f64, height: f64, depth: f64, material: Material) -> Self {
        Self::Mesh {
            geometry: BoxGeometry {
                width,
                height,
                depth,
            },
            material,
        }
    }

    pub fn line(vertices: Vec<Vec3>, material: Material) -> Self {
        Self::Line { vertices, material }
    }

    pub fn material(&self) -> Option<&Material> {
        match self {
            Self::Mesh { material, .. } | Self::Line { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn uses_gpu_resources(&self) -> bool {
        matches!(self, Self::Mesh { .. } | Self::Line { .. })
    }

    pub fn is_light(&self) -> bool {
        !self.uses_gpu_resources()
    }
}
