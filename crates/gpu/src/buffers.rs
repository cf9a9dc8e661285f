use bytemuck::{Pod, Zeroable};
use foundation::math::Vec3;
use scene::components::{BoxGeometry, Drawable3D};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Vertex and index data ready for upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn byte_len(&self) -> usize {
        self.vertex_bytes().len() + self.index_bytes().len()
    }
}

/// Packs the geometry of a drawable. Lights have none.
pub fn pack_drawable(drawable: &Drawable3D) -> Option<MeshData> {
    match drawable {
        Drawable3D::Mesh { geometry, .. } => Some(pack_box(geometry)),
        Drawable3D::Line { vertices, .. } => Some(pack_line(vertices)),
        _ => None,
    }
}

/// Centered box, 4 vertices per face so each face keeps a flat normal.
pub fn pack_box(geometry: &BoxGeometry) -> MeshData {
    let (hx, hy, hz) = (
        (geometry.width / 2.0) as f32,
        (geometry.height / 2.0) as f32,
        (geometry.depth / 2.0) as f32,
    );
    // (normal, u axis, v axis) per face.
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let half = [hx, hy, hz];
    let mut mesh = MeshData::default();
    for (normal, u, v) in faces {
        let base = mesh.vertices.len() as u16;
        for (su, sv) in [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let mut position = [0.0f32; 3];
            for axis in 0..3 {
                position[axis] = (normal[axis] + su * u[axis] + sv * v[axis]) * half[axis];
            }
            mesh.vertices.push(Vertex { position, normal });
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Line strip through every vertex, in order.
pub fn pack_line(points: &[Vec3]) -> MeshData {
    MeshData {
        vertices: points
            .iter()
            .map(|p| Vertex {
                position: p.to_f32(),
                normal: [0.0, 1.0, 0.0],
            })
            .collect(),
        indices: Vec::new(),
    }
}
