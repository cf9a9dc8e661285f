use super::Vec3;

/// 4x4 matrix stored column-major, the layout map hosts and GPU APIs share.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub cols: [f64; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn from_cols_array(cols: [f64; 16]) -> Self {
        Self { cols }
    }

    /// Builds a matrix from a host-provided slice. Returns `None` unless the
    /// slice holds exactly 16 values.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let cols: [f64; 16] = values.try_into().ok()?;
        Some(Self { cols })
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cols[col * 4 + row]
    }

    pub fn is_finite(&self) -> bool {
        self.cols.iter().all(|v| v.is_finite())
    }

    pub fn translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[12] = t.x;
        m.cols[13] = t.y;
        m.cols[14] = t.z;
        m
    }

    /// Translation * rotation about +Y * uniform scale.
    pub fn from_translation_rotation_y_scale(t: Vec3, yaw_rad: f64, scale: f64) -> Self {
        let (s, c) = yaw_rad.sin_cos();
        Self {
            cols: [
                c * scale, 0.0, -s * scale, 0.0, //
                0.0, scale, 0.0, 0.0, //
                s * scale, 0.0, c * scale, 0.0, //
                t.x, t.y, t.z, 1.0,
            ],
        }
    }

    pub fn multiply(&self, rhs: &Mat4) -> Mat4 {
        let mut out = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4).map(|k| self.get(row, k) * rhs.get(k, col)).sum();
            }
        }
        Mat4 { cols: out }
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let x = self.get(0, 0) * p.x + self.get(0, 1) * p.y + self.get(0, 2) * p.z + self.get(0, 3);
        let y = self.get(1, 0) * p.x + self.get(1, 1) * p.y + self.get(1, 2) * p.z + self.get(1, 3);
        let z = self.get(2, 0) * p.x + self.get(2, 1) * p.y + self.get(2, 2) * p.z + self.get(2, 3);
        let w = self.get(3, 0) * p.x + self.get(3, 1) * p.y + self.get(3, 2) * p.z + self.get(3, 3);
        if w != 0.0 && w != 1.0 {
            Vec3::new(x / w, y / w, z / w)
        } else {
            Vec3::new(x, y, z)
        }
    }

    /// Column-major `f32` columns for GPU upload.
    pub fn to_cols_f32(&self) -> [[f32; 4]; 4] {
        let mut out = [[0.0f32; 4]; 4];
        for (col, chunk) in self.cols.chunks_exact(4).enumerate() {
            for (row, v) in chunk.iter().enumerate() {
                out[col][row] = *v as f32;
            }
        }
        out
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        self.multiply(&rhs)
    }
}
