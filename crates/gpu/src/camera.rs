use foundation::math::Mat4;

/// Camera for a single frame: the host's view-projection matrix, re-derived
/// every draw and never carried over.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraState {
    pub view_projection: Mat4,
}

impl CameraState {
    /// Wraps a host matrix. Non-finite matrices count as "no data" and yield
    /// `None` so the caller skips the frame instead of drawing garbage.
    pub fn from_host_matrix(matrix: Mat4) -> Option<Self> {
        matrix.is_finite().then_some(Self {
            view_projection: matrix,
        })
    }

    pub fn model_view_projection(&self, model: &Mat4) -> Mat4 {
        self.view_projection * *model
    }
}
