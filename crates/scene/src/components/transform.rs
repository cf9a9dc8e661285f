use foundation::math::{Mat4, Vec3};

/// Local placement of a scene object.
///
/// Most objects use position/yaw/scale. Objects positioned by a host
/// transformer carry the raw matrix it produced instead.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Transform {
    Trs { position: Vec3, yaw_rad: f64, scale: f64 },
    Matrix(Mat4),
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self::translate(Vec3::ZERO)
    }

    pub fn translate(position: Vec3) -> Self {
        Self::Trs {
            position,
            yaw_rad: 0.0,
            scale: 1.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            Self::Trs { position, .. } => *position,
            Self::Matrix(m) => m.transform_point(Vec3::ZERO),
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        match self {
            Self::Trs {
                position,
                yaw_rad,
                scale,
            } => Mat4::from_translation_rotation_y_scale(*position, *yaw_rad, *scale),
            Self::Matrix(m) => *m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Transform;
    use foundation::math::{Mat4, Vec3};

    #[test]
    fn identity_is_origin() {
        let transform = Transform::identity();
        assert_eq!(transform.position(), Vec3::ZERO);
        assert_eq!(transform.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn raw_matrix_reports_its_translation() {
        let m = Mat4::translation(Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(Transform::Matrix(m).position(), Vec3::new(4.0, 5.0, 6.0));
    }
}
