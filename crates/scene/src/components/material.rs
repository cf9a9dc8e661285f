/// 24-bit `0xRRGGBB` color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);

    pub fn rgb(self) -> [f32; 3] {
        [
            ((self.0 >> 16) & 0xff) as f32 / 255.0,
            ((self.0 >> 8) & 0xff) as f32 / 255.0,
            (self.0 & 0xff) as f32 / 255.0,
        ]
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    pub opacity: f32,
    pub depth_test: bool,
    pub depth_write: bool,
    pub double_sided: bool,
}

impl Material {
    pub fn opaque(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
            depth_test: true,
            depth_write: true,
            double_sided: false,
        }
    }

    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            opacity: opacity.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn double_sided(self) -> Self {
        Self {
            double_sided: true,
            ..self
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}
