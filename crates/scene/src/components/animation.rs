use std::f64::consts::TAU;

use foundation::math::Vec3;

use super::Transform;

/// Time-based self-animation: spin about the up axis plus a vertical bob.
///
/// The bob is evaluated from the base position at the accumulated time, so
/// the object oscillates in place and never drifts.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Animation {
    pub spin_rad_per_s: f64,
    pub bob_amplitude_m: f64,
    pub bob_frequency_hz: f64,
    elapsed_s: f64,
    base: Vec3,
}

impl Animation {
    pub fn new(spin_rad_per_s: f64, bob_amplitude_m: f64, bob_frequency_hz: f64) -> Self {
        Self {
            spin_rad_per_s,
            bob_amplitude_m,
            bob_frequency_hz,
            elapsed_s: 0.0,
            base: Vec3::ZERO,
        }
    }

    pub(crate) fn anchored_at(self, base: Vec3) -> Self {
        Self {
            base,
            elapsed_s: 0.0,
            ..self
        }
    }

    /// Continues at `previous`'s phase instead of starting over.
    pub(crate) fn resume_from(&mut self, previous: &Animation) {
        self.elapsed_s = previous.elapsed_s;
    }

    pub fn base(&self) -> Vec3 {
        self.base
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    /// Advances by `dt_s` seconds. Matrix transforms are left alone.
    pub fn advance(&mut self, transform: &mut Transform, dt_s: f64) {
        let Transform::Trs {
            position, yaw_rad, ..
        } = transform
        else {
            return;
        };
        self.elapsed_s += dt_s;
        *yaw_rad = (*yaw_rad + self.spin_rad_per_s * dt_s).rem_euclid(TAU);
        let lift = self.bob_amplitude_m * (TAU * self.bob_frequency_hz * self.elapsed_s).sin();
        *position = Vec3::new(self.base.x, self.base.y + lift, self.base.z);
    }
}
