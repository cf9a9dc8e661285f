use crate::config::TiltRampConfig;

/// Raises the map tilt toward a target, time-based, then goes quiet.
///
/// Dormant until [`TiltRamp::start_at`] reports the map's tilt: before that
/// there is no starting point to ramp from.
#[derive(Debug, Clone)]
pub struct TiltRamp {
    rate_deg_per_s: f64,
    target_deg: f64,
    current_deg: f64,
    started: bool,
    finished: bool,
}

impl TiltRamp {
    pub fn new(config: &TiltRampConfig) -> Self {
        Self {
            rate_deg_per_s: config.rate_deg_per_s,
            target_deg: config.target_deg,
            current_deg: 0.0,
            started: false,
            finished: !config.enabled,
        }
    }

    /// Starts from the map's current tilt.
    pub fn start_at(&mut self, tilt_deg: f64) {
        self.current_deg = tilt_deg;
        self.started = true;
        if tilt_deg >= self.target_deg {
            self.finished = true;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Next tilt to apply after `dt_s` seconds, or `None` while dormant and
    /// once the target is reached.
    pub fn advance(&mut self, dt_s: f64) -> Option<f64> {
        if !self.started || self.finished {
            return None;
        }
        self.current_deg = (self.current_deg + self.rate_deg_per_s * dt_s).min(self.target_deg);
        if self.current_deg >= self.target_deg {
            self.finished = true;
        }
        Some(self.current_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::TiltRamp;
    use crate::config::TiltRampConfig;

    #[test]
    fn climbs_to_target_and_stops() {
        let mut ramp = TiltRamp::new(&TiltRampConfig::default());
        ramp.start_at(0.0);
        let mut last = 0.0;
        let mut steps = 0;
        while let Some(tilt) = ramp.advance(1.0 / 60.0) {
            assert!(tilt >= last);
            last = tilt;
            steps += 1;
            assert!(steps < 1000);
        }
        assert_eq!(last, 45.0);
        assert!(ramp.is_finished());
        assert_eq!(ramp.advance(1.0), None);
        // 45 deg at 0.5 deg per 60 Hz frame.
        assert!((89..=91).contains(&steps));
    }

    #[test]
    fn disabled_ramp_never_moves_the_camera() {
        let mut ramp = TiltRamp::new(&TiltRampConfig {
            enabled: false,
            ..TiltRampConfig::default()
        });
        ramp.start_at(0.0);
        assert_eq!(ramp.advance(1.0), None);
    }

    #[test]
    fn already_tilted_map_is_left_alone() {
        let mut ramp = TiltRamp::new(&TiltRampConfig::default());
        ramp.start_at(60.0);
        assert_eq!(ramp.advance(0.1), None);
    }

    #[test]
    fn stays_dormant_until_started() {
        let mut ramp = TiltRamp::new(&TiltRampConfig::default());
        assert!(!ramp.is_started());
        assert_eq!(ramp.advance(0.5), None);
        assert_eq!(ramp.advance(0.5), None);

        ramp.start_at(10.0);
        assert_eq!(ramp.advance(0.5), Some(25.0));
    }
}
