use foundation::time::Time;

/// Per-frame timing handed to everything that animates.
///
/// Hosts drive frames at whatever rate they like, so `dt_s` is measured from
/// host timestamps instead of being fixed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the previous frame (clamped).
    pub dt_s: f64,
    /// Host time at this frame.
    pub time: Time,
}

/// Turns host timestamps into [`Frame`]s.
#[derive(Debug, Clone)]
pub struct FrameClock {
    max_dt_s: f64,
    last: Option<Time>,
    next_index: u64,
}

impl FrameClock {
    /// `max_dt_s` caps a single step so a suspended tab does not produce one
    /// huge animation jump when it wakes up.
    pub fn new(max_dt_s: f64) -> Self {
        Self {
            max_dt_s: max_dt_s.max(0.0),
            last: None,
            next_index: 0,
        }
    }

    pub fn advance(&mut self, now: Time) -> Frame {
        let dt_s = match self.last {
            Some(prev) => now.since(prev).min(self.max_dt_s),
            None => 0.0,
        };
        self.last = Some(now);
        let frame = Frame {
            index: self.next_index,
            dt_s,
            time: now,
        };
        self.next_index += 1;
        frame
    }

    pub fn frames_elapsed(&self) -> u64 {
        self.next_index
    }

    /// Forget the last timestamp; the next frame starts with `dt_s == 0`.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
