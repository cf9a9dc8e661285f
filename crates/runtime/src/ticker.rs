use std::cell::Cell;
use std::rc::Rc;

use foundation::time::Time;
use tracing::trace;

use crate::frame::{Frame, FrameClock};

/// What a tick callback wants next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickControl {
    /// Request another frame.
    Continue,
    /// Do not reschedule.
    Stop,
}

/// Cancels a [`Ticker`] from outside its callback, e.g. during teardown.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

/// Self-scheduled "request next frame" loop.
///
/// The host calls [`Ticker::tick`] from its frame callback and reschedules
/// only while the ticker answers [`TickControl::Continue`]. Once stopped it
/// stays stopped.
#[derive(Debug)]
pub struct Ticker {
    clock: FrameClock,
    stop: StopHandle,
}

impl Ticker {
    pub fn new(max_dt_s: f64) -> Self {
        Self {
            clock: FrameClock::new(max_dt_s),
            stop: StopHandle::default(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.stop.is_stopped()
    }

    pub fn tick(&mut self, now: Time, mut on_frame: impl FnMut(Frame) -> TickControl) -> TickControl {
        if self.stop.is_stopped() {
            return TickControl::Stop;
        }
        let frame = self.clock.advance(now);
        trace!(index = frame.index, dt_s = frame.dt_s, "animation tick");
        let control = on_frame(frame);
        if control == TickControl::Stop {
            self.stop.stop();
        }
        control
    }
}
