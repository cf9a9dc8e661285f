use foundation::time::Time;
use gpu::{RenderError, RenderStats, Renderer, StateGuard};
use runtime::FrameClock;
use scene::SceneGraph;
use tracing::{trace, warn};

use crate::host::CoordinateTransformer;
use crate::transform::{Anchor, projection_matrix_for};

/// Why a draw did nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No renderer: the context is not restored yet, was lost, or the
    /// overlay is torn down.
    NotRendering,
    /// The host drew with a context other than the latest restored one.
    ContextMismatch,
    /// The context is already borrowed elsewhere.
    ContextBusy,
    /// No anchor yet, so there is no frame to place a camera in.
    NoAnchor,
    /// The host had no view transform for this frame.
    NoCamera,
    RenderFailed(RenderError),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRendering => write!(f, "not rendering"),
            Self::ContextMismatch => write!(f, "context mismatch"),
            Self::ContextBusy => write!(f, "context busy"),
            Self::NoAnchor => write!(f, "no anchor"),
            Self::NoCamera => write!(f, "no camera transform"),
            Self::RenderFailed(err) => write!(f, "render failed: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    Rendered(RenderStats),
    Skipped(SkipReason),
}

impl DrawOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

/// Per-overlay frame counters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct OverlayStats {
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub render_errors: u64,
}

/// Runs one host-driven draw: camera, animation, render, state hand-back.
#[derive(Debug)]
pub struct RenderLoop {
    clock: FrameClock,
    stats: OverlayStats,
}

impl RenderLoop {
    pub fn new(max_frame_dt_s: f64) -> Self {
        Self {
            clock: FrameClock::new(max_frame_dt_s),
            stats: OverlayStats::default(),
        }
    }

    pub fn stats(&self) -> OverlayStats {
        self.stats
    }

    /// Records a frame skipped before it reached [`RenderLoop::draw`].
    pub fn skip(&mut self, reason: SkipReason) -> DrawOutcome {
        trace!(%reason, "skipping frame");
        self.stats.frames_skipped += 1;
        DrawOutcome::Skipped(reason)
    }

    /// Restarts frame timing, e.g. after the context comes back.
    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }

    pub fn draw<R: Renderer>(
        &mut self,
        renderer: &mut R,
        context: &mut R::Context,
        scene: &mut SceneGraph,
        transformer: &dyn CoordinateTransformer,
        anchor: &Anchor,
        now: Time,
    ) -> DrawOutcome {
        let center = anchor.point();
        let Some(camera) = projection_matrix_for(transformer, center, center.altitude) else {
            return self.skip(SkipReason::NoCamera);
        };

        let frame = self.clock.advance(now);
        scene.advance_animations(frame.dt_s);

        let mut guard = StateGuard::new(context);
        let released = scene.take_released();
        if !released.is_empty() {
            renderer.release(&mut *guard, &released);
        }
        match renderer.render(&mut *guard, scene, &camera) {
            Ok(stats) => {
                trace!(index = frame.index, draw_calls = stats.draw_calls, "rendered frame");
                self.stats.frames_rendered += 1;
                DrawOutcome::Rendered(stats)
            }
            Err(err) => {
                warn!(index = frame.index, error = %err, "render failed; skipping frame");
                self.stats.render_errors += 1;
                self.stats.frames_skipped += 1;
                DrawOutcome::Skipped(SkipReason::RenderFailed(err))
            }
        }
    }
}
