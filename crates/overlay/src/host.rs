use std::cell::RefCell;
use std::rc::{Rc, Weak};

use foundation::GeoPoint;
use foundation::math::Mat4;
use foundation::time::Time;

use crate::render_loop::DrawOutcome;

/// The host's per-draw view transform.
pub trait CoordinateTransformer {
    /// View-projection matrix (column-major) for a Y-up local frame rooted at
    /// `point`, in meters. `None` when the host has no transform this frame.
    fn from_lat_lng_altitude(&self, point: GeoPoint) -> Option<Mat4>;
}

/// Read-only map queries.
pub trait MapView {
    fn center(&self) -> Option<GeoPoint>;
    fn zoom(&self) -> f64;
    fn tilt(&self) -> f64;
}

/// Callbacks a map host delivers to an attached overlay. Every callback gets
/// the handles it needs as arguments; nothing is read from ambient state.
pub trait OverlayListener<C> {
    fn on_add(&mut self, map: &dyn MapView);
    fn on_context_restored(&mut self, context: &Rc<RefCell<C>>);
    fn on_context_lost(&mut self);
    fn on_draw(
        &mut self,
        context: &Rc<RefCell<C>>,
        transformer: &dyn CoordinateTransformer,
        now: Time,
    ) -> DrawOutcome;
    fn on_remove(&mut self);
}

/// A map that can host an overlay drawing into contexts of type `C`.
pub trait MapService<C>: MapView {
    fn move_camera(&mut self, tilt_deg: f64);
    fn request_redraw(&mut self);
    /// Registers `listener` for lifecycle callbacks until the returned
    /// subscription is dropped. The host keeps only the weak reference.
    fn attach_overlay(&mut self, listener: Weak<RefCell<dyn OverlayListener<C>>>) -> Subscription;
}

/// A host registration released exactly once, when dropped or on
/// [`Subscription::release`].
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
