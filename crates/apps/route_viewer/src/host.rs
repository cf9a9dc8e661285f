use std::cell::RefCell;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::rc::{Rc, Weak};

use foundation::GeoPoint;
use foundation::math::{Mat4, Vec3};
use foundation::time::Time;
use gpu::command::RecordingContext;
use overlay::{
    CoordinateTransformer, DrawOutcome, MapService, MapView, OverlayListener, Subscription,
};

const EARTH_RADIUS_M: f64 = 6_378_137.0;
const FOV_Y_RAD: f64 = FRAC_PI_4;

type Listener = Weak<RefCell<dyn OverlayListener<RecordingContext>>>;

/// Headless stand-in for a vector map: a web-mercator camera over a fixed
/// center, delivering overlay callbacks on demand.
pub struct SimulatedMap {
    center: GeoPoint,
    zoom: f64,
    tilt: f64,
    aspect: f64,
    redraw_requested: bool,
    listeners: Rc<RefCell<Vec<(u64, Listener)>>>,
    next_listener: u64,
}

impl SimulatedMap {
    pub fn new(center: GeoPoint, zoom: f64, viewport: (u32, u32)) -> Self {
        Self {
            center,
            zoom,
            tilt: 0.0,
            aspect: viewport.0 as f64 / viewport.1.max(1) as f64,
            redraw_requested: false,
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener: 0,
        }
    }

    fn overlays(&self) -> Vec<Rc<RefCell<dyn OverlayListener<RecordingContext>>>> {
        self.listeners
            .borrow()
            .iter()
            .filter_map(|(_, l)| l.upgrade())
            .collect()
    }

    pub fn fire_add(&self) {
        for overlay in self.overlays() {
            overlay.borrow_mut().on_add(self);
        }
    }

    pub fn fire_context_restored(&self, context: &Rc<RefCell<RecordingContext>>) {
        for overlay in self.overlays() {
            overlay.borrow_mut().on_context_restored(context);
        }
    }

    pub fn fire_context_lost(&self) {
        for overlay in self.overlays() {
            overlay.borrow_mut().on_context_lost();
        }
    }

    /// Draws a frame if one was requested since the last call.
    pub fn fire_draw(
        &mut self,
        context: &Rc<RefCell<RecordingContext>>,
        now: Time,
    ) -> Vec<DrawOutcome> {
        if !std::mem::take(&mut self.redraw_requested) {
            return Vec::new();
        }
        let overlays = self.overlays();
        let map: &Self = self;
        overlays
            .iter()
            .map(|overlay| overlay.borrow_mut().on_draw(context, map, now))
            .collect()
    }

    pub fn fire_remove(&self) {
        for overlay in self.overlays() {
            overlay.borrow_mut().on_remove();
        }
    }

    /// Camera distance above the center for the current zoom, so that the
    /// viewport spans one tile's worth of meters at that zoom.
    fn camera_distance_m(&self) -> f64 {
        let span = 2.0 * PI * EARTH_RADIUS_M / 2f64.powf(self.zoom);
        span / (2.0 * (FOV_Y_RAD / 2.0).tan())
    }
}

fn mercator(point: GeoPoint) -> (f64, f64) {
    let x = EARTH_RADIUS_M * point.longitude.to_radians();
    let y = EARTH_RADIUS_M * (FRAC_PI_4 + point.latitude.to_radians() / 2.0).tan().ln();
    (x, y)
}

fn rotation_x(angle_rad: f64) -> Mat4 {
    let (s, c) = angle_rad.sin_cos();
    Mat4::from_cols_array([
        1.0, 0.0, 0.0, 0.0, //
        0.0, c, s, 0.0, //
        0.0, -s, c, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ])
}

fn perspective(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
    let f = 1.0 / (fov_y_rad / 2.0).tan();
    Mat4::from_cols_array([
        f / aspect,
        0.0,
        0.0,
        0.0,
        0.0,
        f,
        0.0,
        0.0,
        0.0,
        0.0,
        (far + near) / (near - far),
        -1.0,
        0.0,
        0.0,
        2.0 * far * near / (near - far),
        0.0,
    ])
}

impl CoordinateTransformer for SimulatedMap {
    /// View-projection for a Y-up frame rooted at `point`, seen from above
    /// the map center.
    fn from_lat_lng_altitude(&self, point: GeoPoint) -> Option<Mat4> {
        if !point.is_valid() {
            return None;
        }
        let (cx, cy) = mercator(self.center);
        let (px, py) = mercator(point);
        // Mercator scale shrinks toward the poles.
        let scale = point.latitude.to_radians().cos();
        let east = (cx - px) * scale;
        let north = (cy - py) * scale;

        let distance = self.camera_distance_m();
        let eye = Vec3::new(east, distance - point.altitude, -north);
        let view = rotation_x(FRAC_PI_2 - self.tilt.to_radians()) * Mat4::translation(eye * -1.0);
        let projection = perspective(FOV_Y_RAD, self.aspect, 1.0, distance * 10.0);
        Some(projection * view)
    }
}

impl MapView for SimulatedMap {
    fn center(&self) -> Option<GeoPoint> {
        Some(self.center)
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn tilt(&self) -> f64 {
        self.tilt
    }
}

impl MapService<RecordingContext> for SimulatedMap {
    fn move_camera(&mut self, tilt_deg: f64) {
        self.tilt = tilt_deg.clamp(0.0, 67.5);
    }

    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    fn attach_overlay(&mut self, listener: Listener) -> Subscription {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.borrow_mut().push((id, listener));
        let listeners = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(i, _)| *i != id);
            }
        })
    }
}
