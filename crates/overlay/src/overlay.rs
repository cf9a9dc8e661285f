use std::cell::RefCell;
use std::rc::Rc;

use foundation::time::Time;
use gpu::GraphicsBackend;
use runtime::{TickControl, Ticker};
use scene::{SceneGraph, SceneObject};
use scene::components::Tag;
use scene::prefabs::spawn_lighting;
use tracing::{debug, info, warn};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, RouteError};
use crate::host::{CoordinateTransformer, MapService, MapView, OverlayListener, Subscription};
use crate::lifecycle::{ContextLifecycle, LifecycleState};
use crate::render_loop::{DrawOutcome, OverlayStats, RenderLoop, SkipReason};
use crate::route::{RoutePath, build_route_objects};
use crate::tilt::TiltRamp;
use crate::transform::Anchor;

/// Identifies one asynchronous route request. Only the most recent ticket is
/// honored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RouteTicket(u64);

/// What a route update did to the scene.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Markers and a line are in the scene.
    Rendered { markers: usize, line_vertices: usize },
    /// No route objects: the path was too short or the request failed.
    Empty,
    /// Stored until the overlay is added to a map.
    Deferred,
    /// A newer request or a teardown superseded this one.
    Discarded,
}

/// A route overlay attached to one map.
///
/// Owns the scene graph and the renderer lifecycle. The map drives it through
/// [`OverlayListener`] callbacks; the UI feeds it routes.
pub struct GeoOverlay<B: GraphicsBackend> {
    config: OverlayConfig,
    scene: SceneGraph,
    lifecycle: ContextLifecycle<B>,
    render_loop: RenderLoop,
    anchor: Option<Anchor>,
    route: Option<RoutePath>,
    route_epoch: u64,
    tilt: TiltRamp,
    ticker: Ticker,
}

impl<B: GraphicsBackend> GeoOverlay<B> {
    pub fn new(backend: B, config: OverlayConfig) -> Self {
        Self {
            scene: SceneGraph::new(),
            lifecycle: ContextLifecycle::new(backend),
            render_loop: RenderLoop::new(config.max_frame_dt_s),
            anchor: None,
            route: None,
            route_epoch: 0,
            tilt: TiltRamp::new(&config.tilt_ramp),
            ticker: Ticker::new(config.max_frame_dt_s),
            config,
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn lifecycle(&self) -> &ContextLifecycle<B> {
        &self.lifecycle
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    pub fn route(&self) -> Option<&RoutePath> {
        self.route.as_ref()
    }

    pub fn stats(&self) -> OverlayStats {
        self.render_loop.stats()
    }

    /// Creates the scene: anchor at the map center, base lighting, and any
    /// route submitted before now.
    pub fn attach(&mut self, map: &dyn MapView) -> Result<(), OverlayError> {
        if !self.lifecycle.bind()? {
            return Ok(());
        }
        match map.center() {
            Some(center) => {
                self.anchor = Some(Anchor::new(
                    center.with_altitude(self.config.anchor_altitude_m),
                ));
            }
            None => warn!("map has no center yet; waiting for a route to anchor"),
        }
        spawn_lighting(&mut self.scene, &self.config.lighting.rig());
        self.tilt.start_at(map.tilt());

        if self.route.is_some() {
            self.apply_route();
        }
        Ok(())
    }

    pub fn restore_context(
        &mut self,
        context: &Rc<RefCell<B::Context>>,
    ) -> Result<(), OverlayError> {
        self.lifecycle.restore(context, &mut self.scene)?;
        self.render_loop.reset_clock();
        Ok(())
    }

    pub fn lose_context(&mut self) {
        self.lifecycle.lose(&mut self.scene);
    }

    /// Renders one host frame. Never fails: anything that prevents drawing
    /// turns into a skipped frame.
    pub fn draw(
        &mut self,
        context: &Rc<RefCell<B::Context>>,
        transformer: &dyn CoordinateTransformer,
        now: Time,
    ) -> DrawOutcome {
        let renderer = match self.lifecycle.renderer_for(context) {
            Ok(renderer) => renderer,
            Err(reason) => return self.render_loop.skip(reason),
        };
        let Some(anchor) = self.anchor else {
            return self.render_loop.skip(SkipReason::NoAnchor);
        };
        let Ok(mut ctx) = context.try_borrow_mut() else {
            return self.render_loop.skip(SkipReason::ContextBusy);
        };
        self.render_loop.draw(
            renderer,
            &mut *ctx,
            &mut self.scene,
            transformer,
            &anchor,
            now,
        )
    }

    /// Replaces the visualized route.
    ///
    /// Markers and line are rebuilt from `path` against the current anchor
    /// every time. A marker that lands where its predecessor stood keeps the
    /// predecessor's spin and bob phase.
    pub fn update_route(&mut self, path: RoutePath) -> Result<RouteOutcome, OverlayError> {
        if self.lifecycle.is_retired() {
            return Err(OverlayError::Retired);
        }
        if let Err(err) = path.validate() {
            self.clear_route();
            return Err(err.into());
        }
        self.route = Some(path);
        if self.lifecycle.state() == LifecycleState::Unbound {
            debug!("route stored until the overlay is added");
            return Ok(RouteOutcome::Deferred);
        }
        Ok(self.apply_route())
    }

    /// Starts tracking a new route request and invalidates earlier ones.
    pub fn begin_route_request(&mut self) -> RouteTicket {
        self.route_epoch += 1;
        RouteTicket(self.route_epoch)
    }

    /// Applies the result of the request behind `ticket` if it is still the
    /// latest one. A failed request clears the route.
    pub fn complete_route_request(
        &mut self,
        ticket: RouteTicket,
        result: Result<RoutePath, RouteError>,
    ) -> Result<RouteOutcome, OverlayError> {
        if self.lifecycle.is_retired() || ticket.0 != self.route_epoch {
            debug!(ticket = ticket.0, latest = self.route_epoch, "discarding stale route");
            return Ok(RouteOutcome::Discarded);
        }
        match result {
            Ok(path) => self.update_route(path),
            Err(err) => {
                warn!(error = %err, "route request failed; clearing route");
                self.clear_route();
                Ok(RouteOutcome::Empty)
            }
        }
    }

    /// One animation tick: advances the intro tilt and asks for a redraw.
    /// Answers [`TickControl::Stop`] once the overlay is torn down.
    pub fn tick(&mut self, now: Time, map: &mut dyn MapService<B::Context>) -> TickControl {
        let tilt = &mut self.tilt;
        self.ticker.tick(now, |frame| {
            if let Some(tilt_deg) = tilt.advance(frame.dt_s) {
                map.move_camera(tilt_deg);
            }
            map.request_redraw();
            TickControl::Continue
        })
    }

    /// Disposes everything and retires the overlay. Pending route requests
    /// are dropped. Safe to call more than once.
    pub fn teardown(&mut self) {
        self.route_epoch += 1;
        self.ticker.stop_handle().stop();
        self.lifecycle.teardown(&mut self.scene);
        self.anchor = None;
        self.route = None;
    }

    fn clear_route(&mut self) {
        self.route = None;
        if self.lifecycle.state() != LifecycleState::Unbound {
            self.replace_route_objects(Vec::new());
        }
    }

    /// Swaps in a new set of route objects. Without a live renderer nothing
    /// removed here was ever uploaded, so the release queue is dropped.
    fn replace_route_objects(&mut self, objects: Vec<SceneObject>) {
        self.scene.replace_tagged(Tag::ROUTE, objects);
        if self.lifecycle.state() != LifecycleState::Rendering {
            self.scene.discard_released();
        }
    }

    fn apply_route(&mut self) -> RouteOutcome {
        let Some(path) = self.route.as_ref() else {
            return RouteOutcome::Empty;
        };
        if !path.is_drawable() {
            let points = path.len();
            self.replace_route_objects(Vec::new());
            debug!(points, "route too short to draw");
            return RouteOutcome::Empty;
        }

        if let Some(first) = path.first() {
            let moved = self
                .anchor
                .is_none_or(|anchor| !anchor.point().same_location(&first));
            if moved {
                self.anchor = Some(Anchor::new(
                    first.with_altitude(self.config.anchor_altitude_m),
                ));
                debug!(
                    latitude = first.latitude,
                    longitude = first.longitude,
                    "re-anchored at route start"
                );
            }
        }
        let Some(anchor) = self.anchor else {
            return RouteOutcome::Empty;
        };

        let mut objects = build_route_objects(path, &anchor);
        let line_vertices = path.len();
        for (_, previous) in self.scene.objects_with_tag(Tag::ROUTE) {
            for object in objects.iter_mut() {
                object.continue_motion_from(previous);
            }
        }
        self.replace_route_objects(objects);
        info!(points = line_vertices, "route applied");
        RouteOutcome::Rendered {
            markers: 2,
            line_vertices,
        }
    }
}

impl<B: GraphicsBackend> OverlayListener<B::Context> for GeoOverlay<B> {
    fn on_add(&mut self, map: &dyn MapView) {
        if let Err(err) = self.attach(map) {
            warn!(error = %err, "ignoring add");
        }
    }

    fn on_context_restored(&mut self, context: &Rc<RefCell<B::Context>>) {
        if let Err(err) = self.restore_context(context) {
            warn!(error = %err, "context restore did not start rendering");
        }
    }

    fn on_context_lost(&mut self) {
        self.lose_context();
    }

    fn on_draw(
        &mut self,
        context: &Rc<RefCell<B::Context>>,
        transformer: &dyn CoordinateTransformer,
        now: Time,
    ) -> DrawOutcome {
        self.draw(context, transformer, now)
    }

    fn on_remove(&mut self) {
        self.teardown();
    }
}

/// An overlay registered with a map. Dropping it (or [`MountedOverlay::unmount`])
/// releases the registration and tears the overlay down.
pub struct MountedOverlay<B: GraphicsBackend> {
    overlay: Rc<RefCell<GeoOverlay<B>>>,
    subscription: Option<Subscription>,
}

/// Creates an overlay and registers it with `map`. The map only ever holds a
/// weak reference; the returned value owns the overlay.
pub fn mount<B, M>(
    map: &mut M,
    backend: B,
    config: OverlayConfig,
) -> Result<MountedOverlay<B>, OverlayError>
where
    B: GraphicsBackend + 'static,
    M: MapService<B::Context> + ?Sized,
{
    config.validate()?;
    let overlay = Rc::new(RefCell::new(GeoOverlay::new(backend, config)));
    let listener: Rc<RefCell<dyn OverlayListener<B::Context>>> = overlay.clone();
    let subscription = map.attach_overlay(Rc::downgrade(&listener));
    info!("overlay mounted");
    Ok(MountedOverlay {
        overlay,
        subscription: Some(subscription),
    })
}

impl<B: GraphicsBackend> MountedOverlay<B> {
    pub fn overlay(&self) -> &Rc<RefCell<GeoOverlay<B>>> {
        &self.overlay
    }

    pub fn update_route(&self, path: RoutePath) -> Result<RouteOutcome, OverlayError> {
        self.overlay.borrow_mut().update_route(path)
    }

    pub fn begin_route_request(&self) -> RouteTicket {
        self.overlay.borrow_mut().begin_route_request()
    }

    pub fn complete_route_request(
        &self,
        ticket: RouteTicket,
        result: Result<RoutePath, RouteError>,
    ) -> Result<RouteOutcome, OverlayError> {
        self.overlay
            .borrow_mut()
            .complete_route_request(ticket, result)
    }

    pub fn tick(&self, now: Time, map: &mut dyn MapService<B::Context>) -> TickControl {
        self.overlay.borrow_mut().tick(now, map)
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn unmount(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        subscription.release();
        match self.overlay.try_borrow_mut() {
            Ok(mut overlay) => overlay.teardown(),
            Err(_) => warn!("overlay busy during unmount; teardown skipped"),
        }
        info!("overlay unmounted");
    }
}

impl<B: GraphicsBackend> Drop for MountedOverlay<B> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoOverlay, RouteOutcome};
    use crate::config::{OverlayConfig, TiltRampConfig};
    use crate::error::{OverlayError, RouteError};
    use crate::host::MapView;
    use crate::lifecycle::LifecycleState;
    use crate::route::RoutePath;
    use foundation::GeoPoint;
    use gpu::command::CommandBackend;
    use scene::components::Tag;

    struct StaticMap(Option<GeoPoint>);

    impl MapView for StaticMap {
        fn center(&self) -> Option<GeoPoint> {
            self.0
        }
        fn zoom(&self) -> f64 {
            15.0
        }
        fn tilt(&self) -> f64 {
            0.0
        }
    }

    fn overlay() -> GeoOverlay<CommandBackend> {
        GeoOverlay::new(CommandBackend::default(), OverlayConfig::default())
    }

    fn path(points: &[(f64, f64)]) -> RoutePath {
        points.iter().map(|(lat, lng)| GeoPoint::lat_lng(*lat, *lng)).collect()
    }

    #[test]
    fn attach_anchors_at_map_center_and_adds_lighting() {
        let mut overlay = overlay();
        overlay
            .attach(&StaticMap(Some(GeoPoint::lat_lng(22.3, 114.16))))
            .unwrap();

        let anchor = overlay.anchor().expect("anchor");
        assert_eq!(anchor.point(), GeoPoint::new(22.3, 114.16, 100.0));
        assert_eq!(overlay.scene().objects_with_tag(Tag::PERSISTENT).len(), 2);
        assert_eq!(overlay.state(), LifecycleState::Bound);
    }

    #[test]
    fn routes_before_attach_are_deferred() {
        let mut overlay = overlay();
        let hk = path(&[(22.3035, 114.1599), (22.3050, 114.1620)]);
        assert_eq!(overlay.update_route(hk.clone()).unwrap(), RouteOutcome::Deferred);
        assert!(overlay.scene().is_empty());

        overlay.attach(&StaticMap(None)).unwrap();
        assert_eq!(overlay.route(), Some(&hk));
        assert_eq!(overlay.scene().objects_with_tag(Tag::ROUTE).len(), 3);
    }

    #[test]
    fn route_start_becomes_the_anchor() {
        let mut overlay = overlay();
        overlay
            .attach(&StaticMap(Some(GeoPoint::lat_lng(22.3, 114.16))))
            .unwrap();
        overlay
            .update_route(path(&[(22.3035, 114.1599), (22.3050, 114.1620)]))
            .unwrap();

        assert_eq!(
            overlay.anchor().map(|a| a.point()),
            Some(GeoPoint::new(22.3035, 114.1599, 100.0))
        );
    }

    #[test]
    fn stale_tickets_are_discarded() {
        let mut overlay = overlay();
        overlay.attach(&StaticMap(None)).unwrap();
        let old = overlay.begin_route_request();
        let new = overlay.begin_route_request();

        let outcome = overlay
            .complete_route_request(old, Ok(path(&[(1.0, 1.0), (1.1, 1.1)])))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Discarded);
        assert!(overlay.scene().objects_with_tag(Tag::ROUTE).is_empty());

        let outcome = overlay
            .complete_route_request(new, Ok(path(&[(1.0, 1.0), (1.1, 1.1)])))
            .unwrap();
        assert!(matches!(outcome, RouteOutcome::Rendered { .. }));
    }

    #[test]
    fn failed_request_clears_the_route() {
        let mut overlay = overlay();
        overlay.attach(&StaticMap(None)).unwrap();
        overlay
            .update_route(path(&[(1.0, 1.0), (1.1, 1.1)]))
            .unwrap();

        let ticket = overlay.begin_route_request();
        let outcome = overlay
            .complete_route_request(ticket, Err(RouteError::NoRoute))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Empty);
        assert!(overlay.scene().objects_with_tag(Tag::ROUTE).is_empty());
        assert!(overlay.route().is_none());
    }

    #[test]
    fn invalid_points_are_rejected_and_clear_the_route() {
        let mut overlay = overlay();
        overlay.attach(&StaticMap(None)).unwrap();
        overlay
            .update_route(path(&[(1.0, 1.0), (1.1, 1.1)]))
            .unwrap();

        let err = overlay
            .update_route(path(&[(1.0, 1.0), (f64::NAN, 1.1)]))
            .unwrap_err();
        assert!(matches!(
            err,
            OverlayError::Route(RouteError::InvalidPoint { index: 1 })
        ));
        assert!(overlay.scene().objects_with_tag(Tag::ROUTE).is_empty());
    }

    #[test]
    fn teardown_retires_the_overlay() {
        let mut overlay = GeoOverlay::new(
            CommandBackend::default(),
            OverlayConfig {
                tilt_ramp: TiltRampConfig {
                    enabled: false,
                    ..TiltRampConfig::default()
                },
                ..OverlayConfig::default()
            },
        );
        overlay.attach(&StaticMap(None)).unwrap();
        let ticket = overlay.begin_route_request();
        overlay.teardown();
        overlay.teardown();

        assert!(overlay.scene().is_empty());
        assert_eq!(overlay.state(), LifecycleState::Unbound);
        assert!(matches!(
            overlay.update_route(RoutePath::default()),
            Err(OverlayError::Retired)
        ));
        assert_eq!(
            overlay
                .complete_route_request(ticket, Ok(RoutePath::default()))
                .unwrap(),
            RouteOutcome::Discarded
        );
    }

    #[test]
    fn updates_without_a_renderer_do_not_queue_releases() {
        let mut overlay = overlay();
        overlay.attach(&StaticMap(None)).unwrap();
        assert_eq!(overlay.state(), LifecycleState::Bound);

        for i in 0..1000 {
            let lat = 1.0 + (i % 7) as f64 * 0.001;
            overlay
                .update_route(path(&[(lat, 1.0), (lat + 0.01, 1.01)]))
                .unwrap();
        }
        overlay.update_route(path(&[(1.0, 1.0)])).unwrap();

        assert_eq!(overlay.scene().pending_release_count(), 0);
        assert!(overlay.scene().objects_with_tag(Tag::ROUTE).is_empty());
    }

    #[test]
    fn resubmitted_route_keeps_marker_motion() {
        let mut overlay = overlay();
        overlay.attach(&StaticMap(None)).unwrap();
        let hk = path(&[(22.3035, 114.1599), (22.3050, 114.1620)]);
        overlay.update_route(hk.clone()).unwrap();
        overlay.scene.advance_animations(1.25);

        let poses = |overlay: &GeoOverlay<CommandBackend>| {
            overlay
                .scene()
                .objects_with_tag(Tag::ROUTE)
                .into_iter()
                .map(|(_, o)| (o.name, o.transform, o.animation))
                .collect::<Vec<_>>()
        };
        let before = poses(&overlay);
        overlay.update_route(hk).unwrap();

        assert_eq!(poses(&overlay), before);
        assert!(
            before
                .iter()
                .filter_map(|(_, _, a)| *a)
                .all(|a| a.elapsed_s() == 1.25)
        );
    }
}
