use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gpu::{ContextId, GraphicsBackend, GraphicsContext, RenderError, Renderer};
use scene::SceneGraph;
use tracing::{debug, info, warn};

use crate::error::OverlayError;
use crate::render_loop::SkipReason;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    /// Not attached to a map, or torn down.
    Unbound,
    /// Attached and holding a scene, but without a usable context.
    Bound,
    /// A renderer is live against the latest restored context.
    Rendering,
}

/// Tracks the host's graphics context and the renderer built against it.
///
/// The context is borrowed, never owned: only a weak reference is kept, and
/// draws are accepted only for the context the renderer was built against.
pub struct ContextLifecycle<B: GraphicsBackend> {
    backend: B,
    state: LifecycleState,
    renderer: Option<B::Renderer>,
    context: Option<Weak<RefCell<B::Context>>>,
    context_id: Option<ContextId>,
    retired: bool,
}

impl<B: GraphicsBackend> ContextLifecycle<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: LifecycleState::Unbound,
            renderer: None,
            context: None,
            context_id: None,
            retired: false,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn context_id(&self) -> Option<ContextId> {
        self.context_id
    }

    pub fn renderer(&self) -> Option<&B::Renderer> {
        self.renderer.as_ref()
    }

    /// Unbound to Bound. Returns `true` on the transition and `false` if
    /// already bound.
    pub fn bind(&mut self) -> Result<bool, OverlayError> {
        if self.retired {
            return Err(OverlayError::Retired);
        }
        if self.state != LifecycleState::Unbound {
            debug!(state = ?self.state, "already bound");
            return Ok(false);
        }
        self.state = LifecycleState::Bound;
        info!("overlay bound");
        Ok(true)
    }

    /// Builds a renderer against `context`, replacing any live one.
    ///
    /// On failure the lifecycle stays [`LifecycleState::Bound`].
    pub fn restore(
        &mut self,
        context: &Rc<RefCell<B::Context>>,
        scene: &mut SceneGraph,
    ) -> Result<(), OverlayError> {
        if self.retired {
            return Err(OverlayError::Retired);
        }
        if self.state == LifecycleState::Unbound {
            return Err(OverlayError::NotBound);
        }

        if self.renderer.is_some() {
            debug!("context restored without a loss; replacing renderer");
            self.dispose_renderer();
        }
        // Buffers queued for release belonged to the previous renderer.
        scene.discard_released();
        self.state = LifecycleState::Bound;

        let Ok(mut ctx) = context.try_borrow_mut() else {
            warn!("context busy during restore");
            return Err(RenderError::ContextUnavailable.into());
        };
        match self.backend.create_renderer(&mut *ctx) {
            Ok(renderer) => {
                self.renderer = Some(renderer);
                self.context = Some(Rc::downgrade(context));
                self.context_id = Some(ctx.id());
                self.state = LifecycleState::Rendering;
                info!(context = ctx.id().0, "renderer created");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "renderer creation failed");
                Err(err.into())
            }
        }
    }

    /// Rendering to Bound. The renderer is dropped without touching the
    /// context, whose resources are already gone.
    pub fn lose(&mut self, scene: &mut SceneGraph) {
        if self.state != LifecycleState::Rendering {
            debug!(state = ?self.state, "context lost while not rendering");
            return;
        }
        self.renderer = None;
        self.context = None;
        self.context_id = None;
        scene.discard_released();
        self.state = LifecycleState::Bound;
        info!("context lost; rendering suspended");
    }

    /// The renderer, if `context` is the one it was built against.
    pub fn renderer_for(
        &mut self,
        context: &Rc<RefCell<B::Context>>,
    ) -> Result<&mut B::Renderer, SkipReason> {
        if self.state != LifecycleState::Rendering {
            return Err(SkipReason::NotRendering);
        }
        let current = self.context.as_ref().and_then(Weak::upgrade);
        if !current.is_some_and(|c| Rc::ptr_eq(&c, context)) {
            return Err(SkipReason::ContextMismatch);
        }
        self.renderer.as_mut().ok_or(SkipReason::NotRendering)
    }

    /// Any state to Unbound, for good. Disposes the renderer and the scene
    /// and forgets the context. Safe to call repeatedly.
    pub fn teardown(&mut self, scene: &mut SceneGraph) {
        scene.clear_all();
        self.dispose_renderer();
        scene.discard_released();
        self.state = LifecycleState::Unbound;
        if !self.retired {
            self.retired = true;
            info!("overlay torn down");
        }
    }

    fn dispose_renderer(&mut self) {
        let Some(mut renderer) = self.renderer.take() else {
            return;
        };
        let context = self.context.take().and_then(|weak| weak.upgrade());
        self.context_id = None;
        match context {
            Some(context) => match context.try_borrow_mut() {
                Ok(mut ctx) => renderer.dispose(&mut *ctx),
                Err(_) => warn!("context busy; dropping renderer without disposal"),
            },
            None => debug!("context already gone; dropping renderer"),
        }
    }
}
