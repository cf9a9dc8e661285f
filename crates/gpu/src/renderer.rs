use scene::{ObjectId, SceneGraph};

use crate::camera::CameraState;
use crate::context::GraphicsContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The context is lost or was never usable.
    ContextUnavailable,
    Backend(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContextUnavailable => write!(f, "Graphics context unavailable"),
            Self::Backend(msg) => write!(f, "Backend error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// What a successful render pass drew.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub draw_calls: u32,
    pub lights: u32,
    pub uploads: u32,
}

/// Draws a scene graph into a borrowed context.
pub trait Renderer {
    type Context: GraphicsContext;

    /// Frees GPU buffers held for `objects`. Unknown handles are ignored.
    fn release(&mut self, context: &mut Self::Context, objects: &[ObjectId]);

    fn render(
        &mut self,
        context: &mut Self::Context,
        scene: &SceneGraph,
        camera: &CameraState,
    ) -> Result<RenderStats, RenderError>;

    /// Frees everything. The renderer is not used afterwards.
    fn dispose(&mut self, context: &mut Self::Context);

    fn live_buffer_count(&self) -> usize;
}

/// Builds renderers against host-provided contexts.
pub trait GraphicsBackend {
    type Context: GraphicsContext;
    type Renderer: Renderer<Context = Self::Context>;

    fn create_renderer(&mut self, context: &mut Self::Context)
    -> Result<Self::Renderer, RenderError>;
}
