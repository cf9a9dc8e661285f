use std::ops::{Deref, DerefMut};

/// Identity of a graphics context instance. A restored context gets a new id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

/// Mutable global pipeline state shared between the host and the overlay.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PipelineState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: bool,
    pub cull_face: bool,
    pub program: Option<u32>,
    pub array_buffer: Option<u32>,
    pub viewport: [i32; 4],
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: true,
            blend: false,
            cull_face: false,
            program: None,
            array_buffer: None,
            viewport: [0, 0, 0, 0],
        }
    }
}

/// A drawing surface owned by the host.
pub trait GraphicsContext {
    fn id(&self) -> ContextId;
    fn pipeline_state(&self) -> PipelineState;
    fn set_pipeline_state(&mut self, state: PipelineState);
}

/// Snapshots the pipeline state on creation and writes it back on drop, so
/// whatever the renderer touches is handed back to the host unchanged, on
/// success and on error alike.
pub struct StateGuard<'a, C: GraphicsContext> {
    context: &'a mut C,
    saved: PipelineState,
}

impl<'a, C: GraphicsContext> StateGuard<'a, C> {
    pub fn new(context: &'a mut C) -> Self {
        let saved = context.pipeline_state();
        Self { context, saved }
    }
}

impl<C: GraphicsContext> Deref for StateGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.context
    }
}

impl<C: GraphicsContext> DerefMut for StateGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.context
    }
}

impl<C: GraphicsContext> Drop for StateGuard<'_, C> {
    fn drop(&mut self) {
        self.context.set_pipeline_state(self.saved);
    }
}
