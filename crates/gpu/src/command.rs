//! Command-recording backend.
//!
//! `RecordingContext` stands in for a host drawing surface: it owns the
//! pipeline state, hands out buffer names and counts what is live.
//! `CommandRenderer` draws a [`SceneGraph`] into it by recording one
//! [`RenderCommand`] per object, which keeps frames inspectable in tests and
//! in the headless viewer.

use std::collections::{BTreeMap, BTreeSet};

use scene::components::{Color, Drawable3D, Material};
use scene::{ObjectId, SceneGraph};
use tracing::{debug, trace};

use crate::buffers::pack_drawable;
use crate::camera::CameraState;
use crate::context::{ContextId, GraphicsContext, PipelineState};
use crate::renderer::{GraphicsBackend, RenderError, RenderStats, Renderer};

const OVERLAY_PROGRAM: u32 = 1;

#[derive(Debug)]
pub struct RecordingContext {
    id: ContextId,
    state: PipelineState,
    next_buffer: u32,
    live_buffers: BTreeSet<u32>,
    bytes_uploaded: usize,
    lost: bool,
    inject_failure: bool,
}

impl RecordingContext {
    pub fn new(id: u64) -> Self {
        Self {
            id: ContextId(id),
            state: PipelineState::default(),
            next_buffer: 1,
            live_buffers: BTreeSet::new(),
            bytes_uploaded: 0,
            lost: false,
            inject_failure: false,
        }
    }

    /// Host pipeline state, as the host would leave it before calling the
    /// overlay.
    pub fn with_state(mut self, state: PipelineState) -> Self {
        self.state = state;
        self
    }

    pub fn create_buffer(&mut self, bytes: &[u8]) -> Result<u32, RenderError> {
        if self.lost {
            return Err(RenderError::ContextUnavailable);
        }
        let name = self.next_buffer;
        self.next_buffer += 1;
        self.live_buffers.insert(name);
        self.bytes_uploaded += bytes.len();
        self.state.array_buffer = Some(name);
        Ok(name)
    }

    pub fn delete_buffer(&mut self, name: u32) {
        self.live_buffers.remove(&name);
    }

    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.len()
    }

    pub fn bytes_uploaded(&self) -> usize {
        self.bytes_uploaded
    }

    /// Simulates the surface going away; uploads and renderer creation fail
    /// until [`RecordingContext::restore`].
    pub fn lose(&mut self) {
        self.lost = true;
        self.live_buffers.clear();
    }

    pub fn restore(&mut self) {
        self.lost = false;
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Makes the next render pass fail after it has touched pipeline state.
    pub fn fail_next_render(&mut self) {
        self.inject_failure = true;
    }
}

impl GraphicsContext for RecordingContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn pipeline_state(&self) -> PipelineState {
        self.state
    }

    fn set_pipeline_state(&mut self, state: PipelineState) {
        self.state = state;
    }
}

fn apply_material(state: &mut PipelineState, material: &Material) {
    state.blend = material.is_transparent();
    state.depth_test = material.depth_test;
    state.depth_write = material.depth_write;
    state.cull_face = !material.double_sided;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Light {
        object: ObjectId,
        color: Color,
        intensity: f32,
    },
    DrawMesh {
        object: ObjectId,
        buffer: u32,
        mvp: [[f32; 4]; 4],
        color: Color,
        opacity: f32,
    },
    DrawLine {
        object: ObjectId,
        buffer: u32,
        mvp: [[f32; 4]; 4],
        vertex_count: usize,
        color: Color,
        opacity: f32,
    },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RenderFrame {
    pub commands: Vec<RenderCommand>,
}

#[derive(Debug, Default)]
pub struct CommandRenderer {
    context_id: Option<ContextId>,
    buffers: BTreeMap<ObjectId, u32>,
    last_frame: RenderFrame,
    frames: u64,
}

impl CommandRenderer {
    pub fn last_frame(&self) -> &RenderFrame {
        &self.last_frame
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn context_id(&self) -> Option<ContextId> {
        self.context_id
    }

    fn buffer_for(
        &mut self,
        context: &mut RecordingContext,
        id: ObjectId,
        drawable: &Drawable3D,
        stats: &mut RenderStats,
    ) -> Result<u32, RenderError> {
        if let Some(name) = self.buffers.get(&id) {
            return Ok(*name);
        }
        let mesh = pack_drawable(drawable)
            .ok_or_else(|| RenderError::Backend(format!("{id} has no geometry")))?;
        let name = context.create_buffer(mesh.vertex_bytes())?;
        self.buffers.insert(id, name);
        stats.uploads += 1;
        Ok(name)
    }
}

impl Renderer for CommandRenderer {
    type Context = RecordingContext;

    fn release(&mut self, context: &mut RecordingContext, objects: &[ObjectId]) {
        for id in objects {
            if let Some(name) = self.buffers.remove(id) {
                context.delete_buffer(name);
            }
        }
    }

    fn render(
        &mut self,
        context: &mut RecordingContext,
        scene: &SceneGraph,
        camera: &CameraState,
    ) -> Result<RenderStats, RenderError> {
        if context.is_lost() || self.context_id != Some(context.id()) {
            return Err(RenderError::ContextUnavailable);
        }

        let mut state = context.pipeline_state();
        state.program = Some(OVERLAY_PROGRAM);
        state.depth_test = true;
        state.cull_face = false;
        context.set_pipeline_state(state);

        if std::mem::take(&mut context.inject_failure) {
            return Err(RenderError::Backend("injected render failure".to_string()));
        }

        let mut stats = RenderStats::default();
        let mut frame = RenderFrame::default();
        for (id, object) in scene.iter() {
            let mvp = camera
                .model_view_projection(&object.transform.to_matrix())
                .to_cols_f32();
            match &object.drawable {
                Drawable3D::AmbientLight { color, intensity }
                | Drawable3D::DirectionalLight {
                    color, intensity, ..
                } => {
                    stats.lights += 1;
                    frame.commands.push(RenderCommand::Light {
                        object: id,
                        color: *color,
                        intensity: *intensity,
                    });
                }
                Drawable3D::Mesh { material, .. } => {
                    let buffer = self.buffer_for(context, id, &object.drawable, &mut stats)?;
                    apply_material(&mut state, material);
                    context.set_pipeline_state(state);
                    stats.draw_calls += 1;
                    frame.commands.push(RenderCommand::DrawMesh {
                        object: id,
                        buffer,
                        mvp,
                        color: material.color,
                        opacity: material.opacity,
                    });
                }
                Drawable3D::Line { vertices, material } => {
                    let buffer = self.buffer_for(context, id, &object.drawable, &mut stats)?;
                    apply_material(&mut state, material);
                    context.set_pipeline_state(state);
                    stats.draw_calls += 1;
                    frame.commands.push(RenderCommand::DrawLine {
                        object: id,
                        buffer,
                        mvp,
                        vertex_count: vertices.len(),
                        color: material.color,
                        opacity: material.opacity,
                    });
                }
            }
        }

        trace!(
            draw_calls = stats.draw_calls,
            uploads = stats.uploads,
            "recorded frame"
        );
        self.last_frame = frame;
        self.frames += 1;
        Ok(stats)
    }

    fn dispose(&mut self, context: &mut RecordingContext) {
        let names: Vec<u32> = self.buffers.values().copied().collect();
        for name in &names {
            context.delete_buffer(*name);
        }
        debug!(buffers = names.len(), "disposed renderer");
        self.buffers.clear();
        self.last_frame = RenderFrame::default();
        self.context_id = None;
    }

    fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

/// Creates [`CommandRenderer`]s.
#[derive(Debug, Default)]
pub struct CommandBackend {
    created: u32,
}

impl CommandBackend {
    pub fn renderers_created(&self) -> u32 {
        self.created
    }
}

impl GraphicsBackend for CommandBackend {
    type Context = RecordingContext;
    type Renderer = CommandRenderer;

    fn create_renderer(
        &mut self,
        context: &mut RecordingContext,
    ) -> Result<CommandRenderer, RenderError> {
        if context.is_lost() {
            return Err(RenderError::ContextUnavailable);
        }
        self.created += 1;
        Ok(CommandRenderer {
            context_id: Some(context.id()),
            ..CommandRenderer::default()
        })
    }
}
