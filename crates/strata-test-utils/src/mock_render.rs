//! Mock implementation of [`RenderState`] for testing.
//!
//! [`MockRenderState`] records every state change and draw without touching a
//! GPU, and [`MockProgram`] hands out uniform locations from a fixed table.

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::{gpu_types::*, render_state::*};

/// A recorded render state operation, for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    SetActiveTextureUnit {
        unit: u32,
    },
    ApplyTexture {
        texture: TextureId,
    },
    ReleaseTexture {
        texture: TextureId,
    },
    UniformF32 {
        location: UniformLocation,
        value: f32,
    },
    UniformI32 {
        location: UniformLocation,
        value: i32,
    },
    UniformVec4 {
        location: UniformLocation,
        value: [f32; 4],
    },
    UniformMat4 {
        location: UniformLocation,
        value: [f32; 16],
    },
    BindVertexBuffer {
        attribute: VertexAttribute,
        buffer: BufferId,
    },
    CompileBuffer {
        buffer: BufferId,
    },
    ReleaseBuffer {
        buffer: BufferId,
    },
    UnbindBuffer {
        target: BufferTarget,
    },
    DrawElements {
        topology: PrimitiveTopology,
        count: usize,
    },
}

/// Mock shader program with a fixed uniform table.
///
/// `uniform_location` takes `&self` but records every lookup, so the lookup
/// log sits behind a `Mutex`.
pub struct MockProgram {
    id: ProgramId,
    locations: AHashMap<String, UniformLocation>,
    lookups: Mutex<Vec<String>>,
}

impl MockProgram {
    /// Program exposing `uniforms`, located at their index in the slice.
    pub fn new(id: u64, uniforms: &[&str]) -> Self {
        let locations = uniforms
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), UniformLocation(i as u32)))
            .collect();

        Self {
            id: ProgramId(id),
            locations,
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Program exposing `uniforms` at explicit locations.
    pub fn with_locations(id: u64, uniforms: &[(&str, u32)]) -> Self {
        let locations = uniforms
            .iter()
            .map(|(name, location)| (name.to_string(), UniformLocation(*location)))
            .collect();

        Self {
            id: ProgramId(id),
            locations,
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Location of `name` without recording a lookup.
    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.locations.get(name).copied()
    }

    /// Names looked up so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().len()
    }
}

impl ShaderProgram for MockProgram {
    fn id(&self) -> ProgramId {
        self.id
    }

    fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.lookups.lock().push(name.to_string());
        self.locations.get(name).copied()
    }
}

/// Mock render state for one context.
///
/// # Example
///
/// ```rust
/// use strata_test_utils::{ContextId, FrameStamp, MockRenderState, RenderState};
///
/// let mut state = MockRenderState::new(ContextId(1)).with_frame_stamp(FrameStamp {
///     frame_number: 10,
///     reference_time: 2.5,
/// });
///
/// state.set_active_texture_unit(0);
/// assert_eq!(state.call_count(), 1);
/// ```
pub struct MockRenderState {
    context_id: ContextId,
    frame_stamp: Option<FrameStamp>,
    program: Option<Arc<MockProgram>>,
    buffer_objects: bool,
    pending_errors: VecDeque<String>,
    calls: Vec<RenderCall>,
}

impl MockRenderState {
    /// Context with buffer-object support, no program and no frame stamp.
    pub fn new(context_id: ContextId) -> Self {
        Self {
            context_id,
            frame_stamp: None,
            program: None,
            buffer_objects: true,
            pending_errors: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    pub fn with_program(mut self, program: Arc<MockProgram>) -> Self {
        self.program = Some(program);
        self
    }

    pub fn with_frame_stamp(mut self, stamp: FrameStamp) -> Self {
        self.frame_stamp = Some(stamp);
        self
    }

    pub fn without_buffer_objects(mut self) -> Self {
        self.buffer_objects = false;
        self
    }

    /// Bind another program, as upstream shader composition would between draws.
    pub fn set_program(&mut self, program: Option<Arc<MockProgram>>) {
        self.program = program;
    }

    pub fn set_frame_stamp(&mut self, stamp: Option<FrameStamp>) {
        self.frame_stamp = stamp;
    }

    /// Queue an error for the next [`RenderState::take_error`].
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.pending_errors.push_back(message.into());
    }

    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// Number of `draw_elements` calls.
    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, RenderCall::DrawElements { .. }))
            .count()
    }

    /// Values written to `location` through `uniform_f32`, in order.
    pub fn uniform_f32_writes(&self, location: UniformLocation) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RenderCall::UniformF32 { location: l, value } if *l == location => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Values written to `location` through `uniform_i32`, in order.
    pub fn uniform_i32_writes(&self, location: UniformLocation) -> Vec<i32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RenderCall::UniformI32 { location: l, value } if *l == location => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Number of uniform uploads of any type.
    pub fn uniform_write_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    RenderCall::UniformF32 { .. }
                        | RenderCall::UniformI32 { .. }
                        | RenderCall::UniformVec4 { .. }
                        | RenderCall::UniformMat4 { .. }
                )
            })
            .count()
    }

    /// Textures applied, in order.
    pub fn applied_textures(&self) -> Vec<TextureId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RenderCall::ApplyTexture { texture } => Some(*texture),
                _ => None,
            })
            .collect()
    }
}

impl RenderState for MockRenderState {
    fn context_id(&self) -> ContextId {
        self.context_id
    }

    fn frame_stamp(&self) -> Option<FrameStamp> {
        self.frame_stamp
    }

    fn active_program(&self) -> Option<Arc<dyn ShaderProgram>> {
        self.program
            .as_ref()
            .map(|program| Arc::clone(program) as Arc<dyn ShaderProgram>)
    }

    fn supports_buffer_objects(&self) -> bool {
        self.buffer_objects
    }

    fn set_active_texture_unit(&mut self, unit: u32) {
        self.calls.push(RenderCall::SetActiveTextureUnit { unit });
    }

    fn apply_texture(&mut self, texture: &GpuTexture) {
        self.calls.push(RenderCall::ApplyTexture {
            texture: texture.id(),
        });
    }

    fn release_texture(&mut self, texture: &GpuTexture) {
        self.calls.push(RenderCall::ReleaseTexture {
            texture: texture.id(),
        });
    }

    fn uniform_f32(&mut self, location: UniformLocation, value: f32) {
        self.calls.push(RenderCall::UniformF32 { location, value });
    }

    fn uniform_i32(&mut self, location: UniformLocation, value: i32) {
        self.calls.push(RenderCall::UniformI32 { location, value });
    }

    fn uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]) {
        self.calls.push(RenderCall::UniformVec4 { location, value });
    }

    fn uniform_mat4(&mut self, location: UniformLocation, value: &[f32; 16]) {
        self.calls.push(RenderCall::UniformMat4 {
            location,
            value: *value,
        });
    }

    fn bind_vertex_buffer(&mut self, attribute: VertexAttribute, buffer: &GpuBuffer) {
        self.calls.push(RenderCall::BindVertexBuffer {
            attribute,
            buffer: buffer.id(),
        });
    }

    fn compile_buffer(&mut self, buffer: &GpuBuffer) {
        self.calls.push(RenderCall::CompileBuffer { buffer: buffer.id() });
    }

    fn release_buffer(&mut self, buffer: &GpuBuffer) {
        self.calls.push(RenderCall::ReleaseBuffer { buffer: buffer.id() });
    }

    fn unbind_buffer(&mut self, target: BufferTarget) {
        self.calls.push(RenderCall::UnbindBuffer { target });
    }

    fn draw_elements(&mut self, topology: PrimitiveTopology, indices: &Indices) {
        self.calls.push(RenderCall::DrawElements {
            topology,
            count: indices.len(),
        });
    }

    fn take_error(&mut self) -> Option<String> {
        self.pending_errors.pop_front()
    }
}
