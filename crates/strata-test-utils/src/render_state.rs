//! Traits abstracting the per-context GPU state machine.

use std::sync::Arc;

use crate::gpu_types::*;

/// A linked shader program instance.
///
/// Uniform locations belong to this instance. Another program, even one built
/// from the same sources, may place the same uniform elsewhere.
pub trait ShaderProgram: Send + Sync {
    fn id(&self) -> ProgramId;

    /// Location of the active uniform `name`, or `None` when the program
    /// does not use it.
    fn uniform_location(&self, name: &str) -> Option<UniformLocation>;
}

/// The GPU state of one rendering context, as seen by a drawable.
///
/// # Borrow Checking Pattern
///
/// Mutating methods take `&mut self`. A render state is owned by the single
/// thread rendering its context, so drawables receive `&mut dyn RenderState`
/// for the duration of one call and never store it.
///
/// Uploads through a [`UniformLocation`] apply to the program returned by
/// [`RenderState::active_program`] at the time of the call.
pub trait RenderState {
    // Context queries

    fn context_id(&self) -> ContextId;

    /// Stamp of the frame being rendered, if the host provides one.
    fn frame_stamp(&self) -> Option<FrameStamp>;

    /// Program most recently applied on this context.
    fn active_program(&self) -> Option<Arc<dyn ShaderProgram>>;

    /// Whether vertex/index buffer objects are available on this context.
    fn supports_buffer_objects(&self) -> bool;

    // Texture state

    fn set_active_texture_unit(&mut self, unit: u32);

    /// Bind `texture` on the active unit, uploading it first if needed.
    fn apply_texture(&mut self, texture: &GpuTexture);

    /// Free this context's GPU copy of `texture`.
    fn release_texture(&mut self, texture: &GpuTexture);

    // Uniform uploads

    fn uniform_f32(&mut self, location: UniformLocation, value: f32);

    fn uniform_i32(&mut self, location: UniformLocation, value: i32);

    fn uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]);

    /// Column-major 4x4 matrix.
    fn uniform_mat4(&mut self, location: UniformLocation, value: &[f32; 16]);

    // Buffers and drawing

    fn bind_vertex_buffer(&mut self, attribute: VertexAttribute, buffer: &GpuBuffer);

    /// Upload `buffer` to this context ahead of its first use.
    fn compile_buffer(&mut self, buffer: &GpuBuffer);

    fn release_buffer(&mut self, buffer: &GpuBuffer);

    fn unbind_buffer(&mut self, target: BufferTarget);

    fn draw_elements(&mut self, topology: PrimitiveTopology, indices: &Indices);

    /// Pop the oldest pending GPU error, if any.
    fn take_error(&mut self) -> Option<String>;
}
