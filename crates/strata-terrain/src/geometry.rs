//! Tile mesh: vertex data, shared primitive sets and their validation.

use glam::Vec3;
use strata_core::geometry::BoundingBox;
use strata_core::profiling::profile_function;
use strata_test_utils::{
    BufferTarget, GpuBuffer, Indices, PrimitiveTopology, RenderState, VertexAttribute,
};

/// One indexed draw over the tile's vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSet {
    topology: PrimitiveTopology,
    indices: Indices,
    buffer: Option<GpuBuffer>,
}

impl PrimitiveSet {
    pub fn new(topology: PrimitiveTopology, indices: Indices) -> Self {
        Self {
            topology,
            indices,
            buffer: None,
        }
    }

    pub fn triangles(indices: Indices) -> Self {
        Self::new(PrimitiveTopology::TriangleList, indices)
    }

    /// Attach the element buffer holding these indices on the GPU.
    pub fn with_buffer(mut self, buffer: GpuBuffer) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    pub fn buffer(&self) -> Option<&GpuBuffer> {
        self.buffer.as_ref()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Why validation threw away every primitive set of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Set `set` is not a triangle list.
    NotTriangles { set: usize, topology: PrimitiveTopology },
    /// Set `set` references vertex `index` past the end of the vertex array.
    IndexOutOfBounds { set: usize, index: u32, vertex_count: usize },
}

/// Outcome of [`TileGeometry::validate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Indices removed to make index counts a multiple of three.
    pub truncated_indices: usize,
    pub discarded: Option<DiscardReason>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.truncated_indices == 0 && self.discarded.is_none()
    }
}

/// A bound vertex attribute stream.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBinding {
    pub attribute: VertexAttribute,
    pub buffer: GpuBuffer,
}

/// Mesh shared by every layer of a tile.
///
/// Positions are kept on the CPU for bounds and validation. A primitive set
/// slot may be empty; drawing skips it with a warning.
#[derive(Debug, Clone, Default)]
pub struct TileGeometry {
    positions: Vec<Vec3>,
    vertex_buffers: Vec<VertexBinding>,
    primitive_sets: Vec<Option<PrimitiveSet>>,
}

impl TileGeometry {
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    pub fn with_vertex_buffer(mut self, attribute: VertexAttribute, buffer: GpuBuffer) -> Self {
        self.vertex_buffers.push(VertexBinding { attribute, buffer });
        self
    }

    pub fn with_primitive_set(mut self, set: PrimitiveSet) -> Self {
        self.primitive_sets.push(Some(set));
        self
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn vertex_buffers(&self) -> &[VertexBinding] {
        &self.vertex_buffers
    }

    pub fn primitive_sets(&self) -> &[Option<PrimitiveSet>] {
        &self.primitive_sets
    }

    pub fn primitive_sets_mut(&mut self) -> &mut Vec<Option<PrimitiveSet>> {
        &mut self.primitive_sets
    }

    pub fn compute_bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.positions)
    }

    /// Check the mesh invariants, repairing or discarding primitive sets.
    ///
    /// - A set that is not a triangle list discards all sets.
    /// - A set whose index count is not a multiple of three loses its
    ///   trailing one or two indices.
    /// - An index past the vertex array discards all sets and stops.
    pub fn validate(&mut self) -> ValidationReport {
        profile_function!();
        let mut report = ValidationReport::default();
        let vertex_count = self.positions.len();

        for (i, slot) in self.primitive_sets.iter_mut().enumerate() {
            let Some(set) = slot else {
                tracing::warn!("Primitive set {} is empty; skipping validation", i);
                continue;
            };

            if set.topology != PrimitiveTopology::TriangleList {
                tracing::warn!("Invalid primitive set {}: {:?} is not a triangle list", i, set.topology);
                report.discarded = Some(DiscardReason::NotTriangles {
                    set: i,
                    topology: set.topology,
                });
                break;
            }

            let extra = set.indices.len() % 3;
            if extra != 0 {
                tracing::warn!("Invalid primitive set {}: {} indices is not a multiple of 3", i, set.indices.len());
                set.indices.truncate(set.indices.len() - extra);
                tracing::warn!("   ..removed {} indices", extra);
                report.truncated_indices += extra;
            }

            if let Some(index) = set.indices.iter().find(|&index| index as usize >= vertex_count) {
                tracing::warn!(
                    "Invalid primitive set {}: index {} out of bounds for {} vertices",
                    i,
                    index,
                    vertex_count
                );
                report.discarded = Some(DiscardReason::IndexOutOfBounds {
                    set: i,
                    index,
                    vertex_count,
                });
                break;
            }
        }

        if report.discarded.is_some() {
            self.primitive_sets.clear();
        }
        report
    }

    /// Bind every vertex attribute stream.
    pub fn bind_vertex_arrays(&self, state: &mut dyn RenderState) {
        for binding in &self.vertex_buffers {
            state.bind_vertex_buffer(binding.attribute, &binding.buffer);
        }
    }

    /// Draw every primitive set once. Returns the number of draw calls.
    pub fn draw_primitives(&self, state: &mut dyn RenderState) -> usize {
        let mut draws = 0;
        for (i, slot) in self.primitive_sets.iter().enumerate() {
            match slot {
                Some(set) => {
                    state.draw_elements(set.topology, &set.indices);
                    draws += 1;
                }
                None => tracing::warn!("Tile geometry has an empty primitive set at slot {}", i),
            }
        }
        draws
    }

    /// Upload vertex and element buffers to the context of `state`.
    pub fn compile(&self, state: &mut dyn RenderState) {
        for buffer in self.buffers() {
            state.compile_buffer(buffer);
        }
    }

    /// Free vertex and element buffers in the context of `state`.
    pub fn release(&self, state: &mut dyn RenderState) {
        for buffer in self.buffers() {
            state.release_buffer(buffer);
        }
    }

    /// Leave the array and element buffer targets unbound.
    pub fn unbind_buffers(state: &mut dyn RenderState) {
        state.unbind_buffer(BufferTarget::Array);
        state.unbind_buffer(BufferTarget::ElementArray);
    }

    fn buffers(&self) -> impl Iterator<Item = &GpuBuffer> {
        self.vertex_buffers.iter().map(|binding| &binding.buffer).chain(
            self.primitive_sets
                .iter()
                .flatten()
                .filter_map(|set| set.buffer.as_ref()),
        )
    }
}
