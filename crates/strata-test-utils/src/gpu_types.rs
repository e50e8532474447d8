//! GPU handle wrappers and the shared vocabulary of the render state.
//!
//! Texture and buffer handles wrap a real `wgpu` resource or, with the `mock`
//! feature, a plain id. Either way a handle carries a process-unique id that
//! render states use to track bindings.

use std::sync::atomic::{AtomicU64, Ordering};

pub use wgpu::{IndexFormat, PrimitiveTopology, TextureFormat};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_resource_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identifies one rendering context (one GPU resource domain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

impl ContextId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Timing information for the frame currently being rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStamp {
    pub frame_number: u64,
    /// Seconds since the viewer started.
    pub reference_time: f64,
}

/// Location of a uniform inside one linked program instance.
///
/// Only meaningful for the program that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Buffer binding points that drawables must leave clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

/// Per-vertex attribute slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    Normal,
    Color,
    TexCoord(u32),
    Generic(u32),
}

/// Index data of one primitive set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    pub fn len(&self) -> usize {
        match self {
            Indices::U16(indices) => indices.len(),
            Indices::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            Indices::U16(_) => IndexFormat::Uint16,
            Indices::U32(_) => IndexFormat::Uint32,
        }
    }

    /// Index values widened to `u32`.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            Indices::U16(indices) => Box::new(indices.iter().map(|&i| u32::from(i))),
            Indices::U32(indices) => Box::new(indices.iter().copied()),
        }
    }

    pub fn truncate(&mut self, len: usize) {
        match self {
            Indices::U16(indices) => indices.truncate(len),
            Indices::U32(indices) => indices.truncate(len),
        }
    }
}

/// Texture handle that can be real or mock.
///
/// Cloning shares the underlying resource; equality is by [`TextureId`].
#[derive(Clone, Debug)]
pub struct GpuTexture {
    id: TextureId,
    inner: GpuTextureInner,
}

#[derive(Clone, Debug)]
enum GpuTextureInner {
    Real(wgpu::Texture),
    #[cfg(feature = "mock")]
    Mock {
        width: u32,
        height: u32,
        format: TextureFormat,
    },
}

impl GpuTexture {
    pub fn from_wgpu(texture: wgpu::Texture) -> Self {
        Self {
            id: TextureId(next_resource_id()),
            inner: GpuTextureInner::Real(texture),
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            id: TextureId(next_resource_id()),
            inner: GpuTextureInner::Mock { width, height, format },
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        match &self.inner {
            GpuTextureInner::Real(texture) => (texture.width(), texture.height()),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { width, height, .. } => (*width, *height),
        }
    }

    pub fn format(&self) -> TextureFormat {
        match &self.inner {
            GpuTextureInner::Real(texture) => texture.format(),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { format, .. } => *format,
        }
    }

    /// Get the underlying wgpu::Texture, if this handle is real.
    pub fn as_wgpu(&self) -> Option<&wgpu::Texture> {
        match &self.inner {
            GpuTextureInner::Real(texture) => Some(texture),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { .. } => None,
        }
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuTextureInner::Mock { .. })
    }
}

impl PartialEq for GpuTexture {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GpuTexture {}

/// Vertex or index buffer handle that can be real or mock.
#[derive(Clone, Debug)]
pub struct GpuBuffer {
    id: BufferId,
    inner: GpuBufferInner,
}

#[derive(Clone, Debug)]
enum GpuBufferInner {
    Real(wgpu::Buffer),
    #[cfg(feature = "mock")]
    Mock { size: u64 },
}

impl GpuBuffer {
    pub fn from_wgpu(buffer: wgpu::Buffer) -> Self {
        Self {
            id: BufferId(next_resource_id()),
            inner: GpuBufferInner::Real(buffer),
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(size: u64) -> Self {
        Self {
            id: BufferId(next_resource_id()),
            inner: GpuBufferInner::Mock { size },
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn size(&self) -> u64 {
        match &self.inner {
            GpuBufferInner::Real(buffer) => buffer.size(),
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock { size } => *size,
        }
    }

    pub fn as_wgpu(&self) -> Option<&wgpu::Buffer> {
        match &self.inner {
            GpuBufferInner::Real(buffer) => Some(buffer),
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock { .. } => None,
        }
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuBufferInner::Mock { .. })
    }
}

impl PartialEq for GpuBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GpuBuffer {}
