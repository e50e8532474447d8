//! Shared fixtures for terrain integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use glam::{Mat4, Vec3};
use strata_terrain::*;
use strata_test_utils::*;

pub const ALL_UNIFORMS: [&str; 6] = [
    uniforms::TILE_KEY_UNIFORM,
    uniforms::BIRTH_TIME_UNIFORM,
    uniforms::LAYER_UID_UNIFORM,
    uniforms::LAYER_ORDER_UNIFORM,
    uniforms::LAYER_OPACITY_UNIFORM,
    uniforms::LAYER_TEX_MATRIX_UNIFORM,
];

pub const TILE_KEY: UniformLocation = UniformLocation(0);
pub const BIRTH_TIME: UniformLocation = UniformLocation(1);
pub const LAYER_UID: UniformLocation = UniformLocation(2);
pub const LAYER_ORDER: UniformLocation = UniformLocation(3);
pub const LAYER_OPACITY: UniformLocation = UniformLocation(4);
pub const TEX_MATRIX: UniformLocation = UniformLocation(5);

/// Program exposing every tile uniform at the locations above.
pub fn full_program(id: u64) -> Arc<MockProgram> {
    Arc::new(MockProgram::new(id, &ALL_UNIFORMS))
}

pub fn render_state(context: u32, time: f64) -> MockRenderState {
    MockRenderState::new(ContextId(context))
        .with_program(full_program(1))
        .with_frame_stamp(FrameStamp {
            frame_number: 1,
            reference_time: time,
        })
}

/// 2x2-vertex quad split into two triangle sets, with mock buffers.
pub fn quad_geometry() -> TileGeometry {
    TileGeometry::new(vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
    ])
    .with_vertex_buffer(VertexAttribute::Position, GpuBuffer::mock(48))
    .with_vertex_buffer(VertexAttribute::TexCoord(0), GpuBuffer::mock(32))
    .with_primitive_set(PrimitiveSet::triangles(Indices::U16(vec![0, 1, 2])).with_buffer(GpuBuffer::mock(6)))
    .with_primitive_set(PrimitiveSet::triangles(Indices::U16(vec![2, 1, 3])))
}

pub fn texture() -> GpuTexture {
    GpuTexture::mock(256, 256, TextureFormat::Rgba8UnormSrgb)
}

/// A map holding one layer per opacity, bottom first, and a frame over it.
pub struct Scene {
    pub map: Arc<Map>,
    pub frame: Arc<MapFrame>,
    pub layers: Vec<Arc<ImageLayer>>,
}

impl Scene {
    pub fn with_opacities(opacities: &[f32]) -> Self {
        let map = Arc::new(Map::new());
        let layers: Vec<Arc<ImageLayer>> = opacities
            .iter()
            .enumerate()
            .map(|(i, &opacity)| {
                let layer = Arc::new(ImageLayer::new(format!("layer{}", i)));
                layer.set_opacity(opacity);
                layer
            })
            .collect();
        for layer in &layers {
            map.add_image_layer(layer.clone());
        }
        let frame = Arc::new(MapFrame::new(map.clone()));
        Self { map, frame, layers }
    }

    pub fn records(&self) -> Vec<LayerRecord> {
        self.layers
            .iter()
            .map(|layer| LayerRecord::new(layer.clone(), Some(texture()), Some(Arc::new(Mat4::IDENTITY))))
            .collect()
    }

    pub fn uids(&self) -> Vec<i32> {
        self.layers.iter().map(|l| l.uid().as_uniform()).collect()
    }

    pub fn descriptor(&self) -> TileDrawableDescriptor {
        TileDrawableDescriptor::new(TileKey::new(1, 3, 0), self.frame.clone())
            .with_image_unit(2)
            .with_layers(self.records())
            .with_geometry(quad_geometry())
    }

    pub fn tile(&self) -> TileDrawable {
        TileDrawable::new(self.descriptor(), &StaticCapabilities::default()).unwrap()
    }
}
