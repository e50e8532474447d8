//! Draw protocol tests for `TileDrawable`, run against the mock render state.

mod common;

use std::sync::Arc;

use common::*;
use glam::{Mat4, Vec3, Vec4};
use strata_terrain::*;
use strata_test_utils::*;

#[test]
fn test_draw_order_is_dense_over_drawn_layers() {
    let scene = Scene::with_opacities(&[1.0, 1.0, 0.0, 0.6, 1.0]);
    scene.layers[1].set_visible(false);
    let tile = scene.tile();
    let mut state = render_state(0, 1.0);

    let stats = tile.draw(&mut state);

    let uids = scene.uids();
    assert_eq!(state.uniform_i32_writes(LAYER_ORDER), vec![0, 1, 2]);
    assert_eq!(state.uniform_i32_writes(LAYER_UID), vec![uids[0], uids[3], uids[4]]);
    assert_eq!(stats.layers_drawn, 3);
    assert_eq!(stats.draw_calls, 6);
    assert_eq!(state.draw_count(), 6);
    assert!(!stats.used_fallback);
}

#[test]
fn test_fallback_when_no_layer_is_visible() {
    let scene = Scene::with_opacities(&[0.0, 0.5]);
    scene.layers[1].set_visible(false);
    let tile = scene.tile();
    let mut state = render_state(0, 1.0);

    let stats = tile.draw(&mut state);

    assert!(stats.used_fallback);
    assert_eq!(stats.layers_drawn, 0);
    assert_eq!(state.uniform_i32_writes(LAYER_UID), vec![-1]);
    assert_eq!(state.uniform_i32_writes(LAYER_ORDER), vec![0]);
    assert_eq!(state.uniform_f32_writes(LAYER_OPACITY), vec![1.0]);
    assert_eq!(state.draw_count(), 2);
    assert!(state.applied_textures().is_empty());
}

#[test]
fn test_fallback_for_empty_layer_list() {
    let scene = Scene::with_opacities(&[]);
    let tile = scene.tile();
    let mut state = render_state(0, 1.0);

    let stats = tile.draw(&mut state);

    assert!(stats.used_fallback);
    assert_eq!(state.uniform_i32_writes(LAYER_UID), vec![LayerUid::NONE_UNIFORM]);
    assert_eq!(state.draw_count(), 2);
}

#[test]
fn test_opacity_uploads_are_coalesced() {
    let scene = Scene::with_opacities(&[0.5, 0.5, 0.8, 0.8, 0.8]);
    let tile = scene.tile();
    let mut state = render_state(0, 1.0);

    let stats = tile.draw(&mut state);

    assert_eq!(state.uniform_f32_writes(LAYER_OPACITY), vec![0.5, 0.8]);
    assert_eq!(stats.opacity_uploads, 2);
    assert_eq!(stats.layers_drawn, 5);
}

#[test]
fn test_tile_key_uploaded_once_per_draw() {
    let scene = Scene::with_opacities(&[1.0, 1.0, 1.0]);
    let tile = scene.tile();
    let mut state = render_state(0, 1.0);

    tile.draw(&mut state);

    let tile_keys: Vec<[f32; 4]> = state
        .calls()
        .iter()
        .filter_map(|call| match call {
            RenderCall::UniformVec4 { location, value } if *location == TILE_KEY => Some(*value),
            _ => None,
        })
        .collect();
    assert_eq!(tile_keys, vec![[3.0, 1.0, 1.0, -1.0]]);
}

#[test]
fn test_bounding_box_updates_tile_key_radius() {
    let scene = Scene::with_opacities(&[1.0]);
    let tile = scene.tile();
    assert_eq!(tile.tile_key_value().w, TileKeyUniform::UNSET_RADIUS);

    let bbox = tile.compute_bounding_box();
    let expected = Vec3::new(1.0, 1.0, 0.0).length() * 0.5;
    assert!((bbox.radius() - expected).abs() < 1e-6);
    assert_eq!(tile.tile_key_value(), Vec4::new(3.0, 1.0, 1.0, bbox.radius()));

    let mut state = render_state(0, 1.0);
    tile.draw(&mut state);
    assert!(state.calls().iter().any(|call| matches!(
        call,
        RenderCall::UniformVec4 { value, .. } if value[3] == bbox.radius()
    )));
}

#[test]
fn test_birth_time_latches_per_context() {
    let scene = Scene::with_opacities(&[1.0]);
    let tile = scene.tile();

    let mut first = render_state(0, 2.0);
    tile.draw(&mut first);
    first.set_frame_stamp(Some(FrameStamp {
        frame_number: 2,
        reference_time: 5.0,
    }));
    tile.draw(&mut first);
    assert_eq!(first.uniform_f32_writes(BIRTH_TIME), vec![2.0, 2.0]);
    assert_eq!(tile.birth_time(ContextId(0)), Some(2.0));

    let mut second = render_state(1, 7.5);
    tile.draw(&mut second);
    assert_eq!(second.uniform_f32_writes(BIRTH_TIME), vec![7.5]);
    assert_eq!(tile.birth_time(ContextId(0)), Some(2.0));
}

#[test]
fn test_birth_time_without_frame_stamp_stays_unset() {
    let scene = Scene::with_opacities(&[1.0]);
    let tile = scene.tile();
    let mut state = MockRenderState::new(ContextId(0)).with_program(full_program(1));

    tile.draw(&mut state);

    assert_eq!(
        state.uniform_f32_writes(BIRTH_TIME),
        vec![ContextRenderState::UNSET_BIRTH_TIME as f32]
    );
    assert_eq!(tile.birth_time(ContextId(0)), None);
}

#[test]
fn test_release_resets_birth_time() {
    let scene = Scene::with_opacities(&[1.0]);
    let tile = scene.tile();
    let mut state = render_state(0, 1.0);
    tile.draw(&mut state);

    tile.release_gpu_objects(&mut state);
    assert_eq!(tile.birth_time(ContextId(0)), None);

    state.set_frame_stamp(Some(FrameStamp {
        frame_number: 9,
        reference_time: 4.0,
    }));
    state.clear_calls();
    tile.draw(&mut state);
    assert_eq!(state.uniform_f32_writes(BIRTH_TIME), vec![4.0]);
}

#[test]
fn test_draws_without_program() {
    let scene = Scene::with_opacities(&[1.0, 0.5]);
    let tile = scene.tile();
    let mut state = MockRenderState::new(ContextId(0));

    let stats = tile.draw(&mut state);

    // Textures are applied per layer, but the mesh is drawn once.
    assert_eq!(state.uniform_write_count(), 0);
    assert_eq!(state.applied_textures().len(), 2);
    assert_eq!(stats.layers_drawn, 0);
    assert!(stats.used_fallback);
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(state.draw_count(), 2);
    assert_eq!(tile.birth_time(ContextId(0)), None);
}

#[test]
fn test_fixed_function_skips_uniform_resolution() {
    let scene = Scene::with_opacities(&[1.0, 0.5, 0.8]);
    let tile = TileDrawable::new(scene.descriptor(), &StaticCapabilities::fixed_function(8)).unwrap();
    let program = full_program(1);
    let mut state = MockRenderState::new(ContextId(0)).with_program(program.clone());

    let stats = tile.draw(&mut state);

    assert!(!tile.supports_programmable_shaders());
    assert_eq!(program.lookup_count(), 0);
    assert_eq!(state.uniform_write_count(), 0);
    assert_eq!(state.applied_textures().len(), 3);
    assert_eq!(stats.layers_drawn, 0);
    assert!(stats.used_fallback);
    assert_eq!(state.draw_count(), 2);
}

#[test]
fn test_birth_time_latched_only_when_read() {
    let scene = Scene::with_opacities(&[1.0]);
    let tile = scene.tile();
    let without_birth_time = Arc::new(MockProgram::with_locations(
        2,
        &[(uniforms::LAYER_UID_UNIFORM, 2), (uniforms::LAYER_ORDER_UNIFORM, 3)],
    ));
    let mut state = MockRenderState::new(ContextId(0))
        .with_program(without_birth_time)
        .with_frame_stamp(FrameStamp {
            frame_number: 1,
            reference_time: 2.0,
        });

    let stats = tile.draw(&mut state);
    assert_eq!(stats.layers_drawn, 1);
    assert_eq!(tile.birth_time(ContextId(0)), None);

    // The first program that reads it latches the time of that frame.
    state.set_program(Some(full_program(1)));
    state.set_frame_stamp(Some(FrameStamp {
        frame_number: 2,
        reference_time: 3.5,
    }));
    state.clear_calls();
    tile.draw(&mut state);
    assert_eq!(state.uniform_f32_writes(BIRTH_TIME), vec![3.5]);
    assert_eq!(tile.birth_time(ContextId(0)), Some(3.5));
}

#[test]
fn test_uniforms_resolved_every_draw() {
    let scene = Scene::with_opacities(&[1.0]);
    let tile = scene.tile();
    let program = full_program(1);
    let mut state = MockRenderState::new(ContextId(0)).with_program(program.clone());

    tile.draw(&mut state);
    tile.draw(&mut state);
    assert_eq!(program.lookup_count(), 12);

    // A different program instance places the uid elsewhere.
    let moved = Arc::new(MockProgram::with_locations(2, &[(uniforms::LAYER_UID_UNIFORM, 40)]));
    state.set_program(Some(moved));
    state.clear_calls();
    tile.draw(&mut state);

    assert_eq!(state.uniform_i32_writes(UniformLocation(40)), vec![scene.uids()[0]]);
    assert!(state.uniform_i32_writes(LAYER_UID).is_empty());
    assert_eq!(state.uniform_write_count(), 1);
}

#[test]
fn test_missing_texture_and_matrix_still_draw() {
    let scene = Scene::with_opacities(&[1.0, 1.0]);
    let records = vec![
        LayerRecord::new(scene.layers[0].clone(), None, None),
        LayerRecord::new(scene.layers[1].clone(), Some(texture()), Some(Arc::new(Mat4::IDENTITY))),
    ];
    let tile = TileDrawable::new(scene.descriptor().with_layers(records), &StaticCapabilities::default()).unwrap();
    let mut state = render_state(0, 1.0);

    let stats = tile.draw(&mut state);

    assert_eq!(stats.layers_drawn, 2);
    assert_eq!(state.applied_textures().len(), 1);
    let matrices = state
        .calls()
        .iter()
        .filter(|call| matches!(call, RenderCall::UniformMat4 { location, .. } if *location == TEX_MATRIX))
        .count();
    assert_eq!(matrices, 1);
}

#[test]
fn test_layer_state_sequence() {
    let scene = Scene::with_opacities(&[0.75]);
    let scale = Mat4::from_scale(Vec3::new(0.5, 0.5, 1.0));
    let tex = texture();
    let records = vec![LayerRecord::new(scene.layers[0].clone(), Some(tex.clone()), Some(Arc::new(scale)))];
    let tile = TileDrawable::new(scene.descriptor().with_layers(records), &StaticCapabilities::default()).unwrap();
    let mut state = render_state(0, 3.0);

    tile.draw(&mut state);

    let uid = scene.uids()[0];
    let buffers: Vec<BufferId> = tile.geometry().vertex_buffers().iter().map(|b| b.buffer.id()).collect();
    let expected = vec![
        RenderCall::BindVertexBuffer {
            attribute: VertexAttribute::Position,
            buffer: buffers[0],
        },
        RenderCall::BindVertexBuffer {
            attribute: VertexAttribute::TexCoord(0),
            buffer: buffers[1],
        },
        RenderCall::UniformVec4 {
            location: TILE_KEY,
            value: [3.0, 1.0, 1.0, -1.0],
        },
        RenderCall::UniformF32 {
            location: BIRTH_TIME,
            value: 3.0,
        },
        RenderCall::SetActiveTextureUnit { unit: 2 },
        RenderCall::ApplyTexture { texture: tex.id() },
        RenderCall::UniformMat4 {
            location: TEX_MATRIX,
            value: scale.to_cols_array(),
        },
        RenderCall::UniformF32 {
            location: LAYER_OPACITY,
            value: 0.75,
        },
        RenderCall::UniformI32 {
            location: LAYER_UID,
            value: uid,
        },
        RenderCall::UniformI32 {
            location: LAYER_ORDER,
            value: 0,
        },
        RenderCall::DrawElements {
            topology: PrimitiveTopology::TriangleList,
            count: 3,
        },
        RenderCall::DrawElements {
            topology: PrimitiveTopology::TriangleList,
            count: 3,
        },
        RenderCall::UnbindBuffer {
            target: BufferTarget::Array,
        },
        RenderCall::UnbindBuffer {
            target: BufferTarget::ElementArray,
        },
    ];
    assert_eq!(state.calls(), expected.as_slice());
}

#[test]
fn test_draw_follows_map_reorder() {
    let scene = Scene::with_opacities(&[1.0, 1.0, 1.0]);
    let tile = scene.tile();
    let uids = scene.uids();

    scene.map.move_image_layer(scene.layers[0].uid(), 2).unwrap();

    let mut state = render_state(0, 1.0);
    let stats = tile.draw(&mut state);
    assert!(stats.reordered);
    assert_eq!(state.uniform_i32_writes(LAYER_UID), vec![uids[1], uids[2], uids[0]]);

    state.clear_calls();
    let stats = tile.draw(&mut state);
    assert!(!stats.reordered);
    assert_eq!(state.uniform_i32_writes(LAYER_UID), vec![uids[1], uids[2], uids[0]]);
}

#[test]
fn test_removed_map_layer_is_dropped_on_reorder() {
    let scene = Scene::with_opacities(&[1.0, 1.0, 1.0]);
    let tile = scene.tile();
    let uids = scene.uids();

    scene.map.remove_image_layer(scene.layers[1].uid()).unwrap();

    let mut state = render_state(0, 1.0);
    tile.draw(&mut state);
    assert_eq!(state.uniform_i32_writes(LAYER_UID), vec![uids[0], uids[2]]);
    assert_eq!(tile.layers().len(), 2);
}

#[test]
fn test_set_layers_rebuilds_without_reorder() {
    let scene = Scene::with_opacities(&[1.0, 1.0]);
    let tile = scene.tile();
    scene.map.move_image_layer(scene.layers[1].uid(), 0).unwrap();
    scene.frame.sync();

    let mut records = scene.records();
    records.reverse();
    tile.set_layers(records);

    let mut state = render_state(0, 1.0);
    let stats = tile.draw(&mut state);
    assert!(!stats.reordered);
    let uids = scene.uids();
    assert_eq!(state.uniform_i32_writes(LAYER_UID), vec![uids[1], uids[0]]);
}

#[test]
fn test_release_cascades_to_layer_textures() {
    let scene = Scene::with_opacities(&[1.0, 1.0]);
    let tile = scene.tile();
    let mut state = render_state(0, 1.0);

    tile.release_gpu_objects(&mut state);

    let released_textures: Vec<TextureId> = state
        .calls()
        .iter()
        .filter_map(|call| match call {
            RenderCall::ReleaseTexture { texture } => Some(*texture),
            _ => None,
        })
        .collect();
    let expected: Vec<TextureId> = tile
        .layers()
        .iter()
        .filter_map(|r| r.texture.as_ref().map(|t| t.id()))
        .collect();
    assert_eq!(released_textures, expected);

    let released_buffers = state
        .calls()
        .iter()
        .filter(|call| matches!(call, RenderCall::ReleaseBuffer { .. }))
        .count();
    assert_eq!(released_buffers, 3);
}

#[test]
fn test_compile_applies_textures_and_unbinds() {
    let scene = Scene::with_opacities(&[1.0, 0.0]);
    let tile = scene.tile();
    let mut state = render_state(0, 1.0);

    tile.compile_gpu_objects(&mut state);

    let compiled = state
        .calls()
        .iter()
        .filter(|call| matches!(call, RenderCall::CompileBuffer { .. }))
        .count();
    assert_eq!(compiled, 3);
    // Every layer texture is uploaded, visible or not.
    assert_eq!(state.applied_textures().len(), 2);
    assert_eq!(
        &state.calls()[state.call_count() - 2..],
        &[
            RenderCall::UnbindBuffer {
                target: BufferTarget::Array
            },
            RenderCall::UnbindBuffer {
                target: BufferTarget::ElementArray
            },
        ]
    );
    assert_eq!(state.draw_count(), 0);
}

#[test]
fn test_compile_without_buffer_objects_is_noop() {
    let scene = Scene::with_opacities(&[1.0]);
    let tile = scene.tile();
    let mut state = render_state(0, 1.0).without_buffer_objects();

    tile.compile_gpu_objects(&mut state);
    assert_eq!(state.call_count(), 0);
}

#[test]
fn test_resize_grows_monotonically() {
    let scene = Scene::with_opacities(&[1.0]);
    let tile = scene.tile();
    assert_eq!(tile.context_capacity(), 0);

    tile.resize_gpu_object_buffers(4);
    assert_eq!(tile.context_capacity(), 4);

    let mut state = render_state(2, 6.0);
    tile.draw(&mut state);

    tile.resize_gpu_object_buffers(1);
    assert_eq!(tile.context_capacity(), 4);
    assert_eq!(tile.birth_time(ContextId(2)), Some(6.0));

    // Drawing on a context past the end grows the buffer.
    let mut late = render_state(6, 1.0);
    tile.draw(&mut late);
    assert_eq!(tile.context_capacity(), 7);
}

#[test]
fn test_validation_discard_leaves_nothing_to_draw() {
    let scene = Scene::with_opacities(&[1.0]);
    let geometry = quad_geometry().with_primitive_set(PrimitiveSet::triangles(Indices::U16(vec![0, 1, 9])));
    let mut tile = TileDrawable::new(scene.descriptor().with_geometry(geometry), &StaticCapabilities::default()).unwrap();

    let report = tile.validate();
    assert!(matches!(
        report.discarded,
        Some(DiscardReason::IndexOutOfBounds { set: 2, index: 9, .. })
    ));

    let mut state = render_state(0, 1.0);
    let stats = tile.draw(&mut state);
    assert_eq!(stats.layers_drawn, 1);
    assert_eq!(stats.draw_calls, 0);
    assert_eq!(state.draw_count(), 0);
}

#[test]
fn test_empty_primitive_slot_is_skipped() {
    let scene = Scene::with_opacities(&[1.0]);
    let mut geometry = quad_geometry();
    geometry.primitive_sets_mut().insert(1, None);
    let tile = TileDrawable::new(scene.descriptor().with_geometry(geometry), &StaticCapabilities::default()).unwrap();
    let mut state = render_state(0, 1.0);

    let stats = tile.draw(&mut state);
    assert_eq!(stats.draw_calls, 2);
}

#[test]
fn test_gpu_errors_are_drained_when_checking() {
    let scene = Scene::with_opacities(&[1.0]);
    let tile = TileDrawable::new(
        scene.descriptor().with_error_checks(GpuErrorChecks::OncePerDraw),
        &StaticCapabilities::default(),
    )
    .unwrap();
    let mut state = render_state(0, 1.0);
    state.push_error("GL_INVALID_OPERATION");
    state.push_error("GL_INVALID_VALUE");

    tile.draw(&mut state);
    assert_eq!(state.take_error(), None);

    // Without checks, errors are left for the host.
    let quiet = scene.tile();
    state.push_error("GL_INVALID_ENUM");
    quiet.draw(&mut state);
    assert_eq!(state.take_error().as_deref(), Some("GL_INVALID_ENUM"));
}

#[test]
fn test_texture_units_reserved() {
    let scene = Scene::with_opacities(&[1.0]);
    let tile = scene.tile();
    assert_eq!(
        tile.texture_units(),
        TextureUnits {
            image: 2,
            parent: 3,
            elevation: 4
        }
    );

    let err = TileDrawable::new(scene.descriptor().with_image_unit(14), &StaticCapabilities::default()).unwrap_err();
    assert_eq!(
        err,
        TerrainError::TextureUnitOutOfRange {
            image_unit: 14,
            required: 17,
            available: 16
        }
    );
}

#[test]
fn test_invalid_tile_key_is_rejected() {
    let scene = Scene::with_opacities(&[1.0]);
    let mut desc = scene.descriptor();
    desc.key = TileKey::new(0, 0, 1);

    let err = TileDrawable::new(desc, &StaticCapabilities::default()).unwrap_err();
    assert!(matches!(err, TerrainError::InvalidTileKey { .. }));
}
