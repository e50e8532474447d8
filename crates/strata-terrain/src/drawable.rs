//! The terrain tile drawable.
//!
//! A [`TileDrawable`] draws one tile mesh once per visible image layer,
//! changing only the shading state between passes: layer texture, texture
//! matrix, opacity, layer uid and draw order.

use std::fmt;
use std::sync::Arc;

use glam::Vec4;
use static_assertions::assert_impl_all;
use strata_core::geometry::BoundingBox;
use strata_core::profiling::{profile_function, profile_scope};
use strata_test_utils::{ContextId, RenderState};

use crate::capability::RenderCapabilities;
use crate::error::{TerrainError, TerrainResult};
use crate::frame_sync::TileLayers;
use crate::geometry::{TileGeometry, ValidationReport};
use crate::layer::{LayerRecord, LayerUid};
use crate::map_frame::LayerSnapshot;
use crate::per_context::{ContextRenderState, PerContextBuffer};
use crate::tile_key::{TileKey, TileKeyUniform, TileProfile};
use crate::uniforms::{TileUniforms, UniformNames};

/// Texture units used by a tile.
///
/// Only `image` is bound here. `parent` (parent-tile blending) and
/// `elevation` are reserved for shaders and collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureUnits {
    pub image: u32,
    pub parent: u32,
    pub elevation: u32,
}

impl TextureUnits {
    /// Units claimed per tile, starting at the image unit.
    pub const COUNT: u32 = 3;

    pub fn from_image_unit(image: u32) -> Self {
        Self {
            image,
            parent: image + 1,
            elevation: image + 2,
        }
    }
}

/// When to poll the render state for GPU errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GpuErrorChecks {
    #[default]
    Off,
    /// Check at the start and at the end of every draw.
    OncePerDraw,
}

/// Everything needed to build a [`TileDrawable`].
///
/// # Example
///
/// ```ignore
/// let desc = TileDrawableDescriptor::new(TileKey::new(3, 5, 2), frame)
///     .with_image_unit(2)
///     .with_layers(records)
///     .with_geometry(mesh);
/// let tile = TileDrawable::new(desc, &StaticCapabilities::default())?;
/// ```
pub struct TileDrawableDescriptor {
    pub key: TileKey,
    pub profile: TileProfile,
    pub frame: Arc<dyn LayerSnapshot>,
    pub image_unit: u32,
    pub layers: Vec<LayerRecord>,
    pub geometry: TileGeometry,
    pub uniform_names: UniformNames,
    pub error_checks: GpuErrorChecks,
}

impl TileDrawableDescriptor {
    pub fn new(key: TileKey, frame: Arc<dyn LayerSnapshot>) -> Self {
        Self {
            key,
            profile: TileProfile::GLOBAL_GEODETIC,
            frame,
            image_unit: 0,
            layers: Vec::new(),
            geometry: TileGeometry::default(),
            uniform_names: UniformNames::default(),
            error_checks: GpuErrorChecks::Off,
        }
    }

    pub fn with_profile(mut self, profile: TileProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_image_unit(mut self, image_unit: u32) -> Self {
        self.image_unit = image_unit;
        self
    }

    pub fn with_layers(mut self, layers: Vec<LayerRecord>) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_geometry(mut self, geometry: TileGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_uniform_names(mut self, names: UniformNames) -> Self {
        self.uniform_names = names;
        self
    }

    pub fn with_error_checks(mut self, checks: GpuErrorChecks) -> Self {
        self.error_checks = checks;
        self
    }
}

/// Statistics from one [`TileDrawable::draw`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Layers that received a draw pass.
    pub layers_drawn: u32,
    pub draw_calls: u32,
    pub opacity_uploads: u32,
    /// No layer was drawable, so the bare mesh was drawn once.
    pub used_fallback: bool,
    /// This draw reordered the tile's layers to match the map.
    pub reordered: bool,
}

/// Multi-layer terrain tile.
///
/// `draw` may run concurrently on several rendering threads, one per context.
pub struct TileDrawable {
    key: TileKey,
    key_uniform: TileKeyUniform,
    frame: Arc<dyn LayerSnapshot>,
    layers: TileLayers,
    geometry: TileGeometry,
    per_context: PerContextBuffer<ContextRenderState>,
    units: TextureUnits,
    programmable_shaders: bool,
    uniform_names: UniformNames,
    error_checks: GpuErrorChecks,
}

assert_impl_all!(TileDrawable: Send, Sync);

impl TileDrawable {
    pub fn new(desc: TileDrawableDescriptor, capabilities: &dyn RenderCapabilities) -> TerrainResult<Self> {
        let key_uniform = TileKeyUniform::new(&desc.key, &desc.profile)?;

        let available = capabilities.max_texture_units();
        let required = desc.image_unit.saturating_add(TextureUnits::COUNT);
        if required > available {
            return Err(TerrainError::TextureUnitOutOfRange {
                image_unit: desc.image_unit,
                required,
                available,
            });
        }

        let revision = desc.frame.revision();
        Ok(Self {
            key: desc.key,
            key_uniform,
            frame: desc.frame,
            layers: TileLayers::new(desc.layers, revision),
            geometry: desc.geometry,
            per_context: PerContextBuffer::new(),
            units: TextureUnits::from_image_unit(desc.image_unit),
            programmable_shaders: capabilities.supports_programmable_shaders(),
            uniform_names: desc.uniform_names,
            error_checks: desc.error_checks,
        })
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Current `(x, flipped y, lod, radius)` tile-key vector.
    pub fn tile_key_value(&self) -> Vec4 {
        self.key_uniform.value()
    }

    pub fn texture_units(&self) -> TextureUnits {
        self.units
    }

    pub fn supports_programmable_shaders(&self) -> bool {
        self.programmable_shaders
    }

    /// Layer records in their current draw order.
    pub fn layers(&self) -> Arc<Vec<LayerRecord>> {
        self.layers.current()
    }

    pub fn geometry(&self) -> &TileGeometry {
        &self.geometry
    }

    pub fn set_geometry(&mut self, geometry: TileGeometry) {
        self.geometry = geometry;
    }

    /// Replace the tile's layer records (tile rebuild).
    pub fn set_layers(&self, layers: Vec<LayerRecord>) {
        self.layers.replace(layers, self.frame.revision());
    }

    /// Birth time latched for `context`, if the tile was drawn there by a
    /// program that reads the birth-time uniform.
    pub fn birth_time(&self, context: ContextId) -> Option<f64> {
        self.per_context.with(context, |slot| slot.birth_time())
    }

    /// Number of contexts with per-context state allocated.
    pub fn context_capacity(&self) -> usize {
        self.per_context.len()
    }

    /// Draw the tile on the context of `state`.
    pub fn draw(&self, state: &mut dyn RenderState) -> DrawStats {
        profile_function!();
        let check_errors = self.error_checks == GpuErrorChecks::OncePerDraw;
        if check_errors {
            self.report_gpu_errors(state, "start of TileDrawable::draw");
        }

        self.geometry.bind_vertex_arrays(state);
        let stats = self.draw_layers(state);

        if check_errors {
            self.report_gpu_errors(state, "end of TileDrawable::draw");
        }

        TileGeometry::unbind_buffers(state);
        stats
    }

    /// Sync the layer order, then draw one pass per visible layer.
    ///
    /// Per-layer passes need a program to tell the layers apart. Without one
    /// the layer textures are still applied, but the mesh is drawn once by
    /// the fallback pass.
    fn draw_layers(&self, state: &mut dyn RenderState) -> DrawStats {
        let mut stats = DrawStats {
            reordered: self.layers.sync(self.frame.as_ref()),
            ..DrawStats::default()
        };
        let layers = self.layers.current();

        let program = if self.programmable_shaders {
            state.active_program()
        } else {
            None
        };
        let has_program = program.is_some();
        let uniforms = TileUniforms::resolve(program.as_deref(), &self.uniform_names);

        if let Some(location) = uniforms.tile_key {
            state.uniform_vec4(location, self.key_uniform.value().to_array());
        }

        if let Some(location) = uniforms.birth_time {
            let birth_time = self.latch_birth_time(state);
            state.uniform_f32(location, birth_time as f32);
        }

        profile_scope!("layer_passes");
        let mut prev_opacity = None;

        for record in layers.iter() {
            let layer = &record.layer;
            let opacity = layer.opacity();
            if !layer.visible() || opacity <= 0.0 {
                continue;
            }

            state.set_active_texture_unit(self.units.image);
            match &record.texture {
                Some(texture) => state.apply_texture(texture),
                None => tracing::warn!("Tile {}: layer {} has no texture", self.key, layer.uid()),
            }

            match &record.tex_matrix {
                Some(matrix) => {
                    if let Some(location) = uniforms.layer_tex_matrix {
                        state.uniform_mat4(location, &matrix.to_cols_array());
                    }
                }
                None => tracing::warn!("Tile {}: layer {} has no texture matrix", self.key, layer.uid()),
            }

            if !has_program {
                continue;
            }

            if let Some(location) = uniforms.layer_opacity {
                if prev_opacity != Some(opacity) {
                    state.uniform_f32(location, opacity);
                    prev_opacity = Some(opacity);
                    stats.opacity_uploads += 1;
                }
            }

            if let Some(location) = uniforms.layer_uid {
                state.uniform_i32(location, layer.uid().as_uniform());
            }

            if let Some(location) = uniforms.layer_order {
                state.uniform_i32(location, stats.layers_drawn as i32);
            }

            stats.draw_calls += self.geometry.draw_primitives(state) as u32;
            stats.layers_drawn += 1;
        }

        if stats.layers_drawn == 0 {
            if let Some(location) = uniforms.layer_opacity {
                state.uniform_f32(location, 1.0);
                stats.opacity_uploads += 1;
            }
            if let Some(location) = uniforms.layer_uid {
                state.uniform_i32(location, LayerUid::NONE_UNIFORM);
            }
            if let Some(location) = uniforms.layer_order {
                state.uniform_i32(location, 0);
            }

            stats.draw_calls += self.geometry.draw_primitives(state) as u32;
            stats.used_fallback = true;
        }

        tracing::trace!(
            "Tile {}: {} layer pass(es), {} draw call(s){}",
            self.key,
            stats.layers_drawn,
            stats.draw_calls,
            if stats.used_fallback { " (fallback)" } else { "" }
        );
        stats
    }

    /// Recompute the mesh bounds and publish the radius in the tile key.
    pub fn compute_bounding_box(&self) -> BoundingBox {
        let bbox = self.geometry.compute_bounding_box();
        self.key_uniform.set_radius(bbox.radius());
        bbox
    }

    /// Check and repair the mesh. See [`TileGeometry::validate`].
    pub fn validate(&mut self) -> ValidationReport {
        let report = self.geometry.validate();
        if !report.is_clean() {
            tracing::debug!("Tile {}: geometry validation {:?}", self.key, report);
        }
        report
    }

    /// Free this tile's GPU objects on the context of `state`, including the
    /// textures of its layers, and forget the tile's birth time there.
    pub fn release_gpu_objects(&self, state: &mut dyn RenderState) {
        self.geometry.release(state);

        for record in self.layers.current().iter() {
            if let Some(texture) = &record.texture {
                state.release_texture(texture);
            }
        }

        self.per_context.with(state.context_id(), |slot| slot.reset());
    }

    /// Make room for per-context state of `max_contexts` contexts.
    pub fn resize_gpu_object_buffers(&self, max_contexts: usize) {
        self.per_context.resize(max_contexts);
    }

    /// Upload buffers and layer textures to the context of `state` ahead of
    /// the first draw.
    pub fn compile_gpu_objects(&self, state: &mut dyn RenderState) {
        if !state.supports_buffer_objects() {
            tracing::debug!("Tile {}: no buffer object support, skipping compile", self.key);
            return;
        }

        self.geometry.compile(state);

        state.set_active_texture_unit(self.units.image);
        for record in self.layers.current().iter() {
            if let Some(texture) = &record.texture {
                state.apply_texture(texture);
            }
        }

        TileGeometry::unbind_buffers(state);
    }

    fn latch_birth_time(&self, state: &dyn RenderState) -> f64 {
        let now = state.frame_stamp().map(|stamp| stamp.reference_time);
        self.per_context.with(state.context_id(), |slot| match now {
            Some(now) => slot.latch_birth_time(now),
            None => slot.birth_time().unwrap_or(ContextRenderState::UNSET_BIRTH_TIME),
        })
    }

    fn report_gpu_errors(&self, state: &mut dyn RenderState, site: &str) {
        while let Some(error) = state.take_error() {
            tracing::warn!("Tile {}: GPU error at {}: {}", self.key, site, error);
        }
    }
}

impl fmt::Debug for TileDrawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileDrawable")
            .field("key", &self.key)
            .field("units", &self.units)
            .field("layers", &self.layers.current().len())
            .field("programmable_shaders", &self.programmable_shaders)
            .finish_non_exhaustive()
    }
}
