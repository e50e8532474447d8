//! Uniform names and per-draw location lookup.

use strata_test_utils::{ShaderProgram, UniformLocation};

pub const TILE_KEY_UNIFORM: &str = "strata_tile_key";
pub const BIRTH_TIME_UNIFORM: &str = "strata_tile_birthtime";
pub const LAYER_UID_UNIFORM: &str = "strata_layer_uid";
pub const LAYER_ORDER_UNIFORM: &str = "strata_layer_order";
pub const LAYER_OPACITY_UNIFORM: &str = "strata_layer_opacity";
pub const LAYER_TEX_MATRIX_UNIFORM: &str = "strata_layer_tex_matrix";

/// Names of the uniforms a tile drawable writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformNames {
    pub tile_key: String,
    pub birth_time: String,
    pub layer_uid: String,
    pub layer_order: String,
    pub layer_opacity: String,
    pub layer_tex_matrix: String,
}

impl Default for UniformNames {
    fn default() -> Self {
        Self {
            tile_key: TILE_KEY_UNIFORM.to_string(),
            birth_time: BIRTH_TIME_UNIFORM.to_string(),
            layer_uid: LAYER_UID_UNIFORM.to_string(),
            layer_order: LAYER_ORDER_UNIFORM.to_string(),
            layer_opacity: LAYER_OPACITY_UNIFORM.to_string(),
            layer_tex_matrix: LAYER_TEX_MATRIX_UNIFORM.to_string(),
        }
    }
}

/// Uniform locations in the program bound for one draw call.
///
/// `None` means the program does not use that uniform and every write to it
/// is skipped. Never keep these across draw calls: the bound program may be a
/// different instance next time, with different locations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileUniforms {
    pub tile_key: Option<UniformLocation>,
    pub birth_time: Option<UniformLocation>,
    pub layer_uid: Option<UniformLocation>,
    pub layer_order: Option<UniformLocation>,
    pub layer_opacity: Option<UniformLocation>,
    pub layer_tex_matrix: Option<UniformLocation>,
}

impl TileUniforms {
    /// Look up every tile uniform in `program`. No program, no locations.
    pub fn resolve(program: Option<&dyn ShaderProgram>, names: &UniformNames) -> Self {
        let Some(program) = program else {
            return Self::default();
        };

        Self {
            tile_key: program.uniform_location(&names.tile_key),
            birth_time: program.uniform_location(&names.birth_time),
            layer_uid: program.uniform_location(&names.layer_uid),
            layer_order: program.uniform_location(&names.layer_order),
            layer_opacity: program.uniform_location(&names.layer_opacity),
            layer_tex_matrix: program.uniform_location(&names.layer_tex_matrix),
        }
    }

    /// True when no uniform was found.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
