//! Capability queries resolved once when a drawable is built.

/// Reports what the rendering backend can do.
///
/// Queried once at construction; drawables keep the answers for their
/// lifetime rather than consulting a global registry per frame.
pub trait RenderCapabilities: Send + Sync {
    /// Whether programmable shaders (and therefore uniforms) are available.
    fn supports_programmable_shaders(&self) -> bool;

    /// Number of texture units a fragment stage may sample from.
    fn max_texture_units(&self) -> u32;
}

/// Fixed capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCapabilities {
    pub programmable_shaders: bool,
    pub max_texture_units: u32,
}

impl StaticCapabilities {
    /// Fixed-function backend: no shaders, texturing only.
    pub const fn fixed_function(max_texture_units: u32) -> Self {
        Self {
            programmable_shaders: false,
            max_texture_units,
        }
    }
}

impl Default for StaticCapabilities {
    fn default() -> Self {
        Self {
            programmable_shaders: true,
            max_texture_units: 16,
        }
    }
}

impl RenderCapabilities for StaticCapabilities {
    fn supports_programmable_shaders(&self) -> bool {
        self.programmable_shaders
    }

    fn max_texture_units(&self) -> u32 {
        self.max_texture_units
    }
}
