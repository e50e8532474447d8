//! Image layers and the per-tile records that bind them to textures.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use glam::Mat4;
use strata_test_utils::GpuTexture;

static NEXT_LAYER_UID: AtomicU32 = AtomicU32::new(0);

/// Process-unique image layer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerUid(pub u32);

impl LayerUid {
    /// Value uploaded as the layer uid when no layer is drawn.
    pub const NONE_UNIFORM: i32 = -1;

    pub fn next() -> Self {
        Self(NEXT_LAYER_UID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_uniform(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for LayerUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raster imagery source.
///
/// Visibility and opacity are edited from the application thread while
/// rendering threads read them, so both live in atomics.
#[derive(Debug)]
pub struct ImageLayer {
    uid: LayerUid,
    name: String,
    visible: AtomicBool,
    opacity: AtomicU32,
}

impl ImageLayer {
    /// Visible, fully opaque layer with a freshly allocated uid.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_uid(LayerUid::next(), name)
    }

    pub fn with_uid(uid: LayerUid, name: impl Into<String>) -> Self {
        Self {
            uid,
            name: name.into(),
            visible: AtomicBool::new(true),
            opacity: AtomicU32::new(1.0f32.to_bits()),
        }
    }

    pub fn uid(&self) -> LayerUid {
        self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    pub fn opacity(&self) -> f32 {
        f32::from_bits(self.opacity.load(Ordering::Relaxed))
    }

    /// Set opacity, clamped to `[0, 1]`. NaN is treated as fully transparent.
    pub fn set_opacity(&self, opacity: f32) {
        let opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
        self.opacity.store(opacity.to_bits(), Ordering::Relaxed);
    }

    /// Whether the layer contributes to a draw.
    pub fn is_drawable(&self) -> bool {
        self.visible() && self.opacity() > 0.0
    }
}

/// One image layer as bound on one tile.
///
/// Records compare equal when they refer to the same layer uid, regardless of
/// the texture or matrix they carry.
#[derive(Debug, Clone)]
pub struct LayerRecord {
    pub layer: Arc<ImageLayer>,
    pub texture: Option<GpuTexture>,
    pub tex_matrix: Option<Arc<Mat4>>,
}

impl LayerRecord {
    pub fn new(layer: Arc<ImageLayer>, texture: Option<GpuTexture>, tex_matrix: Option<Arc<Mat4>>) -> Self {
        Self {
            layer,
            texture,
            tex_matrix,
        }
    }

    pub fn uid(&self) -> LayerUid {
        self.layer.uid()
    }
}

impl PartialEq for LayerRecord {
    fn eq(&self, other: &Self) -> bool {
        self.uid() == other.uid()
    }
}

impl Eq for LayerRecord {}

impl PartialEq<LayerUid> for LayerRecord {
    fn eq(&self, uid: &LayerUid) -> bool {
        self.uid() == *uid
    }
}
