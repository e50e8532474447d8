/// SIMD-accelerated math types from [`glam`].
///
/// Terrain code uses [`Vec3`] for vertex positions, [`Vec4`] for the packed
/// tile-key uniform and [`Mat4`] for per-layer texture transforms.
///
/// ```
/// use strata_core::math::{Mat4, Vec3};
///
/// let scale_bias = Mat4::from_scale(Vec3::new(0.5, 0.5, 1.0));
/// assert_eq!(scale_bias.to_cols_array()[0], 0.5);
/// ```
///
/// [`glam`]: https://docs.rs/glam
pub mod fast {
    pub use glam::*;
}

pub use fast::{Mat4, Vec3, Vec4};
