//! Tile addressing and the packed tile-key uniform.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec4;

use crate::error::{TerrainError, TerrainResult};

/// Tiling scheme: how many tiles cover the world at level of detail 0.
///
/// Every level doubles the tile count along both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileProfile {
    pub tiles_wide_at_lod0: u32,
    pub tiles_high_at_lod0: u32,
}

impl TileProfile {
    /// Two tiles at lod 0, each covering one hemisphere of longitude.
    pub const GLOBAL_GEODETIC: Self = Self::new(2, 1);

    /// One square tile at lod 0.
    pub const SPHERICAL_MERCATOR: Self = Self::new(1, 1);

    pub const fn new(tiles_wide_at_lod0: u32, tiles_high_at_lod0: u32) -> Self {
        Self {
            tiles_wide_at_lod0,
            tiles_high_at_lod0,
        }
    }

    /// Tile grid dimensions (wide, high) at `lod`.
    pub fn num_tiles(&self, lod: u32) -> (u32, u32) {
        let scale = 1u32.checked_shl(lod).unwrap_or(u32::MAX);
        (
            self.tiles_wide_at_lod0.saturating_mul(scale),
            self.tiles_high_at_lod0.saturating_mul(scale),
        )
    }
}

/// Address of one terrain tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub lod: u32,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub const fn new(lod: u32, x: u32, y: u32) -> Self {
        Self { lod, x, y }
    }

    pub fn validate(&self, profile: &TileProfile) -> TerrainResult<()> {
        let (tiles_wide, tiles_high) = profile.num_tiles(self.lod);
        if self.x >= tiles_wide || self.y >= tiles_high {
            return Err(TerrainError::InvalidTileKey {
                x: self.x,
                y: self.y,
                lod: self.lod,
                tiles_wide,
                tiles_high,
            });
        }
        Ok(())
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.lod, self.x, self.y)
    }
}

/// The `(x, flipped y, lod, radius)` vector shaders receive per tile.
///
/// The y axis is flipped so row 0 is the southernmost row. The radius starts
/// at -1 and is rewritten each time the tile's bounds are computed, possibly
/// from another thread than the one drawing, so it is stored atomically.
#[derive(Debug)]
pub struct TileKeyUniform {
    x: f32,
    flipped_y: f32,
    lod: f32,
    radius: AtomicU32,
}

impl TileKeyUniform {
    pub const UNSET_RADIUS: f32 = -1.0;

    pub fn new(key: &TileKey, profile: &TileProfile) -> TerrainResult<Self> {
        key.validate(profile)?;
        let (_, tiles_high) = profile.num_tiles(key.lod);

        Ok(Self {
            x: key.x as f32,
            flipped_y: (tiles_high - key.y - 1) as f32,
            lod: key.lod as f32,
            radius: AtomicU32::new(Self::UNSET_RADIUS.to_bits()),
        })
    }

    pub fn radius(&self) -> f32 {
        f32::from_bits(self.radius.load(Ordering::Acquire))
    }

    pub fn set_radius(&self, radius: f32) {
        self.radius.store(radius.to_bits(), Ordering::Release);
    }

    pub fn value(&self) -> Vec4 {
        Vec4::new(self.x, self.flipped_y, self.lod, self.radius())
    }
}
