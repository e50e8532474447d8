//! Error types for tile construction and the producer-side layer map.
//!
//! Nothing on the draw path returns these; drawing degrades and logs instead.

use std::fmt;

use crate::layer::LayerUid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerrainError {
    /// Tile coordinates outside the profile's grid at that level of detail.
    InvalidTileKey {
        x: u32,
        y: u32,
        lod: u32,
        tiles_wide: u32,
        tiles_high: u32,
    },

    /// The image unit plus its reserved neighbours exceed the available units.
    TextureUnitOutOfRange {
        image_unit: u32,
        required: u32,
        available: u32,
    },

    /// No image layer with this uid is in the map.
    LayerNotFound(LayerUid),

    /// Move target past the end of the layer list.
    LayerIndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileKey {
                x,
                y,
                lod,
                tiles_wide,
                tiles_high,
            } => write!(
                f,
                "Tile ({}, {}) at lod {} is outside the {}x{} tile grid",
                x, y, lod, tiles_wide, tiles_high
            ),
            Self::TextureUnitOutOfRange {
                image_unit,
                required,
                available,
            } => write!(
                f,
                "Image unit {} needs {} texture units but only {} are available",
                image_unit, required, available
            ),
            Self::LayerNotFound(uid) => write!(f, "Image layer {} not found", uid),
            Self::LayerIndexOutOfRange { index, len } => {
                write!(f, "Layer index {} out of range for {} layers", index, len)
            }
        }
    }
}

impl std::error::Error for TerrainError {}

pub type TerrainResult<T> = Result<T, TerrainError>;
