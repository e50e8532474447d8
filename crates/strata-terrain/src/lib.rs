//! Multi-layer terrain tile rendering.
//!
//! A terrain tile is one mesh textured by a stack of image layers. Rather than
//! building a separate mesh per layer, [`TileDrawable`] draws the shared mesh
//! once per visible layer and only changes the layer's shading state between
//! passes. Layer order comes from a shared, versioned [`LayerSnapshot`] that
//! the application edits on its own thread; each tile reconciles its local
//! order against it before drawing.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use strata_terrain::*;
//!
//! let map = Arc::new(Map::new());
//! let imagery = Arc::new(ImageLayer::new("imagery"));
//! map.add_image_layer(imagery.clone());
//! let frame: Arc<dyn LayerSnapshot> = Arc::new(MapFrame::new(map.clone()));
//!
//! let tile = TileDrawable::new(
//!     TileDrawableDescriptor::new(TileKey::new(0, 0, 0), frame)
//!         .with_layers(vec![LayerRecord::new(imagery, Some(texture), Some(matrix))])
//!         .with_geometry(mesh),
//!     &StaticCapabilities::default(),
//! )?;
//!
//! // On each rendering thread:
//! let stats = tile.draw(&mut render_state);
//! ```

pub mod capability;
pub mod drawable;
pub mod error;
pub mod frame_sync;
pub mod geometry;
pub mod layer;
pub mod map_frame;
pub mod per_context;
pub mod tile_key;
pub mod uniforms;

pub use capability::{RenderCapabilities, StaticCapabilities};
pub use drawable::{DrawStats, GpuErrorChecks, TextureUnits, TileDrawable, TileDrawableDescriptor};
pub use error::{TerrainError, TerrainResult};
pub use frame_sync::{TileLayers, reorder_layers};
pub use geometry::{DiscardReason, PrimitiveSet, TileGeometry, ValidationReport, VertexBinding};
pub use layer::{ImageLayer, LayerRecord, LayerUid};
pub use map_frame::{LayerList, LayerSnapshot, Map, MapFrame};
pub use per_context::{ContextRenderState, PerContextBuffer};
pub use tile_key::{TileKey, TileKeyUniform, TileProfile};
pub use uniforms::{TileUniforms, UniformNames};
