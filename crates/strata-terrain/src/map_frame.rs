//! The authoritative image-layer order and the versioned snapshots tiles read.
//!
//! [`Map`] is edited by the application thread. A [`MapFrame`] is a snapshot
//! of it that render threads pull forward with [`LayerSnapshot::sync`]. Tiles
//! only ever see the snapshot, through the [`LayerSnapshot`] trait.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{TerrainError, TerrainResult};
use crate::layer::{ImageLayer, LayerUid};

/// Image layers in authoritative draw order, bottom first.
pub type LayerList = Arc<[Arc<ImageLayer>]>;

/// A shared, versioned view of the map's image layers.
pub trait LayerSnapshot: Send + Sync {
    /// Cheap, lock-free check whether the source has moved past this snapshot.
    fn needs_sync(&self) -> bool;

    /// Pull the snapshot forward. Returns `true` if it changed.
    fn sync(&self) -> bool;

    /// Revision of the source this snapshot reflects. Increases on every change.
    fn revision(&self) -> u64;

    fn ordered_layers(&self) -> LayerList;
}

/// Authoritative, mutable list of image layers.
///
/// Every edit bumps the revision while the write lock is held, so a reader
/// holding the read lock sees a revision that matches the list.
#[derive(Debug, Default)]
pub struct Map {
    revision: AtomicU64,
    image_layers: RwLock<Vec<Arc<ImageLayer>>>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Append a layer on top of the stack.
    pub fn add_image_layer(&self, layer: Arc<ImageLayer>) {
        let mut layers = self.image_layers.write();
        layers.push(layer);
        self.bump();
    }

    pub fn remove_image_layer(&self, uid: LayerUid) -> TerrainResult<Arc<ImageLayer>> {
        let mut layers = self.image_layers.write();
        let index = Self::position(&layers, uid)?;
        let layer = layers.remove(index);
        self.bump();
        Ok(layer)
    }

    /// Move the layer `uid` so that it ends up at `index`.
    pub fn move_image_layer(&self, uid: LayerUid, index: usize) -> TerrainResult<()> {
        let mut layers = self.image_layers.write();
        let from = Self::position(&layers, uid)?;
        if index >= layers.len() {
            return Err(TerrainError::LayerIndexOutOfRange {
                index,
                len: layers.len(),
            });
        }
        if from != index {
            let layer = layers.remove(from);
            layers.insert(index, layer);
            self.bump();
        }
        Ok(())
    }

    pub fn image_layer(&self, uid: LayerUid) -> Option<Arc<ImageLayer>> {
        self.image_layers.read().iter().find(|l| l.uid() == uid).cloned()
    }

    pub fn image_layers(&self) -> Vec<Arc<ImageLayer>> {
        self.image_layers.read().clone()
    }

    /// Revision and layer list, read consistently.
    pub fn snapshot(&self) -> (u64, LayerList) {
        let layers = self.image_layers.read();
        (self.revision(), layers.iter().cloned().collect())
    }

    fn position(layers: &[Arc<ImageLayer>], uid: LayerUid) -> TerrainResult<usize> {
        layers
            .iter()
            .position(|l| l.uid() == uid)
            .ok_or(TerrainError::LayerNotFound(uid))
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

/// Snapshot of a [`Map`] shared by every tile of a terrain.
#[derive(Debug)]
pub struct MapFrame {
    map: Arc<Map>,
    synced_revision: AtomicU64,
    layers: RwLock<LayerList>,
}

impl MapFrame {
    pub fn new(map: Arc<Map>) -> Self {
        let (revision, layers) = map.snapshot();
        Self {
            map,
            synced_revision: AtomicU64::new(revision),
            layers: RwLock::new(layers),
        }
    }

    pub fn map(&self) -> &Arc<Map> {
        &self.map
    }
}

impl LayerSnapshot for MapFrame {
    fn needs_sync(&self) -> bool {
        self.map.revision() != self.synced_revision.load(Ordering::Acquire)
    }

    fn sync(&self) -> bool {
        let mut layers = self.layers.write();
        let (revision, latest) = self.map.snapshot();
        if revision == self.synced_revision.load(Ordering::Acquire) {
            return false;
        }

        *layers = latest;
        self.synced_revision.store(revision, Ordering::Release);
        tracing::debug!("Map frame synced to revision {} ({} image layers)", revision, layers.len());
        true
    }

    fn revision(&self) -> u64 {
        self.synced_revision.load(Ordering::Acquire)
    }

    fn ordered_layers(&self) -> LayerList {
        self.layers.read().clone()
    }
}
