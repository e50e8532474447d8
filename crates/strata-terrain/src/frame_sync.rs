//! Keeps a tile's layer order in step with the shared map snapshot.
//!
//! Layer *membership* of a tile only changes through a rebuild
//! ([`TileLayers::replace`]). Reordering in the map only permutes the records
//! a tile already holds, which is what [`TileLayers::sync`] does.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use strata_core::profiling::profile_function;

use crate::layer::{ImageLayer, LayerRecord};
use crate::map_frame::LayerSnapshot;

/// Arrange `current` in the order of `authoritative`.
///
/// Records whose layer is missing from `authoritative` are dropped; layers
/// the tile does not hold are not invented.
pub fn reorder_layers(authoritative: &[Arc<ImageLayer>], current: &[LayerRecord]) -> Vec<LayerRecord> {
    let mut reordered = Vec::with_capacity(current.len());
    for layer in authoritative {
        if let Some(record) = current.iter().find(|r| **r == layer.uid()) {
            reordered.push(record.clone());
        }
    }
    reordered
}

/// A tile's layer records plus the snapshot revision they were ordered for.
///
/// The list is published through an [`ArcSwap`]: drawing threads load the
/// current `Arc` without locking, and a reorder stores a whole new list, so no
/// reader ever sees a half-built one. `rebuild` only serializes writers.
#[derive(Debug)]
pub struct TileLayers {
    layers: ArcSwap<Vec<LayerRecord>>,
    rebuild: Mutex<()>,
    synced_revision: AtomicU64,
}

impl TileLayers {
    pub fn new(layers: Vec<LayerRecord>, revision: u64) -> Self {
        Self {
            layers: ArcSwap::from_pointee(layers),
            rebuild: Mutex::new(()),
            synced_revision: AtomicU64::new(revision),
        }
    }

    /// Current records in draw order.
    pub fn current(&self) -> Arc<Vec<LayerRecord>> {
        self.layers.load_full()
    }

    pub fn synced_revision(&self) -> u64 {
        self.synced_revision.load(Ordering::Acquire)
    }

    /// Replace the records as a unit (tile rebuild).
    pub fn replace(&self, layers: Vec<LayerRecord>, revision: u64) {
        let _rebuild = self.rebuild.lock();
        self.layers.store(Arc::new(layers));
        self.synced_revision.store(revision, Ordering::Release);
    }

    /// Bring the record order in line with `frame`.
    ///
    /// The common case (nothing changed) takes no lock. Otherwise the check is
    /// repeated under the rebuild lock so only one drawing thread performs a
    /// given reorder. Returns `true` if this call reordered the list.
    pub fn sync(&self, frame: &dyn LayerSnapshot) -> bool {
        if !self.is_stale(frame) {
            return false;
        }

        profile_function!();
        let _rebuild = self.rebuild.lock();

        if frame.needs_sync() {
            frame.sync();
        }

        // Read the revision before the list: if the frame moves on in
        // between, the newer list is recorded under the older revision and
        // the next draw simply reorders again.
        let revision = frame.revision();
        if revision == self.synced_revision.load(Ordering::Acquire) {
            return false;
        }

        let current = self.layers.load();
        let authoritative = frame.ordered_layers();
        let reordered = reorder_layers(&authoritative, &current);
        if reordered.len() != current.len() {
            tracing::debug!(
                "Dropped {} layer record(s) missing from map revision {}",
                current.len() - reordered.len(),
                revision
            );
        }

        self.layers.store(Arc::new(reordered));
        self.synced_revision.store(revision, Ordering::Release);
        true
    }

    fn is_stale(&self, frame: &dyn LayerSnapshot) -> bool {
        frame.needs_sync() || frame.revision() != self.synced_revision.load(Ordering::Acquire)
    }
}
