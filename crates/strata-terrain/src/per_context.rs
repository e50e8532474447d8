//! Per-context state, indexed by context id.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use strata_test_utils::ContextId;

/// Slots indexed by [`ContextId`], grown on demand and never shrunk.
///
/// Growth takes the write lock; slot access takes the read lock. Each slot is
/// only used by the thread rendering its context, so slot types keep their
/// own state in atomics rather than locks.
#[derive(Debug, Default)]
pub struct PerContextBuffer<T> {
    slots: RwLock<Vec<T>>,
}

impl<T: Default> PerContextBuffer<T> {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make room for at least `size` contexts, keeping existing slots.
    pub fn resize(&self, size: usize) {
        let mut slots = self.slots.write();
        if slots.len() < size {
            slots.resize_with(size, T::default);
        }
    }

    /// Run `f` on the slot for `context`, creating it if needed.
    pub fn with<R>(&self, context: ContextId, f: impl FnOnce(&T) -> R) -> R {
        {
            let slots = self.slots.read();
            if let Some(slot) = slots.get(context.index()) {
                return f(slot);
            }
        }

        self.resize(context.index() + 1);
        let slots = self.slots.read();
        f(&slots[context.index()])
    }

    /// Run `f` on every slot.
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        for slot in self.slots.read().iter() {
            f(slot);
        }
    }
}

/// Per-context tile state: when the tile first entered the scene.
#[derive(Debug)]
pub struct ContextRenderState {
    birth_time: AtomicU64,
}

impl ContextRenderState {
    /// Birth time of a tile that has not been drawn in this context yet.
    pub const UNSET_BIRTH_TIME: f64 = -1.0;

    pub fn birth_time(&self) -> Option<f64> {
        let time = f64::from_bits(self.birth_time.load(Ordering::Relaxed));
        (time >= 0.0).then_some(time)
    }

    /// Latch `now` as the birth time unless one is already set, and return
    /// the birth time in effect.
    pub fn latch_birth_time(&self, now: f64) -> f64 {
        match self.birth_time.compare_exchange(
            Self::UNSET_BIRTH_TIME.to_bits(),
            now.to_bits(),
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => now,
            Err(existing) => f64::from_bits(existing),
        }
    }

    pub fn reset(&self) {
        self.birth_time
            .store(Self::UNSET_BIRTH_TIME.to_bits(), Ordering::Relaxed);
    }
}

impl Default for ContextRenderState {
    fn default() -> Self {
        Self {
            birth_time: AtomicU64::new(Self::UNSET_BIRTH_TIME.to_bits()),
        }
    }
}
